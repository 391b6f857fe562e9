//! Uniform response body and the error-to-status mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::errors::ServiceError;

/// Message sent in place of the detail of an unexpected failure.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong on our end. Please try again or contact admin.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const BAD_REQUEST: Self = Self(400);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const CONFLICT: Self = Self(409);
    pub const UNPROCESSABLE_ENTITY: Self = Self(422);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UnprocessableEntity,
    InternalServerError,
}

impl ErrorType {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One entry of `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: ErrorType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorDetail {
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), field: None, value: None, details: None }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.field = Some(field.into());
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// `{ success, message, data?, errors? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self { success: true, message: message.into(), data: Some(data), errors: None }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self { success: false, message: message.into(), data: None, errors: Some(errors) }
    }

    /// Status implied by the first error, `200` for a success body.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.errors
            .as_deref()
            .and_then(<[ErrorDetail]>::first)
            .map_or(StatusCode::OK, |e| e.kind.status())
    }

    /// Renders `err` the way the global handler does.
    ///
    /// Expected errors are logged at debug. Unknown errors are logged in full
    /// and reach the client only as a generic message.
    #[must_use]
    pub fn from_error(err: &ServiceError) -> Self {
        if err.is_expected() {
            log::debug!("request rejected: {err}");
        } else {
            log::error!("request failed: {err}");
        }
        match err {
            ServiceError::NotFound(name) => Self::failure(
                "The requested resource was not found.",
                vec![ErrorDetail::new(ErrorType::NotFound, format!("The requested {name} could not be found."))],
            ),
            ServiceError::InvalidIdentifier(value) => Self::failure(
                "The provided identifier is invalid. Please ensure that it is in the correct format.",
                vec![
                    ErrorDetail::new(
                        ErrorType::BadRequest,
                        "Invalid identifier was given. Identifiers must be 24 character hex strings.",
                    )
                    .with_details(json!({ "field": "request.params._id", "value": value })),
                ],
            ),
            ServiceError::EmptyUpdate(name) => Self::failure(
                "No update data was provided. Please provide data to update the document.",
                vec![ErrorDetail::new(
                    ErrorType::BadRequest,
                    format!("No update data was provided. Please provide data to update the {name}."),
                )],
            ),
            ServiceError::Conflict { field, value } => Self::failure(
                err.to_string(),
                vec![
                    ErrorDetail::new(ErrorType::Conflict, err.to_string())
                        .with_details(json!({ "field": field, "value": value })),
                ],
            ),
            ServiceError::Validation(violations) => Self::failure(
                "The provided data is either invalid or missing. Please check your input and try again.",
                violations
                    .iter()
                    .map(|v| {
                        ErrorDetail::new(ErrorType::UnprocessableEntity, v.message.clone())
                            .with_field(v.field.clone(), v.value.clone())
                    })
                    .collect(),
            ),
            ServiceError::Unauthenticated(details) => Self::failure(
                "Authentication is required to access this resource.",
                vec![
                    ErrorDetail::new(
                        ErrorType::Unauthorized,
                        "Invalid or expired token. Please log in to access this resource.",
                    )
                    .with_details(Value::String(details.clone().unwrap_or_else(|| {
                        "Ensure that you have a valid authentication token and try again. \
                         If the issue persists, log in to obtain a new token."
                            .to_string()
                    }))),
                ],
            ),
            ServiceError::Unauthorized(details) => Self::failure(
                "You are not authorized to access this resource.",
                vec![
                    ErrorDetail::new(
                        ErrorType::Forbidden,
                        "You do not have the required permissions to access this resource.",
                    )
                    .with_details(Value::String(details.clone().unwrap_or_else(|| {
                        "Please contact your administrator or request the necessary permissions \
                         to perform this action."
                            .to_string()
                    }))),
                ],
            ),
            ServiceError::Unknown(_) => Self::failure(
                "An unexpected error occurred on the server. Please try again later.",
                vec![
                    ErrorDetail::new(ErrorType::InternalServerError, GENERIC_FAILURE).with_details(
                        Value::String(
                            "Please try again later or contact the system administrator for assistance. \
                             Include the request details to help diagnose the issue."
                                .to_string(),
                        ),
                    ),
                ],
            ),
        }
    }
}

impl From<&ServiceError> for ResponseEnvelope {
    fn from(err: &ServiceError) -> Self {
        Self::from_error(err)
    }
}

/// Envelope for a request no route matched.
#[must_use]
pub fn route_not_found(method: &str, url: &str) -> ResponseEnvelope {
    ResponseEnvelope::failure(
        "Resource not found",
        vec![ErrorDetail::new(ErrorType::NotFound, "Resource not found on the server.").with_details(
            Value::String(format!(
                "The requested URL [{method}]:{url} does not exist on the server. Please check the URL and try again."
            )),
        )],
    )
}
