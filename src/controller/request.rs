use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::envelope::{ResponseEnvelope, StatusCode};
use crate::errors::ServiceError;
use crate::permissions::Permission;
use crate::query::parse_query_string;

/// An inbound call, already routed to one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// Decoded query-string pairs.
    pub query: BTreeMap<String, String>,
    /// The `:_id` path segment of by-id routes, unvalidated.
    pub id: Option<String>,
    pub body: Value,
    /// Permissions of the authenticated caller; `None` when unauthenticated.
    pub granted: Option<Vec<Permission>>,
}

impl Request {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `raw` as a URL query string.
    #[must_use]
    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = parse_query_string(raw);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn granted(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.granted = Some(permissions.into_iter().collect());
        self
    }
}

/// Status plus envelope. Handlers always produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: StatusCode,
    pub body: ResponseEnvelope,
}

impl Response {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self { status: StatusCode::OK, body: ResponseEnvelope::success(message, data) }
    }

    pub fn created(message: impl Into<String>, data: Value) -> Self {
        Self { status: StatusCode::CREATED, body: ResponseEnvelope::success(message, data) }
    }

    #[must_use]
    pub fn from_error(err: &ServiceError) -> Self {
        let body = ResponseEnvelope::from_error(err);
        Self { status: body.status(), body }
    }

    /// `data` of a success body, `Value::Null` otherwise.
    #[must_use]
    pub fn data(&self) -> &Value {
        self.body.data.as_ref().unwrap_or(&Value::Null)
    }
}

impl From<Result<Self, ServiceError>> for Response {
    fn from(result: Result<Self, ServiceError>) -> Self {
        result.unwrap_or_else(|e| Self::from_error(&e))
    }
}
