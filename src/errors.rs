use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One offending field of a rejected document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub value: serde_json::Value,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, value: serde_json::Value, message: impl Into<String>) -> Self {
        Self { field: field.into(), value, message: message.into() }
    }
}

fn join_violations(v: &[FieldViolation]) -> String {
    v.iter().map(|f| format!("{}: {}", f.field, f.message)).collect::<Vec<_>>().join(", ")
}

/// Errors raised by a [`crate::store::DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("E11000 duplicate key error collection: {collection} index: {field}_1 dup key: {{ {field}: \"{value}\" }}")]
    Duplicate { collection: String, field: String, value: String },

    /// An ordered bulk insert stopped at `failed_index` (relative to the submitted slice).
    /// Everything before it is in `inserted`.
    #[error("bulk write failed at index {failed_index}: {cause}")]
    BulkWrite { inserted: Vec<BsonDocument>, failed_index: usize, cause: Box<StoreError> },

    #[error("version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: i64, found: i64 },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Validation and uniqueness faults point at bad caller input rather than a
    /// per-document storage condition.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Duplicate { .. } => true,
            Self::BulkWrite { cause, .. } => cause.is_input_error(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("audit encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// The error taxonomy every component raises and the envelope renders.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("The requested {0} could not be found.")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("No update data was provided. Please provide data to update the {0}.")]
    EmptyUpdate(String),

    #[error("The specified value for the field {field}: {value} already exists.")]
    Conflict { field: String, value: String },

    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("unauthenticated")]
    Unauthenticated(Option<String>),

    #[error("unauthorized")]
    Unauthorized(Option<String>),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl ServiceError {
    /// Domain errors raised on purpose; everything else is a system failure.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, value, .. } => Self::Conflict { field, value },
            StoreError::Validation(v) => Self::Validation(v),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::BulkWrite { cause, .. } => Self::from(*cause),
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<AuditError> for ServiceError {
    fn from(err: AuditError) -> Self {
        Self::Unknown(err.to_string())
    }
}
