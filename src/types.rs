use crate::errors::ServiceError;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor stamped on writes when the request carries no authenticated actor.
pub const SYSTEM_ACTOR: &str = "65ba85fd7e2eb77ce3f67a0c";

pub const ID_FIELD: &str = "_id";
pub const VERSION_FIELD: &str = "__v";
pub const DELETED_FIELD: &str = "deleted";
pub const DELETED_AT_FIELD: &str = "deletedAt";
pub const DELETED_BY_FIELD: &str = "deletedBy";
pub const UPDATED_AT_FIELD: &str = "updatedAt";
pub const UPDATED_BY_FIELD: &str = "updatedBy";

/// Fields every accepted mutation rewrites; a diff made only of these is no change.
pub const BOOKKEEPING_FIELDS: [&str; 2] = [UPDATED_AT_FIELD, UPDATED_BY_FIELD];

/// A 24-character hex document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub ObjectId);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parses the path form of an id.
    ///
    /// # Errors
    /// Returns `ServiceError::InvalidIdentifier` unless `raw` is exactly 24 hex characters.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        if !is_object_id(raw) {
            return Err(ServiceError::InvalidIdentifier(raw.to_string()));
        }
        ObjectId::parse_str(raw).map(Self).map_err(|_| ServiceError::InvalidIdentifier(raw.to_string()))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

#[must_use]
pub fn is_object_id(raw: &str) -> bool {
    raw.len() == 24 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Reads the `_id` of a stored document.
#[must_use]
pub fn id_of(doc: &bson::Document) -> Option<DocumentId> {
    doc.get_object_id(ID_FIELD).ok().map(DocumentId)
}

/// Current instant as a stored timestamp.
#[must_use]
pub fn now() -> bson::DateTime {
    bson::DateTime::from_millis(chrono::Utc::now().timestamp_millis())
}
