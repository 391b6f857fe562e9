//! Request adaptation for the uniform resource operations.
//!
//! Handlers validate path ids and patch bodies before the service is called,
//! stamp actors and timestamps, sanitize every outgoing document and pick the
//! outcome message from the affected/unaffected counts.

mod handlers;
pub mod messages;
mod request;
mod sanitize;

pub use handlers::{DEFAULT_ACTOR_FIELD, ResourceHandlers};
pub use messages::Noun;
pub use request::{Request, Response};
pub use sanitize::{DEFAULT_SENSITIVE_FIELDS, Sanitizer};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Create,
    CreateMany,
    List,
    Get,
    Patch,
    PatchById,
    Delete,
    DeleteById,
}

impl Operation {
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::CreateMany,
        Self::List,
        Self::Get,
        Self::Patch,
        Self::PatchById,
        Self::Delete,
        Self::DeleteById,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::CreateMany => "create-many",
            Self::List => "list",
            Self::Get => "get",
            Self::Patch => "patch",
            Self::PatchById => "patch-by-id",
            Self::Delete => "delete",
            Self::DeleteById => "delete-by-id",
        }
    }

    /// Whether the route carries an `:_id` path segment.
    #[must_use]
    pub const fn takes_id(self) -> bool {
        matches!(self, Self::Get | Self::PatchById | Self::DeleteById)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
