mod diff;
mod document_service;
mod outcome;

pub use diff::{apply_patch, has_effective_change};
pub use document_service::{DocumentService, NO_CHANGE_REASON, UNKNOWN_INSERT_REASON, clean_reason};
pub use outcome::{BulkOutcome, Rejected};
