//! Document store seam.
//!
//! The service layer builds its guarantees on these primitives only: filtered
//! reads that hide soft-deleted documents, ordered bulk inserts that report the
//! prefix written before a fault, and optimistic per-document saves.

mod memory;
mod schema;

pub use memory::MemoryStore;
pub use schema::{FieldKind, FieldSpec, Schema};

use bson::Document as BsonDocument;

use crate::errors::StoreError;
use crate::query::{Filter, FindOptions};
use crate::types::DocumentId;

pub trait DocumentStore: Send + Sync {
    /// Fully qualified collection name, used in error framing.
    fn name(&self) -> &str;

    /// Live documents matching `filter`, sorted, paged, then projected.
    ///
    /// # Errors
    /// `StoreError::Backend` when the store cannot be read.
    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<BsonDocument>, StoreError>;

    /// The live document with this id.
    ///
    /// # Errors
    /// `StoreError::Backend` when the store cannot be read.
    fn find_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError>;

    /// The document with this id, soft-deleted or not.
    ///
    /// # Errors
    /// `StoreError::Backend` when the store cannot be read.
    fn find_raw_by_id(&self, id: &DocumentId) -> Result<Option<BsonDocument>, StoreError>;

    /// # Errors
    /// `Validation` or `Duplicate` when the document is rejected.
    fn insert_one(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError>;

    /// Ordered insert. Stops at the first rejected document.
    ///
    /// # Errors
    /// `BulkWrite` carrying the documents written before the fault, the fault's
    /// index within `docs` and its cause.
    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<Vec<BsonDocument>, StoreError>;

    /// Replaces a stored document. The stored `__v` must equal the given one.
    ///
    /// # Errors
    /// `NotFound`, `VersionConflict`, `Validation` or `Duplicate`.
    fn save(&self, doc: BsonDocument) -> Result<BsonDocument, StoreError>;

    /// Casts a partial update to stored types, dropping undeclared fields.
    ///
    /// # Errors
    /// `Validation` when a value cannot be cast.
    fn cast_patch(&self, patch: &BsonDocument) -> Result<BsonDocument, StoreError> {
        Ok(patch.clone())
    }
}
