use bson::{Bson, Document as BsonDocument, doc};
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::diff::{apply_patch, has_effective_change};
use super::outcome::BulkOutcome;
use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::errors::{ServiceError, StoreError};
use crate::query::{Filter, FilterTranslator, FindOptions, Query};
use crate::store::DocumentStore;
use crate::types::{
    DELETED_AT_FIELD, DELETED_BY_FIELD, DELETED_FIELD, DocumentId, ID_FIELD, UPDATED_AT_FIELD,
    UPDATED_BY_FIELD, now,
};

/// Reason recorded for a matched document the patch would not change.
pub const NO_CHANGE_REASON: &str = "no effective change";
/// Reason recorded for an insert that failed for reasons other than the input.
pub const UNKNOWN_INSERT_REASON: &str = "unknown error occurred";

static ENGINE_FRAMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"E11000\s*|collection:\s*\S+\s+index:\s*\S+\s*").expect("static regex")
});

/// Strips storage-engine framing from a constraint violation, keeping the readable cause.
#[must_use]
pub fn clean_reason(err: &StoreError) -> String {
    let cause = match err {
        StoreError::BulkWrite { cause, .. } => cause.as_ref(),
        other => other,
    };
    ENGINE_FRAMING.replace_all(&cause.to_string(), "").trim().to_string()
}

enum Step {
    Affected(BsonDocument),
    Unaffected(BsonDocument, String),
}

/// Generic CRUD engine over one document type.
///
/// Batches are walked one document at a time; every save completes before the
/// next document is diffed.
pub struct DocumentService {
    name: String,
    feature: String,
    created_alias: String,
    store: Arc<dyn DocumentStore>,
    audit: Arc<dyn AuditSink>,
    translator: Arc<dyn FilterTranslator>,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("name", &self.name)
            .field("feature", &self.feature)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        audit: Arc<dyn AuditSink>,
        translator: Arc<dyn FilterTranslator>,
    ) -> Self {
        let name = name.into();
        Self { feature: name.clone(), name, created_alias: "created".into(), store, audit, translator }
    }

    /// Creation stamp pair, e.g. `registered` for `registeredAt`/`registeredBy`.
    #[must_use]
    pub fn with_created_alias(mut self, alias: impl Into<String>) -> Self {
        self.created_alias = alias.into();
        self
    }

    /// Label carried by audit events, e.g. `accommodation.room`.
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_alias(&self) -> &str {
        &self.created_alias
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The store filter a compiled query translates to.
    #[must_use]
    pub fn filter_for(&self, query: &Query) -> Filter {
        self.translator.translate(&query.filter)
    }

    fn emit(&self, action: AuditAction, data: &BsonDocument) {
        let event = AuditEvent::new(&self.feature, action, &self.created_alias, data);
        if let Err(e) = self.audit.record(&event) {
            log::warn!("{}: audit {:?} for {:?} dropped: {e}", self.feature, action, event.document_id);
        }
    }

    /// # Errors
    /// `Validation` or `Conflict` when the store rejects the document.
    pub fn create(&self, doc: BsonDocument) -> Result<BsonDocument, ServiceError> {
        let created = self.store.insert_one(doc)?;
        self.emit(AuditAction::Create, &created);
        Ok(created)
    }

    /// Inserts as many documents as the store accepts.
    ///
    /// After a bulk fault the offending document is set aside and insertion
    /// resumes just past it. The loop runs at most once per input.
    pub fn create_many(&self, docs: Vec<BsonDocument>) -> BulkOutcome<BsonDocument> {
        let total = docs.len();
        let mut outcome = BulkOutcome::default();
        let mut current = 0usize;
        let mut attempts = 0usize;

        while current < total && attempts < total {
            attempts += 1;
            match self.store.insert_many(docs[current..].to_vec()) {
                Ok(inserted) => {
                    outcome.affected.extend(inserted);
                    current = total;
                }
                Err(StoreError::BulkWrite { inserted, failed_index, cause }) => {
                    outcome.affected.extend(inserted);
                    let failed = current + failed_index;
                    if let Some(doc) = docs.get(failed) {
                        outcome.reject(doc.clone(), clean_reason(&cause));
                    }
                    current = failed + 1;
                }
                Err(other) => {
                    log::error!("{}: insert of document {current} failed: {other}", self.name);
                    let reason = if other.is_input_error() {
                        clean_reason(&other)
                    } else {
                        UNKNOWN_INSERT_REASON.to_string()
                    };
                    outcome.reject(docs[current].clone(), reason);
                    current += 1;
                }
            }
        }
        if current < total {
            log::warn!("{}: bulk insert gave up with {} documents left", self.name, total - current);
        }

        for doc in &outcome.affected {
            self.emit(AuditAction::Create, doc);
        }
        outcome
    }

    /// Runs the query. Paging applies only when `limited` is set.
    ///
    /// # Errors
    /// `Unknown` when the store cannot be read.
    pub fn read(&self, query: &Query, limited: bool) -> Result<Vec<BsonDocument>, ServiceError> {
        let options = FindOptions {
            projection: query.selection(),
            sort: query.sort.clone(),
            limit: limited.then_some(query.limit),
            skip: if limited { query.skip } else { 0 },
        };
        Ok(self.store.find(&self.filter_for(query), &options)?)
    }

    /// # Errors
    /// `NotFound` unless a live document has this id.
    pub fn read_by_id(&self, id: &DocumentId) -> Result<BsonDocument, ServiceError> {
        self.store.find_by_id(id)?.ok_or_else(|| ServiceError::NotFound(self.name.clone()))
    }

    // Full matching set in store form: no projection, no paging.
    fn matching(&self, query: &Query) -> Result<Vec<BsonDocument>, ServiceError> {
        let options = FindOptions { sort: query.sort.clone(), ..FindOptions::default() };
        Ok(self.store.find(&self.filter_for(query), &options)?)
    }

    fn update_one(&self, doc: BsonDocument, patch: &BsonDocument) -> Result<Step, ServiceError> {
        let before = doc.clone();
        let mut after = doc;
        let changes = apply_patch(&mut after, patch);
        if !has_effective_change(&changes) {
            return Ok(Step::Unaffected(before, NO_CHANGE_REASON.to_string()));
        }
        match self.store.save(after) {
            Ok(saved) => {
                let mut data = doc! { ID_FIELD: before.get(ID_FIELD).cloned().unwrap_or(Bson::Null) };
                for key in [UPDATED_AT_FIELD, UPDATED_BY_FIELD] {
                    if let Some(v) = patch.get(key) {
                        data.insert(key, v.clone());
                    }
                }
                for (key, value) in changes {
                    data.insert(key, value);
                }
                self.emit(AuditAction::Update, &data);
                Ok(Step::Affected(saved))
            }
            Err(e) if e.is_input_error() => Err(e.into()),
            Err(e) => {
                log::debug!("{}: save failed, document left unchanged: {e}", self.name);
                Ok(Step::Unaffected(before, e.to_string()))
            }
        }
    }

    fn patch_of(&self, patch: &BsonDocument) -> Result<BsonDocument, ServiceError> {
        Ok(self.store.cast_patch(patch)?)
    }

    /// Applies `patch` to every matching document.
    ///
    /// Validation and uniqueness faults abort the whole batch.
    ///
    /// # Errors
    /// `Validation` or `Conflict` for bad input, `Unknown` when the store cannot be read.
    pub fn update(&self, query: &Query, patch: &BsonDocument) -> Result<BulkOutcome<BsonDocument>, ServiceError> {
        let patch = self.patch_of(patch)?;
        let mut outcome = BulkOutcome::default();
        for doc in self.matching(query)? {
            match self.update_one(doc, &patch)? {
                Step::Affected(d) => outcome.affected.push(d),
                Step::Unaffected(d, reason) => outcome.reject(d, reason),
            }
        }
        Ok(outcome)
    }

    /// # Errors
    /// `NotFound` first, then as [`Self::update`].
    pub fn update_by_id(
        &self,
        id: &DocumentId,
        patch: &BsonDocument,
    ) -> Result<BulkOutcome<BsonDocument>, ServiceError> {
        let doc = self.read_by_id(id)?;
        let patch = self.patch_of(patch)?;
        let mut outcome = BulkOutcome::default();
        match self.update_one(doc, &patch)? {
            Step::Affected(d) => outcome.affected.push(d),
            Step::Unaffected(d, reason) => outcome.reject(d, reason),
        }
        Ok(outcome)
    }

    fn delete_one(&self, doc: BsonDocument, actor: &DocumentId) -> Step {
        let before = doc.clone();
        let mut after = doc;
        let at = now();
        let forced = doc! {
            DELETED_FIELD: true,
            DELETED_BY_FIELD: actor.0,
            DELETED_AT_FIELD: at,
            UPDATED_BY_FIELD: actor.0,
            UPDATED_AT_FIELD: at,
        };
        let changes = apply_patch(&mut after, &forced);
        match self.store.save(after) {
            Ok(saved) => {
                let mut data = doc! { ID_FIELD: before.get(ID_FIELD).cloned().unwrap_or(Bson::Null) };
                for (key, value) in forced {
                    data.insert(key, value);
                }
                log::debug!("{}: soft-deleted with {} changed fields", self.name, changes.len());
                self.emit(AuditAction::Delete, &data);
                Step::Affected(saved)
            }
            Err(e) => {
                log::debug!("{}: delete failed, document left unchanged: {e}", self.name);
                Step::Unaffected(before, e.to_string())
            }
        }
    }

    /// Soft-deletes every matching document.
    ///
    /// # Errors
    /// `Unknown` when the store cannot be read.
    pub fn delete(&self, query: &Query, actor: &DocumentId) -> Result<BulkOutcome<BsonDocument>, ServiceError> {
        let mut outcome = BulkOutcome::default();
        for doc in self.matching(query)? {
            match self.delete_one(doc, actor) {
                Step::Affected(d) => outcome.affected.push(d),
                Step::Unaffected(d, reason) => outcome.reject(d, reason),
            }
        }
        Ok(outcome)
    }

    /// # Errors
    /// `NotFound` unless a live document has this id.
    pub fn delete_by_id(&self, id: &DocumentId, actor: &DocumentId) -> Result<BulkOutcome<BsonDocument>, ServiceError> {
        let doc = self.read_by_id(id)?;
        let mut outcome = BulkOutcome::default();
        match self.delete_one(doc, actor) {
            Step::Affected(d) => outcome.affected.push(d),
            Step::Unaffected(d, reason) => outcome.reject(d, reason),
        }
        Ok(outcome)
    }
}
