use bson::Document as BsonDocument;
use serde_json::{Value, json};
use std::sync::Arc;

use super::messages::{self, Noun};
use super::request::{Request, Response};
use super::sanitize::Sanitizer;
use super::Operation;
use crate::errors::ServiceError;
use crate::query::{Query, QueryCompiler};
use crate::service::{BulkOutcome, DocumentService};
use crate::types::{DELETED_AT_FIELD, DELETED_BY_FIELD, DELETED_FIELD, DocumentId, SYSTEM_ACTOR, UPDATED_AT_FIELD, UPDATED_BY_FIELD, now};
use crate::utils::json::{document_to_json, json_to_document};

/// Body field carrying the authenticated actor unless configured otherwise.
pub const DEFAULT_ACTOR_FIELD: &str = "requesterId";

/// The eight uniform operations of one resource over a [`DocumentService`].
#[derive(Debug, Clone)]
pub struct ResourceHandlers {
    service: Arc<DocumentService>,
    noun: Noun,
    compiler: QueryCompiler,
    sanitizer: Sanitizer,
    actor_field: String,
    default_actor: DocumentId,
}

impl ResourceHandlers {
    #[must_use]
    pub fn new(service: Arc<DocumentService>, noun: Noun) -> Self {
        let default_actor = DocumentId::parse(SYSTEM_ACTOR).unwrap_or_default();
        Self {
            service,
            noun,
            compiler: QueryCompiler::default(),
            sanitizer: Sanitizer::default(),
            actor_field: DEFAULT_ACTOR_FIELD.to_string(),
            default_actor,
        }
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: QueryCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Where the actor id is read from, and who acts when it is absent.
    #[must_use]
    pub fn with_actor(mut self, field: impl Into<String>, default_actor: DocumentId) -> Self {
        self.actor_field = field.into();
        self.default_actor = default_actor;
        self
    }

    #[must_use]
    pub fn service(&self) -> &Arc<DocumentService> {
        &self.service
    }

    #[must_use]
    pub fn noun(&self) -> &Noun {
        &self.noun
    }

    #[must_use]
    pub const fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn handle(&self, op: Operation, req: &Request) -> Response {
        match op {
            Operation::Create => self.create(req),
            Operation::CreateMany => self.create_many(req),
            Operation::List => self.list(req),
            Operation::Get => self.get(req),
            Operation::Patch => self.patch(req),
            Operation::PatchById => self.patch_by_id(req),
            Operation::Delete => self.delete(req),
            Operation::DeleteById => self.delete_by_id(req),
        }
    }

    pub fn create(&self, req: &Request) -> Response {
        self.try_create(req).into()
    }

    pub fn create_many(&self, req: &Request) -> Response {
        self.try_create_many(req).into()
    }

    pub fn list(&self, req: &Request) -> Response {
        self.try_list(req).into()
    }

    pub fn get(&self, req: &Request) -> Response {
        self.try_get(req).into()
    }

    pub fn patch(&self, req: &Request) -> Response {
        self.try_patch(req).into()
    }

    pub fn patch_by_id(&self, req: &Request) -> Response {
        self.try_patch_by_id(req).into()
    }

    pub fn delete(&self, req: &Request) -> Response {
        self.try_delete(req).into()
    }

    pub fn delete_by_id(&self, req: &Request) -> Response {
        self.try_delete_by_id(req).into()
    }

    fn query(&self, req: &Request) -> Query {
        self.compiler.compile(&req.query)
    }

    /// The path id, checked before anything reaches the service.
    fn path_id(req: &Request) -> Result<DocumentId, ServiceError> {
        DocumentId::parse(req.id.as_deref().unwrap_or_default())
    }

    fn actor_of(&self, body: &Value) -> Result<DocumentId, ServiceError> {
        match body.get(&self.actor_field) {
            None | Some(Value::Null) => Ok(self.default_actor),
            Some(Value::String(s)) => DocumentId::parse(s),
            Some(other) => Err(ServiceError::InvalidIdentifier(other.to_string())),
        }
    }

    /// Converts one inbound object and stamps its creation pair.
    fn creation(&self, item: &Value, actor: DocumentId) -> Result<BsonDocument, ServiceError> {
        let mut doc = json_to_document(item)?;
        doc.remove(&self.actor_field);
        let alias = self.service.created_alias();
        doc.insert(format!("{alias}At"), now());
        doc.insert(format!("{alias}By"), actor.0);
        Ok(doc)
    }

    /// Strips fields a caller may not patch; `None` when nothing is left.
    fn patch_body(&self, body: &Value, actor: DocumentId) -> Result<Option<BsonDocument>, ServiceError> {
        let mut patch = match body {
            Value::Null => BsonDocument::new(),
            other => json_to_document(other)?,
        };
        let alias = self.service.created_alias();
        for key in [self.actor_field.clone(), format!("{alias}At"), format!("{alias}By")] {
            patch.remove(&key);
        }
        for key in [DELETED_FIELD, DELETED_AT_FIELD, DELETED_BY_FIELD] {
            patch.remove(key);
        }
        if patch.is_empty() {
            return Ok(None);
        }
        patch.insert(UPDATED_BY_FIELD, actor.0);
        patch.insert(UPDATED_AT_FIELD, now());
        Ok(Some(patch))
    }

    fn clean(&self, doc: &BsonDocument) -> Value {
        self.sanitizer.clean(document_to_json(doc))
    }

    fn clean_outcome(&self, outcome: BulkOutcome<BsonDocument>) -> BulkOutcome<Value> {
        self.sanitizer.clean_outcome(outcome.map(|d| document_to_json(&d)))
    }

    fn try_create(&self, req: &Request) -> Result<Response, ServiceError> {
        let actor = self.actor_of(&req.body)?;
        let created = self.service.create(self.creation(&req.body, actor)?)?;
        Ok(Response::created(messages::created(&self.noun), json!({ "inserted": self.clean(&created) })))
    }

    fn try_create_many(&self, req: &Request) -> Result<Response, ServiceError> {
        let items = match &req.body {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            let actor = self.actor_of(item)?;
            docs.push(self.creation(item, actor)?);
        }
        let outcome = self.clean_outcome(self.service.create_many(docs));
        let counts = outcome.counts();
        let data = json!({
            "inserted": outcome.affected,
            "notInserted": outcome.unaffected,
            "insertedCount": counts.0,
            "notInsertedCount": counts.1,
        });
        let message = messages::created_many(&self.noun, counts);
        Ok(if counts.0 > 0 { Response::created(message, data) } else { Response::ok(message, data) })
    }

    fn try_list(&self, req: &Request) -> Result<Response, ServiceError> {
        let found = self.service.read(&self.query(req), true)?;
        let retrieved: Vec<Value> = found.iter().map(|d| self.clean(d)).collect();
        let count = retrieved.len();
        Ok(Response::ok(messages::listed(&self.noun), json!({ "retrieved": retrieved, "matchCount": count })))
    }

    fn try_get(&self, req: &Request) -> Result<Response, ServiceError> {
        let id = Self::path_id(req)?;
        let found = self.service.read_by_id(&id)?;
        Ok(Response::ok(messages::fetched(&self.noun), json!({ "retrieved": self.clean(&found) })))
    }

    fn update_data(outcome: &BulkOutcome<Value>) -> Value {
        json!({
            "updated": outcome.affected,
            "notUpdated": outcome.unaffected,
            "updatedCount": outcome.affected_count(),
            "notUpdatedCount": outcome.unaffected_count(),
        })
    }

    fn delete_data(outcome: &BulkOutcome<Value>) -> Value {
        json!({
            "deleted": outcome.affected,
            "notDeleted": outcome.unaffected,
            "deletedCount": outcome.affected_count(),
            "notDeletedCount": outcome.unaffected_count(),
        })
    }

    fn try_patch(&self, req: &Request) -> Result<Response, ServiceError> {
        let actor = self.actor_of(&req.body)?;
        let patch = self
            .patch_body(&req.body, actor)?
            .ok_or_else(|| ServiceError::EmptyUpdate(self.noun.plural().to_string()))?;
        let outcome = self.clean_outcome(self.service.update(&self.query(req), &patch)?);
        Ok(Response::ok(messages::patched(&self.noun, outcome.counts()), Self::update_data(&outcome)))
    }

    fn try_patch_by_id(&self, req: &Request) -> Result<Response, ServiceError> {
        let id = Self::path_id(req)?;
        let actor = self.actor_of(&req.body)?;
        let patch = self
            .patch_body(&req.body, actor)?
            .ok_or_else(|| ServiceError::EmptyUpdate(self.noun.singular().to_string()))?;
        let outcome = self.clean_outcome(self.service.update_by_id(&id, &patch)?);
        Ok(Response::ok(messages::patched_by_id(&self.noun, outcome.counts()), Self::update_data(&outcome)))
    }

    fn try_delete(&self, req: &Request) -> Result<Response, ServiceError> {
        let actor = self.actor_of(&req.body)?;
        let outcome = self.clean_outcome(self.service.delete(&self.query(req), &actor)?);
        Ok(Response::ok(messages::deleted(&self.noun, outcome.counts()), Self::delete_data(&outcome)))
    }

    fn try_delete_by_id(&self, req: &Request) -> Result<Response, ServiceError> {
        let id = Self::path_id(req)?;
        let actor = self.actor_of(&req.body)?;
        let outcome = self.clean_outcome(self.service.delete_by_id(&id, &actor)?);
        Ok(Response::ok(messages::deleted_by_id(&self.noun, outcome.counts()), Self::delete_data(&outcome)))
    }
}
