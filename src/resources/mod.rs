//! The concrete resources: schema, filter translation, wrappers and route guards.

pub mod employee;
pub mod guest;
pub mod room;

pub use employee::Employees;
pub use guest::Guests;
pub use room::Rooms;

use serde_json::Value;
use std::sync::Arc;

use crate::audit::AuditSink;
use crate::config::Config;
use crate::controller::{Noun, Operation, Request, ResourceHandlers, Response, Sanitizer};
use crate::errors::ConfigError;
use crate::permissions::{Permission, authorize};
use crate::query::{FilterTranslator, QueryCompiler};
use crate::service::DocumentService;
use crate::store::DocumentStore;

/// One resource as routed: the uniform handlers plus its access rules.
pub trait Resource: Send + Sync {
    fn handlers(&self) -> &ResourceHandlers;

    /// Permissions a route demands. `None` leaves the route open to anonymous callers.
    fn required(&self, op: Operation) -> Option<&'static [Permission]>;

    /// Runs `op` without checking access.
    fn handle(&self, op: Operation, req: &Request) -> Response {
        self.handlers().handle(op, req)
    }

    /// Checks access, then runs `op`.
    fn dispatch(&self, op: Operation, req: &Request) -> Response {
        if let Some(required) = self.required(op)
            && let Err(e) = authorize(req.granted.as_deref(), required)
        {
            return Response::from_error(&e);
        }
        self.handle(op, req)
    }
}

/// Everything a resource needs to build its service and handlers.
pub(crate) struct Parts<'a> {
    pub name: &'a str,
    pub feature: &'a str,
    pub created_alias: &'a str,
    pub translator: Arc<dyn FilterTranslator>,
}

pub(crate) fn build_handlers(
    parts: Parts<'_>,
    store: Arc<dyn DocumentStore>,
    audit: Arc<dyn AuditSink>,
    config: &Config,
) -> Result<ResourceHandlers, ConfigError> {
    let service = DocumentService::new(parts.name, store, audit, parts.translator)
        .with_feature(parts.feature)
        .with_created_alias(parts.created_alias);
    Ok(ResourceHandlers::new(Arc::new(service), Noun::regular(parts.name))
        .with_compiler(QueryCompiler::new(config.max_limit))
        .with_sanitizer(Sanitizer::new(config.sensitive_fields.iter().cloned()))
        .with_actor(config.actor_field.clone(), config.default_actor_id()?))
}

/// A copy of `req` whose body lacks `fields`.
pub(crate) fn without_fields(req: &Request, fields: &[&str]) -> Request {
    let mut stripped = req.clone();
    if let Value::Object(map) = &mut stripped.body {
        for f in fields {
            map.remove(*f);
        }
    }
    stripped
}
