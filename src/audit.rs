//! Audit trail of accepted mutations.
//!
//! Emission is best effort: the service logs a failing sink and carries on.

use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::errors::AuditError;
use crate::query::convert::stringify_date;
use crate::types::{
    DELETED_AT_FIELD, DELETED_BY_FIELD, UPDATED_AT_FIELD, UPDATED_BY_FIELD, id_of,
};
use crate::utils::json::document_to_json;

/// Log target routed to `audit.log` by the logger configuration.
pub const AUDIT_TARGET: &str = "innkeep::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AuditKind,
    pub at: String,
    pub who: Option<String>,
    pub feature: String,
    pub action: AuditAction,
    pub document_id: Option<String>,
    pub data: serde_json::Value,
}

impl AuditEvent {
    /// Builds an event from the mutation's payload.
    ///
    /// `who` and `at` come from the update stamps when present, else from the
    /// creation stamps named by `created_alias`.
    #[must_use]
    pub fn new(feature: &str, action: AuditAction, created_alias: &str, data: &BsonDocument) -> Self {
        let created_at = format!("{created_alias}At");
        let created_by = format!("{created_alias}By");
        let first = |fields: [&str; 3]| fields.into_iter().find_map(|f| data.get(f));
        let at = match first([UPDATED_AT_FIELD, DELETED_AT_FIELD, created_at.as_str()]) {
            Some(Bson::DateTime(d)) => DateTime::<Utc>::from_timestamp_millis(d.timestamp_millis()),
            _ => None,
        };
        let who = first([UPDATED_BY_FIELD, DELETED_BY_FIELD, created_by.as_str()]).map(|b| match b {
            Bson::ObjectId(o) => o.to_hex(),
            Bson::String(s) => s.clone(),
            other => other.to_string(),
        });
        Self {
            id: Uuid::new_v4(),
            kind: AuditKind::Info,
            at: stringify_date(at.unwrap_or_else(Utc::now)),
            who,
            feature: feature.to_string(),
            action,
            document_id: id_of(data).map(|id| id.to_hex()),
            data: document_to_json(data),
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// # Errors
    /// Returns `AuditError` when the event could not be recorded.
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Writes one JSON line per event to the `innkeep::audit` log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let line = serde_json::to_string(event)?;
        log::info!(target: AUDIT_TARGET, "{line}");
        Ok(())
    }
}

/// Captures events in memory. Can be switched to fail every call.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    #[must_use]
    pub fn count(&self, action: AuditAction) -> usize {
        self.events.read().iter().filter(|e| e.action == action).count()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(AuditError::Unavailable("memory sink switched off".into()));
        }
        self.events.write().push(event.clone());
        Ok(())
    }
}
