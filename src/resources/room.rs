use bson::Bson;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Parts, Resource, build_handlers, without_fields};
use crate::audit::AuditSink;
use crate::config::Config;
use crate::controller::{Operation, Request, ResourceHandlers, Response};
use crate::errors::ConfigError;
use crate::permissions::{Permission, authorize};
use crate::query::{Filter, FilterBuilder, FilterValue};
use crate::store::{DocumentStore, FieldSpec, Schema};

pub const NAME: &str = "room";
pub const FEATURE: &str = "accommodation.room";
pub const COLLECTION: &str = "innkeep.rooms";
pub const CREATED_ALIAS: &str = "created";

pub const ROOM_TYPES: [&str; 5] = ["single", "double", "twin", "suite", "family"];
pub const OCCUPANCY_STATUSES: [&str; 3] = ["vacant", "occupied", "reserved"];

/// Housekeeping state an info-only patch may not touch.
pub const STATUS_FIELDS: [&str; 3] = ["isClean", "occupancy", "isOutOfOrder"];

const ANY_CALLER: &[Permission] = &[];
const CREATE: &[Permission] = &[Permission::CreateRoom];
const MODIFY: &[Permission] = &[Permission::UpdateRoomInfo, Permission::UpdateRoomStatus];
pub const INFO_PATCH: &[Permission] = &[Permission::UpdateRoomInfo];

#[must_use]
pub fn schema() -> Schema {
    Schema::new(COLLECTION, CREATED_ALIAS)
        .field(FieldSpec::string("number").required().unique().lowercase())
        .field(FieldSpec::string("type").required().one_of(&ROOM_TYPES))
        .field(FieldSpec::string("floor").required().lowercase())
        .field(FieldSpec::boolean("isClean").default_value(true))
        .field(FieldSpec::string("occupancy").required().one_of(&OCCUPANCY_STATUSES))
        .field(FieldSpec::boolean("isOutOfOrder").default_value(false))
        .field(FieldSpec::string_array("note").default_value(Bson::Array(Vec::new())))
}

#[must_use]
pub fn filter(source: &BTreeMap<String, FilterValue>) -> Filter {
    FilterBuilder::new(source)
        .ids("_ids")
        .exact("number")
        .exact("type")
        .exact("floor")
        .boolean("isClean")
        .exact("occupancy")
        .boolean("isOutOfOrder")
        .date("createdAt")
        .build()
}

#[derive(Debug, Clone)]
pub struct Rooms {
    handlers: ResourceHandlers,
}

impl Rooms {
    /// # Errors
    /// `ConfigError` when the configured default actor is malformed.
    pub fn new(store: Arc<dyn DocumentStore>, audit: Arc<dyn AuditSink>, config: &Config) -> Result<Self, ConfigError> {
        let parts = Parts { name: NAME, feature: FEATURE, created_alias: CREATED_ALIAS, translator: Arc::new(filter) };
        Ok(Self { handlers: build_handlers(parts, store, audit, config)? })
    }

    /// Bulk patch that leaves housekeeping state alone.
    pub fn patch_info(&self, req: &Request) -> Response {
        self.handlers.patch(&without_fields(req, &STATUS_FIELDS))
    }

    pub fn patch_info_by_id(&self, req: &Request) -> Response {
        self.handlers.patch_by_id(&without_fields(req, &STATUS_FIELDS))
    }

    /// Checks access, then runs the info patch selected by `by_id`.
    pub fn dispatch_info_patch(&self, by_id: bool, req: &Request) -> Response {
        if let Err(e) = authorize(req.granted.as_deref(), INFO_PATCH) {
            return Response::from_error(&e);
        }
        if by_id { self.patch_info_by_id(req) } else { self.patch_info(req) }
    }
}

impl Resource for Rooms {
    fn handlers(&self) -> &ResourceHandlers {
        &self.handlers
    }

    fn required(&self, op: Operation) -> Option<&'static [Permission]> {
        Some(match op {
            Operation::Create | Operation::CreateMany => CREATE,
            Operation::List | Operation::Get => ANY_CALLER,
            Operation::Patch | Operation::PatchById | Operation::Delete | Operation::DeleteById => MODIFY,
        })
    }
}
