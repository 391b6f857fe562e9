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

pub const NAME: &str = "guest";
pub const FEATURE: &str = "accommodation.guest";
pub const COLLECTION: &str = "innkeep.guests";
pub const CREATED_ALIAS: &str = "registered";

/// Fields only the booking flow may change.
pub const ACCOUNT_FIELDS: [&str; 1] = ["balance"];

const ANY_CALLER: &[Permission] = &[];
const REGISTER: &[Permission] = &[Permission::RegisterGuest];
const MODIFY: &[Permission] = &[Permission::UpdateGuestInfo, Permission::BookingARoom];
pub const INFO_PATCH: &[Permission] = &[Permission::UpdateGuestInfo];

#[must_use]
pub fn schema() -> Schema {
    Schema::new(COLLECTION, CREATED_ALIAS)
        .field(FieldSpec::string("firstName").required().lowercase())
        .field(FieldSpec::string("lastName").required().lowercase())
        .field(FieldSpec::string("middleName").lowercase())
        .field(FieldSpec::string("IDNumber").required().unique())
        .field(FieldSpec::string("phone").required().unique())
        .field(FieldSpec::string("email").lowercase().unique())
        .field(FieldSpec::string("nationality").required())
        .field(FieldSpec::boolean("isGroup").default_value(false))
        .field(FieldSpec::number("balance").default_value(0.0))
}

#[must_use]
pub fn filter(source: &BTreeMap<String, FilterValue>) -> Filter {
    FilterBuilder::new(source)
        .ids("_ids")
        .any_contains("name", &["firstName", "lastName", "middleName"], true)
        .contains("firstName", true)
        .contains("lastName", true)
        .contains("middleName", true)
        .contains("IDNumber", true)
        .contains("phone", true)
        .contains("email", true)
        .exact("nationality")
        .boolean("isGroup")
        .number("balance")
        .date("registeredAt")
        .build()
}

#[derive(Debug, Clone)]
pub struct Guests {
    handlers: ResourceHandlers,
}

impl Guests {
    /// # Errors
    /// `ConfigError` when the configured default actor is malformed.
    pub fn new(store: Arc<dyn DocumentStore>, audit: Arc<dyn AuditSink>, config: &Config) -> Result<Self, ConfigError> {
        let parts = Parts { name: NAME, feature: FEATURE, created_alias: CREATED_ALIAS, translator: Arc::new(filter) };
        Ok(Self { handlers: build_handlers(parts, store, audit, config)? })
    }

    /// Bulk patch of contact details; the balance is left alone.
    pub fn patch_info(&self, req: &Request) -> Response {
        self.handlers.patch(&without_fields(req, &ACCOUNT_FIELDS))
    }

    pub fn patch_info_by_id(&self, req: &Request) -> Response {
        self.handlers.patch_by_id(&without_fields(req, &ACCOUNT_FIELDS))
    }

    pub fn dispatch_info_patch(&self, by_id: bool, req: &Request) -> Response {
        if let Err(e) = authorize(req.granted.as_deref(), INFO_PATCH) {
            return Response::from_error(&e);
        }
        if by_id { self.patch_info_by_id(req) } else { self.patch_info(req) }
    }
}

impl Resource for Guests {
    fn handlers(&self) -> &ResourceHandlers {
        &self.handlers
    }

    fn required(&self, op: Operation) -> Option<&'static [Permission]> {
        Some(match op {
            Operation::Create | Operation::CreateMany => REGISTER,
            Operation::List | Operation::Get => ANY_CALLER,
            Operation::Patch | Operation::PatchById => MODIFY,
            Operation::Delete | Operation::DeleteById => INFO_PATCH,
        })
    }
}
