use regex::Regex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use super::{Parts, Resource, build_handlers};
use crate::audit::AuditSink;
use crate::config::Config;
use crate::controller::{Operation, Request, ResourceHandlers, Response};
use crate::errors::ConfigError;
use crate::permissions::{JobTitle, Permission, PermissionTable};
use crate::query::{Filter, FilterBuilder, FilterValue};
use crate::store::{DocumentStore, FieldSpec, Schema};

pub const NAME: &str = "employee";
pub const FEATURE: &str = "employee.employee";
pub const COLLECTION: &str = "innkeep.employees";
pub const CREATED_ALIAS: &str = "created";

static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4,10}$").expect("static regex"));

#[must_use]
pub fn schema() -> Schema {
    let titles: Vec<&str> = JobTitle::ALL.iter().map(|t| t.as_str()).collect();
    let permissions: Vec<String> = Permission::ALL
        .iter()
        .filter_map(|p| serde_json::to_value(p).ok())
        .filter_map(|v| v.as_str().map(ToString::to_string))
        .collect();
    Schema::new(COLLECTION, CREATED_ALIAS)
        .field(FieldSpec::string("firstName").required().lowercase())
        .field(FieldSpec::string("lastName").required().lowercase())
        .field(FieldSpec::string("middleName").lowercase())
        .field(FieldSpec::string("phone").required().unique())
        .field(FieldSpec::string("jobTitle").required().lowercase().one_of(&titles))
        .field(FieldSpec::string("code").required().unique().pattern(CODE_PATTERN.clone()))
        .field(FieldSpec::string("password").required())
        .field(FieldSpec::string("email"))
        .field(FieldSpec::boolean("isActive").default_value(true))
        .field(FieldSpec::string_array("permissions").required().one_of(&permissions))
}

#[must_use]
pub fn filter(source: &BTreeMap<String, FilterValue>) -> Filter {
    FilterBuilder::new(source)
        .ids("_ids")
        .any_contains("name", &["firstName", "lastName", "middleName"], false)
        .contains("firstName", false)
        .contains("lastName", false)
        .contains("middleName", false)
        .contains("phone", false)
        .exact("jobTitle")
        .boolean("isActive")
        .date("createdAt")
        .build()
}

#[derive(Debug, Clone)]
pub struct Employees {
    handlers: ResourceHandlers,
    table: Arc<PermissionTable>,
}

impl Employees {
    /// # Errors
    /// `ConfigError` when the configured default actor is malformed.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        audit: Arc<dyn AuditSink>,
        table: Arc<PermissionTable>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let parts = Parts { name: NAME, feature: FEATURE, created_alias: CREATED_ALIAS, translator: Arc::new(filter) };
        Ok(Self { handlers: build_handlers(parts, store, audit, config)?, table })
    }

    #[must_use]
    pub fn permission_table(&self) -> &PermissionTable {
        &self.table
    }

    /// Gives an employee without explicit permissions the defaults of its job title.
    fn with_default_permissions(&self, mut item: Value) -> Value {
        let Value::Object(map) = &mut item else {
            return item;
        };
        let empty = match map.get("permissions") {
            None | Some(Value::Null) => true,
            Some(Value::Array(list)) => list.is_empty(),
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        let title = map.get("jobTitle").and_then(Value::as_str).and_then(|t| t.parse::<JobTitle>().ok());
        if empty && let Some(title) = title {
            map.insert("permissions".into(), json!(self.table.for_title(title)));
        }
        item
    }

    fn filled(&self, req: &Request) -> Request {
        let mut filled = req.clone();
        filled.body = match std::mem::take(&mut filled.body) {
            Value::Array(items) => Value::Array(items.into_iter().map(|i| self.with_default_permissions(i)).collect()),
            single => self.with_default_permissions(single),
        };
        filled
    }

    pub fn create(&self, req: &Request) -> Response {
        self.handlers.create(&self.filled(req))
    }

    pub fn create_many(&self, req: &Request) -> Response {
        self.handlers.create_many(&self.filled(req))
    }

    /// The default permission table, keyed by job title.
    #[must_use]
    pub fn permissions_by_job_title(&self) -> Response {
        Response::ok("Permissions by job title retrieved successfully.", json!({ "retrieved": &*self.table }))
    }
}

impl Resource for Employees {
    fn handlers(&self) -> &ResourceHandlers {
        &self.handlers
    }

    // Staff routes are served without authentication.
    fn required(&self, _op: Operation) -> Option<&'static [Permission]> {
        None
    }

    fn handle(&self, op: Operation, req: &Request) -> Response {
        match op {
            Operation::Create => self.create(req),
            Operation::CreateMany => self.create_many(req),
            other => self.handlers.handle(other, req),
        }
    }
}
