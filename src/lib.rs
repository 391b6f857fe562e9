//! Hotel back-office resources over a document store.
//!
//! Each resource (rooms, guests, employees) is served by the same three
//! layers: a [`query::QueryCompiler`] that turns URL query strings into a
//! [`query::Query`], a [`service::DocumentService`] that performs audited
//! writes with partial-failure recovery, and [`controller::ResourceHandlers`]
//! that wrap every outcome in a [`envelope::ResponseEnvelope`].

pub mod audit;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod errors;
pub mod logger;
pub mod permissions;
pub mod query;
pub mod resources;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use crate::audit::{AuditSink, LogAuditSink};
use crate::config::Config;
use crate::errors::ConfigError;
use crate::permissions::PermissionTable;
use crate::resources::{Employees, Guests, Resource, Rooms, employee, guest, room};
use crate::store::{DocumentStore, MemoryStore};

/// All resources wired to their stores and one audit sink.
#[derive(Debug, Clone)]
pub struct Backend {
    config: Config,
    permissions: Arc<PermissionTable>,
    rooms: Rooms,
    guests: Guests,
    employees: Employees,
}

impl Backend {
    /// In-memory stores, audit events written to the log.
    ///
    /// # Errors
    /// `ConfigError` when the configuration does not validate.
    pub fn in_memory(config: Config) -> Result<Self, ConfigError> {
        Self::with_audit(config, Arc::new(LogAuditSink))
    }

    /// # Errors
    /// `ConfigError` when the configuration does not validate.
    pub fn with_audit(config: Config, audit: Arc<dyn AuditSink>) -> Result<Self, ConfigError> {
        Self::with_stores(
            config,
            audit,
            Arc::new(MemoryStore::new(room::schema())),
            Arc::new(MemoryStore::new(guest::schema())),
            Arc::new(MemoryStore::new(employee::schema())),
        )
    }

    /// # Errors
    /// `ConfigError` when the configuration does not validate.
    pub fn with_stores(
        config: Config,
        audit: Arc<dyn AuditSink>,
        rooms: Arc<dyn DocumentStore>,
        guests: Arc<dyn DocumentStore>,
        employees: Arc<dyn DocumentStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let permissions = Arc::new(config.permission_table());
        let rooms = Rooms::new(rooms, Arc::clone(&audit), &config)?;
        let guests = Guests::new(guests, Arc::clone(&audit), &config)?;
        let employees = Employees::new(employees, audit, Arc::clone(&permissions), &config)?;
        log::info!("backend ready: max_limit={} resources=[room, guest, employee]", config.max_limit);
        Ok(Self { config, permissions, rooms, guests, employees })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    #[must_use]
    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }

    #[must_use]
    pub fn guests(&self) -> &Guests {
        &self.guests
    }

    #[must_use]
    pub fn employees(&self) -> &Employees {
        &self.employees
    }

    /// Looks a resource up by its singular name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&dyn Resource> {
        match name {
            room::NAME => Some(&self.rooms),
            guest::NAME => Some(&self.guests),
            employee::NAME => Some(&self.employees),
            _ => None,
        }
    }
}

/// Loads the configuration and installs the logger it describes.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or logging cannot be set up.
pub fn init(config_path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    logger::configure(&config.log)?;
    log::info!("innkeep initialized");
    Ok(config)
}
