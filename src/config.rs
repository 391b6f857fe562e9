use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::controller::DEFAULT_ACTOR_FIELD;
use crate::controller::DEFAULT_SENSITIVE_FIELDS;
use crate::errors::ConfigError;
use crate::permissions::{JobTitle, Permission, PermissionTable};
use crate::query::DEFAULT_MAX_LIMIT;
use crate::types::{DocumentId, SYSTEM_ACTOR};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "innkeep.toml";
pub const CONFIG_PATH_ENV: &str = "INNKEEP_CONFIG";
pub const MAX_LIMIT_ENV: &str = "INNKEEP_MAX_LIMIT";
pub const DEFAULT_ACTOR_ENV: &str = "INNKEEP_DEFAULT_ACTOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base directory for `app.log` and `audit.log`; the working directory when unset.
    pub dir: Option<PathBuf>,
    pub level: String,
    /// Rolled files kept per log.
    pub retention: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: None, level: "info".into(), retention: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default and ceiling for a query's `limit`.
    pub max_limit: usize,
    pub default_actor: String,
    pub actor_field: String,
    pub sensitive_fields: Vec<String>,
    pub log: LogConfig,
    /// Per-title replacements for the default permission table.
    pub permissions: BTreeMap<JobTitle, Vec<Permission>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
            default_actor: SYSTEM_ACTOR.to_string(),
            actor_field: DEFAULT_ACTOR_FIELD.to_string(),
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS.iter().map(ToString::to_string).collect(),
            log: LogConfig::default(),
            permissions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolves the configuration for this process.
    ///
    /// The file is `explicit`, else `$INNKEEP_CONFIG`, else `./innkeep.toml`
    /// when it exists, else none. Environment overrides are applied last.
    ///
    /// # Errors
    /// A named file that is missing or malformed, or an override that does not parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit.map(Path::to_path_buf).or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        let mut config = match named {
            Some(path) => Self::from_file(&path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() { Self::from_file(fallback)? } else { Self::default() }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `Io` when the file cannot be read, `Toml` when it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// # Errors
    /// `Toml` when `text` is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    /// `TomlEncode` when the configuration cannot be rendered.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Applies `INNKEEP_MAX_LIMIT` and `INNKEEP_DEFAULT_ACTOR` as read by `lookup`.
    ///
    /// # Errors
    /// `InvalidValue` when an override does not parse.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(MAX_LIMIT_ENV) {
            self.max_limit = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: MAX_LIMIT_ENV.into(), value: raw.clone() })?;
        }
        if let Some(raw) = lookup(DEFAULT_ACTOR_ENV) {
            self.default_actor = raw.trim().to_string();
        }
        Ok(())
    }

    /// # Errors
    /// `InvalidValue` for a zero `max_limit` or a malformed `default_actor`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 {
            return Err(ConfigError::InvalidValue { key: "max_limit".into(), value: "0".into() });
        }
        self.default_actor_id().map(|_| ())
    }

    /// # Errors
    /// `InvalidValue` unless `default_actor` is a 24-character hex id.
    pub fn default_actor_id(&self) -> Result<DocumentId, ConfigError> {
        DocumentId::parse(&self.default_actor).map_err(|_| ConfigError::InvalidValue {
            key: "default_actor".into(),
            value: self.default_actor.clone(),
        })
    }

    #[must_use]
    pub fn permission_table(&self) -> PermissionTable {
        PermissionTable::with_overrides(&self.permissions)
    }
}
