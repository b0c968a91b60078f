//! Configuration management for Fleetgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (FLEETGATE_* prefix, `__` between sections)
//! 3. fleetgate.local.toml (gitignored, local overrides)
//! 4. fleetgate.toml (git-tracked, project config)
//! 5. ~/.config/fleetgate/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)
//!
//! ```toml
//! [schema.subjects]
//! vehicle = ["plate", "model_year", "color", "status"]
//!
//! [tables.vehicles]
//! subject = "vehicle"
//! action = "read"
//! minimal_safe_fields = ["plate"]
//! always_visible_fields = ["plate"]
//! columns = [
//!   { id = "plate", field = "plate", hideable = false },
//!   { id = "status", field = "status" },
//! ]
//!
//! [fetch]
//! timeout_ms = 10000
//! ```

use fleetgate_types::normalize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLoader, LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE};

/// Main Fleetgate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetgateConfig {
    pub schema: SchemaConfig,
    pub tables: BTreeMap<String, TableConfig>,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
}

/// Attribute schema: subject -> full attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub subjects: BTreeMap<String, Vec<String>>,
}

impl SchemaConfig {
    /// Subject lookup with the same normalization the attribute registry applies.
    pub fn contains_subject(&self, subject: &str) -> bool {
        let subject = normalize(subject);
        self.subjects.keys().any(|s| normalize(s) == subject)
    }
}

/// A permissioned table preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub subject: String,
    pub action: String,
    pub minimal_safe_fields: Vec<String>,
    pub always_visible_fields: Vec<String>,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    pub field: String,
    #[serde(default = "default_hideable")]
    pub hideable: bool,
}

fn default_hideable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on one membership fetch.
    pub timeout_ms: u64,
    /// Membership JSON served by the file fetcher.
    pub membership_file: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            membership_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoized attribute resolutions kept per snapshot.
    pub selector_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            selector_capacity: 256,
        }
    }
}

impl FleetgateConfig {
    /// Parses a single TOML document (no layering).
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Looks up a table preset by id.
    pub fn table(&self, table_id: &str) -> Option<&TableConfig> {
        self.tables.get(table_id)
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if let Some(file) = &self.fetch.membership_file
            && file.is_relative()
        {
            self.fetch.membership_file = Some(base.join(file));
        }
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.cache.selector_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.selector_capacity must be greater than zero".to_string(),
            ));
        }

        for (table_id, table) in &self.tables {
            if table.subject.trim().is_empty() || table.action.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "table '{table_id}' needs both a subject and an action"
                )));
            }

            if !self.schema.contains_subject(&table.subject) {
                return Err(ConfigError::ValidationError(format!(
                    "table '{table_id}' references unknown subject '{}'",
                    table.subject
                )));
            }

            let mut seen = HashSet::new();
            for column in &table.columns {
                if !seen.insert(column.id.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "table '{table_id}' declares column '{}' twice",
                        column.id
                    )));
                }
            }
        }

        Ok(())
    }
}
