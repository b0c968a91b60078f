//! Configuration loader with multi-source merging

use crate::FleetgateConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// Git-tracked project configuration.
pub const PROJECT_CONFIG_FILE: &str = "fleetgate.toml";

/// Gitignored local overrides, applied after [`PROJECT_CONFIG_FILE`].
pub const LOCAL_CONFIG_FILE: &str = "fleetgate.local.toml";

/// `~/.config/fleetgate/config.toml` on Linux; `None` without a home directory.
fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "Fleetgate", "fleetgate")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "FLEETGATE".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "FLEETGATE")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/fleetgate/config.toml (for hermetic tests)
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<FleetgateConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = FleetgateConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2-4. User, project, then local files
        for file in self.config_files() {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (FLEETGATE_FETCH__TIMEOUT_MS=500)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut fleetgate_config: FleetgateConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        fleetgate_config.resolve_paths(&self.project_dir);
        fleetgate_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(fleetgate_config)
    }

    /// Existing configuration files, lowest precedence first.
    pub fn config_files(&self) -> Vec<PathBuf> {
        let user = self
            .include_user_config
            .then(user_config_file)
            .flatten();

        user.into_iter()
            .chain([
                self.project_dir.join(PROJECT_CONFIG_FILE),
                self.project_dir.join(LOCAL_CONFIG_FILE),
            ])
            .filter(|file| file.exists())
            .collect()
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> FleetgateConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("FLEETGATE_LOADER_TEST")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config, FleetgateConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[schema.subjects]
vehicle = ["plate", "model_year", "status"]
driver = ["name", "license"]

[tables.vehicles]
subject = "vehicle"
action = "read"
minimal_safe_fields = ["plate"]
columns = [
  { id = "plate", field = "plate", hideable = false },
  { id = "year", field = "model_year" },
]

[fetch]
timeout_ms = 2500
membership_file = "memberships.json"
"#;
        fs::write(project_dir.join("fleetgate.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.schema.subjects["vehicle"], ["plate", "model_year", "status"]);
        assert_eq!(config.table("vehicles").unwrap().columns.len(), 2);
        assert_eq!(config.fetch.timeout_ms, 2500);
        assert_eq!(
            config.fetch.membership_file,
            Some(project_dir.join("memberships.json"))
        );
        assert_eq!(config.cache.selector_capacity, 256);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("fleetgate.toml"),
            r#"
[fetch]
timeout_ms = 2500
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("fleetgate.local.toml"),
            r#"
[fetch]
timeout_ms = 50
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.fetch.timeout_ms, 50);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("fleetgate.toml"),
            r#"
[tables.trailers]
subject = "trailer"
action = "read"
"#,
        )
        .expect("Failed to write config");

        let err = loader(project_dir).load().unwrap_err();
        assert!(format!("{err:#}").contains("unknown subject 'trailer'"));
        assert_eq!(loader(project_dir).load_or_default(), FleetgateConfig::default());
    }

    #[test]
    fn test_config_files_in_precedence_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        assert!(loader(project_dir).config_files().is_empty());

        fs::write(project_dir.join(LOCAL_CONFIG_FILE), "").expect("Failed to write local config");
        fs::write(project_dir.join(PROJECT_CONFIG_FILE), "").expect("Failed to write project config");

        assert_eq!(
            loader(project_dir).config_files(),
            [
                project_dir.join("fleetgate.toml"),
                project_dir.join("fleetgate.local.toml"),
            ]
        );
    }

    #[test]
    fn test_user_config_file_is_per_application() {
        if let Some(file) = user_config_file() {
            assert!(file.to_string_lossy().contains("fleetgate"));
            assert!(file.ends_with("config.toml"));
        }
    }

    // Environment overrides use a double underscore between the section and
    // the key, e.g. FLEETGATE_FETCH__TIMEOUT_MS=500. They are not exercised
    // here because the process environment is shared between tests.
}
