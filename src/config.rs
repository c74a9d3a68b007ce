//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sitmerge/sitmerge.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `SITMERGE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Unified configuration for sitmerge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory for per-experiment log files (None disables file logging)
    pub log_dir: Option<PathBuf>,
    /// Remove old log files before a run
    pub clean_logs: bool,
    /// Top-level node holding one experiment definition
    pub definition_node: String,
    /// Node inside a definition holding results and situations
    pub results_node: String,
    /// Key carrying the experiment id
    pub id_key: String,
    /// File extension scanned when a directory is given
    pub file_extension: String,
    /// Drop Situation/Body nodes from RESULTS once they are flattened
    pub strip_sources: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            clean_logs: true,
            definition_node: "EXPERIMENT_DEFINITION".into(),
            results_node: "RESULTS".into(),
            id_key: "id".into(),
            file_extension: "cfg".into(),
            strip_sources: false,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub log_dir: Option<PathBuf>,
    pub clean_logs: Option<bool>,
    pub definition_node: Option<String>,
    pub results_node: Option<String>,
    pub id_key: Option<String>,
    pub file_extension: Option<String>,
    pub strip_sources: Option<bool>,
}

/// Default log directory (`<cache dir>/sitmerge/logs`).
fn default_log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sitmerge").map(|dirs| dirs.cache_dir().join("logs"))
}

/// Get the XDG config directory for sitmerge.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sitmerge").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sitmerge.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.log_dir {
            let expanded = expand_env_vars(dir.to_string_lossy().as_ref());
            self.log_dir = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            log_dir: overlay.log_dir.clone().or_else(|| self.log_dir.clone()),
            clean_logs: overlay.clean_logs.unwrap_or(self.clean_logs),
            definition_node: overlay
                .definition_node
                .clone()
                .unwrap_or_else(|| self.definition_node.clone()),
            results_node: overlay
                .results_node
                .clone()
                .unwrap_or_else(|| self.results_node.clone()),
            id_key: overlay.id_key.clone().unwrap_or_else(|| self.id_key.clone()),
            file_extension: overlay
                .file_extension
                .clone()
                .unwrap_or_else(|| self.file_extension.clone()),
            strip_sources: overlay.strip_sources.unwrap_or(self.strip_sources),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional config file given on the command line
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/sitmerge/sitmerge.toml`
    /// 3. Local config file (must exist when given)
    /// 4. Environment variables: `SITMERGE_*` prefix
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(local) = local_config {
            let raw = load_raw_settings(local)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply SITMERGE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SITMERGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("log_dir") {
            settings.log_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
        if let Ok(val) = config.get_bool("clean_logs") {
            settings.clean_logs = val;
        }
        if let Ok(val) = config.get_string("definition_node") {
            settings.definition_node = val;
        }
        if let Ok(val) = config.get_string("results_node") {
            settings.results_node = val;
        }
        if let Ok(val) = config.get_string("id_key") {
            settings.id_key = val;
        }
        if let Ok(val) = config.get_string("file_extension") {
            settings.file_extension = val;
        }
        if let Ok(val) = config.get_bool("strip_sources") {
            settings.strip_sources = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# sitmerge configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/sitmerge/sitmerge.toml
#   Local:  file given with --config
#   Env:    SITMERGE_* environment variables (e.g. SITMERGE_LOG_DIR)

# Directory for per-experiment log files (one <id>.log per experiment)
# log_dir = "~/.cache/sitmerge/logs"

# Remove old log files at the start of each run
# clean_logs = true

# Node names of the definition documents
# definition_node = "EXPERIMENT_DEFINITION"
# results_node = "RESULTS"
# id_key = "id"

# Extension of definition files when a directory is given
# file_extension = "cfg"

# Remove Situation/Body nodes from RESULTS after flattening them
# strip_sources = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_uses_experiment_node_names() {
        let settings = Settings::default();
        assert_eq!(settings.definition_node, "EXPERIMENT_DEFINITION");
        assert_eq!(settings.results_node, "RESULTS");
        assert_eq!(settings.id_key, "id");
        assert_eq!(settings.file_extension, "cfg");
        assert!(settings.clean_logs);
        assert!(!settings.strip_sources);
    }

    #[test]
    fn given_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            results_node: Some("OUTCOMES".to_string()),
            strip_sources: Some(true),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.results_node, "OUTCOMES");
        assert!(merged.strip_sources);
        assert_eq!(merged.definition_node, base.definition_node);
        assert_eq!(merged.log_dir, base.log_dir);
    }

    #[test]
    fn given_tilde_in_log_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            log_dir: Some(PathBuf::from("~/logs")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.log_dir.unwrap();
        assert!(dir.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings {
            log_dir: Some(PathBuf::from("/tmp/logs")),
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
