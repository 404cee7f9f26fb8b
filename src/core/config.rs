//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

/// Intake configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `*.form.yaml` definitions
    pub forms_dir: Option<PathBuf>,

    /// Default identity tag for `check` runs
    pub identity: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/intake/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Local config (./intake.yaml)
        let local = PathBuf::from("intake.yaml");
        if local.exists() {
            if let Ok(contents) = std::fs::read_to_string(&local) {
                if let Ok(local_config) = serde_yml::from_str::<Config>(&contents) {
                    config.merge(local_config);
                }
            }
        }

        // 4. Environment variables
        if let Ok(dir) = std::env::var("INTAKE_FORMS_DIR") {
            config.forms_dir = Some(PathBuf::from(dir));
        }
        if let Ok(identity) = std::env::var("INTAKE_IDENTITY") {
            config.identity = Some(identity);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "intake")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.forms_dir.is_some() {
            self.forms_dir = other.forms_dir;
        }
        if other.identity.is_some() {
            self.identity = other.identity;
        }
    }

    /// The forms directory, falling back to ./forms
    pub fn forms_dir(&self) -> PathBuf {
        self.forms_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("forms"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forms_dir() {
        let config = Config::default();
        assert_eq!(config.forms_dir(), PathBuf::from("forms"));
    }

    #[test]
    fn test_merge_precedence() {
        let mut base = Config {
            forms_dir: Some(PathBuf::from("a")),
            identity: Some("base".to_string()),
        };
        base.merge(Config {
            forms_dir: Some(PathBuf::from("b")),
            identity: None,
        });
        assert_eq!(base.forms_dir(), PathBuf::from("b"));
        assert_eq!(base.identity.as_deref(), Some("base"));
    }
}
