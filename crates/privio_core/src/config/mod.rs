use crate::error::AppError;
use crate::model::{Priority, TaskFilter};
use crate::storage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "PRIVIO_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_priority: Option<Priority>,
    #[serde(default)]
    pub show_completed: bool,
}

impl Config {
    /// The configured `store_dir`, else the platform default.
    pub fn resolve_store_dir(&self) -> Result<PathBuf, AppError> {
        match self.store_dir.as_ref() {
            Some(dir) => Ok(dir.clone()),
            None => storage::default_store_dir(),
        }
    }

    pub fn initial_filter(&self) -> TaskFilter {
        TaskFilter {
            show_completed: self.show_completed,
            ..TaskFilter::default()
        }
    }

    pub fn priority_or_default(&self) -> Priority {
        self.default_priority.unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub store_dir: Option<PathBuf>,
    pub default_priority: Option<Priority>,
    pub show_completed: Option<bool>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("privio").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("privio")
            .join(CONFIG_FILE_NAME))
    }
}

/// Never fails: a missing file yields defaults, an unreadable one yields
/// defaults plus the error for the caller to report. `PRIVIO_STORE_DIR` is
/// layered over the file's `store_dir`; `--config-override` layers over both.
pub fn load_config_with_fallback() -> ConfigLoad {
    let mut loaded = match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    };
    loaded.config = layer_store_dir(loaded.config, storage::store_dir_from_env());
    loaded
}

fn layer_store_dir(mut config: Config, from_env: Option<PathBuf>) -> Config {
    if from_env.is_some() {
        config.store_dir = from_env;
    }
    config
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(store_dir) = overrides.store_dir.as_ref() {
        merged.store_dir = Some(store_dir.clone());
    }
    if let Some(priority) = overrides.default_priority {
        merged.default_priority = Some(priority);
    }
    if let Some(show_completed) = overrides.show_completed {
        merged.show_completed = show_completed;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, layer_store_dir, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides,
    };
    use crate::model::Priority;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("privio-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "store_dir": "/tmp/privio-store",
            "default_priority": "high",
            "show_completed": true
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.store_dir, Some(PathBuf::from("/tmp/privio-store")));
        assert_eq!(loaded.default_priority, Some(Priority::High));
        assert!(loaded.show_completed);
        assert!(loaded.initial_filter().show_completed);
    }

    #[test]
    fn load_config_rejects_unknown_priority() {
        let path = temp_path("bad-priority-config.json");
        fs::write(&path, r#"{ "default_priority": "urgent" }"#).unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            store_dir: Some(PathBuf::from("/base")),
            default_priority: Some(Priority::Low),
            show_completed: false,
        };
        let overrides = ConfigOverrides {
            default_priority: Some(Priority::High),
            show_completed: Some(true),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.store_dir, Some(PathBuf::from("/base")));
        assert_eq!(merged.priority_or_default(), Priority::High);
        assert!(merged.show_completed);
        assert_eq!(base.default_priority, Some(Priority::Low));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            store_dir: None,
            default_priority: Some(Priority::Low),
            show_completed: true,
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn store_dir_precedence_is_override_then_env_then_file() {
        let file = Config {
            store_dir: Some(PathBuf::from("/from-file")),
            ..Config::default()
        };

        let unset = layer_store_dir(file.clone(), None);
        assert_eq!(unset.resolve_store_dir().unwrap(), PathBuf::from("/from-file"));

        let with_env = layer_store_dir(file, Some(PathBuf::from("/from-env")));
        assert_eq!(with_env.resolve_store_dir().unwrap(), PathBuf::from("/from-env"));

        let overrides = ConfigOverrides {
            store_dir: Some(PathBuf::from("/from-override")),
            ..ConfigOverrides::default()
        };
        let merged = merge_overrides(&with_env, &overrides);
        assert_eq!(
            merged.resolve_store_dir().unwrap(),
            PathBuf::from("/from-override")
        );
    }

    #[test]
    fn default_priority_falls_back_to_medium() {
        assert_eq!(Config::default().priority_or_default(), Priority::Medium);
    }
}
