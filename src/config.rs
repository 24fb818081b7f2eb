//! Process-wide settings.
//!
//! The label of the current forecast run (`LATEST_MODEL_RUN`) lives here and
//! nowhere else: every default selection reads it through
//! [`latest_model_run`], and [`set_latest_model_run`] is the only way to
//! change it.
//!
//! Settings resolve as: built-in defaults < JSON file < environment < CLI flags.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Forecast run label used until something else is configured.
pub const DEFAULT_LATEST_MODEL_RUN: &str = "Predicted Mid July";

pub const ENV_WORKBOOK: &str = "ASTRA_WORKBOOK";
pub const ENV_LATEST_MODEL_RUN: &str = "ASTRA_LATEST_MODEL_RUN";

// Empty means "not set"; readers fall back to the default.
static LATEST_MODEL_RUN: RwLock<String> = RwLock::new(String::new());

/// Current forecast run label.
pub fn latest_model_run() -> String {
    let guard = LATEST_MODEL_RUN
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    if guard.is_empty() {
        DEFAULT_LATEST_MODEL_RUN.to_string()
    } else {
        guard.clone()
    }
}

/// Replace the current forecast run label.
pub fn set_latest_model_run(label: &str) -> Result<(), ConfigError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ConfigError::EmptyModelRun);
    }
    let mut guard = LATEST_MODEL_RUN
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if *guard != label {
        info!("latest model run set to {label:?}");
        *guard = label.to_string();
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("latest model run label must not be empty")]
    EmptyModelRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Workbook file (`.xlsx`, `.xls`, `.ods`) or directory of `<sheet>.csv` files.
    pub workbook: PathBuf,
    pub latest_model_run: String,
    pub width: u32,
    pub height: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("price_data.xlsx"),
            latest_model_run: DEFAULT_LATEST_MODEL_RUN.to_string(),
            width: 1000,
            height: 600,
            thumbnail_width: 480,
            thumbnail_height: 320,
        }
    }
}

impl Settings {
    /// `<config dir>/astra/config.json`, e.g. `~/.config/astra/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("astra").join("config.json"))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` (must exist), else from [`Settings::default_path`]
    /// when that file exists, else defaults; then apply environment overrides.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::from_json_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!("using config {}", path.display());
                    Self::from_json_file(path)?
                }
                None => Self::default(),
            },
        };
        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply `ASTRA_*` overrides read through `lookup`.
    pub fn apply_env_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(v) = lookup(ENV_WORKBOOK).filter(|v| !v.trim().is_empty()) {
            self.workbook = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_LATEST_MODEL_RUN).filter(|v| !v.trim().is_empty()) {
            self.latest_model_run = v.trim().to_string();
        }
    }

    /// Publish process-wide values (currently the latest model run).
    pub fn apply(&self) -> Result<(), ConfigError> {
        set_latest_model_run(&self.latest_model_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "latest_model_run": "Predicted Mid August" }"#).unwrap();
        let s = Settings::from_json_file(&path).unwrap();
        assert_eq!(s.latest_model_run, "Predicted Mid August");
        assert_eq!(s.workbook, PathBuf::from("price_data.xlsx"));
        assert_eq!(s.width, 1000);
    }

    #[test]
    fn bad_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = Settings::discover(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_WORKBOOK, "data/prices"),
            (ENV_LATEST_MODEL_RUN, " Predicted Early Sept "),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(s.workbook, PathBuf::from("data/prices"));
        assert_eq!(s.latest_model_run, "Predicted Early Sept");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut s = Settings::default();
        s.apply_env_with(|_| Some("   ".to_string()));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn empty_label_is_rejected() {
        assert!(matches!(
            set_latest_model_run("  "),
            Err(ConfigError::EmptyModelRun)
        ));
    }
}
