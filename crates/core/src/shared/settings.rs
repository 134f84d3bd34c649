use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filters::domain::filter::Filter;
use crate::placement::domain::mask_size;
use crate::placement::domain::transform_smoother::DEFAULT_SMOOTHING;
use crate::shared::constants::{APP_NAME, DEFAULT_MASK_SIZE};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persisted user preferences. CLI flags override these per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub filter: String,
    pub mask_size: f64,
    /// Directory that relative mask assets (`masks/<id>.png`) resolve against.
    pub assets_dir: PathBuf,
    pub smoothing: f64,
    /// Size the preview is shown at, for narrow (portrait) displays.
    pub display_size: Option<(f64, f64)>,
    pub camera_device: Option<String>,
    pub capture_dir: Option<PathBuf>,
    pub extra_filters: Vec<Filter>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: "0".to_string(),
            mask_size: DEFAULT_MASK_SIZE,
            assets_dir: PathBuf::from("."),
            smoothing: DEFAULT_SMOOTHING,
            display_size: None,
            camera_device: None,
            capture_dir: None,
            extra_filters: Vec::new(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("settings.json"))
    }

    /// Loads from the user config directory. Missing or unreadable settings
    /// give the defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring corrupt settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(write_err)
    }

    fn sanitized(mut self) -> Self {
        self.mask_size = mask_size::snap(self.mask_size);
        if !(self.smoothing.is_finite() && self.smoothing > 0.0 && self.smoothing <= 1.0) {
            self.smoothing = DEFAULT_SMOOTHING;
        }
        self
    }
}
