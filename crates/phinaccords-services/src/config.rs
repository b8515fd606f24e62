//! Practice defaults persisted as TOML in the user config directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use phinaccords_core::DEFAULT_BPM;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Tempo used when a song has no suggested BPM
    pub default_bpm: f64,
    /// Ticker period for the synthetic timer
    pub tick_interval_ms: u64,
    pub looping: bool,
    /// Tempo stepper increment
    pub bpm_step: f64,
    /// JSON catalog to use instead of the bundled library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_bpm: DEFAULT_BPM,
            tick_interval_ms: 20,
            looping: false,
            bpm_step: 1.0,
            catalog_path: None,
        }
    }
}

impl PracticeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Replace out-of-range values with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.default_bpm.is_finite() && self.default_bpm > 0.0) {
            warn!("Ignoring invalid default_bpm {} in config", self.default_bpm);
            self.default_bpm = defaults.default_bpm;
        }
        if !(self.bpm_step.is_finite() && self.bpm_step > 0.0) {
            warn!("Ignoring invalid bpm_step {} in config", self.bpm_step);
            self.bpm_step = defaults.bpm_step;
        }
        self
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phinaccords")
        .join("config.toml")
}

pub fn load_config() -> PracticeConfig {
    load_config_from(&config_path())
}

/// Missing or unreadable files fall back to defaults
pub fn load_config_from(path: &Path) -> PracticeConfig {
    let Ok(s) = std::fs::read_to_string(path) else {
        return PracticeConfig::default();
    };
    match toml::from_str::<PracticeConfig>(&s) {
        Ok(config) => config.sanitized(),
        Err(e) => {
            warn!("Invalid config at {}: {}", path.display(), e);
            PracticeConfig::default()
        }
    }
}

pub fn save_config(config: &PracticeConfig) {
    save_config_to(&config_path(), config);
}

pub fn save_config_to(path: &Path, config: &PracticeConfig) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(s) = toml::to_string_pretty(config) else { return };
    if let Err(e) = std::fs::write(path, s) {
        warn!("Failed to save config to {}: {}", path.display(), e);
    }
}
