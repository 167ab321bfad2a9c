//! Configuration Management

use crate::capture::filter::MoveFilter;
use crate::capture::hotkey::HotkeyBindings;
use crate::replay::scheduler::ReplayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture settings
    pub capture: CaptureConfig,
    /// Replay settings
    pub replay: ReplaySettings,
    /// Where recordings live
    pub storage: StorageConfig,
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Minimum pointer travel between recorded moves (pixels)
    pub min_move_distance_px: f64,
    /// Minimum time between recorded moves (ms)
    pub min_move_interval_ms: u64,
    pub start_hotkey: String,
    pub stop_hotkey: String,
    pub emergency_stop_hotkey: String,
}

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Default speed multiplier
    pub speed: f64,
    pub repetitions: u32,
    /// Countdown before replay starts (seconds, 0 = none)
    pub countdown_secs: u32,
    /// Longest uninterrupted sleep between events (ms)
    pub wait_slice_ms: u64,
    /// Minimum spacing of progress updates (ms)
    pub progress_interval_ms: u64,
    pub release_held_on_exit: bool,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for recordings; relative paths resolve against the
    /// working directory
    pub recordings_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_move_distance_px: 5.0,
            min_move_interval_ms: 10,
            start_hotkey: "ctrl+shift+r".to_string(),
            stop_hotkey: "ctrl+alt+s".to_string(),
            emergency_stop_hotkey: "escape".to_string(),
        }
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            repetitions: 1,
            countdown_secs: 3,
            wait_slice_ms: 50,
            progress_interval_ms: 100,
            release_held_on_exit: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

impl CaptureConfig {
    pub fn move_filter(&self) -> MoveFilter {
        MoveFilter::new(
            self.min_move_distance_px,
            self.min_move_interval_ms as f64 / 1000.0,
        )
    }

    pub fn hotkey_bindings(&self) -> Result<HotkeyBindings, crate::Error> {
        HotkeyBindings::parse(
            &self.start_hotkey,
            &self.stop_hotkey,
            &self.emergency_stop_hotkey,
        )
    }
}

impl ReplaySettings {
    /// Scheduler parameters for these settings.
    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            speed: self.speed,
            repetitions: self.repetitions,
            wait_slice: Duration::from_millis(self.wait_slice_ms),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            release_held_on_exit: self.release_held_on_exit,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let capture = &self.capture;
        if !capture.min_move_distance_px.is_finite() || capture.min_move_distance_px < 0.0 {
            return Err(crate::Error::Config(format!(
                "min_move_distance_px must be >= 0, got {}",
                capture.min_move_distance_px
            )));
        }
        if capture.min_move_interval_ms > 1000 {
            return Err(crate::Error::Config(format!(
                "min_move_interval_ms must be in [0, 1000], got {}",
                capture.min_move_interval_ms
            )));
        }
        capture.hotkey_bindings()?;

        let replay = &self.replay;
        if !(crate::replay::MIN_SPEED..=crate::replay::MAX_SPEED).contains(&replay.speed) {
            return Err(crate::Error::Config(format!(
                "speed must be in [{}, {}], got {}",
                crate::replay::MIN_SPEED,
                crate::replay::MAX_SPEED,
                replay.speed
            )));
        }
        if replay.repetitions == 0 {
            return Err(crate::Error::Config("repetitions must be > 0".to_string()));
        }
        if !(1..=50).contains(&replay.wait_slice_ms) {
            return Err(crate::Error::Config(format!(
                "wait_slice_ms must be in [1, 50], got {}",
                replay.wait_slice_ms
            )));
        }
        if replay.countdown_secs > 60 {
            return Err(crate::Error::Config(format!(
                "countdown_secs must be in [0, 60], got {}",
                replay.countdown_secs
            )));
        }

        if self.storage.recordings_dir.as_os_str().is_empty() {
            return Err(crate::Error::Config(
                "recordings_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path).map_err(|source| crate::Error::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load `path` if given, otherwise the default location.
    pub fn load_from(path: Option<&Path>) -> Result<Self, crate::Error> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| crate::Error::FileIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, content).map_err(|source| crate::Error::FileIo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".input_replay").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
