//! Settings file handling.
//!
//! Settings live in a JSON file under the platform config directory
//! (`~/.config/pomodoro-ambient/settings.json` on Linux). A missing file
//! means defaults; fields absent from the file fall back to their defaults.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::types::TimerSettings;

/// Application directory name under the config and data directories.
pub const APP_DIR_NAME: &str = "pomodoro-ambient";

/// Settings file name.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Directory name for bundled audio files.
const AUDIO_DIR_NAME: &str = "audio";

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("設定ファイルの読み書きに失敗しました ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("設定ファイルの解析に失敗しました ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings are out of range.
    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

/// Returns the default settings file path, if a config directory exists.
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Returns the default directory holding file-backed tracks.
#[must_use]
pub fn default_assets_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(AUDIO_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(AUDIO_DIR_NAME))
}

/// Loads and validates settings from `path`.
///
/// A missing file yields the default settings.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or
/// validated.
pub fn load_settings(path: &Path) -> Result<TimerSettings, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Settings file not found at {}, using defaults", path.display());
            return Ok(TimerSettings::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings: TimerSettings =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate().map_err(ConfigError::Invalid)?;

    debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Validates and writes settings to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the file cannot be written.
pub fn save_settings(path: &Path, settings: &TimerSettings) -> Result<(), ConfigError> {
    settings.validate().map_err(ConfigError::Invalid)?;

    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)?;

    debug!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("missing.json")).unwrap();
        assert_eq!(settings, TimerSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let settings = TimerSettings::default()
            .with_focus_seconds(900)
            .with_sounds(false, false);

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{"focusSeconds": 0}"#).unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let settings = TimerSettings::default().with_sessions_before_long_break(0);

        assert!(save_settings(&path, &settings).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_default_paths() {
        if let Some(path) = default_settings_path() {
            assert!(path.ends_with(Path::new(APP_DIR_NAME).join(SETTINGS_FILE_NAME)));
        }
        assert!(default_assets_dir().ends_with(AUDIO_DIR_NAME));
    }
}
