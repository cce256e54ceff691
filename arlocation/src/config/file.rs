//! INI persistence for [`SceneConfig`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::{debug, info};

use super::keys::ConfigKey;
use super::SceneConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

/// Default config file location: `<config dir>/arlocation/config.ini`.
pub fn config_file_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("arlocation").join("config.ini"))
        .ok_or(ConfigError::NoConfigDir)
}

impl SceneConfig {
    /// Load from the default path. A missing file yields the defaults.
    pub fn load() -> ConfigResult<Self> {
        let path = config_file_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ini_str(&text)?;
        info!(path = %path.display(), "Loaded scene configuration");
        Ok(config)
    }

    /// Parse INI text. Keys that are absent keep their default value.
    pub fn from_ini_str(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        for key in ConfigKey::ALL {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.name()))
            {
                key.set(&mut config, value)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::ALL {
            ini.with_section(Some(key.section()))
                .set(key.name(), key.get(self));
        }
        ini
    }

    /// Write as INI text to `writer`.
    pub fn write_ini<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.to_ini().write_to(writer)
    }

    /// Save to the default path.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path()?)
    }

    /// Save to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut file = fs::File::create(path).map_err(write_err)?;
        self.write_ini(&mut file).map_err(write_err)?;
        info!(path = %path.display(), "Saved scene configuration");
        Ok(())
    }
}

pub(super) fn parse_value<T: FromStr>(key: &ConfigKey, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: format!("expected {}", std::any::type_name::<T>()),
    })
}

/// `0` disables the timer.
pub(super) fn parse_interval(key: &ConfigKey, value: &str) -> ConfigResult<Option<Duration>> {
    let millis: u64 = parse_value(key, value)?;
    Ok((millis > 0).then(|| Duration::from_millis(millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeodesicModel;
    use tempfile::TempDir;

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = SceneConfig::from_ini_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_ini_overrides() {
        let text = "\
[scene]
location_update_threshold_m = 12.5
refresh_interval_ms = 0
geodesic_model = spherical

[overlap]
remove_overlapping = true
";
        let config = SceneConfig::from_ini_str(text).unwrap();
        assert_eq!(config.location_update_threshold_m, 12.5);
        assert_eq!(config.refresh_interval, None);
        assert_eq!(config.geodesic_model, GeodesicModel::Spherical);
        assert!(config.overlap.remove_overlapping);
        assert_eq!(config.max_render_distance_m, 30.0);
    }

    #[test]
    fn test_bad_value_reports_key() {
        let text = "[scene]\nmax_render_distance_m = far\n";
        let err = SceneConfig::from_ini_str(text).unwrap_err();
        assert!(
            err.to_string().contains("scene.max_render_distance_m"),
            "Got: {}",
            err
        );
    }

    #[test]
    fn test_out_of_range_value_rejected() {
        let text = "[scaling]\nmin_distance_m = 50\nmax_distance_m = 10\n";
        assert!(matches!(
            SceneConfig::from_ini_str(text),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = SceneConfig::default();
        config.bearing_adjustment_deg = -7.5;
        config.minimal_refreshing = true;
        config.refresh_interval = Some(Duration::from_millis(2500));
        config.save_to(&path).unwrap();

        let loaded = SceneConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = SceneConfig::load_from(&temp.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_write_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = SceneConfig::default().write_ini(&mut Broken).unwrap_err();
        assert_eq!(err.to_string(), "disk full");

        // A directory in place of the file.
        let temp = TempDir::new().unwrap();
        let err = SceneConfig::default().save_to(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
    }

    #[test]
    fn test_ini_output_has_sections() {
        let mut buf = Vec::new();
        SceneConfig::default().write_ini(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[scene]"));
        assert!(text.contains("[scaling]"));
        assert!(text.contains("[overlap]"));
        assert!(text.contains("refresh_interval_ms"));
        assert!(text.contains("5000"));
    }
}
