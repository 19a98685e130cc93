//! Configuration file handling for grblctl
//!
//! Supports JSON and TOML files; the format is chosen by extension.
//! Every section falls back to its defaults when absent, so a file only
//! needs the keys the operator wants to change.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (port, baud rate, handshake timing)
//! - Response collection timing
//! - Firmware reset banner signature
//! - Probe defaults

use crate::error::{SettingsError, SettingsResult};
use grblctl_core::ProbeParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial device path
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Time the controller is given to boot after the wake-up sequence
    pub settle_ms: u64,
    /// Serial read polling granularity
    pub read_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            settle_ms: 2000,
            read_timeout_ms: 100,
        }
    }
}

impl ConnectionSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Timing of the loose response drain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseSettings {
    /// Sleep between "bytes available" polls
    pub poll_interval_ms: u64,
    /// Give up waiting for a reply after this long with nothing received
    pub quiescence_ms: u64,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            quiescence_ms: 150,
        }
    }
}

impl ResponseSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }
}

/// Reset banner signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareSettings {
    /// Identification substring of the boot banner
    pub banner_id: String,
    /// Help-hint substring of the boot banner
    pub banner_help: String,
}

impl Default for FirmwareSettings {
    fn default() -> Self {
        Self {
            banner_id: "Grbl".to_string(),
            banner_help: "for help".to_string(),
        }
    }
}

/// Probe defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Touch plate thickness
    pub thickness: f64,
    /// Probe feed rate
    pub speed: f64,
    /// Maximum probing travel
    pub maxdepth: f64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        let params = ProbeParams::default();
        Self {
            thickness: params.thickness,
            speed: params.speed,
            maxdepth: params.maxdepth,
        }
    }
}

impl ProbeSettings {
    /// Probe parameters used when the operator gives none
    pub fn params(&self) -> ProbeParams {
        ProbeParams {
            thickness: self.thickness,
            speed: self.speed,
            maxdepth: self.maxdepth,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of recent files to remember
    pub recent_files_count: usize,
    /// Recently streamed files, most recent first
    pub recent_files: Vec<PathBuf>,
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Response collection timing
    pub response: ResponseSettings,
    /// Reset banner signature
    pub firmware: FirmwareSettings,
    /// Probe defaults
    pub probe: ProbeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_files_count: 10,
            recent_files: Vec::new(),
            connection: ConnectionSettings::default(),
            response: ResponseSettings::default(),
            firmware: FirmwareSettings::default(),
            probe: ProbeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform location of the configuration file
    /// (e.g. `~/.config/grblctl/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("grblctl").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path).ok_or_else(|| {
            SettingsError::Load(format!(
                "{}: config file must be .json or .toml",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let format = Format::from_path(path).ok_or_else(|| {
            SettingsError::Save(format!(
                "{}: config file must be .json or .toml",
                path.display()
            ))
        })?;
        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.port.trim().is_empty() {
            return Err(SettingsError::invalid("connection.port", "must not be empty"));
        }

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }

        if self.response.poll_interval_ms == 0 {
            return Err(SettingsError::invalid(
                "response.poll_interval_ms",
                "must be > 0",
            ));
        }

        if self.response.quiescence_ms < self.response.poll_interval_ms {
            return Err(SettingsError::invalid(
                "response.quiescence_ms",
                "must be at least the poll interval",
            ));
        }

        if self.firmware.banner_id.is_empty() {
            return Err(SettingsError::invalid("firmware.banner_id", "must not be empty"));
        }

        if self.firmware.banner_help.is_empty() {
            return Err(SettingsError::invalid(
                "firmware.banner_help",
                "must not be empty",
            ));
        }

        if !(self.probe.speed.is_finite() && self.probe.speed > 0.0) {
            return Err(SettingsError::invalid("probe.speed", "must be > 0"));
        }

        if !(self.probe.maxdepth.is_finite() && self.probe.maxdepth > 0.0) {
            return Err(SettingsError::invalid("probe.maxdepth", "must be > 0"));
        }

        if !self.probe.thickness.is_finite() {
            return Err(SettingsError::invalid("probe.thickness", "must be a number"));
        }

        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|f| f != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(self.recent_files_count);
    }

    /// Most recently streamed file
    pub fn most_recent_file(&self) -> Option<&Path> {
        self.recent_files.first().map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.connection.port, "/dev/ttyUSB0");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.connection.settle(), Duration::from_secs(2));
        assert_eq!(config.response.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.response.quiescence(), Duration::from_millis(150));
        assert_eq!(config.probe.params(), ProbeParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut config = Config {
            recent_files_count: 2,
            ..Config::default()
        };
        config.add_recent_file(PathBuf::from("a.nc"));
        config.add_recent_file(PathBuf::from("b.nc"));
        config.add_recent_file(PathBuf::from("a.nc"));
        assert_eq!(
            config.recent_files,
            vec![PathBuf::from("a.nc"), PathBuf::from("b.nc")]
        );

        config.add_recent_file(PathBuf::from("c.nc"));
        assert_eq!(
            config.recent_files,
            vec![PathBuf::from("c.nc"), PathBuf::from("a.nc")]
        );
        assert_eq!(config.most_recent_file(), Some(Path::new("c.nc")));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.connection.baud_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Invalid { ref key, .. }) if key == "connection.baud_rate"
        ));

        let mut config = Config::default();
        config.response.quiescence_ms = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.firmware.banner_help.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.probe.speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("c.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("c.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("c.yaml")), None);
        assert_eq!(Format::from_path(Path::new("config")), None);
    }
}
