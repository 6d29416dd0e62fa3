//! Settings loaded from `config.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::time::Duration;
use uuid::Uuid;

use crate::adapter::LinkParams;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub link: LinkConfig,
    pub adapter: AdapterConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long a scan runs, in milliseconds
    pub window_ms: u64,
    /// Service UUIDs to filter on. Empty reports every peripheral.
    pub services: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { window_ms: 5000, services: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub auto_connect: bool,
    pub requested_mtu: u16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let params = LinkParams::default();
        Self { auto_connect: params.auto_connect, requested_mtu: params.requested_mtu }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Answer "turn it on" when the adapter-off prompt is shown
    pub offer_enable: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self { offer_enable: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Config {
    /// `<config dir>/bmsview/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bmsview")
            .join("config.toml")
    }

    /// Load from `path`, or the default location. A missing file at the
    /// default location gives the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.window_ms == 0 {
            return Err(ConfigError::ZeroScanWindow);
        }
        self.service_filter()?;
        Ok(())
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_millis(self.scan.window_ms)
    }

    pub fn service_filter(&self) -> Result<Vec<Uuid>, ConfigError> {
        self.scan
            .services
            .iter()
            .map(|value| {
                Uuid::parse_str(value).map_err(|source| ConfigError::InvalidServiceUuid { value: value.clone(), source })
            })
            .collect()
    }

    pub fn link_params(&self) -> LinkParams {
        LinkParams { auto_connect: self.link.auto_connect, requested_mtu: self.link.requested_mtu }
    }
}

#[test]
fn test_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.scan_window(), Duration::from_millis(5000));
    assert!(config.service_filter().unwrap().is_empty());
    assert_eq!(config.link_params(), LinkParams { auto_connect: false, requested_mtu: 512 });
    assert!(config.adapter.offer_enable);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let config = Config::parse(
        r#"
        [scan]
        services = ["6e400001-b5a3-f393-e0a9-e50e24dcca9e"]

        [link]
        requested_mtu = 247
        "#,
    )
    .unwrap();

    assert_eq!(config.scan.window_ms, 5000);
    assert_eq!(config.service_filter().unwrap().len(), 1);
    assert_eq!(config.link_params().requested_mtu, 247);
    assert!(!config.link_params().auto_connect);
}

#[test]
fn test_zero_window_rejected() {
    let err = Config::parse("[scan]\nwindow_ms = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::ZeroScanWindow));
}

#[test]
fn test_invalid_service_uuid_rejected() {
    let err = Config::parse("[scan]\nservices = [\"not-a-uuid\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidServiceUuid { ref value, .. } if value == "not-a-uuid"));
}

#[test]
fn test_load_explicit_path() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[adapter]\noffer_enable = false\n").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert!(!config.adapter.offer_enable);
}

#[test]
fn test_load_missing_explicit_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
