use thiserror::Error;

use crate::peripheral::PeripheralId;

/// Failures reported by a [`BleBackend`](crate::BleBackend)
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Default adapter not found")]
    NoAdapter,
    #[error("Peripheral {0} has not been discovered by this adapter")]
    UnknownPeripheral(PeripheralId),
    #[error("Not supported on this platform: {0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Bluetooth(#[from] bluest::Error),
    #[error("{0}")]
    Other(String),
}

/// A scan was aborted. Peripherals collected before the failure are kept.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to start scan: {0}")]
    Start(#[source] BackendError),
    #[error("Scan aborted: {0}")]
    Aborted(#[source] BackendError),
}

/// A connection attempt failed. The cause is not classified further.
#[derive(Debug, Error)]
#[error("Could not connect to {id}: {source}")]
pub struct ConnectError {
    pub id: PeripheralId,
    #[source]
    pub source: BackendError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("scan.window_ms must be greater than zero")]
    ZeroScanWindow,
    #[error("Invalid service UUID {value:?}: {source}")]
    InvalidServiceUuid {
        value: String,
        #[source]
        source: uuid::Error,
    },
}
