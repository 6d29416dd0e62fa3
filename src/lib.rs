//! Discover and connect to Battery Management Systems over Bluetooth Low Energy
//!
//! This is the connection layer of a BMS viewer. It scans for nearby BLE peripherals for a fixed
//! window, lets the user pick one to connect to, and reacts to the local adapter being powered
//! on or off.
//!
//! - [`DiscoveryController`] runs time-boxed scans and keeps the peripherals found, in discovery
//!   order and without duplicates.
//! - [`ConnectionController`] makes single connection attempts with fixed link parameters and
//!   prompts the user, once, when the adapter is turned off.
//! - [`Session`] feeds both from a channel of [`AdapterEvent`]s and a channel of user
//!   [`Command`]s.
//!
//! The Bluetooth stack sits behind [`BleBackend`]; [`BluestBackend`] uses the system's default
//! adapter.
//!
//! # Example
//!
//! ```rust,no_run
//! # use bmsview::{BluestBackend, ConnectionController, DiscoveryController, TerminalNotifier};
//! #
//! # #[tokio::main]
//! # pub async fn main() -> anyhow::Result<()> {
//!     let backend = BluestBackend::new().await?;
//!     let notifier = TerminalNotifier::new(true);
//!
//!     let mut discovery = DiscoveryController::new(&backend);
//!     let found = discovery.scan().await?.clone();
//!
//!     let mut connection = ConnectionController::new(&backend, &notifier);
//!     if let Some(first) = found.iter().next() {
//!         connection.connect(first).await;
//!     }
//! #   Ok(())
//! # }
//! ```

mod adapter;
mod bluest_backend;
mod connection;
mod discovery;
mod error;
mod notify;
mod peripheral;
mod session;

pub mod config;
pub mod logging;

pub use adapter::{forward_events, AdapterEvent, BleBackend, LinkParams};
pub use bluest_backend::BluestBackend;
pub use connection::{AdapterAction, ConnectionController, ConnectionOutcome, PowerPrompt};
pub use discovery::{DiscoveryController, ScanState};
pub use error::{BackendError, ConfigError, ConnectError, ScanError};
pub use notify::{Notification, Notifier, PromptResponse, TerminalNotifier};
pub use peripheral::{Peripheral, PeripheralId, PeripheralList};
pub use session::{Command, ParseCommandError, Session};
