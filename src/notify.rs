//! User-facing alerts and prompts.

use tracing::info;

use crate::peripheral::{Peripheral, PeripheralId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ScanStarted,
    Discovered(Peripheral),
    ScanFinished { found: usize },
    Connecting { name: String },
    Connected { name: String },
    /// Deliberately generic: the cause of a failed attempt is not surfaced.
    ConnectionFailed,
    Disconnected { name: String },
    UnknownPeripheral(PeripheralId),
}

/// The user's answer to the adapter-off prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Enable,
    Dismiss,
}

pub trait Notifier {
    fn notify(&self, notification: Notification);

    /// Tell the user the adapter is off and ask whether to turn it on.
    fn prompt_enable_adapter(&self) -> PromptResponse;
}

/// Prints alerts to stdout. The adapter prompt is answered from config
/// rather than interactively.
pub struct TerminalNotifier {
    offer_enable: bool,
}

impl TerminalNotifier {
    pub fn new(offer_enable: bool) -> Self {
        Self { offer_enable }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::ScanStarted => println!("Scanning for devices..."),
            Notification::Discovered(p) => {
                let rssi = p.rssi.map(|r| format!("{r} dBm")).unwrap_or_default();
                println!("  {:<24} {:<40} {rssi}", p.display_name(), p.id);
            }
            Notification::ScanFinished { found } => println!("Scan finished, {found} device(s) found"),
            Notification::Connecting { name } => println!("Connecting to {name}..."),
            Notification::Connected { name } => println!("Connected: Successfully connected to {name}"),
            Notification::ConnectionFailed => println!("Connection Failed: Could not connect to the device."),
            Notification::Disconnected { name } => println!("Disconnected from {name}"),
            Notification::UnknownPeripheral(id) => println!("No device with id {id} in the last scan"),
        }
    }

    fn prompt_enable_adapter(&self) -> PromptResponse {
        println!("Bluetooth is off. This app requires Bluetooth, please turn it on.");
        if self.offer_enable {
            info!("Requesting the adapter be powered on");
            PromptResponse::Enable
        } else {
            PromptResponse::Dismiss
        }
    }
}
