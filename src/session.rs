//! The event loop tying adapter events and user commands to the controllers.

use std::fmt;
use std::str::FromStr;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterEvent, BleBackend};
use crate::connection::{AdapterAction, ConnectionController};
use crate::discovery::DiscoveryController;
use crate::notify::{Notification, Notifier};
use crate::peripheral::PeripheralId;

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    Connect(PeripheralId),
    Disconnect,
    List,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown command {:?}, expected scan, connect <id>, disconnect, list or quit", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = match (words.next(), words.next(), words.next()) {
            (Some("scan"), None, _) => Command::Scan,
            (Some("connect"), Some(id), None) => Command::Connect(PeripheralId::new(id)),
            (Some("disconnect"), None, _) => Command::Disconnect,
            (Some("list"), None, _) => Command::List,
            (Some("quit" | "exit"), None, _) => Command::Quit,
            _ => return Err(ParseCommandError(s.trim().to_string())),
        };
        Ok(command)
    }
}

pub struct Session<'a, B: BleBackend, N> {
    discovery: DiscoveryController<'a, B>,
    connection: ConnectionController<'a, B, N>,
    notifier: &'a N,
}

impl<'a, B: BleBackend, N: Notifier> Session<'a, B, N> {
    pub fn new(
        discovery: DiscoveryController<'a, B>,
        connection: ConnectionController<'a, B, N>,
        notifier: &'a N,
    ) -> Self {
        Self { discovery, connection, notifier }
    }

    pub fn discovery(&self) -> &DiscoveryController<'a, B> {
        &self.discovery
    }

    pub fn connection(&self) -> &ConnectionController<'a, B, N> {
        &self.connection
    }

    /// Handle events and commands one at a time until `Quit` arrives or the
    /// command channel closes, then release any held connection. Adapter
    /// events wait while a scan or connection attempt is in progress.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<AdapterEvent>,
        mut commands: mpsc::Receiver<Command>,
    ) {
        let mut events_open = true;
        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!("Adapter event channel closed");
                        events_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
            }
        }
        self.handle_command(Command::Disconnect).await;
        info!("Session ended");
    }

    pub async fn handle_event(&mut self, event: AdapterEvent) {
        if self.connection.on_adapter_event(event).await == AdapterAction::StartScan {
            self.scan().await;
        }
    }

    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Scan => self.scan().await,
            Command::Connect(id) => {
                let Some(peripheral) = self.discovery.peripherals().get(&id).cloned() else {
                    self.notifier.notify(Notification::UnknownPeripheral(id));
                    return;
                };
                self.connection.connect(&peripheral).await;
            }
            Command::Disconnect => {
                if let Err(err) = self.connection.disconnect().await {
                    warn!("{err}");
                }
            }
            Command::List => {
                for peripheral in self.discovery.peripherals() {
                    self.notifier.notify(Notification::Discovered(peripheral.clone()));
                }
            }
            Command::Quit => {}
        }
    }

    /// Run one scan. Errors have already been logged by the controller and
    /// only end the scan.
    async fn scan(&mut self) {
        let notifier = self.notifier;
        notifier.notify(Notification::ScanStarted);
        let result = self
            .discovery
            .scan_with(|peripheral| notifier.notify(Notification::Discovered(peripheral.clone())))
            .await;
        if let Ok(found) = result {
            notifier.notify(Notification::ScanFinished { found: found.len() });
        }
    }
}

#[test]
fn test_parse_commands() {
    assert_eq!("scan".parse(), Ok(Command::Scan));
    assert_eq!("  connect AA:BB:CC:DD:EE:FF ".parse(), Ok(Command::Connect("AA:BB:CC:DD:EE:FF".into())));
    assert_eq!("disconnect".parse(), Ok(Command::Disconnect));
    assert_eq!("list".parse(), Ok(Command::List));
    assert_eq!("exit".parse(), Ok(Command::Quit));
}

#[test]
fn test_parse_rejects_malformed_commands() {
    assert!("".parse::<Command>().is_err());
    assert!("connect".parse::<Command>().is_err());
    assert!("connect A B".parse::<Command>().is_err());
    assert!("scan now".parse::<Command>().is_err());
}
