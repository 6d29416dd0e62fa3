use tracing::{debug, error, info, warn};

use crate::adapter::{AdapterEvent, BleBackend, LinkParams};
use crate::error::ConnectError;
use crate::notify::{Notification, Notifier, PromptResponse};
use crate::peripheral::Peripheral;

/// The result of a single connection attempt
#[derive(Debug)]
pub enum ConnectionOutcome<H> {
    Connected(H),
    Failed(ConnectError),
}

impl<H> ConnectionOutcome<H> {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Whether the user has been asked to turn the adapter on since it was last
/// seen powered on. Only the first power-off after that prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerPrompt {
    NotPrompted,
    Prompted,
}

/// What the caller should do after an adapter event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterAction {
    StartScan,
    Nothing,
}

struct Connected<H> {
    peripheral: Peripheral,
    handle: H,
}

/// Makes one connection attempt at a time with fixed link parameters and
/// reacts to the adapter being powered on or off.
pub struct ConnectionController<'a, B: BleBackend, N> {
    backend: &'a B,
    notifier: &'a N,
    params: LinkParams,
    connected: Option<Connected<B::Handle>>,
    prompt: PowerPrompt,
}

impl<'a, B: BleBackend, N: Notifier> ConnectionController<'a, B, N> {
    pub fn new(backend: &'a B, notifier: &'a N) -> Self {
        Self {
            backend,
            notifier,
            params: LinkParams::default(),
            connected: None,
            prompt: PowerPrompt::NotPrompted,
        }
    }

    pub fn with_params(mut self, params: LinkParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &LinkParams {
        &self.params
    }

    pub fn prompt_state(&self) -> PowerPrompt {
        self.prompt
    }

    /// The peripheral of the current connection, if any
    pub fn connected(&self) -> Option<&Peripheral> {
        self.connected.as_ref().map(|c| &c.peripheral)
    }

    pub fn handle(&self) -> Option<&B::Handle> {
        self.connected.as_ref().map(|c| &c.handle)
    }

    /// Attempt to connect to `peripheral` once.
    ///
    /// Exactly one of `Connected` or `ConnectionFailed` is notified per call.
    /// A failed attempt leaves any earlier connection as it was; a successful
    /// one disconnects it first.
    pub async fn connect(&mut self, peripheral: &Peripheral) -> ConnectionOutcome<B::Handle> {
        let name = peripheral.display_name().to_string();
        info!(peripheral = %peripheral.id, "Connecting to {name}");
        self.notifier.notify(Notification::Connecting { name: name.clone() });

        match self.backend.connect(&peripheral.id, &self.params).await {
            Ok(handle) => {
                if let Some(previous) = self.connected.take() {
                    // Reconnecting to the same peripheral reuses its link.
                    if previous.peripheral.id != peripheral.id {
                        debug!(peripheral = %previous.peripheral.id, "Releasing previous connection");
                        if let Err(err) = self.backend.disconnect(&previous.handle).await {
                            warn!(peripheral = %previous.peripheral.id, "Could not release previous connection: {err}");
                        }
                    }
                }
                self.connected = Some(Connected { peripheral: peripheral.clone(), handle: handle.clone() });
                info!(peripheral = %peripheral.id, "Connected");
                self.notifier.notify(Notification::Connected { name });
                ConnectionOutcome::Connected(handle)
            }
            Err(source) => {
                let err = ConnectError { id: peripheral.id.clone(), source };
                error!("Connection failed: {err}");
                self.notifier.notify(Notification::ConnectionFailed);
                ConnectionOutcome::Failed(err)
            }
        }
    }

    /// Drop the current connection, if there is one.
    pub async fn disconnect(&mut self) -> Result<(), ConnectError> {
        let Some(current) = self.connected.take() else {
            return Ok(());
        };

        self.backend
            .disconnect(&current.handle)
            .await
            .map_err(|source| ConnectError { id: current.peripheral.id.clone(), source })?;

        info!(peripheral = %current.peripheral.id, "Disconnected");
        self.notifier.notify(Notification::Disconnected {
            name: current.peripheral.display_name().to_string(),
        });
        Ok(())
    }

    pub async fn on_adapter_event(&mut self, event: AdapterEvent) -> AdapterAction {
        match event {
            AdapterEvent::PoweredOn => {
                self.prompt = PowerPrompt::NotPrompted;
                AdapterAction::StartScan
            }
            AdapterEvent::PoweredOff => {
                if self.prompt == PowerPrompt::Prompted {
                    debug!("Adapter still off, already prompted");
                    return AdapterAction::Nothing;
                }
                self.prompt = PowerPrompt::Prompted;

                if self.notifier.prompt_enable_adapter() == PromptResponse::Enable {
                    if let Err(err) = self.backend.enable().await {
                        warn!("Could not enable the adapter: {err}");
                    }
                }
                AdapterAction::Nothing
            }
            AdapterEvent::Other => {
                debug!("Ignoring adapter state change");
                AdapterAction::Nothing
            }
        }
    }
}
