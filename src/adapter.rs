//! The seam between the controllers and the platform Bluetooth binding.

use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BackendError;
use crate::peripheral::{Peripheral, PeripheralId};

/// A power state transition of the local adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterEvent {
    PoweredOn,
    PoweredOff,
    /// Any other state (resetting, unauthorized, unknown...)
    Other,
}

/// Fixed parameters for a connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    /// Let the platform keep retrying in the background
    pub auto_connect: bool,
    /// The payload size to ask for once the link is up
    pub requested_mtu: u16,
}

impl LinkParams {
    pub const DEFAULT_MTU: u16 = 512;
}

impl Default for LinkParams {
    fn default() -> Self {
        Self { auto_connect: false, requested_mtu: Self::DEFAULT_MTU }
    }
}

/// The operations the controllers need from a Bluetooth stack.
///
/// Scanning stops when the stream returned by [`start_scan`](Self::start_scan)
/// is dropped. Streams are polled on the caller's task and need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait BleBackend {
    /// A connected peripheral
    type Handle: Clone;

    /// Power state changes, starting with the current state.
    async fn adapter_events(&self) -> Result<LocalBoxStream<'_, AdapterEvent>, BackendError>;

    /// Start scanning. An empty `services` list means no filter.
    async fn start_scan<'a>(
        &'a self,
        services: &'a [Uuid],
    ) -> Result<LocalBoxStream<'a, Result<Peripheral, BackendError>>, BackendError>;

    async fn connect(&self, id: &PeripheralId, params: &LinkParams) -> Result<Self::Handle, BackendError>;

    async fn disconnect(&self, handle: &Self::Handle) -> Result<(), BackendError>;

    /// Ask the platform to power the adapter on.
    async fn enable(&self) -> Result<(), BackendError>;
}

/// Pump the backend's power state changes into `tx` until the backend's
/// stream ends or the receiver goes away.
pub async fn forward_events<B: BleBackend>(backend: &B, tx: mpsc::Sender<AdapterEvent>) {
    let mut events = match backend.adapter_events().await {
        Ok(events) => events,
        Err(err) => {
            warn!("Could not subscribe to adapter state: {err}");
            return;
        }
    };

    while let Some(event) = events.next().await {
        debug!(?event, "Adapter state changed");
        if tx.send(event).await.is_err() {
            return;
        }
    }

    debug!("Adapter event stream ended");
}
