use futures_util::StreamExt;
use tokio::time::{sleep_until, timeout_at, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::BleBackend;
use crate::error::ScanError;
use crate::peripheral::{Peripheral, PeripheralList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Runs time-boxed scans and keeps the peripherals found by the latest one.
pub struct DiscoveryController<'a, B> {
    backend: &'a B,
    window: Duration,
    services: Vec<Uuid>,
    peripherals: PeripheralList,
    state: ScanState,
}

impl<'a, B: BleBackend> DiscoveryController<'a, B> {
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(5000);

    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            window: Self::DEFAULT_WINDOW,
            services: Vec::new(),
            peripherals: PeripheralList::new(),
            state: ScanState::Idle,
        }
    }

    /// How long each scan runs for
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Only report peripherals advertising one of these services
    pub fn with_services(mut self, services: Vec<Uuid>) -> Self {
        self.services = services;
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn peripherals(&self) -> &PeripheralList {
        &self.peripherals
    }

    pub async fn scan(&mut self) -> Result<&PeripheralList, ScanError> {
        self.scan_with(|_| {}).await
    }

    /// Scan for the configured window, calling `on_discovered` once for each
    /// peripheral id the first time it is reported.
    ///
    /// The previous results are discarded when the scan starts. The scan ends
    /// when the window elapses, however many peripherals have been found, and
    /// even if the backend stops reporting earlier. A backend error aborts the
    /// scan; whatever was found up to that point is kept.
    pub async fn scan_with<F>(&mut self, mut on_discovered: F) -> Result<&PeripheralList, ScanError>
    where
        F: FnMut(&Peripheral),
    {
        let deadline = Instant::now() + self.window;
        info!(window = ?self.window, "Scanning for devices");

        self.peripherals.clear();
        self.state = ScanState::Scanning;

        let mut reports = match self.backend.start_scan(&self.services).await {
            Ok(reports) => reports,
            Err(err) => {
                warn!("Scan failed to start: {err}");
                self.state = ScanState::Idle;
                return Err(ScanError::Start(err));
            }
        };

        let outcome = loop {
            match timeout_at(deadline, reports.next()).await {
                // window elapsed
                Err(_) => break Ok(()),
                Ok(None) => {
                    debug!("Scan stream ended before the window elapsed");
                    sleep_until(deadline).await;
                    break Ok(());
                }
                Ok(Some(Ok(peripheral))) => {
                    debug!(peripheral = %peripheral.id, name = ?peripheral.name, "Scanned device");
                    if self.peripherals.insert(peripheral.clone()) {
                        on_discovered(&peripheral);
                    }
                }
                Ok(Some(Err(err))) => {
                    warn!("Scan aborted: {err}");
                    break Err(ScanError::Aborted(err));
                }
            }
        };

        // Dropping the stream stops the scan.
        drop(reports);
        self.state = ScanState::Idle;

        outcome?;
        info!(found = self.peripherals.len(), "Scan finished");
        Ok(&self.peripherals)
    }
}
