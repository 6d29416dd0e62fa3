use std::collections::HashMap;

use bluest::Adapter;
use bluest::AdvertisingDevice;
use bluest::Device;
use futures_util::stream;
use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::adapter::{AdapterEvent, BleBackend, LinkParams};
use crate::error::BackendError;
use crate::peripheral::{Peripheral, PeripheralId};

/// [`BleBackend`] over the system's default adapter, via `bluest`.
///
/// Devices seen while scanning are remembered by id so that a later
/// [`connect`](BleBackend::connect) can find them again.
pub struct BluestBackend {
    adapter: Adapter,
    discovered: Mutex<HashMap<PeripheralId, Device>>,
}

impl BluestBackend {
    pub async fn new() -> Result<Self, BackendError> {
        let adapter = Adapter::default().await.ok_or(BackendError::NoAdapter)?;
        Ok(Self { adapter, discovered: Mutex::new(HashMap::new()) })
    }

    fn remember(&self, advertising: AdvertisingDevice) -> Peripheral {
        let device = advertising.device;
        let id = PeripheralId::new(device.id().to_string());

        if let Some(manufacturer) = &advertising.adv_data.manufacturer_data {
            let h = hex::encode(&manufacturer.data);
            trace!(peripheral = %id, company = manufacturer.company_id, "Manufacturer data: 0x{h}");
        }

        let name = advertising
            .adv_data
            .local_name
            .or_else(|| device.name().ok())
            .filter(|name| !name.is_empty());

        self.discovered.lock().insert(id.clone(), device);

        Peripheral { id, name, rssi: advertising.rssi }
    }
}

impl BleBackend for BluestBackend {
    type Handle = Device;

    async fn adapter_events(&self) -> Result<LocalBoxStream<'_, AdapterEvent>, BackendError> {
        let current = if self.adapter.is_available().await? {
            AdapterEvent::PoweredOn
        } else {
            AdapterEvent::PoweredOff
        };

        let changes = self.adapter.events().await?.map(|event| match event {
            Ok(bluest::AdapterEvent::Available) => AdapterEvent::PoweredOn,
            Ok(bluest::AdapterEvent::Unavailable) => AdapterEvent::PoweredOff,
            #[allow(unreachable_patterns)]
            Ok(_) => AdapterEvent::Other,
            Err(err) => {
                warn!("Adapter event error: {err}");
                AdapterEvent::Other
            }
        });

        Ok(stream::once(async move { current }).chain(changes).boxed_local())
    }

    async fn start_scan<'a>(
        &'a self,
        services: &'a [Uuid],
    ) -> Result<LocalBoxStream<'a, Result<Peripheral, BackendError>>, BackendError> {
        let reports = self.adapter.scan(services).await?;
        Ok(reports.map(move |advertising| Ok(self.remember(advertising))).boxed_local())
    }

    async fn connect(&self, id: &PeripheralId, params: &LinkParams) -> Result<Device, BackendError> {
        let device = self
            .discovered
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::UnknownPeripheral(id.clone()))?;

        if params.auto_connect {
            debug!("Background reconnection is not available here, connecting once");
        }

        self.adapter.connect_device(&device).await?;

        // bluest has no MTU request; the platform negotiates the largest it supports.
        debug!(requested_mtu = params.requested_mtu, "Link up, MTU left to the platform");

        Ok(device)
    }

    async fn disconnect(&self, handle: &Device) -> Result<(), BackendError> {
        self.adapter.disconnect_device(handle).await?;
        Ok(())
    }

    async fn enable(&self) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("powering on the adapter"))
    }
}
