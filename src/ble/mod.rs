//! BLE GATT peripheral for the distance value.
//!
//! # GATT Service Structure
//!
//! ```text
//! Service: Distance Relay
//! └── Distance (Read, Write, Notify) - "<prefix>:<number>" as plain text
//! ```
//!
//! A central writes the measurement; the relay loop republishes accepted
//! values on the same characteristic and notifies subscribers. Writes with a
//! negative number are refused at the ATT level and never reach the store.

use crate::link::LinkReporter;
use crate::reading::ReadingStore;
use crate::relay::{RadioPort, RelayError};
use esp32_nimble::utilities::mutex::Mutex;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{
    uuid128, BLEAdvertisementData, BLECharacteristic, BLEDevice, BLEServer, NimbleProperties,
};
use log::{info, warn};
use std::sync::Arc;

/// Custom UUID for the Distance Relay service.
const DISTANCE_SERVICE_UUID: BleUuid = uuid128!("4fafc201-1fb5-459e-8fcc-c5c9c331914b");

/// UUID for the Distance characteristic.
const DISTANCE_CHAR_UUID: BleUuid = uuid128!("beb5483e-36e1-4688-b7f5-ea07361b26a8");

/// BLE GATT service holding the distance value slot.
pub struct DistanceService {
    device_name: &'static str,
    characteristic: Arc<Mutex<BLECharacteristic>>,
}

impl DistanceService {
    /// Create and register the service.
    ///
    /// `store` receives accepted writes; `link` is updated from the server's
    /// connect/disconnect callbacks.
    pub fn new(
        server: &mut BLEServer,
        device_name: &'static str,
        store: ReadingStore,
        link: LinkReporter,
    ) -> Self {
        // Advertising is restarted by the relay loop on the disconnect edge.
        server.advertise_on_disconnect(false);

        let connect_link = link.clone();
        server.on_connect(move |_server, desc| {
            info!("Central connected: {:?}", desc.address());
            connect_link.set_connected(true);
        });
        server.on_disconnect(move |desc, reason| {
            info!("Central disconnected: {:?} ({:?})", desc.address(), reason);
            link.set_connected(false);
        });

        let service = server.create_service(DISTANCE_SERVICE_UUID);
        let characteristic = service.lock().create_characteristic(
            DISTANCE_CHAR_UUID,
            NimbleProperties::READ | NimbleProperties::WRITE | NimbleProperties::NOTIFY,
        );

        characteristic.lock().on_write(move |args| {
            if store.ingest(args.recv_data()).is_err() {
                args.reject();
            }
        });

        Self {
            device_name,
            characteristic,
        }
    }

    /// Start BLE advertising.
    ///
    /// Falls back to the name alone if name plus service UUID do not fit a
    /// legacy advertising packet.
    pub fn start_advertising(&self) -> Result<(), RelayError> {
        let device = BLEDevice::take();
        let advertising = device.get_advertising();

        let full = advertising.lock().set_data(
            BLEAdvertisementData::new()
                .name(self.device_name)
                .add_service_uuid(DISTANCE_SERVICE_UUID),
        );
        if let Err(e) = full {
            warn!("Advertising data too large ({:?}), advertising name only", e);
            advertising
                .lock()
                .set_data(BLEAdvertisementData::new().name(self.device_name))
                .map_err(|e| RelayError::Ble(format!("{:?}", e)))?;
        }

        advertising
            .lock()
            .start()
            .map_err(|e| RelayError::Ble(format!("{:?}", e)))?;

        info!("Advertising as '{}'", self.device_name);
        Ok(())
    }
}

impl RadioPort for DistanceService {
    fn publish(&mut self, text: &str) -> Result<(), RelayError> {
        self.characteristic
            .lock()
            .set_value(text.as_bytes())
            .notify();
        Ok(())
    }

    fn restart_advertising(&mut self) -> Result<(), RelayError> {
        self.start_advertising()
    }
}
