//! Distance relay firmware library.
//!
//! A BLE central writes a distance into a GATT characteristic; the firmware
//! republishes it over BLE notify and an HTTP status page, and lights an LED
//! while the distance is within the proximity threshold.
//!
//! Everything except the ESP32 drivers ([`ble`], the WiFi provider and the
//! GPIO indicator) is platform-independent and tested on the host machine.

#[cfg(feature = "esp32")]
pub mod ble;
pub mod config;
pub mod http;
pub mod link;
pub mod network;
pub mod proximity;
pub mod reading;
pub mod relay;
pub mod status_page;

// Re-export commonly used items
pub use config::{ConfigError, RelayConfig, WifiConfig};
pub use http::{StatusServer, DEFAULT_HTTP_PORT};
pub use link::{LinkEdge, LinkState};
pub use proximity::{Indicator, ProximityActuator, PROXIMITY_THRESHOLD};
pub use reading::{IngestError, Reading, ReadingStore};
pub use relay::{RadioPort, Relay, RelayError};
