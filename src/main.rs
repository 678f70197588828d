//! Distance relay firmware binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **ESP32**: `cargo espflash flash --bin distance-relay --features esp32 --release`
//!   (or `cargo run --bin flash-esp32`)
//! - **Host**: `cargo run --bin distance-relay`
//!
//! ## Host simulation
//!
//! There is no radio on the host. Lines typed on stdin are handled as
//! characteristic writes (`distance:0.4`), and `connect` / `disconnect`
//! simulate a central joining and leaving.
//!
//! ## Endpoints
//!
//! - Status page: http://<device-ip>/ (port 80 on ESP32, 8080 on host)

use distance_relay::{LinkState, ReadingStore, StatusServer};
use log::{error, info, warn};

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Port 80 needs privileges on a desktop OS.
#[cfg(not(feature = "esp32"))]
const HOST_HTTP_PORT: u16 = 8080;

/// Start the status page, logging instead of failing.
fn start_status_page(port: u16, store: &ReadingStore) -> Option<StatusServer> {
    match StatusServer::start(None, port, store.clone()) {
        Ok(server) => Some(server),
        Err(e) => {
            warn!("Failed to start status page: {}", e);
            None
        }
    }
}

#[cfg(feature = "esp32")]
fn main() {
    use distance_relay::ble::DistanceService;
    use distance_relay::network::{NetworkProvider, WifiNetwork};
    use distance_relay::proximity::LedIndicator;
    use distance_relay::{ProximityActuator, Relay, RelayConfig, DEFAULT_HTTP_PORT};
    use esp32_nimble::BLEDevice;
    use esp_idf_hal::gpio::OutputPin;
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;

    platform_init();
    info!("=== Distance Relay starting ===");

    let config = RelayConfig::compiled();
    if let Err(e) = config.validate() {
        error!("Invalid build configuration: {}", e);
        return;
    }

    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to take peripherals: {:?}", e);
            return;
        }
    };
    let sysloop = match EspSystemEventLoop::take() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to take system event loop: {:?}", e);
            return;
        }
    };

    let store = ReadingStore::new();
    let link = LinkState::new();

    // BLE peripheral
    let device = BLEDevice::take();
    let service = DistanceService::new(
        device.get_server(),
        config.device_name,
        store.clone(),
        link.reporter(),
    );
    if let Err(e) = service.start_advertising() {
        error!("Failed to start advertising: {}", e);
        return;
    }

    // WiFi + status page. Failure here leaves the BLE side running.
    let (network_guard, status_server) = match config.wifi() {
        Ok(Some(wifi_config)) => match WifiNetwork::new(peripherals.modem, sysloop, wifi_config) {
            Ok(mut network) => match network.connect() {
                Ok(()) => {
                    let server = start_status_page(DEFAULT_HTTP_PORT, &store);
                    if let Some(url) = network.status_url(DEFAULT_HTTP_PORT) {
                        info!("Status page at {}", url);
                    }
                    (Some(network), server)
                }
                Err(e) => {
                    error!("WiFi connection failed: {}", e);
                    (None, None)
                }
            },
            Err(e) => {
                error!("WiFi initialization failed: {}", e);
                (None, None)
            }
        },
        Ok(None) => {
            warn!("WIFI_SSID not set at build time, status page disabled");
            (None, None)
        }
        Err(e) => {
            error!("Invalid WiFi configuration: {}", e);
            (None, None)
        }
    };

    // Proximity LED on GPIO 2
    let led = match LedIndicator::new(peripherals.pins.gpio2.downgrade_output()) {
        Ok(led) => led,
        Err(e) => {
            error!("Failed to configure LED: {:?}", e);
            return;
        }
    };

    // The WiFi driver and server thread must outlive the relay loop
    let _guards = (network_guard, status_server);

    info!("Entering relay loop...");
    Relay::new(store, link, service, ProximityActuator::new(led)).run();
}

#[cfg(not(feature = "esp32"))]
fn main() {
    use distance_relay::network::{HostNetwork, NetworkProvider};
    use distance_relay::proximity::LogIndicator;
    use distance_relay::relay::LogRadio;
    use distance_relay::{ProximityActuator, Relay};
    use std::io::BufRead;

    platform_init();
    info!("=== Distance Relay starting (host simulation) ===");

    let store = ReadingStore::new();
    let link = LinkState::new();

    let mut network = HostNetwork::new();
    if let Err(e) = network.connect() {
        error!("Network setup failed: {}", e);
    }
    let status_server = start_status_page(HOST_HTTP_PORT, &store);
    if status_server.is_some() {
        if let Some(url) = network.status_url(HOST_HTTP_PORT) {
            info!("Status page at {}", url);
        }
    }

    // Simulated central: stdin lines become writes and link events
    let writer = store.clone();
    let reporter = link.reporter();
    let spawned = std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.trim() {
                    "connect" => reporter.set_connected(true),
                    "disconnect" => reporter.set_connected(false),
                    "" => {}
                    payload => {
                        // Rejections are logged by the store
                        let _ = writer.ingest(payload.as_bytes());
                    }
                }
            }
        });
    if let Err(e) = spawned {
        error!("Failed to start stdin reader: {}", e);
        return;
    }

    // Keeps the server thread alive for the never-returning relay loop
    let _guard = status_server;

    info!("Type 'distance:<metres>', 'connect' or 'disconnect'");
    Relay::new(store, link, LogRadio, ProximityActuator::new(LogIndicator)).run();
}
