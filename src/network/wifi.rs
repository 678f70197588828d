//! ESP32 WiFi network provider.
//!
//! Joins the access point given at build time and waits for DHCP.

use super::{NetworkError, NetworkProvider};
use crate::config::WifiConfig;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_sys::EspError;
use log::{info, warn};
use std::net::IpAddr;

/// WiFi-based network provider for ESP32.
pub struct WifiNetwork<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    config: WifiConfig,
    ip_addr: Option<IpAddr>,
}

impl<'a> WifiNetwork<'a> {
    /// Create a new WiFi network provider.
    ///
    /// # Arguments
    ///
    /// * `modem` - The WiFi/BT modem peripheral
    /// * `sysloop` - The ESP-IDF system event loop
    /// * `config` - Credentials of the network to join
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        config: WifiConfig,
    ) -> Result<Self, NetworkError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), None).map_err(WifiError::Esp)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(WifiError::Esp)?;

        Ok(Self {
            wifi,
            config,
            ip_addr: None,
        })
    }

    fn join(&mut self) -> Result<String, WifiError> {
        let auth_method = if self.config.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: self
                .config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidSsid)?,
            password: self
                .config
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;
        self.wifi.start()?;

        // Relies on ESP-IDF's internal timeout mechanisms
        self.wifi.connect().map_err(WifiError::ConnectionFailed)?;
        self.wifi.wait_netif_up().map_err(WifiError::DhcpFailed)?;

        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        Ok(format!("{}", ip_info.ip))
    }
}

impl NetworkProvider for WifiNetwork<'_> {
    fn connect(&mut self) -> Result<(), NetworkError> {
        info!("Connecting to WiFi: {}", self.config.ssid);

        let ip_string = self.join()?;

        match ip_string.parse() {
            Ok(ip) => {
                self.ip_addr = Some(ip);
                info!("WiFi connected, IP: {}", ip_string);
            }
            Err(e) => {
                // The connection is still valid; the server binds 0.0.0.0
                warn!(
                    "WiFi connected but failed to parse IP '{}': {}",
                    ip_string, e
                );
                self.ip_addr = None;
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn ip_addr(&self) -> Option<IpAddr> {
        if self.is_connected() {
            self.ip_addr
        } else {
            None
        }
    }
}

/// Errors that can occur during WiFi operations.
#[derive(Debug)]
pub enum WifiError {
    /// SSID does not fit the driver's buffer.
    InvalidSsid,
    /// Password does not fit the driver's buffer.
    InvalidPassword,
    /// Failed to connect to the network.
    ConnectionFailed(EspError),
    /// Failed to obtain IP address via DHCP.
    DhcpFailed(EspError),
    /// ESP-IDF error.
    Esp(EspError),
}

impl From<EspError> for WifiError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

impl std::fmt::Display for WifiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::ConnectionFailed(e) => write!(f, "connection failed: {:?}", e),
            Self::DhcpFailed(e) => write!(f, "DHCP failed: {:?}", e),
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
        }
    }
}

impl std::error::Error for WifiError {}
