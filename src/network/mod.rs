//! Network abstraction layer.
//!
//! The status page needs an IP interface. This module provides it on:
//! - **ESP32** (`esp32` feature): WiFi station using build-time credentials
//! - **Host**: native OS networking
//!
//! # Example
//!
//! ```ignore
//! use distance_relay::network::NetworkProvider;
//!
//! #[cfg(feature = "esp32")]
//! let mut network = network::WifiNetwork::new(modem, sysloop, wifi_config)?;
//!
//! #[cfg(not(feature = "esp32"))]
//! let mut network = network::HostNetwork::new();
//!
//! network.connect()?;
//! println!("Status page at {:?}", network.status_url(80));
//! ```

use std::net::{IpAddr, SocketAddr};

#[cfg(feature = "esp32")]
mod wifi;

#[cfg(not(feature = "esp32"))]
mod host;

#[cfg(feature = "esp32")]
pub use wifi::{WifiError, WifiNetwork};

#[cfg(not(feature = "esp32"))]
pub use host::HostNetwork;

/// Network provider abstraction.
///
/// Lets the firmware entry point bring up networking the same way on ESP32
/// (WiFi) and host (native).
pub trait NetworkProvider {
    /// Connect to the network.
    ///
    /// - On ESP32: joins the configured access point and waits for DHCP
    /// - On Host: detects the local address
    fn connect(&mut self) -> Result<(), NetworkError>;

    /// Check if the network is connected.
    fn is_connected(&self) -> bool;

    /// Get the local IP address.
    ///
    /// Returns `None` if not connected.
    fn ip_addr(&self) -> Option<IpAddr>;

    /// URL of the status page served on `port`, once an address is known.
    fn status_url(&self, port: u16) -> Option<String> {
        self.ip_addr().map(|ip| format!("http://{}/", SocketAddr::new(ip, port)))
    }
}

/// Network errors.
#[derive(Debug)]
pub enum NetworkError {
    /// WiFi connection failed (ESP32).
    #[cfg(feature = "esp32")]
    Wifi(WifiError),
    /// Generic I/O error.
    Io(std::io::Error),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "esp32")]
            Self::Wifi(e) => write!(f, "WiFi error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "esp32")]
            Self::Wifi(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "esp32")]
impl From<WifiError> for NetworkError {
    fn from(e: WifiError) -> Self {
        Self::Wifi(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::net::Ipv4Addr;

    struct FixedAddress(Option<IpAddr>);

    impl NetworkProvider for FixedAddress {
        fn connect(&mut self) -> Result<(), NetworkError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.0.is_some()
        }

        fn ip_addr(&self) -> Option<IpAddr> {
            self.0
        }
    }

    #[test]
    fn test_status_url_needs_address() {
        assert_eq!(FixedAddress(None).status_url(80), None);
        let network = FixedAddress(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))));
        assert_eq!(network.status_url(80).as_deref(), Some("http://10.0.0.7:80/"));
    }

    #[test]
    fn test_error_display() {
        let io = NetworkError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.to_string(), "I/O error: boom");
        assert!(io.source().is_some());
    }
}
