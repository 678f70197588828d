//! Host network provider.
//!
//! The OS owns the interfaces on a desktop. All the relay needs from it is
//! an address to print next to the status-page port, so a user running the
//! simulation knows where to point a browser.

use super::{NetworkError, NetworkProvider};
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Public address used only to ask the routing table for the outbound
/// interface. No packet is sent.
const ROUTE_TARGET: &str = "8.8.8.8:80";

/// Host network provider.
#[derive(Debug, Default)]
pub struct HostNetwork {
    ip_addr: Option<IpAddr>,
}

impl HostNetwork {
    /// Create a provider; call [`NetworkProvider::connect`] to pick the address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Local address of the default route, if there is one.
    fn outbound_ip() -> Option<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        socket.connect(ROUTE_TARGET).ok()?;
        let ip = socket.local_addr().ok()?.ip();
        (!ip.is_unspecified()).then_some(ip)
    }
}

impl NetworkProvider for HostNetwork {
    fn connect(&mut self) -> Result<(), NetworkError> {
        let ip = match Self::outbound_ip() {
            Some(ip) => ip,
            None => {
                warn!("No default route, status page reachable on loopback only");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
        };
        info!("Host network ready, local IP: {}", ip);
        self.ip_addr = Some(ip);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ip_addr.is_some()
    }

    fn ip_addr(&self) -> Option<IpAddr> {
        self.ip_addr
    }
}
