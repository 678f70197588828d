//! Relay configuration.
//!
//! The firmware has no config files. Everything is fixed at build time,
//! with a few values taken from the build environment:
//!
//! | Variable            | Meaning                          | Default          |
//! |---------------------|----------------------------------|------------------|
//! | `WIFI_SSID`         | Network to join                  | unset (no WiFi)  |
//! | `WIFI_PASSWORD`     | Network password, empty for open | empty            |
//! | `RELAY_DEVICE_NAME` | BLE advertised name              | `Distance-Relay` |
//!
//! ```text
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" cargo flash-esp32
//! ```

mod wifi;

pub use wifi::{ConfigError, WifiConfig, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN};

/// Advertised name when `RELAY_DEVICE_NAME` is not set.
pub const DEFAULT_DEVICE_NAME: &str = "Distance-Relay";

/// Longest name that fits a legacy (31 byte) advertising packet on its own.
pub const MAX_DEVICE_NAME_LEN: usize = 29;

/// Build-time settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// BLE advertised name.
    pub device_name: &'static str,
    /// WiFi SSID, `None` to run BLE only.
    pub wifi_ssid: Option<&'static str>,
    /// WiFi password.
    pub wifi_password: &'static str,
}

impl RelayConfig {
    /// Settings captured from the build environment.
    pub const fn compiled() -> Self {
        Self {
            device_name: match option_env!("RELAY_DEVICE_NAME") {
                Some(name) => name,
                None => DEFAULT_DEVICE_NAME,
            },
            wifi_ssid: option_env!("WIFI_SSID"),
            wifi_password: match option_env!("WIFI_PASSWORD") {
                Some(password) => password,
                None => "",
            },
        }
    }

    /// Validated WiFi credentials.
    ///
    /// `Ok(None)` when no SSID was configured (an empty SSID counts as unset).
    pub fn wifi(&self) -> Result<Option<WifiConfig>, ConfigError> {
        match self.wifi_ssid {
            Some(ssid) if !ssid.is_empty() => WifiConfig::new(ssid, self.wifi_password).map(Some),
            _ => Ok(None),
        }
    }

    /// Check the settings that do not depend on the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() || self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::InvalidDeviceName(self.device_name.to_string()));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::compiled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ssid: Option<&'static str>, password: &'static str) -> RelayConfig {
        RelayConfig {
            device_name: DEFAULT_DEVICE_NAME,
            wifi_ssid: ssid,
            wifi_password: password,
        }
    }

    #[test]
    fn test_default_device_name_is_valid() {
        assert!(config(None, "").validate().is_ok());
    }

    #[test]
    fn test_device_name_limits() {
        let mut cfg = config(None, "");
        cfg.device_name = "";
        assert!(cfg.validate().is_err());
        cfg.device_name = "A-Very-Long-Distance-Relay-Name";
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDeviceName(_))
        ));
    }

    #[test]
    fn test_no_ssid_means_no_wifi() {
        assert_eq!(config(None, "").wifi(), Ok(None));
        assert_eq!(config(Some(""), "password123").wifi(), Ok(None));
    }

    #[test]
    fn test_wifi_credentials_validated() {
        let wifi = config(Some("Home"), "password123").wifi().unwrap().unwrap();
        assert_eq!(wifi.ssid, "Home");
        assert!(matches!(
            config(Some("Home"), "short").wifi(),
            Err(ConfigError::PasswordTooShort { .. })
        ));
    }
}
