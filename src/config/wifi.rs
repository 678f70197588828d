//! WiFi credential types.
//!
//! Platform-independent so they can be tested on the host machine.
//!
//! # Example
//!
//! ```
//! use distance_relay::config::{ConfigError, WifiConfig};
//!
//! let config = WifiConfig::new("MyNetwork", "MyPassword").unwrap();
//! assert!(config.validate().is_ok());
//!
//! assert_eq!(WifiConfig::new("", "MyPassword"), Err(ConfigError::SsidEmpty));
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// WiFi credentials for connecting to an access point.
///
/// The password is zeroed when the value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network password (8-64 bytes for WPA2, empty for open networks).
    pub password: String,
}

impl WifiConfig {
    /// Create a new WiFi configuration.
    ///
    /// Returns an error if SSID or password are invalid.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ssid(&self.ssid)?;
        check_password(&self.password)
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

fn check_ssid(ssid: &str) -> Result<(), ConfigError> {
    match ssid.len() {
        0 => Err(ConfigError::SsidEmpty),
        len if len > MAX_SSID_LEN => Err(ConfigError::SsidTooLong {
            len,
            max: MAX_SSID_LEN,
        }),
        _ => Ok(()),
    }
}

/// Empty means an open network. 8-63 bytes is a WPA2 passphrase; exactly 64
/// is taken by the WiFi driver as a raw hex PSK.
fn check_password(password: &str) -> Result<(), ConfigError> {
    match password.len() {
        0 => Ok(()),
        len if len < MIN_PASSWORD_LEN => Err(ConfigError::PasswordTooShort {
            len,
            min: MIN_PASSWORD_LEN,
        }),
        len if len > MAX_PASSWORD_LEN => Err(ConfigError::PasswordTooLong {
            len,
            max: MAX_PASSWORD_LEN,
        }),
        MAX_PASSWORD_LEN if !password.bytes().all(|b| b.is_ascii_hexdigit()) => {
            Err(ConfigError::PskNotHex)
        }
        _ => Ok(()),
    }
}

// Keeps the password out of logs.
impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for WifiConfig {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Errors that can occur during configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// A 64-byte password is not a hex PSK.
    PskNotHex,
    /// Device name is empty or too long to advertise.
    InvalidDeviceName(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::PskNotHex => write!(f, "64-byte password must be a hex PSK"),
            Self::InvalidDeviceName(name) => write!(f, "invalid device name: {:?}", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = WifiConfig::new("TestNetwork", "password123").unwrap();
        assert_eq!(config.ssid, "TestNetwork");
        assert_eq!(config.password, "password123");
        assert!(!config.is_open());
    }

    #[test]
    fn test_open_network() {
        let config = WifiConfig::open("OpenNetwork").unwrap();
        assert!(config.is_open());
    }

    #[test]
    fn test_empty_ssid() {
        assert_eq!(WifiConfig::new("", "password123"), Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_limit() {
        assert!(WifiConfig::new("a".repeat(32), "password123").is_ok());
        assert!(matches!(
            WifiConfig::new("a".repeat(33), "password123"),
            Err(ConfigError::SsidTooLong { len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_password_length_limits() {
        assert!(matches!(
            WifiConfig::new("Net", "short"),
            Err(ConfigError::PasswordTooShort { .. })
        ));
        assert!(WifiConfig::new("Net", "12345678").is_ok());
        assert!(WifiConfig::new("Net", "a".repeat(64)).is_ok());
        assert!(matches!(
            WifiConfig::new("Net", "a".repeat(65)),
            Err(ConfigError::PasswordTooLong { .. })
        ));
    }

    #[test]
    fn test_64_byte_password_must_be_hex() {
        let psk = "0123456789abcdefABCDEF0123456789abcdefABCDEF0123456789abcdef0123";
        assert_eq!(psk.len(), 64);
        assert!(WifiConfig::new("Net", psk).is_ok());
        assert_eq!(
            WifiConfig::new("Net", "z".repeat(64)),
            Err(ConfigError::PskNotHex)
        );
        // 63 bytes is still a passphrase
        assert!(WifiConfig::new("Net", "z".repeat(63)).is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = WifiConfig::new("Net", "supersecret").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("Net"));
        assert!(!debug.contains("supersecret"));
    }
}
