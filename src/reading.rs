//! Distance readings written by the BLE peer.
//!
//! The peer writes text of the form `<prefix>:<number>` (for example
//! `distance:0.42`) into the value characteristic. The number is the distance
//! in metres. Negative numbers are refused; anything that is not a number at
//! all is still stored so it can be shown, but it never counts as "near".
//!
//! # Example
//!
//! ```
//! use distance_relay::reading::{ReadingStore, IngestError};
//!
//! let store = ReadingStore::new();
//! assert_eq!(store.ingest(b"distance:0.8"), Ok(1));
//! assert_eq!(store.ingest(b"distance:-3"), Err(IngestError::Negative(-3.0)));
//!
//! let (revision, reading) = store.snapshot();
//! assert_eq!(revision, 1);
//! assert_eq!(reading.unwrap().distance, Some(0.8));
//! ```

use log::{debug, warn};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Maximum accepted payload size: the largest value a GATT attribute can
/// hold, so long writes and large MTUs still fit.
pub const MAX_PAYLOAD_LEN: usize = 512;

/// Separator between the prefix and the numeric value.
const PREFIX_SEPARATOR: char = ':';

/// The latest value written by the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Payload as written (trimmed). This is what gets republished.
    pub text: String,
    /// Parsed distance, `None` if the value part is not a number.
    pub distance: Option<f32>,
}

impl Reading {
    /// Whether this reading is inside the proximity window `(0, threshold]`.
    pub fn is_near(&self, threshold: f32) -> bool {
        matches!(self.distance, Some(d) if d > 0.0 && d <= threshold)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse a raw characteristic write into a [`Reading`].
pub fn parse_payload(data: &[u8]) -> Result<Reading, IngestError> {
    if data.len() > MAX_PAYLOAD_LEN {
        return Err(IngestError::TooLong {
            len: data.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let text = std::str::from_utf8(data)
        .map_err(|_| IngestError::InvalidUtf8)?
        .trim();
    if text.is_empty() {
        return Err(IngestError::Empty);
    }

    let value = match text.split_once(PREFIX_SEPARATOR) {
        Some((_prefix, value)) => value.trim(),
        None => text,
    };

    let distance = match value.parse::<f32>() {
        Ok(d) if !d.is_finite() => return Err(IngestError::NotFinite),
        Ok(d) if d < 0.0 => return Err(IngestError::Negative(d)),
        Ok(d) => Some(d),
        Err(_) => None,
    };

    Ok(Reading {
        text: text.to_string(),
        distance,
    })
}

#[derive(Debug, Default)]
struct StoreInner {
    revision: u32,
    reading: Option<Reading>,
}

/// Shared last-write-wins slot for the latest reading.
///
/// Cloning is cheap; all clones share the same slot. Writers are the BLE
/// write callback (or stdin on host), readers are the relay loop and the
/// HTTP thread.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ReadingStore {
    /// Create an empty store (revision 0, no reading).
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and store a raw write.
    ///
    /// Returns the new revision on success. On error the stored reading is
    /// left untouched.
    pub fn ingest(&self, data: &[u8]) -> Result<u32, IngestError> {
        let reading = match parse_payload(data) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Ignoring value write: {}", e);
                return Err(e);
            }
        };

        debug!("Stored reading: {}", reading.text);
        let mut inner = self.lock();
        inner.revision = inner.revision.wrapping_add(1);
        inner.reading = Some(reading);
        Ok(inner.revision)
    }

    /// Current revision and reading.
    pub fn snapshot(&self) -> (u32, Option<Reading>) {
        let inner = self.lock();
        (inner.revision, inner.reading.clone())
    }

    /// Current reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.lock().reading.clone()
    }
}

/// Reasons a value write is refused.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Payload is empty or whitespace.
    Empty,
    /// Payload exceeds [`MAX_PAYLOAD_LEN`].
    TooLong { len: usize, max: usize },
    /// Payload is not valid UTF-8.
    InvalidUtf8,
    /// Value parsed as a negative number.
    Negative(f32),
    /// Value parsed as NaN or infinity.
    NotFinite,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::TooLong { len, max } => {
                write!(f, "payload too long: {} bytes (max {})", len, max)
            }
            Self::InvalidUtf8 => write!(f, "payload is not valid UTF-8"),
            Self::Negative(d) => write!(f, "negative distance: {}", d),
            Self::NotFinite => write!(f, "distance is not a finite number"),
        }
    }
}

impl std::error::Error for IngestError {}
