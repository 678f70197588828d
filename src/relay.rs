//! Relay loop.
//!
//! Ties the pieces together on the main thread:
//!
//! ```text
//! BLE write ──► ReadingStore ──► Relay::tick ──► RadioPort::publish (set value + notify)
//!                    │                 ├──────► ProximityActuator (LED)
//!                    │                 └──────► RadioPort::restart_advertising (on disconnect)
//!                    └──────────────────────────► StatusServer (own thread)
//! ```

use crate::link::{LinkEdge, LinkState};
use crate::proximity::{Indicator, ProximityActuator};
use crate::reading::ReadingStore;
use log::{debug, info, warn};
use std::fmt;
use std::time::Duration;

/// Pause between relay loop iterations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The outward-facing side of the radio.
pub trait RadioPort {
    /// Make `text` the readable value and notify subscribers.
    fn publish(&mut self, text: &str) -> Result<(), RelayError>;

    /// Make the device discoverable again.
    fn restart_advertising(&mut self) -> Result<(), RelayError>;
}

/// What happened during one [`Relay::tick`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Link edge observed this tick.
    pub edge: Option<LinkEdge>,
    /// Advertising was restarted (on the edge or on a later retry).
    pub advertising_restarted: bool,
    /// Revision that was published, if a new reading went out.
    pub published: Option<u32>,
}

/// Cooperative relay loop state.
pub struct Relay<R: RadioPort, I: Indicator> {
    store: ReadingStore,
    link: LinkState,
    radio: R,
    actuator: ProximityActuator<I>,
    published_revision: u32,
    /// Failed advertising restarts since the last disconnect; `None` when
    /// nothing is owed.
    advertising_owed: Option<u32>,
}

impl<R: RadioPort, I: Indicator> Relay<R, I> {
    /// Create a relay over the given store, link flags, radio and actuator.
    pub fn new(store: ReadingStore, link: LinkState, radio: R, actuator: ProximityActuator<I>) -> Self {
        Self {
            store,
            link,
            radio,
            actuator,
            published_revision: 0,
            advertising_owed: None,
        }
    }

    /// Run one iteration.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            edge: self.link.poll_edge(),
            ..Default::default()
        };

        match report.edge {
            Some(LinkEdge::Connected) => {
                info!("Peer connected");
                // The stack stops advertising once a central is connected
                self.advertising_owed = None;
            }
            Some(LinkEdge::Disconnected) => {
                info!("Peer disconnected, restarting advertising");
                self.advertising_owed = Some(0);
            }
            None => {}
        }
        report.advertising_restarted = self.restart_owed_advertising();

        let (revision, reading) = self.store.snapshot();
        if revision != self.published_revision {
            if let Some(reading) = &reading {
                match self.radio.publish(&reading.text) {
                    Ok(()) => {
                        info!("Published reading: {}", reading.text);
                        report.published = Some(revision);
                    }
                    Err(e) => warn!("Failed to publish reading: {}", e),
                }
            }
            // A failed publish is not retried; the next write supersedes it.
            self.published_revision = revision;
        }

        self.actuator.update(reading.as_ref());
        report
    }

    /// Restart advertising if a disconnect still awaits it. Retried every
    /// tick until it succeeds or a peer connects again.
    fn restart_owed_advertising(&mut self) -> bool {
        let Some(failures) = self.advertising_owed else {
            return false;
        };
        if self.link.is_connected() {
            return false;
        }

        match self.radio.restart_advertising() {
            Ok(()) => {
                if failures > 0 {
                    info!("Advertising restarted after {} failed attempts", failures);
                }
                self.advertising_owed = None;
                true
            }
            Err(e) => {
                if failures == 0 {
                    warn!("Failed to restart advertising, will retry: {}", e);
                } else {
                    debug!("Advertising retry {} failed: {}", failures, e);
                }
                self.advertising_owed = Some(failures.saturating_add(1));
                false
            }
        }
    }

    /// Loop forever, sleeping [`POLL_INTERVAL`] between ticks.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// The radio port.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// The proximity actuator.
    pub fn actuator(&self) -> &ProximityActuator<I> {
        &self.actuator
    }
}

/// Radio port for the host build: logs instead of transmitting.
#[derive(Debug, Default)]
pub struct LogRadio;

impl RadioPort for LogRadio {
    fn publish(&mut self, text: &str) -> Result<(), RelayError> {
        info!("[radio] notify: {}", text);
        Ok(())
    }

    fn restart_advertising(&mut self) -> Result<(), RelayError> {
        info!("[radio] advertising");
        Ok(())
    }
}

/// Errors surfaced by the radio side.
#[derive(Debug)]
pub enum RelayError {
    /// BLE stack error.
    Ble(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble(msg) => write!(f, "BLE error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {}
