//! Peer link tracking.
//!
//! The BLE stack reports connects and disconnects from its own task. Those
//! callbacks only call [`LinkReporter::set_connected`]; the relay loop calls
//! [`LinkState::poll_edge`] to turn the flag into one event per transition.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// A change in the peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEdge {
    /// A central connected.
    Connected,
    /// The central went away; advertising must be restarted.
    Disconnected,
}

/// Current/previous connection flags.
///
/// `current` and the disconnect counter are shared with the stack callbacks;
/// `previous` and `seen_disconnects` belong to the poller.
#[derive(Debug, Default)]
pub struct LinkState {
    current: Arc<AtomicBool>,
    disconnects: Arc<AtomicU32>,
    previous: bool,
    seen_disconnects: u32,
}

impl LinkState {
    /// Create a state with no peer connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for stack callbacks to report the link state.
    pub fn reporter(&self) -> LinkReporter {
        LinkReporter {
            current: self.current.clone(),
            disconnects: self.disconnects.clone(),
        }
    }

    /// Whether a peer is connected right now.
    pub fn is_connected(&self) -> bool {
        self.current.load(Ordering::Acquire)
    }

    /// Return the edge since the last poll, if any.
    ///
    /// A connect and disconnect that both land between two polls still
    /// yield `Disconnected`. A disconnect followed by a reconnect yields
    /// nothing.
    pub fn poll_edge(&mut self) -> Option<LinkEdge> {
        let current = self.is_connected();
        let disconnects = self.disconnects.load(Ordering::Acquire);
        let missed_disconnect = disconnects != self.seen_disconnects;
        self.seen_disconnects = disconnects;

        if !current && (self.previous || missed_disconnect) {
            self.previous = false;
            Some(LinkEdge::Disconnected)
        } else if current && !self.previous {
            self.previous = true;
            Some(LinkEdge::Connected)
        } else {
            None
        }
    }
}

/// Cloneable writer half of [`LinkState`].
#[derive(Debug, Clone)]
pub struct LinkReporter {
    current: Arc<AtomicBool>,
    disconnects: Arc<AtomicU32>,
}

impl LinkReporter {
    /// Record whether a peer is connected.
    pub fn set_connected(&self, connected: bool) {
        if !connected {
            self.disconnects.fetch_add(1, Ordering::AcqRel);
        }
        self.current.store(connected, Ordering::Release);
    }
}
