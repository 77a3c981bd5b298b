//! Connection state and reconnection bookkeeping

use std::fmt;
use std::time::Duration;

/// Lifecycle of the single logical connection to the analysis server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport; possibly waiting on the reconnect timer
    #[default]
    Disconnected,
    /// Dialing the server
    Connecting,
    /// Transport open; frames flow
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Fixed-delay reconnection policy.
///
/// Retries forever with the same delay and never lets more than one timer
/// be outstanding: `schedule` refuses while an attempt is pending, and a
/// successful connection or an owner close cancels the pending timer.
#[derive(Debug)]
pub struct ReconnectPolicy {
    delay: Duration,
    pending: bool,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: false,
        }
    }

    /// Arm the timer. Returns the delay to wait, or `None` if an attempt
    /// is already pending.
    pub fn schedule(&mut self) -> Option<Duration> {
        if self.pending {
            return None;
        }
        self.pending = true;
        Some(self.delay)
    }

    /// Mark the pending timer as fired; the caller dials next.
    pub fn fired(&mut self) {
        self.pending = false;
    }

    /// Disarm any pending timer.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
