//! Session state machine.
//!
//! Tracks the connection lifecycle as reported by the remote client, the
//! slot assigned after authentication, and the two tick timers that hang
//! off a session.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────────┐  connect   ┌────────────┐  auth ok   ┌───────────────┐
//! │ Disconnected │───────────▶│ Connecting │───────────▶│ Authenticated │
//! └──────────────┘            └─────┬──────┘            └───────┬───────┘
//!        ▲                          │ refused                   │
//!        │                          ▼                           │
//!        │                 ┌───────────────────┐                │
//!        │                 │ ConnectionRefused │                │
//!        │                 └───────────────────┘                │
//!        └──────────────────────────────────────────────────────┘
//!                              disconnect
//! ```
//!
//! The remote client offers no push notification for status changes, so
//! the session polls it once per tick and diffs against the last value it
//! saw ([`SessionState::observe`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default death link cooldown, in ticks.
pub const DEFAULT_DEATH_LINK_COOLDOWN_TICKS: u32 = 400;

/// Connection status as reported by the remote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Authenticated,
    ConnectionRefused,
}

impl ConnectionStatus {
    /// Stable name for logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::ConnectionRefused => "connection_refused",
        }
    }

    /// Check if the slot is authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change in connection status seen between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: ConnectionStatus,
    pub to: ConnectionStatus,
}

impl StatusTransition {
    /// Check if this transition enters `status`.
    pub fn entered(&self, status: ConnectionStatus) -> bool {
        self.to == status
    }
}

/// Debounce for the shared death signal.
///
/// While the counter is above zero no death link may be sent or accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeathLinkCooldown {
    remaining: u32,
}

impl DeathLinkCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cooldown. Fails if one is already running.
    pub fn arm(&mut self, ticks: u32) -> bool {
        if self.remaining > 0 {
            return false;
        }
        self.remaining = ticks;
        true
    }

    /// Advance one tick. Returns true on the tick the counter reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Check if the cooldown is running.
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Ticks left on the cooldown.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// One-shot timer started with a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectTimer {
    remaining: Option<u32>,
}

impl ConnectTimer {
    /// Timer that expires after `ticks` ticks.
    pub fn start(ticks: u32) -> Self {
        Self {
            remaining: Some(ticks),
        }
    }

    /// Advance one tick. Returns true exactly once, when the timer expires.
    pub fn tick(&mut self) -> bool {
        match self.remaining {
            Some(0) | Some(1) => {
                self.remaining = None;
                true
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                false
            }
            None => false,
        }
    }

    /// Check if the timer has yet to fire.
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }
}

/// Per-connection session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Server address used for this attempt
    pub address: String,

    /// Slot (player) name
    pub slot_name: String,

    /// Last status observed from the remote client
    status: ConnectionStatus,

    /// Slot number from slot data
    slot_number: Option<i64>,

    death_link: DeathLinkCooldown,

    connect_timer: ConnectTimer,
}

impl SessionState {
    /// Start a session for a new connect attempt.
    pub fn new(address: String, slot_name: String, connect_timeout_ticks: u32) -> Self {
        Self {
            address,
            slot_name,
            status: ConnectionStatus::Disconnected,
            slot_number: None,
            death_link: DeathLinkCooldown::new(),
            connect_timer: ConnectTimer::start(connect_timeout_ticks),
        }
    }

    /// Last observed connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Compare the remote's current status to the last one seen.
    pub fn observe(&mut self, current: ConnectionStatus) -> Option<StatusTransition> {
        if current == self.status {
            return None;
        }
        let transition = StatusTransition {
            from: self.status,
            to: current,
        };
        self.status = current;
        tracing::info!(from = %transition.from, to = %transition.to, "connection status changed");
        Some(transition)
    }

    /// Slot number from slot data, once received.
    pub fn slot_number(&self) -> Option<i64> {
        self.slot_number
    }

    /// Record the slot number from slot data.
    pub fn set_slot_number(&mut self, slot: i64) {
        if let Some(previous) = self.slot_number {
            if previous != slot {
                tracing::warn!(previous, slot, "slot number changed mid-session");
            }
        }
        self.slot_number = Some(slot);
    }

    /// Death link cooldown.
    pub fn death_link(&self) -> &DeathLinkCooldown {
        &self.death_link
    }

    /// Mutable death link cooldown.
    pub fn death_link_mut(&mut self) -> &mut DeathLinkCooldown {
        &mut self.death_link
    }

    /// Advance the connect timer; true on the tick it expires.
    pub fn tick_connect_timer(&mut self) -> bool {
        self.connect_timer.tick()
    }

    /// Serialize for presentation.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "address": self.address,
            "slot_name": self.slot_name,
            "status": self.status.as_str(),
            "slot_number": self.slot_number,
            "death_link_cooldown": self.death_link.remaining(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session() -> SessionState {
        SessionState::new("localhost:38281".to_string(), "Sybil".to_string(), 900)
    }

    #[test]
    fn test_session_new() {
        let session = make_session();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(session.slot_number(), None);
        assert!(!session.death_link().is_active());
    }

    #[test]
    fn test_observe_reports_changes_once() {
        let mut session = make_session();

        assert_eq!(session.observe(ConnectionStatus::Disconnected), None);

        let t = session.observe(ConnectionStatus::Connecting).unwrap();
        assert_eq!(t.from, ConnectionStatus::Disconnected);
        assert!(t.entered(ConnectionStatus::Connecting));
        assert_eq!(session.observe(ConnectionStatus::Connecting), None);

        let t = session.observe(ConnectionStatus::Authenticated).unwrap();
        assert!(t.entered(ConnectionStatus::Authenticated));
        assert!(session.status().is_authenticated());

        // Drop and reconnect
        session.observe(ConnectionStatus::Disconnected).unwrap();
        let t = session.observe(ConnectionStatus::Authenticated).unwrap();
        assert_eq!(t.from, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_cooldown_rejects_second_arm() {
        let mut cooldown = DeathLinkCooldown::new();

        assert!(cooldown.arm(400));
        assert!(!cooldown.arm(10));
        assert_eq!(cooldown.remaining(), 400);
    }

    #[test]
    fn test_cooldown_reaches_zero_once() {
        let mut cooldown = DeathLinkCooldown::new();
        cooldown.arm(3);

        assert!(!cooldown.tick());
        assert!(!cooldown.tick());
        assert!(cooldown.tick());
        assert!(!cooldown.is_active());

        // Idle ticks report nothing
        assert!(!cooldown.tick());
        assert!(cooldown.arm(3));
    }

    #[test]
    fn test_connect_timer_fires_once() {
        let mut timer = ConnectTimer::start(2);

        assert!(!timer.tick());
        assert!(timer.tick());
        assert!(!timer.is_running());
        assert!(!timer.tick());

        assert!(!ConnectTimer::default().tick());
    }

    #[test]
    fn test_slot_number() {
        let mut session = make_session();
        session.set_slot_number(3);
        session.set_slot_number(4);
        assert_eq!(session.slot_number(), Some(4));
    }

    #[test]
    fn test_to_json() {
        let mut session = make_session();
        session.set_slot_number(2);
        session.death_link_mut().arm(5);

        let json = session.to_json();
        assert_eq!(json["status"], "disconnected");
        assert_eq!(json["slot_number"], 2);
        assert_eq!(json["death_link_cooldown"], 5);
    }
}
