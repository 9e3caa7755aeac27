//! Remote coordination client boundary.
//!
//! The transport to the multiworld server lives outside this crate. This
//! module defines what the synchronization engine needs from it
//! ([`RemoteClient`]) and how the client hands inbound events back
//! ([`EventSender`]).
//!
//! Inbound events may be produced on the client's I/O thread. They travel
//! through a channel and are applied only when the host calls
//! [`Client::poll_tick`](super::client::Client::poll_tick), so all state
//! mutation happens on the tick thread.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use super::error::RemoteError;
use super::items::NetworkItemId;
use super::session::ConnectionStatus;

/// Slot data fields the client asks the server for.
pub const SLOT_DATA_FIELDS: &[&str] = &["slot_number", "split_sun_greaves"];

/// Everything the remote client needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
    pub address: String,
    pub slot_name: String,
    pub password: String,
    pub game: String,
    pub client_version: [u32; 3],
    pub death_link: bool,
    /// Integer slot data fields to report through [`RemoteEvent::SlotDataInt`]
    pub slot_data_fields: Vec<String>,
}

/// Operation applied to a server-side data storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", content = "value", rename_all = "snake_case")]
pub enum DataStorageOp {
    Add(i64),
    Replace(i64),
}

/// An event delivered by the remote client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// An item was sent to this slot
    ItemReceived { id: NetworkItemId, notify: bool },

    /// The server confirmed a location check
    LocationChecked(NetworkItemId),

    /// Integer slot data field
    SlotDataInt { field: String, value: i64 },

    /// The server is about to resend the full item list
    ItemsCleared,
}

/// Handle the remote client uses to deliver events.
///
/// Cheap to clone and safe to move to another thread. Sends fail once the
/// session that created it has been dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<RemoteEvent>,
}

impl EventSender {
    /// Returns false if the session is gone.
    pub fn send(&self, event: RemoteEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Deliver a received item.
    pub fn item_received(&self, id: NetworkItemId, notify: bool) -> bool {
        self.send(RemoteEvent::ItemReceived { id, notify })
    }

    /// Deliver a confirmed location check.
    pub fn location_checked(&self, id: NetworkItemId) -> bool {
        self.send(RemoteEvent::LocationChecked(id))
    }

    /// Deliver an integer slot data field.
    pub fn slot_data_int(&self, field: &str, value: i64) -> bool {
        self.send(RemoteEvent::SlotDataInt {
            field: field.to_string(),
            value,
        })
    }

    /// Announce that the item list is about to be resent.
    pub fn items_cleared(&self) -> bool {
        self.send(RemoteEvent::ItemsCleared)
    }
}

/// Create the channel for one session.
pub fn event_channel() -> (EventSender, Receiver<RemoteEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender { tx }, rx)
}

/// Primitives consumed from the remote coordination client.
pub trait RemoteClient {
    /// Begin connecting. Events for this session go to `events`.
    fn open(&mut self, request: &ConnectRequest, events: EventSender) -> Result<(), RemoteError>;

    fn close(&mut self);

    fn connection_status(&self) -> ConnectionStatus;

    fn send_location_check(&mut self, id: NetworkItemId) -> Result<(), RemoteError>;

    fn send_death_link(&mut self) -> Result<(), RemoteError>;

    /// Whether a death link from another player is latched.
    fn death_link_pending(&self) -> bool;

    fn clear_death_link(&mut self);

    fn set_data_storage(&mut self, key: &str, op: DataStorageOp) -> Result<(), RemoteError>;

    fn story_complete(&mut self) -> Result<(), RemoteError>;

    fn say(&mut self, text: &str) -> Result<(), RemoteError>;

    /// Take the oldest undisplayed server message.
    fn take_message(&mut self) -> Option<String>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_cross_threads_in_order() {
        let (events, rx) = event_channel();

        let handle = std::thread::spawn(move || {
            events.slot_data_int("slot_number", 2);
            events.item_received(2_365_810_019, false);
            events.location_checked(2_365_810_001);
        });
        handle.join().unwrap();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                RemoteEvent::SlotDataInt {
                    field: "slot_number".to_string(),
                    value: 2
                },
                RemoteEvent::ItemReceived {
                    id: 2_365_810_019,
                    notify: false
                },
                RemoteEvent::LocationChecked(2_365_810_001),
            ]
        );
    }

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (events, rx) = event_channel();
        assert!(events.items_cleared());
        drop(rx);
        assert!(!events.items_cleared());
    }

    #[test]
    fn test_data_storage_op_json() {
        let json = serde_json::to_value(DataStorageOp::Add(0)).unwrap();
        assert_eq!(json, serde_json::json!({"operation": "add", "value": 0}));
    }
}
