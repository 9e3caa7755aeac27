//! Synchronization state for the Pseudoregalia multiworld client.
//!
//! This module provides the core state types and the engine that drives them:
//!
//! - `items` - Network item identifiers and what they grant
//! - `locations` - Collectible layout per zone and checked state
//! - `progress` - Per-connection progress store
//! - `session` - Connection lifecycle, death link cooldown, connect timeout
//! - `remote` - Boundary to the remote coordination client
//! - `bridge` - Operations queued for the live game
//! - `messages` - Player-facing message log
//! - `console` - Console command parsing
//! - `client` - The façade tying it all together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           Client<R>                                  │
//! │                                                                      │
//! │  ┌───────────────────────── Session (per connect) ────────────────┐  │
//! │  │                                                                │  │
//! │  │  ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐  │  │
//! │  │  │ SessionState │   │  ProgressStore   │   │ Receiver<      │  │  │
//! │  │  │              │   │                  │   │  RemoteEvent>  │  │  │
//! │  │  │ status       │   │ counters, keys   │   │                │  │  │
//! │  │  │ slot number  │   │ options          │   │ fed by the     │  │  │
//! │  │  │ cooldowns    │   │ LocationTable    │   │ remote thread  │  │  │
//! │  │  └──────────────┘   └──────────────────┘   └────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! │                                                                      │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐              │
//! │  │ RemoteClient │   │ BridgeQueue  │   │  MessageLog  │              │
//! │  │  (outbound)  │   │  (to game)   │   │ (to player)  │              │
//! │  └──────────────┘   └──────────────┘   └──────────────┘              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut client = Client::new(remote, SyncConfig::default());
//! client.connect("archipelago.gg:38281", "Sybil", "")?;
//!
//! // Every host tick
//! let outcome = client.poll_tick();
//! client.pump(&mut game);
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod items;
pub mod locations;
pub mod messages;
pub mod progress;
pub mod remote;
pub mod session;

// Re-export commonly used types
pub use bridge::{BridgeQueue, GameOp, LiveSession, SpawnRequest};
pub use client::{completion_key, Client, TickOutcome};
pub use config::SyncConfig;
pub use console::{parse_input, Command, ConsoleError, MessageOption};
pub use error::{RemoteError, SyncError};
pub use items::{AbilityKey, ItemCategory, NetworkItemId, ITEM_ID_BASE, MAJOR_KEY_COUNT};
pub use locations::{Collectible, LocationTable, WorldPosition};
pub use messages::{LogEntry, MessageKind, MessageLog, Notice};
pub use progress::{DerivedBehavior, DerivedFlags, ProgressSnapshot, ProgressStore};
pub use remote::{ConnectRequest, DataStorageOp, EventSender, RemoteClient, RemoteEvent};
pub use session::{ConnectionStatus, DeathLinkCooldown, SessionState, StatusTransition};

#[cfg(test)]
mod tests {
    use super::remote::testing::FakeRemote;
    use super::*;

    #[test]
    fn test_full_session_flow() {
        let mut client = Client::new(FakeRemote::default(), SyncConfig::default());
        client.connect("localhost:38281", "Sybil", "").unwrap();

        let events = client.remote().sender().clone();
        events.slot_data_int("slot_number", 1);
        events.slot_data_int("split_sun_greaves", 0);
        events.item_received(ITEM_ID_BASE + 8, true);
        client.remote_mut().status = ConnectionStatus::Authenticated;

        let outcome = client.poll_tick();
        assert_eq!(outcome.events_applied, 3);
        assert!(outcome
            .transition
            .unwrap()
            .entered(ConnectionStatus::Authenticated));

        let ops = client.drain_game_ops();
        match &ops[..] {
            [GameOp::SpawnCollectibles(spawns), GameOp::SyncItems(snapshot)] => {
                assert!(spawns.iter().all(|s| s.id != ITEM_ID_BASE + 51));
                assert_eq!(snapshot.abilities[&AbilityKey::WallRide], 1);
            }
            other => panic!("unexpected ops: {other:?}"),
        }

        client.complete_game().unwrap();
        assert_eq!(client.remote().storage[0].0, completion_key(1));
    }
}
