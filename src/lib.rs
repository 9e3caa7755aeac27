//! Pseudoregalia Multiworld State Library
//!
//! This crate keeps a running Pseudoregalia session in step with a
//! multiworld randomizer server.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Item Mapping** - Network item ids resolved to abilities, health
//!   pieces, small keys and major keys.
//!
//! - **Progress Store** - Counters that only grow, generation options from
//!   slot data, and the checked state of every location.
//!
//! - **Session State Machine** - Connection status tracked by polling, the
//!   death link cooldown and the connect timeout.
//!
//! - **Client Façade** - Applies remote events on the tick thread and
//!   queues full-state operations for the live game.
//!
//! # Design Principles
//!
//! 1. **The server is authoritative** - Local progress only changes on what
//!    the server reports, never optimistically.
//!
//! 2. **Full snapshots, not deltas** - Every resync carries complete state,
//!    so applying the newest one always converges.
//!
//! 3. **No networking** - The transport lives behind [`RemoteClient`].
//!
//! 4. **Serialization-ready** - Snapshots and session state convert to JSON.
//!
//! # Example
//!
//! ```rust
//! use pseudoregalia_ap_state::state::{AbilityKey, ItemCategory, ProgressStore};
//!
//! let mut store = ProgressStore::new();
//!
//! // Two progressive slides grant slide jump
//! assert_eq!(store.apply_received_item(2_365_810_026), ItemCategory::Ability);
//! store.apply_received_item(2_365_810_026);
//! assert_eq!(store.ability_count(AbilityKey::ProgressiveSlide), 2);
//! assert!(store.derived().slide_jump_owned);
//!
//! // Unknown ids are reported and ignored
//! assert_eq!(store.apply_received_item(1), ItemCategory::Unrecognized);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
