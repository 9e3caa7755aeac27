//! Live-session bridge.
//!
//! Queue of operations the host applies to the running game, drained once
//! per tick. Every operation carries full state rather than a delta, so
//! applying the newest one is always enough to converge. Pending snapshot
//! operations of the same kind coalesce.

use std::collections::VecDeque;

use serde::Serialize;

use super::items::NetworkItemId;
use super::locations::WorldPosition;
use super::progress::{ProgressSnapshot, ProgressStore};

/// A collectible the host should place in the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnRequest {
    pub zone: String,
    pub id: NetworkItemId,
    pub position: WorldPosition,
}

/// Operation for the host to apply to the live game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameOp {
    /// Set every progress counter and flag to the snapshot's values
    SyncItems(ProgressSnapshot),

    /// Place all listed collectibles, replacing any previously spawned
    SpawnCollectibles(Vec<SpawnRequest>),

    /// Kill the player character (incoming death link)
    Vaporize,
}

impl GameOp {
    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyncItems(_) => "sync_items",
            Self::SpawnCollectibles(_) => "spawn_collectibles",
            Self::Vaporize => "vaporize",
        }
    }

    fn coalesces_with(&self, other: &GameOp) -> bool {
        matches!(
            (self, other),
            (Self::SyncItems(_), Self::SyncItems(_))
                | (Self::SpawnCollectibles(_), Self::SpawnCollectibles(_))
        )
    }
}

/// The host side of the bridge.
pub trait LiveSession {
    fn apply(&mut self, op: &GameOp);
}

/// FIFO of pending game operations.
#[derive(Debug, Default)]
pub struct BridgeQueue {
    ops: VecDeque<GameOp>,
}

impl BridgeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an operation, superseding a pending one of the same kind.
    pub fn push(&mut self, op: GameOp) {
        self.ops.retain(|pending| !pending.coalesces_with(&op));
        tracing::debug!(op = op.as_str(), "queued game op");
        self.ops.push_back(op);
    }

    /// Take every pending operation in order.
    pub fn drain(&mut self) -> Vec<GameOp> {
        self.ops.drain(..).collect()
    }

    /// Apply every pending operation to the host. Returns how many ran.
    pub fn pump(&mut self, host: &mut impl LiveSession) -> usize {
        let ops = self.drain();
        for op in &ops {
            host.apply(op);
        }
        ops.len()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drop every pending operation.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

/// Spawn list for every zone under the store's current options.
pub fn spawn_requests(store: &ProgressStore) -> Vec<SpawnRequest> {
    let locations = store.locations();
    locations
        .zone_names()
        .flat_map(|zone| {
            locations
                .spawnable_in_zone(zone, store.options())
                .map(move |(id, collectible)| SpawnRequest {
                    zone: zone.to_string(),
                    id,
                    position: collectible.position,
                })
        })
        .collect()
}
