//! Progress store.
//!
//! The local record of everything the player has been sent: upgrade
//! counters, health pieces, keys, the generation options delivered with the
//! slot data, and the checked state of every location.
//!
//! All counters only grow. The only way back to zero is a fresh store
//! (new connection) or [`ProgressStore::clear_received_items`] when the
//! server is about to resend its item list.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::SyncError;
use super::items::{
    self, AbilityKey, ItemCategory, NetworkItemId, MAJOR_KEY_COUNT,
};
use super::locations::LocationTable;

/// Progressive slide count that grants slide jump.
pub const PROGRESSIVE_SLIDE_JUMP_THRESHOLD: u32 = 2;

/// Behaviors derived from upgrade counters that the player can switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedBehavior {
    SlideJump,
}

impl DerivedBehavior {
    /// Accepts the blueprint name, the in-game name, and a few spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "slidejump" | "solarwind" => Some(Self::SlideJump),
            _ => None,
        }
    }

    /// Name shown to the player.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SlideJump => "Solar Wind",
        }
    }
}

/// Cached state of derived capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DerivedFlags {
    pub slide_jump_owned: bool,
    pub slide_jump_disabled: bool,
}

/// Full copy of the store, pushed to the game as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub health_pieces: u32,
    pub small_keys: u32,
    pub major_keys: [bool; MAJOR_KEY_COUNT],
    pub abilities: BTreeMap<AbilityKey, u32>,
    pub options: BTreeMap<String, i64>,
    pub derived: DerivedFlags,
}

/// Mutable progress aggregate for one connection.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    health_pieces: u32,
    small_keys: u32,
    major_keys: [bool; MAJOR_KEY_COUNT],
    abilities: BTreeMap<AbilityKey, u32>,
    options: BTreeMap<String, i64>,
    derived: DerivedFlags,
    locations: LocationTable,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    /// Zeroed store over the standard location layout.
    pub fn new() -> Self {
        Self::with_locations(LocationTable::standard())
    }

    /// Zeroed store over a custom location table.
    pub fn with_locations(locations: LocationTable) -> Self {
        Self {
            health_pieces: 0,
            small_keys: 0,
            major_keys: [false; MAJOR_KEY_COUNT],
            abilities: AbilityKey::ALL.iter().map(|key| (*key, 0)).collect(),
            options: BTreeMap::new(),
            derived: DerivedFlags::default(),
            locations,
        }
    }

    /// Apply one received copy of an item.
    ///
    /// Every call counts, including repeats of the same id: items stack.
    pub fn apply_received_item(&mut self, id: NetworkItemId) -> ItemCategory {
        let category = items::category_of(id);
        match category {
            ItemCategory::Ability => match items::ability_key_of(id) {
                Some(key) => self.add_ability(key),
                None => {
                    tracing::error!(id, "ability id has no upgrade key");
                    return ItemCategory::Unrecognized;
                }
            },
            ItemCategory::HealthPiece => self.health_pieces = self.health_pieces.saturating_add(1),
            ItemCategory::SmallKey => self.small_keys = self.small_keys.saturating_add(1),
            ItemCategory::MajorKey => {
                let index = major_key_index(id);
                self.major_keys[index] = true;
            }
            ItemCategory::Unrecognized => {
                tracing::warn!(
                    id,
                    "received an item id that isn't recognized; \
                     check that the client matches the version the seed was generated on"
                );
            }
        }
        category
    }

    fn add_ability(&mut self, key: AbilityKey) {
        let count = self.abilities.entry(key).or_insert(0);
        *count = count.saturating_add(1);

        if !self.derived.slide_jump_owned
            && (key == AbilityKey::SlideJump
                || self.ability_count(AbilityKey::ProgressiveSlide)
                    >= PROGRESSIVE_SLIDE_JUMP_THRESHOLD)
        {
            self.derived.slide_jump_owned = true;
            tracing::debug!("slide jump unlocked");
        }
    }

    /// Reset everything that came from received items.
    ///
    /// Locations, options and the player's slide jump toggle are kept.
    pub fn clear_received_items(&mut self) {
        self.health_pieces = 0;
        self.small_keys = 0;
        self.major_keys = [false; MAJOR_KEY_COUNT];
        for count in self.abilities.values_mut() {
            *count = 0;
        }
        self.derived.slide_jump_owned = false;
    }

    /// Whether any item has been applied since the store was built or cleared.
    pub fn has_received_items(&self) -> bool {
        self.health_pieces > 0
            || self.small_keys > 0
            || self.major_keys.iter().any(|k| *k)
            || self.abilities.values().any(|c| *c > 0)
    }

    /// Set a generation option, replacing any earlier value.
    pub fn set_option(&mut self, name: &str, value: i64) {
        tracing::info!(option = name, value, "set option");
        self.options.insert(name.to_string(), value);
    }

    /// Record a location the server confirmed as checked.
    pub fn mark_location_checked(&mut self, id: NetworkItemId) -> Result<bool, SyncError> {
        self.locations.mark_checked(id).map_err(|e| {
            tracing::error!(
                id,
                "no location with this id was found; the location table is out of date"
            );
            e
        })
    }

    /// Flip a derived behavior. Returns the new "disabled" state.
    pub fn toggle_derived_behavior(&mut self, behavior: DerivedBehavior) -> Result<bool, SyncError> {
        match behavior {
            DerivedBehavior::SlideJump => {
                if !self.derived.slide_jump_owned {
                    return Err(SyncError::PrerequisiteNotMet(behavior.display_name()));
                }
                self.derived.slide_jump_disabled = !self.derived.slide_jump_disabled;
                Ok(self.derived.slide_jump_disabled)
            }
        }
    }

    /// Health pieces received.
    pub fn health_pieces(&self) -> u32 {
        self.health_pieces
    }

    /// Small keys received.
    pub fn small_keys(&self) -> u32 {
        self.small_keys
    }

    /// Major keys received, by slot.
    pub fn major_keys(&self) -> &[bool; MAJOR_KEY_COUNT] {
        &self.major_keys
    }

    /// Counter per upgrade key.
    pub fn abilities(&self) -> &BTreeMap<AbilityKey, u32> {
        &self.abilities
    }

    /// Get the counter for one upgrade key.
    pub fn ability_count(&self, key: AbilityKey) -> u32 {
        self.abilities.get(&key).copied().unwrap_or(0)
    }

    /// All generation options.
    pub fn options(&self) -> &BTreeMap<String, i64> {
        &self.options
    }

    /// Get one generation option.
    pub fn option(&self, name: &str) -> Option<i64> {
        self.options.get(name).copied()
    }

    /// Derived capability flags.
    pub fn derived(&self) -> DerivedFlags {
        self.derived
    }

    /// Location table with checked state.
    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    /// Copy of everything the game needs to resync.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            health_pieces: self.health_pieces,
            small_keys: self.small_keys,
            major_keys: self.major_keys,
            abilities: self.abilities.clone(),
            options: self.options.clone(),
            derived: self.derived,
        }
    }
}

/// Slot for a major key id, clamped into range.
fn major_key_index(id: NetworkItemId) -> usize {
    let offset = items::major_key_offset(id);
    let max = MAJOR_KEY_COUNT as i64 - 1;
    if !(0..=max).contains(&offset) {
        tracing::error!(id, offset, "major key id outside the key range; clamping");
    }
    offset.clamp(0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SLIDE_JUMP: NetworkItemId = 2_365_810_005;
    const HEALTH_PIECE: NetworkItemId = 2_365_810_019;
    const SMALL_KEY: NetworkItemId = 2_365_810_020;
    const PROGRESSIVE_SLIDE: NetworkItemId = 2_365_810_026;
    const HELIACAL_POWER: NetworkItemId = 2_365_810_011;
    const SPLIT_KICK: NetworkItemId = 2_365_810_027;

    #[test]
    fn test_new_store_is_zeroed() {
        let store = ProgressStore::new();
        assert_eq!(store.health_pieces(), 0);
        assert_eq!(store.small_keys(), 0);
        assert_eq!(store.major_keys(), &[false; MAJOR_KEY_COUNT]);
        assert_eq!(store.abilities().len(), AbilityKey::ALL.len());
        assert!(store.abilities().values().all(|c| *c == 0));
        assert!(!store.has_received_items());
    }

    #[test]
    fn test_counters() {
        let mut store = ProgressStore::new();

        assert_eq!(store.apply_received_item(HEALTH_PIECE), ItemCategory::HealthPiece);
        store.apply_received_item(HEALTH_PIECE);
        assert_eq!(store.apply_received_item(SMALL_KEY), ItemCategory::SmallKey);

        assert_eq!(store.health_pieces(), 2);
        assert_eq!(store.small_keys(), 1);
    }

    #[test]
    fn test_counters_saturate() {
        let mut store = ProgressStore::new();
        store.health_pieces = u32::MAX;
        store.abilities.insert(AbilityKey::ProgressiveSlide, u32::MAX);

        store.apply_received_item(2_365_810_019);
        store.apply_received_item(2_365_810_026);

        assert_eq!(store.health_pieces(), u32::MAX);
        assert_eq!(store.ability_count(AbilityKey::ProgressiveSlide), u32::MAX);
        assert!(store.derived().slide_jump_owned);
    }

    #[test]
    fn test_ability_counter_counts_every_copy_in_any_order() {
        let orders = [
            [HELIACAL_POWER, SPLIT_KICK, SPLIT_KICK, HELIACAL_POWER],
            [SPLIT_KICK, SPLIT_KICK, HELIACAL_POWER, HELIACAL_POWER],
            [HELIACAL_POWER, HELIACAL_POWER, SPLIT_KICK, SPLIT_KICK],
        ];
        for order in orders {
            let mut store = ProgressStore::new();
            for id in order {
                assert_eq!(store.apply_received_item(id), ItemCategory::Ability);
            }
            assert_eq!(store.ability_count(AbilityKey::ExtraKick), 4);
        }
    }

    #[test]
    fn test_major_keys_set_distinct_slots() {
        let mut seen = Vec::new();
        for offset in 0..MAJOR_KEY_COUNT as i64 {
            let mut store = ProgressStore::new();
            let id = items::MAJOR_KEY_BASE_ID + offset;

            assert_eq!(store.apply_received_item(id), ItemCategory::MajorKey);

            let set: Vec<usize> = (0..MAJOR_KEY_COUNT)
                .filter(|i| store.major_keys()[*i])
                .collect();
            assert_eq!(set.len(), 1);
            assert!(!seen.contains(&set[0]));
            seen.push(set[0]);
        }
    }

    #[test]
    fn test_major_key_index_clamps() {
        assert_eq!(major_key_index(items::MAJOR_KEY_BASE_ID - 3), 0);
        assert_eq!(major_key_index(items::MAJOR_KEY_BASE_ID + 40), MAJOR_KEY_COUNT - 1);
    }

    #[test]
    fn test_unrecognized_item_changes_nothing() {
        let mut store = ProgressStore::new();
        let before = store.snapshot();

        assert_eq!(store.apply_received_item(2_365_819_999), ItemCategory::Unrecognized);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_progressive_slide_unlocks_slide_jump() {
        let mut store = ProgressStore::new();

        store.apply_received_item(PROGRESSIVE_SLIDE);
        assert!(!store.derived().slide_jump_owned);

        store.apply_received_item(PROGRESSIVE_SLIDE);
        assert_eq!(store.ability_count(AbilityKey::ProgressiveSlide), 2);
        assert!(store.derived().slide_jump_owned);
    }

    #[test]
    fn test_solar_wind_unlocks_slide_jump() {
        let mut store = ProgressStore::new();
        store.apply_received_item(SLIDE_JUMP);
        assert!(store.derived().slide_jump_owned);
        assert_eq!(store.ability_count(AbilityKey::SlideJump), 1);
    }

    #[test]
    fn test_toggle_requires_ownership() {
        let mut store = ProgressStore::new();

        assert_eq!(
            store.toggle_derived_behavior(DerivedBehavior::SlideJump),
            Err(SyncError::PrerequisiteNotMet("Solar Wind"))
        );
        assert!(!store.derived().slide_jump_disabled);

        store.apply_received_item(SLIDE_JUMP);
        assert_eq!(store.toggle_derived_behavior(DerivedBehavior::SlideJump), Ok(true));
        assert_eq!(store.toggle_derived_behavior(DerivedBehavior::SlideJump), Ok(false));
    }

    #[test]
    fn test_behavior_names() {
        assert_eq!(DerivedBehavior::from_name("SlideJump"), Some(DerivedBehavior::SlideJump));
        assert_eq!(DerivedBehavior::from_name("solar wind"), Some(DerivedBehavior::SlideJump));
        assert_eq!(DerivedBehavior::from_name("slide_jump"), Some(DerivedBehavior::SlideJump));
        assert_eq!(DerivedBehavior::from_name("wall ride"), None);
    }

    #[test]
    fn test_mark_location_checked() {
        let mut store = ProgressStore::new();

        assert_eq!(store.mark_location_checked(2_365_810_001), Ok(true));
        let after_once = store.locations().checked_count();
        assert_eq!(store.mark_location_checked(2_365_810_001), Ok(false));
        assert_eq!(store.locations().checked_count(), after_once);

        assert_eq!(
            store.mark_location_checked(12),
            Err(SyncError::MissingLocation(12))
        );
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = [
            PROGRESSIVE_SLIDE,
            HEALTH_PIECE,
            items::MAJOR_KEY_BASE_ID + 2,
            SPLIT_KICK,
            2_365_819_999,
            SMALL_KEY,
            PROGRESSIVE_SLIDE,
            HEALTH_PIECE,
        ];

        let mut first = ProgressStore::new();
        for id in events {
            first.apply_received_item(id);
        }

        let mut second = ProgressStore::new();
        for id in events {
            second.apply_received_item(id);
        }

        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn test_clear_received_items_keeps_options_and_locations() {
        let mut store = ProgressStore::new();
        store.set_option("split_sun_greaves", 1);
        store.mark_location_checked(2_365_810_002).unwrap();
        store.apply_received_item(SLIDE_JUMP);
        store.toggle_derived_behavior(DerivedBehavior::SlideJump).unwrap();
        store.apply_received_item(HEALTH_PIECE);
        assert!(store.has_received_items());

        store.clear_received_items();

        assert!(!store.has_received_items());
        assert!(!store.derived().slide_jump_owned);
        assert!(store.derived().slide_jump_disabled);
        assert_eq!(store.option("split_sun_greaves"), Some(1));
        assert!(store.locations().is_checked(2_365_810_002));
    }

    #[test]
    fn test_snapshot_serializes_with_game_names() {
        let mut store = ProgressStore::new();
        store.apply_received_item(PROGRESSIVE_SLIDE);

        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["abilities"]["progressiveSlide"], 1);
        assert_eq!(json["abilities"]["SlideJump"], 0);
        assert_eq!(json["major_keys"], serde_json::json!([false, false, false, false, false]));
    }
}
