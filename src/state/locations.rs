//! Location table.
//!
//! Every randomized pickup in the world is a [`Collectible`]: a world
//! position, optionally gated on generation options, and a checked flag
//! that only ever goes from false to true.
//!
//! Location ids share the numeric range of item ids but are a separate
//! namespace. Each id belongs to exactly one zone.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::error::SyncError;
use super::items::NetworkItemId;

/// Position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPosition {
    /// Create a new position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Requirement that a generation option has a given truth value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCondition {
    pub option: String,
    pub required: bool,
}

impl OptionCondition {
    /// Options that were never set count as false.
    pub fn is_met(&self, options: &BTreeMap<String, i64>) -> bool {
        let value = options.get(&self.option).copied().unwrap_or(0) != 0;
        value == self.required
    }
}

/// A single pickup location.
#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub position: WorldPosition,

    /// All must hold for the pickup to exist in this seed
    pub conditions: Vec<OptionCondition>,

    checked: bool,
}

impl Collectible {
    /// Unchecked collectible with no conditions.
    pub fn new(position: WorldPosition) -> Self {
        Self {
            position,
            conditions: Vec::new(),
            checked: false,
        }
    }

    /// Only spawn when `option` matches `required`.
    pub fn with_condition(mut self, option: impl Into<String>, required: bool) -> Self {
        self.conditions.push(OptionCondition {
            option: option.into(),
            required,
        });
        self
    }

    /// Check if the server confirmed this location.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Mark as checked. Returns true only on the first call.
    pub fn check(&mut self) -> bool {
        let newly = !self.checked;
        self.checked = true;
        newly
    }

    /// Whether this pickup exists under the given options.
    pub fn is_enabled(&self, options: &BTreeMap<String, i64>) -> bool {
        self.conditions.iter().all(|c| c.is_met(options))
    }
}

/// Zone name → location id → collectible.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    zones: BTreeMap<String, BTreeMap<NetworkItemId, Collectible>>,

    /// Location id to zone name
    zone_index: HashMap<NetworkItemId, String>,
}

impl LocationTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The game's full pickup layout, every entry unchecked.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for entry in STANDARD_LAYOUT {
            let (x, y, z) = entry.position;
            let mut collectible = Collectible::new(WorldPosition::new(x, y, z));
            for (option, required) in entry.conditions {
                collectible = collectible.with_condition(*option, *required);
            }
            if let Err(e) = table.insert(entry.zone, entry.id, collectible) {
                tracing::error!("bad layout data: {e}");
            }
        }
        table
    }

    /// Register a location. Ids are unique across all zones.
    pub fn insert(
        &mut self,
        zone: &str,
        id: NetworkItemId,
        collectible: Collectible,
    ) -> Result<(), SyncError> {
        if let Some(existing) = self.zone_index.get(&id) {
            return Err(SyncError::DuplicateLocation {
                id,
                zone: existing.clone(),
            });
        }
        self.zone_index.insert(id, zone.to_string());
        self.zones
            .entry(zone.to_string())
            .or_default()
            .insert(id, collectible);
        Ok(())
    }

    /// Mark a location checked.
    ///
    /// Returns `Ok(true)` the first time, `Ok(false)` on repeats.
    pub fn mark_checked(&mut self, id: NetworkItemId) -> Result<bool, SyncError> {
        let zone = self
            .zone_index
            .get(&id)
            .ok_or(SyncError::MissingLocation(id))?;
        self.zones
            .get_mut(zone)
            .and_then(|locations| locations.get_mut(&id))
            .map(Collectible::check)
            .ok_or(SyncError::MissingLocation(id))
    }

    /// Get a collectible by location id.
    pub fn get(&self, id: NetworkItemId) -> Option<&Collectible> {
        let zone = self.zone_index.get(&id)?;
        self.zones.get(zone)?.get(&id)
    }

    /// Get the zone holding a location.
    pub fn zone_of(&self, id: NetworkItemId) -> Option<&str> {
        self.zone_index.get(&id).map(String::as_str)
    }

    /// Check if a location is checked. Unknown ids are not.
    pub fn is_checked(&self, id: NetworkItemId) -> bool {
        self.get(id).map(Collectible::is_checked).unwrap_or(false)
    }

    /// All collectibles of a zone, checked or not.
    pub fn collectibles_of_zone(&self, zone: &str) -> Option<&BTreeMap<NetworkItemId, Collectible>> {
        self.zones.get(zone)
    }

    /// Unchecked collectibles of a zone that exist under `options`.
    pub fn spawnable_in_zone<'a>(
        &'a self,
        zone: &str,
        options: &'a BTreeMap<String, i64>,
    ) -> impl Iterator<Item = (NetworkItemId, &'a Collectible)> + 'a {
        self.zones
            .get(zone)
            .into_iter()
            .flat_map(|locations| locations.iter())
            .filter(move |(_, c)| !c.is_checked() && c.is_enabled(options))
            .map(|(id, c)| (*id, c))
    }

    /// Names of every zone, in order.
    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zone_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zone_index.is_empty()
    }

    /// Check if any collectible's presence depends on `option`.
    pub fn is_gated_by(&self, option: &str) -> bool {
        self.zones
            .values()
            .flat_map(|locations| locations.values())
            .any(|c| c.conditions.iter().any(|cond| cond.option == option))
    }

    /// Number of checked locations.
    pub fn checked_count(&self) -> usize {
        self.zones
            .values()
            .flat_map(|locations| locations.values())
            .filter(|c| c.is_checked())
            .count()
    }
}

struct LayoutEntry {
    zone: &'static str,
    id: NetworkItemId,
    position: (f64, f64, f64),
    conditions: &'static [(&'static str, bool)],
}

const fn at(zone: &'static str, id: NetworkItemId, position: (f64, f64, f64)) -> LayoutEntry {
    LayoutEntry {
        zone,
        id,
        position,
        conditions: &[],
    }
}

const fn gated(
    zone: &'static str,
    id: NetworkItemId,
    position: (f64, f64, f64),
    conditions: &'static [(&'static str, bool)],
) -> LayoutEntry {
    LayoutEntry {
        zone,
        id,
        position,
        conditions,
    }
}

const DUNGEON: &str = "ZONE_Dungeon";
const CASTLE: &str = "ZONE_LowerCastle";
const KEEP: &str = "Zone_Upper";
const LIBRARY: &str = "Zone_Library";
const THEATRE: &str = "Zone_Theatre";
const BAILEY: &str = "ZONE_Exterior";
const UNDERBELLY: &str = "Zone_Caves";
const TOWER: &str = "Zone_Tower";

const SPLIT_GREAVES: &[(&str, bool)] = &[("split_sun_greaves", true)];
const WHOLE_GREAVES: &[(&str, bool)] = &[("split_sun_greaves", false)];

#[rustfmt::skip]
const STANDARD_LAYOUT: &[LayoutEntry] = &[
    at(DUNGEON, 2_365_810_001, (-3500.0, 4950.0, -50.0)),   // Dream Breaker
    at(DUNGEON, 2_365_810_002, (16650.0, 2600.0, 2350.0)),  // Slide
    at(DUNGEON, 2_365_810_016, (18250.0, -9750.0, 4200.0)), // dark rooms
    at(DUNGEON, 2_365_810_024, (750.0, 8850.0, 2650.0)),
    at(DUNGEON, 2_365_810_023, (7487.0, 1407.0, 4250.0)),
    at(DUNGEON, 2_365_810_030, (1150.0, -400.0, 1050.0)),
    at(DUNGEON, 2_365_810_031, (6800.0, 8850.0, 3850.0)),

    at(CASTLE, 2_365_810_003, (5400.0, 2100.0, -550.0)),    // Indignation
    at(CASTLE, 2_365_810_022, (2700.0, -1700.0, -500.0)),
    at(CASTLE, 2_365_810_013, (-5000.0, -600.0, 2050.0)),
    at(CASTLE, 2_365_810_025, (7950.0, 2750.0, -200.0)),
    at(CASTLE, 2_365_810_026, (-4100.0, -8200.0, 2950.0)),
    at(CASTLE, 2_365_810_017, (3390.0, 21150.0, 6600.0)),
    at(CASTLE, 2_365_810_019, (-3150.0, 11500.0, 6300.0)),
    at(CASTLE, 2_365_810_032, (1600.0, 8000.0, -1400.0)),
    at(CASTLE, 2_365_810_033, (11850.0, 1000.0, -300.0)),
    at(CASTLE, 2_365_810_034, (-10050.0, -3700.0, 1000.0)),
    at(CASTLE, 2_365_810_035, (-9600.0, 21750.0, 5400.0)),
    at(CASTLE, 2_365_810_036, (16400.0, 3800.0, 1200.0)),

    at(KEEP, 2_365_810_004, (-3000.0, 4900.0, -400.0)),     // Sunsetter
    at(KEEP, 2_365_810_005, (10050.0, 1800.0, 1000.0)),     // Strikebreak
    at(KEEP, 2_365_810_049, (14350.0, -50.0, 1350.0)),      // major key
    at(KEEP, 2_365_810_021, (-3900.0, -6109.0, -450.0)),
    at(KEEP, 2_365_810_027, (1050.0, 15700.0, 1300.0)),
    at(KEEP, 2_365_810_039, (800.0, 2500.0, 1200.0)),

    gated(LIBRARY, 2_365_810_006, (-4150.0, 9200.0, -100.0), WHOLE_GREAVES),
    gated(LIBRARY, 2_365_810_051, (-4150.0, 9160.0, 0.0), SPLIT_GREAVES),
    gated(LIBRARY, 2_365_810_052, (-4100.0, 9250.0, -100.0), SPLIT_GREAVES),
    gated(LIBRARY, 2_365_810_053, (-4200.0, 9250.0, -100.0), SPLIT_GREAVES),
    at(LIBRARY, 2_365_810_020, (-1300.0, -6750.0, -700.0)),
    at(LIBRARY, 2_365_810_037, (-9250.0, -1850.0, 1250.0)),
    at(LIBRARY, 2_365_810_038, (-3750.0, -4170.0, -700.0)),

    at(THEATRE, 2_365_810_007, (8500.0, 7850.0, -1400.0)),  // Soul Cutter
    at(THEATRE, 2_365_810_050, (5200.0, 1550.0, 700.0)),    // major key
    at(THEATRE, 2_365_810_012, (-14100.0, -150.0, 1950.0)),
    at(THEATRE, 2_365_810_015, (-1460.0, -2550.0, 2240.0)),
    at(THEATRE, 2_365_810_044, (255.0, 1150.0, 50.0)),
    at(THEATRE, 2_365_810_045, (-1600.0, 1500.0, 2600.0)),

    at(BAILEY, 2_365_810_008, (-1100.0, 10850.0, 150.0)),   // Solar Wind
    at(BAILEY, 2_365_810_046, (-1787.0, 5236.0, 650.0)),    // major key
    at(BAILEY, 2_365_810_014, (5040.0, 7150.0, 2500.0)),
    at(BAILEY, 2_365_810_028, (3007.0, 3457.0, 300.0)),
    at(BAILEY, 2_365_810_040, (2350.0, 7260.0, 2110.0)),

    at(UNDERBELLY, 2_365_810_009, (-5400.0, 6650.0, 6750.0)),   // Ascendant Light
    at(UNDERBELLY, 2_365_810_047, (31900.0, 26250.0, 3850.0)),  // major key
    at(UNDERBELLY, 2_365_810_011, (18896.0, 7937.0, 1200.0)),
    at(UNDERBELLY, 2_365_810_018, (11300.0, 12700.0, 3107.0)),
    at(UNDERBELLY, 2_365_810_029, (-726.0, 19782.0, 3200.0)),
    at(UNDERBELLY, 2_365_810_041, (19600.0, 17750.0, 5700.0)),
    at(UNDERBELLY, 2_365_810_042, (-4350.0, 28350.0, 1850.0)),
    at(UNDERBELLY, 2_365_810_043, (-2550.0, 12300.0, 4400.0)),

    at(TOWER, 2_365_810_010, (13350.0, 5250.0, 4150.0)),    // Cling Gem
    at(TOWER, 2_365_810_048, (9650.0, 5250.0, 7100.0)),     // major key
];

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_standard_layout_loads_every_entry() {
        let table = LocationTable::standard();
        assert_eq!(table.len(), STANDARD_LAYOUT.len());
        assert_eq!(table.checked_count(), 0);
        assert_eq!(table.zone_names().count(), 8);
        assert_eq!(table.zone_of(2_365_810_010), Some(TOWER));
    }

    #[test]
    fn test_mark_checked_is_idempotent() {
        let mut table = LocationTable::standard();

        assert_eq!(table.mark_checked(2_365_810_001), Ok(true));
        assert_eq!(table.mark_checked(2_365_810_001), Ok(false));

        assert!(table.is_checked(2_365_810_001));
        assert_eq!(table.checked_count(), 1);
    }

    #[test]
    fn test_mark_unknown_location() {
        let mut table = LocationTable::standard();
        assert_eq!(
            table.mark_checked(1),
            Err(SyncError::MissingLocation(1))
        );
        assert_eq!(table.checked_count(), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut table = LocationTable::new();
        let pos = WorldPosition::new(0.0, 0.0, 0.0);

        table.insert("A", 7, Collectible::new(pos)).unwrap();
        let result = table.insert("B", 7, Collectible::new(pos));

        assert_eq!(
            result,
            Err(SyncError::DuplicateLocation {
                id: 7,
                zone: "A".to_string()
            })
        );
        assert!(table.collectibles_of_zone("B").is_none());
    }

    #[test]
    fn test_conditions_gate_spawning() {
        let table = LocationTable::standard();

        let split = options(&[("split_sun_greaves", 1), ("normal_greaves", 0)]);
        let ids: Vec<_> = table.spawnable_in_zone(LIBRARY, &split).map(|(id, _)| id).collect();
        assert!(ids.contains(&2_365_810_051));
        assert!(!ids.contains(&2_365_810_006));

        let whole = options(&[("split_sun_greaves", 0)]);
        let ids: Vec<_> = table.spawnable_in_zone(LIBRARY, &whole).map(|(id, _)| id).collect();
        assert!(ids.contains(&2_365_810_006));
        assert!(!ids.contains(&2_365_810_052));

        // Unset options read as false
        let ids: Vec<_> = table
            .spawnable_in_zone(LIBRARY, &BTreeMap::new())
            .map(|(id, _)| id)
            .collect();
        assert!(ids.contains(&2_365_810_006));
    }

    #[test]
    fn test_gating_options() {
        let table = LocationTable::standard();
        assert!(table.is_gated_by("split_sun_greaves"));
        assert!(!table.is_gated_by("slot_number"));
        assert!(!LocationTable::new().is_gated_by("split_sun_greaves"));
    }

    #[test]
    fn test_checked_collectibles_do_not_spawn() {
        let mut table = LocationTable::standard();
        table.mark_checked(2_365_810_010).unwrap();

        let ids: Vec<_> = table
            .spawnable_in_zone(TOWER, &BTreeMap::new())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![2_365_810_048]);
    }
}
