//! Identifier tables.
//!
//! Static mapping from the network item ids assigned at seed generation to
//! what they mean in game: which progress counter they bump, which major key
//! slot they fill, or which upgrade they grant.
//!
//! The table is plain data ([`ITEM_TABLE`]); lookups go through an index
//! built once on first use.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Opaque item/location identifier assigned by the multiworld server.
pub type NetworkItemId = i64;

/// Lowest id in the game's id range.
pub const ITEM_ID_BASE: NetworkItemId = 2_365_810_000;

/// Id of the first major key; the rest follow contiguously.
pub const MAJOR_KEY_BASE_ID: NetworkItemId = 2_365_810_021;

/// Number of major key slots.
pub const MAJOR_KEY_COUNT: usize = 5;

/// Which progress field an item mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Ability,
    HealthPiece,
    SmallKey,
    MajorKey,
    Unrecognized,
}

impl ItemCategory {
    /// Stable name for logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ability => "ability",
            Self::HealthPiece => "health_piece",
            Self::SmallKey => "small_key",
            Self::MajorKey => "major_key",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Check if the category maps to something the game knows.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// Upgrade counter names, as the game's blueprint knows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbilityKey {
    Attack,
    PowerBoost,
    AirKick,
    Slide,
    #[serde(rename = "SlideJump")]
    SlideJump,
    Plunge,
    ChargeAttack,
    WallRide,
    #[serde(rename = "Light")]
    Light,
    Projectile,
    ExtraKick,
    AirRecovery,
    MobileHeal,
    MagicHaste,
    HealBoost,
    DamageBoost,
    MagicPiece,
    OutfitPro,
    ProgressiveSlide,
    ProgressiveBreaker,
}

impl AbilityKey {
    pub const ALL: [AbilityKey; 20] = [
        Self::Attack,
        Self::PowerBoost,
        Self::AirKick,
        Self::Slide,
        Self::SlideJump,
        Self::Plunge,
        Self::ChargeAttack,
        Self::WallRide,
        Self::Light,
        Self::Projectile,
        Self::ExtraKick,
        Self::AirRecovery,
        Self::MobileHeal,
        Self::MagicHaste,
        Self::HealBoost,
        Self::DamageBoost,
        Self::MagicPiece,
        Self::OutfitPro,
        Self::ProgressiveSlide,
        Self::ProgressiveBreaker,
    ];

    /// Name used by the game for this upgrade.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::PowerBoost => "powerBoost",
            Self::AirKick => "airKick",
            Self::Slide => "slide",
            Self::SlideJump => "SlideJump",
            Self::Plunge => "plunge",
            Self::ChargeAttack => "chargeAttack",
            Self::WallRide => "wallRide",
            Self::Light => "Light",
            Self::Projectile => "projectile",
            Self::ExtraKick => "extraKick",
            Self::AirRecovery => "airRecovery",
            Self::MobileHeal => "mobileHeal",
            Self::MagicHaste => "magicHaste",
            Self::HealBoost => "healBoost",
            Self::DamageBoost => "damageBoost",
            Self::MagicPiece => "magicPiece",
            Self::OutfitPro => "outfitPro",
            Self::ProgressiveSlide => "progressiveSlide",
            Self::ProgressiveBreaker => "progressiveBreaker",
        }
    }

    /// Look up a key by its game name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the identifier table.
#[derive(Debug, Clone, Copy)]
pub struct ItemEntry {
    pub id: NetworkItemId,
    pub name: &'static str,
    pub category: ItemCategory,
    /// Only set for [`ItemCategory::Ability`].
    pub ability: Option<AbilityKey>,
}

const fn ability(id: NetworkItemId, name: &'static str, key: AbilityKey) -> ItemEntry {
    ItemEntry {
        id,
        name,
        category: ItemCategory::Ability,
        ability: Some(key),
    }
}

const fn plain(id: NetworkItemId, name: &'static str, category: ItemCategory) -> ItemEntry {
    ItemEntry {
        id,
        name,
        category,
        ability: None,
    }
}

pub const ITEM_TABLE: &[ItemEntry] = &[
    ability(2_365_810_001, "Dream Breaker", AbilityKey::Attack),
    ability(2_365_810_002, "Indignation", AbilityKey::PowerBoost),
    ability(2_365_810_003, "Sun Greaves", AbilityKey::AirKick),
    ability(2_365_810_004, "Slide", AbilityKey::Slide),
    ability(2_365_810_005, "Solar Wind", AbilityKey::SlideJump),
    ability(2_365_810_006, "Sunsetter", AbilityKey::Plunge),
    ability(2_365_810_007, "Strikebreak", AbilityKey::ChargeAttack),
    ability(2_365_810_008, "Cling Gem", AbilityKey::WallRide),
    ability(2_365_810_009, "Ascendant Light", AbilityKey::Light),
    ability(2_365_810_010, "Soul Cutter", AbilityKey::Projectile),
    ability(2_365_810_011, "Heliacal Power", AbilityKey::ExtraKick),
    ability(2_365_810_012, "Aerial Finesse", AbilityKey::AirRecovery),
    ability(2_365_810_013, "Pilgrimage", AbilityKey::MobileHeal),
    ability(2_365_810_014, "Empathy", AbilityKey::MagicHaste),
    ability(2_365_810_015, "Good Graces", AbilityKey::HealBoost),
    ability(2_365_810_016, "Martial Prowess", AbilityKey::DamageBoost),
    ability(2_365_810_017, "Clear Mind", AbilityKey::MagicPiece),
    ability(2_365_810_018, "Professionalism", AbilityKey::OutfitPro),
    plain(2_365_810_019, "Health Piece", ItemCategory::HealthPiece),
    plain(2_365_810_020, "Small Key", ItemCategory::SmallKey),
    plain(2_365_810_021, "Major Key - Empty Bailey", ItemCategory::MajorKey),
    plain(2_365_810_022, "Major Key - The Underbelly", ItemCategory::MajorKey),
    plain(2_365_810_023, "Major Key - Tower Remains", ItemCategory::MajorKey),
    plain(2_365_810_024, "Major Key - Sansa Keep", ItemCategory::MajorKey),
    plain(2_365_810_025, "Major Key - Twilight Theatre", ItemCategory::MajorKey),
    ability(2_365_810_026, "Progressive Slide", AbilityKey::ProgressiveSlide),
    // Split greaves count as extra kicks.
    ability(2_365_810_027, "Air Kick", AbilityKey::ExtraKick),
    ability(2_365_810_028, "Progressive Dream Breaker", AbilityKey::ProgressiveBreaker),
];

fn index() -> &'static HashMap<NetworkItemId, ItemEntry> {
    static INDEX: OnceLock<HashMap<NetworkItemId, ItemEntry>> = OnceLock::new();
    INDEX.get_or_init(|| ITEM_TABLE.iter().map(|entry| (entry.id, *entry)).collect())
}

/// Look up the full table row for an id.
pub fn lookup(id: NetworkItemId) -> Option<&'static ItemEntry> {
    index().get(&id)
}

/// Category of an item; unknown ids are [`ItemCategory::Unrecognized`].
pub fn category_of(id: NetworkItemId) -> ItemCategory {
    lookup(id)
        .map(|entry| entry.category)
        .unwrap_or(ItemCategory::Unrecognized)
}

/// Upgrade counter an ability id bumps. `None` for non-ability ids.
pub fn ability_key_of(id: NetworkItemId) -> Option<AbilityKey> {
    lookup(id).and_then(|entry| entry.ability)
}

/// Display name, if the id is known.
pub fn item_name(id: NetworkItemId) -> Option<&'static str> {
    lookup(id).map(|entry| entry.name)
}

/// Raw major key slot for an id, before any range check.
pub fn major_key_offset(id: NetworkItemId) -> i64 {
    id - MAJOR_KEY_BASE_ID
}

/// All ids that bump the given upgrade counter.
pub fn ids_for_ability(key: AbilityKey) -> impl Iterator<Item = NetworkItemId> {
    ITEM_TABLE
        .iter()
        .filter(move |entry| entry.ability == Some(key))
        .map(|entry| entry.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = ITEM_TABLE.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), ITEM_TABLE.len());
        assert!(ids.iter().all(|id| *id > ITEM_ID_BASE));
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_of(2_365_810_001), ItemCategory::Ability);
        assert_eq!(category_of(2_365_810_019), ItemCategory::HealthPiece);
        assert_eq!(category_of(2_365_810_020), ItemCategory::SmallKey);
        assert_eq!(category_of(2_365_810_023), ItemCategory::MajorKey);
        assert_eq!(category_of(2_365_810_099), ItemCategory::Unrecognized);
        assert_eq!(category_of(-1), ItemCategory::Unrecognized);
    }

    #[test]
    fn test_ability_only_for_abilities() {
        for entry in ITEM_TABLE {
            assert_eq!(
                entry.ability.is_some(),
                entry.category == ItemCategory::Ability,
                "{}",
                entry.name
            );
        }
        assert_eq!(ability_key_of(2_365_810_019), None);
        assert_eq!(ability_key_of(2_365_810_026), Some(AbilityKey::ProgressiveSlide));
    }

    #[test]
    fn test_split_kicks_share_counter() {
        let ids: Vec<_> = ids_for_ability(AbilityKey::ExtraKick).collect();
        assert_eq!(ids, vec![2_365_810_011, 2_365_810_027]);
    }

    #[test]
    fn test_major_keys_are_contiguous() {
        let mut offsets: Vec<_> = ITEM_TABLE
            .iter()
            .filter(|e| e.category == ItemCategory::MajorKey)
            .map(|e| major_key_offset(e.id))
            .collect();
        offsets.sort();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
        assert_eq!(offsets.len(), MAJOR_KEY_COUNT);
    }

    #[test]
    fn test_ability_names_round_trip() {
        for key in AbilityKey::ALL {
            assert_eq!(AbilityKey::from_name(key.as_str()), Some(key));
            let json = serde_json::to_value(key).unwrap();
            assert_eq!(json, serde_json::json!(key.as_str()));
        }
        assert_eq!(AbilityKey::from_name("doubleJump"), None);
    }
}
