//! Client configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SyncError;
use super::session::DEFAULT_DEATH_LINK_COOLDOWN_TICKS;

/// Tunables for the synchronization engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Game name sent with the connect request
    pub game_name: String,

    /// Network protocol version advertised to the server
    pub client_version: [u32; 3],

    /// Host tick rate
    pub ticks_per_second: u32,

    pub death_link_cooldown_ticks: u32,

    pub connect_timeout_secs: u64,

    /// Minimum spacing between popups
    pub popup_delay_ms: u64,

    /// Advertise death link support
    pub death_link: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            game_name: "Pseudoregalia".to_string(),
            client_version: [0, 5, 0],
            ticks_per_second: 60,
            death_link_cooldown_ticks: DEFAULT_DEATH_LINK_COOLDOWN_TICKS,
            connect_timeout_secs: 15,
            popup_delay_ms: 3200,
            death_link: true,
        }
    }
}

impl SyncConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, SyncError> {
        serde_json::from_str(contents).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn popup_delay(&self) -> Duration {
        Duration::from_millis(self.popup_delay_ms)
    }

    /// Connect timeout in host ticks.
    pub fn connect_timeout_ticks(&self) -> u32 {
        self.duration_to_ticks(self.connect_timeout())
    }

    /// Popup spacing in host ticks.
    pub fn popup_delay_ticks(&self) -> u32 {
        self.duration_to_ticks(self.popup_delay())
    }

    /// Whole ticks covering `duration`, at least one.
    pub fn duration_to_ticks(&self, duration: Duration) -> u32 {
        let per_second = u128::from(self.ticks_per_second.max(1));
        let ticks = (duration.as_millis() * per_second).div_ceil(1000);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.death_link_cooldown_ticks, 400);
        assert_eq!(config.connect_timeout_ticks(), 900);
        assert_eq!(config.popup_delay_ticks(), 192);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SyncConfig::from_json(r#"{"ticks_per_second": 30, "death_link": false}"#).unwrap();
        assert_eq!(
            config,
            SyncConfig {
                ticks_per_second: 30,
                death_link: false,
                ..SyncConfig::default()
            }
        );
        assert_eq!(config.connect_timeout_ticks(), 450);
    }

    #[test]
    fn test_bad_json() {
        let err = SyncConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SyncConfig::load(Path::new("/nonexistent/ap-sync.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_ticks_round_up() {
        let config = SyncConfig::default();
        assert_eq!(config.duration_to_ticks(Duration::from_millis(1)), 1);
        assert_eq!(config.duration_to_ticks(Duration::ZERO), 1);
        assert_eq!(config.duration_to_ticks(Duration::from_millis(1010)), 61);
    }
}
