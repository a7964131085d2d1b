//! The persisted `SaveRecord` and its summary blocks.
//!
//! Every field that may be absent in a legacy save is either an
//! `Option` or carries `#[serde(default)]`, so structurally-valid old
//! documents deserialize with gaps for the migrator to fill instead of
//! failing outright.

pub mod game_state;
pub mod items;

use crc::{Crc, CRC_32_ISO_HDLC};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gender::Gender;
use crate::version::{BUILD_NUMBER, GAME_VERSION, SAVE_FORMAT_VERSION};

pub use game_state::{
    CosmicCollision, GameState, Inventory, InventoryCategories, Protagonist, Quest, Settings,
    Skills,
};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Deserialize a field, substituting its default when the stored value
/// has the wrong shape. One damaged field must not take down the whole
/// record; normalization refills whatever was dropped.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    // Buffer through a Value so a shape mismatch never leaves the
    // underlying deserializer mid-token.
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        debug!("dropping malformed save field: {e}");
        T::default()
    }))
}

/// The unit persisted to a slot file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub game_state: GameState,
    /// Human-readable save time, stamped at every save/upgrade.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub character_info: CharacterInfo,
    #[serde(default, deserialize_with = "lenient")]
    pub technical_info: TechnicalInfo,
}

/// Denormalized summary used for slot listings; kept in sync with
/// `game_state` at save time so listing never loads full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default = "default_level")]
    pub level: i64,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub chapter: String,
    #[serde(default)]
    pub location: String,
    /// Accumulated play time in seconds.
    #[serde(default)]
    pub playtime: i64,
    /// Game version that wrote this save. Legacy saves omit it.
    #[serde(default = "legacy_version")]
    pub version: String,
}

impl Default for CharacterInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            gender: Gender::Unknown,
            level: 1,
            experience: 0,
            chapter: String::new(),
            location: String::new(),
            playtime: 0,
            version: legacy_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalInfo {
    /// Save schema revision that wrote this record.
    #[serde(default = "legacy_version")]
    pub save_version: String,
    /// Build date (YYYYMMDD) of the writing game, diagnostics only.
    #[serde(default)]
    pub game_build: String,
    /// Incremented on every save.
    #[serde(default)]
    pub save_count: i64,
    /// CRC-32 of the canonical JSON of `game_state`. Informational:
    /// recomputed on every save and load, never used to reject a record.
    #[serde(default)]
    pub checksum: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repaired: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recovered: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

impl Default for TechnicalInfo {
    fn default() -> Self {
        Self {
            save_version: legacy_version(),
            game_build: String::new(),
            save_count: 0,
            checksum: 0,
            repaired: false,
            recovered: false,
            recovery_notes: Vec::new(),
            original_error: None,
        }
    }
}

fn default_level() -> i64 {
    1
}

fn legacy_version() -> String {
    "1.0".to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Informational CRC-32 over the canonical (sorted-key) JSON rendering
/// of the game state.
pub fn game_state_checksum(game_state: &GameState) -> u32 {
    serde_json::to_string(game_state)
        .map(|json| CRC32.checksum(json.as_bytes()))
        .unwrap_or(0)
}

impl SaveRecord {
    /// Rebuild the denormalized summaries from `game_state` and stamp
    /// the current versions and build. Assumes the state has already
    /// been normalized; does not bump `save_count` (that is the slot
    /// manager's job).
    pub fn refresh_summaries(&mut self, timestamp: String) {
        let gs = &self.game_state;
        let protagonist = gs.protagonist.as_ref();

        self.character_info = CharacterInfo {
            name: protagonist
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| self.character_info.name.clone()),
            gender: protagonist
                .map(|p| p.gender)
                .unwrap_or(self.character_info.gender),
            level: gs.level(),
            experience: gs.player_experience.unwrap_or(0),
            chapter: gs.current_chapter.clone().unwrap_or_default(),
            location: self.character_info.location.clone(),
            playtime: self.character_info.playtime,
            version: GAME_VERSION.to_string(),
        };

        self.technical_info.save_version = SAVE_FORMAT_VERSION.to_string();
        self.technical_info.game_build = BUILD_NUMBER.to_string();
        self.technical_info.checksum = game_state_checksum(gs);
        self.timestamp = Some(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let gs = GameState::default();
        assert_eq!(game_state_checksum(&gs), game_state_checksum(&gs));
    }

    #[test]
    fn checksum_tracks_state_changes() {
        let a = GameState::default();
        let mut b = GameState::default();
        b.player_level = Some(7);
        assert_ne!(game_state_checksum(&a), game_state_checksum(&b));
    }

    #[test]
    fn legacy_summary_defaults() {
        let info: CharacterInfo = serde_json::from_str("{}").expect("empty summary");
        assert_eq!(info.level, 1);
        assert_eq!(info.version, "1.0");
        assert_eq!(info.gender, Gender::Unknown);
    }
}
