//! The live gameplay state owned by the game loop.
//!
//! Earlier builds kept this as ambient global state mutated from
//! everywhere; it is now an explicit context object handed to the slot
//! manager, with a defined lifecycle: created fresh, mutated during
//! play, replaced wholesale on load.

use crate::gender::Gender;
use crate::migrate;
use crate::record::{GameState, Protagonist, SaveRecord, TechnicalInfo};

#[derive(Debug, Clone)]
pub struct GameStateStore {
    game_state: GameState,
    /// Carried across saves so `technical_info.save_count` keeps
    /// counting after a load.
    save_count: i64,
}

impl GameStateStore {
    /// Fresh, fully-normalized state for a new game.
    pub fn init_new(gender: Gender) -> Self {
        let mut record = SaveRecord::default();
        record.game_state.protagonist = Some(Protagonist::canonical(gender));
        migrate::normalize(&mut record);
        Self {
            game_state: record.game_state,
            save_count: 0,
        }
    }

    /// Adopt a loaded record, discarding the previous state.
    pub fn replace(&mut self, record: SaveRecord) {
        self.save_count = record.technical_info.save_count;
        self.game_state = record.game_state;
    }

    /// Snapshot the live state into a record ready for normalization
    /// and summary refresh by the save path. The snapshot carries the
    /// current save count; bumping it is the slot manager's decision.
    pub fn snapshot(&self) -> SaveRecord {
        SaveRecord {
            game_state: self.game_state.clone(),
            timestamp: None,
            character_info: Default::default(),
            technical_info: TechnicalInfo {
                save_count: self.save_count,
                ..Default::default()
            },
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.game_state
    }

    pub fn save_count(&self) -> i64 {
        self.save_count
    }

    pub(crate) fn set_save_count(&mut self, count: i64) {
        self.save_count = count;
    }
}

impl Default for GameStateStore {
    fn default() -> Self {
        Self::init_new(Gender::Female)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_state_is_complete() {
        let store = GameStateStore::init_new(Gender::Female);
        let gs = store.game_state();
        assert_eq!(gs.player_level, Some(1));
        assert_eq!(gs.player_health, Some(100));
        assert!(gs.protagonist.is_some());
        assert!(gs.skills.is_some());
        assert!(gs.settings.is_some());
        assert!(gs.cosmic_collision.is_some());
        assert!(!gs.recovery_mode);
    }

    #[test]
    fn replace_adopts_save_count() {
        let mut store = GameStateStore::default();
        let mut record = SaveRecord::default();
        record.technical_info.save_count = 42;
        store.replace(record);
        assert_eq!(store.save_count(), 42);
    }
}
