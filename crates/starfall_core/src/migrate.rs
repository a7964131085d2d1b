//! Schema migration and the canonical normalize pass.
//!
//! `normalize` is the single place structural defaults get filled; the
//! save path, the load path's final defensive pass, and `upgrade` all
//! call it, so no two code paths can disagree about what a complete
//! record looks like.
//!
//! `upgrade` is total by construction: every field access is
//! `Option`-based and every computation is over plain integers, so
//! there is no input that can make it fail partway and abort a load.

use chrono::Local;
use log::debug;

use crate::chapters::chapter_name_for_level;
use crate::gender::Gender;
use crate::record::{
    CosmicCollision, Inventory, Protagonist, SaveRecord, Settings, Skills,
};
use crate::version::{Version, GAME_VERSION, SAVE_FORMAT_VERSION};

/// Base health at level 1; +10 per level after that.
const BASE_HEALTH: i64 = 100;
const HEALTH_PER_LEVEL: i64 = 10;
const BASE_ATTACK: i64 = 15;
const ATTACK_PER_LEVEL: i64 = 2;
const BASE_DEFENSE: i64 = 5;
const FIXED_SPEED: i64 = 10;
const STARTING_CREDITS: i64 = 100;

/// Experience a character of this level has earned.
pub fn experience_for_level(level: i64) -> i64 {
    if level > 1 {
        level * 500 - 100
    } else {
        0
    }
}

/// Current human-readable timestamp, as written into `timestamp`.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Whether a parsed record predates the current schema or game version.
pub fn needs_upgrade(record: &SaveRecord) -> bool {
    let save_version = Version::parse_lenient(&record.technical_info.save_version);
    let game_version = Version::parse_lenient(&record.character_info.version);
    save_version < Version::parse_lenient(SAVE_FORMAT_VERSION)
        || game_version < Version::parse_lenient(GAME_VERSION)
}

/// Fill every structural default a complete record must have, without
/// touching populated fields. Pure set-if-absent; safe to run on every
/// save and after every load.
pub fn normalize(record: &mut SaveRecord) {
    let gs = &mut record.game_state;

    match gs.protagonist.as_mut() {
        Some(p) => p.fill_missing(),
        None => {
            let gender = if record.character_info.name.is_empty() {
                Gender::Female
            } else {
                Gender::infer_from_name(&record.character_info.name)
            };
            gs.protagonist = Some(Protagonist::canonical(gender));
        }
    }

    if gs.player_level.is_none() {
        gs.player_level = Some(1);
    }
    let level = gs.level();

    set_if_absent(&mut gs.player_max_health, max_health_for_level(level));
    set_if_absent(&mut gs.player_health, max_health_for_level(level));
    set_if_absent(&mut gs.player_experience, 0);
    set_if_absent(&mut gs.player_credits, STARTING_CREDITS);
    set_if_absent(&mut gs.player_attack, BASE_ATTACK + (level - 1) * ATTACK_PER_LEVEL);
    set_if_absent(&mut gs.player_defense, BASE_DEFENSE + (level - 1));
    set_if_absent(&mut gs.player_speed, FIXED_SPEED);
    set_if_absent(&mut gs.current_stage, 1);
    set_if_absent(&mut gs.chapter_progress, 1);

    if gs.current_chapter.is_none() {
        gs.current_chapter = Some(chapter_name_for_level(level).to_string());
    }

    let inventory = gs.inventory.take().unwrap_or_default();
    gs.inventory = Some(Inventory::Categorized(inventory.into_categorized()));

    if gs.skills.is_none() {
        gs.skills = Some(Skills::default());
    }
    if gs.settings.is_none() {
        gs.settings = Some(Settings::default());
    }
    if gs.cosmic_collision.is_none() {
        gs.cosmic_collision = Some(CosmicCollision::default());
    }
}

/// Bring an outdated record up to the current schema, preserving as
/// much prior progress as possible.
pub fn upgrade(mut record: SaveRecord) -> UpgradeReport {
    let old_version = record.character_info.version.clone();
    let old_name = record.character_info.name.clone();
    let mut notes = Vec::new();

    // Identity first: the protagonist block drives every
    // gender-conditioned default downstream.
    if record.game_state.protagonist.is_none() {
        let gender = if old_name.is_empty() {
            Gender::Female
        } else {
            Gender::infer_from_name(&old_name)
        };
        let mut protagonist = Protagonist::canonical(gender);
        if !old_name.is_empty() {
            protagonist.name = Some(old_name.clone());
        }
        record.game_state.protagonist = Some(protagonist);
        notes.push(format!("Rebuilt protagonist profile ({gender})"));
    }

    // Level lived in two places in old saves; trust whichever is
    // higher rather than losing progress.
    let summary_level = record.character_info.level;
    let state_level = record.game_state.player_level.unwrap_or(1);
    let level = summary_level.max(state_level).max(1);
    if record.game_state.player_level != Some(level) {
        notes.push(format!("Reconciled player level to {level}"));
    }
    record.game_state.player_level = Some(level);

    // Experience is derived from level deterministically, not carried
    // over; old builds tracked it inconsistently.
    record.game_state.player_experience = Some(experience_for_level(level));

    normalize(&mut record);

    record.refresh_summaries(now_timestamp());
    record.technical_info.save_count += 1;

    debug!(
        "upgraded save from version {} to {} (level {level})",
        old_version, SAVE_FORMAT_VERSION
    );
    notes.push(format!(
        "Save upgraded from version {old_version} to {SAVE_FORMAT_VERSION}"
    ));

    UpgradeReport { record, notes }
}

/// An upgraded record plus the status lines describing what changed.
#[derive(Debug, Clone)]
pub struct UpgradeReport {
    pub record: SaveRecord,
    pub notes: Vec<String>,
}

pub fn max_health_for_level(level: i64) -> i64 {
    BASE_HEALTH + (level - 1) * HEALTH_PER_LEVEL
}

fn set_if_absent(slot: &mut Option<i64>, value: i64) {
    if slot.is_none() {
        *slot = Some(value);
    }
}
