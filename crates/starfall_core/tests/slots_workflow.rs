use std::fs;

use serde_json::json;
use starfall_core::codec;
use starfall_core::error::SaveError;
use starfall_core::gender::Gender;
use starfall_core::slots::{SlotManager, SlotStatus};
use starfall_core::state::GameStateStore;
use tempfile::TempDir;

fn manager() -> (TempDir, SlotManager) {
    let dir = TempDir::new().expect("tempdir");
    let slots = SlotManager::new(dir.path());
    (dir, slots)
}

#[test]
fn new_game_save_load_roundtrip() {
    let (_dir, slots) = manager();

    let mut store = GameStateStore::init_new(Gender::Male);
    store.game_state_mut().player_level = Some(3);
    store.game_state_mut().player_credits = Some(777);
    slots.save(1, &mut store).expect("save");
    assert_eq!(store.save_count(), 1);

    let mut loaded = GameStateStore::default();
    let report = slots.load(1, &mut loaded).expect("load");
    assert!(!report.recovered);
    assert!(!report.upgraded);

    let gs = loaded.game_state();
    assert_eq!(gs.player_level, Some(3));
    assert_eq!(gs.player_credits, Some(777));
    assert_eq!(
        gs.protagonist.as_ref().and_then(|p| p.name.as_deref()),
        Some("Dr. Hyte Konscript")
    );
    assert_eq!(loaded.save_count(), 1);
}

#[test]
fn listing_reports_empty_populated_and_corrupted() {
    let (dir, slots) = manager();

    let mut store = GameStateStore::init_new(Gender::Female);
    store.game_state_mut().player_level = Some(10);
    store.game_state_mut().current_chapter = Some("Chapter 4: Crimson Expanse".to_string());
    slots.save(2, &mut store).expect("save");

    fs::write(dir.path().join("save_slot_4.dat"), b"not a save file at all").expect("write");

    let listing = slots.list_slots();
    assert_eq!(listing[&1], SlotStatus::Empty);
    assert_eq!(listing[&4], SlotStatus::Corrupted);
    match &listing[&2] {
        SlotStatus::Populated(summary) => {
            assert_eq!(summary.name, "Dr. Xeno Valari");
            assert_eq!(summary.gender, Gender::Female);
            assert_eq!(summary.level, 10);
            assert_eq!(summary.chapter, "Chapter 4: Crimson Expanse");
            assert!(summary.timestamp.is_some());
        }
        other => panic!("expected populated slot, got {other:?}"),
    }
}

#[test]
fn loading_an_empty_slot_is_an_error_not_a_fresh_game() {
    let (_dir, slots) = manager();
    let mut store = GameStateStore::default();
    let err = slots.load(3, &mut store).expect_err("slot is empty");
    assert!(matches!(err, SaveError::SlotEmpty(3)));
}

#[test]
fn out_of_range_slots_are_rejected_everywhere() {
    let (_dir, slots) = manager();
    let mut store = GameStateStore::default();

    assert!(matches!(
        slots.save(0, &mut store),
        Err(SaveError::InvalidSlot(0))
    ));
    assert!(matches!(
        slots.load(6, &mut store),
        Err(SaveError::InvalidSlot(6))
    ));
    assert!(matches!(slots.delete(9), Err(SaveError::InvalidSlot(9))));
    assert!(matches!(slots.repair(6), Err(SaveError::InvalidSlot(6))));
}

#[test]
fn corrupt_slot_is_backed_up_and_recovered_on_load() {
    let (dir, slots) = manager();

    let blob = br#"CORRUPT"name": "Dr. Xeno Valari" "player_level": 8 etc"#;
    fs::write(dir.path().join("save_slot_1.dat"), blob).expect("write");

    let mut store = GameStateStore::default();
    let report = slots.load(1, &mut store).expect("recovery path");
    assert!(report.recovered);
    assert!(report.persisted);

    let gs = store.game_state();
    assert!(gs.recovery_mode);
    assert_eq!(gs.player_level, Some(8));
    assert_eq!(
        gs.protagonist.as_ref().and_then(|p| p.name.as_deref()),
        Some("Dr. Xeno Valari")
    );
    // The minimal record starts at 100 health regardless of the
    // recovered level; no retroactive scaling.
    assert_eq!(gs.player_max_health, Some(100));

    let backups: Vec<String> = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("corrupted_slot_1_"))
        .collect();
    assert_eq!(backups.len(), 1, "original bytes preserved as a backup");

    // The recovered record was persisted; a second load is clean.
    let mut second = GameStateStore::default();
    let report = slots.load(1, &mut second).expect("reload");
    assert!(!report.recovered);
    assert_eq!(second.game_state().player_level, Some(8));
}

#[test]
fn tiny_truncated_file_still_loads_a_playable_state() {
    let (dir, slots) = manager();
    // Too small even for the recovery scan.
    fs::write(dir.path().join("save_slot_2.dat"), [0xde, 0xad, 0xbe, 0xef, 0x00])
        .expect("write");

    let mut store = GameStateStore::default();
    let report = slots.load(2, &mut store).expect("load never raises on junk");
    assert!(report.recovered);

    let gs = store.game_state();
    assert!(gs.recovery_mode);
    assert_eq!(gs.player_level, Some(1));
    assert_eq!(gs.player_health, Some(100));
}

#[test]
fn legacy_headerless_save_is_upgraded_and_rewritten() {
    let (dir, slots) = manager();

    let legacy = json!({
        "game_state": {"player_level": 7},
        "character_info": {"name": "Dr. Xeno Valari", "level": 7, "version": "1.0"},
        "technical_info": {"save_version": "1.0"}
    });
    let path = dir.path().join("save_slot_2.dat");
    fs::write(&path, serde_json::to_vec(&legacy).expect("json")).expect("write");

    let mut store = GameStateStore::default();
    let report = slots.load(2, &mut store).expect("load");
    assert!(report.upgraded);
    assert!(!report.recovered);
    assert_eq!(store.game_state().player_max_health, Some(170));
    assert_eq!(store.game_state().chapter(), "Chapter 3: Thalassia I");

    // The stale file was rewritten in the current framed format, with
    // the original kept alongside.
    let rewritten = fs::read(&path).expect("read back");
    let raw = codec::decode(&rewritten).expect("decode rewritten slot");
    assert!(raw.header.is_some());

    let kept_original = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("backup_slot_2_"));
    assert!(kept_original);
}

#[test]
fn load_keeps_progress_when_optional_fields_are_damaged() {
    let (dir, slots) = manager();

    // Guarded fields are fine; only optional ones are mistyped.
    let damaged = json!({
        "game_state": {
            "player_level": 9,
            "player_credits": 5000,
            "companions": null,
            "skills": 5
        },
        "character_info": {"name": "Dr. Xeno Valari", "level": 9, "version": "2.5.0"},
        "technical_info": {"save_version": "3.0"}
    });
    fs::write(
        dir.path().join("save_slot_1.dat"),
        serde_json::to_vec(&damaged).expect("json"),
    )
    .expect("write");

    let mut store = GameStateStore::default();
    let report = slots.load(1, &mut store).expect("load");
    assert!(!report.recovered, "damaged optional fields are not corruption");

    let gs = store.game_state();
    assert_eq!(gs.player_level, Some(9));
    assert_eq!(gs.player_credits, Some(5000));
    assert!(gs.companions.is_empty());
    assert_eq!(gs.skills.as_ref().map(|s| s.hacking), Some(1));
}

#[test]
fn failed_save_leaves_the_store_untouched() {
    let dir = TempDir::new().expect("tempdir");
    // A file where the saves directory should be makes every write fail.
    let bogus = dir.path().join("saves");
    fs::write(&bogus, b"occupied").expect("write");
    let slots = SlotManager::new(&bogus);

    let mut store = GameStateStore::init_new(Gender::Female);
    store.game_state_mut().player_credits = Some(1234);

    let err = slots.save(1, &mut store);
    assert!(err.is_err());
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.game_state().player_credits, Some(1234));
}

#[test]
fn delete_empties_a_slot() {
    let (_dir, slots) = manager();

    let mut store = GameStateStore::init_new(Gender::Female);
    slots.save(5, &mut store).expect("save");
    assert!(matches!(slots.list_slots()[&5], SlotStatus::Populated(_)));

    slots.delete(5).expect("delete");
    assert_eq!(slots.list_slots()[&5], SlotStatus::Empty);
    assert!(matches!(slots.delete(5), Err(SaveError::SlotEmpty(5))));
}

#[test]
fn repair_fixes_mistyped_fields_in_place() {
    let (dir, slots) = manager();

    // A decodable save whose health was stored as a string.
    let damaged = json!({
        "game_state": {
            "player_health": "100",
            "player_level": 3,
            "protagonist": {"name": "Dr. Xeno Valari", "gender": "female"}
        },
        "character_info": {"name": "Dr. Xeno Valari", "level": 3, "version": "2.5.0"},
        "technical_info": {"save_version": "3.0"}
    });
    let path = dir.path().join("save_slot_3.dat");
    fs::write(&path, serde_json::to_vec(&damaged).expect("json")).expect("write");

    let report = slots.repair(3).expect("repair");
    assert!(!report.rebuilt);
    assert!(report.rewritten);
    assert!(report.fixes.iter().any(|f| f.contains("player_health")));

    let backed_up = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .any(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("repair_backup_slot_3_")
        });
    assert!(backed_up, "repair always backs up first");

    let mut store = GameStateStore::default();
    let load = slots.load(3, &mut store).expect("load repaired slot");
    assert!(!load.recovered);
    assert_eq!(store.game_state().player_health, Some(100));
    assert_eq!(store.game_state().player_level, Some(3));

    let raw = codec::decode(&fs::read(&path).expect("read")).expect("decode");
    assert_eq!(raw.document["technical_info"]["repaired"], json!(true));
}

#[test]
fn repair_preserves_progress_when_an_unguarded_field_is_mistyped() {
    let (dir, slots) = manager();

    let damaged = json!({
        "game_state": {
            "player_health": "100",
            "player_level": 9,
            "player_credits": 5000,
            "skills": 5
        },
        "character_info": {"name": "Dr. Xeno Valari", "level": 9, "version": "2.5.0"},
        "technical_info": {"save_version": "3.0"}
    });
    fs::write(
        dir.path().join("save_slot_2.dat"),
        serde_json::to_vec(&damaged).expect("json"),
    )
    .expect("write");

    let report = slots.repair(2).expect("repair");
    assert!(!report.rebuilt, "a decodable save is never replaced wholesale");
    assert!(report.fixes.iter().any(|f| f.contains("skills")));

    let mut store = GameStateStore::default();
    slots.load(2, &mut store).expect("load repaired slot");
    assert_eq!(store.game_state().player_level, Some(9));
    assert_eq!(store.game_state().player_credits, Some(5000));
    assert_eq!(store.game_state().player_health, Some(100));
}

#[test]
fn repair_rebuilds_an_unreadable_slot() {
    let (dir, slots) = manager();
    fs::write(dir.path().join("save_slot_4.dat"), b"SFSV\x01\x02 not a real header")
        .expect("write");

    let report = slots.repair(4).expect("repair");
    assert!(report.rebuilt);
    assert!(report.rewritten);

    let mut store = GameStateStore::default();
    slots.load(4, &mut store).expect("rebuilt slot loads clean");
    assert_eq!(store.game_state().player_level, Some(1));
}

#[test]
fn repair_leaves_intact_slots_alone() {
    let (dir, slots) = manager();

    let mut store = GameStateStore::init_new(Gender::Female);
    slots.save(1, &mut store).expect("save");
    let before = fs::read(dir.path().join("save_slot_1.dat")).expect("read");

    let report = slots.repair(1).expect("repair");
    assert!(report.fixes.is_empty());
    assert!(!report.rewritten);

    let after = fs::read(dir.path().join("save_slot_1.dat")).expect("read");
    assert_eq!(before, after);
}
