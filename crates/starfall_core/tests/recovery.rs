//! Multi-field recovery scenarios over realistic corrupted blobs; the
//! single-marker cases live next to the scanner itself.

use starfall_core::gender::Gender;
use starfall_core::recover;

#[test]
fn chapter_and_level_survive_an_undecodable_blob() {
    let blob = b"\x00\x11binary\xfe \"player_level\": 12, \"current_chapter\": \
        \"Chapter 4: Crimson Expanse\" truncat";
    let recovered = recover::recover(blob, "payload is not valid save data").expect("recovery");
    let gs = &recovered.record.game_state;

    assert_eq!(gs.player_level, Some(12));
    assert_eq!(
        gs.current_chapter.as_deref(),
        Some("Chapter 4: Crimson Expanse")
    );
    assert!(gs.recovery_mode);
    assert_eq!(recovered.notes.len(), 2);
}

#[test]
fn female_name_and_level_recover_together() {
    let blob = br#"}}corrupt{{"name": "Dr. Xeno Valari", "player_level": 8, junk"#;
    let recovered = recover::recover(blob, "unexpected end of input").expect("recovery");
    let gs = &recovered.record.game_state;
    let p = gs.protagonist.as_ref().expect("protagonist");

    assert_eq!(p.name.as_deref(), Some("Dr. Xeno Valari"));
    assert_eq!(p.gender, Gender::Female);
    assert_eq!(gs.player_level, Some(8));
    // Health stays at the minimal-record baseline; only scanned fields
    // override defaults.
    assert_eq!(gs.player_health, Some(100));
}

#[test]
fn notes_describe_each_extracted_field() {
    let blob = br#"wreck "name": "Dr. Hyte Konscript" wreck "player_level": 3 wreck"#;
    let recovered = recover::recover(blob, "bad header").expect("recovery");

    assert!(recovered.notes.iter().any(|n| n.contains("Dr. Hyte Konscript")));
    assert!(recovered.notes.iter().any(|n| n.contains("level: 3")));
    assert_eq!(
        recovered.record.technical_info.recovery_notes,
        recovered.notes
    );
}
