//! Shallow structural verification of a decoded save document.
//!
//! This is deliberately not a full schema walk: it only guards the
//! fields the rest of the game reads unconditionally, then hands the
//! document to serde for the typed conversion. The conversion is
//! lenient about unguarded fields: a mistyped optional field is
//! dropped and the migrator refills it, so a document that passes the
//! shallow checks always yields a record.

use serde_json::Value;

use crate::error::StructureError;
use crate::record::SaveRecord;

/// Fields that must be integers when present.
const INT_GUARDED_FIELDS: [&str; 2] = ["player_level", "player_health"];

/// Decide whether a decoded document is usable as a `SaveRecord`.
pub fn check_document(document: &Value) -> Result<SaveRecord, StructureError> {
    let root = document.as_object().ok_or(StructureError::NotADictionary)?;

    let game_state = root
        .get("game_state")
        .ok_or(StructureError::MissingGameState)?;
    let game_state = game_state
        .as_object()
        .ok_or(StructureError::GameStateCorrupted)?;

    for field in INT_GUARDED_FIELDS {
        if let Some(value) = game_state.get(field) {
            if !value.is_i64() {
                return Err(StructureError::FieldCorrupted(field));
            }
        }
    }

    serde_json::from_value(document.clone()).map_err(|e| StructureError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_root_is_rejected() {
        assert_eq!(
            check_document(&json!([1, 2, 3])).unwrap_err(),
            StructureError::NotADictionary
        );
    }

    #[test]
    fn missing_game_state_is_rejected() {
        assert_eq!(
            check_document(&json!({"timestamp": "2026-01-01 00:00:00"})).unwrap_err(),
            StructureError::MissingGameState
        );
    }

    #[test]
    fn non_map_game_state_is_rejected() {
        assert_eq!(
            check_document(&json!({"game_state": 7})).unwrap_err(),
            StructureError::GameStateCorrupted
        );
    }

    #[test]
    fn string_level_is_field_corruption() {
        let err =
            check_document(&json!({"game_state": {"player_level": "9"}})).unwrap_err();
        assert_eq!(err, StructureError::FieldCorrupted("player_level"));
        assert_eq!(err.to_string(), "player_level data is corrupted");
    }

    #[test]
    fn string_health_is_field_corruption() {
        let err =
            check_document(&json!({"game_state": {"player_health": "100"}})).unwrap_err();
        assert_eq!(err, StructureError::FieldCorrupted("player_health"));
    }

    #[test]
    fn minimal_valid_document_passes() {
        let record = check_document(&json!({"game_state": {"player_level": 3}}))
            .expect("minimal record");
        assert_eq!(record.game_state.player_level, Some(3));
    }

    #[test]
    fn absent_guarded_fields_are_fine() {
        assert!(check_document(&json!({"game_state": {}})).is_ok());
    }

    #[test]
    fn mistyped_unguarded_fields_do_not_fail_the_document() {
        let record = check_document(&json!({
            "game_state": {
                "player_level": 9,
                "player_credits": 5000,
                "companions": null
            }
        }))
        .expect("document with a null companions list");
        assert_eq!(record.game_state.player_level, Some(9));
        assert_eq!(record.game_state.player_credits, Some(5000));
        assert!(record.game_state.companions.is_empty());
    }
}
