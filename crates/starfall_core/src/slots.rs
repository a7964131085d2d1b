//! The five-slot save workflow.
//!
//! Load pipeline per slot: decode -> structure check -> (on failure:
//! back up the broken file, run the recovery scan) -> version check ->
//! upgrade + immediate re-save when stale -> assign to the store ->
//! final normalize pass. Every terminal state leaves the store holding
//! a complete, playable `game_state`; the worst outcome of a load is a
//! fresh minimal character flagged `recovery_mode`, never a crash.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde_json::Value;

use crate::codec;
use crate::error::SaveError;
use crate::gender::Gender;
use crate::migrate;
use crate::record::{self, CharacterInfo, Protagonist, SaveRecord};
use crate::recover;
use crate::state::GameStateStore;
use crate::verify;

/// Number of fixed save slots.
pub const SLOT_COUNT: u8 = 5;

/// Essential numeric fields the repair walk guards, with the default
/// each is reset to when missing or mistyped.
const ESSENTIAL_NUMERIC_FIELDS: [(&str, i64); 5] = [
    ("player_health", 100),
    ("player_max_health", 100),
    ("player_level", 1),
    ("player_experience", 0),
    ("player_credits", 100),
];

#[derive(Debug, Clone)]
pub struct SlotManager {
    saves_dir: PathBuf,
}

/// What `list_slots` reports for one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Empty,
    Populated(SlotSummary),
    /// The file exists but does not decode. Listing never attempts
    /// recovery; that is reserved for the load path.
    Corrupted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    pub name: String,
    pub gender: Gender,
    pub level: i64,
    pub chapter: String,
    pub timestamp: Option<String>,
}

/// Outcome of a completed load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub recovered: bool,
    pub upgraded: bool,
    /// False when a recovery or upgrade result could not be written
    /// back to disk; the state is still live in memory.
    pub persisted: bool,
    pub messages: Vec<String>,
}

/// Outcome of a standalone repair.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// One line per violation fixed.
    pub fixes: Vec<String>,
    /// The file was undecodable and replaced with a fresh default
    /// save; all prior progress in the slot is gone.
    pub rebuilt: bool,
    /// Whether the slot file was rewritten at all.
    pub rewritten: bool,
}

impl SlotManager {
    pub fn new(saves_dir: impl Into<PathBuf>) -> Self {
        Self {
            saves_dir: saves_dir.into(),
        }
    }

    pub fn saves_dir(&self) -> &Path {
        &self.saves_dir
    }

    pub fn slot_path(&self, slot: u8) -> PathBuf {
        self.saves_dir.join(format!("save_slot_{slot}.dat"))
    }

    /// Status of all five slots. Lightweight by design: decodes the
    /// document and reads the `character_info` summary without full
    /// verification, and never mutates a file.
    pub fn list_slots(&self) -> BTreeMap<u8, SlotStatus> {
        let mut out = BTreeMap::new();
        for slot in 1..=SLOT_COUNT {
            out.insert(slot, self.slot_status(slot));
        }
        out
    }

    fn slot_status(&self, slot: u8) -> SlotStatus {
        let bytes = match fs::read(self.slot_path(slot)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return SlotStatus::Empty,
            Err(e) => {
                warn!("slot {slot}: read failed during listing: {e}");
                return SlotStatus::Corrupted;
            }
        };
        match codec::decode(&bytes) {
            Ok(raw) => SlotStatus::Populated(summary_from_document(&raw.document)),
            Err(_) => SlotStatus::Corrupted,
        }
    }

    /// Snapshot the store into a schema-complete record and write it.
    /// On any failure the in-memory state is untouched and the error is
    /// handed back for the caller to report; nothing propagates as a
    /// panic.
    pub fn save(&self, slot: u8, store: &mut GameStateStore) -> Result<(), SaveError> {
        check_slot(slot)?;

        let mut record = store.snapshot();
        migrate::normalize(&mut record);
        record.refresh_summaries(migrate::now_timestamp());
        record.technical_info.save_count = store.save_count() + 1;

        let bytes = codec::encode(&record)?;
        fs::create_dir_all(&self.saves_dir)?;
        write_atomic(&self.slot_path(slot), &bytes)?;

        // Only after the write landed does the live count advance.
        store.set_save_count(record.technical_info.save_count);
        info!(
            "saved slot {slot} (save #{}, {} bytes)",
            record.technical_info.save_count,
            bytes.len()
        );
        Ok(())
    }

    /// Run the full load pipeline and assign the result to the store.
    pub fn load(&self, slot: u8, store: &mut GameStateStore) -> Result<LoadReport, SaveError> {
        check_slot(slot)?;
        let path = self.slot_path(slot);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SaveError::SlotEmpty(slot));
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = LoadReport {
            persisted: true,
            ..Default::default()
        };

        let mut record = match codec::decode(&bytes) {
            Ok(raw) => match verify::check_document(&raw.document) {
                Ok(record) => {
                    let expected = record.technical_info.checksum;
                    let actual = record::game_state_checksum(&record.game_state);
                    if expected != 0 && expected != actual {
                        warn!("slot {slot}: game_state checksum drifted; loading anyway");
                    }
                    if migrate::needs_upgrade(&record) {
                        let upgraded = migrate::upgrade(record);
                        report.upgraded = true;
                        report.messages.extend(upgraded.notes);
                        self.persist_best_effort(slot, &upgraded.record, &mut report, true);
                        upgraded.record
                    } else {
                        record
                    }
                }
                Err(structural) => {
                    report
                        .messages
                        .push(format!("Save data check failed: {structural}"));
                    self.recover_slot(slot, &bytes, &structural.to_string(), &mut report)
                }
            },
            Err(decode_err) => {
                report
                    .messages
                    .push(format!("Could not read save: {decode_err}"));
                self.recover_slot(slot, &bytes, &decode_err.to_string(), &mut report)
            }
        };

        // Final defensive pass: whatever path produced this record,
        // the required fields must exist before the game sees it.
        migrate::normalize(&mut record);
        store.replace(record);
        Ok(report)
    }

    /// Remove a slot file.
    pub fn delete(&self, slot: u8) -> Result<(), SaveError> {
        check_slot(slot)?;
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => {
                info!("deleted slot {slot}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SaveError::SlotEmpty(slot)),
            Err(e) => Err(e.into()),
        }
    }

    /// Standalone maintenance operation: fix a decodable-but-damaged
    /// save field by field, or replace an undecodable one with a fresh
    /// default save. Always backs the file up first; a repair that
    /// cannot make its backup does not run.
    pub fn repair(&self, slot: u8) -> Result<RepairReport, SaveError> {
        check_slot(slot)?;
        let path = self.slot_path(slot);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SaveError::SlotEmpty(slot));
            }
            Err(e) => return Err(e.into()),
        };

        let backup = self
            .saves_dir
            .join(format!("repair_backup_slot_{slot}_{}.bak", unix_timestamp()));
        fs::copy(&path, &backup)?;

        let raw = match codec::decode(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                // Severe corruption: field-level repair is pointless.
                warn!("slot {slot}: unrecoverable for repair ({e}); writing fresh save");
                let fresh = fresh_default_record();
                let encoded = codec::encode(&fresh)?;
                write_atomic(&path, &encoded)?;
                return Ok(RepairReport {
                    fixes: vec![
                        "Save was unreadable; replaced with a fresh default save. \
                         All prior progress in this slot is lost."
                            .to_string(),
                    ],
                    rebuilt: true,
                    rewritten: true,
                });
            }
        };

        let mut document = raw.document;
        let mut fixes = Vec::new();
        repair_document(&mut document, &mut fixes);

        if fixes.is_empty() {
            return Ok(RepairReport::default());
        }

        let (mut record, rebuilt) = match serde_json::from_value::<SaveRecord>(document) {
            Ok(record) => (record, false),
            Err(e) => {
                warn!("slot {slot}: document unusable after repair ({e}); writing fresh save");
                fixes.push(
                    "Save could not be reassembled; replaced with a fresh default save. \
                     All prior progress in this slot is lost."
                        .to_string(),
                );
                (fresh_default_record(), true)
            }
        };
        migrate::normalize(&mut record);
        record.refresh_summaries(migrate::now_timestamp());
        record.technical_info.repaired = true;

        let encoded = codec::encode(&record)?;
        write_atomic(&path, &encoded)?;
        info!("repaired slot {slot}: {} fix(es)", fixes.len());

        Ok(RepairReport {
            fixes,
            rebuilt,
            rewritten: true,
        })
    }

    /// Shared corruption path for `load`: back up the broken file,
    /// then scan it. When even the scan fails (file too small) the
    /// fresh minimal record stands in, so the caller always gets a
    /// playable record back.
    fn recover_slot(
        &self,
        slot: u8,
        bytes: &[u8],
        error: &str,
        report: &mut LoadReport,
    ) -> SaveRecord {
        report.recovered = true;

        let backup = self
            .saves_dir
            .join(format!("corrupted_slot_{slot}_{}.bak", unix_timestamp()));
        match fs::copy(self.slot_path(slot), &backup) {
            Ok(_) => info!("slot {slot}: backed up corrupted file to {}", backup.display()),
            Err(e) => warn!("slot {slot}: could not back up corrupted file: {e}"),
        }

        let mut record = match recover::recover(bytes, error) {
            Ok(recovered) => {
                report.messages.extend(recovered.notes);
                report
                    .messages
                    .push("Save was damaged; recovered what was possible.".to_string());
                recovered.record
            }
            Err(e) => {
                report.messages.push(format!(
                    "Recovery not possible ({e}); starting this slot from a fresh character."
                ));
                let mut fresh = fresh_default_record();
                fresh.game_state.recovery_mode = true;
                fresh.technical_info.recovered = true;
                fresh.technical_info.original_error = Some(error.to_string());
                fresh
            }
        };

        migrate::normalize(&mut record);
        record.refresh_summaries(migrate::now_timestamp());
        self.persist_best_effort(slot, &record, report, false);
        record
    }

    /// Write a recovered or upgraded record back to its slot, keeping a
    /// copy of the previous file. Failure here is reported, not fatal:
    /// the record stays live in memory either way.
    fn persist_best_effort(
        &self,
        slot: u8,
        record: &SaveRecord,
        report: &mut LoadReport,
        keep_previous: bool,
    ) {
        let path = self.slot_path(slot);
        if keep_previous && path.exists() {
            let backup = self
                .saves_dir
                .join(format!("backup_slot_{slot}_{}.dat", unix_timestamp()));
            if let Err(e) = fs::copy(&path, &backup) {
                warn!("slot {slot}: pre-rewrite backup failed: {e}");
            }
        }

        let written = codec::encode(record).and_then(|bytes| {
            fs::create_dir_all(&self.saves_dir)?;
            write_atomic(&path, &bytes)?;
            Ok(())
        });
        if let Err(e) = written {
            report.persisted = false;
            report.messages.push(
                "The updated save could not be written back to disk; \
                 progress will be lost unless you save again."
                    .to_string(),
            );
            warn!("slot {slot}: could not persist updated record: {e}");
        }
    }
}

fn check_slot(slot: u8) -> Result<(), SaveError> {
    if (1..=SLOT_COUNT).contains(&slot) {
        Ok(())
    } else {
        Err(SaveError::InvalidSlot(slot))
    }
}

fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// A complete default save, used when repair or recovery has nothing
/// to work from.
fn fresh_default_record() -> SaveRecord {
    let mut record = GameStateStore::init_new(Gender::Female).snapshot();
    migrate::normalize(&mut record);
    record.refresh_summaries(migrate::now_timestamp());
    record
}

/// Write-then-rename so a torn write can never half-overwrite a slot.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn summary_from_document(document: &Value) -> SlotSummary {
    let info: CharacterInfo = document
        .get("character_info")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let timestamp = document
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string);

    SlotSummary {
        name: info.name,
        gender: info.gender,
        level: info.level,
        chapter: info.chapter,
        timestamp,
    }
}

/// Walk the raw document fixing shape and type violations in place.
/// Each fix is recorded; the caller rewrites the file only when the
/// list is non-empty.
fn repair_document(document: &mut Value, fixes: &mut Vec<String>) {
    if !document.is_object() {
        *document = serde_json::json!({});
        fixes.push("Save data was not a dictionary; reset to an empty record".to_string());
    }

    {
        let root = match document.as_object_mut() {
            Some(root) => root,
            None => return,
        };

        match root.get("game_state") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                root.insert("game_state".to_string(), serde_json::json!({}));
                fixes.push("game_state was corrupted; reset to defaults".to_string());
            }
            None => {
                root.insert("game_state".to_string(), serde_json::json!({}));
                fixes.push("game_state was missing; created".to_string());
            }
        }
    }

    repair_game_state(document, fixes);

    let root = match document.as_object_mut() {
        Some(root) => root,
        None => return,
    };
    if !root.get("timestamp").map_or(false, Value::is_string) {
        root.insert(
            "timestamp".to_string(),
            Value::String(migrate::now_timestamp()),
        );
        fixes.push("timestamp was missing; stamped".to_string());
    }
    for section in ["character_info", "technical_info"] {
        if !root.get(section).map_or(false, Value::is_object) {
            root.insert(section.to_string(), serde_json::json!({}));
            fixes.push(format!("{section} was missing; rebuilt"));
        }
    }
}

fn repair_game_state(document: &mut Value, fixes: &mut Vec<String>) {
    let gs = match document
        .get_mut("game_state")
        .and_then(Value::as_object_mut)
    {
        Some(gs) => gs,
        None => return,
    };

    for (field, default) in ESSENTIAL_NUMERIC_FIELDS {
        match gs.get(field) {
            Some(v) if v.is_i64() => {}
            Some(_) => {
                gs.insert(field.to_string(), Value::from(default));
                fixes.push(format!("{field} held a non-integer value; reset to {default}"));
            }
            None => {
                gs.insert(field.to_string(), Value::from(default));
                fixes.push(format!("{field} was missing; set to {default}"));
            }
        }
    }

    match gs.get("protagonist") {
        Some(Value::Object(_)) => {
            // Present; fill missing sub-fields through the typed model
            // so gender-conditioned defaults apply.
            if let Some(value) = gs.get("protagonist") {
                match serde_json::from_value::<Protagonist>(value.clone()) {
                    Ok(mut p) => {
                        let before = value.clone();
                        p.fill_missing();
                        if let Ok(after) = serde_json::to_value(&p) {
                            if after != before {
                                gs.insert("protagonist".to_string(), after);
                                fixes.push(
                                    "protagonist was missing fields; filled defaults".to_string(),
                                );
                            }
                        }
                    }
                    Err(_) => {
                        if let Ok(fresh) = serde_json::to_value(Protagonist::canonical(Gender::Female))
                        {
                            gs.insert("protagonist".to_string(), fresh);
                            fixes.push("protagonist was corrupted; rebuilt".to_string());
                        }
                    }
                }
            }
        }
        Some(_) | None => {
            if let Ok(fresh) = serde_json::to_value(Protagonist::canonical(Gender::Female)) {
                gs.insert("protagonist".to_string(), fresh);
                fixes.push("protagonist was missing; rebuilt".to_string());
            }
        }
    }

    // Structured sections must be objects; a mistyped one is dropped
    // so normalize refills it with defaults.
    for section in ["inventory", "skills", "settings", "cosmic_collision"] {
        if matches!(gs.get(section), Some(v) if !v.is_object()) {
            gs.remove(section);
            fixes.push(format!("{section} was corrupted; reset to defaults"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slot_bounds_are_enforced() {
        assert!(check_slot(1).is_ok());
        assert!(check_slot(5).is_ok());
        assert!(matches!(check_slot(0), Err(SaveError::InvalidSlot(0))));
        assert!(matches!(check_slot(6), Err(SaveError::InvalidSlot(6))));
    }

    #[test]
    fn repair_walk_fixes_string_health() {
        let mut doc = json!({
            "game_state": {"player_health": "100", "player_level": 3}
        });
        let mut fixes = Vec::new();
        repair_document(&mut doc, &mut fixes);

        assert_eq!(doc["game_state"]["player_health"], 100);
        assert_eq!(doc["game_state"]["player_level"], 3);
        assert!(fixes.iter().any(|f| f.contains("player_health")));
    }

    #[test]
    fn repair_walk_is_quiet_on_complete_documents() {
        let mut record = fresh_default_record();
        migrate::normalize(&mut record);
        let mut doc = serde_json::to_value(&record).expect("record to value");
        let mut fixes = Vec::new();
        repair_document(&mut doc, &mut fixes);
        assert!(fixes.is_empty(), "unexpected fixes: {fixes:?}");
    }
}
