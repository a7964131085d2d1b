//! Best-effort reconstruction of a save that no longer decodes.
//!
//! The payload is not structured enough to partially parse once the
//! framing is destroyed, so recovery scans the raw bytes for field
//! markers and known literals instead. The generic `"name":` marker
//! scan runs first; the enumerated canonical-name list is only a
//! fallback for blobs whose field labels were destroyed too.
//!
//! Past the size guard, recovery never fails: even zero matches yields
//! a playable default record flagged `recovery_mode`. The player is
//! never left without some loadable state.

use log::info;

use crate::chapters::CHAPTER_NAMES;
use crate::error::SaveError;
use crate::gender::{Gender, MALE_NAME_MARKERS};
use crate::record::{Protagonist, SaveRecord};

/// Anything shorter than this cannot hold a single recoverable field.
pub const MIN_RECOVERABLE_LEN: usize = 20;

/// Recovered level values outside this range are discarded outright.
const LEVEL_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

/// Longest name the scanner will accept; anything longer is framing
/// noise, not a character name.
const MAX_NAME_LEN: usize = 64;

const CANONICAL_NAMES: [&str; 2] = ["Dr. Xeno Valari", "Dr. Hyte Konscript"];
const FEMALE_NAME_MARKERS: [&str; 2] = ["Xeno", "Valari"];

/// Outcome of a successful recovery scan.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub record: SaveRecord,
    /// Human-readable notes, one per extracted field, surfaced to the
    /// player.
    pub notes: Vec<String>,
}

/// Scan raw bytes for recognizable fragments and build a partial
/// record around them.
pub fn recover(bytes: &[u8], original_error: &str) -> Result<Recovered, SaveError> {
    if bytes.len() < MIN_RECOVERABLE_LEN {
        return Err(SaveError::TooSmallForRecovery);
    }

    let mut record = minimal_record();
    let mut notes = Vec::new();

    if let Some(name) = scan_name(bytes) {
        let gender = classify_name(&name);
        notes.push(format!("Recovered character name: {name}"));
        if let Some(p) = record.game_state.protagonist.as_mut() {
            p.name = Some(name);
            p.gender = gender;
        }
    }

    if let Some(level) = scan_level(bytes) {
        notes.push(format!("Recovered player level: {level}"));
        record.game_state.player_level = Some(level);
    }

    if let Some(chapter) = scan_chapter(bytes) {
        notes.push(format!("Recovered chapter: {chapter}"));
        record.game_state.current_chapter = Some(chapter.to_string());
    }

    info!(
        "recovery scan over {} bytes extracted {} field(s)",
        bytes.len(),
        notes.len()
    );

    record.technical_info.recovered = true;
    record.technical_info.original_error = Some(original_error.to_string());
    record.technical_info.recovery_notes = notes.clone();

    Ok(Recovered { record, notes })
}

/// The defaults a recovered record starts from: alive, level 1, a
/// placeholder protagonist, and the recovery flag set.
fn minimal_record() -> SaveRecord {
    let mut record = SaveRecord::default();
    record.game_state.player_health = Some(100);
    record.game_state.player_max_health = Some(100);
    record.game_state.player_level = Some(1);
    record.game_state.recovery_mode = true;
    record.game_state.protagonist = Some(Protagonist {
        name: Some("Unknown".to_string()),
        gender: Gender::Unknown,
        ..Default::default()
    });
    record
}

fn classify_name(name: &str) -> Gender {
    if MALE_NAME_MARKERS.iter().any(|m| name.contains(m)) {
        Gender::Male
    } else if FEMALE_NAME_MARKERS.iter().any(|m| name.contains(m)) {
        Gender::Female
    } else {
        // A name the canon does not know; keep the gender unresolved
        // rather than guessing.
        Gender::Unknown
    }
}

/// Find a `"name":` marker followed by a quoted string. Falls back to
/// the enumerated canonical names when no labeled field survives.
fn scan_name(bytes: &[u8]) -> Option<String> {
    if let Some(pos) = find(bytes, b"\"name\"") {
        if let Some(name) = quoted_string_after(&bytes[pos + b"\"name\"".len()..]) {
            return Some(name);
        }
    }

    CANONICAL_NAMES
        .iter()
        .find(|name| find(bytes, name.as_bytes()).is_some())
        .map(|name| name.to_string())
}

/// A `"player_level"` marker followed by a bare integer, accepted only
/// within the playable range. Out-of-range or unparsable matches are
/// discarded with no partial credit.
fn scan_level(bytes: &[u8]) -> Option<i64> {
    let pos = find(bytes, b"\"player_level\"")?;
    let rest = &bytes[pos + b"\"player_level\"".len()..];
    let rest = skip_separator(rest);

    let digits: Vec<u8> = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect();
    let level: i64 = std::str::from_utf8(&digits).ok()?.parse().ok()?;
    LEVEL_RANGE.contains(&level).then_some(level)
}

/// First canonical chapter literal present in the bytes, in story
/// order.
fn scan_chapter(bytes: &[u8]) -> Option<&'static str> {
    CHAPTER_NAMES
        .iter()
        .find(|name| find(bytes, name.as_bytes()).is_some())
        .copied()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Skip `:` and surrounding whitespace after a field marker.
fn skip_separator(bytes: &[u8]) -> &[u8] {
    let mut rest = bytes;
    while let Some((first, tail)) = rest.split_first() {
        if *first == b':' || first.is_ascii_whitespace() {
            rest = tail;
        } else {
            break;
        }
    }
    rest
}

/// Parse `: "text"` after a field marker, rejecting empty, oversized,
/// or non-UTF-8 captures.
fn quoted_string_after(bytes: &[u8]) -> Option<String> {
    let rest = skip_separator(bytes);
    let (first, rest) = rest.split_first()?;
    if *first != b'"' {
        return None;
    }
    let end = rest.iter().position(|b| *b == b'"')?;
    if end == 0 || end > MAX_NAME_LEN {
        return None;
    }
    let name = std::str::from_utf8(&rest[..end]).ok()?;
    // A backslash means the string had escapes; too mangled to trust.
    if name.contains('\\') {
        return None;
    }
    Some(name.to_string())
}
