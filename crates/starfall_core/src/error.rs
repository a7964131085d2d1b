use thiserror::Error;

/// Errors crossing the persistence boundary.
///
/// `Corrupt` covers everything the deserializer can throw at us
/// (truncated stream, bad header, malformed JSON); it is always caught
/// by the verifier or the slot manager and never surfaced raw to the
/// player.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save data is corrupted: {0}")]
    Corrupt(String),
    #[error("encoding save data failed: {0}")]
    Encode(String),
    #[error("File too small for recovery")]
    TooSmallForRecovery,
    #[error("invalid slot {0}, expected 1..={max}", max = crate::slots::SLOT_COUNT)]
    InvalidSlot(u8),
    #[error("slot {0} is empty")]
    SlotEmpty(u8),
}

/// A save that decoded cleanly but fails the shallow schema checks.
///
/// The verifier hands this back as a value; the load path decides
/// whether to run recovery or surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("save data is not a dictionary")]
    NotADictionary,
    #[error("missing game_state")]
    MissingGameState,
    #[error("game_state is corrupted")]
    GameStateCorrupted,
    #[error("{0} data is corrupted")]
    FieldCorrupted(&'static str),
    #[error("save structure is invalid: {0}")]
    Shape(String),
}
