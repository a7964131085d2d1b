//! Save persistence core for the Starfall RPG.
//!
//! Everything that touches a save file lives here: the on-disk codec
//! ([`codec`]), the shallow structural verifier ([`verify`]), the
//! byte-scan recovery engine ([`recover`]), the schema migrator
//! ([`migrate`]), and the five-slot workflow ([`slots`]). The live
//! gameplay state is owned by a [`state::GameStateStore`] and replaced
//! wholesale on load.
//!
//! Nothing in this crate panics on untrusted input; every boundary
//! returns a [`error::SaveError`] or a report struct the caller can
//! render to the player.

pub mod chapters;
pub mod codec;
pub mod error;
pub mod gender;
pub mod migrate;
pub mod record;
pub mod recover;
pub mod slots;
pub mod state;
pub mod verify;
pub mod version;
