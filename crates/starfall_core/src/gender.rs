use std::fmt;

use serde::{Deserialize, Serialize};

/// Protagonist gender as stored in save files.
///
/// `Unknown` appears only in records the recovery engine rebuilt from
/// raw bytes without finding a recognizable name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

/// Name fragments that identify the male protagonist in legacy saves.
pub const MALE_NAME_MARKERS: [&str; 2] = ["Hyte", "Konscript"];

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Unknown => "unknown",
        }
    }

    /// Infer gender from a character name, defaulting to female for any
    /// name that carries no male marker (the female doctor is the
    /// canonical protagonist).
    pub fn infer_from_name(name: &str) -> Self {
        if MALE_NAME_MARKERS.iter().any(|m| name.contains(m)) {
            Self::Male
        } else {
            Self::Female
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
