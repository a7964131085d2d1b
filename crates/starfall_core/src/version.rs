//! Version constants consumed by the migrator.
//!
//! Save format history:
//! v1.0 = original flat layout (scalar stats at the top of game_state,
//!        flat item->count inventory, no protagonist block)
//! v2.0 = protagonist block, categorized inventory, skills/settings maps
//! v3.0 = cosmic_collision sub-record, character_info/technical_info
//!        summaries, file header with checksum

use std::fmt;
use std::str::FromStr;

/// Version of the running game, stamped into `character_info.version`.
pub const GAME_VERSION: &str = "2.5.0";

/// Save schema revision, stamped into `technical_info.save_version`.
pub const SAVE_FORMAT_VERSION: &str = "3.0";

/// Build date (YYYYMMDD), diagnostics only, never compared.
pub const BUILD_NUMBER: &str = "20260830";

/// Parsed dotted version, compared numerically component-wise (string
/// comparison would order "2.10" before "2.9").
///
/// Saves carry free-form strings, so parsing is tolerant: a missing
/// component is 0 and an unparsable string becomes (0, 0, 0), the
/// oldest possible version, forcing migration instead of skipping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const ZERO: Version = Version {
        major: 0,
        minor: 0,
        patch: 0,
    };

    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse, treating anything unparsable as the oldest version.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::ZERO)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = |name: &str| -> Result<u32, String> {
            match parts.next() {
                None => Ok(0),
                Some(p) => p
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid {name} component in version '{s}'")),
            }
        };
        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        Ok(Version::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
