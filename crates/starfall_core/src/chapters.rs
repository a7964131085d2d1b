//! Canonical chapter names and the level->chapter inference table.

/// The eight canonical chapter names, in story order. The recovery
/// engine scans raw bytes for these literals, so they must match the
/// strings written by every game build to date.
pub const CHAPTER_NAMES: [&str; 8] = [
    "Chapter 1: Earth Station Prime",
    "Chapter 2: The Void Between",
    "Chapter 3: Thalassia I",
    "Chapter 4: Crimson Expanse",
    "Chapter 5: The Silent Forge",
    "Chapter 6: Kepler's Wound",
    "Chapter 7: The Divergence",
    "Chapter 8: Cosmic Collision",
];

/// Chapter number (1..=8) a character of the given level should have
/// reached. Used only when a legacy save carries no chapter of its own.
pub fn chapter_number_for_level(level: i64) -> usize {
    match level {
        l if l >= 25 => 8,
        l if l >= 20 => 7,
        l if l >= 15 => 6,
        l if l >= 12 => 5,
        l if l >= 9 => 4,
        l if l >= 6 => 3,
        l if l >= 3 => 2,
        _ => 1,
    }
}

/// Canonical chapter name for a level.
pub fn chapter_name_for_level(level: i64) -> &'static str {
    CHAPTER_NAMES[chapter_number_for_level(level) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_edges() {
        assert_eq!(chapter_number_for_level(1), 1);
        assert_eq!(chapter_number_for_level(2), 1);
        assert_eq!(chapter_number_for_level(3), 2);
        assert_eq!(chapter_number_for_level(6), 3);
        assert_eq!(chapter_number_for_level(8), 3);
        assert_eq!(chapter_number_for_level(9), 4);
        assert_eq!(chapter_number_for_level(12), 5);
        assert_eq!(chapter_number_for_level(15), 6);
        assert_eq!(chapter_number_for_level(20), 7);
        assert_eq!(chapter_number_for_level(25), 8);
        assert_eq!(chapter_number_for_level(50), 8);
    }

    #[test]
    fn level_seven_lands_in_thalassia() {
        assert_eq!(chapter_name_for_level(7), "Chapter 3: Thalassia I");
    }
}
