//! Built-in item->category table for normalizing flat legacy inventories.
//!
//! Saves written before the category split store one flat item->count
//! map with no category information, so routing has to come from a
//! known-id table. Unknown ids land in `key_items`: key items are never
//! consumed or sold, so a mis-filed item stays visible to the player.

use std::collections::BTreeMap;

use super::game_state::InventoryCategories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Weapons,
    Armor,
    Consumables,
    KeyItems,
    Artifacts,
}

// Item ids referenced by the zone and quest content, with the category
// each belongs to in the five-category layout.
#[rustfmt::skip]
const WELL_KNOWN_ITEMS: &[(&str, Category)] = &[
    // Weapons
    ("plasma_rifle",        Category::Weapons),
    ("pulse_pistol",        Category::Weapons),
    ("arc_blade",           Category::Weapons),
    ("rail_carbine",        Category::Weapons),
    ("quantum_lance",       Category::Weapons),
    ("divergence_cannon",   Category::Weapons),

    // Armor
    ("vac_suit",            Category::Armor),
    ("composite_plating",   Category::Armor),
    ("aegis_exoframe",      Category::Armor),
    ("thermal_weave",       Category::Armor),

    // Consumables
    ("med_gel",             Category::Consumables),
    ("nano_stim",           Category::Consumables),
    ("ration_pack",         Category::Consumables),
    ("oxygen_canister",     Category::Consumables),
    ("focus_serum",         Category::Consumables),

    // Key items
    ("station_keycard",     Category::KeyItems),
    ("cryo_bay_log",        Category::KeyItems),
    ("nav_beacon",          Category::KeyItems),
    ("drive_core_shard",    Category::KeyItems),

    // Artifacts
    ("thalassian_relic",    Category::Artifacts),
    ("void_fragment",       Category::Artifacts),
    ("precursor_seal",      Category::Artifacts),
];

fn category_of(item_id: &str) -> Category {
    WELL_KNOWN_ITEMS
        .iter()
        .find(|(id, _)| *id == item_id)
        .map(|(_, cat)| *cat)
        .unwrap_or(Category::KeyItems)
}

/// Route a flat legacy inventory into the five-category layout.
pub fn categorize(flat: BTreeMap<String, i64>) -> InventoryCategories {
    let mut out = InventoryCategories::default();
    for (id, count) in flat {
        let bucket = match category_of(&id) {
            Category::Weapons => &mut out.weapons,
            Category::Armor => &mut out.armor,
            Category::Consumables => &mut out.consumables,
            Category::KeyItems => &mut out.key_items,
            Category::Artifacts => &mut out.artifacts,
        };
        bucket.insert(id, count);
    }
    out
}
