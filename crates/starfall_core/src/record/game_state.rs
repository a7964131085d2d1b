use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::chapters;
use crate::gender::Gender;

/// All mutable gameplay data. This is the block the running game reads
/// and writes; everything else in a `SaveRecord` is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_health: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_max_health: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_level: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_experience: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_credits: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_attack: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_defense: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub player_speed: Option<i64>,
    /// Combat stage, 1..=50.
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub chapter_progress: Option<i64>,
    /// One of the canonical names in [`crate::chapters::CHAPTER_NAMES`].
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub current_chapter: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub protagonist: Option<Protagonist>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Vec::is_empty")]
    pub companions: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "BTreeMap::is_empty")]
    pub available_quests: BTreeMap<String, Quest>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Vec::is_empty")]
    pub completed_quests: Vec<Quest>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub cosmic_collision: Option<CosmicCollision>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "BTreeMap::is_empty")]
    pub visited_locations: BTreeMap<String, Value>,
    /// Set when this state was reconstructed rather than cleanly decoded.
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "std::ops::Not::not")]
    pub recovery_mode: bool,
}

impl GameState {
    pub fn level(&self) -> i64 {
        self.player_level.unwrap_or(1)
    }

    pub fn chapter(&self) -> &str {
        self.current_chapter
            .as_deref()
            .unwrap_or(chapters::CHAPTER_NAMES[0])
    }
}

/// The player character block. Individual fields may be missing in
/// legacy saves; the migrator fills them with gender-conditioned
/// defaults and never overwrites a populated field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Protagonist {
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Chronological age, counting time in cryostasis.
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub physical_age: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Vec::is_empty")]
    pub personal_log_entries: Vec<String>,
}

impl Protagonist {
    /// Fully-populated canonical protagonist for a gender.
    pub fn canonical(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self {
                name: Some("Dr. Hyte Konscript".to_string()),
                gender: Gender::Male,
                specialty: Some("engineering".to_string()),
                background: Some("Cryo-revived weapons engineer".to_string()),
                age: Some(200),
                physical_age: Some(34),
                origin: Some("Neo Boston Research Complex".to_string()),
                personal_log_entries: Vec::new(),
            },
            // Unknown falls back to the canonical female protagonist.
            _ => Self {
                name: Some("Dr. Xeno Valari".to_string()),
                gender: Gender::Female,
                specialty: Some("xenobiology".to_string()),
                background: Some("Cryo-revived research scientist".to_string()),
                age: Some(140),
                physical_age: Some(29),
                origin: Some("Europa Deep Science Enclave".to_string()),
                personal_log_entries: Vec::new(),
            },
        }
    }

    /// Fill only the missing fields from the gender-appropriate
    /// canonical defaults.
    pub fn fill_missing(&mut self) {
        if self.gender == Gender::Unknown {
            if let Some(name) = &self.name {
                self.gender = Gender::infer_from_name(name);
            }
        }
        let defaults = Self::canonical(self.gender);
        if self.name.is_none() {
            self.name = defaults.name;
        }
        if self.specialty.is_none() {
            self.specialty = defaults.specialty;
        }
        if self.background.is_none() {
            self.background = defaults.background;
        }
        if self.age.is_none() {
            self.age = defaults.age;
        }
        if self.physical_age.is_none() {
            self.physical_age = defaults.physical_age;
        }
        if self.origin.is_none() {
            self.origin = defaults.origin;
        }
        if self.gender == Gender::Unknown {
            self.gender = defaults.gender;
        }
    }
}

/// Inventory as stored on disk. Saves from before the category split
/// hold a flat item->count map; everything since holds five fixed
/// categories. The two shapes are told apart by looking at the values:
/// a map whose values are all objects is categorized, anything else is
/// read as a flat map of counts, coercing float counts and skipping
/// entries whose count is not a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Inventory {
    Flat(BTreeMap<String, i64>),
    Categorized(InventoryCategories),
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(D::Error::custom(format!(
                    "inventory must be a map, got {other}"
                )));
            }
        };
        if map.values().all(Value::is_object) {
            return serde_json::from_value(Value::Object(map))
                .map(Inventory::Categorized)
                .map_err(D::Error::custom);
        }
        let mut flat = BTreeMap::new();
        for (item, count) in map {
            match count.as_i64().or_else(|| count.as_f64().map(|c| c as i64)) {
                Some(count) => {
                    flat.insert(item, count);
                }
                None => warn!("dropping inventory entry {item}: count {count} is not a number"),
            }
        }
        Ok(Inventory::Flat(flat))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Inventory::Categorized(InventoryCategories::default())
    }
}

impl Inventory {
    /// Normalize into the five-category layout, routing flat legacy
    /// items through the well-known-item table.
    pub fn into_categorized(self) -> InventoryCategories {
        match self {
            Inventory::Categorized(c) => c,
            Inventory::Flat(flat) => super::items::categorize(flat),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryCategories {
    #[serde(default, deserialize_with = "super::lenient")]
    pub weapons: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub armor: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub consumables: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub key_items: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub artifacts: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default = "one")]
    pub hacking: i64,
    #[serde(default = "one")]
    pub engineering: i64,
    #[serde(default = "one")]
    pub quantum_theory: i64,
    #[serde(default = "one")]
    pub xenobiology: i64,
    #[serde(default = "one")]
    pub persuasion: i64,
    #[serde(default = "one")]
    pub survival: i64,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            hacking: 1,
            engineering: 1,
            quantum_theory: 1,
            xenobiology: 1,
            persuasion: 1,
            survival: 1,
        }
    }
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "normal")]
    pub text_speed: String,
    #[serde(default = "default_scheme")]
    pub color_scheme: String,
    #[serde(default = "normal")]
    pub difficulty: String,
    #[serde(default = "yes")]
    pub tutorial_enabled: bool,
    #[serde(default = "yes")]
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_speed: normal(),
            color_scheme: default_scheme(),
            difficulty: normal(),
            tutorial_enabled: true,
            auto_save: true,
        }
    }
}

fn normal() -> String {
    "normal".to_string()
}

fn default_scheme() -> String {
    "default".to_string()
}

fn yes() -> bool {
    true
}

/// One quest record, either offered (`available_quests`) or finished
/// (`completed_quests`). Counted objectives carry progress/target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    #[serde(default, deserialize_with = "super::lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "super::lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "super::lenient")]
    pub objective: String,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub reward_value: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub reward_items: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub reward_special: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub giver: Option<String>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient", skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
}

/// Sub-state of the Cosmic Collision quest line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CosmicCollision {
    #[serde(default, deserialize_with = "super::lenient")]
    pub started: bool,
    #[serde(default, deserialize_with = "super::lenient")]
    pub completed: bool,
    /// 0..=5.
    #[serde(default, deserialize_with = "super::lenient")]
    pub current_step: i64,
    /// 0..=2.
    #[serde(default, deserialize_with = "super::lenient")]
    pub systems_stabilized: i64,
    #[serde(default, deserialize_with = "super::lenient")]
    pub planets_explored: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    pub has_divergence_cannon: bool,
}
