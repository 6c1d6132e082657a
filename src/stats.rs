// Attribute names, stat blocks and the sparse deltas layered on top of them.
use derive_more::{Deref, From, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub const BASE_STAT_VALUE: i32 = 10; // Every attribute starts here before any modifier.
pub const MANUAL_POINTS_POOL: i32 = 6; // Signed budget for manual tuning in bounded mode.
pub const MIN_STAT_VALUE: i32 = 3; // Floor a manually tuned attribute may not go below.

// The closed set of six attributes. Order of declaration is the display and roll order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
pub enum StatName {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl StatName {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            StatName::Strength => "STR",
            StatName::Dexterity => "DEX",
            StatName::Constitution => "CON",
            StatName::Intelligence => "INT",
            StatName::Wisdom => "WIS",
            StatName::Charisma => "CHA",
        }
    }
}

/// Ability modifier of a stat value: `floor((value - 10) / 2)`.
pub fn modifier(value: i32) -> i32 {
    (value - 10).div_euclid(2)
}

// Complete mapping from every attribute to its value.
// Deserializing a partial map fills the gaps with BASE_STAT_VALUE so the block is always complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<StatName, i32>", into = "BTreeMap<StatName, i32>")]
pub struct StatBlock {
    values: BTreeMap<StatName, i32>,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::uniform(BASE_STAT_VALUE)
    }
}

impl StatBlock {
    pub fn uniform(value: i32) -> Self {
        Self {
            values: StatName::iter().map(|stat| (stat, value)).collect(),
        }
    }

    pub fn get(&self, stat: StatName) -> i32 {
        self.values.get(&stat).copied().unwrap_or(BASE_STAT_VALUE)
    }

    pub fn set(&mut self, stat: StatName, value: i32) {
        self.values.insert(stat, value);
    }

    pub fn modifier(&self, stat: StatName) -> i32 {
        modifier(self.get(stat))
    }

    // Returns a copy with every delta added to its attribute.
    pub fn with_deltas(&self, deltas: &StatDeltas) -> Self {
        let mut block = self.clone();
        for (stat, delta) in deltas.iter() {
            block.set(*stat, block.get(*stat) + delta);
        }
        block
    }

    // Signed sum over all attributes of (self - reference).
    pub fn deviation_from(&self, reference: &StatBlock) -> i32 {
        StatName::iter()
            .map(|stat| self.get(stat) - reference.get(stat))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatName, i32)> + '_ {
        StatName::iter().map(|stat| (stat, self.get(stat)))
    }
}

impl From<BTreeMap<StatName, i32>> for StatBlock {
    fn from(partial: BTreeMap<StatName, i32>) -> Self {
        let mut block = StatBlock::default();
        for (stat, value) in partial {
            block.set(stat, value);
        }
        block
    }
}

impl From<StatBlock> for BTreeMap<StatName, i32> {
    fn from(block: StatBlock) -> Self {
        block.values
    }
}

// Sparse signed deltas (race, class, AI suggestion or manual tuning).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, From, IntoIterator)]
pub struct StatDeltas(BTreeMap<StatName, i32>);

impl StatDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stat: StatName, delta: i32) -> Self {
        *self.0.entry(stat).or_insert(0) += delta;
        self
    }

    pub fn add(&mut self, stat: StatName, delta: i32) {
        *self.0.entry(stat).or_insert(0) += delta;
    }

    pub fn get(&self, stat: StatName) -> i32 {
        self.0.get(&stat).copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.values().all(|delta| *delta == 0)
    }

    // Builds deltas from loosely keyed model output, ignoring keys that are not attribute names.
    pub fn from_loose(loose: &BTreeMap<String, i32>) -> Self {
        let mut deltas = StatDeltas::new();
        for (key, delta) in loose {
            match StatName::from_str(key) {
                Ok(stat) => deltas.add(stat, *delta),
                Err(_) => log::debug!("Ignoring modifier for unknown attribute {key:?}"),
            }
        }
        deltas
    }
}

impl<const N: usize> From<[(StatName, i32); N]> for StatDeltas {
    fn from(pairs: [(StatName, i32); N]) -> Self {
        let mut deltas = StatDeltas::new();
        for (stat, delta) in pairs {
            deltas.add(stat, delta);
        }
        deltas
    }
}
