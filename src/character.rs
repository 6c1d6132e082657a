// Import necessary modules from external crates.
use crate::stats::{StatBlock, StatDeltas, StatName, modifier};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

// Playable races. The lowercase id is what the creation collaborator hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Orc,
}

impl Race {
    pub fn name(&self) -> &'static str {
        match self {
            Race::Human => "Human",
            Race::Elf => "Elf",
            Race::Dwarf => "Dwarf",
            Race::Orc => "Orc",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Race::Human => {
                "Adaptable and ambitious, humans are the most widespread race, known for their diversity and tenacity."
            }
            Race::Elf => {
                "Graceful and perceptive, elves have an innate bent for magic and the wilds, and very long lives."
            }
            Race::Dwarf => {
                "Sturdy and enduring, dwarves are master crafters and warriors at home in mountain strongholds."
            }
            Race::Orc => {
                "Mighty and fierce, orcs are known for their tremendous strength and untamed spirit in battle."
            }
        }
    }

    pub fn stat_modifiers(&self) -> StatDeltas {
        match self {
            Race::Human => StatDeltas::from([
                (StatName::Strength, 1),
                (StatName::Dexterity, 1),
                (StatName::Constitution, 1),
                (StatName::Intelligence, 1),
                (StatName::Wisdom, 1),
                (StatName::Charisma, 1),
            ]),
            Race::Elf => StatDeltas::from([(StatName::Dexterity, 2), (StatName::Intelligence, 1)]),
            Race::Dwarf => StatDeltas::from([(StatName::Constitution, 2), (StatName::Strength, 1)]),
            Race::Orc => StatDeltas::from([
                (StatName::Strength, 2),
                (StatName::Constitution, 1),
                (StatName::Charisma, -1),
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Class {
    Warrior,
    Mage,
    Rogue,
    Ranger,
}

impl Class {
    pub fn name(&self) -> &'static str {
        match self {
            Class::Warrior => "Warrior",
            Class::Mage => "Mage",
            Class::Rogue => "Rogue",
            Class::Ranger => "Ranger",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Class::Warrior => {
                "Masters of combat, warriors rely on strength, skill and heavy armor to defeat their foes."
            }
            Class::Mage => {
                "Scholars of the arcane, mages bend reality with powerful spells, their intellect and lore."
            }
            Class::Rogue => {
                "Cunning and nimble, rogues excel at stealth, deception and striking when least expected."
            }
            Class::Ranger => {
                "Wardens of the wild, rangers are skilled hunters and trackers, often bonded with animals."
            }
        }
    }

    pub fn stat_modifiers(&self) -> StatDeltas {
        match self {
            Class::Warrior => StatDeltas::from([(StatName::Strength, 2), (StatName::Constitution, 1)]),
            Class::Mage => StatDeltas::from([(StatName::Intelligence, 2), (StatName::Wisdom, 1)]),
            Class::Rogue => StatDeltas::from([(StatName::Dexterity, 2), (StatName::Charisma, 1)]),
            Class::Ranger => StatDeltas::from([(StatName::Dexterity, 1), (StatName::Wisdom, 2)]),
        }
    }

    pub fn abilities(&self) -> [&'static str; 2] {
        match self {
            Class::Warrior => ["Second Wind", "Action Surge"],
            Class::Mage => ["Spellcasting", "Arcane Recovery"],
            Class::Rogue => ["Sneak Attack", "Thieves' Cant"],
            Class::Ranger => ["Favored Enemy", "Natural Explorer"],
        }
    }
}

// A skill granted at creation, usually suggested from the backstory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
}

// Identity fixed at creation. Fields are private so nothing can rewrite them mid-session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterIdentity {
    name: String,
    race: Race,
    class: Class,
    backstory: String,
    nsfw_enabled: bool,
}

impl CharacterIdentity {
    pub fn new(name: String, race: Race, class: Class, backstory: String, nsfw_enabled: bool) -> Self {
        Self {
            name,
            race,
            class,
            backstory,
            nsfw_enabled,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn race(&self) -> Race {
        self.race
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn nsfw_enabled(&self) -> bool {
        self.nsfw_enabled
    }
}

// Define a structure representing the player's sheet: fixed identity plus mutable scene state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheet {
    #[serde(flatten)]
    identity: CharacterIdentity,

    // Scene state, rewritten by narrator directives.
    pub hp: i64,
    pub max_hp: i64,
    pub statuses: Vec<String>, // Ordered, replaced wholesale.

    // Granted at creation.
    pub skills: Vec<Skill>,
    pub world_elements: Vec<String>,
    pub stats: StatBlock,
}

impl CharacterSheet {
    pub fn new(
        identity: CharacterIdentity,
        stats: StatBlock,
        skills: Vec<Skill>,
        world_elements: Vec<String>,
    ) -> Self {
        let max_hp = starting_max_hp(&stats);
        CharacterSheet {
            identity,
            hp: max_hp,
            max_hp,
            statuses: Vec::new(),
            skills,
            world_elements,
            stats,
        }
    }

    pub fn identity(&self) -> &CharacterIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    // One line header such as "Mira, Elf Ranger".
    pub fn title(&self) -> String {
        format!(
            "{}, {} {}",
            self.identity.name(),
            self.identity.race().name(),
            self.identity.class().name()
        )
    }
}

// Max HP from constitution: 20 + twice the modifier, never under 10.
pub fn starting_max_hp(stats: &StatBlock) -> i64 {
    let con_mod = modifier(stats.get(StatName::Constitution));
    i64::from((20 + con_mod * 2).max(10))
}
