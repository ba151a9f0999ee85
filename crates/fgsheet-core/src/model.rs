// SPDX-License-Identifier: AGPL-3.0-or-later
//! Normalized character model
//!
//! This model is independent of the export's tree shape. Scalar values stay as
//! text where the sheet displays them verbatim; only values that drive layout or
//! arithmetic (class levels, resource pools) are numeric.

use crate::markup::Markup;
use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The six ability scores, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKey {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl AbilityKey {
    /// Element name used by the export
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Constitution => "constitution",
            Self::Intelligence => "intelligence",
            Self::Wisdom => "wisdom",
            Self::Charisma => "charisma",
        }
    }

    /// Three-letter label shown on the sheet
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
        }
    }

    /// All abilities in display order
    pub const ALL: [Self; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
    ];
}

/// Currency symbols, in wealth display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Coin {
    PP,
    GP,
    EP,
    SP,
    CP,
}

impl Coin {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::PP => "PP",
            Self::GP => "GP",
            Self::EP => "EP",
            Self::SP => "SP",
            Self::CP => "CP",
        }
    }

    pub const ALL: [Self; 5] = [Self::PP, Self::GP, Self::EP, Self::SP, Self::CP];
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error for coin names outside the fixed currency set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown coin: {0}")]
pub struct UnknownCoin(pub String);

impl FromStr for Coin {
    type Err = UnknownCoin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|coin| coin.symbol().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCoin(trimmed.to_string()))
    }
}

/// One class entry with its level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub name: String,
    pub level: i64,
    pub specialization: String,
    /// Spellcasting ability declared by this class, if any
    pub spell_ability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub score: String,
    pub bonus: String,
    pub save: String,
    pub save_proficient: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp_total: String,
    pub hp_wounds: String,
    pub hp_temp: String,
    pub armor_class: String,
    pub speed: String,
    pub initiative: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub total: String,
    pub proficient: bool,
    pub stat: String,
}

/// Class or racial feature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    pub category: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub count: String,
    pub cost: String,
}

impl InventoryItem {
    /// Multiplier shown after the item name, `None` for a single item
    pub fn count_suffix(&self) -> Option<String> {
        if self.count == "1" {
            None
        } else {
            Some(format!("x{}", self.count))
        }
    }
}

impl Default for InventoryItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            count: "1".to_string(),
            cost: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub personality: String,
    pub ideals: String,
    pub bonds: String,
    pub flaws: String,
}

impl Personality {
    pub fn is_empty(&self) -> bool {
        self.personality.is_empty()
            && self.ideals.is_empty()
            && self.bonds.is_empty()
            && self.flaws.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spellcasting {
    pub spell_ability: String,
    pub spell_save_dc: String,
    pub spell_attack_bonus: String,
}

impl Spellcasting {
    pub fn is_empty(&self) -> bool {
        self.spell_ability.is_empty()
            && self.spell_save_dc.is_empty()
            && self.spell_attack_bonus.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub level: String,
    pub prepared: String,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: String,
    pub duration: String,
    pub ritual: bool,
    /// Flattened, deduplicated inline markup
    pub description: Markup,
}

impl Spell {
    /// Group heading for this spell: "Cantrip" for level 0 or no level
    pub fn group_label(&self) -> &str {
        if self.level.is_empty() || self.level == "0" {
            "Cantrip"
        } else {
            &self.level
        }
    }

    pub fn is_prepared(&self) -> bool {
        !self.prepared.is_empty() && self.prepared != "0"
    }
}

/// Most markers drawn for one pool; larger maximums are clipped
pub const MAX_MARKERS: u32 = 100;

/// A pool of expendable uses (spell slots, sorcery points)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub max: u32,
    pub used: u32,
}

impl ResourcePool {
    /// One flag per slot marker; the first `used` markers are set
    ///
    /// At most [`MAX_MARKERS`] flags are produced.
    pub fn markers(&self) -> impl Iterator<Item = bool> + '_ {
        let max = self.max.min(MAX_MARKERS);
        let used = self.used.min(max);
        (0..max).map(move |i| i < used)
    }
}

/// The root aggregate built from one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub subrace: String,
    pub alignment: String,
    pub background: String,
    pub gender: String,
    pub age: String,
    pub classes: Vec<ClassLevel>,
    pub abilities: BTreeMap<AbilityKey, Ability>,
    pub vitals: Vitals,
    /// Sorted by name
    pub skills: Vec<Skill>,
    pub features: Vec<Feature>,
    pub feats: Vec<Feat>,
    pub inventory: Vec<InventoryItem>,
    /// Only symbols present in the export; absent ones render as "0"
    pub coins: BTreeMap<Coin, String>,
    pub personality: Personality,
    pub spellcasting: Spellcasting,
    /// Sorted by level (non-numeric last), then name
    pub spells: Vec<Spell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorcery_points: Option<ResourcePool>,
    /// Keyed by slot level 1..=9; only levels with a non-zero maximum
    pub spell_slots: BTreeMap<u8, ResourcePool>,
}

impl Character {
    pub fn total_level(&self) -> i64 {
        self.classes.iter().map(|c| c.level).sum()
    }

    pub fn proficiency_bonus(&self) -> i64 {
        rules::proficiency_bonus(self.total_level())
    }

    /// Trimmed character name, if there is one
    pub fn display_name(&self) -> Option<&str> {
        let trimmed = self.name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Race with subrace in parentheses, e.g. "Elf (High Elf)"
    pub fn race_line(&self) -> Option<String> {
        if self.race.is_empty() {
            return None;
        }
        if self.subrace.is_empty() {
            Some(self.race.clone())
        } else {
            Some(format!("{} ({})", self.race, self.subrace))
        }
    }

    /// "Fighter 3, Wizard 2"
    pub fn class_line(&self) -> Option<String> {
        if self.classes.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .classes
            .iter()
            .map(|c| format!("{} {}", c.name, c.level))
            .collect();
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, level: i64) -> ClassLevel {
        ClassLevel {
            name: name.to_string(),
            level,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_level_and_proficiency() {
        let character = Character {
            classes: vec![class("Fighter", 3), class("Wizard", 2)],
            ..Default::default()
        };
        assert_eq!(character.total_level(), 5);
        assert_eq!(character.proficiency_bonus(), 3);
        assert_eq!(character.class_line().as_deref(), Some("Fighter 3, Wizard 2"));
    }

    #[test]
    fn test_no_classes_gives_base_proficiency() {
        let character = Character::default();
        assert_eq!(character.total_level(), 0);
        assert_eq!(character.proficiency_bonus(), 2);
        assert!(character.class_line().is_none());
    }

    #[test]
    fn test_coin_from_str() {
        assert_eq!("gp".parse::<Coin>(), Ok(Coin::GP));
        assert_eq!(" PP ".parse::<Coin>(), Ok(Coin::PP));
        assert!("zz".parse::<Coin>().is_err());
    }

    #[test]
    fn test_count_suffix() {
        let torch = InventoryItem {
            name: "Torch".to_string(),
            ..Default::default()
        };
        let arrows = InventoryItem {
            name: "Arrow".to_string(),
            count: "20".to_string(),
            cost: String::new(),
        };
        assert_eq!(torch.count_suffix(), None);
        assert_eq!(arrows.count_suffix().as_deref(), Some("x20"));
    }

    #[test]
    fn test_resource_markers() {
        let pool = ResourcePool { max: 4, used: 2 };
        let markers: Vec<bool> = pool.markers().collect();
        assert_eq!(markers, vec![true, true, false, false]);

        let overspent = ResourcePool { max: 2, used: 5 };
        assert_eq!(overspent.markers().filter(|m| *m).count(), 2);
    }

    #[test]
    fn test_resource_markers_clipped() {
        let huge = ResourcePool {
            max: 4_000_000_000,
            used: 3_999_999_999,
        };
        assert_eq!(huge.markers().count(), MAX_MARKERS as usize);
        assert!(huge.markers().all(|m| m));
    }

    #[test]
    fn test_spell_group_label() {
        let mut spell = Spell::default();
        assert_eq!(spell.group_label(), "Cantrip");
        spell.level = "0".to_string();
        assert_eq!(spell.group_label(), "Cantrip");
        spell.level = "3".to_string();
        assert_eq!(spell.group_label(), "3");
    }

    #[test]
    fn test_race_line() {
        let character = Character {
            race: "Elf".to_string(),
            subrace: "High Elf".to_string(),
            ..Default::default()
        };
        assert_eq!(character.race_line().as_deref(), Some("Elf (High Elf)"));
    }

    #[test]
    fn test_display_name_trims() {
        let character = Character {
            name: "  ".to_string(),
            ..Default::default()
        };
        assert!(character.display_name().is_none());
    }
}
