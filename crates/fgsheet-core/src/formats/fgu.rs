// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fantasy Grounds Unity character export extractor

use crate::markup;
use crate::model::{
    Ability, AbilityKey, Character, ClassLevel, Coin, Feat, Feature, InventoryItem, Personality,
    ResourcePool, Skill, Spell, Spellcasting, Vitals,
};
use crate::rules;
use crate::traits::{ExtractConfig, Extractor, Result, SheetError};
use crate::tree::{exceeds_depth, lookup, NodeExt};
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Highest spell slot level tracked in `powermeta`
const MAX_SLOT_LEVEL: u8 = 9;

/// Deepest element nesting accepted; real exports stay far below this
pub const MAX_DEPTH: usize = 256;

/// Extractor for Fantasy Grounds Unity `.xml` exports
pub struct FguExtractor;

impl FguExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FguExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for FguExtractor {
    fn source_name(&self) -> &'static str {
        "Fantasy Grounds Unity"
    }

    fn extract(&self, input: &[u8], config: &ExtractConfig) -> Result<Character> {
        let text = std::str::from_utf8(input)?;
        if exceeds_depth(text, MAX_DEPTH) {
            return Err(SheetError::Parse(format!(
                "Element nesting exceeds {MAX_DEPTH} levels"
            )));
        }
        let doc = Document::parse(text)?;
        let record = doc
            .root_element()
            .first_child_named("character")
            .ok_or_else(|| {
                SheetError::MalformedInput("No character data found in XML".to_string())
            })?;

        let character = extract_character(record, config);
        debug!(
            name = %character.name,
            classes = character.classes.len(),
            skills = character.skills.len(),
            spells = character.spells.len(),
            slot_levels = character.spell_slots.len(),
            "extracted character"
        );
        Ok(character)
    }
}

fn extract_character(c: Node<'_, '_>, config: &ExtractConfig) -> Character {
    let classes = extract_classes(c);
    let abilities = extract_abilities(c);
    let vitals = extract_vitals(c, &abilities);
    let spellcasting = Spellcasting {
        spell_ability: classes
            .iter()
            .map(|class| class.spell_ability.as_str())
            .find(|ability| !ability.is_empty())
            .unwrap_or_default()
            .to_string(),
        spell_save_dc: lookup(c.child("spellcasting"), "saveDC", ""),
        spell_attack_bonus: lookup(c.child("spellcasting"), "attackbonus", ""),
    };

    Character {
        name: c.text_at("name"),
        race: c.text_at("race"),
        subrace: c.text_at("subrace"),
        alignment: c.text_at("alignment"),
        background: c.text_at("background"),
        gender: c.text_at("gender"),
        age: c.text_at("age"),
        classes,
        abilities,
        vitals,
        skills: extract_skills(c),
        features: list(c, "featurelist")
            .map(|f| Feature {
                name: f.text_at("name"),
                level: f.text_at("level"),
            })
            .collect(),
        feats: list(c, "featlist")
            .map(|f| Feat {
                name: f.text_at("name"),
                category: f.text_at("category"),
                level: f.text_at("level"),
            })
            .collect(),
        inventory: list(c, "inventorylist")
            .map(|item| InventoryItem {
                name: item.text_at("name"),
                count: item.text_or("count", "1"),
                cost: item.text_at("cost"),
            })
            .collect(),
        coins: extract_coins(c),
        personality: Personality {
            personality: c.text_at("personality"),
            ideals: c.text_at("ideals"),
            bonds: c.text_at("bonds"),
            flaws: c.text_at("flaws"),
        },
        spellcasting,
        spells: extract_spells(c, config),
        sorcery_points: extract_sorcery_points(c, config),
        spell_slots: extract_spell_slots(c),
    }
}

/// Element children of the list at `path`, empty when the list is missing
fn list<'a, 'input: 'a>(
    c: Node<'a, 'input>,
    path: &str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    c.child(path).into_iter().flat_map(|node| node.elements())
}

fn extract_classes(c: Node<'_, '_>) -> Vec<ClassLevel> {
    list(c, "classes")
        .map(|class| ClassLevel {
            name: class.text_at("name"),
            level: rules::parse_level(&class.text_at("level")),
            specialization: class.text_at("specialization"),
            spell_ability: class.text_at("spellability"),
        })
        .collect()
}

fn extract_abilities(c: Node<'_, '_>) -> BTreeMap<AbilityKey, Ability> {
    AbilityKey::ALL
        .into_iter()
        .filter_map(|key| {
            let node = c.child(&format!("abilities/{}", key.key()))?;
            Some((
                key,
                Ability {
                    score: node.text_at("score"),
                    bonus: node.text_at("bonus"),
                    save: node.text_at("save"),
                    save_proficient: node.flag("saveprof"),
                },
            ))
        })
        .collect()
}

fn extract_vitals(c: Node<'_, '_>, abilities: &BTreeMap<AbilityKey, Ability>) -> Vitals {
    let hp = c.child("hp");
    let mut initiative = or_absent(c.child("initiative"), "total", "");
    if initiative.is_empty() {
        if let Some(dex) = abilities.get(&AbilityKey::Dexterity) {
            initiative = dex.bonus.clone();
        }
    }

    Vitals {
        hp_total: or_absent(hp, "total", "0"),
        hp_wounds: or_absent(hp, "wounds", "0").trim().to_string(),
        hp_temp: or_absent(hp, "temporary", "0").trim().to_string(),
        armor_class: or_absent(c.child("defenses/ac"), "total", "10"),
        speed: or_absent(c.child("speed"), "total", "30"),
        initiative,
    }
}

/// Text at `path` below `node`
///
/// A missing container yields `absent`, while a container with a missing field
/// yields an empty string.
fn or_absent(node: Option<Node<'_, '_>>, path: &str, absent: &str) -> String {
    match node {
        Some(node) => node.text_at(path),
        None => absent.to_string(),
    }
}

fn extract_skills(c: Node<'_, '_>) -> Vec<Skill> {
    let mut skills: Vec<Skill> = list(c, "skilllist")
        .map(|skill| Skill {
            name: skill.text_at("name"),
            total: skill.text_at("total"),
            proficient: skill.flag("prof"),
            stat: skill.text_at("stat"),
        })
        .collect();
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    skills
}

fn extract_coins(c: Node<'_, '_>) -> BTreeMap<Coin, String> {
    let mut coins = BTreeMap::new();
    for coin in list(c, "coins") {
        let name = coin.text_at("name");
        match name.parse::<Coin>() {
            Ok(symbol) => {
                coins.insert(symbol, coin.text_or("amount", "0"));
            }
            Err(err) => warn!(%err, "skipping coin outside the standard currency set"),
        }
    }
    coins
}

/// Whether a power entry is a spell
///
/// A spell either sits in a group whose label contains `marker` or declares a
/// school, and it must have a level.
pub fn is_spell(group: &str, school: &str, level: &str, marker: &str) -> bool {
    (group.contains(marker) || !school.is_empty()) && !level.is_empty()
}

fn extract_spells(c: Node<'_, '_>, config: &ExtractConfig) -> Vec<Spell> {
    let mut spells: Vec<Spell> = list(c, "powers")
        .filter_map(|power| {
            let level = power.text_at("level");
            let school = power.text_at("school");
            if !is_spell(
                &power.text_at("group"),
                &school,
                &level,
                &config.spell_group_marker,
            ) {
                return None;
            }
            Some(Spell {
                name: power.text_at("name"),
                level,
                prepared: power.text_or("prepared", "0"),
                school,
                casting_time: power.text_at("castingtime"),
                range: power.text_at("range"),
                components: power.text_at("components"),
                duration: power.text_at("duration"),
                ritual: power.flag("ritual"),
                description: markup::flatten(power.child("description")),
            })
        })
        .collect();

    spells.sort_by(|a, b| {
        rules::spell_sort_key(&a.level, &a.name).cmp(&rules::spell_sort_key(&b.level, &b.name))
    });
    spells
}

fn extract_sorcery_points(c: Node<'_, '_>, config: &ExtractConfig) -> Option<ResourcePool> {
    let power = list(c, "powers").find(|p| p.text_at("name") == config.sorcery_resource)?;
    let pool = ResourcePool {
        max: rules::parse_count(&power.text_or("prepared", "0")),
        used: rules::parse_count(&power.text_or("locked", "0")),
    };
    (pool.max > 0).then_some(pool)
}

fn extract_spell_slots(c: Node<'_, '_>) -> BTreeMap<u8, ResourcePool> {
    let Some(meta) = c.child("powermeta") else {
        return BTreeMap::new();
    };
    (1..=MAX_SLOT_LEVEL)
        .filter_map(|level| {
            let slot = meta.child(&format!("spellslots{level}"))?;
            let pool = ResourcePool {
                max: rules::parse_count(&slot.text_or("max", "0")),
                used: rules::parse_count(&slot.text_or("used", "0")),
            };
            (pool.max > 0).then_some((level, pool))
        })
        .collect()
}
