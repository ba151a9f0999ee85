// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTML character sheet renderer
//!
//! Builds the sheet as a [`dom`](crate::dom) tree so every value from the
//! export is escaped on output. The result is a single page with its
//! stylesheet inlined and no external references.

use crate::dom::{Element, HtmlDocument, Node};
use crate::model::{Ability, AbilityKey, Character, Coin, ResourcePool, Spell};
use crate::rules::{self, format_modifier};
use crate::traits::{RenderConfig, Renderer, Result};
use tracing::debug;

const STYLESHEET: &str = include_str!("../../assets/sheet.css");

const PROFICIENT: &str = "●";
const NOT_PROFICIENT: &str = "○";
const CANTRIP: &str = "Cantrip";

/// Renders a Character as a standalone HTML page
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HtmlRenderer {
    fn media_type(&self) -> &'static str {
        "text/html"
    }

    fn render(&self, character: &Character, config: &RenderConfig) -> Result<String> {
        let title = format!(
            "{} - {}",
            config.title_prefix,
            character.display_name().unwrap_or("Unknown")
        );

        let mut sheet = Element::new("div")
            .class("character-sheet")
            .child(header(character))
            .child(core_page(character))
            .child(equipment_page(character));
        if let Some(page) = spell_page(character, config) {
            sheet = sheet.child(page);
        }

        let mut doc = HtmlDocument::new(title, Element::new("body").child(sheet));
        if config.include_stylesheet {
            doc = doc.with_style(STYLESHEET);
        }
        if let Some(css) = &config.extra_css {
            doc = doc.with_style(css.clone());
        }

        let html = doc.to_html();
        debug!(
            media_type = self.media_type(),
            bytes = html.len(),
            "rendered character sheet"
        );
        Ok(html)
    }
}

/// `<div><strong>Label:</strong> value</div>`
fn labelled(label: &str, value: impl Into<String>) -> Element {
    Element::new("div")
        .child(Element::new("strong").text(format!("{label}:")))
        .text(value)
}

fn section(title: &str) -> Element {
    Element::new("div")
        .class("section")
        .child(Element::new("h2").text(title))
}

fn header(character: &Character) -> Element {
    let mut info = Element::new("div").class("header-info");
    if let Some(race) = character.race_line() {
        info = info.child(labelled("Race", race));
    }
    if let Some(classes) = character.class_line() {
        info = info.child(labelled("Class & Level", classes));
    }
    if !character.background.is_empty() {
        info = info.child(labelled("Background", character.background.as_str()));
    }
    if !character.alignment.is_empty() {
        info = info.child(labelled("Alignment", character.alignment.as_str()));
    }
    info = info.child(labelled(
        "Proficiency Bonus",
        rules::format_signed(character.proficiency_bonus()),
    ));

    Element::new("div")
        .class("header")
        .child(Element::new("h1").text(character.display_name().unwrap_or("Character Name")))
        .child(info)
}

fn core_page(character: &Character) -> Element {
    let sidebar = Element::new("div")
        .class("sidebar")
        .children(
            AbilityKey::ALL
                .iter()
                .map(|key| ability_box(*key, character.abilities.get(key))),
        )
        .child(skills_box(character));

    let main = Element::new("div")
        .class("main-grid")
        .child(hit_points(character))
        .child(combat_stats(character))
        .child(features(character))
        .child(feats(character));

    Element::new("div").class("page").child(
        Element::new("div")
            .class("page-layout")
            .child(sidebar)
            .child(main),
    )
}

fn ability_box(key: AbilityKey, ability: Option<&Ability>) -> Element {
    let (score, bonus, save, proficient) = match ability {
        Some(a) => (a.score.as_str(), a.bonus.as_str(), a.save.as_str(), a.save_proficient),
        None => ("10", "0", "0", false),
    };
    let mut save_line = format!("SAVE {}", format_modifier(save));
    if proficient {
        save_line.push_str(" ✓");
    }

    Element::new("div")
        .class("stat-box")
        .attr("data-ability", key.key())
        .child(Element::new("h3").text(key.abbreviation()))
        .child(Element::new("div").class("ability-score").text(score))
        .child(
            Element::new("div")
                .class("ability-modifier")
                .text(format_modifier(bonus)),
        )
        .child(Element::new("div").class("save-box").text(save_line))
}

fn skills_box(character: &Character) -> Element {
    let mut skills: Vec<_> = character.skills.iter().collect();
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    let items = skills.into_iter().map(|skill| {
        let marker = if skill.proficient { PROFICIENT } else { NOT_PROFICIENT };
        let mut item = Element::new("div").class("skill-item");
        if !skill.stat.is_empty() {
            item = item.attr("title", skill.stat.as_str());
        }
        item.child(Element::new("span").text(format!("{marker} {}", skill.name)))
            .child(Element::new("span").text(format_modifier(&skill.total)))
    });

    Element::new("div")
        .class("stat-box")
        .child(Element::new("h3").text("Skills"))
        .child(Element::new("div").class("skill-list").children(items))
}

fn text_input(value: &str) -> Element {
    Element::new("input").attr("type", "text").attr("value", value)
}

fn hit_points(character: &Character) -> Element {
    let vitals = &character.vitals;
    section("Hit Points").child(
        Element::new("div")
            .class("hp-box")
            .child(Element::new("div").class("hp-total").text(vitals.hp_total.as_str()))
            .child(Element::new("div").class("hp-current").text("Current HP"))
            .child(
                Element::new("div")
                    .class("hp-details")
                    .child(
                        Element::new("label")
                            .text("Wounds: ")
                            .child(text_input(&vitals.hp_wounds)),
                    )
                    .child(
                        Element::new("label")
                            .text("Temp: ")
                            .child(text_input(&vitals.hp_temp)),
                    ),
            ),
    )
}

fn combat_stats(character: &Character) -> Element {
    let vitals = &character.vitals;
    let stat = |label: &str, value: String| {
        [
            Element::new("strong").text(format!("{label}:")),
            Element::new("div").class("stat-value").text(value),
        ]
    };

    section("Combat Stats").child(
        Element::new("div")
            .class("combat-stats")
            .children(stat("Armor Class", vitals.armor_class.clone()))
            .children(stat("Initiative", format_modifier(&vitals.initiative)))
            .children(stat("Speed", format!("{} ft", vitals.speed))),
    )
}

/// List items, or a single placeholder item when there are none
fn list_or_placeholder(class: &str, items: Vec<Element>, placeholder: &str) -> Element {
    let list = Element::new("ul").class(class);
    if items.is_empty() {
        list.child(Element::new("li").child(Element::new("em").text(placeholder)))
    } else {
        list.children(items)
    }
}

fn features(character: &Character) -> Element {
    let items = character
        .features
        .iter()
        .map(|feature| {
            let item =
                Element::new("li").child(Element::new("strong").text(feature.name.as_str()));
            if feature.level.is_empty() {
                item
            } else {
                item.text(format!(" (Lvl {})", feature.level))
            }
        })
        .collect();
    section("Features").child(list_or_placeholder("features-list", items, "No features"))
}

fn feats(character: &Character) -> Element {
    let items = character
        .feats
        .iter()
        .map(|feat| {
            let item =
                Element::new("li").child(Element::new("strong").text(feat.name.as_str()));
            if feat.category.is_empty() {
                item
            } else {
                item.text(format!(" ({})", feat.category))
            }
        })
        .collect();
    section("Feats").child(list_or_placeholder("feats-list", items, "No feats"))
}

fn equipment_page(character: &Character) -> Element {
    let items = character
        .inventory
        .iter()
        .map(|entry| {
            let label = match entry.count_suffix() {
                Some(suffix) => format!("{} {suffix}", entry.name),
                None => entry.name.clone(),
            };
            let item = Element::new("li").child(Element::new("span").text(label));
            if entry.cost.is_empty() {
                item
            } else {
                item.child(Element::new("span").class("cost").text(entry.cost.as_str()))
            }
        })
        .collect();

    let coins = Coin::ALL.iter().map(|coin| {
        let amount = character.coins.get(coin).map_or("0", String::as_str);
        Element::new("div")
            .class("coin-item")
            .child(Element::new("strong").text(coin.symbol()))
            .child(text_input(amount))
    });

    let mut page = Element::new("div")
        .class("page")
        .child(section("Equipment").child(list_or_placeholder(
            "inventory-list",
            items,
            "No equipment",
        )))
        .child(section("Wealth").child(Element::new("div").class("coins").children(coins)));

    let traits = &character.personality;
    if !traits.is_empty() {
        let entries = [
            ("Personality Traits", &traits.personality),
            ("Ideals", &traits.ideals),
            ("Bonds", &traits.bonds),
            ("Flaws", &traits.flaws),
        ];
        let blocks = entries
            .into_iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(label, text)| {
                Element::new("div")
                    .class("trait")
                    .child(Element::new("h3").text(label))
                    .child(Element::new("p").text(text.as_str()))
            });
        page = page.child(section("Personality").children(blocks));
    }
    page
}

fn spell_page(character: &Character, config: &RenderConfig) -> Option<Element> {
    let mut sections: Vec<Element> = Vec::new();

    let casting = &character.spellcasting;
    if !casting.is_empty() {
        let mut info = Element::new("div").class("header-info");
        if !casting.spell_ability.is_empty() {
            info = info.child(labelled("Spellcasting Ability", casting.spell_ability.as_str()));
        }
        if !casting.spell_save_dc.is_empty() {
            info = info.child(labelled("Spell Save DC", casting.spell_save_dc.as_str()));
        }
        if !casting.spell_attack_bonus.is_empty() {
            info = info.child(labelled(
                "Spell Attack Bonus",
                format_modifier(&casting.spell_attack_bonus),
            ));
        }
        sections.push(section("Spellcasting").child(info));
    }

    if let Some(points) = &character.sorcery_points {
        sections.push(section("Sorcery Points").child(slot_row("Points", points)));
    }

    if !character.spell_slots.is_empty() {
        sections.push(spell_slots(character));
    }

    if !character.spells.is_empty() {
        sections.push(spells(character, config));
    }

    if sections.is_empty() {
        return None;
    }
    Some(Element::new("div").class("page").children(sections))
}

/// Index where the second column starts: the first `ceil(k/2)` levels go left
pub fn split_columns(levels: usize) -> usize {
    levels.div_ceil(2)
}

fn slot_row(label: &str, pool: &ResourcePool) -> Element {
    let markers = pool.markers().map(|used| {
        Element::new("input")
            .attr("type", "checkbox")
            .flag_if("checked", used)
    });
    Element::new("div")
        .class("slot-level")
        .child(Element::new("strong").text(format!("{label}:")))
        .child(Element::new("div").class("slot-markers").children(markers))
}

fn spell_slots(character: &Character) -> Element {
    // BTreeMap keys are already in ascending level order
    let rows: Vec<Element> = character
        .spell_slots
        .iter()
        .map(|(level, pool)| slot_row(&format!("Level {level}"), pool))
        .collect();
    let split = split_columns(rows.len());
    let mut rows = rows.into_iter();
    let left: Vec<Element> = rows.by_ref().take(split).collect();
    let right: Vec<Element> = rows.collect();

    section("Spell Slots").child(
        Element::new("div")
            .class("columns")
            .child(Element::new("div").class("column").children(left))
            .child(Element::new("div").class("column").children(right)),
    )
}

/// Group spells by level label
///
/// "Cantrip" comes first. Numeric levels follow in ascending order, with any
/// other label ranked as level 0. Groups of equal rank keep the order in which
/// they first appear, and spells keep their relative order inside a group.
pub fn group_spells(spells: &[Spell]) -> Vec<(String, Vec<&Spell>)> {
    let mut groups: Vec<(String, Vec<&Spell>)> = Vec::new();
    for spell in spells {
        let label = spell.group_label();
        match groups.iter_mut().find(|(l, _)| l == label) {
            Some((_, members)) => members.push(spell),
            None => groups.push((label.to_string(), vec![spell])),
        }
    }
    groups.sort_by_key(|(label, _)| (label != CANTRIP, level_rank(label)));
    groups
}

fn level_rank(label: &str) -> i64 {
    if label.bytes().all(|b| b.is_ascii_digit()) {
        rules::parse_level(label)
    } else {
        0
    }
}

fn spells(character: &Character, config: &RenderConfig) -> Element {
    let groups = group_spells(&character.spells).into_iter().map(|(label, members)| {
        let heading = if label == CANTRIP {
            format!("{CANTRIP} ({} spells)", members.len())
        } else {
            format!("Level {label} ({} spells)", members.len())
        };
        Element::new("details")
            .class("spell-level")
            .attr("data-level", label.as_str())
            .flag_if("open", config.expand_spell_levels)
            .child(Element::new("summary").text(heading))
            .children(members.into_iter().map(spell_card))
    });
    section("Spells").children(groups)
}

fn spell_card(spell: &Spell) -> Node {
    let marker = if spell.is_prepared() { PROFICIENT } else { NOT_PROFICIENT };
    let mut title = Element::new("div").child(
        Element::new("strong").text(format!("{marker} {}", spell.name)),
    );
    if spell.ritual {
        title = title.child(Element::new("span").class("ritual").text("ritual"));
    }

    let mut card = Element::new("div").class("spell").child(title);
    let details = [
        ("School", &spell.school),
        ("Casting Time", &spell.casting_time),
        ("Range", &spell.range),
        ("Components", &spell.components),
        ("Duration", &spell.duration),
    ];
    for (label, value) in details {
        if !value.is_empty() {
            card = card.child(labelled(label, value.as_str()).class("spell-meta"));
        }
    }
    if !spell.description.is_empty() {
        card = card.child(
            Element::new("div")
                .class("spell-description")
                .markup(spell.description.clone()),
        );
    }
    card.into()
}
