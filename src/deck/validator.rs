//! Deck validation rules
//!
//! All six rules are evaluated on every call; the report lists each verdict
//! so a deck builder can show every problem at once.

use crate::core::{CardDef, CardId, CardType, Country, Element, Tag};
use crate::deck::DeckSpec;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const CHARACTER_COUNT: usize = 3;
pub const ACTION_COUNT: usize = 30;
pub const MAX_COPIES: usize = 2;
pub const MAX_LEGACY_COPIES: usize = 1;
/// Characters needed to enable a resonance or country card
pub const BINDING_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKey {
    CharacterCount,
    ActionCount,
    CopyLimit,
    TalentBinding,
    ElementalResonance,
    CountryBinding,
}

impl RuleKey {
    pub const ALL: [RuleKey; 6] = [
        RuleKey::CharacterCount,
        RuleKey::ActionCount,
        RuleKey::CopyLimit,
        RuleKey::TalentBinding,
        RuleKey::ElementalResonance,
        RuleKey::CountryBinding,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub valid: bool,
    /// One message per violation
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub rules: BTreeMap<RuleKey, RuleVerdict>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    pub fn rule(&self, key: RuleKey) -> Option<&RuleVerdict> {
        self.rules.get(&key)
    }
}

/// Composition summary of a deck
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_cards: usize,
    pub character_count: usize,
    pub action_count: usize,
    pub action_type_distribution: BTreeMap<String, usize>,
    pub element_distribution: BTreeMap<String, usize>,
    pub characters: Vec<String>,
}

/// Element a resonance card asks for, if the card is one
fn resonance_element(card: &CardDef) -> Option<Element> {
    let name = card.name.as_str();
    let is_resonance = card.has_tag(Tag::Resonance)
        || name.contains("元素共鸣")
        || name.to_lowercase().contains("resonance");
    if is_resonance {
        Element::find_in(name)
    } else {
        None
    }
}

fn country_of_card(card: &CardDef) -> Option<Country> {
    if card.is_character() {
        None
    } else {
        Country::find_in(card.name.as_str())
    }
}

fn verdict(messages: Vec<String>) -> RuleVerdict {
    RuleVerdict {
        valid: messages.is_empty(),
        messages,
    }
}

pub struct DeckValidator;

impl DeckValidator {
    pub fn validate(deck: &DeckSpec) -> ValidationReport {
        let mut rules = BTreeMap::new();
        let mut suggestions = Vec::new();

        let character_msgs = Self::check_characters(deck);
        if !character_msgs.is_empty() {
            suggestions.push(format!(
                "Pick exactly {CHARACTER_COUNT} different character cards"
            ));
        }
        rules.insert(RuleKey::CharacterCount, verdict(character_msgs));

        let action_msgs = Self::check_actions(deck);
        if !action_msgs.is_empty() {
            let n = deck.actions.len();
            if n < ACTION_COUNT {
                suggestions.push(format!("Add {} more action cards", ACTION_COUNT - n));
            } else if n > ACTION_COUNT {
                suggestions.push(format!("Remove {} action cards", n - ACTION_COUNT));
            } else {
                suggestions.push("Move character cards out of the action list".to_string());
            }
        }
        rules.insert(RuleKey::ActionCount, verdict(action_msgs));

        let copy_msgs = Self::check_copies(deck);
        if !copy_msgs.is_empty() {
            suggestions.push(format!(
                "Keep at most {MAX_COPIES} copies of a card and one copy of each legacy card"
            ));
        }
        rules.insert(RuleKey::CopyLimit, verdict(copy_msgs));

        let talent_msgs = Self::check_talents(deck);
        if !talent_msgs.is_empty() {
            suggestions.push("Remove talents whose character is not in the team".to_string());
        }
        rules.insert(RuleKey::TalentBinding, verdict(talent_msgs));

        let resonance_msgs = Self::check_resonance(deck);
        if !resonance_msgs.is_empty() {
            suggestions.push(format!(
                "Resonance cards need {BINDING_THRESHOLD} characters of their element"
            ));
        }
        rules.insert(RuleKey::ElementalResonance, verdict(resonance_msgs));

        let country_msgs = Self::check_country(deck);
        if !country_msgs.is_empty() {
            suggestions.push(format!(
                "Country cards need {BINDING_THRESHOLD} characters from that country"
            ));
        }
        rules.insert(RuleKey::CountryBinding, verdict(country_msgs));

        let errors: Vec<String> = RuleKey::ALL
            .iter()
            .filter_map(|k| rules.get(k))
            .flat_map(|v| v.messages.iter().cloned())
            .collect();
        ValidationReport {
            valid: errors.is_empty(),
            errors,
            rules,
            suggestions,
        }
    }

    fn check_characters(deck: &DeckSpec) -> Vec<String> {
        let mut msgs = Vec::new();
        if deck.characters.len() != CHARACTER_COUNT {
            msgs.push(format!(
                "Deck must contain exactly {CHARACTER_COUNT} characters, found {}",
                deck.characters.len()
            ));
        }
        for card in deck.characters.iter().filter(|c| !c.is_character()) {
            msgs.push(format!("'{}' is not a character card", card.name));
        }
        let mut seen: Vec<&CardId> = Vec::new();
        for card in &deck.characters {
            if seen.contains(&&card.id) {
                msgs.push(format!("Character '{}' appears more than once", card.name));
            } else {
                seen.push(&card.id);
            }
        }
        msgs
    }

    fn check_actions(deck: &DeckSpec) -> Vec<String> {
        let mut msgs = Vec::new();
        if deck.actions.len() != ACTION_COUNT {
            msgs.push(format!(
                "Deck must contain exactly {ACTION_COUNT} action cards, found {}",
                deck.actions.len()
            ));
        }
        for card in deck.actions.iter().filter(|c| c.is_character()) {
            msgs.push(format!("Character '{}' cannot be an action card", card.name));
        }
        msgs
    }

    fn check_copies(deck: &DeckSpec) -> Vec<String> {
        let mut counts: FxHashMap<&CardId, (usize, &Arc<CardDef>)> = FxHashMap::default();
        let mut order: Vec<&CardId> = Vec::new();
        for card in &deck.actions {
            let entry = counts.entry(&card.id).or_insert_with(|| {
                order.push(&card.id);
                (0, card)
            });
            entry.0 += 1;
        }
        let mut msgs = Vec::new();
        for id in order {
            let (n, card) = counts[id];
            let limit = if card.has_tag(Tag::Legacy) {
                MAX_LEGACY_COPIES
            } else {
                MAX_COPIES
            };
            if n > limit {
                msgs.push(format!(
                    "'{}' has {n} copies, the limit is {limit}",
                    card.name
                ));
            }
        }
        msgs
    }

    fn check_talents(deck: &DeckSpec) -> Vec<String> {
        let mut msgs: Vec<String> = Vec::new();
        for talent in deck.actions.iter().filter(|c| c.card_type == CardType::Talent) {
            let owner = talent.character_subtype.trim();
            let in_team = deck
                .characters
                .iter()
                .any(|c| c.name.as_str().eq_ignore_ascii_case(owner));
            let msg = format!(
                "Talent '{}' requires character '{owner}' in the team",
                talent.name
            );
            if !in_team && !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }
        msgs
    }

    fn check_resonance(deck: &DeckSpec) -> Vec<String> {
        let mut msgs: Vec<String> = Vec::new();
        for card in &deck.actions {
            let Some(element) = resonance_element(card) else {
                continue;
            };
            let matching = deck
                .characters
                .iter()
                .filter(|c| c.dice_element() == Some(element))
                .count();
            let msg = format!(
                "'{}' requires at least {BINDING_THRESHOLD} {element} characters, found {matching}",
                card.name
            );
            if matching < BINDING_THRESHOLD && !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }
        msgs
    }

    fn check_country(deck: &DeckSpec) -> Vec<String> {
        let mut msgs: Vec<String> = Vec::new();
        for card in &deck.actions {
            let Some(country) = country_of_card(card) else {
                continue;
            };
            let matching = deck
                .characters
                .iter()
                .filter(|c| c.country == Some(country))
                .count();
            let msg = format!(
                "'{}' requires at least {BINDING_THRESHOLD} {country} characters, found {matching}",
                card.name
            );
            if matching < BINDING_THRESHOLD && !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }
        msgs
    }

    pub fn stats(deck: &DeckSpec) -> DeckStats {
        let mut stats = DeckStats {
            total_cards: deck.characters.len() + deck.actions.len(),
            character_count: deck.characters.len(),
            action_count: deck.actions.len(),
            characters: deck.characters.iter().map(|c| c.name.to_string()).collect(),
            ..DeckStats::default()
        };
        for card in &deck.actions {
            *stats
                .action_type_distribution
                .entry(card.card_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        for card in &deck.characters {
            let element = card
                .element
                .map(|e| e.as_str().to_string())
                .unwrap_or_else(|| "none".to_string());
            *stats.element_distribution.entry(element).or_insert(0) += 1;
        }
        stats
    }
}
