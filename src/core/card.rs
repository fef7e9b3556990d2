//! Card and skill definitions

use crate::core::{
    CardEffect, CardElement, CardId, CardName, Cost, Country, Element, SkillEffect, Tag,
    WeaponType,
};
use crate::{Result, TcgError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Card types of the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Character,
    Weapon,
    Artifact,
    Talent,
    Support,
    Event,
}

impl CardType {
    pub const ALL: [CardType; 6] = [
        CardType::Character,
        CardType::Weapon,
        CardType::Artifact,
        CardType::Talent,
        CardType::Support,
        CardType::Event,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Character => "character",
            CardType::Weapon => "weapon",
            CardType::Artifact => "artifact",
            CardType::Talent => "talent",
            CardType::Support => "support",
            CardType::Event => "event",
        }
    }

    pub fn from_keyword(s: &str) -> Option<CardType> {
        let s = s.trim();
        let lower = s.to_lowercase();
        match (lower.as_str(), s) {
            ("character", _) | (_, "角色牌") => Some(CardType::Character),
            ("weapon", _) | (_, "武器") => Some(CardType::Weapon),
            ("artifact", _) | (_, "圣遗物") => Some(CardType::Artifact),
            ("talent", _) | (_, "天赋") => Some(CardType::Talent),
            ("support", _) | (_, "支援牌") => Some(CardType::Support),
            ("event", _) | (_, "事件牌") => Some(CardType::Event),
            _ => None,
        }
    }

    /// Every non-character card is an action card
    pub fn is_action(self) -> bool {
        self != CardType::Character
    }

    /// Equipment attaches to a character
    pub fn is_equipment(self) -> bool {
        matches!(self, CardType::Weapon | CardType::Artifact | CardType::Talent)
    }

    /// Playing a card of this type ends the turn
    pub fn is_combat_play(self) -> bool {
        self.is_equipment()
    }

    /// The tag every card of this type carries
    pub fn base_tag(self) -> Tag {
        match self {
            CardType::Character => Tag::Character,
            CardType::Weapon => Tag::Weapon,
            CardType::Artifact => Tag::Artifact,
            CardType::Talent => Tag::Talent,
            CardType::Support => Tag::Support,
            CardType::Event => Tag::Event,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skill categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    NormalAttack,
    ElementalSkill,
    ElementalBurst,
    Passive,
}

impl SkillType {
    pub fn from_keyword(s: &str) -> Option<SkillType> {
        let s = s.trim();
        let lower = s.to_lowercase().replace([' ', '-'], "_");
        match lower.as_str() {
            "normal_attack" | "普通攻击" => Some(SkillType::NormalAttack),
            "elemental_skill" | "元素战技" => Some(SkillType::ElementalSkill),
            "elemental_burst" | "元素爆发" => Some(SkillType::ElementalBurst),
            "passive" | "passive_skill" | "被动技能" => Some(SkillType::Passive),
            _ => None,
        }
    }

    /// Bursts consume energy, the other active skills charge it
    pub fn charges_energy(self) -> bool {
        matches!(self, SkillType::NormalAttack | SkillType::ElementalSkill)
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkillType::NormalAttack => "normal_attack",
            SkillType::ElementalSkill => "elemental_skill",
            SkillType::ElementalBurst => "elemental_burst",
            SkillType::Passive => "passive",
        };
        f.write_str(s)
    }
}

/// A character (or action card) skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDef {
    /// `<card id>/<index>`
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub cost: Cost,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub effect: SkillEffect,
}

impl SkillDef {
    pub fn is_usable(&self) -> bool {
        self.skill_type != SkillType::Passive
    }
}

/// Static definition of a card
///
/// CardDefs are produced by the ingestor and never mutated by duels; a duel
/// holds them behind `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDef {
    pub id: CardId,
    pub name: CardName,
    pub card_type: CardType,
    #[serde(default)]
    pub element: Option<CardElement>,
    /// Empty for characters: their costs live on skills
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub description: String,
    /// Region and weapon for characters, owning character name for talents
    #[serde(default)]
    pub character_subtype: String,
    #[serde(default)]
    pub weapon_type: Option<WeaponType>,
    #[serde(default)]
    pub country: Option<Country>,
    #[serde(default)]
    pub rarity: u8,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default)]
    pub skills: Vec<SkillDef>,
    #[serde(default)]
    pub health_max: Option<u8>,
    #[serde(default)]
    pub energy_max: Option<u8>,
    /// Action-card effect; default for characters
    #[serde(default)]
    pub effect: CardEffect,
}

impl CardDef {
    pub fn new(id: CardId, name: impl Into<CardName>, card_type: CardType) -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(card_type.base_tag());
        CardDef {
            id,
            name: name.into(),
            card_type,
            element: None,
            cost: Cost::new(),
            description: String::new(),
            character_subtype: String::new(),
            weapon_type: None,
            country: None,
            rarity: 0,
            tags,
            skills: Vec::new(),
            health_max: None,
            energy_max: None,
            effect: CardEffect::default(),
        }
    }

    pub fn is_character(&self) -> bool {
        self.card_type == CardType::Character
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// The die-bearing element of a character, if it has one
    pub fn dice_element(&self) -> Option<Element> {
        self.element.and_then(CardElement::element)
    }

    pub fn skill(&self, skill_id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    pub fn health(&self) -> u8 {
        self.health_max.unwrap_or(10)
    }

    pub fn energy_capacity(&self) -> u8 {
        self.energy_max.unwrap_or(2)
    }

    /// Check the structural invariants of a single definition
    pub fn check(&self) -> Result<()> {
        if self.name.as_str().trim().is_empty() {
            return Err(TcgError::InvalidCardRecord("card name is empty".to_string()));
        }
        if self.is_character() {
            if self.skills.is_empty() {
                return Err(TcgError::InvalidCardRecord(format!(
                    "character '{}' has no skills",
                    self.name
                )));
            }
            if !self.cost.is_empty() {
                return Err(TcgError::InvalidCardRecord(format!(
                    "character '{}' carries a top-level cost",
                    self.name
                )));
            }
        }
        if self.card_type == CardType::Talent && self.character_subtype.trim().is_empty() {
            return Err(TcgError::InvalidCardRecord(format!(
                "talent '{}' names no character",
                self.name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CardDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.card_type)
    }
}
