//! Effect shapes for skills, statuses, summons and action cards
//!
//! Effects form a closed set of tagged variants. The duel engine interprets
//! them; nothing here holds references into a duel.

use crate::core::Element;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// How a hit is resolved by the damage pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DamageType {
    #[default]
    Physical,
    Elemental(Element),
    /// Ignores shields and never reacts
    Piercing,
    /// Restores health instead of removing it
    Heal,
}

impl DamageType {
    pub fn element(self) -> Option<Element> {
        match self {
            DamageType::Elemental(e) => Some(e),
            _ => None,
        }
    }

    pub fn from_keyword(s: &str) -> Option<DamageType> {
        if let Some(e) = Element::from_keyword(s) {
            return Some(DamageType::Elemental(e));
        }
        match s.trim().to_lowercase().as_str() {
            "physical" | "物理" => Some(DamageType::Physical),
            "piercing" | "穿透" => Some(DamageType::Piercing),
            "heal" | "治疗" => Some(DamageType::Heal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Elemental(e) => e.as_str(),
            DamageType::Piercing => "piercing",
            DamageType::Heal => "heal",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DamageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DamageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DamageType::from_keyword(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown damage type '{s}'")))
    }
}

/// Built-in status behaviours. `Named` statuses come from card data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Skips skill use; the next physical or pyro hit gains +2 and removes it
    Frozen,
    /// Owner takes damage every end phase
    Burning,
    /// Team status: next pyro or electro damage gains a bonus
    DendroCore,
    /// Team status: next dendro or electro damage gains a bonus
    CatalyzingField,
    Named,
}

/// Where a skill or card status lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTarget {
    /// The acting character
    #[default]
    SelfCharacter,
    /// The acting player's team
    Team,
    /// The opposing active character
    EnemyActive,
}

/// What a status does while it lives
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusPayload {
    #[default]
    None,
    /// Dealt to the status owner at end phase
    DamagePerRound { amount: u8, damage_type: DamageType },
    /// Restored to the status owner at end phase
    HealPerRound { amount: u8 },
    /// Added to the next matching outgoing hit; consumes one usage.
    /// An empty element list matches every elemental hit.
    DamageBoost {
        amount: u8,
        elements: SmallVec<[Element; 2]>,
    },
}

/// Template from which a `StatusInstance` is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSpec {
    pub name: String,
    pub kind: StatusKind,
    #[serde(default)]
    pub target: StatusTarget,
    /// Rounds before expiry at end phase; `None` lasts until usages run out
    #[serde(default)]
    pub duration_rounds: Option<u8>,
    #[serde(default)]
    pub usages: Option<u8>,
    #[serde(default)]
    pub payload: StatusPayload,
}

impl StatusSpec {
    pub fn frozen() -> Self {
        StatusSpec {
            name: "Frozen".to_string(),
            kind: StatusKind::Frozen,
            target: StatusTarget::EnemyActive,
            duration_rounds: Some(1),
            usages: None,
            payload: StatusPayload::None,
        }
    }

    pub fn burning() -> Self {
        StatusSpec {
            name: "Burning".to_string(),
            kind: StatusKind::Burning,
            target: StatusTarget::EnemyActive,
            duration_rounds: Some(2),
            usages: None,
            payload: StatusPayload::DamagePerRound {
                amount: 1,
                damage_type: DamageType::Elemental(Element::Pyro),
            },
        }
    }

    pub fn dendro_core() -> Self {
        StatusSpec {
            name: "Dendro Core".to_string(),
            kind: StatusKind::DendroCore,
            target: StatusTarget::Team,
            duration_rounds: Some(1),
            usages: Some(1),
            payload: StatusPayload::DamageBoost {
                amount: 2,
                elements: SmallVec::from_slice(&[Element::Pyro, Element::Electro]),
            },
        }
    }

    pub fn catalyzing_field() -> Self {
        StatusSpec {
            name: "Catalyzing Field".to_string(),
            kind: StatusKind::CatalyzingField,
            target: StatusTarget::Team,
            duration_rounds: Some(1),
            usages: Some(2),
            payload: StatusPayload::DamageBoost {
                amount: 1,
                elements: SmallVec::from_slice(&[Element::Dendro, Element::Electro]),
            },
        }
    }
}

/// A summon placed by a skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonSpec {
    pub name: String,
    /// Damage dealt to the opposing active character each end phase
    pub damage: u8,
    pub damage_type: DamageType,
    pub usages: u8,
}

/// Everything a skill does when used
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillEffect {
    #[serde(default)]
    pub damage: u8,
    #[serde(default)]
    pub damage_type: DamageType,
    /// Element attached to the target even when damage is zero
    #[serde(default)]
    pub element_application: Option<Element>,
    #[serde(default)]
    pub status_applied: Option<StatusSpec>,
    #[serde(default)]
    pub summon: Option<SummonSpec>,
    /// Shield points granted to the acting character
    #[serde(default)]
    pub shield: u8,
    /// Health restored to the acting character
    #[serde(default)]
    pub heal: u8,
    /// Extra energy change on top of the per-skill-type rule
    #[serde(default)]
    pub self_energy_delta: i8,
}

impl SkillEffect {
    pub fn damage(amount: u8, damage_type: DamageType) -> Self {
        SkillEffect {
            damage: amount,
            damage_type,
            element_application: damage_type.element(),
            ..SkillEffect::default()
        }
    }
}

/// When an action card's effect fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    #[default]
    OnPlay,
    /// Supports only: fire every end phase while usages remain
    EndPhase,
}

/// Effect of playing an action card
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardEffect {
    /// Damage to the opposing active character
    #[serde(default)]
    pub damage: u8,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub heal: u8,
    #[serde(default)]
    pub shield: u8,
    #[serde(default)]
    pub draw: u8,
    #[serde(default)]
    pub energy: u8,
    #[serde(default)]
    pub omni_dice: u8,
    /// Added to the holder's skill damage while equipped
    #[serde(default)]
    pub damage_bonus: u8,
    #[serde(default)]
    pub survive_once: bool,
    #[serde(default)]
    pub trigger: EffectTrigger,
    #[serde(default)]
    pub usages: Option<u8>,
}

impl CardEffect {
    pub fn is_noop(&self) -> bool {
        self.damage == 0
            && self.heal == 0
            && self.shield == 0
            && self.draw == 0
            && self.energy == 0
            && self.omni_dice == 0
            && !self.survive_once
    }
}
