//! Strongly-typed wrappers for catalog concepts
//!
//! Newtypes keep card ids, names and player ids from being mixed up, and the
//! closed vocabularies (country, weapon, tag) carry their multilingual
//! keyword tables so ingest and query share one source of truth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable catalog id of a card definition (UUID on first sight)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(s: impl Into<String>) -> Self {
        CardId(s.into())
    }

    /// Fresh random id
    pub fn generate() -> Self {
        CardId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        CardId(s.to_string())
    }
}

/// Card name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Authenticated user id of a duel participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// Opaque duel id handed out by the session registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuelId(String);

impl DuelId {
    pub fn new(s: impl Into<String>) -> Self {
        DuelId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DuelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Region a character belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Country {
    Mondstadt,
    Liyue,
    Inazuma,
    Sumeru,
    Fontaine,
    Natlan,
    Snezhnaya,
    Monster,
    Fatui,
    Hilichurl,
}

impl Country {
    /// Keyword order is match priority: first match wins
    pub const ALL: [Country; 10] = [
        Country::Mondstadt,
        Country::Liyue,
        Country::Inazuma,
        Country::Sumeru,
        Country::Fontaine,
        Country::Natlan,
        Country::Snezhnaya,
        Country::Monster,
        Country::Fatui,
        Country::Hilichurl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Country::Mondstadt => "mondstadt",
            Country::Liyue => "liyue",
            Country::Inazuma => "inazuma",
            Country::Sumeru => "sumeru",
            Country::Fontaine => "fontaine",
            Country::Natlan => "natlan",
            Country::Snezhnaya => "snezhnaya",
            Country::Monster => "monster",
            Country::Fatui => "fatui",
            Country::Hilichurl => "hilichurl",
        }
    }

    pub fn zh(self) -> &'static str {
        match self {
            Country::Mondstadt => "蒙德",
            Country::Liyue => "璃月",
            Country::Inazuma => "稻妻",
            Country::Sumeru => "须弥",
            Country::Fontaine => "枫丹",
            Country::Natlan => "纳塔",
            Country::Snezhnaya => "至冬",
            Country::Monster => "魔物",
            Country::Fatui => "愚人众",
            Country::Hilichurl => "丘丘人",
        }
    }

    /// First country whose keyword occurs in `text`
    pub fn find_in(text: &str) -> Option<Country> {
        let lower = text.to_lowercase();
        Country::ALL
            .into_iter()
            .find(|c| text.contains(c.zh()) || lower.contains(c.as_str()))
    }

    pub fn from_keyword(s: &str) -> Option<Country> {
        let s = s.trim();
        let lower = s.to_lowercase();
        Country::ALL
            .into_iter()
            .find(|c| lower == c.as_str() || s == c.zh())
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weapon a character wields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    SingleHandedSword,
    TwoHandedSword,
    Polearm,
    Bow,
    Catalyst,
    Other,
}

impl WeaponType {
    pub const ALL: [WeaponType; 6] = [
        WeaponType::SingleHandedSword,
        WeaponType::TwoHandedSword,
        WeaponType::Polearm,
        WeaponType::Bow,
        WeaponType::Catalyst,
        WeaponType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeaponType::SingleHandedSword => "single_handed_sword",
            WeaponType::TwoHandedSword => "two_handed_sword",
            WeaponType::Polearm => "polearm",
            WeaponType::Bow => "bow",
            WeaponType::Catalyst => "catalyst",
            WeaponType::Other => "other",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            WeaponType::SingleHandedSword => &["单手剑", "sword"],
            WeaponType::TwoHandedSword => &["双手剑", "claymore", "two-handed"],
            WeaponType::Polearm => &["长柄武器", "polearm"],
            WeaponType::Bow => &["弓", "bow"],
            WeaponType::Catalyst => &["法器", "catalyst"],
            WeaponType::Other => &["其他武器", "other weapon"],
        }
    }

    /// Derive the weapon from a subtype string. Two-handed is checked before
    /// single-handed because "two-handed sword" also mentions "sword".
    pub fn find_in(text: &str) -> Option<WeaponType> {
        let lower = text.to_lowercase();
        const ORDER: [WeaponType; 6] = [
            WeaponType::TwoHandedSword,
            WeaponType::SingleHandedSword,
            WeaponType::Polearm,
            WeaponType::Bow,
            WeaponType::Catalyst,
            WeaponType::Other,
        ];
        ORDER
            .into_iter()
            .find(|w| w.keywords().iter().any(|k| lower.contains(k)))
    }

    pub fn from_keyword(s: &str) -> Option<WeaponType> {
        let lower = s.trim().to_lowercase();
        WeaponType::ALL
            .into_iter()
            .find(|w| lower == w.as_str() || w.keywords().iter().any(|k| *k == lower))
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed tag vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Event,
    Equipment,
    Support,
    Character,
    Resonance,
    Weapon,
    Artifact,
    Talent,
    Technique,
    Legacy,
    Companion,
    Food,
    Item,
    Location,
    CombatAction,
    Heal,
    Shield,
}

impl Tag {
    pub const ALL: [Tag; 17] = [
        Tag::Event,
        Tag::Equipment,
        Tag::Support,
        Tag::Character,
        Tag::Resonance,
        Tag::Weapon,
        Tag::Artifact,
        Tag::Talent,
        Tag::Technique,
        Tag::Legacy,
        Tag::Companion,
        Tag::Food,
        Tag::Item,
        Tag::Location,
        Tag::CombatAction,
        Tag::Heal,
        Tag::Shield,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Event => "event",
            Tag::Equipment => "equipment",
            Tag::Support => "support",
            Tag::Character => "character",
            Tag::Resonance => "resonance",
            Tag::Weapon => "weapon",
            Tag::Artifact => "artifact",
            Tag::Talent => "talent",
            Tag::Technique => "technique",
            Tag::Legacy => "legacy",
            Tag::Companion => "companion",
            Tag::Food => "food",
            Tag::Item => "item",
            Tag::Location => "location",
            Tag::CombatAction => "combat_action",
            Tag::Heal => "heal",
            Tag::Shield => "shield",
        }
    }

    pub fn zh(self) -> &'static str {
        match self {
            Tag::Event => "事件牌",
            Tag::Equipment => "装备牌",
            Tag::Support => "支援牌",
            Tag::Character => "角色牌",
            Tag::Resonance => "元素共鸣",
            Tag::Weapon => "武器",
            Tag::Artifact => "圣遗物",
            Tag::Talent => "天赋",
            Tag::Technique => "特技",
            Tag::Legacy => "秘传",
            Tag::Companion => "伙伴",
            Tag::Food => "料理",
            Tag::Item => "道具",
            Tag::Location => "场地",
            Tag::CombatAction => "战斗行动",
            Tag::Heal => "治疗",
            Tag::Shield => "护盾",
        }
    }

    /// English phrase matched against free text
    fn english(self) -> &'static str {
        match self {
            Tag::Event => "event card",
            Tag::Equipment => "equipment",
            Tag::Support => "support card",
            Tag::Character => "character card",
            Tag::Resonance => "resonance",
            Tag::Weapon => "weapon",
            Tag::Artifact => "artifact",
            Tag::Talent => "talent",
            Tag::Technique => "technique",
            Tag::Legacy => "legacy",
            Tag::Companion => "companion",
            Tag::Food => "food",
            Tag::Item => "item",
            Tag::Location => "location",
            Tag::CombatAction => "combat action",
            Tag::Heal => "heal",
            Tag::Shield => "shield",
        }
    }

    /// Whether the tag's keyword occurs in `text` (either language)
    pub fn occurs_in(self, text: &str) -> bool {
        text.contains(self.zh()) || text.to_lowercase().contains(self.english())
    }

    /// All vocabulary tags whose keywords occur in `text`
    pub fn scan(text: &str) -> impl Iterator<Item = Tag> + '_ {
        Tag::ALL.into_iter().filter(move |t| t.occurs_in(text))
    }

    pub fn from_keyword(s: &str) -> Option<Tag> {
        let s = s.trim();
        let lower = s.to_lowercase();
        Tag::ALL
            .into_iter()
            .find(|t| lower == t.as_str() || s == t.zh() || lower == t.english())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
