//! Elements, dice kinds and card element descriptors

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The seven elements of the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Cryo,
    Hydro,
    Pyro,
    Electro,
    Anemo,
    Geo,
    Dendro,
}

impl Element {
    pub const ALL: [Element; 7] = [
        Element::Cryo,
        Element::Hydro,
        Element::Pyro,
        Element::Electro,
        Element::Anemo,
        Element::Geo,
        Element::Dendro,
    ];

    /// Whether this element can remain on a character as an aura.
    /// Anemo and geo never stick.
    pub fn can_attach(self) -> bool {
        !matches!(self, Element::Anemo | Element::Geo)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Element::Cryo => "cryo",
            Element::Hydro => "hydro",
            Element::Pyro => "pyro",
            Element::Electro => "electro",
            Element::Anemo => "anemo",
            Element::Geo => "geo",
            Element::Dendro => "dendro",
        }
    }

    /// Single-character Chinese name used by the scraped catalog
    pub fn zh(self) -> &'static str {
        match self {
            Element::Cryo => "冰",
            Element::Hydro => "水",
            Element::Pyro => "火",
            Element::Electro => "雷",
            Element::Anemo => "风",
            Element::Geo => "岩",
            Element::Dendro => "草",
        }
    }

    /// Parse an exact element keyword in either language
    pub fn from_keyword(s: &str) -> Option<Element> {
        let s = s.trim();
        let lower = s.to_lowercase();
        Element::ALL
            .into_iter()
            .find(|e| lower == e.as_str() || s == e.zh() || s == format!("{}元素", e.zh()))
    }

    /// Find the first element mentioned anywhere in a piece of text.
    ///
    /// Recognises English element names, the Chinese glyphs, and the flavour
    /// words used by resonance card names ("Shattering Ice", "Fervent Flames").
    pub fn find_in(text: &str) -> Option<Element> {
        let lower = text.to_lowercase();
        for e in Element::ALL {
            if lower.contains(e.as_str()) {
                return Some(e);
            }
        }
        const FLAVOUR: &[(&str, Element)] = &[
            ("ice", Element::Cryo),
            ("water", Element::Hydro),
            ("flame", Element::Pyro),
            ("thunder", Element::Electro),
            ("voltage", Element::Electro),
            ("wind", Element::Anemo),
            ("rock", Element::Geo),
            ("stone", Element::Geo),
            ("green", Element::Dendro),
            ("weed", Element::Dendro),
        ];
        for (word, e) in FLAVOUR {
            if lower.contains(word) {
                return Some(*e);
            }
        }
        Element::ALL.into_iter().find(|e| text.contains(e.zh()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Element::Cryo => "Cryo",
            Element::Hydro => "Hydro",
            Element::Pyro => "Pyro",
            Element::Electro => "Electro",
            Element::Anemo => "Anemo",
            Element::Geo => "Geo",
            Element::Dendro => "Dendro",
        };
        f.write_str(s)
    }
}

/// Element descriptor printed on a card.
///
/// Characters can also be physical or one of the two anomaly kinds, none of
/// which have dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardElement {
    Elemental(Element),
    Physical,
    AnomalyWild,
    AnomalyBloom,
}

impl CardElement {
    pub fn as_str(self) -> &'static str {
        match self {
            CardElement::Elemental(e) => e.as_str(),
            CardElement::Physical => "physical",
            CardElement::AnomalyWild => "anomaly-wild",
            CardElement::AnomalyBloom => "anomaly-bloom",
        }
    }

    pub fn from_keyword(s: &str) -> Option<CardElement> {
        if let Some(e) = Element::from_keyword(s) {
            return Some(CardElement::Elemental(e));
        }
        match s.trim().to_lowercase().as_str() {
            "physical" | "物理" => Some(CardElement::Physical),
            "anomaly-wild" | "anomaly_wild" | "荒性" => Some(CardElement::AnomalyWild),
            "anomaly-bloom" | "anomaly_bloom" | "芒性" => Some(CardElement::AnomalyBloom),
            _ => None,
        }
    }

    pub fn element(self) -> Option<Element> {
        match self {
            CardElement::Elemental(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for CardElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CardElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CardElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CardElement::from_keyword(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown card element '{s}'")))
    }
}

/// Face of a single die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceKind {
    Omni,
    Cryo,
    Hydro,
    Pyro,
    Electro,
    Anemo,
    Geo,
    Dendro,
}

impl DiceKind {
    /// Canonical pool order: omni first, then elements in `Element::ALL` order
    pub const ALL: [DiceKind; 8] = [
        DiceKind::Omni,
        DiceKind::Cryo,
        DiceKind::Hydro,
        DiceKind::Pyro,
        DiceKind::Electro,
        DiceKind::Anemo,
        DiceKind::Geo,
        DiceKind::Dendro,
    ];

    pub fn is_omni(self) -> bool {
        self == DiceKind::Omni
    }

    pub fn element(self) -> Option<Element> {
        match self {
            DiceKind::Omni => None,
            DiceKind::Cryo => Some(Element::Cryo),
            DiceKind::Hydro => Some(Element::Hydro),
            DiceKind::Pyro => Some(Element::Pyro),
            DiceKind::Electro => Some(Element::Electro),
            DiceKind::Anemo => Some(Element::Anemo),
            DiceKind::Geo => Some(Element::Geo),
            DiceKind::Dendro => Some(Element::Dendro),
        }
    }

    /// Index into a `[u8; 8]` count table
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Element> for DiceKind {
    fn from(e: Element) -> Self {
        match e {
            Element::Cryo => DiceKind::Cryo,
            Element::Hydro => DiceKind::Hydro,
            Element::Pyro => DiceKind::Pyro,
            Element::Electro => DiceKind::Electro,
            Element::Anemo => DiceKind::Anemo,
            Element::Geo => DiceKind::Geo,
            Element::Dendro => DiceKind::Dendro,
        }
    }
}

impl fmt::Display for DiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element() {
            Some(e) => write!(f, "{e}"),
            None => f.write_str("Omni"),
        }
    }
}
