//! Cost atoms and card/skill costs
//!
//! A cost is stored expanded: `{type: 冰, value: 3}` becomes three `Specific(Cryo)`
//! atoms. `Cost::groups` recovers the grouped view used by catalog filters.

use crate::core::Element;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// One unit of a cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostAtom {
    /// Only a die of this element (or omni)
    Specific(Element),
    /// A die of the active character's element (or omni)
    Same,
    /// Any die
    Unaligned,
    /// Only an omni die
    Omni,
    /// One point of the active character's energy
    Energy,
}

impl CostAtom {
    /// Parse a raw cost type string from the catalog dump.
    ///
    /// Returns `None` for anything outside the enumerated kinds; the ingestor
    /// rejects such records.
    pub fn from_keyword(s: &str) -> Option<CostAtom> {
        let trimmed = s.trim();
        if let Some(e) = Element::from_keyword(trimmed) {
            return Some(CostAtom::Specific(e));
        }
        match trimmed.to_lowercase().as_str() {
            "same" | "相同" | "同色" | "相同元素" => Some(CostAtom::Same),
            "unaligned" | "any" | "crystal" | "无色" | "任意" | "任意元素" => {
                Some(CostAtom::Unaligned)
            }
            "omni" | "万能" | "万能元素" => Some(CostAtom::Omni),
            "energy" | "充能" => Some(CostAtom::Energy),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CostAtom::Specific(e) => e.as_str(),
            CostAtom::Same => "same",
            CostAtom::Unaligned => "unaligned",
            CostAtom::Omni => "omni",
            CostAtom::Energy => "energy",
        }
    }

    pub fn is_dice(self) -> bool {
        self != CostAtom::Energy
    }
}

impl fmt::Display for CostAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CostAtom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CostAtom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CostAtom::from_keyword(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown cost atom '{s}'")))
    }
}

/// Ordered sequence of cost atoms
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost {
    atoms: SmallVec<[CostAtom; 4]>,
}

impl Cost {
    pub fn new() -> Self {
        Cost::default()
    }

    pub fn from_atoms(atoms: impl IntoIterator<Item = CostAtom>) -> Self {
        Cost {
            atoms: atoms.into_iter().collect(),
        }
    }

    /// Append `count` copies of `atom`
    pub fn push_group(&mut self, atom: CostAtom, count: u8) {
        for _ in 0..count {
            self.atoms.push(atom);
        }
    }

    /// Parse a compact cost string like "3cryo", "1same 2unaligned" or "3energy".
    ///
    /// Tokens are `<count><kind>` separated by whitespace or commas; a missing
    /// count means one.
    pub fn parse(s: &str) -> Option<Cost> {
        let mut cost = Cost::new();
        for token in s.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
            let rest = &token[digits.len()..];
            let count = if digits.is_empty() {
                1
            } else {
                digits.parse().ok()?
            };
            cost.push_group(CostAtom::from_keyword(rest)?, count);
        }
        Some(cost)
    }

    pub fn atoms(&self) -> &[CostAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Number of dice the cost needs, ignoring energy
    pub fn dice_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_dice()).count()
    }

    pub fn energy_count(&self) -> u8 {
        self.atoms.iter().filter(|a| **a == CostAtom::Energy).count() as u8
    }

    /// Grouped view: consecutive equal atoms merged with their count
    pub fn groups(&self) -> Vec<(CostAtom, u8)> {
        let mut groups: Vec<(CostAtom, u8)> = Vec::new();
        for atom in &self.atoms {
            match groups.last_mut() {
                Some((last, n)) if last == atom => *n += 1,
                _ => groups.push((*atom, 1)),
            }
        }
        groups
    }

    /// First specific element mentioned by the cost, if any
    pub fn first_element(&self) -> Option<Element> {
        self.atoms.iter().find_map(|a| match a {
            CostAtom::Specific(e) => Some(*e),
            _ => None,
        })
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.atoms.is_empty() {
            return f.write_str("free");
        }
        let parts: Vec<String> = self
            .groups()
            .into_iter()
            .map(|(atom, n)| format!("{n}{atom}"))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_parsing() {
        let cost = Cost::parse("3cryo").unwrap();
        assert_eq!(cost.len(), 3);
        assert_eq!(cost.first_element(), Some(Element::Cryo));

        let cost2 = Cost::parse("1same, 2unaligned").unwrap();
        assert_eq!(cost2.dice_count(), 3);
        assert_eq!(cost2.groups(), vec![(CostAtom::Same, 1), (CostAtom::Unaligned, 2)]);

        let burst = Cost::parse("3pyro 2energy").unwrap();
        assert_eq!(burst.energy_count(), 2);
        assert_eq!(burst.dice_count(), 3);

        assert!(Cost::parse("2mana").is_none());
    }

    #[test]
    fn test_chinese_keywords() {
        assert_eq!(CostAtom::from_keyword("无色"), Some(CostAtom::Unaligned));
        assert_eq!(CostAtom::from_keyword("充能"), Some(CostAtom::Energy));
        assert_eq!(CostAtom::from_keyword("万能"), Some(CostAtom::Omni));
        assert_eq!(CostAtom::from_keyword("雷"), Some(CostAtom::Specific(Element::Electro)));
        assert_eq!(CostAtom::from_keyword("其他"), None);
    }

    #[test]
    fn test_cost_display_and_serde() {
        let cost = Cost::parse("2hydro 1unaligned").unwrap();
        assert_eq!(cost.to_string(), "2hydro 1unaligned");
        let json = serde_json::to_string(&cost).unwrap();
        assert_eq!(json, r#"["hydro","hydro","unaligned"]"#);
        let back: Cost = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cost);
        assert_eq!(Cost::new().to_string(), "free");
    }
}
