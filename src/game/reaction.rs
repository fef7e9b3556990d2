//! Elemental reaction table

use crate::core::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Vaporize,
    Melt,
    Overloaded,
    ElectroCharged,
    Superconduct,
    Frozen,
    Burning,
    Bloom,
    Quicken,
    /// Anemo on an aura; carries the swirled element
    Swirl(Element),
    /// Geo on an aura; carries the crystallized element
    Crystallize(Element),
}

impl Reaction {
    /// Reaction of an incoming element on an existing aura
    pub fn between(aura: Element, incoming: Element) -> Option<Reaction> {
        use Element::*;
        match (aura, incoming) {
            (Hydro, Pyro) | (Pyro, Hydro) => Some(Reaction::Vaporize),
            (Cryo, Pyro) | (Pyro, Cryo) => Some(Reaction::Melt),
            (Electro, Pyro) | (Pyro, Electro) => Some(Reaction::Overloaded),
            (Electro, Hydro) | (Hydro, Electro) => Some(Reaction::ElectroCharged),
            (Electro, Cryo) | (Cryo, Electro) => Some(Reaction::Superconduct),
            (Hydro, Cryo) | (Cryo, Hydro) => Some(Reaction::Frozen),
            (Dendro, Pyro) | (Pyro, Dendro) => Some(Reaction::Burning),
            (Dendro, Hydro) | (Hydro, Dendro) => Some(Reaction::Bloom),
            (Dendro, Electro) | (Electro, Dendro) => Some(Reaction::Quicken),
            (Cryo | Hydro | Pyro | Electro, Anemo) => Some(Reaction::Swirl(aura)),
            (Cryo | Hydro | Pyro | Electro, Geo) => Some(Reaction::Crystallize(aura)),
            _ => None,
        }
    }

    /// Damage after the reaction modifier
    pub fn modify(self, damage: u8) -> u8 {
        match self {
            Reaction::Vaporize | Reaction::Melt => damage.saturating_mul(2),
            Reaction::Overloaded => damage.saturating_add(2),
            Reaction::ElectroCharged
            | Reaction::Superconduct
            | Reaction::Frozen
            | Reaction::Burning
            | Reaction::Bloom
            | Reaction::Quicken
            | Reaction::Crystallize(_) => damage.saturating_add(1),
            Reaction::Swirl(_) => damage,
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Vaporize => f.write_str("Vaporize"),
            Reaction::Melt => f.write_str("Melt"),
            Reaction::Overloaded => f.write_str("Overloaded"),
            Reaction::ElectroCharged => f.write_str("Electro-Charged"),
            Reaction::Superconduct => f.write_str("Superconduct"),
            Reaction::Frozen => f.write_str("Frozen"),
            Reaction::Burning => f.write_str("Burning"),
            Reaction::Bloom => f.write_str("Bloom"),
            Reaction::Quicken => f.write_str("Quicken"),
            Reaction::Swirl(e) => write!(f, "Swirl ({e})"),
            Reaction::Crystallize(e) => write!(f, "Crystallize ({e})"),
        }
    }
}
