//! Live characters and statuses inside a duel

use crate::core::{CardDef, Element, StatusKind, StatusPayload, StatusSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A status attached to a character or a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInstance {
    pub name: String,
    pub kind: StatusKind,
    /// Rounds left; decremented each end phase
    pub duration_rounds: Option<u8>,
    pub usages: Option<u8>,
    pub payload: StatusPayload,
}

impl StatusInstance {
    pub fn from_spec(spec: &StatusSpec) -> Self {
        StatusInstance {
            name: spec.name.clone(),
            kind: spec.kind,
            duration_rounds: spec.duration_rounds,
            usages: spec.usages,
            payload: spec.payload.clone(),
        }
    }

    /// Same identity: built-in kinds match by kind, named statuses by name
    pub fn same_as(&self, spec: &StatusSpec) -> bool {
        self.kind == spec.kind && (self.kind != StatusKind::Named || self.name == spec.name)
    }

    pub fn is_expired(&self) -> bool {
        self.duration_rounds == Some(0) || self.usages == Some(0)
    }

    /// Consume one usage; returns false when none were left
    pub fn consume(&mut self) -> bool {
        match self.usages {
            Some(0) => false,
            Some(n) => {
                self.usages = Some(n - 1);
                true
            }
            None => true,
        }
    }

    /// Damage bonus this status grants to an outgoing hit of `element`
    pub fn boost_for(&self, element: Option<Element>) -> u8 {
        match (&self.payload, element) {
            (StatusPayload::DamageBoost { amount, elements }, Some(e))
                if elements.is_empty() || elements.contains(&e) =>
            {
                *amount
            }
            _ => 0,
        }
    }
}

/// Add a status, refreshing an existing one of the same identity
pub fn apply_status(statuses: &mut Vec<StatusInstance>, spec: &StatusSpec) {
    let fresh = StatusInstance::from_spec(spec);
    match statuses.iter_mut().find(|s| s.same_as(spec)) {
        Some(existing) => *existing = fresh,
        None => statuses.push(fresh),
    }
}

/// Character state inside a duel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCharacter {
    pub def: Arc<CardDef>,
    pub health: u8,
    pub health_max: u8,
    pub energy: u8,
    pub energy_max: u8,
    pub alive: bool,
    /// Element attached to this character; never anemo or geo
    pub aura: Option<Element>,
    pub shield: u8,
    pub weapon: Option<Arc<CardDef>>,
    pub artifact: Option<Arc<CardDef>>,
    pub talent: Option<Arc<CardDef>>,
    pub statuses: Vec<StatusInstance>,
    /// Next lethal hit leaves 1 HP instead
    pub survive_once: bool,
    pub has_full_stomach: bool,
}

impl LiveCharacter {
    pub fn new(def: Arc<CardDef>) -> Self {
        let health_max = def.health();
        let energy_max = def.energy_capacity();
        LiveCharacter {
            def,
            health: health_max,
            health_max,
            energy: 0,
            energy_max,
            alive: true,
            aura: None,
            shield: 0,
            weapon: None,
            artifact: None,
            talent: None,
            statuses: Vec::new(),
            survive_once: false,
            has_full_stomach: false,
        }
    }

    pub fn name(&self) -> &str {
        self.def.name.as_str()
    }

    pub fn element(&self) -> Option<Element> {
        self.def.dice_element()
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.kind == kind)
    }

    /// Remove every status of `kind`; returns whether any was present
    pub fn remove_status(&mut self, kind: StatusKind) -> bool {
        let before = self.statuses.len();
        self.statuses.retain(|s| s.kind != kind);
        self.statuses.len() != before
    }

    /// Restore health up to the maximum; returns the amount healed
    pub fn heal(&mut self, amount: u8) -> u8 {
        if !self.alive {
            return 0;
        }
        let healed = amount.min(self.health_max - self.health);
        self.health += healed;
        healed
    }

    pub fn gain_energy(&mut self, amount: u8) {
        self.energy = self.energy.saturating_add(amount).min(self.energy_max);
    }

    /// Flat bonus from equipment on this character's skill damage
    pub fn equipment_bonus(&self) -> u8 {
        [&self.weapon, &self.artifact, &self.talent]
            .into_iter()
            .flatten()
            .map(|card| card.effect.damage_bonus)
            .sum()
    }

    /// Clear everything a knocked-out character carries. Returns the
    /// equipment cards it held, for the owner's discard pile.
    #[must_use]
    pub fn knock_out(&mut self) -> Vec<Arc<CardDef>> {
        self.health = 0;
        self.alive = false;
        self.energy = 0;
        self.aura = None;
        self.shield = 0;
        self.statuses.clear();
        self.survive_once = false;
        [self.weapon.take(), self.artifact.take(), self.talent.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardElement, CardId, CardType};

    fn ganyu() -> LiveCharacter {
        let mut def = CardDef::new(CardId::new("ganyu"), "Ganyu", CardType::Character);
        def.element = Some(CardElement::Elemental(Element::Cryo));
        def.energy_max = Some(3);
        LiveCharacter::new(Arc::new(def))
    }

    #[test]
    fn test_new_character() {
        let c = ganyu();
        assert_eq!(c.health, 10);
        assert_eq!(c.energy_max, 3);
        assert!(c.alive);
        assert_eq!(c.element(), Some(Element::Cryo));
    }

    #[test]
    fn test_heal_and_energy_caps() {
        let mut c = ganyu();
        c.health = 7;
        assert_eq!(c.heal(5), 3);
        assert_eq!(c.health, 10);
        c.gain_energy(9);
        assert_eq!(c.energy, 3);
    }

    #[test]
    fn test_status_refresh() {
        let mut statuses = Vec::new();
        apply_status(&mut statuses, &StatusSpec::burning());
        statuses[0].duration_rounds = Some(1);
        apply_status(&mut statuses, &StatusSpec::burning());
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].duration_rounds, Some(2));
        apply_status(&mut statuses, &StatusSpec::frozen());
        assert_eq!(statuses.len(), 2);
    }

    #[test]
    fn test_boost_matching() {
        let core = StatusInstance::from_spec(&StatusSpec::dendro_core());
        assert_eq!(core.boost_for(Some(Element::Pyro)), 2);
        assert_eq!(core.boost_for(Some(Element::Cryo)), 0);
        assert_eq!(core.boost_for(None), 0);
    }

    #[test]
    fn test_knock_out_clears() {
        let mut c = ganyu();
        c.aura = Some(Element::Hydro);
        c.statuses.push(StatusInstance::from_spec(&StatusSpec::frozen()));
        let bow = Arc::new(CardDef::new(CardId::new("bow"), "Raven Bow", CardType::Weapon));
        c.weapon = Some(Arc::clone(&bow));
        let dropped = c.knock_out();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, bow.id);
        assert!(c.weapon.is_none());
        assert!(!c.alive);
        assert_eq!(c.aura, None);
        assert!(c.statuses.is_empty());
        assert_eq!(c.heal(3), 0);
    }
}
