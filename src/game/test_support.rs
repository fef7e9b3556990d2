//! Small synthetic duels for unit tests

use crate::config::EngineConfig;
use crate::core::{
    CardDef, CardElement, CardId, CardType, Cost, DamageType, DiceKind, DicePool, Element,
    PlayerId, SkillDef, SkillEffect, SkillType,
};
use crate::deck::DeckSpec;
use crate::game::engine;
use crate::game::phase::Phase;
use crate::game::state::DuelState;
use std::sync::Arc;

fn skill(
    card_id: &str,
    index: usize,
    name: &str,
    skill_type: SkillType,
    cost: &str,
    effect: SkillEffect,
) -> SkillDef {
    SkillDef {
        id: format!("{card_id}/{index}"),
        name: name.to_string(),
        skill_type,
        cost: Cost::parse(cost).unwrap(),
        description: String::new(),
        effect,
    }
}

pub fn character(id: &str, element: Element) -> Arc<CardDef> {
    let mut def = CardDef::new(
        CardId::new(id),
        format!("{element} Hero {id}"),
        CardType::Character,
    );
    def.element = Some(CardElement::Elemental(element));
    def.energy_max = Some(2);
    let elemental = DamageType::Elemental(element);
    def.skills = vec![
        skill(
            id,
            0,
            "Strike",
            SkillType::NormalAttack,
            "1same 2unaligned",
            SkillEffect::damage(2, DamageType::Physical),
        ),
        skill(
            id,
            1,
            "Art",
            SkillType::ElementalSkill,
            "3same",
            SkillEffect::damage(3, elemental),
        ),
        skill(
            id,
            2,
            "Finale",
            SkillType::ElementalBurst,
            "3same 2energy",
            SkillEffect::damage(4, elemental),
        ),
    ];
    Arc::new(def)
}

pub fn filler_actions(prefix: &str) -> Vec<Arc<CardDef>> {
    (0..15)
        .flat_map(|i| {
            let card = Arc::new(CardDef::new(
                CardId::new(format!("{prefix}-filler-{i}")),
                format!("Filler {prefix} {i}"),
                CardType::Event,
            ));
            [Arc::clone(&card), card]
        })
        .collect()
}

pub fn deck(prefix: &str, elements: [Element; 3]) -> DeckSpec {
    DeckSpec {
        characters: elements
            .iter()
            .enumerate()
            .map(|(i, e)| character(&format!("{prefix}{i}"), *e))
            .collect(),
        actions: filler_actions(prefix),
    }
}

/// Fresh duel in the mulligan phase with player 0 first
pub fn duel_with_elements(a: [Element; 3], b: [Element; 3]) -> DuelState {
    engine::create(
        EngineConfig::default(),
        [PlayerId::new("alice"), PlayerId::new("bob")],
        [deck("a", a), deck("b", b)],
        Some(0),
        7,
    )
    .unwrap()
}

/// Duel forced into the action phase with eight omni dice per side
pub fn action_phase_duel() -> DuelState {
    let mut state = duel_with_elements(
        [Element::Cryo, Element::Hydro, Element::Pyro],
        [Element::Electro, Element::Geo, Element::Dendro],
    );
    state.phase = Phase::Action;
    for player in &mut state.players {
        player.flags.initial_mulligan_done = true;
        player.flags.reroll_consumed = true;
        player.dice = DicePool::from_dice([DiceKind::Omni; 8]);
    }
    state
}
