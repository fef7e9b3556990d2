//! Player actions and their handlers
//!
//! Each handler checks its preconditions on the state it is given and
//! mutates it only after every check has passed. The engine runs handlers on
//! a clone, so an error anywhere leaves the committed duel untouched.

use crate::core::{
    CardDef, CardId, CardType, Cost, CostAtom, DamageType, DiceKind, EffectTrigger, SkillType,
    StatusKind, StatusTarget, Tag,
};
use crate::game::character::apply_status;
use crate::game::cost_engine;
use crate::game::damage::{self, DamageEvent};
use crate::game::phase::Phase;
use crate::game::state::{DuelState, SummonInstance, SupportSlot};
use crate::{Result, TcgError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An action submitted by a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Mulligan: send these hand cards to the bottom of the deck and redraw
    ReplaceCards {
        #[serde(default)]
        card_ids: Vec<CardId>,
    },

    /// Roll phase: re-roll the dice at these pool indices once
    Reroll {
        #[serde(default)]
        indices: Vec<usize>,
    },

    /// Use a skill of the active character
    UseSkill { skill_id: String },

    /// Play a card from hand
    PlayCard {
        card_id: CardId,
        /// Character slot for equipment and food; defaults to the active one
        #[serde(default)]
        target: Option<usize>,
        /// Support slot to discard when the support zone is full
        #[serde(default)]
        replace_support: Option<usize>,
    },

    /// Make another character active
    SwitchCharacter { index: usize },

    /// Discard a hand card to turn one die into the active element
    ElementalTuning { card_id: CardId, die: DiceKind },

    /// End the mulligan, the reroll, or the round
    Pass,
}

/// Discriminant of an action, used by the dispatch table and the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ReplaceCards,
    Reroll,
    UseSkill,
    PlayCard,
    SwitchCharacter,
    ElementalTuning,
    Pass,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::ReplaceCards => "replace_cards",
            ActionKind::Reroll => "reroll",
            ActionKind::UseSkill => "use_skill",
            ActionKind::PlayCard => "play_card",
            ActionKind::SwitchCharacter => "switch_character",
            ActionKind::ElementalTuning => "elemental_tuning",
            ActionKind::Pass => "pass",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ReplaceCards { .. } => ActionKind::ReplaceCards,
            Action::Reroll { .. } => ActionKind::Reroll,
            Action::UseSkill { .. } => ActionKind::UseSkill,
            Action::PlayCard { .. } => ActionKind::PlayCard,
            Action::SwitchCharacter { .. } => ActionKind::SwitchCharacter,
            Action::ElementalTuning { .. } => ActionKind::ElementalTuning,
            Action::Pass => ActionKind::Pass,
        }
    }
}

/// How an accepted action affects turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSpeed {
    /// Hands the turn to the opponent
    Combat,
    /// The acting player keeps the turn
    Quick,
    /// Passed for the round
    Pass,
    /// Mulligan or reroll step finished
    Setup,
}

pub type Handler = fn(&mut DuelState, usize, &Action) -> Result<ActionSpeed>;

/// Dispatch table from (phase, action kind) to handler. Combinations without
/// an entry are illegal in that phase.
pub fn handler_for(phase: Phase, kind: ActionKind) -> Option<Handler> {
    let handler: Handler = match (phase, kind) {
        (Phase::Mulligan, ActionKind::ReplaceCards) => replace_cards,
        (Phase::Mulligan, ActionKind::Pass) => keep_hand,
        (Phase::Roll, ActionKind::Reroll) => reroll,
        (Phase::Roll, ActionKind::Pass) => keep_dice,
        (Phase::Action, ActionKind::UseSkill) => use_skill,
        (Phase::Action, ActionKind::PlayCard) => play_card,
        (Phase::Action, ActionKind::SwitchCharacter) => switch_character,
        (Phase::Action, ActionKind::ElementalTuning) => elemental_tuning,
        (Phase::Action, ActionKind::Pass) => pass_round,
        _ => return None,
    };
    Some(handler)
}

fn mismatch(expected: ActionKind, action: &Action) -> TcgError {
    TcgError::Invariant(format!(
        "{expected} handler received a {} action",
        action.kind()
    ))
}

fn replace_cards(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::ReplaceCards { card_ids } = action else {
        return Err(mismatch(ActionKind::ReplaceCards, action));
    };
    let player = state.player(side);
    if player.flags.initial_mulligan_done {
        return Err(TcgError::IllegalAction(
            "the opening hand was already replaced".to_string(),
        ));
    }

    // Resolve every id first; repeated ids pick further copies
    let mut remaining: Vec<Option<&Arc<CardDef>>> = player.hand.iter().map(Some).collect();
    let mut positions = Vec::with_capacity(card_ids.len());
    for id in card_ids {
        let pos = remaining
            .iter()
            .position(|c| c.is_some_and(|c| &c.id == id))
            .ok_or_else(|| TcgError::IllegalAction(format!("card {id} is not in hand")))?;
        remaining[pos] = None;
        positions.push(pos);
    }

    let player = state.player_mut(side);
    positions.sort_unstable_by(|a, b| b.cmp(a));
    let mut returned = Vec::with_capacity(positions.len());
    for pos in positions {
        returned.push(player.hand.remove(pos));
    }
    player.deck.extend(returned.into_iter().rev());
    player.flags.initial_mulligan_done = true;
    let count = card_ids.len();
    state.draw(side, count);
    log_if_verbose!(state, "player {side} replaces {count} card(s)");
    Ok(ActionSpeed::Setup)
}

fn keep_hand(state: &mut DuelState, side: usize, _action: &Action) -> Result<ActionSpeed> {
    replace_cards(state, side, &Action::ReplaceCards { card_ids: Vec::new() })
}

fn reroll(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::Reroll { indices } = action else {
        return Err(mismatch(ActionKind::Reroll, action));
    };
    if state.player(side).flags.reroll_consumed {
        return Err(TcgError::IllegalAction(
            "dice were already re-rolled this round".to_string(),
        ));
    }
    let p = state.config.omni_probability;
    let DuelState { players, rng, .. } = state;
    players[side].dice.reroll(rng, indices, p)?;
    players[side].flags.reroll_consumed = true;
    #[cfg(feature = "verbose-logging")]
    state
        .logger
        .verbose(&format!("player {side} dice: {}", state.players[side].dice));
    Ok(ActionSpeed::Setup)
}

fn keep_dice(state: &mut DuelState, side: usize, _action: &Action) -> Result<ActionSpeed> {
    reroll(state, side, &Action::Reroll { indices: Vec::new() })
}

fn use_skill(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::UseSkill { skill_id } = action else {
        return Err(mismatch(ActionKind::UseSkill, action));
    };
    let player = state.player(side);
    let active = player.active();
    let skill = active.def.skill(skill_id).cloned().ok_or_else(|| {
        TcgError::IllegalAction(format!("{} has no skill {skill_id}", active.name()))
    })?;

    // Check usability
    if !skill.is_usable() {
        return Err(TcgError::IllegalAction(format!(
            "{} is a passive skill",
            skill.name
        )));
    }
    if active.has_status(StatusKind::Frozen) {
        return Err(TcgError::IllegalAction(format!(
            "{} is frozen",
            active.name()
        )));
    }
    if skill.skill_type == SkillType::ElementalBurst && active.energy < active.energy_max {
        return Err(TcgError::UnpayableCost(format!(
            "{} needs {} energy for {}, has {}",
            active.name(),
            active.energy_max,
            skill.name,
            active.energy
        )));
    }
    let heavy = skill.skill_type == SkillType::NormalAttack && player.dice.len() % 2 == 0;
    let element = active.element();
    let bonus = active.equipment_bonus();
    let actor_name = active.name().to_string();

    // Pay
    let player = state.player_mut(side);
    let mut energy = player.active().energy;
    cost_engine::pay(&skill.cost, &mut player.dice, element, &mut energy)?;

    let effect = &skill.effect;
    let active = player.active_mut();
    active.energy = energy;
    if skill.skill_type.charges_energy() {
        active.gain_energy(1);
    } else if skill.skill_type == SkillType::ElementalBurst {
        active.energy = 0;
    }
    match effect.self_energy_delta {
        d if d > 0 => active.gain_energy(d.unsigned_abs()),
        d if d < 0 => active.energy = active.energy.saturating_sub(d.unsigned_abs()),
        _ => {}
    }
    active.shield = active.shield.saturating_add(effect.shield);
    active.heal(effect.heal);

    log_if_verbose!(state, "{actor_name} uses {}", skill.name);

    if let Some(status) = &effect.status_applied {
        match status.target {
            StatusTarget::SelfCharacter => {
                apply_status(&mut state.player_mut(side).active_mut().statuses, status)
            }
            StatusTarget::Team => apply_status(&mut state.player_mut(side).team_statuses, status),
            StatusTarget::EnemyActive => apply_status(
                &mut state
                    .player_mut(DuelState::other(side))
                    .active_mut()
                    .statuses,
                status,
            ),
        }
    }

    if let Some(spec) = &effect.summon {
        let max = state.config.max_summons;
        let summons = &mut state.player_mut(side).summons;
        match summons.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => existing.usages = spec.usages,
            None => {
                if summons.len() >= max {
                    summons.remove(0);
                }
                summons.push(SummonInstance::from(spec));
            }
        }
    }

    if effect.damage > 0 || effect.element_application.is_some() {
        let damage_type = match (effect.damage_type, effect.element_application) {
            (DamageType::Physical, Some(e)) if effect.damage == 0 => DamageType::Elemental(e),
            (dt, _) => dt,
        };
        let amount = if effect.damage > 0 {
            effect.damage.saturating_add(bonus)
        } else {
            0
        };
        let mut event = DamageEvent::at_enemy_active(state, side, amount, damage_type, &skill.name);
        event.heavy = heavy;
        event.from_skill = true;
        damage::resolve(state, event);
    }
    Ok(ActionSpeed::Combat)
}

fn play_card(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::PlayCard {
        card_id,
        target,
        replace_support,
    } = action
    else {
        return Err(mismatch(ActionKind::PlayCard, action));
    };
    let player = state.player(side);
    let pos = player
        .hand_position(card_id)
        .ok_or_else(|| TcgError::IllegalAction(format!("card {card_id} is not in hand")))?;
    let card = Arc::clone(&player.hand[pos]);
    let slot = target.unwrap_or(player.active_character_index);
    let character = player.characters.get(slot).ok_or_else(|| {
        TcgError::InvalidPayload(format!("character slot {slot} does not exist"))
    })?;
    if !character.alive {
        return Err(TcgError::IllegalAction(format!(
            "{} is defeated",
            character.name()
        )));
    }

    // Card-type checks; nothing is mutated until the cost is paid
    let speed = match card.card_type {
        CardType::Character => {
            return Err(TcgError::IllegalAction(format!(
                "{} is a character card",
                card.name
            )))
        }
        CardType::Talent => {
            if slot != player.active_character_index
                || player.active().def.name.as_str() != card.character_subtype
            {
                return Err(TcgError::IllegalAction(format!(
                    "{} requires {} to be active",
                    card.name, card.character_subtype
                )));
            }
            ActionSpeed::Combat
        }
        CardType::Weapon => {
            if let (Some(wanted), Some(held)) = (card.weapon_type, character.def.weapon_type) {
                if wanted != held {
                    return Err(TcgError::IllegalAction(format!(
                        "{} cannot wield a {wanted}",
                        character.name()
                    )));
                }
            }
            ActionSpeed::Combat
        }
        CardType::Artifact => ActionSpeed::Combat,
        CardType::Support => {
            if player.supports.len() >= state.config.max_supports {
                match replace_support {
                    Some(i) if *i < player.supports.len() => {}
                    _ => {
                        return Err(TcgError::IllegalAction(
                            "support zone is full; choose a support to replace".to_string(),
                        ))
                    }
                }
            }
            ActionSpeed::Quick
        }
        CardType::Event => {
            if card.has_tag(Tag::Legacy) && player.flags.legacy_used_this_duel {
                return Err(TcgError::IllegalAction(
                    "a legacy card was already played this duel".to_string(),
                ));
            }
            if card.has_tag(Tag::Food) && character.has_full_stomach {
                return Err(TcgError::IllegalAction(format!(
                    "{} is full",
                    character.name()
                )));
            }
            if card.has_tag(Tag::CombatAction) {
                ActionSpeed::Combat
            } else {
                ActionSpeed::Quick
            }
        }
    };

    // Pay
    let element = player.active().element();
    let player = state.player_mut(side);
    let mut energy = player.active().energy;
    cost_engine::pay(&card.cost, &mut player.dice, element, &mut energy)?;
    player.active_mut().energy = energy;
    player.hand.remove(pos);

    log_if_verbose!(state, "player {side} plays {}", card.name);

    let max_supports = state.config.max_supports;
    let player = state.player_mut(side);
    match card.card_type {
        CardType::Weapon | CardType::Artifact | CardType::Talent => {
            let holder = &mut player.characters[slot];
            let equipped = match card.card_type {
                CardType::Weapon => &mut holder.weapon,
                CardType::Artifact => &mut holder.artifact,
                _ => &mut holder.talent,
            };
            if let Some(old) = equipped.replace(Arc::clone(&card)) {
                player.discard_pile.push(old);
            }
            apply_card_effect(state, side, slot, &card);
        }
        CardType::Support => {
            if player.supports.len() >= max_supports {
                if let Some(i) = replace_support {
                    let old = player.supports.remove(*i);
                    player.discard_pile.push(old.def);
                }
            }
            player.supports.push(SupportSlot {
                def: Arc::clone(&card),
                usages: card.effect.usages,
            });
            if card.effect.trigger == EffectTrigger::OnPlay {
                apply_card_effect(state, side, slot, &card);
            }
        }
        CardType::Event => {
            if card.has_tag(Tag::Legacy) {
                player.flags.legacy_used_this_duel = true;
            }
            if card.has_tag(Tag::Food) {
                player.characters[slot].has_full_stomach = true;
                player.flags.food_played_this_round = true;
            }
            player.discard_pile.push(Arc::clone(&card));
            apply_card_effect(state, side, slot, &card);
        }
        CardType::Character => {}
    }
    Ok(speed)
}

/// Apply the immediate part of a card effect for `side`, centred on the
/// character in `slot`. Equipment damage bonuses are read at skill time.
pub(crate) fn apply_card_effect(state: &mut DuelState, side: usize, slot: usize, card: &CardDef) {
    let effect = &card.effect;
    let player = state.player_mut(side);
    let character = &mut player.characters[slot];
    if character.alive {
        character.heal(effect.heal);
        character.shield = character.shield.saturating_add(effect.shield);
        character.gain_energy(effect.energy);
        if effect.survive_once {
            character.survive_once = true;
        }
    }
    for _ in 0..effect.omni_dice {
        player.dice.add(DiceKind::Omni);
    }
    if effect.draw > 0 {
        state.draw(side, effect.draw as usize);
    }
    if effect.damage > 0 {
        let event = DamageEvent::at_enemy_active(
            state,
            side,
            effect.damage,
            effect.damage_type,
            card.name.as_str(),
        );
        damage::resolve(state, event);
    }
}

fn switch_character(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::SwitchCharacter { index } = action else {
        return Err(mismatch(ActionKind::SwitchCharacter, action));
    };
    let index = *index;
    let player = state.player(side);
    let target = player.characters.get(index).ok_or_else(|| {
        TcgError::InvalidPayload(format!("character slot {index} does not exist"))
    })?;
    if index == player.active_character_index {
        return Err(TcgError::IllegalAction(format!(
            "{} is already active",
            target.name()
        )));
    }
    if !target.alive {
        return Err(TcgError::IllegalAction(format!(
            "{} is defeated",
            target.name()
        )));
    }

    let cost = Cost::from_atoms(
        std::iter::repeat(CostAtom::Unaligned).take(state.config.switch_cost as usize),
    );
    let element = player.active().element();
    let player = state.player_mut(side);
    let mut energy = player.active().energy;
    cost_engine::pay(&cost, &mut player.dice, element, &mut energy)?;
    player.active_character_index = index;
    log_if_verbose!(
        state,
        "player {side} switches to {}",
        state.player(side).active().name()
    );
    Ok(ActionSpeed::Combat)
}

/// Free out-of-turn choice of a new active character after a knockout
pub(crate) fn choose_active(state: &mut DuelState, side: usize, index: usize) -> Result<()> {
    let player = state.player(side);
    let target = player.characters.get(index).ok_or_else(|| {
        TcgError::InvalidPayload(format!("character slot {index} does not exist"))
    })?;
    if !target.alive {
        return Err(TcgError::IllegalAction(format!(
            "{} is defeated",
            target.name()
        )));
    }
    let player = state.player_mut(side);
    player.active_character_index = index;
    player.flags.must_choose_active = false;
    log_if_verbose!(
        state,
        "player {side} chooses {} as active character",
        state.player(side).active().name()
    );
    Ok(())
}

fn elemental_tuning(state: &mut DuelState, side: usize, action: &Action) -> Result<ActionSpeed> {
    let Action::ElementalTuning { card_id, die } = action else {
        return Err(mismatch(ActionKind::ElementalTuning, action));
    };
    let player = state.player(side);
    if player.flags.used_tuning_this_round {
        return Err(TcgError::IllegalAction(
            "elemental tuning was already used this round".to_string(),
        ));
    }
    let pos = player
        .hand_position(card_id)
        .ok_or_else(|| TcgError::IllegalAction(format!("card {card_id} is not in hand")))?;
    let element = player.active().element().ok_or_else(|| {
        TcgError::IllegalAction(format!(
            "{} has no element to tune into",
            player.active().name()
        ))
    })?;
    let wanted = DiceKind::from(element);
    if die.is_omni() || *die == wanted {
        return Err(TcgError::IllegalAction(format!(
            "cannot tune a {die:?} die into {element}"
        )));
    }
    if player.dice.count(*die) == 0 {
        return Err(TcgError::UnpayableCost(format!("no {die:?} die to tune")));
    }

    let player = state.player_mut(side);
    player.dice.remove(*die);
    player.dice.add(wanted);
    let card = player.hand.remove(pos);
    player.discard_pile.push(card);
    player.flags.used_tuning_this_round = true;
    log_if_verbose!(state, "player {side} tunes a {die:?} die into {element}");
    Ok(ActionSpeed::Quick)
}

fn pass_round(state: &mut DuelState, side: usize, _action: &Action) -> Result<ActionSpeed> {
    state.player_mut(side).flags.passed = true;
    if state.next_first_player.is_none() {
        state.next_first_player = Some(side);
    }
    log_if_verbose!(state, "player {side} passes");
    Ok(ActionSpeed::Pass)
}
