//! Damage pipeline
//!
//! Each hit resolves in a fixed order: base damage with team boosts, the
//! heavy-attack bonus, shield absorption, the elemental reaction, then health.
//! Reactions that spread damage push new hits onto the duel's reaction queue,
//! which drains before the triggering action finishes.

use crate::core::{DamageType, Element, StatusKind, StatusSpec};
use crate::game::character::apply_status;
use crate::game::reaction::Reaction;
use crate::game::state::DuelState;
use serde::{Deserialize, Serialize};

/// One hit (or heal) waiting to be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub source_side: usize,
    pub target_side: usize,
    pub target_slot: usize,
    pub amount: u8,
    pub damage_type: DamageType,
    /// Normal attack started with an even dice count
    pub heavy: bool,
    /// Dealt by a character skill; only these consume team damage boosts
    pub from_skill: bool,
    /// Narration label (skill, summon or status name)
    pub source: String,
}

impl DamageEvent {
    pub fn new(
        source_side: usize,
        target_side: usize,
        target_slot: usize,
        amount: u8,
        damage_type: DamageType,
        source: impl Into<String>,
    ) -> Self {
        DamageEvent {
            source_side,
            target_side,
            target_slot,
            amount,
            damage_type,
            heavy: false,
            from_skill: false,
            source: source.into(),
        }
    }

    /// Hit on the opposing side's active character
    pub fn at_enemy_active(
        state: &DuelState,
        source_side: usize,
        amount: u8,
        damage_type: DamageType,
        source: impl Into<String>,
    ) -> Self {
        let target_side = DuelState::other(source_side);
        let slot = state.player(target_side).active_character_index;
        DamageEvent::new(source_side, target_side, slot, amount, damage_type, source)
    }
}

/// What one resolved hit did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    pub target_side: usize,
    pub target_slot: usize,
    pub dealt: u8,
    pub absorbed: u8,
    pub healed: u8,
    pub reaction: Option<Reaction>,
    pub knocked_out: bool,
}

/// Resolve `event` and every hit it spawns. Stops early when the duel ends.
pub fn resolve(state: &mut DuelState, event: DamageEvent) -> Vec<DamageOutcome> {
    state.reaction_queue.push_back(event);
    let mut outcomes = Vec::new();
    while let Some(next) = state.reaction_queue.pop_front() {
        if !state.terminal.is_running() {
            state.reaction_queue.clear();
            break;
        }
        outcomes.push(apply(state, next));
        if state.check_victory() {
            break;
        }
    }
    outcomes
}

/// Enemies of `target_side` other than `except`, still alive
fn bystanders(state: &DuelState, target_side: usize, except: usize) -> Vec<usize> {
    state
        .player(target_side)
        .characters
        .iter()
        .enumerate()
        .filter(|(slot, c)| *slot != except && c.alive)
        .map(|(slot, _)| slot)
        .collect()
}

fn apply(state: &mut DuelState, event: DamageEvent) -> DamageOutcome {
    let mut outcome = DamageOutcome {
        target_side: event.target_side,
        target_slot: event.target_slot,
        ..DamageOutcome::default()
    };
    if !state.player(event.target_side).characters[event.target_slot].alive {
        return outcome;
    }

    if event.damage_type == DamageType::Heal {
        let target = &mut state.player_mut(event.target_side).characters[event.target_slot];
        outcome.healed = target.heal(event.amount);
        log_if_verbose!(
            state,
            "{} heals {} for {}",
            event.source,
            state.player(event.target_side).characters[event.target_slot].name(),
            outcome.healed
        );
        return outcome;
    }

    // 1. base damage plus matching team boosts
    let mut amount = event.amount;
    if event.from_skill {
        if let Some(element) = event.damage_type.element() {
            let statuses = &mut state.player_mut(event.source_side).team_statuses;
            for status in statuses.iter_mut() {
                let bonus = status.boost_for(Some(element));
                if bonus > 0 && status.consume() {
                    amount = amount.saturating_add(bonus);
                }
            }
            statuses.retain(|s| !s.is_expired());
        }
    }

    // 2. heavy attack
    if event.heavy {
        amount = amount.saturating_add(1);
    }

    // 3. shield
    let target = &mut state.player_mut(event.target_side).characters[event.target_slot];
    if event.damage_type != DamageType::Piercing {
        let absorbed = amount.min(target.shield);
        target.shield -= absorbed;
        amount -= absorbed;
        outcome.absorbed = absorbed;
    }

    // 4. reaction
    let mut spread: Vec<DamageEvent> = Vec::new();
    let mut forced_switch = false;
    match event.damage_type {
        DamageType::Physical => {
            if target.remove_status(StatusKind::Frozen) {
                amount = amount.saturating_add(2);
            }
        }
        DamageType::Elemental(element) => {
            let mut shattered = false;
            if element == Element::Pyro && target.remove_status(StatusKind::Frozen) {
                amount = amount.saturating_add(2);
                shattered = true;
            }
            match target.aura.and_then(|aura| Reaction::between(aura, element)) {
                Some(reaction) => {
                    target.aura = None;
                    amount = reaction.modify(amount);
                    outcome.reaction = Some(reaction);
                    match reaction {
                        Reaction::Overloaded => forced_switch = true,
                        Reaction::Frozen => apply_status(&mut target.statuses, &StatusSpec::frozen()),
                        Reaction::Burning => {
                            apply_status(&mut target.statuses, &StatusSpec::burning())
                        }
                        _ => {}
                    }
                }
                None => {
                    if element.can_attach() && !shattered {
                        target.aura = Some(element);
                    }
                }
            }
        }
        DamageType::Piercing | DamageType::Heal => {}
    }

    match outcome.reaction {
        Some(Reaction::ElectroCharged | Reaction::Superconduct) => {
            for slot in bystanders(state, event.target_side, event.target_slot) {
                spread.push(DamageEvent::new(
                    event.source_side,
                    event.target_side,
                    slot,
                    1,
                    DamageType::Piercing,
                    format!("{} spread", event.source),
                ));
            }
        }
        Some(Reaction::Swirl(swirled)) => {
            for slot in bystanders(state, event.target_side, event.target_slot) {
                spread.push(DamageEvent::new(
                    event.source_side,
                    event.target_side,
                    slot,
                    1,
                    DamageType::Elemental(swirled),
                    format!("{} swirl", event.source),
                ));
            }
        }
        Some(Reaction::Crystallize(_)) => {
            let attacker = state.player_mut(event.source_side).active_mut();
            attacker.shield = attacker.shield.saturating_add(1);
        }
        Some(Reaction::Bloom) => apply_status(
            &mut state.player_mut(event.source_side).team_statuses,
            &StatusSpec::dendro_core(),
        ),
        Some(Reaction::Quicken) => apply_status(
            &mut state.player_mut(event.source_side).team_statuses,
            &StatusSpec::catalyzing_field(),
        ),
        _ => {}
    }

    // 5. health
    let target = &mut state.player_mut(event.target_side).characters[event.target_slot];
    if amount >= target.health && amount > 0 {
        if target.survive_once {
            target.survive_once = false;
            amount = target.health.saturating_sub(1);
            target.health = 1;
        } else {
            amount = target.health;
            let dropped = target.knock_out();
            state
                .player_mut(event.target_side)
                .discard_pile
                .extend(dropped);
            outcome.knocked_out = true;
        }
    } else {
        target.health -= amount;
    }
    outcome.dealt = amount;

    #[cfg(feature = "verbose-logging")]
    {
        let name = state.player(event.target_side).characters[event.target_slot].name();
        let reaction = outcome
            .reaction
            .map(|r| format!(" ({r})"))
            .unwrap_or_default();
        state.logger.event(
            "damage",
            &format!(
                "{} deals {} {} damage to {}{}",
                event.source, outcome.dealt, event.damage_type, name, reaction
            ),
        );
        if outcome.knocked_out {
            state.logger.event("damage", &format!("{name} is defeated"));
        }
    }

    let player = state.player_mut(event.target_side);
    let was_active = player.active_character_index == event.target_slot;
    if outcome.knocked_out && was_active {
        if let Some(next) = player.next_alive_after(event.target_slot) {
            player.active_character_index = next;
            player.flags.must_choose_active = true;
        }
    } else if forced_switch && was_active {
        if let Some(next) = player.next_alive_after(event.target_slot) {
            player.active_character_index = next;
        }
    }

    state.reaction_queue.extend(spread);
    outcome
}
