//! Duel engine: creation, action submission and phase transitions
//!
//! `submit` is the only way a running duel changes. It applies the action to
//! a clone of the state, runs the automatic transitions that follow (setup
//! sequencing, turn hand-off, end phase, round cap), checks the structural
//! invariants, appends the log entry and only then commits the clone.

use crate::action_log::{ActionLog, ActionLogEntry};
use crate::config::EngineConfig;
use crate::core::{DamageType, EffectTrigger, PlayerId, StatusPayload};
use crate::deck::{DeckSpec, DeckValidator};
use crate::game::actions::{self, handler_for, Action, ActionSpeed};
use crate::game::character::{LiveCharacter, StatusInstance};
use crate::game::damage::{self, DamageEvent};
use crate::game::logger::DuelLogger;
use crate::game::phase::Phase;
use crate::game::state::{DuelState, PlayerState, Terminal};
use crate::{Result, TcgError};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::collections::VecDeque;
use std::sync::Arc;

/// Set up a duel: validate both decks, shuffle, deal opening hands and pick
/// the first player. The returned duel waits in the mulligan phase.
pub fn create(
    config: EngineConfig,
    seats: [PlayerId; 2],
    decks: [DeckSpec; 2],
    first_player: Option<usize>,
    seed: u64,
) -> Result<DuelState> {
    config.validate()?;
    if seats[0] == seats[1] {
        return Err(TcgError::InvalidPayload(format!(
            "{} cannot duel themselves",
            seats[0]
        )));
    }
    if first_player.is_some_and(|p| p > 1) {
        return Err(TcgError::InvalidPayload(
            "first player must be 0 or 1".to_string(),
        ));
    }
    for (side, deck) in decks.iter().enumerate() {
        let report = DeckValidator::validate(deck);
        if !report.valid {
            return Err(TcgError::InvalidDeck(format!(
                "player {side}: {}",
                report.errors.join("; ")
            )));
        }
    }

    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let [seat_a, seat_b] = seats;
    let [deck_a, deck_b] = decks;
    let mut build = |player_id: PlayerId, deck: DeckSpec| {
        let characters = deck.characters.into_iter().map(LiveCharacter::new).collect();
        let mut player = PlayerState::new(player_id, characters);
        let mut actions: Vec<_> = deck.actions;
        actions.shuffle(&mut rng);
        player.deck = VecDeque::from(actions);
        player
    };
    let players = [build(seat_a, deck_a), build(seat_b, deck_b)];
    let first = first_player.unwrap_or_else(|| rng.gen_range(0..2));

    let logger = DuelLogger::with_verbosity(config.verbosity);
    let initial_hand = config.initial_hand;
    let mut state = DuelState {
        config,
        seed,
        phase: Phase::Setup,
        round_number: 1,
        turn: 0,
        first_player_index: first,
        active_player_index: first,
        next_first_player: None,
        players,
        reaction_queue: VecDeque::new(),
        log: ActionLog::new(),
        terminal: Terminal::Running,
        rng,
        logger,
    };
    for side in [first, DuelState::other(first)] {
        state.draw(side, initial_hand);
    }
    state.phase = Phase::Mulligan;
    log_if_verbose!(state, "duel created, player {first} goes first");
    Ok(state)
}

/// Rebuild a duel from its creation parameters and an action log
pub fn replay(
    config: EngineConfig,
    seats: [PlayerId; 2],
    decks: [DeckSpec; 2],
    first_player: Option<usize>,
    seed: u64,
    log: &ActionLog,
) -> Result<DuelState> {
    let mut state = create(config, seats, decks, first_player, seed)?;
    for entry in log.iter() {
        state.submit(&entry.actor, entry.action.clone())?;
    }
    Ok(state)
}

impl DuelState {
    /// Apply one action for `actor`. On any error the duel is unchanged,
    /// except that a broken engine invariant ends it as errored.
    pub fn submit(&mut self, actor: &PlayerId, action: Action) -> Result<()> {
        if !self.terminal.is_running() {
            return Err(TcgError::DuelEnded(format!("{:?}", self.terminal)));
        }
        let side = self
            .side_of(actor)
            .ok_or_else(|| TcgError::WrongPlayer(format!("{actor} is not seated in this duel")))?;
        let (round, phase, turn) = (self.round_number, self.phase, self.turn);

        // The log only grows on commit, so it stays out of the working copy
        let log = std::mem::take(&mut self.log);
        let mut next = self.clone();
        self.log = log;
        match self.pending_choice() {
            // A knocked-out active character blocks everything else
            Some(owner) => {
                if owner != side {
                    return Err(TcgError::WrongPlayer(format!(
                        "waiting for player {owner} to choose a new active character"
                    )));
                }
                let Action::SwitchCharacter { index } = action else {
                    return Err(TcgError::IllegalAction(
                        "choose a new active character first".to_string(),
                    ));
                };
                actions::choose_active(&mut next, side, index)?;
            }
            None => {
                let handler = handler_for(self.phase, action.kind()).ok_or_else(|| {
                    TcgError::WrongPhase(format!(
                        "{} is not allowed during the {} phase",
                        action.kind(),
                        self.phase
                    ))
                })?;
                if side != self.active_player_index {
                    return Err(TcgError::WrongPlayer(format!(
                        "it is player {}'s turn",
                        self.active_player_index
                    )));
                }
                let speed = handler(&mut next, side, &action)?;
                next.advance(side, speed);
            }
        }

        if let Err(err) = next.check_invariants() {
            tracing::error!(error = %err, "duel invariant violated");
            self.terminal = Terminal::Errored {
                reason: err.to_string(),
            };
            self.finish();
            return Err(err);
        }

        let entry = ActionLogEntry::new(
            self.log.len() as u64,
            turn,
            round,
            phase,
            actor.clone(),
            action,
        )?;
        next.log = std::mem::take(&mut self.log);
        next.log.append(entry);
        next.logger.prepend(self.logger.drain());
        *self = next;
        Ok(())
    }

    /// Automatic transitions after an accepted action
    fn advance(&mut self, side: usize, speed: ActionSpeed) {
        if !self.terminal.is_running() {
            return;
        }
        let other = DuelState::other(side);
        match self.phase {
            Phase::Mulligan => {
                if self.players.iter().all(|p| p.flags.initial_mulligan_done) {
                    self.start_round();
                } else {
                    self.active_player_index = other;
                }
            }
            Phase::Roll => {
                if self.players.iter().all(|p| p.flags.reroll_consumed) {
                    self.phase = Phase::Action;
                    self.active_player_index = self.first_player_index;
                    self.turn += 1;
                    log_if_verbose!(self, "round {} action phase", self.round_number);
                } else {
                    self.active_player_index = other;
                }
            }
            Phase::Action => match speed {
                ActionSpeed::Quick | ActionSpeed::Setup => {}
                ActionSpeed::Combat | ActionSpeed::Pass => {
                    if self.players.iter().all(|p| p.flags.passed) {
                        self.run_end_phase();
                    } else if !self.players[other].flags.passed {
                        self.active_player_index = other;
                        self.turn += 1;
                    }
                }
            },
            Phase::Setup | Phase::End | Phase::Ended => {}
        }
    }

    /// Roll phase of the current round
    fn start_round(&mut self) {
        self.phase = Phase::Roll;
        self.active_player_index = self.first_player_index;
        for side in [self.first_player_index, DuelState::other(self.first_player_index)] {
            self.roll_dice(side);
        }
        log_if_verbose!(self, "round {} begins", self.round_number);
    }

    fn run_end_phase(&mut self) {
        self.phase = Phase::End;
        log_if_verbose!(self, "round {} end phase", self.round_number);
        let first = self.first_player_index;
        let order = [first, DuelState::other(first)];

        for side in order {
            self.end_phase_effects(side);
            if self.check_victory() {
                return;
            }
        }

        for side in order {
            let player = self.player_mut(side);
            for character in &mut player.characters {
                tick_statuses(&mut character.statuses);
            }
            tick_statuses(&mut player.team_statuses);
        }
        let draw = self.config.end_phase_draw;
        for side in order {
            self.draw(side, draw);
        }

        self.first_player_index = self.next_first_player.take().unwrap_or(first);
        for player in &mut self.players {
            player.reset_round();
        }
        self.round_number += 1;
        if self.round_number >= self.config.max_rounds {
            self.terminal = Terminal::Draw;
            self.finish();
            return;
        }
        self.start_round();
    }

    /// End-phase effects of one side: character statuses, team statuses,
    /// summons, then supports, each in insertion order.
    fn end_phase_effects(&mut self, side: usize) {
        let enemy = DuelState::other(side);

        for slot in 0..self.player(side).characters.len() {
            let statuses = self.player(side).characters[slot].statuses.clone();
            for status in statuses {
                if !self.player(side).characters[slot].alive {
                    break;
                }
                let event = match status.payload {
                    StatusPayload::DamagePerRound {
                        amount,
                        damage_type,
                    } => DamageEvent::new(enemy, side, slot, amount, damage_type, &status.name),
                    StatusPayload::HealPerRound { amount } => {
                        DamageEvent::new(side, side, slot, amount, DamageType::Heal, &status.name)
                    }
                    _ => continue,
                };
                damage::resolve(self, event);
                if !self.terminal.is_running() {
                    return;
                }
            }
        }

        let team = self.player(side).team_statuses.clone();
        for status in team {
            let event = match status.payload {
                StatusPayload::DamagePerRound {
                    amount,
                    damage_type,
                } => DamageEvent::at_enemy_active(self, side, amount, damage_type, &status.name),
                StatusPayload::HealPerRound { amount } => {
                    let slot = self.player(side).active_character_index;
                    DamageEvent::new(side, side, slot, amount, DamageType::Heal, &status.name)
                }
                _ => continue,
            };
            damage::resolve(self, event);
            if !self.terminal.is_running() {
                return;
            }
        }

        for i in 0..self.player(side).summons.len() {
            let summon = self.player(side).summons[i].clone();
            let event = if summon.damage_type == DamageType::Heal {
                let slot = self.player(side).active_character_index;
                DamageEvent::new(side, side, slot, summon.damage, DamageType::Heal, &summon.name)
            } else {
                DamageEvent::at_enemy_active(
                    self,
                    side,
                    summon.damage,
                    summon.damage_type,
                    &summon.name,
                )
            };
            damage::resolve(self, event);
            let stored = &mut self.player_mut(side).summons[i];
            stored.usages = stored.usages.saturating_sub(1);
            if !self.terminal.is_running() {
                return;
            }
        }
        self.player_mut(side).summons.retain(|s| s.usages > 0);

        for i in 0..self.player(side).supports.len() {
            let support = self.player(side).supports[i].clone();
            if support.def.effect.trigger != EffectTrigger::EndPhase
                || support.usages == Some(0)
            {
                continue;
            }
            let slot = self.player(side).active_character_index;
            actions::apply_card_effect(self, side, slot, &support.def);
            if let Some(n) = &mut self.player_mut(side).supports[i].usages {
                *n = n.saturating_sub(1);
            }
            if !self.terminal.is_running() {
                return;
            }
        }
        let player = self.player_mut(side);
        let (spent, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut player.supports)
            .into_iter()
            .partition(|s| s.usages == Some(0));
        player.supports = kept;
        player
            .discard_pile
            .extend(spent.into_iter().map(|s| Arc::clone(&s.def)));
    }
}

/// One round passes for every status with a duration
fn tick_statuses(statuses: &mut Vec<StatusInstance>) {
    for status in statuses.iter_mut() {
        if let Some(rounds) = &mut status.duration_rounds {
            *rounds = rounds.saturating_sub(1);
        }
    }
    statuses.retain(|s| !s.is_expired());
}
