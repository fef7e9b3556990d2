//! Duel state
//!
//! `DuelState` is plain data: cloning it gives an independent duel that
//! shares only immutable card definitions. The engine mutates a clone and
//! commits it when an action succeeds.

use crate::action_log::ActionLog;
use crate::config::EngineConfig;
use crate::core::{CardDef, CardId, DamageType, DicePool, PlayerId, StatusKind, SummonSpec};
use crate::game::character::{LiveCharacter, StatusInstance};
use crate::game::damage::DamageEvent;
use crate::game::logger::DuelLogger;
use crate::game::phase::Phase;
use crate::{Result, TcgError};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Per-player flags; the per-round ones are reset at end phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlags {
    pub passed: bool,
    pub used_tuning_this_round: bool,
    pub reroll_consumed: bool,
    pub initial_mulligan_done: bool,
    pub legacy_used_this_duel: bool,
    pub food_played_this_round: bool,
    /// Active character was knocked out; a free switch must come next
    pub must_choose_active: bool,
}

impl TurnFlags {
    fn reset_round(&mut self) {
        self.passed = false;
        self.used_tuning_this_round = false;
        self.reroll_consumed = false;
        self.food_played_this_round = false;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportSlot {
    pub def: Arc<CardDef>,
    pub usages: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonInstance {
    pub name: String,
    pub damage: u8,
    pub damage_type: DamageType,
    pub usages: u8,
}

impl From<&SummonSpec> for SummonInstance {
    fn from(spec: &SummonSpec) -> Self {
        SummonInstance {
            name: spec.name.clone(),
            damage: spec.damage,
            damage_type: spec.damage_type,
            usages: spec.usages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: PlayerId,
    pub characters: Vec<LiveCharacter>,
    pub active_character_index: usize,
    pub hand: Vec<Arc<CardDef>>,
    /// Top of the deck is the front
    pub deck: VecDeque<Arc<CardDef>>,
    pub dice: DicePool,
    pub supports: Vec<SupportSlot>,
    pub summons: Vec<SummonInstance>,
    pub team_statuses: Vec<StatusInstance>,
    /// Played events, replaced equipment and cards drawn over the hand cap
    pub discard_pile: Vec<Arc<CardDef>>,
    pub flags: TurnFlags,
}

impl PlayerState {
    pub fn new(player_id: PlayerId, characters: Vec<LiveCharacter>) -> Self {
        PlayerState {
            player_id,
            characters,
            active_character_index: 0,
            hand: Vec::new(),
            deck: VecDeque::new(),
            dice: DicePool::new(),
            supports: Vec::new(),
            summons: Vec::new(),
            team_statuses: Vec::new(),
            discard_pile: Vec::new(),
            flags: TurnFlags::default(),
        }
    }

    pub fn active(&self) -> &LiveCharacter {
        &self.characters[self.active_character_index]
    }

    pub fn active_mut(&mut self) -> &mut LiveCharacter {
        &mut self.characters[self.active_character_index]
    }

    pub fn all_defeated(&self) -> bool {
        self.characters.iter().all(|c| !c.alive)
    }

    /// First alive character after `from`, wrapping around
    pub fn next_alive_after(&self, from: usize) -> Option<usize> {
        let n = self.characters.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&i| self.characters[i].alive)
    }

    pub fn hand_position(&self, card_id: &CardId) -> Option<usize> {
        self.hand.iter().position(|c| &c.id == card_id)
    }

    pub fn reset_round(&mut self) {
        self.flags.reset_round();
        for character in &mut self.characters {
            character.has_full_stomach = false;
        }
    }
}

/// Outcome of a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Terminal {
    Running,
    Winner { player: usize },
    Draw,
    /// An engine invariant broke; the duel accepts no more actions
    Errored { reason: String },
}

impl Terminal {
    pub fn is_running(&self) -> bool {
        matches!(self, Terminal::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelState {
    pub config: EngineConfig,
    /// Seed the dice RNG was created from
    pub seed: u64,
    pub phase: Phase,
    pub round_number: u32,
    /// Incremented whenever the turn passes to the other player
    pub turn: u32,
    pub first_player_index: usize,
    pub active_player_index: usize,
    /// First player to pass this round; goes first next round
    pub next_first_player: Option<usize>,
    pub players: [PlayerState; 2],
    /// Hits spawned by reactions, resolved before the next action
    pub reaction_queue: VecDeque<DamageEvent>,
    pub log: ActionLog,
    pub terminal: Terminal,
    pub rng: ChaCha12Rng,
    pub logger: DuelLogger,
}

impl DuelState {
    pub fn player(&self, side: usize) -> &PlayerState {
        &self.players[side]
    }

    pub fn player_mut(&mut self, side: usize) -> &mut PlayerState {
        &mut self.players[side]
    }

    pub fn other(side: usize) -> usize {
        1 - side
    }

    /// Seat of a player id
    pub fn side_of(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.player_id == player)
    }

    /// Side that owes a forced active-character choice, if any
    pub fn pending_choice(&self) -> Option<usize> {
        (0..2).find(|&side| self.players[side].flags.must_choose_active)
    }

    /// Draw `count` cards for `side`. Cards drawn over the hand cap go to the
    /// discard pile; an empty deck draws nothing.
    pub fn draw(&mut self, side: usize, count: usize) {
        let cap = self.config.hand_cap;
        for _ in 0..count {
            let player = &mut self.players[side];
            let Some(card) = player.deck.pop_front() else {
                break;
            };
            if player.hand.len() >= cap {
                self.logger.event(
                    "draw",
                    &format!("player {side} discards {} over the hand cap", card.name),
                );
                player.discard_pile.push(card);
            } else {
                player.hand.push(card);
            }
        }
    }

    pub fn roll_dice(&mut self, side: usize) {
        let count = self.config.dice_per_roll;
        let p = self.config.omni_probability;
        self.players[side].dice.roll(&mut self.rng, count, p);
    }

    /// Settle the duel if a side is wiped out. Returns true once terminal.
    pub fn check_victory(&mut self) -> bool {
        if !self.terminal.is_running() {
            return true;
        }
        let wiped = [self.players[0].all_defeated(), self.players[1].all_defeated()];
        self.terminal = match wiped {
            [true, true] => Terminal::Draw,
            [true, false] => Terminal::Winner { player: 1 },
            [false, true] => Terminal::Winner { player: 0 },
            [false, false] => return false,
        };
        self.finish();
        true
    }

    /// Enter the terminal phase with the current outcome
    pub fn finish(&mut self) {
        self.phase = Phase::Ended;
        self.reaction_queue.clear();
        for player in &mut self.players {
            player.flags.must_choose_active = false;
        }
        let outcome = match &self.terminal {
            Terminal::Winner { player } => format!("player {player} wins"),
            Terminal::Draw => "the duel is a draw".to_string(),
            Terminal::Errored { reason } => format!("duel errored: {reason}"),
            Terminal::Running => "duel stopped".to_string(),
        };
        self.logger.minimal(&outcome);
    }

    /// Structural invariants that must hold between actions
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |msg: String| Err(TcgError::Invariant(msg));
        if self.terminal.is_running() == (self.phase == Phase::Ended) {
            return fail(format!(
                "phase {} disagrees with outcome {:?}",
                self.phase, self.terminal
            ));
        }
        for (side, player) in self.players.iter().enumerate() {
            if player.active_character_index >= player.characters.len() {
                return fail(format!("player {side} active index out of range"));
            }
            if self.terminal.is_running() && !player.active().alive {
                return fail(format!("player {side} active character is defeated"));
            }
            if player.hand.len() > self.config.hand_cap {
                return fail(format!("player {side} hand exceeds cap"));
            }
            if player.supports.len() > self.config.max_supports {
                return fail(format!("player {side} support zone overflow"));
            }
            if player.summons.len() > self.config.max_summons {
                return fail(format!("player {side} summon zone overflow"));
            }
            for c in &player.characters {
                if c.health > c.health_max || c.energy > c.energy_max {
                    return fail(format!("{} exceeds a maximum", c.name()));
                }
                if c.alive != (c.health > 0) {
                    return fail(format!("{} alive flag disagrees with health", c.name()));
                }
                if c.aura.is_some_and(|e| !e.can_attach()) {
                    return fail(format!("{} carries an unattachable aura", c.name()));
                }
                if !c.alive && c.has_status(StatusKind::Frozen) {
                    return fail(format!("{} is defeated but frozen", c.name()));
                }
            }
        }
        Ok(())
    }
}
