//! Append-only action log
//!
//! Every accepted action of a duel is recorded with the turn, round and phase
//! it was submitted in. Together with the creation parameters and the dice
//! seed the log is enough to rebuild the duel exactly.

use crate::config::EngineConfig;
use crate::core::PlayerId;
use crate::deck::DeckSpec;
use crate::game::{self, payload_digest, Action, ActionKind, DuelState, Phase};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One accepted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Position in the log, from 0
    pub seq: u64,
    pub turn: u32,
    pub round: u32,
    pub phase: Phase,
    pub actor: PlayerId,
    pub action_kind: ActionKind,
    /// Hex FxHash of the serialized action
    pub payload_digest: String,
    pub action: Action,
}

impl ActionLogEntry {
    pub fn new(
        seq: u64,
        turn: u32,
        round: u32,
        phase: Phase,
        actor: PlayerId,
        action: Action,
    ) -> Result<Self> {
        Ok(ActionLogEntry {
            seq,
            turn,
            round,
            phase,
            actor,
            action_kind: action.kind(),
            payload_digest: payload_digest(&action)?,
            action,
        })
    }
}

/// Log of a single duel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog {
    entries: Vec<ActionLogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, entry: ActionLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ActionLogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ActionLogEntry> {
        self.entries.last()
    }

    /// Entries submitted during `round`
    pub fn in_round(&self, round: u32) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().filter(move |e| e.round == round)
    }

    /// Rebuild a duel by creating it afresh and resubmitting every entry
    pub fn replay(
        &self,
        config: EngineConfig,
        seats: [PlayerId; 2],
        decks: [DeckSpec; 2],
        first_player: Option<usize>,
        seed: u64,
    ) -> Result<DuelState> {
        game::replay(config, seats, decks, first_player, seed, self)
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a ActionLogEntry;
    type IntoIter = std::slice::Iter<'a, ActionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
