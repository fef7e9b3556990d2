//! Duel phase machine
//!
//! setup -> mulligan -> roll -> action -> end -> (roll | ended)

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Decks shuffled, opening hands dealt
    Setup,
    /// Each player may replace opening-hand cards once
    Mulligan,
    /// Dice rolled; each player may reroll once
    Roll,
    /// Players alternate turns until both pass
    Action,
    /// Round upkeep; resolved without player input
    End,
    /// Terminal
    Ended,
}

impl Phase {
    /// The phase that follows this one when nobody has won
    pub fn next(self) -> Phase {
        match self {
            Phase::Setup => Phase::Mulligan,
            Phase::Mulligan => Phase::Roll,
            Phase::Roll => Phase::Action,
            Phase::Action => Phase::End,
            Phase::End => Phase::Roll,
            Phase::Ended => Phase::Ended,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Ended
    }

    /// Phases that wait for player submissions
    pub fn accepts_actions(self) -> bool {
        matches!(self, Phase::Mulligan | Phase::Roll | Phase::Action)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Setup => "setup",
            Phase::Mulligan => "mulligan",
            Phase::Roll => "roll",
            Phase::Action => "action",
            Phase::End => "end",
            Phase::Ended => "ended",
        };
        f.write_str(s)
    }
}
