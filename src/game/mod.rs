//! Duel engine: state, phases, costs, reactions and damage

/// Narration that compiles away without the `verbose-logging` feature
///
/// When the feature is disabled the `format!` never runs, which keeps
/// benchmark and replay loops free of narration allocations.
macro_rules! log_if_verbose {
    ($state:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $state.logger.normal(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$state;
        }
    };
}

pub mod actions;
pub mod character;
pub mod cost_engine;
pub mod damage;
pub mod engine;
pub mod logger;
pub mod phase;
pub mod reaction;
pub mod state;
pub mod state_hash;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::{Action, ActionKind, ActionSpeed};
pub use character::{LiveCharacter, StatusInstance};
pub use cost_engine::PaymentPlan;
pub use damage::{DamageEvent, DamageOutcome};
pub use engine::{create, replay};
pub use logger::{DuelLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::Phase;
pub use reaction::Reaction;
pub use state::{DuelState, PlayerState, SummonInstance, SupportSlot, Terminal, TurnFlags};
pub use state_hash::payload_digest;
pub use view::{CardView, CharacterView, DuelView, OwnSide, PublicSide};
