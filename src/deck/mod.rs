//! Deck lists and deck validation

pub mod list;
pub mod validator;

pub use list::{DeckEntry, DeckIds, DeckList, DeckSpec};
pub use validator::{DeckStats, DeckValidator, RuleKey, RuleVerdict, ValidationReport};
