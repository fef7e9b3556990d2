//! Error types for the duel server core
//!
//! Every error carries one of five kinds. Callers branch on the kind, users
//! read the message.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable error classification carried by every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller payload malformed (missing field, bad enum, invalid id)
    Validation,
    /// Action contradicts the game rules; state unchanged
    Rule,
    /// Id references no entity
    NotFound,
    /// Concurrent duplicate create
    Conflict,
    /// Invariant violation; the affected duel is errored
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Rule => "rule",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum TcgError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid card record: {0}")]
    InvalidCardRecord(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Wrong phase: {0}")]
    WrongPhase(String),

    #[error("Wrong player: {0}")]
    WrongPlayer(String),

    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Unpayable cost: {0}")]
    UnpayableCost(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Duel not found: {0}")]
    DuelNotFound(String),

    #[error("Duel already exists: {0}")]
    DuelExists(String),

    #[error("Duel has ended: {0}")]
    DuelEnded(String),

    #[error("Engine invariant violated: {0}")]
    Invariant(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl TcgError {
    /// Classify this error into the response taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            TcgError::InvalidPayload(_)
            | TcgError::InvalidCardRecord(_)
            | TcgError::InvalidDeckFormat(_)
            | TcgError::InvalidDeck(_)
            | TcgError::InvalidFilter(_)
            | TcgError::InvalidConfig(_)
            | TcgError::SerializationError(_) => ErrorKind::Validation,
            TcgError::WrongPhase(_)
            | TcgError::WrongPlayer(_)
            | TcgError::IllegalAction(_)
            | TcgError::UnpayableCost(_)
            | TcgError::DuelEnded(_) => ErrorKind::Rule,
            TcgError::CardNotFound(_) | TcgError::DuelNotFound(_) => ErrorKind::NotFound,
            TcgError::DuelExists(_) => ErrorKind::Conflict,
            TcgError::Invariant(_)
            | TcgError::LockPoisoned(_)
            | TcgError::IoError(_)
            | TcgError::JoinError(_) => ErrorKind::Internal,
        }
    }

    /// True when the error leaves the duel untouched and the caller may retry
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

impl From<serde_json::Error> for TcgError {
    fn from(e: serde_json::Error) -> Self {
        TcgError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TcgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(TcgError::WrongPhase("x".into()).kind(), ErrorKind::Rule);
        assert_eq!(TcgError::UnpayableCost("x".into()).kind(), ErrorKind::Rule);
        assert_eq!(TcgError::DuelNotFound("d".into()).kind(), ErrorKind::NotFound);
        assert_eq!(TcgError::DuelExists("d".into()).kind(), ErrorKind::Conflict);
        assert_eq!(TcgError::Invariant("hp".into()).kind(), ErrorKind::Internal);
        assert_eq!(TcgError::InvalidFilter("page".into()).kind(), ErrorKind::Validation);
        assert!(!TcgError::Invariant("hp".into()).is_recoverable());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
