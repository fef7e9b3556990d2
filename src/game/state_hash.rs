//! Deterministic state hashing
//!
//! The duel is serialized to JSON, presentation-only fields are stripped, and
//! the canonical string is hashed with FxHash. Two duels that reached the same
//! position through the same log hash equal.

use crate::game::actions::Action;
use crate::game::state::DuelState;
use crate::Result;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Fields that never affect play
const EXCLUDED_FIELDS: &[&str] = &["logger"];

fn strip_presentation(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) => {
            for field in EXCLUDED_FIELDS {
                map.remove(*field);
            }
            serde_json::Value::Object(map)
        }
        other => other,
    }
}

fn fx_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

impl DuelState {
    /// 64-bit hash of the play-relevant state
    pub fn state_hash(&self) -> Result<u64> {
        let value = strip_presentation(serde_json::to_value(self)?);
        Ok(fx_hash(&serde_json::to_string(&value)?))
    }
}

/// Hex digest of an action payload, stored in each log entry
pub fn payload_digest(action: &Action) -> Result<String> {
    Ok(format_hash(fx_hash(&serde_json::to_string(action)?)))
}

pub fn format_hash(hash: u64) -> String {
    format!("{hash:016x}")
}
