//! Duel narration logger
//!
//! Every duel owns a `DuelLogger`. Narration is either emitted as `tracing`
//! events, captured in memory for the caller, or both. The buffer is not part
//! of duel state: clones start with an empty buffer and serialization only
//! records the configuration, so two replays of the same log compare equal.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Narration detail level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// No narration
    Silent = 0,
    /// Only duel outcome
    Minimal = 1,
    /// Phases, rounds and accepted actions (default)
    #[default]
    Normal = 2,
    /// Dice, damage steps and status changes
    Verbose = 3,
}

impl std::str::FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityLevel::Silent),
            "minimal" | "1" => Ok(VerbosityLevel::Minimal),
            "normal" | "2" => Ok(VerbosityLevel::Normal),
            "verbose" | "3" => Ok(VerbosityLevel::Verbose),
            _ => Err(format!(
                "Invalid verbosity level: {s}. Expected: silent, minimal, normal, verbose, or 0-3"
            )),
        }
    }
}

/// Output destination for narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Emit as tracing events only
    Trace,
    /// Capture only to the in-memory buffer
    Memory,
    /// Both tracing and the buffer (default)
    #[default]
    Both,
}

/// One narration line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "damage", "phase")
    pub category: Option<String>,
}

/// Read-only access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct DuelLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl DuelLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        DuelLogger {
            verbosity,
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Captured entries
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// Take the captured entries, leaving the buffer empty
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.log_buffer.borrow_mut())
    }

    /// Put earlier entries in front of the buffered ones
    pub fn prepend(&self, mut earlier: Vec<LogEntry>) {
        if earlier.is_empty() {
            return;
        }
        let mut buffer = self.log_buffer.borrow_mut();
        earlier.append(&mut buffer);
        *buffer = earlier;
    }

    pub fn clear_logs(&self) {
        self.log_buffer.borrow_mut().clear();
    }

    fn emit(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        if level > self.verbosity || self.verbosity == VerbosityLevel::Silent {
            return;
        }
        if matches!(self.output_mode, OutputMode::Trace | OutputMode::Both) {
            match level {
                VerbosityLevel::Verbose => {
                    tracing::debug!(category = category.unwrap_or("duel"), "{message}")
                }
                _ => tracing::info!(category = category.unwrap_or("duel"), "{message}"),
            }
        }
        if self.is_capturing() {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, None, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, None, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, None, message);
    }

    /// Log a categorized event at Normal level
    #[inline]
    pub fn event(&self, category: &str, message: &str) {
        self.emit(VerbosityLevel::Normal, Some(category), message);
    }
}

impl Default for DuelLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DuelLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuelLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

impl Clone for DuelLogger {
    fn clone(&self) -> Self {
        DuelLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}

impl Serialize for DuelLogger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DuelLogger", 2)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DuelLogger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DuelLoggerData {
            verbosity: VerbosityLevel,
            #[serde(default)]
            output_mode: OutputMode,
        }

        let data = DuelLoggerData::deserialize(deserializer)?;
        Ok(DuelLogger {
            verbosity: data.verbosity,
            output_mode: data.output_mode,
            log_buffer: RefCell::new(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = DuelLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(logger.is_capturing());
    }

    #[test]
    fn test_log_capture_respects_verbosity() {
        let mut logger = DuelLogger::with_verbosity(VerbosityLevel::Normal);
        logger.set_output_mode(OutputMode::Memory);

        logger.normal("round 1 begins");
        logger.verbose("rolled 8 dice");
        logger.minimal("player 0 wins");

        let logs = logger.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "round 1 begins");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let logger = DuelLogger::new();
        logger.event("damage", "Ganyu takes 2 Cryo damage");
        let drained = logger.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].category.as_deref(), Some("damage"));
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_clone_starts_empty() {
        let logger = DuelLogger::new();
        logger.normal("before clone");
        let cloned = logger.clone();
        assert!(cloned.logs().is_empty());
        assert_eq!(cloned.verbosity(), logger.verbosity());
    }

    #[test]
    fn test_serde_keeps_config_only() {
        let mut logger = DuelLogger::with_verbosity(VerbosityLevel::Verbose);
        logger.set_output_mode(OutputMode::Trace);
        logger.normal("not serialized");
        let json = serde_json::to_string(&logger).unwrap();
        assert!(!json.contains("not serialized"));
        let back: DuelLogger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verbosity(), VerbosityLevel::Verbose);
        assert_eq!(back.output_mode(), OutputMode::Trace);
    }

    #[test]
    fn test_verbosity_from_str() {
        assert_eq!("verbose".parse::<VerbosityLevel>().unwrap(), VerbosityLevel::Verbose);
        assert_eq!("0".parse::<VerbosityLevel>().unwrap(), VerbosityLevel::Silent);
        assert!("loud".parse::<VerbosityLevel>().is_err());
    }
}
