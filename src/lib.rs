//! Invokation - server core for Genius Invokation TCG duels
//!
//! A card catalog with ingestion and queries, a deck validator, a
//! deterministic duel engine, and a registry that serializes actions per duel.

pub mod action_log;
pub mod catalog;
pub mod config;
pub mod core;
pub mod deck;
pub mod error;
pub mod game;
pub mod service;
pub mod session;

pub use error::{ErrorKind, Result, TcgError};
