//! Deck lists: the text format and resolution against the catalog
//!
//! ```text
//! # Liyue freeze
//! [Characters]
//! 1 Ganyu
//! 1 Xingqiu
//! 1 Xiangling
//!
//! [Actions]
//! 2 Sweet Madame
//! 2 Strategize
//! ```

use crate::catalog::CatalogSnapshot;
use crate::core::{CardDef, CardId, CardType};
use crate::{Result, TcgError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A card name with its copy count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// Unresolved deck list as written by a player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub characters: Vec<DeckEntry>,
    pub actions: Vec<DeckEntry>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Characters,
    Actions,
}

impl DeckList {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse the text format. Lines are `N Card Name`; a bare name means one
    /// copy. Section headers pick the list, `#` starts a comment.
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut deck = DeckList::default();
        let mut section = Section::Actions;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                let header = line.trim_matches(|c| c == '[' || c == ']').to_lowercase();
                section = match header.as_str() {
                    "characters" | "character" | "角色" => Section::Characters,
                    "actions" | "action" | "行动" => Section::Actions,
                    _ => {
                        return Err(TcgError::InvalidDeckFormat(format!(
                            "line {}: unknown section '{line}'",
                            lineno + 1
                        )))
                    }
                };
                continue;
            }

            let (count, name) = match line.split_once(' ') {
                Some((count_str, rest)) => match count_str.parse::<u8>() {
                    Ok(count) => (count, rest.trim()),
                    Err(_) => (1, line),
                },
                None => (1, line),
            };
            if count == 0 || name.is_empty() {
                return Err(TcgError::InvalidDeckFormat(format!(
                    "line {}: '{line}' has no card",
                    lineno + 1
                )));
            }
            let entry = DeckEntry {
                card_name: name.to_string(),
                count,
            };
            match section {
                Section::Characters => deck.characters.push(entry),
                Section::Actions => deck.actions.push(entry),
            }
        }

        if deck.characters.is_empty() && deck.actions.is_empty() {
            return Err(TcgError::InvalidDeckFormat("Empty deck".to_string()));
        }
        Ok(deck)
    }

    /// Resolve names against the catalog. Character entries must name
    /// characters; action entries must name action cards.
    pub fn resolve(&self, snapshot: &CatalogSnapshot) -> Result<DeckSpec> {
        let mut spec = DeckSpec::default();
        for entry in &self.characters {
            let card = snapshot
                .find_by_name(&entry.card_name, CardType::Character)
                .ok_or_else(|| TcgError::CardNotFound(entry.card_name.clone()))?;
            for _ in 0..entry.count {
                spec.characters.push(Arc::clone(&card));
            }
        }
        for entry in &self.actions {
            let card = CardType::ALL
                .into_iter()
                .filter(|t| t.is_action())
                .find_map(|t| snapshot.find_by_name(&entry.card_name, t))
                .ok_or_else(|| TcgError::CardNotFound(entry.card_name.clone()))?;
            for _ in 0..entry.count {
                spec.actions.push(Arc::clone(&card));
            }
        }
        Ok(spec)
    }

    pub fn total_cards(&self) -> usize {
        self.characters
            .iter()
            .chain(&self.actions)
            .map(|e| e.count as usize)
            .sum()
    }
}

/// Card ids of a deck as submitted over the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckIds {
    pub characters: Vec<CardId>,
    pub actions: Vec<CardId>,
}

impl DeckIds {
    pub fn resolve(&self, snapshot: &CatalogSnapshot) -> Result<DeckSpec> {
        Ok(DeckSpec {
            characters: self
                .characters
                .iter()
                .map(|id| snapshot.get(id))
                .collect::<Result<_>>()?,
            actions: self
                .actions
                .iter()
                .map(|id| snapshot.get(id))
                .collect::<Result<_>>()?,
        })
    }
}

/// A resolved deck. Counts are not enforced here; the validator reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckSpec {
    pub characters: Vec<Arc<CardDef>>,
    pub actions: Vec<Arc<CardDef>>,
}

impl DeckSpec {
    pub fn ids(&self) -> DeckIds {
        DeckIds {
            characters: self.characters.iter().map(|c| c.id.clone()).collect(),
            actions: self.actions.iter().map(|c| c.id.clone()).collect(),
        }
    }
}
