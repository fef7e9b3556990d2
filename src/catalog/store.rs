//! Shared catalog store with snapshot reads
//!
//! Readers take an `Arc<CatalogSnapshot>` and never block writers for longer
//! than a pointer swap. Writers are serialized by a separate mutex, build a new
//! snapshot from the old one and publish it atomically, so a query sees either
//! all of an ingest batch or none of it.

use crate::core::{CardDef, CardId, CardType, EntityStore};
use crate::{Result, TcgError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

/// Immutable view of the catalog at one point in time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SnapshotFile", into = "SnapshotFile")]
pub struct CatalogSnapshot {
    cards: EntityStore<CardDef>,
    by_key: FxHashMap<(CardType, String), CardId>,
    version: u64,
}

/// On-disk shape of a snapshot
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u64,
    cards: EntityStore<CardDef>,
}

impl From<SnapshotFile> for CatalogSnapshot {
    fn from(file: SnapshotFile) -> Self {
        let by_key = file
            .cards
            .iter()
            .map(|c| ((c.card_type, c.name.to_lowercase()), c.id.clone()))
            .collect();
        CatalogSnapshot {
            cards: file.cards,
            by_key,
            version: file.version,
        }
    }
}

impl From<CatalogSnapshot> for SnapshotFile {
    fn from(snapshot: CatalogSnapshot) -> Self {
        SnapshotFile {
            version: snapshot.version,
            cards: snapshot.cards,
        }
    }
}

impl CatalogSnapshot {
    pub fn get(&self, id: &CardId) -> Result<Arc<CardDef>> {
        self.cards.get(id).cloned()
    }

    /// Look a card up by its natural key
    pub fn find_by_name(&self, name: &str, card_type: CardType) -> Option<Arc<CardDef>> {
        self.by_key
            .get(&(card_type, name.trim().to_lowercase()))
            .and_then(|id| self.cards.get(id).ok())
            .cloned()
    }

    /// Look a card up by name across all types; characters win ties
    pub fn find_any(&self, name: &str) -> Option<Arc<CardDef>> {
        CardType::ALL
            .into_iter()
            .find_map(|t| self.find_by_name(name, t))
    }

    pub fn cards(&self) -> impl Iterator<Item = &Arc<CardDef>> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Incremented by every committed batch
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Result of committing one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// (card name, reason) for records refused at commit time
    pub rejected: Vec<(String, String)>,
}

/// Process-wide catalog
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
    writer: Mutex<()>,
}

impl CatalogStore {
    pub fn new() -> Self {
        CatalogStore::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        CatalogStore {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot. A poisoned lock still holds a consistent pointer,
    /// so it is read through.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn by_id(&self, id: &CardId) -> Result<Arc<CardDef>> {
        self.snapshot().get(id)
    }

    /// Insert or update a batch of cards keyed by (card type, name).
    ///
    /// A record matching an existing key keeps the existing id. Talent cards
    /// whose named character is neither in the catalog nor in the batch are
    /// rejected.
    pub fn upsert_batch(&self, cards: Vec<CardDef>) -> UpsertOutcome {
        let _writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let base = self.snapshot();
        let mut next = (*base).clone();
        let mut outcome = UpsertOutcome::default();

        let (talents, others): (Vec<CardDef>, Vec<CardDef>) = cards
            .into_iter()
            .partition(|c| c.card_type == CardType::Talent);

        for card in others.into_iter().chain(talents) {
            if card.card_type == CardType::Talent
                && next
                    .find_by_name(&card.character_subtype, CardType::Character)
                    .is_none()
            {
                outcome.rejected.push((
                    card.name.to_string(),
                    format!("talent names unknown character '{}'", card.character_subtype),
                ));
                continue;
            }
            match next.insert(card) {
                Ok(true) => outcome.updated += 1,
                Ok(false) => outcome.inserted += 1,
                Err((name, reason)) => outcome.rejected.push((name, reason)),
            }
        }

        if outcome.inserted + outcome.updated > 0 {
            next.version += 1;
            let published = Arc::new(next);
            match self.current.write() {
                Ok(mut guard) => *guard = published,
                Err(poisoned) => *poisoned.into_inner() = published,
            }
        }
        outcome
    }

    /// Write the current snapshot as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&text)?;
        tracing::info!(cards = snapshot.len(), path = %path.display(), "catalog loaded");
        Ok(CatalogStore::from_snapshot(snapshot))
    }

    /// Load a snapshot without blocking the async runtime
    pub async fn load_async(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let snapshot = tokio::task::spawn_blocking(move || {
            serde_json::from_str::<CatalogSnapshot>(&text).map_err(TcgError::from)
        })
        .await??;
        tracing::info!(cards = snapshot.len(), path = %path.display(), "catalog loaded");
        Ok(CatalogStore::from_snapshot(snapshot))
    }
}

impl CatalogSnapshot {
    /// Upsert one card; `Ok(true)` when it replaced an existing record
    fn insert(&mut self, mut card: CardDef) -> std::result::Result<bool, (String, String)> {
        let key = (card.card_type, card.name.to_lowercase());
        if let Some(existing) = self.by_key.get(&key) {
            card.id = existing.clone();
            rekey_skills(&mut card);
            return Ok(self.cards.upsert(card));
        }
        if self.cards.contains(&card.id) {
            let other = self.cards.get(&card.id).map(|c| c.name.to_string()).unwrap_or_default();
            return Err((
                card.name.to_string(),
                format!("id '{}' already belongs to '{other}'", card.id),
            ));
        }
        self.by_key.insert(key, card.id.clone());
        Ok(self.cards.upsert(card))
    }
}

/// Skill ids embed the card id; keep them in step after an id change
fn rekey_skills(card: &mut CardDef) {
    for (index, skill) in card.skills.iter_mut().enumerate() {
        skill.id = format!("{}/{index}", card.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, name: &str) -> CardDef {
        CardDef::new(CardId::new(id), name, CardType::Event)
    }

    #[test]
    fn test_upsert_keeps_first_id() {
        let store = CatalogStore::new();
        let first = store.upsert_batch(vec![event("a", "Strategize")]);
        assert_eq!(first.inserted, 1);

        let mut again = event("b", "Strategize");
        again.description = "Draw 2 cards.".to_string();
        let second = store.upsert_batch(vec![again]);
        assert_eq!(second.updated, 1);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        let card = snapshot.find_by_name("strategize", CardType::Event).unwrap();
        assert_eq!(card.id, CardId::new("a"));
        assert_eq!(card.description, "Draw 2 cards.");
        assert_eq!(snapshot.version(), 2);
    }

    #[test]
    fn test_talent_requires_character() {
        let store = CatalogStore::new();
        let mut talent = CardDef::new(CardId::new("t"), "Undivided Heart", CardType::Talent);
        talent.character_subtype = "Ganyu".to_string();
        let outcome = store.upsert_batch(vec![talent.clone()]);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(store.snapshot().is_empty());

        let ganyu = CardDef::new(CardId::new("g"), "Ganyu", CardType::Character);
        let outcome = store.upsert_batch(vec![talent, ganyu]);
        assert_eq!(outcome.inserted, 2);
    }

    #[test]
    fn test_snapshot_isolated_from_later_writes() {
        let store = CatalogStore::new();
        store.upsert_batch(vec![event("a", "Strategize")]);
        let before = store.snapshot();
        store.upsert_batch(vec![event("b", "Starsigns")]);
        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = CatalogStore::new();
        store.upsert_batch(vec![event("a", "Strategize")]);
        let outcome = store.upsert_batch(vec![event("a", "Starsigns")]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let store = CatalogStore::new();
        store.upsert_batch(vec![event("a", "Strategize"), event("b", "Starsigns")]);
        let path = std::env::temp_dir().join(format!("catalog-{}.json", uuid::Uuid::new_v4()));
        store.save(&path).unwrap();
        let loaded = CatalogStore::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let snapshot = loaded.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.find_by_name("Starsigns", CardType::Event).is_some());
        let names: Vec<&str> = snapshot.cards().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Strategize", "Starsigns"]);
    }
}
