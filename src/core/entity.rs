//! Id-keyed entity storage for catalog records

use crate::core::{CardDef, CardId};
use crate::{Result, TcgError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Anything stored by a stable string id
pub trait Entity {
    fn id(&self) -> &CardId;
    fn name(&self) -> &str;
}

impl Entity for CardDef {
    fn id(&self) -> &CardId {
        &self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Central storage for catalog entities
///
/// Lookup by id is O(1) through an FxHashMap; iteration follows insertion
/// order so query results are stable between snapshots. Entities sit behind
/// `Arc` so snapshots share them instead of copying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de> + Entity"))]
#[serde(from = "Vec<Arc<T>>", into = "Vec<Arc<T>>")]
pub struct EntityStore<T: Entity + Clone> {
    order: Vec<Arc<T>>,
    index: FxHashMap<CardId, usize>,
}

impl<T: Entity + Clone> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            order: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert or replace the entity with the same id; returns true if it replaced one
    pub fn upsert(&mut self, entity: T) -> bool {
        let id = entity.id().clone();
        match self.index.get(&id) {
            Some(&pos) => {
                self.order[pos] = Arc::new(entity);
                true
            }
            None => {
                self.index.insert(id, self.order.len());
                self.order.push(Arc::new(entity));
                false
            }
        }
    }

    /// Get an entity by id
    pub fn get(&self, id: &CardId) -> Result<&Arc<T>> {
        self.index
            .get(id)
            .map(|&pos| &self.order[pos])
            .ok_or_else(|| TcgError::CardNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterate over all entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T: Entity + Clone> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity + Clone> From<Vec<Arc<T>>> for EntityStore<T> {
    fn from(entities: Vec<Arc<T>>) -> Self {
        let mut store = EntityStore::new();
        for entity in entities {
            let id = entity.id().clone();
            match store.index.get(&id) {
                Some(&pos) => store.order[pos] = entity,
                None => {
                    store.index.insert(id, store.order.len());
                    store.order.push(entity);
                }
            }
        }
        store
    }
}

impl<T: Entity + Clone> From<EntityStore<T>> for Vec<Arc<T>> {
    fn from(store: EntityStore<T>) -> Self {
        store.order
    }
}
