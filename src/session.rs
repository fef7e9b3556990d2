//! Session registry: live duels keyed by id
//!
//! Each duel sits behind its own mutex, which serializes its actions. The map
//! lock is only held long enough to look up, insert or remove a slot, so
//! different duels advance in parallel.

use crate::config::EngineConfig;
use crate::core::{DuelId, PlayerId};
use crate::deck::DeckSpec;
use crate::game::{self, Action, DuelState, DuelView, LogEntry};
use crate::{Result, TcgError};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// A duel together with what is needed to replay it
#[derive(Debug)]
pub struct DuelSession {
    pub id: DuelId,
    pub decks: [DeckSpec; 2],
    pub first_player: Option<usize>,
    pub state: DuelState,
}

impl DuelSession {
    pub fn seats(&self) -> [PlayerId; 2] {
        [
            self.state.players[0].player_id.clone(),
            self.state.players[1].player_id.clone(),
        ]
    }

    pub fn is_seated(&self, player: &PlayerId) -> bool {
        self.state.side_of(player).is_some()
    }

    /// Rebuild the duel from scratch through its action log
    pub fn replay(&self) -> Result<DuelState> {
        self.state.log.replay(
            self.state.config.clone(),
            self.seats(),
            self.decks.clone(),
            self.first_player,
            self.state.seed,
        )
    }
}

/// Result of an accepted action
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub view: DuelView,
    /// Narration produced while applying the action
    pub narration: Vec<LogEntry>,
}

/// Parameters of a new duel
#[derive(Debug, Clone)]
pub struct NewDuel {
    pub seats: [PlayerId; 2],
    pub decks: [DeckSpec; 2],
    pub first_player: Option<usize>,
    /// Caller-chosen id; generated when absent
    pub duel_id: Option<DuelId>,
}

type Slot = Arc<Mutex<DuelSession>>;

fn poisoned<T>(_: PoisonError<T>) -> TcgError {
    TcgError::LockPoisoned("session registry".to_string())
}

pub struct SessionRegistry {
    duels: RwLock<FxHashMap<DuelId, Slot>>,
    counter: AtomicU64,
    config: EngineConfig,
    /// Fixed seed for every duel; random per duel when absent
    seed: Option<u64>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig, seed: Option<u64>) -> Self {
        SessionRegistry {
            duels: RwLock::new(FxHashMap::default()),
            counter: AtomicU64::new(0),
            config,
            seed,
        }
    }

    fn next_id(&self) -> DuelId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        DuelId::new(format!("duel-{n}"))
    }

    fn slot(&self, id: &DuelId) -> Result<Slot> {
        let duels = self.duels.read().map_err(poisoned)?;
        duels
            .get(id)
            .cloned()
            .ok_or_else(|| TcgError::DuelNotFound(id.to_string()))
    }

    fn lock(slot: &Slot) -> Result<MutexGuard<'_, DuelSession>> {
        slot.lock().map_err(poisoned)
    }

    /// Set up a duel and register it
    pub fn create(&self, request: NewDuel) -> Result<DuelId> {
        let seed = self.seed.unwrap_or_else(rand::random);
        let state = game::create(
            self.config.clone(),
            request.seats,
            request.decks.clone(),
            request.first_player,
            seed,
        )?;
        // Opening narration is not returned to anyone
        state.logger.clear_logs();

        let mut duels = self.duels.write().map_err(poisoned)?;
        let id = match request.duel_id {
            Some(id) if duels.contains_key(&id) => {
                return Err(TcgError::DuelExists(id.to_string()));
            }
            Some(id) => id,
            None => loop {
                let id = self.next_id();
                if !duels.contains_key(&id) {
                    break id;
                }
            },
        };
        let session = DuelSession {
            id: id.clone(),
            decks: request.decks,
            first_player: request.first_player,
            state,
        };
        duels.insert(id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!(duel_id = %id, seed, "duel created");
        Ok(id)
    }

    /// Apply an action and return the actor's view of the result
    pub fn submit(&self, id: &DuelId, actor: &PlayerId, action: Action) -> Result<SubmitOutcome> {
        let slot = self.slot(id)?;
        let mut session = Self::lock(&slot)?;
        let span = tracing::info_span!("duel", duel_id = %id, actor = %actor);
        let _enter = span.enter();

        let kind = action.kind();
        let result = session.state.submit(actor, action);
        let narration = session.state.logger.drain();
        match &result {
            Ok(()) => tracing::debug!(%kind, "action accepted"),
            Err(err) if err.is_recoverable() => tracing::debug!(%kind, error = %err, "action rejected"),
            Err(err) => tracing::error!(%kind, error = %err, "duel errored"),
        }
        result?;
        Ok(SubmitOutcome {
            view: session.state.view_for(actor)?,
            narration,
        })
    }

    pub fn view(&self, id: &DuelId, viewer: &PlayerId) -> Result<DuelView> {
        let slot = self.slot(id)?;
        let session = Self::lock(&slot)?;
        session.state.view_for(viewer)
    }

    /// Run `f` with the locked session
    pub fn with_session<T>(&self, id: &DuelId, f: impl FnOnce(&DuelSession) -> T) -> Result<T> {
        let slot = self.slot(id)?;
        let session = Self::lock(&slot)?;
        Ok(f(&session))
    }

    /// Drop a duel in any phase. An action in flight on it completes first.
    /// Only a seated player may forget a duel.
    pub fn forget(&self, id: &DuelId, by: &PlayerId) -> Result<()> {
        let slot = self.slot(id)?;
        let session = Self::lock(&slot)?;
        if !session.is_seated(by) {
            return Err(TcgError::WrongPlayer(format!("{by} is not seated in {id}")));
        }
        let mut duels = self.duels.write().map_err(poisoned)?;
        if duels.remove(id).is_none() {
            return Err(TcgError::DuelNotFound(id.to_string()));
        }
        drop(duels);
        drop(session);
        tracing::info!(duel_id = %id, "duel forgotten");
        Ok(())
    }

    pub fn contains(&self, id: &DuelId) -> bool {
        self.duels
            .read()
            .map(|duels| duels.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.duels.read().map(|duels| duels.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Element;
    use crate::game::test_support::deck;

    fn request(duel_id: Option<&str>) -> NewDuel {
        NewDuel {
            seats: [PlayerId::new("alice"), PlayerId::new("bob")],
            decks: [deck("a", [Element::Cryo; 3]), deck("b", [Element::Pyro; 3])],
            first_player: Some(0),
            duel_id: duel_id.map(DuelId::new),
        }
    }

    #[test]
    fn test_create_and_view() {
        let registry = SessionRegistry::new(EngineConfig::default(), Some(3));
        let id = registry.create(request(None)).unwrap();
        assert!(registry.contains(&id));
        let view = registry.view(&id, &PlayerId::new("bob")).unwrap();
        assert_eq!(view.viewer_side, 1);
    }

    #[test]
    fn test_duplicate_id_conflicts() {
        let registry = SessionRegistry::new(EngineConfig::default(), Some(3));
        registry.create(request(Some("arena"))).unwrap();
        let err = registry.create(request(Some("arena"))).unwrap_err();
        assert!(matches!(err, TcgError::DuelExists(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_submit_returns_view_and_narration() {
        let registry = SessionRegistry::new(EngineConfig::default(), Some(3));
        let id = registry.create(request(None)).unwrap();
        let outcome = registry
            .submit(&id, &PlayerId::new("alice"), Action::Pass)
            .unwrap();
        assert_eq!(outcome.view.active_player_index, 1);
        assert!(!outcome.narration.is_empty());
    }

    #[test]
    fn test_forget_requires_seat_and_removes() {
        let registry = SessionRegistry::new(EngineConfig::default(), Some(3));
        let id = registry.create(request(None)).unwrap();
        assert!(registry.forget(&id, &PlayerId::new("mallory")).is_err());
        registry.forget(&id, &PlayerId::new("alice")).unwrap();
        assert!(!registry.contains(&id));
        let err = registry.view(&id, &PlayerId::new("alice")).unwrap_err();
        assert!(matches!(err, TcgError::DuelNotFound(_)));
    }

    #[test]
    fn test_session_replays_to_same_state() {
        let registry = SessionRegistry::new(EngineConfig::default(), Some(11));
        let id = registry.create(request(None)).unwrap();
        registry
            .submit(&id, &PlayerId::new("alice"), Action::Pass)
            .unwrap();
        registry
            .submit(&id, &PlayerId::new("bob"), Action::Pass)
            .unwrap();
        let same = registry
            .with_session(&id, |s| {
                let replayed = s.replay().unwrap();
                replayed.state_hash().unwrap() == s.state.state_hash().unwrap()
            })
            .unwrap();
        assert!(same);
    }
}
