//! Shared fixtures for integration tests

#![allow(dead_code)]

use invokation_rs::catalog::{CatalogStore, Ingestor};
use invokation_rs::config::EngineConfig;
use invokation_rs::core::{CardId, DiceKind, PlayerId};
use invokation_rs::deck::{DeckList, DeckSpec};
use invokation_rs::game::{self, Action, DuelState, Phase};
use std::path::PathBuf;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Catalog built from `tests/fixtures/cards.json`
pub fn catalog() -> CatalogStore {
    let store = CatalogStore::new();
    let ingestor = Ingestor::new().unwrap();
    ingestor.ingest_file(&store, &fixture("cards.json")).unwrap();
    store
}

pub fn deck(store: &CatalogStore, file: &str) -> DeckSpec {
    DeckList::load_from_file(&fixture(file))
        .unwrap()
        .resolve(&store.snapshot())
        .unwrap()
}

pub fn seats() -> [PlayerId; 2] {
    [PlayerId::new("alice"), PlayerId::new("bob")]
}

/// Liyue (alice) against Mondstadt (bob), alice first
pub fn new_duel(seed: u64) -> DuelState {
    let store = catalog();
    let decks = [deck(&store, "deck_liyue.txt"), deck(&store, "deck_mondstadt.txt")];
    game::create(EngineConfig::default(), seats(), decks, Some(0), seed).unwrap()
}

/// Keep both hands and both rolls
pub fn finish_setup(state: &mut DuelState) {
    let [alice, bob] = seats();
    state.submit(&alice, Action::ReplaceCards { card_ids: vec![] }).unwrap();
    state.submit(&bob, Action::ReplaceCards { card_ids: vec![] }).unwrap();
    state.submit(&alice, Action::Reroll { indices: vec![] }).unwrap();
    state.submit(&bob, Action::Reroll { indices: vec![] }).unwrap();
    assert_eq!(state.phase, Phase::Action);
}

/// A duel in its first action phase with eight omni dice per side
pub fn action_phase(seed: u64) -> DuelState {
    let mut state = new_duel(seed);
    finish_setup(&mut state);
    for side in 0..2 {
        let dice = &mut state.players[side].dice;
        dice.clear();
        for _ in 0..8 {
            dice.add(DiceKind::Omni);
        }
    }
    state
}

/// Index of a character by card id on one side
pub fn slot_of(state: &DuelState, side: usize, card_id: &str) -> usize {
    state.players[side]
        .characters
        .iter()
        .position(|c| c.def.id.as_str() == card_id)
        .unwrap()
}

/// Put a catalog card straight into a player's hand
pub fn give(state: &mut DuelState, side: usize, card_id: &str) -> CardId {
    let id = CardId::new(card_id);
    let card = catalog().by_id(&id).unwrap();
    state.players[side].hand.push(card);
    id
}
