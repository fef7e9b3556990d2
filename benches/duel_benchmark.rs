//! Performance benchmarks for the duel engine
//!
//! Three groups, all built from the fixture catalog under `tests/fixtures`:
//!
//! 1. **cost_engine** - planning payments against a spread of dice pools
//! 2. **duel_execution** - a seeded agent playing a duel from creation to the end
//! 3. **replay** - rebuilding a finished duel from its action log
//!
//! Narration compiles away when the crate is built without the
//! `verbose-logging` feature, which is the configuration to measure.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use invokation_rs::{
    action_log::ActionLog,
    catalog::{CatalogStore, Ingestor},
    config::EngineConfig,
    core::{Cost, DiceKind, DicePool, Element, PlayerId},
    deck::{DeckList, DeckSpec},
    game::{self, cost_engine, Action, DuelState, Phase},
    Result,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::path::PathBuf;
use std::time::Duration;

/// Metrics collected while playing one duel
#[derive(Debug, Clone)]
struct DuelMetrics {
    rounds: u32,
    /// Accepted actions, from the action log
    actions: usize,
    /// Submissions including rejected ones
    attempts: usize,
    duration: Duration,
}

impl DuelMetrics {
    fn duels_per_sec(&self) -> f64 {
        1.0 / self.duration.as_secs_f64()
    }

    fn actions_per_sec(&self) -> f64 {
        self.actions as f64 / self.duration.as_secs_f64()
    }

    fn rejection_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            1.0 - self.actions as f64 / self.attempts as f64
        }
    }
}

struct BenchmarkSetup {
    decks: [DeckSpec; 2],
    seats: [PlayerId; 2],
}

impl BenchmarkSetup {
    fn load() -> Result<Self> {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");
        let store = CatalogStore::new();
        Ingestor::new()?.ingest_file(&store, &fixtures.join("cards.json"))?;
        let snapshot = store.snapshot();
        let deck = |name: &str| DeckList::load_from_file(&fixtures.join(name))?.resolve(&snapshot);
        Ok(BenchmarkSetup {
            decks: [deck("deck_liyue.txt")?, deck("deck_mondstadt.txt")?],
            seats: [PlayerId::new("p1"), PlayerId::new("p2")],
        })
    }

    fn create(&self, seed: u64) -> Result<DuelState> {
        game::create(
            EngineConfig::default(),
            self.seats.clone(),
            self.decks.clone(),
            Some(0),
            seed,
        )
    }
}

/// First accepted of a shuffled candidate list, passing last
fn agent_step(state: &mut DuelState, seats: &[PlayerId; 2], agent: &mut ChaCha12Rng) -> usize {
    let side = state
        .pending_choice()
        .unwrap_or(state.active_player_index);
    let player = &state.players[side];
    let mut actions: Vec<Action> = match (state.pending_choice(), state.phase) {
        (Some(_), _) => (0..player.characters.len())
            .map(|index| Action::SwitchCharacter { index })
            .collect(),
        (None, Phase::Mulligan) => vec![Action::ReplaceCards { card_ids: vec![] }],
        (None, Phase::Roll) => vec![Action::Reroll { indices: vec![] }],
        (None, _) => {
            let mut actions: Vec<Action> = player
                .active()
                .def
                .skills
                .iter()
                .map(|s| Action::UseSkill {
                    skill_id: s.id.clone(),
                })
                .collect();
            actions.extend(player.hand.iter().map(|c| Action::PlayCard {
                card_id: c.id.clone(),
                target: None,
                replace_support: Some(0),
            }));
            actions.shuffle(agent);
            actions
        }
    };
    actions.push(Action::Pass);

    let mut attempts = 0;
    for action in actions {
        attempts += 1;
        if state.submit(&seats[side], action).is_ok() {
            break;
        }
    }
    attempts
}

fn run_duel_with_metrics(setup: &BenchmarkSetup, seed: u64) -> Result<(DuelState, DuelMetrics)> {
    let start = std::time::Instant::now();
    let mut state = setup.create(seed)?;
    let mut agent = ChaCha12Rng::seed_from_u64(seed.wrapping_add(1));
    let mut attempts = 0;
    while state.terminal.is_running() && attempts < 5_000 {
        attempts += agent_step(&mut state, &setup.seats, &mut agent);
    }
    let metrics = DuelMetrics {
        rounds: state.round_number,
        actions: state.log.len(),
        attempts,
        duration: start.elapsed(),
    };
    Ok((state, metrics))
}

fn bench_cost_engine(c: &mut Criterion) {
    let mut rng = ChaCha12Rng::seed_from_u64(7);
    let pools: Vec<DicePool> = (0..64)
        .map(|_| {
            let len = rng.gen_range(3..=10);
            DicePool::from_dice((0..len).map(|_| DiceKind::ALL[rng.gen_range(0..8)]))
        })
        .collect();
    let costs: Vec<Cost> = ["3cryo", "1pyro 2unaligned", "3same", "4geo 3energy", "2omni"]
        .iter()
        .filter_map(|s| Cost::parse(s))
        .collect();

    let mut group = c.benchmark_group("cost_engine");
    group.bench_function("plan", |b| {
        b.iter(|| {
            let mut paid = 0usize;
            for pool in &pools {
                for cost in &costs {
                    if cost_engine::can_pay(cost, pool, Some(Element::Cryo), 3) {
                        paid += 1;
                    }
                }
            }
            black_box(paid)
        });
    });
    group.finish();
}

fn bench_duel_fresh(c: &mut Criterion) {
    let setup = match BenchmarkSetup::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load fixtures: {}", e);
            return;
        }
    };

    let mut group = c.benchmark_group("duel_execution");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(15));

    let seed = 42u64;
    if let Ok((_, metrics)) = run_duel_with_metrics(&setup, seed) {
        println!("\nWarmup duel (seed {}):", seed);
        println!("  Rounds: {}", metrics.rounds);
        println!("  Actions: {}", metrics.actions);
        println!("  Rejection rate: {:.2}", metrics.rejection_rate());
        println!("  Duration: {:?}", metrics.duration);
        println!("  Duels/sec: {:.2}", metrics.duels_per_sec());
        println!("  Actions/sec: {:.2}", metrics.actions_per_sec());
    }

    group.bench_with_input(BenchmarkId::new("fresh", seed), &seed, |b, &seed| {
        b.iter(|| run_duel_with_metrics(&setup, black_box(seed)).expect("duel should run"));
    });
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let setup = match BenchmarkSetup::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load fixtures: {}", e);
            return;
        }
    };
    let seed = 42u64;
    let log: ActionLog = match run_duel_with_metrics(&setup, seed) {
        Ok((state, _)) => state.log,
        Err(e) => {
            eprintln!("Skipping benchmark - duel failed: {}", e);
            return;
        }
    };

    let mut group = c.benchmark_group("replay");
    group.sample_size(20);
    group.bench_with_input(BenchmarkId::new("log", log.len()), &log, |b, log| {
        b.iter(|| {
            log.replay(
                EngineConfig::default(),
                setup.seats.clone(),
                setup.decks.clone(),
                Some(0),
                black_box(seed),
            )
            .expect("replay should succeed")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cost_engine, bench_duel_fresh, bench_replay);
criterion_main!(benches);
