//! Invokation - command line front end
//!
//! Ingest catalog dumps, query the catalog, validate decks and play scripted
//! duels through the same service facade a network transport would use.

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use invokation_rs::{
    catalog::{CatalogStore, Ingestor, RawFilter},
    config::ServiceConfig,
    core::PlayerId,
    deck::DeckList,
    game::{Action, VerbosityLevel},
    service::{CreateDuelRequest, Envelope, RequestContext, TcgService},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tcg")]
#[command(about = "Invokation - Genius Invokation TCG server core", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fixed dice seed for new duels
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Override the chance of rolling an omni die
    #[arg(long, global = true)]
    omni_probability: Option<f64>,

    /// Narration level (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', global = true)]
    verbosity: Option<VerbosityLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a raw dump (file or directory of *.json) into a catalog snapshot
    Ingest {
        #[arg(value_name = "DUMP")]
        path: PathBuf,

        /// Snapshot to write
        #[arg(long, default_value = "catalog.json")]
        out: PathBuf,

        /// Existing snapshot to merge into
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Filter and page through the catalog
    Query {
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// 0 uses the configured default
        #[arg(long, default_value_t = 0)]
        per_page: usize,
    },

    /// List the filter values present in the catalog
    Filters {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate a deck list and print its report and statistics
    Validate {
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(value_name = "DECK")]
        deck: PathBuf,
    },

    /// Play a scripted duel between two deck lists
    Duel {
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// JSON array of {"actor": ..., "action": {...}}
        #[arg(long, value_name = "FILE")]
        script: PathBuf,

        #[arg(long, default_value = "player1")]
        p1_name: String,

        #[arg(long, default_value = "player2")]
        p2_name: String,

        /// Seat that acts first (0 or 1); random when absent
        #[arg(long)]
        first_player: Option<usize>,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    card_type: Option<String>,
    #[arg(long)]
    element: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    weapon_type: Option<String>,
    #[arg(long)]
    character_subtype: Option<String>,
    #[arg(long)]
    rarity: Option<u8>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    energy_cost: Option<String>,
}

impl From<FilterArgs> for RawFilter {
    fn from(args: FilterArgs) -> Self {
        RawFilter {
            card_type: args.card_type,
            element: args.element,
            country: args.country,
            weapon_type: args.weapon_type,
            character_subtype: args.character_subtype,
            rarity: args.rarity,
            tags: args.tags,
            search: args.search,
            energy_cost: args.energy_cost,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScriptStep {
    actor: PlayerId,
    action: Action,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Ingest { path, out, catalog } => run_ingest(&path, &out, catalog).await,
        Commands::Query {
            catalog,
            filter,
            page,
            per_page,
        } => {
            let service = open_service(config, catalog).await?;
            let ctx = RequestContext::anonymous();
            print_envelope(&service.catalog_query(&ctx, filter.into(), page, per_page))
        }
        Commands::Filters { catalog } => {
            let service = open_service(config, catalog).await?;
            print_envelope(&service.filter_options(&RequestContext::anonymous()))
        }
        Commands::Validate { catalog, deck } => {
            let service = open_service(config, catalog).await?;
            run_validate(&service, &deck)
        }
        Commands::Duel {
            catalog,
            deck1,
            deck2,
            script,
            p1_name,
            p2_name,
            first_player,
        } => {
            let service = open_service(config, catalog).await?;
            run_duel(
                &service,
                [&deck1, &deck2],
                &script,
                [PlayerId::new(p1_name), PlayerId::new(p2_name)],
                first_player,
            )
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(p) = cli.omni_probability {
        config.engine.omni_probability = p;
    }
    if let Some(level) = cli.verbosity {
        config.engine.verbosity = level;
    }
    config.validate()?;
    Ok(config)
}

async fn open_service(
    config: ServiceConfig,
    catalog: Option<PathBuf>,
) -> anyhow::Result<TcgService> {
    let path = catalog
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| anyhow!("no catalog given (use --catalog or catalog_path in the config)"))?;
    let store = CatalogStore::load_async(&path)
        .await
        .with_context(|| format!("loading catalog {}", path.display()))?;
    tracing::info!(cards = store.snapshot().len(), path = %path.display(), "catalog loaded");
    Ok(TcgService::new(Arc::new(store), config))
}

async fn run_ingest(path: &Path, out: &Path, existing: Option<PathBuf>) -> anyhow::Result<()> {
    let store = match existing {
        Some(existing) => CatalogStore::load_async(&existing).await?,
        None => CatalogStore::new(),
    };
    let ingestor = Ingestor::new()?;
    let report = if path.is_dir() {
        ingestor.ingest_dir(&store, path)?
    } else {
        ingestor.ingest_file(&store, path)?
    };
    for skipped in &report.skipped {
        tracing::warn!(
            section = %skipped.section,
            index = skipped.index,
            name = skipped.name.as_deref().unwrap_or("?"),
            reason = %skipped.reason,
            "record skipped"
        );
    }
    store.save(out)?;
    tracing::info!(
        accepted = report.accepted,
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped_count(),
        out = %out.display(),
        "ingest finished"
    );
    Ok(())
}

fn run_validate(service: &TcgService, deck: &Path) -> anyhow::Result<()> {
    let ids = DeckList::load_from_file(deck)?
        .resolve(&service.catalog().snapshot())?
        .ids();
    let ctx = RequestContext::anonymous();
    print_envelope(&service.deck_validate(&ctx, &ids))?;
    print_envelope(&service.deck_stats(&ctx, &ids))
}

fn run_duel(
    service: &TcgService,
    decks: [&Path; 2],
    script: &Path,
    seats: [PlayerId; 2],
    first_player: Option<usize>,
) -> anyhow::Result<()> {
    let snapshot = service.catalog().snapshot();
    let deck_ids = |path: &Path| -> anyhow::Result<_> {
        Ok(DeckList::load_from_file(path)
            .with_context(|| format!("loading deck {}", path.display()))?
            .resolve(&snapshot)?
            .ids())
    };
    let steps: Vec<ScriptStep> = serde_json::from_str(
        &std::fs::read_to_string(script)
            .with_context(|| format!("reading script {}", script.display()))?,
    )?;

    let [host, guest] = seats;
    let host_ctx = RequestContext::for_user(host.clone());
    let duel_id = service
        .duel_create(
            &host_ctx,
            CreateDuelRequest {
                opponent: guest,
                deck: deck_ids(decks[0])?,
                opponent_deck: deck_ids(decks[1])?,
                first_player,
                duel_id: None,
            },
        )
        .into_result()
        .map_err(|e| anyhow!("{}: {}", e.kind, e.message))?;

    for (i, step) in steps.into_iter().enumerate() {
        let ctx = RequestContext::for_user(step.actor.clone());
        let kind = step.action.kind();
        let outcome = service
            .duel_submit(&ctx, &duel_id, step.action)
            .into_result()
            .map_err(|e| anyhow!("step {i} ({} {kind}): {}: {}", step.actor, e.kind, e.message))?;
        if !outcome.view.terminal.is_running() {
            tracing::info!(step = i, "duel finished");
            break;
        }
    }

    print_envelope(&service.duel_view(&host_ctx, &duel_id))
}

fn print_envelope<T: serde::Serialize>(envelope: &Envelope<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    if let Some(err) = &envelope.error {
        bail!("{}: {}", err.kind, err.message);
    }
    Ok(())
}
