//! Headless spell engine server.
//!
//! Loads content from `SPELL_DATA_DIR`, builds the runtime with file-backed
//! caster persistence, attaches demonstration behaviours to the catalog and
//! runs a small scripted simulation until Ctrl-C.
//!
//! ```bash
//! RUST_LOG=spell_runtime=debug SPELL_BACKEND=regional cargo run -p spell-server
//! ```

mod logging;
mod simulation;
mod spells;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use spell_content::ContentFactory;
use spell_core::{Location, SpellDefinition, WorldId};
use spell_runtime::{
    EntityTable, Event, FileCasterRepo, NoCastZones, Runtime, RuntimeConfig, SpellRegistry, Topic,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use simulation::Simulation;

const DEFAULT_DATA_DIR: &str = "crates/spell/content/data";
const DEFAULT_SIMULATED_CASTERS: u64 = 6;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = logging::init()?;

    let data_dir = env::var_os("SPELL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let content = ContentFactory::new(&data_dir);

    let settings = content
        .load_settings()
        .with_context(|| format!("loading settings from {}", data_dir.display()))?;
    let config = RuntimeConfig {
        magic: settings.magic,
        ..RuntimeConfig::default()
    }
    .with_env_overrides();

    let registry = Arc::new(SpellRegistry::new());
    for spec in content.load_spells().context("loading spell catalog")? {
        let behavior = spells::behavior_for(&spec.name);
        registry.register(SpellDefinition::from(spec), behavior);
    }

    let save_dir = env::var_os("SPELL_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(FileCasterRepo::default_dir);
    let repository = FileCasterRepo::new(&save_dir)
        .with_context(|| format!("opening caster store at {}", save_dir.display()))?;

    let entities = Arc::new(EntityTable::new());
    let spawn = NoCastZones::new("spawn").with_zone(Location::new(WorldId(0), 0.0, 64.0, 0.0), 8.0);

    let runtime = Runtime::builder()
        .config(config)
        .spells(registry)
        .entities(entities.clone())
        .repository(Arc::new(repository))
        .perks(content.load_perks().context("loading perks")?)
        .houses(content.load_houses().context("loading houses")?)
        .protection(Arc::new(spawn))
        .build()
        .await
        .context("building runtime")?;

    info!(
        backend = runtime.scheduler().backend_name(),
        domains = runtime.scheduler().domain_count(),
        spells = runtime.engine().spells().len(),
        data_dir = %data_dir.display(),
        save_dir = %save_dir.display(),
        "spell server started"
    );

    let stops = tokio::spawn(log_spell_events(runtime.subscribe(Topic::Spell)));

    let casters = env::var("SPELL_SIMULATED_CASTERS")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_SIMULATED_CASTERS);
    let simulation = Simulation::start(&runtime, entities, casters)?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("shutdown requested");

    simulation.stop();
    runtime.shutdown().await.context("shutting down runtime")?;
    stops.abort();

    info!("spell server stopped");
    Ok(())
}

async fn log_spell_events(mut events: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => debug!(target: "spell_server::events", ?event, "spell event"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "spell_server::events", skipped, "event stream lagged");
            }
            Err(RecvError::Closed) => return,
        }
    }
}
