//! Engine binary for the Dominion simulation.
//!
//! Wires the world store, subsystem pipeline, run controller, and the
//! async tick loop together for a headless run.
//!
//! # Startup sequence
//!
//! 1. Load configuration from `dominion-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Seed the world store with the configured territories
//! 4. Start the simulation through the run controller
//! 5. Run the bounded tick loop until a termination condition
//! 6. Log the result

mod error;

use std::path::Path;
use std::sync::Arc;

use dominion_core::config::LoggingConfig;
use dominion_core::runner::{self, NoOpCallback, RunControl};
use dominion_core::{Simulation, SimulationConfig, StubCommandSource};
use dominion_store::WorldStore;
use dominion_types::Territory;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file path, overridable via `DOMINION_CONFIG`.
const DEFAULT_CONFIG_PATH: &str = "dominion-config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration first, so logging can honor it.
    let (config, config_path) = load_config()?;

    // 2. Structured logging; RUST_LOG overrides the configured level.
    init_logging(&config.logging);

    info!("dominion-engine starting");
    info!(
        config_path = config_path.as_deref().unwrap_or("<defaults>"),
        world_name = config.world.name,
        base_tick_interval_ms = config.world.base_tick_interval_ms,
        max_ticks = config.bounds.max_ticks,
        territory_count = config.territories.len(),
        "configuration loaded"
    );

    // 3. Seed the world.
    let store = seed_store(&config)?;
    info!(territories = store.territory_count(), "world seeded");

    // 4. Start the simulation.
    let mut sim = Simulation::new(store);
    sim.start().map_err(EngineError::from)?;
    let simulation = Mutex::new(sim);

    // 5. Run the loop.
    let control = Arc::new(RunControl::new(
        config.world.base_tick_interval_ms,
        &config.bounds,
    ));
    let mut source = StubCommandSource;
    let mut callback = NoOpCallback;
    let result = runner::run_simulation(&simulation, &mut source, &control, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 6. Final report.
    runner::log_simulation_end(&result);
    let snapshot = simulation.lock().await.store().snapshot();
    info!(
        final_tick = snapshot.world.tick,
        events = snapshot.events.len(),
        streaks = snapshot.streaks.len(),
        records = snapshot.records.len(),
        "final world state"
    );

    Ok(())
}

/// Initialize the tracing subscriber from the logging config.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load configuration from `DOMINION_CONFIG` or the default path,
/// falling back to built-in defaults when no file exists. Returns the
/// path actually used, if any.
fn load_config() -> Result<(SimulationConfig, Option<String>), EngineError> {
    let path = std::env::var("DOMINION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    if Path::new(&path).exists() {
        let config = SimulationConfig::from_file(Path::new(&path))?;
        Ok((config, Some(path)))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

/// Build the starting store from the configured territory seeds.
fn seed_store(config: &SimulationConfig) -> Result<WorldStore, EngineError> {
    let mut store = WorldStore::new();
    for seed in &config.territories {
        let mut territory = Territory::new(seed.name.clone(), 0, seed.population);
        territory.education_level = seed.education_level;
        territory.militarism = seed.militarism;
        territory.wealth = seed.wealth;
        store.create_territory(territory)?;
    }
    Ok(store)
}
