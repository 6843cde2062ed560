//! The tick orchestrator: one invocation, one atomic world step.
//!
//! Each invocation checks the run status, gathers this tick's commands,
//! runs the subsystem pipeline over every non-eliminated territory in
//! creation order, and commits everything (territory updates, events,
//! streak ops, record candidates) in a single store transaction. The
//! tick counter advances by exactly 1 per committed step; a failed step
//! commits nothing and advances nothing.

use dominion_store::{StoreError, WorldStore};
use dominion_systems::{index_commands, AchievementsView, Pipeline, TickContext};
use dominion_types::Territory;
use tracing::{debug, info};

use crate::command::{CommandError, CommandSource};

/// Errors that can occur while processing a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The command source failed.
    #[error("command error: {source}")]
    Command {
        /// The underlying command error.
        #[from]
        source: CommandError,
    },

    /// The store rejected the transaction.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Summary of a single tick invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number this invocation addressed.
    pub tick: u64,
    /// Whether the tick actually executed. `false` means the run
    /// status was not `Running` and the invocation was a no-op.
    pub executed: bool,
    /// Number of territories processed.
    pub territories_processed: usize,
    /// Number of events appended by the committed transaction.
    pub events_appended: usize,
    /// Number of best-ever records replaced.
    pub records_replaced: usize,
}

impl TickSummary {
    const fn skipped(tick: u64) -> Self {
        Self {
            tick,
            executed: false,
            territories_processed: 0,
            events_appended: 0,
            records_replaced: 0,
        }
    }
}

/// The simulation: the world store plus the subsystem pipeline.
///
/// Owned by a single logical writer. Run control operations live in
/// [`crate::controller`]; the async loop around it in [`crate::runner`].
#[derive(Debug)]
pub struct Simulation {
    store: WorldStore,
    pipeline: Pipeline,
}

impl Simulation {
    /// Build a simulation over a store with the standard pipeline.
    pub fn new(store: WorldStore) -> Self {
        Self {
            store,
            pipeline: Pipeline::standard(),
        }
    }

    /// Build a simulation with a custom pipeline, mainly for tests.
    pub const fn with_pipeline(store: WorldStore, pipeline: Pipeline) -> Self {
        Self { store, pipeline }
    }

    /// Read access to the store.
    pub const fn store(&self) -> &WorldStore {
        &self.store
    }

    /// Mutable access to the store, for control-plane operations.
    pub const fn store_mut(&mut self) -> &mut WorldStore {
        &mut self.store
    }

    /// Process one tick.
    ///
    /// A no-op returning an unexecuted summary unless the run status is
    /// `Running`; a stray scheduled invocation arriving after a pause
    /// changes nothing. Otherwise runs the pipeline over every active
    /// territory in creation order and commits atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the command source fails or the store
    /// rejects the commit. Nothing is applied in either case.
    pub fn process_tick(
        &mut self,
        source: &mut dyn CommandSource,
    ) -> Result<TickSummary, TickError> {
        let world = self.store.world();
        if !world.is_running() {
            debug!(
                tick = world.tick,
                status = ?world.status,
                "tick invocation skipped; simulation is not running"
            );
            return Ok(TickSummary::skipped(world.tick));
        }

        let mut txn = self.store.begin_tick();
        let tick = txn.tick();

        let territories: Vec<Territory> = self.store.active_territories().cloned().collect();
        let commands = source.commands_for_tick(tick, &territories)?;
        let by_territory = index_commands(&commands);
        let records = self.store.records();

        for territory in &territories {
            let ctx = TickContext {
                tick,
                command: by_territory.get(&territory.id).copied(),
                achievements: AchievementsView {
                    streaks: self.store.streaks(),
                    records: &records,
                },
            };
            let step = self.pipeline.run_for_territory(territory, &ctx);
            txn.update_territory(step.territory);
            txn.append_events(step.events);
            for op in step.streak_ops {
                txn.push_streak_op(op);
            }
            for submission in step.record_submissions {
                txn.submit_record(submission);
            }
        }

        let commit = self.store.commit(txn)?;
        info!(
            tick = commit.tick,
            territories = territories.len(),
            events = commit.events_appended,
            records_replaced = commit.records_replaced,
            "tick committed"
        );

        Ok(TickSummary {
            tick: commit.tick,
            executed: true,
            territories_processed: territories.len(),
            events_appended: commit.events_appended,
            records_replaced: commit.records_replaced,
        })
    }
}
