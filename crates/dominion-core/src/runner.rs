//! The async simulation loop with operator controls.
//!
//! [`run_simulation`] drives the tick loop around
//! [`Simulation::process_tick`](crate::tick::Simulation::process_tick):
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: a paused world parks the loop until woken
//! - **Variable speed**: the sleep between ticks is derived from the
//!   world's selected speed each iteration
//! - **Clean shutdown**: stop request, elimination of the last
//!   territory, or a bound produces a [`SimulationResult`]
//!
//! The loop holds the simulation behind a `tokio` mutex so control
//! operations (start, pause, speed, manual tick) can be issued from
//! other tasks between iterations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dominion_store::WorldStore;
use dominion_types::SimSpeed;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::command::CommandSource;
use crate::config::RunBoundsConfig;
use crate::tick::{Simulation, TickError, TickSummary};

/// How long a parked loop waits before re-checking stop requests, in
/// case a wake notification was missed.
const PARK_RECHECK_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Reason why the simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator requested a stop.
    OperatorStop,
    /// Every territory has been eliminated.
    AllTerritoriesEliminated,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// The last executed tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Total number of executed (non-skipped) ticks.
    pub total_ticks: u64,
}

/// Shared control handle for a running loop.
///
/// Wrapped in [`Arc`] and shared between the loop task and whatever
/// issues operator commands. The stop flag is atomic so the loop reads
/// it without locking; pause state itself lives in the world store.
#[derive(Debug)]
pub struct RunControl {
    stop_requested: AtomicBool,
    /// Wakes a parked loop after the world is resumed.
    wake: Notify,
    started_at: DateTime<Utc>,
    max_ticks: u64,
    max_real_time_seconds: u64,
    /// Milliseconds per tick at `Normal` speed.
    base_interval_ms: u64,
}

impl RunControl {
    /// Create a control handle from the run bounds.
    pub fn new(base_interval_ms: u64, bounds: &RunBoundsConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            wake: Notify::new(),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            base_interval_ms,
        }
    }

    /// Request a clean stop. The loop exits before the next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wake a loop parked on a paused world. Call after resuming.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Park until woken or until the recheck interval elapses.
    async fn parked(&self) {
        tokio::select! {
            () = self.wake.notified() => {}
            () = tokio::time::sleep(PARK_RECHECK_INTERVAL) => {}
        }
    }

    /// Whether `executed_ticks` has reached the tick bound.
    const fn tick_limit_reached(&self, executed_ticks: u64) -> bool {
        self.max_ticks > 0 && executed_ticks >= self.max_ticks
    }

    /// Whether the wall-clock bound has been reached.
    fn time_limit_reached(&self) -> bool {
        if self.max_real_time_seconds == 0 {
            return false;
        }
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX) >= self.max_real_time_seconds
    }

    /// The sleep before the next scheduled tick, derived from the
    /// world's speed. `None` means no tick should be scheduled.
    pub const fn interval_for(&self, speed: SimSpeed) -> Option<Duration> {
        let ms = match speed {
            SimSpeed::Paused => return None,
            SimSpeed::Normal => self.base_interval_ms,
            SimSpeed::Fast => self.base_interval_ms / 10,
            SimSpeed::Blitz => self.base_interval_ms / 100,
        };
        Some(Duration::from_millis(ms))
    }
}

/// Callback invoked after each executed tick.
///
/// Implementations publish snapshots, feed dashboards, etc.
pub trait TickCallback: Send {
    /// Called after a tick commits successfully.
    fn on_tick(&mut self, summary: &TickSummary, store: &WorldStore);
}

/// A no-op tick callback for headless runs and tests.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _store: &WorldStore) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably; a
/// failed tick commits nothing, so the world is left at its last
/// consistent state.
pub async fn run_simulation(
    simulation: &Mutex<Simulation>,
    source: &mut dyn CommandSource,
    control: &Arc<RunControl>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = control.max_ticks,
        max_real_time_seconds = control.max_real_time_seconds,
        base_interval_ms = control.base_interval_ms,
        "simulation loop starting"
    );

    loop {
        if control.is_stop_requested() {
            info!("operator stop requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::OperatorStop,
                final_summary: last_summary,
                total_ticks,
            });
        }

        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds,
                "real-time limit reached"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxRealTimeReached,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // Lock only around the tick itself so control operations can
        // interleave between iterations.
        let outcome = {
            let mut sim = simulation.lock().await;
            if sim.store().world().is_running() {
                let summary = sim.process_tick(source)?;
                total_ticks = total_ticks.saturating_add(1);
                callback.on_tick(&summary, sim.store());
                let all_eliminated = sim.store().territory_count() > 0
                    && sim.store().active_territories().next().is_none();
                Some((summary, sim.store().world().speed, all_eliminated))
            } else {
                None
            }
        };

        let Some((summary, speed, all_eliminated)) = outcome else {
            debug!("world not running; loop parked");
            control.parked().await;
            continue;
        };

        if all_eliminated {
            info!(tick = summary.tick, "all territories eliminated");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::AllTerritoriesEliminated,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        if control.tick_limit_reached(total_ticks) {
            info!(
                tick = summary.tick,
                max_ticks = control.max_ticks,
                "tick limit reached"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        match control.interval_for(speed) {
            Some(interval) if !interval.is_zero() => tokio::time::sleep(interval).await,
            _ => {}
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "simulation ended"
    );

    if result.final_summary.is_none() {
        warn!("simulation ended with no ticks executed");
    }
}
