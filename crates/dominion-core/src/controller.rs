//! Run control: start, pause, speed changes, and manual stepping.
//!
//! These operations are the only writers of the world's status and
//! speed. Every accepted transition appends a system event so the
//! control history is visible in the same feed as the simulation's own
//! events.

use dominion_types::{EventDraft, RunStatus, SimSpeed};
use tracing::info;

use crate::command::CommandSource;
use crate::tick::{Simulation, TickError, TickSummary};

/// Errors raised by run control operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// `start` was called while the simulation was already running.
    #[error("simulation is already running")]
    AlreadyRunning,

    /// `pause` was called while the simulation was not running.
    #[error("simulation is not running")]
    NotRunning,

    /// The manually stepped tick failed.
    #[error("manual tick failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

impl Simulation {
    /// Start (or resume) the simulation.
    ///
    /// A paused speed resumes at `Normal`; any other selected speed is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::AlreadyRunning`] if already running.
    pub fn start(&mut self) -> Result<(), ControlError> {
        let world = self.store().world();
        if world.is_running() {
            return Err(ControlError::AlreadyRunning);
        }
        let speed = if world.speed.is_paused() {
            SimSpeed::Normal
        } else {
            world.speed
        };
        self.store_mut().set_status_speed(RunStatus::Running, speed);
        self.store_mut().append_system_event(EventDraft::system(
            "Simulation started",
            format!("Running at {speed:?} speed"),
        ));
        info!(?speed, "simulation started");
        Ok(())
    }

    /// Pause the simulation. Scheduled tick invocations that still
    /// arrive afterwards are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotRunning`] if not running.
    pub fn pause(&mut self) -> Result<(), ControlError> {
        if !self.store().world().is_running() {
            return Err(ControlError::NotRunning);
        }
        self.store_mut()
            .set_status_speed(RunStatus::Paused, SimSpeed::Paused);
        self.store_mut().append_system_event(EventDraft::system(
            "Simulation paused",
            "The world holds its breath",
        ));
        info!("simulation paused");
        Ok(())
    }

    /// Change the simulation speed.
    ///
    /// Status follows the speed: selecting `Paused` pauses the loop,
    /// and selecting any running speed while paused resumes it. The
    /// runner observes the change at its next wake-up.
    pub fn set_speed(&mut self, speed: SimSpeed) {
        let status = if speed.is_paused() {
            RunStatus::Paused
        } else {
            RunStatus::Running
        };
        self.store_mut().set_status_speed(status, speed);
        self.store_mut().append_system_event(EventDraft::system(
            "Speed changed",
            format!("Speed set to {speed:?}"),
        ));
        info!(?speed, ?status, "speed changed");
    }

    /// Execute exactly one tick regardless of the current status. A
    /// world that is not running is stepped once and returned to the
    /// status it had before, even if the tick fails; a running world
    /// simply steps.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Tick`] if the stepped tick fails.
    pub fn manual_tick(
        &mut self,
        source: &mut dyn CommandSource,
    ) -> Result<TickSummary, ControlError> {
        let world = self.store().world();
        if world.is_running() {
            let summary = self.process_tick(source)?;
            info!(tick = summary.tick, "manual tick executed");
            return Ok(summary);
        }
        // The forced step runs at a non-paused speed so the running
        // status never coexists with a paused speed.
        let step_speed = if world.speed.is_paused() {
            SimSpeed::Normal
        } else {
            world.speed
        };
        self.store_mut()
            .set_status_speed(RunStatus::Running, step_speed);
        let outcome = self.process_tick(source);
        self.store_mut().set_status_speed(world.status, world.speed);

        let summary = outcome?;
        info!(tick = summary.tick, "manual tick executed");
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_store::WorldStore;
    use dominion_types::{RunStatus, Territory};

    use super::*;
    use crate::command::StubCommandSource;

    fn simulation_with_territory() -> Simulation {
        let mut store = WorldStore::new();
        store
            .create_territory(Territory::new("Aldmark", 0, 1000))
            .unwrap();
        Simulation::new(store)
    }

    #[test]
    fn start_transitions_to_running_at_normal_speed() {
        let mut sim = simulation_with_territory();
        sim.start().unwrap();

        let world = sim.store().world();
        assert_eq!(world.status, RunStatus::Running);
        assert_eq!(world.speed, SimSpeed::Normal);
        assert!(
            sim.store()
                .events()
                .iter()
                .any(|e| e.title == "Simulation started")
        );
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut sim = simulation_with_territory();
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(ControlError::AlreadyRunning)));
    }

    #[test]
    fn pause_requires_a_running_simulation() {
        let mut sim = simulation_with_territory();
        assert!(matches!(sim.pause(), Err(ControlError::NotRunning)));

        sim.start().unwrap();
        sim.pause().unwrap();
        let world = sim.store().world();
        assert_eq!(world.status, RunStatus::Paused);
        assert!(world.speed.is_paused());
    }

    #[test]
    fn set_speed_paused_pauses_a_running_world() {
        let mut sim = simulation_with_territory();
        sim.start().unwrap();
        sim.set_speed(SimSpeed::Paused);
        assert_eq!(sim.store().world().status, RunStatus::Paused);
    }

    #[test]
    fn set_speed_from_paused_resumes_the_world() {
        let mut sim = simulation_with_territory();
        sim.set_speed(SimSpeed::Blitz);
        let world = sim.store().world();
        assert_eq!(world.speed, SimSpeed::Blitz);
        assert_eq!(world.status, RunStatus::Running);
    }

    #[test]
    fn start_keeps_a_previously_selected_speed() {
        let mut sim = simulation_with_territory();
        sim.store_mut()
            .set_status_speed(RunStatus::Paused, SimSpeed::Fast);
        sim.start().unwrap();
        assert_eq!(sim.store().world().speed, SimSpeed::Fast);
    }

    #[test]
    fn manual_tick_advances_once_and_restores_the_prior_status() {
        let mut sim = simulation_with_territory();
        let mut source = StubCommandSource;

        let summary = sim.manual_tick(&mut source).unwrap();
        assert!(summary.executed);
        assert_eq!(summary.tick, 0);

        // A never-started world returns to its pre-step status.
        let world = sim.store().world();
        assert_eq!(world.tick, 1);
        assert_eq!(world.status, RunStatus::Initializing);
        assert!(world.speed.is_paused());
    }

    #[test]
    fn manual_tick_returns_a_paused_world_to_paused() {
        let mut sim = simulation_with_territory();
        sim.start().unwrap();
        sim.pause().unwrap();
        let mut source = StubCommandSource;

        sim.manual_tick(&mut source).unwrap();
        let world = sim.store().world();
        assert_eq!(world.status, RunStatus::Paused);
        assert!(world.speed.is_paused());
    }

    #[test]
    fn manual_tick_on_a_running_world_steps_without_pausing() {
        let mut sim = simulation_with_territory();
        sim.start().unwrap();
        let mut source = StubCommandSource;

        let summary = sim.manual_tick(&mut source).unwrap();
        assert!(summary.executed);
        let world = sim.store().world();
        assert_eq!(world.tick, 1);
        assert_eq!(world.status, RunStatus::Running);
    }
}
