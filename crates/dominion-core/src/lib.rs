//! Tick orchestration and run control for the Dominion simulation.
//!
//! This crate ties the world store and the subsystem pipeline together:
//!
//! - [`tick`] -- the orchestrator: one invocation, one atomic step
//! - [`controller`] -- start/pause/speed/manual-tick operations
//! - [`runner`] -- the bounded async loop with operator controls
//! - [`command`] -- where per-territory orders come from
//! - [`config`] -- typed YAML configuration

pub mod command;
pub mod config;
pub mod controller;
pub mod runner;
pub mod tick;

pub use command::{CommandError, CommandSource, ScriptedCommandSource, StubCommandSource};
pub use config::{ConfigError, SimulationConfig};
pub use controller::ControlError;
pub use runner::{
    run_simulation, NoOpCallback, RunControl, RunnerError, SimulationEndReason, SimulationResult,
    TickCallback,
};
pub use tick::{Simulation, TickError, TickSummary};
