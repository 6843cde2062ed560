//! Command sources: where per-territory orders come from.
//!
//! The tick orchestrator asks a [`CommandSource`] for this tick's
//! commands before running the subsystem pipeline. Production engines
//! plug an external decision pipeline in here; tests and headless runs
//! use the stub (every territory rests) or a scripted source.

use std::collections::BTreeMap;

use dominion_types::{Territory, TerritoryCommand};

/// Errors a command source can raise.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The source could not produce commands this tick.
    #[error("command source unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Supplies at most one command per territory per tick.
///
/// A missing command for a territory is not an error: the subsystems
/// fall back to the deterministic default (rest).
pub trait CommandSource: Send {
    /// Produce the commands for `tick`, given the territories about to
    /// be processed.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the source failed outright; the
    /// orchestrator aborts the tick without committing anything.
    fn commands_for_tick(
        &mut self,
        tick: u64,
        territories: &[Territory],
    ) -> Result<Vec<TerritoryCommand>, CommandError>;
}

/// A source that never issues commands: every territory rests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCommandSource;

impl CommandSource for StubCommandSource {
    fn commands_for_tick(
        &mut self,
        _tick: u64,
        _territories: &[Territory],
    ) -> Result<Vec<TerritoryCommand>, CommandError> {
        Ok(Vec::new())
    }
}

/// A source fed from a pre-built script, keyed by tick number.
///
/// Used by integration tests and demo runs to drive deterministic
/// scenarios without an external decision pipeline.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommandSource {
    by_tick: BTreeMap<u64, Vec<TerritoryCommand>>,
}

impl ScriptedCommandSource {
    /// An empty script.
    pub const fn new() -> Self {
        Self {
            by_tick: BTreeMap::new(),
        }
    }

    /// Schedule a command for its tick.
    pub fn push(&mut self, command: TerritoryCommand) {
        self.by_tick.entry(command.tick).or_default().push(command);
    }
}

impl CommandSource for ScriptedCommandSource {
    fn commands_for_tick(
        &mut self,
        tick: u64,
        _territories: &[Territory],
    ) -> Result<Vec<TerritoryCommand>, CommandError> {
        Ok(self.by_tick.remove(&tick).unwrap_or_default())
    }
}
