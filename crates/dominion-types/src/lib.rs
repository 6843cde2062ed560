//! Shared type definitions for the Dominion simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Dominion workspace: the world singleton, territory records, the event
//! log, streaks and records, and the command envelope delivered by the
//! external decision pipeline.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Enumeration types (run status, speed, measures, streaks)
//! - [`structs`] -- Core entity structs (world, territory, event, streak)
//! - [`commands`] -- Pre-resolved per-territory commands for one tick
//! - [`drafts`] -- Staged mutations (event drafts, streak ops, records)

pub mod commands;
pub mod drafts;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{CommandAction, TerritoryCommand};
pub use drafts::{EventDraft, RecordSubmission, StreakOp};
pub use enums::{
    EmergencyMeasure, EventSeverity, EventType, RecordType, Right, RunStatus, SimSpeed,
    StreakEndReason, StreakType,
};
pub use ids::{EventId, TerritoryId};
pub use structs::{
    Event, FightingPopulation, GenderRolesState, Streak, Territory, WorldRecord, WorldSnapshot,
    WorldState,
};
