//! Core entity structs for the Dominion simulation.
//!
//! The world singleton, territory records with their subsystem-owned
//! sub-records, the append-only event log entry, streaks, best-ever
//! records, and the read-only snapshot served to downstream consumers.
//!
//! Sub-records carry `#[serde(default)]` so a missing or partially
//! populated record loaded from persisted data falls back to documented
//! defaults instead of failing the whole territory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    EmergencyMeasure, EventSeverity, EventType, RecordType, RunStatus, SimSpeed, StreakEndReason,
    StreakType,
};
use crate::ids::{EventId, TerritoryId};

/// The world singleton: tick counter, run status, and selected speed.
///
/// `tick` counts simulated months and is advanced only by the tick
/// orchestrator at the end of a successfully committed step. `status`
/// and `speed` are mutated only by the run controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// Monotonically increasing tick counter (one per simulated month).
    pub tick: u64,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Current operator-selected speed.
    pub speed: SimSpeed,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            tick: 0,
            status: RunStatus::Initializing,
            speed: SimSpeed::Paused,
        }
    }
}

impl WorldState {
    /// Whether the orchestrator may advance state on the next step.
    pub const fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running)
    }
}

/// Sub-record owned by the progressive-rights subsystem.
///
/// `progress_level` only ever rises through natural progress; the four
/// booleans are set irreversibly when it crosses their thresholds.
/// Manual grant/restrict commands are the only other mutation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderRolesState {
    /// Monotone reform progress in `[0, 100]`.
    pub progress_level: f64,
    /// Right to work (threshold 20).
    pub can_work: bool,
    /// Right to own property (threshold 40).
    pub can_own_property: bool,
    /// Right to rule (threshold 70).
    pub can_rule: bool,
    /// Right to fight in the military (threshold 90).
    pub can_fight: bool,
}

impl Default for GenderRolesState {
    fn default() -> Self {
        Self {
            progress_level: 0.0,
            can_work: false,
            can_own_property: false,
            can_rule: false,
            can_fight: false,
        }
    }
}

/// Sub-record owned by the war-demographics subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightingPopulation {
    /// Men currently eligible for conscription.
    pub eligible_men: u64,
    /// Women currently eligible for conscription (0 unless permitted).
    pub eligible_women: u64,
    /// Soldiers currently under arms.
    pub current_soldiers: u64,
    /// Accumulated war weariness in `[0, 100]`.
    pub war_weariness: f64,
    /// Widows derived from recorded casualties.
    pub widows: u64,
    /// Orphans derived from recorded casualties.
    pub orphans: u64,
    /// Active emergency measure (strictly ordered ratchet).
    pub emergency_measures: EmergencyMeasure,
}

impl Default for FightingPopulation {
    fn default() -> Self {
        Self {
            eligible_men: 0,
            eligible_women: 0,
            current_soldiers: 0,
            war_weariness: 0.0,
            widows: 0,
            orphans: 0,
            emergency_measures: EmergencyMeasure::None,
        }
    }
}

/// One simulated party with persistent state.
///
/// Shared scalar fields (`population`, `happiness`, `wealth`, ...) are
/// the cross-subsystem integration surface: any subsystem may adjust
/// them through its returned deltas. The sub-records are owned
/// exclusively by their subsystem and may only be *read* by others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    /// Unique identifier.
    pub id: TerritoryId,
    /// Display name.
    pub name: String,
    /// Tick at which this territory was created; defines the stable
    /// processing order within a tick.
    pub created_at_tick: u64,
    /// Total population.
    pub population: u64,
    /// Aggregate happiness in `[0, 100]`.
    pub happiness: f64,
    /// Accumulated wealth.
    pub wealth: f64,
    /// Education level in `[0, 100]`.
    pub education_level: f64,
    /// Militarism in `[0, 100]`.
    pub militarism: f64,
    /// Whether the territory is currently at war.
    pub at_war: bool,
    /// Soft-delete flag; eliminated territories are skipped by the
    /// orchestrator but never removed, so historical references stay
    /// valid.
    pub is_eliminated: bool,
    /// Progressive-rights sub-record (owned by the gender-roles system).
    #[serde(default)]
    pub gender_roles: GenderRolesState,
    /// Manpower sub-record (owned by the war-demographics system).
    #[serde(default)]
    pub fighting_population: FightingPopulation,
}

impl Territory {
    /// Create a territory with neutral starting scalars.
    pub fn new(name: impl Into<String>, created_at_tick: u64, population: u64) -> Self {
        Self {
            id: TerritoryId::new(),
            name: name.into(),
            created_at_tick,
            population,
            happiness: 50.0,
            wealth: 0.0,
            education_level: 10.0,
            militarism: 50.0,
            at_war: false,
            is_eliminated: false,
            gender_roles: GenderRolesState::default(),
            fighting_population: FightingPopulation::default(),
        }
    }
}

/// An entry in the append-only event log.
///
/// Written by subsystems and the orchestrator, read-only for external
/// observers. No ordering guarantee beyond tick monotonicity within a
/// single tick's batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Tick during which the event occurred.
    pub tick: u64,
    /// Broad category.
    pub event_type: EventType,
    /// Severity for feed filtering.
    pub severity: EventSeverity,
    /// Short headline.
    pub title: String,
    /// Longer human-readable description.
    pub description: String,
    /// The territory the event concerns, if any.
    pub territory_id: Option<TerritoryId>,
    /// Wall-clock time the event was committed.
    pub recorded_at: DateTime<Utc>,
}

/// A counter of consecutive ticks a condition has held for a territory.
///
/// At most one *active* streak exists per `(territory, streak_type)`.
/// `current_length` increases by exactly 1 per tick the condition holds;
/// the record transitions to inactive (never deleted) the first tick the
/// condition fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// The territory the streak belongs to.
    pub territory_id: TerritoryId,
    /// Which condition this streak tracks.
    pub streak_type: StreakType,
    /// Tick at which the condition first held.
    pub start_tick: u64,
    /// Number of consecutive ticks the condition has held.
    pub current_length: u64,
    /// Whether the streak is still running.
    pub is_active: bool,
    /// Condition baseline captured when the streak opened (used by
    /// comparative predicates such as population growth).
    pub baseline: f64,
    /// Tick at which the streak ended, once inactive.
    pub end_tick: Option<u64>,
    /// Why the streak ended, once inactive.
    pub end_reason: Option<StreakEndReason>,
}

/// The best-ever observed value for a named metric.
///
/// One row per [`RecordType`], superseded in place and never duplicated.
/// Replacement requires a *strictly* greater value, so ties preserve the
/// earliest holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    /// Which metric this record tracks.
    pub record_type: RecordType,
    /// The territory holding the record.
    pub territory_id: TerritoryId,
    /// The best value seen so far.
    pub value: f64,
    /// Tick at which the current value was first achieved.
    pub set_at_tick: u64,
    /// Optional human-readable context.
    pub description: Option<String>,
}

/// Read-only snapshot of the whole world for downstream consumers
/// (UI, feeds). Produced by the store; carries no mutation paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The world singleton at snapshot time.
    pub world: WorldState,
    /// All territories, eliminated ones included.
    pub territories: Vec<Territory>,
    /// The full event log in append order.
    pub events: Vec<Event>,
    /// All streaks, active and ended.
    pub streaks: Vec<Streak>,
    /// Current best-ever records.
    pub records: Vec<WorldRecord>,
    /// Store version at snapshot time.
    pub version: u64,
}
