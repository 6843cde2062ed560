//! Enumeration types shared across the Dominion workspace.
//!
//! These enums are pure data: domain rules that interpret them (right
//! thresholds, emergency measure penalties, streak predicates) live in
//! `dominion-systems`, next to the subsystem that owns them.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the world singleton.
///
/// Invariant: the status is [`RunStatus::Paused`] whenever the speed is
/// [`SimSpeed::Paused`]. The converse may lag one scheduling decision
/// behind a just-issued speed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The world exists but the simulation has never been started.
    Initializing,
    /// The tick loop is halted; no state advances.
    Paused,
    /// The tick loop is active and advancing the world.
    Running,
}

/// Simulation speed selected by the operator.
///
/// Each running speed maps to a progressively shorter wake-up interval
/// for the tick loop; `Paused` means the loop does not reschedule at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    /// No ticks are scheduled.
    Paused,
    /// 1x: one tick per long interval.
    Normal,
    /// 10x: ten times faster than normal.
    Fast,
    /// 100x: as fast as the host allows.
    Blitz,
}

impl SimSpeed {
    /// Whether this speed implies a paused run status.
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// Severity attached to an event log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    /// Routine bookkeeping, visible in the full feed only.
    Info,
    /// Noteworthy developments (milestones, measures, streak endings).
    Notable,
    /// Failures and emergencies operators must see.
    Critical,
}

/// Broad category of an event log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Control-plane events (start, pause, speed changes).
    System,
    /// A progress threshold or achievement milestone was reached.
    Milestone,
    /// Conscription, casualties, emergency measures.
    Military,
    /// Rights reforms and other social developments.
    Social,
    /// Streak lifecycle events (milestones and endings).
    Streak,
}

/// One of the four rights gated by the progressive-rights state machine.
///
/// Rights form an ordered lattice: `Work` is the root prerequisite,
/// `OwnProperty` and `Fight` require `Work`, and `Rule` requires
/// `OwnProperty`. The thresholds and grant/restrict rules live in
/// `dominion-systems::gender_roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Right {
    /// The right to work (threshold 20).
    Work,
    /// The right to own property (threshold 40).
    OwnProperty,
    /// The right to rule (threshold 70).
    Rule,
    /// The right to fight in the military (threshold 90).
    Fight,
}

/// Wartime emergency measures, a strictly ordered ratchet.
///
/// The declaration order *is* the ratchet order: a measure may only be
/// activated if it is strictly later in this order than the current one.
/// A separate stand-down operation resets to [`EmergencyMeasure::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyMeasure {
    /// Peacetime manpower rules.
    #[default]
    None,
    /// Conscription age bracket widened (manpower multiplier 1.3).
    ExpandedAge,
    /// Women are conscripted regardless of the rights state.
    WomenConscripted,
    /// Children are pressed into service. The last resort.
    ChildSoldiers,
}

/// Named streak conditions tracked by the achievement tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakType {
    /// Consecutive ticks without being at war.
    PeaceTime,
    /// Consecutive ticks with wealth above the prosperity bar.
    Prosperity,
    /// Consecutive ticks with happiness at or above 70.
    HighHappiness,
    /// Consecutive ticks with population above the streak's baseline.
    GrowingPopulation,
}

/// Why an ended streak stopped counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakEndReason {
    /// The watched condition failed for one tick.
    ConditionFailed,
    /// The territory was eliminated while the streak was active.
    TerritoryEliminated,
}

/// Named best-ever records kept across all territories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Highest population ever observed.
    LargestPopulation,
    /// Highest wealth ever observed.
    GreatestWealth,
    /// Longest completed or running peace streak, in ticks.
    LongestPeace,
    /// Most soldiers ever fielded at once.
    LargestArmy,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn emergency_measures_are_ratchet_ordered() {
        assert!(EmergencyMeasure::None < EmergencyMeasure::ExpandedAge);
        assert!(EmergencyMeasure::ExpandedAge < EmergencyMeasure::WomenConscripted);
        assert!(EmergencyMeasure::WomenConscripted < EmergencyMeasure::ChildSoldiers);
    }

    #[test]
    fn speed_paused_maps_to_paused_status() {
        assert!(SimSpeed::Paused.is_paused());
        assert!(!SimSpeed::Normal.is_paused());
        assert!(!SimSpeed::Blitz.is_paused());
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&EmergencyMeasure::ExpandedAge).unwrap();
        assert_eq!(json, "\"expanded_age\"");
        let json = serde_json::to_string(&StreakType::HighHappiness).unwrap();
        assert_eq!(json, "\"high_happiness\"");
        let json = serde_json::to_string(&RunStatus::Initializing).unwrap();
        assert_eq!(json, "\"initializing\"");
    }

    #[test]
    fn severity_orders_info_below_critical() {
        assert!(EventSeverity::Info < EventSeverity::Notable);
        assert!(EventSeverity::Notable < EventSeverity::Critical);
    }
}
