//! Staged mutation payloads exchanged between subsystems and the store.
//!
//! Subsystem processors are pure: instead of writing to the store they
//! return drafts: events to append, streak ledger operations, record
//! candidates. The tick orchestrator stages all drafts from one step
//! into a single transaction, and the store stamps identifiers, tick
//! numbers, and wall-clock times at commit.

use serde::{Deserialize, Serialize};

use crate::enums::{EventSeverity, EventType, RecordType, StreakEndReason, StreakType};
use crate::ids::TerritoryId;

/// An event waiting to be committed.
///
/// The store assigns the [`EventId`](crate::ids::EventId), the tick
/// number, and the `recorded_at` stamp when the owning transaction
/// commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
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
}

impl EventDraft {
    /// Build a draft attached to a territory.
    pub fn territory(
        territory_id: TerritoryId,
        event_type: EventType,
        severity: EventSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            severity,
            title: title.into(),
            description: description.into(),
            territory_id: Some(territory_id),
        }
    }

    /// Build a world-level draft (control plane, system notices).
    pub fn system(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            event_type: EventType::System,
            severity: EventSeverity::Info,
            title: title.into(),
            description: description.into(),
            territory_id: None,
        }
    }
}

/// A staged operation on the streak ledger.
///
/// The achievement tracker emits at most one operation per
/// `(territory, streak type)` per tick; the store enforces the
/// at-most-one-active invariant at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreakOp {
    /// Open a new active streak at length 1.
    Open {
        /// The territory the streak belongs to.
        territory_id: TerritoryId,
        /// Which condition the streak tracks.
        streak_type: StreakType,
        /// Condition baseline captured at open (e.g. starting
        /// population for growth streaks).
        baseline: f64,
    },
    /// Advance the active streak's length by exactly 1.
    Advance {
        /// The territory the streak belongs to.
        territory_id: TerritoryId,
        /// Which condition the streak tracks.
        streak_type: StreakType,
    },
    /// Close the active streak, stamping the end tick and reason.
    Close {
        /// The territory the streak belongs to.
        territory_id: TerritoryId,
        /// Which condition the streak tracks.
        streak_type: StreakType,
        /// Why the streak ended.
        reason: StreakEndReason,
    },
}

/// A candidate value for a best-ever record.
///
/// The store replaces the stored record only when the candidate is
/// *strictly* greater than the current value; ties preserve the
/// earliest holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSubmission {
    /// Which metric the candidate is for.
    pub record_type: RecordType,
    /// The territory that produced the value.
    pub territory_id: TerritoryId,
    /// The candidate value.
    pub value: f64,
    /// Optional human-readable context, stored if the record is taken.
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn system_draft_has_no_territory() {
        let draft = EventDraft::system("Simulation started", "Speed set to 1x");
        assert_eq!(draft.event_type, EventType::System);
        assert!(draft.territory_id.is_none());
    }

    #[test]
    fn territory_draft_carries_the_territory() {
        let id = TerritoryId::new();
        let draft = EventDraft::territory(
            id,
            EventType::Military,
            EventSeverity::Notable,
            "Conscription",
            "30 soldiers drafted",
        );
        assert_eq!(draft.territory_id, Some(id));
        assert_eq!(draft.severity, EventSeverity::Notable);
    }
}
