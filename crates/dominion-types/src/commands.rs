//! Pre-resolved per-territory commands for one tick.
//!
//! The external decision pipeline produces exactly one command per
//! territory per tick, already validated against the static action
//! catalog. Subsystems receive the command through the tick context;
//! when no command is available the deterministic default is
//! [`CommandAction::Rest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EmergencyMeasure, Right};
use crate::ids::TerritoryId;

/// The action portion of a territory command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandAction {
    /// Do nothing this tick. The deterministic default when the
    /// decision pipeline produced no command.
    #[default]
    Rest,
    /// Manually grant a right ahead of natural progress. Subject to the
    /// prerequisite ordering enforced by the gender-roles subsystem.
    GrantRight {
        /// The right to grant.
        right: Right,
    },
    /// Manually restrict a previously granted right. Subject to the
    /// reverse-order constraint enforced by the gender-roles subsystem.
    RestrictRight {
        /// The right to restrict.
        right: Right,
    },
    /// Activate an emergency measure strictly later in the ratchet
    /// order than the current one.
    ActivateEmergencyMeasure {
        /// The measure to activate.
        measure: EmergencyMeasure,
    },
    /// Reset emergency measures to [`EmergencyMeasure::None`].
    /// Activation penalties are not refunded.
    StandDownEmergencyMeasures,
    /// Draw soldiers from the eligible population, capped at
    /// availability.
    Conscript {
        /// Requested number of soldiers.
        count: u64,
    },
    /// Record battlefield casualties and their derived demographic
    /// consequences.
    RecordCasualties {
        /// Number of soldiers lost.
        count: u64,
    },
}

/// A validated command addressed to one territory for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryCommand {
    /// The territory this command addresses.
    pub territory_id: TerritoryId,
    /// The tick the command was produced for.
    pub tick: u64,
    /// What to do.
    pub action: CommandAction,
    /// Optional target territory (diplomatic/military actions).
    pub target: Option<TerritoryId>,
    /// Wall-clock time the command was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl TerritoryCommand {
    /// Build the deterministic default command for a territory that
    /// received nothing from the decision pipeline this tick.
    pub fn rest(territory_id: TerritoryId, tick: u64) -> Self {
        Self {
            territory_id,
            tick,
            action: CommandAction::Rest,
            target: None,
            submitted_at: Utc::now(),
        }
    }
}
