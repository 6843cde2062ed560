//! Subsystem processor contract and worked subsystems.
//!
//! Every domain subsystem (gender-roles reform, war demographics, the
//! achievement tracker, ...) conforms to one contract: given the
//! current territory snapshot and the tick context, return an updated
//! copy of *only the sub-record it owns* plus shared scalar deltas and
//! event drafts, with no side effects beyond the returned value.
//!
//! Subsystems may *read* any other subsystem's sub-record to make
//! cross-domain decisions (war demographics reads the rights state to
//! decide female eligibility), but the tagged [`OwnedUpdate`] return
//! type makes it structurally impossible to write one.
//!
//! # Modules
//!
//! - [`pipeline`] -- the explicit, declared subsystem order
//! - [`gender_roles`] -- progressive-rights state machine
//! - [`war_demographics`] -- bounded war-manpower accounting
//! - [`achievements`] -- streak & best-ever record tracker

pub mod achievements;
pub mod gender_roles;
pub mod pipeline;
pub mod war_demographics;

use std::collections::BTreeMap;

use dominion_types::{
    CommandAction, EventDraft, FightingPopulation, GenderRolesState, RecordSubmission, Streak,
    StreakOp, StreakType, Territory, TerritoryCommand, TerritoryId, WorldRecord,
};

pub use achievements::AchievementTracker;
pub use gender_roles::GenderRolesSystem;
pub use pipeline::{Pipeline, TerritoryStepResult};
pub use war_demographics::WarDemographicsSystem;

/// Errors a subsystem processor can raise.
///
/// Processor errors do not abort the tick: the pipeline catches them
/// and converts them into critical events visible to operators.
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// The processor hit a state it cannot reconcile.
    #[error("{subsystem}: {message}")]
    Internal {
        /// Name of the failing subsystem.
        subsystem: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

/// Read-only view of the achievement state, assembled by the
/// orchestrator before each territory's step.
#[derive(Debug, Clone, Copy)]
pub struct AchievementsView<'a> {
    /// All streaks, active and ended.
    pub streaks: &'a [Streak],
    /// Current best-ever records.
    pub records: &'a [WorldRecord],
}

impl AchievementsView<'_> {
    /// An empty view, for subsystems and tests that do not need one.
    pub const EMPTY: AchievementsView<'static> = AchievementsView {
        streaks: &[],
        records: &[],
    };

    /// The active streak for a `(territory, streak type)` pair, if any.
    pub fn active_streak(
        &self,
        territory_id: TerritoryId,
        streak_type: StreakType,
    ) -> Option<&Streak> {
        self.streaks
            .iter()
            .find(|s| s.is_active && s.territory_id == territory_id && s.streak_type == streak_type)
    }

}

/// Per-territory context for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// The tick number being processed.
    pub tick: u64,
    /// The pre-resolved command for this territory, if the decision
    /// pipeline produced one. Absent means the deterministic default
    /// ([`CommandAction::Rest`]) applies.
    pub command: Option<&'a TerritoryCommand>,
    /// Read-only achievement state.
    pub achievements: AchievementsView<'a>,
}

impl TickContext<'_> {
    /// The effective action for this tick, defaulting to `Rest`.
    pub fn action(&self) -> CommandAction {
        self.command.map_or(CommandAction::Rest, |c| c.action)
    }
}

/// Adjustments to the shared scalar fields of a territory.
///
/// This is the contract's integration surface: cross-subsystem effects
/// are expressed exclusively through these deltas, never by writing
/// another subsystem's sub-record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalarDeltas {
    /// Happiness adjustment; the result is clamped to `[0, 100]`.
    pub happiness: f64,
    /// Wealth adjustment; the result is floored at 0.
    pub wealth: f64,
    /// Population adjustment; the result saturates at 0.
    pub population: i64,
}

impl ScalarDeltas {
    /// Apply the deltas to a territory's shared scalars, clamping.
    pub fn apply(&self, territory: &mut Territory) {
        territory.happiness = (territory.happiness + self.happiness).clamp(0.0, 100.0);
        territory.wealth = (territory.wealth + self.wealth).max(0.0);
        territory.population = if self.population >= 0 {
            territory.population.saturating_add(self.population.unsigned_abs())
        } else {
            territory.population.saturating_sub(self.population.unsigned_abs())
        };
    }
}

/// Changes to the streak ledger and record table produced by the
/// achievement tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementDelta {
    /// Staged streak ledger operations.
    pub streak_ops: Vec<StreakOp>,
    /// Staged best-ever record candidates.
    pub record_submissions: Vec<RecordSubmission>,
}

/// The sub-record slice a subsystem is allowed to replace.
///
/// The tagged variant is what enforces write exclusivity: a subsystem
/// can only return the record it owns, so no locking discipline is
/// needed between subsystems within one territory's step.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedUpdate {
    /// The subsystem owns no sub-record (or left it unchanged).
    None,
    /// Replacement rights state (gender-roles subsystem only).
    GenderRoles(GenderRolesState),
    /// Replacement manpower state (war-demographics subsystem only).
    FightingPopulation(FightingPopulation),
    /// Streak/record changes (achievement tracker only).
    Achievements(AchievementDelta),
}

/// Everything a subsystem returns for one territory and one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemOutput {
    /// The sub-record replacement, if any.
    pub update: OwnedUpdate,
    /// Adjustments to the shared scalar fields.
    pub deltas: ScalarDeltas,
    /// Events to append to the log.
    pub events: Vec<EventDraft>,
}

impl SubsystemOutput {
    /// An output that changes nothing.
    pub const fn unchanged() -> Self {
        Self {
            update: OwnedUpdate::None,
            deltas: ScalarDeltas {
                happiness: 0.0,
                wealth: 0.0,
                population: 0,
            },
            events: Vec::new(),
        }
    }
}

/// A pure state-transition unit owning one slice of territory state.
///
/// Implementations must be side-effect free: all writes travel through
/// the returned [`SubsystemOutput`]. No subsystem may call another
/// subsystem directly; cross-domain influence flows through read-only
/// snapshots and the shared scalar deltas.
pub trait Subsystem: Send + Sync {
    /// Stable subsystem name, used in logs and error events.
    fn name(&self) -> &'static str;

    /// Process one territory for one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SubsystemError`] if the processor cannot produce an
    /// output; the pipeline converts this into a critical event rather
    /// than aborting the tick.
    fn process(
        &self,
        territory: &Territory,
        ctx: &TickContext<'_>,
    ) -> Result<SubsystemOutput, SubsystemError>;
}

/// Index commands by territory for quick per-territory lookup.
pub fn index_commands(
    commands: &[TerritoryCommand],
) -> BTreeMap<TerritoryId, &TerritoryCommand> {
    commands.iter().map(|c| (c.territory_id, c)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_command_defaults_to_rest() {
        let ctx = TickContext {
            tick: 3,
            command: None,
            achievements: AchievementsView::EMPTY,
        };
        assert_eq!(ctx.action(), CommandAction::Rest);
    }

    #[test]
    fn scalar_deltas_clamp_happiness() {
        let mut territory = Territory::new("Aldmark", 0, 100);
        territory.happiness = 95.0;
        ScalarDeltas {
            happiness: 20.0,
            ..ScalarDeltas::default()
        }
        .apply(&mut territory);
        assert!((territory.happiness - 100.0).abs() < f64::EPSILON);

        ScalarDeltas {
            happiness: -150.0,
            ..ScalarDeltas::default()
        }
        .apply(&mut territory);
        assert!(territory.happiness.abs() < f64::EPSILON);
    }

    #[test]
    fn scalar_deltas_saturate_population_at_zero() {
        let mut territory = Territory::new("Aldmark", 0, 10);
        ScalarDeltas {
            population: -25,
            ..ScalarDeltas::default()
        }
        .apply(&mut territory);
        assert_eq!(territory.population, 0);
    }

    #[test]
    fn scalar_deltas_floor_wealth_at_zero() {
        let mut territory = Territory::new("Aldmark", 0, 10);
        territory.wealth = 5.0;
        ScalarDeltas {
            wealth: -50.0,
            ..ScalarDeltas::default()
        }
        .apply(&mut territory);
        assert!(territory.wealth.abs() < f64::EPSILON);
    }
}
