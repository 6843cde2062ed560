//! The declared subsystem execution order.
//!
//! Subsystems run sequentially per territory in an explicit, declared
//! order; adding a subsystem means adding it here. Execution order is
//! part of observable behavior, so the order is a constant of the
//! build, never discovered dynamically.
//!
//! A failing subsystem does not abort the territory's step: the error
//! becomes a critical event and the remaining subsystems still run
//! against the state as it stood.

use dominion_types::{EventDraft, EventSeverity, EventType, RecordSubmission, StreakOp, Territory};
use tracing::warn;

use crate::{
    AchievementTracker, GenderRolesSystem, OwnedUpdate, Subsystem, TickContext,
    WarDemographicsSystem,
};

/// Everything one territory's step produced, ready to be staged into
/// the tick's transaction.
#[derive(Debug, Clone)]
pub struct TerritoryStepResult {
    /// The territory after all subsystem updates and scalar deltas.
    pub territory: Territory,
    /// Events emitted by the subsystems, in execution order.
    pub events: Vec<EventDraft>,
    /// Streak ledger operations from the achievement tracker.
    pub streak_ops: Vec<StreakOp>,
    /// Best-ever record candidates from the achievement tracker.
    pub record_submissions: Vec<RecordSubmission>,
}

/// An ordered collection of subsystems.
pub struct Pipeline {
    subsystems: Vec<Box<dyn Subsystem>>,
}

impl Pipeline {
    /// The standard production order: rights reform, then manpower,
    /// then achievements over the settled state.
    pub fn standard() -> Self {
        Self::with_subsystems(vec![
            Box::new(GenderRolesSystem),
            Box::new(WarDemographicsSystem),
            Box::new(AchievementTracker),
        ])
    }

    /// Build a pipeline with an explicit subsystem list, mainly for
    /// tests that isolate a single subsystem.
    pub fn with_subsystems(subsystems: Vec<Box<dyn Subsystem>>) -> Self {
        Self { subsystems }
    }

    /// Subsystem names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    /// Run every subsystem against one territory for one tick.
    ///
    /// Each subsystem sees the territory as left by its predecessors
    /// within the same tick, so later subsystems observe earlier
    /// updates (the achievement tracker measures the settled state).
    pub fn run_for_territory(
        &self,
        territory: &Territory,
        ctx: &TickContext<'_>,
    ) -> TerritoryStepResult {
        let mut working = territory.clone();
        let mut events = Vec::new();
        let mut streak_ops = Vec::new();
        let mut record_submissions = Vec::new();

        for subsystem in &self.subsystems {
            match subsystem.process(&working, ctx) {
                Ok(output) => {
                    match output.update {
                        OwnedUpdate::None => {}
                        OwnedUpdate::GenderRoles(state) => working.gender_roles = state,
                        OwnedUpdate::FightingPopulation(fp) => working.fighting_population = fp,
                        OwnedUpdate::Achievements(delta) => {
                            streak_ops.extend(delta.streak_ops);
                            record_submissions.extend(delta.record_submissions);
                        }
                    }
                    output.deltas.apply(&mut working);
                    events.extend(output.events);
                }
                Err(error) => {
                    warn!(
                        subsystem = subsystem.name(),
                        territory_id = %territory.id,
                        tick = ctx.tick,
                        %error,
                        "subsystem failed; continuing with remaining subsystems"
                    );
                    events.push(EventDraft::territory(
                        territory.id,
                        EventType::System,
                        EventSeverity::Critical,
                        format!("Subsystem failure: {}", subsystem.name()),
                        error.to_string(),
                    ));
                }
            }
        }

        TerritoryStepResult {
            territory: working,
            events,
            streak_ops,
            record_submissions,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("subsystems", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{CommandAction, TerritoryCommand};

    use super::*;
    use crate::{AchievementsView, ScalarDeltas, SubsystemError, SubsystemOutput};

    struct FailingSubsystem;

    impl Subsystem for FailingSubsystem {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn process(
            &self,
            _territory: &Territory,
            _ctx: &TickContext<'_>,
        ) -> Result<SubsystemOutput, SubsystemError> {
            Err(SubsystemError::Internal {
                subsystem: "failing",
                message: "state could not be reconciled".to_owned(),
            })
        }
    }

    struct HappinessBoost;

    impl Subsystem for HappinessBoost {
        fn name(&self) -> &'static str {
            "happiness_boost"
        }

        fn process(
            &self,
            _territory: &Territory,
            _ctx: &TickContext<'_>,
        ) -> Result<SubsystemOutput, SubsystemError> {
            Ok(SubsystemOutput {
                deltas: ScalarDeltas {
                    happiness: 10.0,
                    ..ScalarDeltas::default()
                },
                ..SubsystemOutput::unchanged()
            })
        }
    }

    fn ctx<'a>(command: Option<&'a TerritoryCommand>) -> TickContext<'a> {
        TickContext {
            tick: 1,
            command,
            achievements: AchievementsView::EMPTY,
        }
    }

    #[test]
    fn standard_order_is_rights_then_manpower_then_achievements() {
        assert_eq!(
            Pipeline::standard().names(),
            vec!["gender_roles", "war_demographics", "achievements"]
        );
    }

    #[test]
    fn a_failing_subsystem_becomes_a_critical_event_and_the_rest_run() {
        let pipeline = Pipeline::with_subsystems(vec![
            Box::new(FailingSubsystem),
            Box::new(HappinessBoost),
        ]);
        let territory = Territory::new("Aldmark", 0, 1000);

        let result = pipeline.run_for_territory(&territory, &ctx(None));
        assert!(
            result
                .events
                .iter()
                .any(|e| e.severity == EventSeverity::Critical
                    && e.title == "Subsystem failure: failing")
        );
        // The subsystem after the failure still applied its delta.
        assert!((result.territory.happiness - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn later_subsystems_observe_earlier_updates() {
        // Forced conscription makes women eligible even though the
        // rights subsystem ran first and left can_fight false.
        let pipeline = Pipeline::standard();
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.fighting_population.emergency_measures =
            dominion_types::EmergencyMeasure::WomenConscripted;

        let result = pipeline.run_for_territory(&territory, &ctx(None));
        assert_eq!(result.territory.fighting_population.eligible_women, 250);
    }

    #[test]
    fn a_conscription_command_reaches_the_manpower_subsystem() {
        let pipeline = Pipeline::standard();
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.fighting_population.eligible_men = 40;
        territory.fighting_population.current_soldiers = 10;

        let cmd = TerritoryCommand {
            territory_id: territory.id,
            tick: 1,
            action: CommandAction::Conscript { count: 1000 },
            target: None,
            submitted_at: chrono::Utc::now(),
        };
        let result = pipeline.run_for_territory(&territory, &ctx(Some(&cmd)));
        assert_eq!(result.territory.fighting_population.current_soldiers, 40);
    }

    #[test]
    fn achievements_measure_the_settled_state() {
        let pipeline = Pipeline::standard();
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.fighting_population.current_soldiers = 50;

        let result = pipeline.run_for_territory(&territory, &ctx(None));
        let army = result
            .record_submissions
            .iter()
            .find(|s| s.record_type == dominion_types::RecordType::LargestArmy)
            .unwrap();
        assert!((army.value - 50.0).abs() < f64::EPSILON);
    }
}
