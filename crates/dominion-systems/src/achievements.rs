//! Streak and best-ever record tracker.
//!
//! Streaks count consecutive ticks a watched condition holds for a
//! territory: open at length 1 the first tick it holds, advance by
//! exactly 1 per tick, end (never delete) the first tick it fails.
//! Milestones fire at exactly one year, five years, and a decade of
//! simulated months. Records are strictly-better-only; the store's
//! comparator preserves the earliest holder on ties.
//!
//! The tracker owns no territory sub-record: its output is a batch of
//! streak ledger operations and record candidates that the orchestrator
//! stages into the tick's transaction.

use dominion_types::{
    EventDraft, EventSeverity, EventType, RecordSubmission, RecordType, StreakEndReason, StreakOp,
    StreakType, Territory,
};

use crate::{
    AchievementDelta, OwnedUpdate, ScalarDeltas, Subsystem, SubsystemError, SubsystemOutput,
    TickContext,
};

/// Wealth at or above which a territory counts as prosperous.
const PROSPERITY_BAR: f64 = 1_000.0;

/// Happiness at or above which a territory counts as content.
const HIGH_HAPPINESS_BAR: f64 = 70.0;

/// Streak lengths (in ticks, i.e. simulated months) that earn a
/// milestone event.
const MILESTONE_LENGTHS: [u64; 3] = [12, 60, 120];

/// Minimum final length for an ended streak to be worth an event.
const NOTABLE_STREAK_LENGTH: u64 = 12;

/// Evaluation order for streak conditions.
const STREAK_TYPES: [StreakType; 4] = [
    StreakType::PeaceTime,
    StreakType::Prosperity,
    StreakType::HighHappiness,
    StreakType::GrowingPopulation,
];

#[allow(clippy::cast_precision_loss)]
const fn metric(value: u64) -> f64 {
    value as f64
}

const fn streak_label(streak_type: StreakType) -> &'static str {
    match streak_type {
        StreakType::PeaceTime => "peace",
        StreakType::Prosperity => "prosperity",
        StreakType::HighHappiness => "contentment",
        StreakType::GrowingPopulation => "population growth",
    }
}

fn milestone_title(streak_type: StreakType, length: u64) -> String {
    let span = match length {
        12 => "A year",
        60 => "Five years",
        _ => "A decade",
    };
    format!("{span} of {}", streak_label(streak_type))
}

/// Whether the watched condition holds this tick. Growth streaks
/// compare against the baseline captured when the streak opened.
fn condition_holds(territory: &Territory, streak_type: StreakType, baseline: Option<f64>) -> bool {
    match streak_type {
        StreakType::PeaceTime => !territory.at_war,
        StreakType::Prosperity => territory.wealth >= PROSPERITY_BAR,
        StreakType::HighHappiness => territory.happiness >= HIGH_HAPPINESS_BAR,
        StreakType::GrowingPopulation => match baseline {
            Some(base) => metric(territory.population) > base,
            None => territory.population > 0,
        },
    }
}

fn baseline_for(territory: &Territory, streak_type: StreakType) -> f64 {
    match streak_type {
        StreakType::GrowingPopulation => metric(territory.population),
        StreakType::PeaceTime | StreakType::Prosperity | StreakType::HighHappiness => 0.0,
    }
}

/// The achievement tracker subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementTracker;

impl Subsystem for AchievementTracker {
    fn name(&self) -> &'static str {
        "achievements"
    }

    fn process(
        &self,
        territory: &Territory,
        ctx: &TickContext<'_>,
    ) -> Result<SubsystemOutput, SubsystemError> {
        let mut delta = AchievementDelta::default();
        let mut events = Vec::new();

        for streak_type in STREAK_TYPES {
            let active = ctx.achievements.active_streak(territory.id, streak_type);
            let holds = condition_holds(territory, streak_type, active.map(|s| s.baseline));

            match (active, holds) {
                (None, true) => {
                    delta.streak_ops.push(StreakOp::Open {
                        territory_id: territory.id,
                        streak_type,
                        baseline: baseline_for(territory, streak_type),
                    });
                    if streak_type == StreakType::PeaceTime {
                        delta.record_submissions.push(RecordSubmission {
                            record_type: RecordType::LongestPeace,
                            territory_id: territory.id,
                            value: 1.0,
                            description: Some(format!("{} at peace", territory.name)),
                        });
                    }
                }
                (Some(streak), true) => {
                    delta.streak_ops.push(StreakOp::Advance {
                        territory_id: territory.id,
                        streak_type,
                    });
                    let new_length = streak.current_length.saturating_add(1);
                    if MILESTONE_LENGTHS.contains(&new_length) {
                        events.push(EventDraft::territory(
                            territory.id,
                            EventType::Milestone,
                            EventSeverity::Notable,
                            milestone_title(streak_type, new_length),
                            format!(
                                "{}: {new_length} consecutive months of {}",
                                territory.name,
                                streak_label(streak_type)
                            ),
                        ));
                    }
                    if streak_type == StreakType::PeaceTime {
                        delta.record_submissions.push(RecordSubmission {
                            record_type: RecordType::LongestPeace,
                            territory_id: territory.id,
                            value: metric(new_length),
                            description: Some(format!(
                                "{}: {new_length} months of unbroken peace",
                                territory.name
                            )),
                        });
                    }
                }
                (Some(streak), false) => {
                    delta.streak_ops.push(StreakOp::Close {
                        territory_id: territory.id,
                        streak_type,
                        reason: StreakEndReason::ConditionFailed,
                    });
                    if streak.current_length >= NOTABLE_STREAK_LENGTH {
                        events.push(EventDraft::territory(
                            territory.id,
                            EventType::Streak,
                            EventSeverity::Notable,
                            format!(
                                "{} streak ends",
                                streak_label(streak_type)
                            ),
                            format!(
                                "{}: the run lasted {} months",
                                territory.name, streak.current_length
                            ),
                        ));
                    }
                }
                (None, false) => {}
            }
        }

        delta.record_submissions.push(RecordSubmission {
            record_type: RecordType::LargestPopulation,
            territory_id: territory.id,
            value: metric(territory.population),
            description: Some(format!("{}: {} people", territory.name, territory.population)),
        });
        delta.record_submissions.push(RecordSubmission {
            record_type: RecordType::GreatestWealth,
            territory_id: territory.id,
            value: territory.wealth,
            description: Some(format!("{}: {:.0} in the treasury", territory.name, territory.wealth)),
        });
        delta.record_submissions.push(RecordSubmission {
            record_type: RecordType::LargestArmy,
            territory_id: territory.id,
            value: metric(territory.fighting_population.current_soldiers),
            description: Some(format!(
                "{}: {} soldiers under arms",
                territory.name, territory.fighting_population.current_soldiers
            )),
        });

        Ok(SubsystemOutput {
            update: OwnedUpdate::Achievements(delta),
            deltas: ScalarDeltas::default(),
            events,
        })
    }
}
