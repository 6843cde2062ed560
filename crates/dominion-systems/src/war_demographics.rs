//! Bounded war-manpower accounting.
//!
//! Eligibility pools are recomputed from population every tick, scaled
//! by the emergency-measure ratchet and gated on the rights state for
//! women. Conscription draws men first and is capped at availability;
//! recorded casualties derive widows and orphans with floor arithmetic
//! and reduce the shared population. Emergency measures may only move
//! strictly forward through the ratchet; a separate stand-down resets
//! to peacetime rules without refunding activation penalties.

use dominion_types::{
    CommandAction, EmergencyMeasure, EventDraft, EventSeverity, EventType, FightingPopulation,
    Territory,
};

use crate::{OwnedUpdate, ScalarDeltas, Subsystem, SubsystemError, SubsystemOutput, TickContext};

/// Happiness cost of activating each emergency measure.
const fn activation_penalty(measure: EmergencyMeasure) -> f64 {
    match measure {
        EmergencyMeasure::None => 0.0,
        EmergencyMeasure::ExpandedAge => 5.0,
        EmergencyMeasure::WomenConscripted => 15.0,
        EmergencyMeasure::ChildSoldiers => 40.0,
    }
}

const fn measure_label(measure: EmergencyMeasure) -> &'static str {
    match measure {
        EmergencyMeasure::None => "none",
        EmergencyMeasure::ExpandedAge => "expanded conscription age",
        EmergencyMeasure::WomenConscripted => "women conscripted",
        EmergencyMeasure::ChildSoldiers => "child soldiers",
    }
}

/// Weariness accrued per conscripted soldier.
const WEARINESS_PER_CONSCRIPT: f64 = 0.01;

/// Weariness shed per peacetime tick.
const PEACETIME_WEARINESS_DECAY: f64 = 0.5;

/// Happiness lost per recorded casualty, capped per tick.
const CASUALTY_HAPPINESS_RATE: f64 = 0.01;
const CASUALTY_HAPPINESS_CAP: f64 = 20.0;

/// `floor(population × 0.25 × multiplier)` in integer arithmetic.
/// The multiplier is 1.3 once the age bracket is widened, folded into
/// the numerator (0.25 × 1.3 = 0.325) to keep the floor exact.
const fn eligible_men_for(population: u64, measure: EmergencyMeasure) -> u64 {
    match measure {
        EmergencyMeasure::None => population.saturating_mul(25) / 100,
        EmergencyMeasure::ExpandedAge
        | EmergencyMeasure::WomenConscripted
        | EmergencyMeasure::ChildSoldiers => population.saturating_mul(325) / 1000,
    }
}

/// Women join the pool when the rights state allows them to fight or
/// the ratchet has reached forced conscription.
fn eligible_women_for(territory: &Territory, measure: EmergencyMeasure) -> u64 {
    if territory.gender_roles.can_fight || measure >= EmergencyMeasure::WomenConscripted {
        territory.population.saturating_mul(25) / 100
    } else {
        0
    }
}

/// Outcome of a conscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConscriptionOutcome {
    /// Soldiers actually raised (requested count capped at availability).
    pub actual: u64,
    /// How many were drawn from the male pool.
    pub from_men: u64,
    /// How many were drawn from the female pool.
    pub from_women: u64,
}

/// Draw up to `requested` soldiers from the current eligibility pools,
/// men first, never exceeding availability.
pub fn conscript(fp: &FightingPopulation, requested: u64) -> ConscriptionOutcome {
    let pool = fp.eligible_men.saturating_add(fp.eligible_women);
    let available = pool.saturating_sub(fp.current_soldiers);
    let actual = requested.min(available);
    let men_unclaimed = fp
        .eligible_men
        .saturating_sub(fp.current_soldiers.min(fp.eligible_men));
    let from_men = actual.min(men_unclaimed);
    ConscriptionOutcome {
        actual,
        from_men,
        from_women: actual.saturating_sub(from_men),
    }
}

/// The war-demographics subsystem. Owns the [`FightingPopulation`]
/// sub-record.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarDemographicsSystem;

impl WarDemographicsSystem {
    fn activate_measure(
        territory: &Territory,
        fp: &mut FightingPopulation,
        measure: EmergencyMeasure,
        events: &mut Vec<EventDraft>,
        deltas: &mut ScalarDeltas,
    ) {
        if measure <= fp.emergency_measures {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Military,
                EventSeverity::Info,
                "Emergency measure rejected",
                format!(
                    "{}: cannot move from {} back to {}; the ratchet only tightens",
                    territory.name,
                    measure_label(fp.emergency_measures),
                    measure_label(measure)
                ),
            ));
            return;
        }
        fp.emergency_measures = measure;
        deltas.happiness -= activation_penalty(measure);
        events.push(EventDraft::territory(
            territory.id,
            EventType::Military,
            EventSeverity::Critical,
            format!("Emergency measure: {}", measure_label(measure)),
            format!(
                "{}: desperation deepens; the measure will not be forgotten",
                territory.name
            ),
        ));
    }

    fn stand_down(
        territory: &Territory,
        fp: &mut FightingPopulation,
        events: &mut Vec<EventDraft>,
    ) {
        if fp.emergency_measures == EmergencyMeasure::None {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Military,
                EventSeverity::Info,
                "Stand-down rejected",
                format!("{}: no emergency measures are active", territory.name),
            ));
            return;
        }
        let previous = fp.emergency_measures;
        fp.emergency_measures = EmergencyMeasure::None;
        events.push(EventDraft::territory(
            territory.id,
            EventType::Military,
            EventSeverity::Notable,
            "Emergency measures stood down",
            format!(
                "{}: {} lifted; peacetime manpower rules resume",
                territory.name,
                measure_label(previous)
            ),
        ));
    }

    fn apply_conscription(
        territory: &Territory,
        fp: &mut FightingPopulation,
        requested: u64,
        events: &mut Vec<EventDraft>,
    ) {
        let outcome = conscript(fp, requested);
        fp.current_soldiers = fp.current_soldiers.saturating_add(outcome.actual);
        #[allow(clippy::cast_precision_loss)]
        let strain = outcome.actual as f64 * WEARINESS_PER_CONSCRIPT;
        fp.war_weariness = (fp.war_weariness + strain).clamp(0.0, 100.0);
        events.push(EventDraft::territory(
            territory.id,
            EventType::Military,
            EventSeverity::Notable,
            "Conscription order",
            format!(
                "{}: {} of {} requested soldiers raised ({} men, {} women)",
                territory.name, outcome.actual, requested, outcome.from_men, outcome.from_women
            ),
        ));
    }

    fn record_casualties(
        territory: &Territory,
        fp: &mut FightingPopulation,
        count: u64,
        events: &mut Vec<EventDraft>,
        deltas: &mut ScalarDeltas,
    ) {
        let casualties = count.min(fp.current_soldiers);
        fp.current_soldiers = fp.current_soldiers.saturating_sub(casualties);
        fp.widows = fp.widows.saturating_add(casualties.saturating_mul(7) / 10);
        fp.orphans = fp.orphans.saturating_add(casualties.saturating_mul(3) / 2);
        deltas.population = deltas
            .population
            .saturating_sub(i64::try_from(casualties).unwrap_or(i64::MAX));
        #[allow(clippy::cast_precision_loss)]
        let grief = (casualties as f64 * CASUALTY_HAPPINESS_RATE).min(CASUALTY_HAPPINESS_CAP);
        deltas.happiness -= grief;
        events.push(EventDraft::territory(
            territory.id,
            EventType::Military,
            EventSeverity::Critical,
            "Casualties recorded",
            format!(
                "{}: {casualties} soldiers lost; the war leaves widows and orphans behind",
                territory.name
            ),
        ));
    }
}

impl Subsystem for WarDemographicsSystem {
    fn name(&self) -> &'static str {
        "war_demographics"
    }

    fn process(
        &self,
        territory: &Territory,
        ctx: &TickContext<'_>,
    ) -> Result<SubsystemOutput, SubsystemError> {
        let mut fp = territory.fighting_population.clone();
        let mut events = Vec::new();
        let mut deltas = ScalarDeltas::default();

        // Commands apply against the pools as they stood at the start
        // of the tick; eligibility is recomputed afterwards.
        match ctx.action() {
            CommandAction::ActivateEmergencyMeasure { measure } => {
                Self::activate_measure(territory, &mut fp, measure, &mut events, &mut deltas);
            }
            CommandAction::StandDownEmergencyMeasures => {
                Self::stand_down(territory, &mut fp, &mut events);
            }
            CommandAction::Conscript { count } => {
                Self::apply_conscription(territory, &mut fp, count, &mut events);
            }
            CommandAction::RecordCasualties { count } => {
                Self::record_casualties(territory, &mut fp, count, &mut events, &mut deltas);
            }
            _ => {}
        }

        fp.eligible_men = eligible_men_for(territory.population, fp.emergency_measures);
        fp.eligible_women = eligible_women_for(territory, fp.emergency_measures);

        if !territory.at_war {
            fp.war_weariness = (fp.war_weariness - PEACETIME_WEARINESS_DECAY).max(0.0);
        }

        Ok(SubsystemOutput {
            update: OwnedUpdate::FightingPopulation(fp),
            deltas,
            events,
        })
    }
}
