//! Progressive-rights state machine.
//!
//! Reform progress accumulates from situational factors every tick and
//! only ever rises on its own; the four rights are granted irreversibly
//! when progress crosses their thresholds. Directed decrees can grant a
//! right early or restrict a granted one, subject to the prerequisite
//! lattice (`Work` underpins `OwnProperty` and `Fight`; `Rule` sits on
//! `OwnProperty`). Rejected decrees produce events, not errors, so a
//! bad command never poisons the tick.

use dominion_types::{EventDraft, EventSeverity, EventType, GenderRolesState, Right, Territory};

use crate::{OwnedUpdate, ScalarDeltas, Subsystem, SubsystemError, SubsystemOutput, TickContext};

/// Natural progress accrued per tick is this rate times the factor sum.
const PROGRESS_RATE: f64 = 0.1;

/// Wealth at which the prosperity factor saturates at 1.0.
const PROSPERITY_SCALE: f64 = 10_000.0;

/// Happiness cost of restricting a granted right.
const RESTRICT_HAPPINESS_PENALTY: f64 = -5.0;

/// Progress thresholds for each right, in grant order.
const fn threshold(right: Right) -> f64 {
    match right {
        Right::Work => 20.0,
        Right::OwnProperty => 40.0,
        Right::Rule => 70.0,
        Right::Fight => 90.0,
    }
}

/// The right that must already be granted before `right` can be.
const fn prerequisite(right: Right) -> Option<Right> {
    match right {
        Right::Work => None,
        Right::OwnProperty | Right::Fight => Some(Right::Work),
        Right::Rule => Some(Right::OwnProperty),
    }
}

/// Rights that directly depend on `right`. A right cannot be restricted
/// while any of these is still granted.
const fn dependents(right: Right) -> &'static [Right] {
    match right {
        Right::Work => &[Right::OwnProperty, Right::Fight],
        Right::OwnProperty => &[Right::Rule],
        Right::Rule | Right::Fight => &[],
    }
}

const fn label(right: Right) -> &'static str {
    match right {
        Right::Work => "work",
        Right::OwnProperty => "own property",
        Right::Rule => "rule",
        Right::Fight => "fight",
    }
}

/// Threshold scan order, lowest first.
const RIGHTS_IN_ORDER: [Right; 4] = [Right::Work, Right::OwnProperty, Right::Rule, Right::Fight];

const fn is_granted(state: &GenderRolesState, right: Right) -> bool {
    match right {
        Right::Work => state.can_work,
        Right::OwnProperty => state.can_own_property,
        Right::Rule => state.can_rule,
        Right::Fight => state.can_fight,
    }
}

const fn set_granted(state: &mut GenderRolesState, right: Right, granted: bool) {
    match right {
        Right::Work => state.can_work = granted,
        Right::OwnProperty => state.can_own_property = granted,
        Right::Rule => state.can_rule = granted,
        Right::Fight => state.can_fight = granted,
    }
}

/// Weighted sum of the situational factors driving natural progress.
///
/// Each factor is normalized to `[0, 1]`: education, prosperity, low
/// militarism, and wartime manpower shortfall (armies larger than the
/// male eligible pool push societies toward widening who may serve).
fn factor_sum(territory: &Territory) -> f64 {
    let education = (territory.education_level / 100.0).clamp(0.0, 1.0);
    let prosperity = (territory.wealth / PROSPERITY_SCALE).clamp(0.0, 1.0);
    let low_militarism = (1.0 - territory.militarism / 100.0).clamp(0.0, 1.0);
    let fp = &territory.fighting_population;
    let shortfall = if territory.at_war && fp.current_soldiers > fp.eligible_men {
        1.0
    } else {
        0.0
    };
    education + prosperity + low_militarism + shortfall
}

/// The progressive-rights subsystem. Owns the
/// [`GenderRolesState`] sub-record.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderRolesSystem;

impl GenderRolesSystem {
    fn apply_natural_progress(
        territory: &Territory,
        state: &mut GenderRolesState,
        events: &mut Vec<EventDraft>,
    ) {
        let accrued = PROGRESS_RATE * factor_sum(territory);
        state.progress_level = (state.progress_level + accrued).clamp(0.0, 100.0);

        for right in RIGHTS_IN_ORDER {
            if !is_granted(state, right) && state.progress_level >= threshold(right) {
                set_granted(state, right, true);
                events.push(EventDraft::territory(
                    territory.id,
                    EventType::Milestone,
                    EventSeverity::Notable,
                    format!("Women gain the right to {}", label(right)),
                    format!(
                        "{}: reform progress reached {:.1}",
                        territory.name, state.progress_level
                    ),
                ));
            }
        }
    }

    fn grant(
        territory: &Territory,
        state: &mut GenderRolesState,
        right: Right,
        events: &mut Vec<EventDraft>,
    ) {
        if is_granted(state, right) {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Social,
                EventSeverity::Info,
                "Decree rejected",
                format!(
                    "{}: the right to {} is already granted",
                    territory.name,
                    label(right)
                ),
            ));
            return;
        }
        if let Some(required) = prerequisite(right)
            && !is_granted(state, required)
        {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Social,
                EventSeverity::Info,
                "Decree rejected",
                format!(
                    "{}: the right to {} requires the right to {} first",
                    territory.name,
                    label(right),
                    label(required)
                ),
            ));
            return;
        }
        set_granted(state, right, true);
        // An early grant pulls progress up to the threshold so the
        // boolean and the level stay consistent.
        state.progress_level = state.progress_level.max(threshold(right));
        events.push(EventDraft::territory(
            territory.id,
            EventType::Social,
            EventSeverity::Notable,
            format!("Decree: women may now {}", label(right)),
            format!("{}: the right was granted by decree", territory.name),
        ));
    }

    fn restrict(
        territory: &Territory,
        state: &mut GenderRolesState,
        right: Right,
        events: &mut Vec<EventDraft>,
        deltas: &mut ScalarDeltas,
    ) {
        if !is_granted(state, right) {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Social,
                EventSeverity::Info,
                "Decree rejected",
                format!(
                    "{}: the right to {} is not currently granted",
                    territory.name,
                    label(right)
                ),
            ));
            return;
        }
        if let Some(blocking) = dependents(right)
            .iter()
            .copied()
            .find(|dep| is_granted(state, *dep))
        {
            events.push(EventDraft::territory(
                territory.id,
                EventType::Social,
                EventSeverity::Info,
                "Decree rejected",
                format!(
                    "{}: cannot restrict the right to {} while the right to {} stands",
                    territory.name,
                    label(right),
                    label(blocking)
                ),
            ));
            return;
        }
        set_granted(state, right, false);
        // Clamp progress strictly below the threshold so the right is
        // not immediately re-granted by the next natural-progress pass.
        state.progress_level = state.progress_level.min(threshold(right) - 1.0).max(0.0);
        deltas.happiness += RESTRICT_HAPPINESS_PENALTY;
        events.push(EventDraft::territory(
            territory.id,
            EventType::Social,
            EventSeverity::Notable,
            format!("Decree: women may no longer {}", label(right)),
            format!("{}: the right was restricted by decree; unrest follows", territory.name),
        ));
    }
}

impl Subsystem for GenderRolesSystem {
    fn name(&self) -> &'static str {
        "gender_roles"
    }

    fn process(
        &self,
        territory: &Territory,
        ctx: &TickContext<'_>,
    ) -> Result<SubsystemOutput, SubsystemError> {
        let mut state = territory.gender_roles.clone();
        let mut events = Vec::new();
        let mut deltas = ScalarDeltas::default();

        Self::apply_natural_progress(territory, &mut state, &mut events);

        match ctx.action() {
            dominion_types::CommandAction::GrantRight { right } => {
                Self::grant(territory, &mut state, right, &mut events);
            }
            dominion_types::CommandAction::RestrictRight { right } => {
                Self::restrict(territory, &mut state, right, &mut events, &mut deltas);
            }
            _ => {}
        }

        Ok(SubsystemOutput {
            update: OwnedUpdate::GenderRoles(state),
            deltas,
            events,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{CommandAction, TerritoryCommand};

    use super::*;
    use crate::AchievementsView;

    fn ctx_with<'a>(command: Option<&'a TerritoryCommand>) -> TickContext<'a> {
        TickContext {
            tick: 1,
            command,
            achievements: AchievementsView::EMPTY,
        }
    }

    fn command(territory: &Territory, action: CommandAction) -> TerritoryCommand {
        TerritoryCommand {
            territory_id: territory.id,
            tick: 1,
            action,
            target: None,
            submitted_at: chrono::Utc::now(),
        }
    }

    fn rights_of(output: &SubsystemOutput) -> &GenderRolesState {
        match &output.update {
            OwnedUpdate::GenderRoles(state) => state,
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn natural_progress_accrues_from_factors() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.education_level = 50.0;
        territory.militarism = 50.0;
        territory.wealth = 0.0;

        let output = GenderRolesSystem
            .process(&territory, &ctx_with(None))
            .unwrap();
        // 0.1 * (0.5 education + 0.0 prosperity + 0.5 low militarism)
        let state = rights_of(&output);
        assert!((state.progress_level - 0.1).abs() < 1e-9);
    }

    #[test]
    fn crossing_a_threshold_grants_the_right_with_a_milestone() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.gender_roles.progress_level = 19.99;
        territory.education_level = 100.0;
        territory.militarism = 0.0;

        let output = GenderRolesSystem
            .process(&territory, &ctx_with(None))
            .unwrap();
        let state = rights_of(&output);
        assert!(state.can_work);
        assert!(!state.can_own_property);
        assert!(
            output
                .events
                .iter()
                .any(|e| e.event_type == EventType::Milestone)
        );
    }

    #[test]
    fn progress_is_clamped_at_one_hundred() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.gender_roles.progress_level = 100.0;
        territory.education_level = 100.0;

        let output = GenderRolesSystem
            .process(&territory, &ctx_with(None))
            .unwrap();
        assert!((rights_of(&output).progress_level - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grant_without_prerequisite_is_rejected_as_an_event() {
        let territory = Territory::new("Aldmark", 0, 1000);
        let cmd = command(
            &territory,
            CommandAction::GrantRight { right: Right::Fight },
        );
        let output = GenderRolesSystem
            .process(&territory, &ctx_with(Some(&cmd)))
            .unwrap();
        let state = rights_of(&output);
        assert!(!state.can_fight);
        assert!(output.events.iter().any(|e| e.title == "Decree rejected"));
    }

    #[test]
    fn grant_raises_progress_to_the_threshold() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.gender_roles.can_work = true;
        territory.gender_roles.progress_level = 25.0;
        let cmd = command(
            &territory,
            CommandAction::GrantRight {
                right: Right::OwnProperty,
            },
        );
        let output = GenderRolesSystem
            .process(&territory, &ctx_with(Some(&cmd)))
            .unwrap();
        let state = rights_of(&output);
        assert!(state.can_own_property);
        assert!(state.progress_level >= 40.0);
    }

    #[test]
    fn restricting_a_right_with_active_dependents_is_rejected() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.gender_roles.can_work = true;
        territory.gender_roles.can_own_property = true;
        territory.gender_roles.can_rule = true;
        territory.gender_roles.progress_level = 75.0;

        let cmd = command(
            &territory,
            CommandAction::RestrictRight {
                right: Right::OwnProperty,
            },
        );
        let output = GenderRolesSystem
            .process(&territory, &ctx_with(Some(&cmd)))
            .unwrap();
        let state = rights_of(&output);
        assert!(state.can_own_property);
        assert!(output.events.iter().any(|e| e.title == "Decree rejected"));
    }

    #[test]
    fn restriction_clamps_progress_below_the_threshold() {
        let mut territory = Territory::new("Aldmark", 0, 1000);
        territory.education_level = 0.0;
        territory.militarism = 100.0;
        territory.gender_roles.can_work = true;
        territory.gender_roles.can_own_property = true;
        territory.gender_roles.progress_level = 55.0;

        let cmd = command(
            &territory,
            CommandAction::RestrictRight {
                right: Right::OwnProperty,
            },
        );
        let output = GenderRolesSystem
            .process(&territory, &ctx_with(Some(&cmd)))
            .unwrap();
        let state = rights_of(&output);
        assert!(!state.can_own_property);
        assert!(state.progress_level < 40.0);
        assert!(output.deltas.happiness < 0.0);
    }

    #[test]
    fn restricting_an_ungranted_right_is_rejected() {
        let territory = Territory::new("Aldmark", 0, 1000);
        let cmd = command(
            &territory,
            CommandAction::RestrictRight { right: Right::Rule },
        );
        let output = GenderRolesSystem
            .process(&territory, &ctx_with(Some(&cmd)))
            .unwrap();
        assert!(output.events.iter().any(|e| e.title == "Decree rejected"));
    }

    #[test]
    fn wartime_shortfall_accelerates_progress() {
        let mut peaceful = Territory::new("Aldmark", 0, 1000);
        peaceful.education_level = 0.0;
        peaceful.militarism = 100.0;

        let mut strained = peaceful.clone();
        strained.at_war = true;
        strained.fighting_population.eligible_men = 10;
        strained.fighting_population.current_soldiers = 50;

        let calm = GenderRolesSystem
            .process(&peaceful, &ctx_with(None))
            .unwrap();
        let pressed = GenderRolesSystem
            .process(&strained, &ctx_with(None))
            .unwrap();
        assert!(rights_of(&pressed).progress_level > rights_of(&calm).progress_level);
    }
}
