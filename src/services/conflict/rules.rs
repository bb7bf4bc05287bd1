// Local scheduling-constraint rules.
// Each rule is pure over the in-memory event set and the candidate placement.

use crate::models::constraints::ConstraintSet;
use crate::models::event::ScheduleEvent;
use crate::utils::time::format_minute_range;

use super::CandidatePlacement;

/// Same-day interval overlaps, candidate's own id excluded.
pub(super) fn overlap_violations(
    events: &[ScheduleEvent],
    placement: &CandidatePlacement,
) -> Vec<String> {
    events
        .iter()
        .filter(|other| other.id != placement.event_id && other.day == placement.day)
        .filter(|other| {
            placement.start_minute < other.end_minute
                && other.start_minute < placement.end_minute
        })
        .map(|other| {
            format!(
                "Overlaps \"{}\" ({})",
                other.label,
                format_minute_range(other.start_minute, other.end_minute)
            )
        })
        .collect()
}

/// Candidate duration must match the preferred session duration, when set.
pub(super) fn preferred_duration_violation(
    constraints: &ConstraintSet,
    placement: &CandidatePlacement,
) -> Option<String> {
    let preferred = constraints.preferred_duration_minutes;
    if preferred == 0 {
        return None;
    }

    let duration = placement.duration_minutes();
    if duration == preferred {
        return None;
    }

    Some(format!(
        "Duration {}m does not match preferred class duration of {}m.",
        duration, preferred
    ))
}

/// True temporal separation between the candidate and a neighbor interval:
/// zero when they overlap, otherwise the distance between the facing bounds.
fn separation_minutes(placement: &CandidatePlacement, other: &ScheduleEvent) -> u16 {
    if other.end_minute <= placement.start_minute {
        placement.start_minute - other.end_minute
    } else if placement.end_minute <= other.start_minute {
        other.start_minute - placement.end_minute
    } else {
        0
    }
}

/// Same-group sessions on the candidate's day must keep a minimum break.
pub(super) fn min_break_violation(
    events: &[ScheduleEvent],
    constraints: &ConstraintSet,
    placement: &CandidatePlacement,
) -> Option<String> {
    let min_break = constraints.min_break_minutes;
    if min_break == 0 {
        return None;
    }

    let closest = events
        .iter()
        .filter(|other| {
            other.id != placement.event_id
                && other.group_id == placement.group_id
                && other.day == placement.day
        })
        .map(|other| (separation_minutes(placement, other), other))
        .min_by_key(|(gap, _)| *gap)?;

    let (gap, neighbor) = closest;
    if gap >= min_break {
        return None;
    }

    Some(format!(
        "Break of {}m from \"{}\" is shorter than the required {}m.",
        gap, neighbor.label, min_break
    ))
}

/// A group may not run more than `max_consecutive_sessions` back to back,
/// where two sessions chain when the gap between them is at most the
/// minimum break.
pub(super) fn max_consecutive_violation(
    events: &[ScheduleEvent],
    constraints: &ConstraintSet,
    placement: &CandidatePlacement,
) -> Option<String> {
    let max_consecutive = constraints.max_consecutive_sessions;
    if max_consecutive == 0 {
        return None;
    }

    let mut intervals: Vec<(u16, u16)> = events
        .iter()
        .filter(|other| {
            other.id != placement.event_id
                && other.group_id == placement.group_id
                && other.day == placement.day
        })
        .map(|other| (other.start_minute, other.end_minute))
        .collect();
    intervals.push((placement.start_minute, placement.end_minute));
    intervals.sort_unstable();

    let chain_gap = constraints.min_break_minutes as i32;
    let mut longest: u32 = 1;
    let mut run: u32 = 1;
    for pair in intervals.windows(2) {
        let (_, prev_end) = pair[0];
        let (next_start, _) = pair[1];
        let gap = next_start as i32 - prev_end as i32;
        if gap <= chain_gap {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    if longest <= max_consecutive {
        return None;
    }

    Some(format!(
        "Run of {} back-to-back sessions exceeds the limit of {}.",
        longest, max_consecutive
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn event(id: i64, group: i64, start: u16, end: u16) -> ScheduleEvent {
        ScheduleEvent::new(id, Weekday::Mon, start, end, group, format!("E{id}")).unwrap()
    }

    fn placement(start: u16, end: u16) -> CandidatePlacement {
        CandidatePlacement {
            event_id: 99,
            group_id: 1,
            day: Weekday::Mon,
            start_minute: start,
            end_minute: end,
        }
    }

    #[test]
    fn test_overlap_detected() {
        let events = vec![event(1, 1, 540, 600)];
        let violations = overlap_violations(&events, &placement(570, 630));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("E1"));
        assert!(violations[0].contains("09:00-10:00"));
    }

    #[test]
    fn test_overlap_ignores_other_day_and_self() {
        let mut tue = event(1, 1, 540, 600);
        tue.day = Weekday::Tue;
        let own = event(99, 1, 540, 600);
        let events = vec![tue, own];
        assert!(overlap_violations(&events, &placement(540, 600)).is_empty());
    }

    #[test]
    fn test_adjacent_is_not_overlap() {
        let events = vec![event(1, 1, 540, 600)];
        assert!(overlap_violations(&events, &placement(600, 660)).is_empty());
    }

    #[test]
    fn test_preferred_duration_mismatch_message() {
        let constraints = ConstraintSet {
            preferred_duration_minutes: 60,
            ..ConstraintSet::default()
        };
        let violation = preferred_duration_violation(&constraints, &placement(540, 585));
        assert_eq!(
            violation.unwrap(),
            "Duration 45m does not match preferred class duration of 60m."
        );
    }

    #[test]
    fn test_preferred_duration_disabled_and_matching() {
        let mut constraints = ConstraintSet::default();
        assert!(preferred_duration_violation(&constraints, &placement(540, 585)).is_none());

        constraints.preferred_duration_minutes = 45;
        assert!(preferred_duration_violation(&constraints, &placement(540, 585)).is_none());
    }

    #[test]
    fn test_min_break_flags_short_gap() {
        let constraints = ConstraintSet {
            min_break_minutes: 15,
            ..ConstraintSet::default()
        };
        // Neighbor ends 10:00, candidate starts 10:10: only a 10m break.
        let events = vec![event(1, 1, 540, 600)];
        let violation = min_break_violation(&events, &constraints, &placement(610, 670));
        assert!(violation.unwrap().contains("10m"));
    }

    #[test]
    fn test_min_break_accepts_sufficient_gap() {
        let constraints = ConstraintSet {
            min_break_minutes: 15,
            ..ConstraintSet::default()
        };
        let events = vec![event(1, 1, 540, 600)];
        assert!(min_break_violation(&events, &constraints, &placement(615, 675)).is_none());
    }

    #[test]
    fn test_min_break_overlap_counts_as_zero_gap() {
        let constraints = ConstraintSet {
            min_break_minutes: 15,
            ..ConstraintSet::default()
        };
        let events = vec![event(1, 1, 540, 600)];
        let violation = min_break_violation(&events, &constraints, &placement(570, 630));
        assert!(violation.unwrap().contains("0m"));
    }

    #[test]
    fn test_min_break_ignores_other_groups() {
        let constraints = ConstraintSet {
            min_break_minutes: 15,
            ..ConstraintSet::default()
        };
        let events = vec![event(1, 2, 540, 600)];
        assert!(min_break_violation(&events, &constraints, &placement(605, 665)).is_none());
    }

    #[test]
    fn test_max_consecutive_flags_long_run() {
        let constraints = ConstraintSet {
            min_break_minutes: 10,
            max_consecutive_sessions: 2,
            ..ConstraintSet::default()
        };
        // Two stored sessions chained, candidate extends the run to 3.
        let events = vec![event(1, 1, 480, 540), event(2, 1, 545, 605)];
        let violation =
            max_consecutive_violation(&events, &constraints, &placement(610, 670));
        assert!(violation.unwrap().contains("Run of 3"));
    }

    #[test]
    fn test_max_consecutive_run_broken_by_long_gap() {
        let constraints = ConstraintSet {
            min_break_minutes: 10,
            max_consecutive_sessions: 2,
            ..ConstraintSet::default()
        };
        // 30m gap before the candidate resets the run.
        let events = vec![event(1, 1, 480, 540), event(2, 1, 545, 605)];
        assert!(
            max_consecutive_violation(&events, &constraints, &placement(635, 695)).is_none()
        );
    }

    #[test]
    fn test_max_consecutive_disabled() {
        let constraints = ConstraintSet::default();
        let events = vec![event(1, 1, 480, 540), event(2, 1, 540, 600)];
        assert!(
            max_consecutive_violation(&events, &constraints, &placement(600, 660)).is_none()
        );
    }
}
