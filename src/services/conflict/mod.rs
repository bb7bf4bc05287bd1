//! Conflict evaluation for candidate placements.
//!
//! Decides whether a candidate may be committed. Local rules (overlap,
//! preferred duration, minimum break, maximum consecutive run) are evaluated
//! purely against the in-memory cache; an authoritative server check is issued
//! once per attempted save and merged additively: any local violation OR any
//! server-reported conflict blocks the commit.

mod rules;

use chrono::Weekday;

use crate::api::{ApiError, ConflictDetail, ConflictQuery, SchedulingApi};
use crate::models::constraints::ConstraintSet;
use crate::models::event::ScheduleEvent;
use crate::services::drag::DragCandidate;

/// A proposed placement resolved to absolute day and minute bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePlacement {
    pub event_id: i64,
    pub group_id: i64,
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl CandidatePlacement {
    /// Resolve a drag candidate against the event it moves and the grid's
    /// enabled days. Returns `None` when the candidate's day index does not
    /// map to an enabled column.
    pub fn resolve(
        event: &ScheduleEvent,
        candidate: &DragCandidate,
        constraints: &ConstraintSet,
    ) -> Option<Self> {
        let day = constraints.day_at(candidate.day_index)?;
        Some(Self {
            event_id: event.id,
            group_id: event.group_id,
            day,
            start_minute: candidate.start_minute,
            end_minute: candidate.end_minute(),
        })
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }
}

/// Outcome of evaluating one save attempt.
///
/// Attached to the pending save and discarded once it resolves or the user
/// dismisses the banner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictReport {
    pub local_violations: Vec<String>,
    /// `None` until the authoritative check has run (or when it failed).
    pub server_conflicts: Option<Vec<ConflictDetail>>,
}

impl ConflictReport {
    /// Any local violation or any server-reported conflict blocks the commit.
    pub fn blocks_commit(&self) -> bool {
        !self.local_violations.is_empty()
            || self
                .server_conflicts
                .as_ref()
                .is_some_and(|conflicts| !conflicts.is_empty())
    }

    pub fn is_clean(&self) -> bool {
        !self.blocks_commit()
    }
}

/// Evaluates candidate placements against the constraint configuration.
pub struct ConflictEvaluator<'a> {
    constraints: &'a ConstraintSet,
}

impl<'a> ConflictEvaluator<'a> {
    pub fn new(constraints: &'a ConstraintSet) -> Self {
        Self { constraints }
    }

    /// Run the local rules only. Pure over the given event set.
    pub fn evaluate_local(
        &self,
        events: &[ScheduleEvent],
        placement: &CandidatePlacement,
    ) -> ConflictReport {
        let mut local_violations = rules::overlap_violations(events, placement);

        if let Some(violation) = rules::preferred_duration_violation(self.constraints, placement)
        {
            local_violations.push(violation);
        }

        if let Some(violation) =
            rules::min_break_violation(events, self.constraints, placement)
        {
            local_violations.push(violation);
        }

        if let Some(violation) =
            rules::max_consecutive_violation(events, self.constraints, placement)
        {
            local_violations.push(violation);
        }

        ConflictReport {
            local_violations,
            server_conflicts: None,
        }
    }

    /// Run the local rules, then the authoritative server check for the same
    /// day/time window (excluding the event's own id), and merge.
    ///
    /// Issued once per attempted save, never per pointer movement. An
    /// unreachable check blocks the commit rather than silently passing.
    pub async fn evaluate_with_server(
        &self,
        api: &dyn SchedulingApi,
        timetable_id: i64,
        events: &[ScheduleEvent],
        placement: &CandidatePlacement,
    ) -> ConflictReport {
        let mut report = self.evaluate_local(events, placement);

        let query = ConflictQuery {
            timetable_id,
            day: placement.day,
            start_minute: placement.start_minute,
            end_minute: placement.end_minute,
            exclude_id: Some(placement.event_id),
        };

        match api.check_conflicts(&query).await {
            Ok(check) => {
                report.server_conflicts = Some(check.conflicts);
            }
            Err(err) => {
                log::warn!(
                    "Conflict check for event {} failed: {}",
                    placement.event_id,
                    err
                );
                report
                    .local_violations
                    .push(conflict_check_failure_message(&err));
            }
        }

        report
    }
}

fn conflict_check_failure_message(err: &ApiError) -> String {
    format!("Could not verify conflicts with the server: {err}")
}
