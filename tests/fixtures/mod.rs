// Test fixtures - reusable test data
// Provides consistent sample schedules across test files

use chrono::Weekday;
use timetable_core::models::constraints::ConstraintSet;
use timetable_core::models::event::ScheduleEvent;

/// Sample events for testing
pub mod events {
    use super::*;

    /// Monday 09:00-10:00, group 1
    pub fn monday_algebra() -> ScheduleEvent {
        ScheduleEvent::builder()
            .id(1)
            .day(Weekday::Mon)
            .start_minute(540)
            .end_minute(600)
            .group_id(1)
            .room_id(12)
            .label("Algebra")
            .build()
            .unwrap()
    }

    /// Monday 11:00-12:00, group 1
    pub fn monday_physics() -> ScheduleEvent {
        ScheduleEvent::builder()
            .id(2)
            .day(Weekday::Mon)
            .start_minute(660)
            .end_minute(720)
            .group_id(1)
            .room_id(14)
            .label("Physics")
            .build()
            .unwrap()
    }

    /// Tuesday 09:00-10:00, group 2, locked
    pub fn tuesday_assembly() -> ScheduleEvent {
        ScheduleEvent::builder()
            .id(3)
            .day(Weekday::Tue)
            .start_minute(540)
            .end_minute(600)
            .group_id(2)
            .locked(true)
            .label("Assembly")
            .build()
            .unwrap()
    }

    /// A small week's worth of sessions
    pub fn sample_week() -> Vec<ScheduleEvent> {
        vec![monday_algebra(), monday_physics(), tuesday_assembly()]
    }
}

/// Sample constraint configurations
pub mod constraints {
    use super::*;

    /// The stock configuration: 30m slots, 08:00-18:00, Mon-Fri
    pub fn school_week() -> ConstraintSet {
        ConstraintSet::default()
    }

    /// A configuration with every rule enabled
    pub fn strict() -> ConstraintSet {
        ConstraintSet {
            preferred_duration_minutes: 60,
            min_break_minutes: 15,
            max_consecutive_sessions: 2,
            ..ConstraintSet::default()
        }
    }
}
