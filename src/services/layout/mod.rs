//! Lane layout for day columns.
//!
//! Converts the events of one day into non-overlapping visual lanes using
//! greedy first-fit interval coloring. Processing events in start order makes
//! the greedy choice optimal: the lane count equals the maximum number of
//! events active at any single instant (the clique number of the interval
//! graph), never more.

use chrono::Weekday;

use crate::models::event::ScheduleEvent;

/// The `[start, end)` minute range of an event, derived per render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One event block positioned in a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutBlock {
    pub event_id: i64,
    pub start: u16,
    pub end: u16,
    /// Lane index within the day column, 0-based.
    pub lane: usize,
    /// Total lanes in the day column; shared by all blocks of the day.
    pub lane_count: usize,
}

/// Lane assignment for a single day column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayLayout {
    pub items: Vec<LaidOutBlock>,
    pub lane_count: usize,
}

impl DayLayout {
    /// Lane of a specific event, if it is part of this layout.
    pub fn lane_of(&self, event_id: i64) -> Option<usize> {
        self.items
            .iter()
            .find(|block| block.event_id == event_id)
            .map(|block| block.lane)
    }
}

/// Assign lanes to the events of one day.
///
/// Events are sorted ascending by start minute, ties broken longer-duration
/// first so a long event is not pushed behind a short one sharing its start.
/// Each event takes the first lane whose latest occupied end minute is at or
/// before its start; otherwise a new lane opens.
pub fn day_layout(events: &[&ScheduleEvent]) -> DayLayout {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        events[a]
            .start_minute
            .cmp(&events[b].start_minute)
            .then_with(|| {
                events[b]
                    .duration_minutes()
                    .cmp(&events[a].duration_minutes())
            })
            .then_with(|| events[a].id.cmp(&events[b].id))
    });

    // Latest end minute occupied per lane.
    let mut lane_end: Vec<u16> = Vec::new();
    let mut items = Vec::with_capacity(events.len());

    for idx in order {
        let event = events[idx];
        let lane = match lane_end
            .iter()
            .position(|&end| end <= event.start_minute)
        {
            Some(lane) => {
                lane_end[lane] = event.end_minute;
                lane
            }
            None => {
                lane_end.push(event.end_minute);
                lane_end.len() - 1
            }
        };

        items.push(LaidOutBlock {
            event_id: event.id,
            start: event.start_minute,
            end: event.end_minute,
            lane,
            lane_count: 0,
        });
    }

    let lane_count = lane_end.len();
    for block in &mut items {
        block.lane_count = lane_count;
    }

    DayLayout { items, lane_count }
}

/// Lay out a whole visible week: one [`DayLayout`] per enabled day, in
/// display order. Events on disabled days are skipped.
pub fn week_layout(
    events: &[ScheduleEvent],
    enabled_days: &[Weekday],
) -> Vec<(Weekday, DayLayout)> {
    enabled_days
        .iter()
        .map(|&day| {
            let day_events: Vec<&ScheduleEvent> =
                events.iter().filter(|e| e.day == day).collect();
            (day, day_layout(&day_events))
        })
        .collect()
}
