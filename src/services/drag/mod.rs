//! Drag interaction: pointer gestures to discrete candidate placements.
//!
//! The controller is headless. The platform layer feeds it pointer positions
//! (column-relative pixels) and it answers with snapped, clamped candidates
//! plus a local-only conflict preview; it never subscribes to window events
//! itself. Horizontal hit testing is pluggable so the week grid and the
//! single-day view share one implementation.

mod geometry;

pub use geometry::{ColumnHitTest, GridGeometry, MultiColumnHitTest, SingleColumnHitTest};

use chrono::Weekday;

use crate::models::event::ScheduleEvent;

/// A pointer position in grid-local pixels: `x` across day columns,
/// `y` down from the top of the schedulable day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Reposition the whole event (may cross day columns).
    Move,
    /// Drag the end boundary only; the day and start stay fixed.
    ResizeEnd,
}

/// An in-progress placement, discarded when the gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragCandidate {
    pub day_index: usize,
    pub start_minute: u16,
    pub duration_minutes: u16,
}

impl DragCandidate {
    pub fn end_minute(&self) -> u16 {
        self.start_minute + self.duration_minutes
    }
}

/// Candidate plus the ids of cached events it would collide with.
/// Computed synchronously on every pointer update; never calls the server.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    pub candidate: DragCandidate,
    pub conflicting_ids: Vec<i64>,
}

/// State of the active gesture.
#[derive(Debug, Clone)]
struct ActiveGesture {
    event_id: i64,
    kind: GestureKind,
    /// Minutes between the grab point and the event start at gesture begin,
    /// so the block tracks the pointer without jumping.
    grab_offset_minutes: i32,
    candidate: DragCandidate,
}

/// Translates a continuous pointer gesture into discrete candidates.
pub struct DragInteractionController<H: ColumnHitTest> {
    geometry: GridGeometry,
    hit_test: H,
    days: Vec<Weekday>,
    active: Option<ActiveGesture>,
}

impl<H: ColumnHitTest> DragInteractionController<H> {
    pub fn new(geometry: GridGeometry, hit_test: H, days: Vec<Weekday>) -> Self {
        Self {
            geometry,
            hit_test,
            days,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_event_id(&self) -> Option<i64> {
        self.active.as_ref().map(|gesture| gesture.event_id)
    }

    pub fn active_candidate(&self) -> Option<DragCandidate> {
        self.active.as_ref().map(|gesture| gesture.candidate)
    }

    /// Begin a move gesture. Locked events never produce a candidate;
    /// returns whether the gesture started.
    pub fn begin_move(&mut self, event: &ScheduleEvent, pointer: PointerPos) -> bool {
        self.begin(event, pointer, GestureKind::Move)
    }

    /// Begin an end-boundary resize gesture.
    pub fn begin_resize(&mut self, event: &ScheduleEvent, pointer: PointerPos) -> bool {
        self.begin(event, pointer, GestureKind::ResizeEnd)
    }

    fn begin(&mut self, event: &ScheduleEvent, pointer: PointerPos, kind: GestureKind) -> bool {
        if event.locked {
            log::debug!("Ignoring gesture on locked event {}", event.id);
            return false;
        }

        let Some(day_index) = self.days.iter().position(|d| *d == event.day) else {
            log::warn!(
                "Gesture on event {} whose day is not an enabled column",
                event.id
            );
            return false;
        };

        let grab_offset_minutes =
            self.geometry.minute_at(pointer.y) - event.start_minute as i32;

        self.active = Some(ActiveGesture {
            event_id: event.id,
            kind,
            grab_offset_minutes,
            candidate: DragCandidate {
                day_index,
                start_minute: event.start_minute,
                duration_minutes: event.duration_minutes(),
            },
        });
        true
    }

    /// Advance the gesture to a new pointer position and recompute the
    /// local-only conflict preview against the cached events.
    pub fn update(&mut self, pointer: PointerPos, events: &[ScheduleEvent]) -> Option<DragPreview> {
        let candidate = {
            let gesture = self.active.as_ref()?;
            Self::candidate_at(&self.geometry, &self.hit_test, gesture, pointer)
        };

        let gesture = self.active.as_mut()?;
        gesture.candidate = candidate;

        let day = self.days.get(candidate.day_index).copied()?;
        let conflicting_ids = preview_conflicts(events, gesture.event_id, day, &candidate);

        Some(DragPreview {
            candidate,
            conflicting_ids,
        })
    }

    /// Finish the gesture. A move released outside every valid day column is
    /// a cancellation and yields no candidate; resize ignores the horizontal
    /// axis. The gesture state is discarded either way.
    pub fn release(&mut self, pointer: PointerPos) -> Option<DragCandidate> {
        let gesture = self.active.take()?;

        if gesture.kind == GestureKind::Move && self.hit_test.day_at(pointer.x).is_none() {
            log::debug!(
                "Drag of event {} released outside the grid; cancelled",
                gesture.event_id
            );
            return None;
        }

        Some(Self::candidate_at(
            &self.geometry,
            &self.hit_test,
            &gesture,
            pointer,
        ))
    }

    /// Abandon the gesture with no state change.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    fn candidate_at(
        geometry: &GridGeometry,
        hit_test: &H,
        gesture: &ActiveGesture,
        pointer: PointerPos,
    ) -> DragCandidate {
        let current = gesture.candidate;
        match gesture.kind {
            GestureKind::Move => {
                // Outside every column the candidate keeps its day.
                let day_index = hit_test
                    .day_at(pointer.x)
                    .map(|day| geometry.clamp_day(day as i32))
                    .unwrap_or(current.day_index);

                let raw_start = geometry.minute_at(pointer.y) - gesture.grab_offset_minutes;
                let snapped = geometry.snap(raw_start);
                let start_minute = geometry.clamp_start(snapped, current.duration_minutes);

                DragCandidate {
                    day_index,
                    start_minute,
                    duration_minutes: current.duration_minutes,
                }
            }
            GestureKind::ResizeEnd => {
                let raw_end = geometry.minute_at(pointer.y);
                let snapped_end = geometry.snap(raw_end);

                let min_duration = geometry.slot_minutes as i32;
                let max_duration =
                    (geometry.day_end_minute() as i32 - current.start_minute as i32)
                        .max(min_duration);
                let duration = (snapped_end - current.start_minute as i32)
                    .clamp(min_duration, max_duration);

                DragCandidate {
                    day_index: current.day_index,
                    start_minute: current.start_minute,
                    duration_minutes: duration as u16,
                }
            }
        }
    }
}

/// Ids of same-day cached events overlapping the candidate window,
/// excluding the dragged event itself.
fn preview_conflicts(
    events: &[ScheduleEvent],
    dragged_id: i64,
    day: Weekday,
    candidate: &DragCandidate,
) -> Vec<i64> {
    let end = candidate.end_minute();
    events
        .iter()
        .filter(|event| event.id != dragged_id && event.day == day)
        .filter(|event| candidate.start_minute < event.end_minute && event.start_minute < end)
        .map(|event| event.id)
        .collect()
}
