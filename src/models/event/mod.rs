// Event module
// Timetabled class session model

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Minutes in a grid day; `end_minute` may never exceed this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A single timed class session placed on the weekly grid.
///
/// Times are expressed as minute-of-day so grid arithmetic stays integral;
/// the invariant `start_minute < end_minute` is enforced by [`validate`].
///
/// [`validate`]: ScheduleEvent::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: i64,
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
    pub group_id: i64,
    pub room_id: Option<i64>,
    #[serde(default)]
    pub locked: bool,
    pub label: String,
}

impl ScheduleEvent {
    /// Create a new event with required fields
    ///
    /// # Arguments
    /// * `id` - Server-assigned event id
    /// * `day` - Day of week the session sits on
    /// * `start_minute` / `end_minute` - Minute-of-day bounds, `start < end`
    ///
    /// # Examples
    /// ```
    /// use timetable_core::models::event::ScheduleEvent;
    /// use chrono::Weekday;
    ///
    /// let event = ScheduleEvent::new(1, Weekday::Mon, 540, 600, 7, "Algebra").unwrap();
    /// assert_eq!(event.duration_minutes(), 60);
    /// ```
    pub fn new(
        id: i64,
        day: Weekday,
        start_minute: u16,
        end_minute: u16,
        group_id: i64,
        label: impl Into<String>,
    ) -> Result<Self, String> {
        let event = Self {
            id,
            day,
            start_minute,
            end_minute,
            group_id,
            room_id: None,
            locked: false,
            label: label.into(),
        };
        event.validate()?;
        Ok(event)
    }

    /// Create a builder for constructing events with optional fields
    pub fn builder() -> ScheduleEventBuilder {
        ScheduleEventBuilder::new()
    }

    /// Validate the event
    pub fn validate(&self) -> Result<(), String> {
        if self.label.trim().is_empty() {
            return Err("Event label cannot be empty".to_string());
        }

        if self.end_minute <= self.start_minute {
            return Err("Event end minute must be after start minute".to_string());
        }

        if self.end_minute > MINUTES_PER_DAY {
            return Err(format!(
                "Event end minute {} exceeds the day ({} minutes)",
                self.end_minute, MINUTES_PER_DAY
            ));
        }

        Ok(())
    }

    /// Get the duration of the event in minutes
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }

    /// Check whether this event overlaps another on the same day.
    /// Events on different days never overlap; an event never overlaps itself.
    pub fn overlaps(&self, other: &ScheduleEvent) -> bool {
        self.id != other.id
            && self.day == other.day
            && self.start_minute < other.end_minute
            && other.start_minute < self.end_minute
    }
}

/// Builder for creating events with optional fields
pub struct ScheduleEventBuilder {
    id: Option<i64>,
    day: Option<Weekday>,
    start_minute: Option<u16>,
    end_minute: Option<u16>,
    group_id: Option<i64>,
    room_id: Option<i64>,
    locked: bool,
    label: Option<String>,
}

impl ScheduleEventBuilder {
    /// Create a new event builder
    pub fn new() -> Self {
        Self {
            id: None,
            day: None,
            start_minute: None,
            end_minute: None,
            group_id: None,
            room_id: None,
            locked: false,
            label: None,
        }
    }

    /// Set the event id
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the day of week
    pub fn day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    /// Set the start minute-of-day
    pub fn start_minute(mut self, start_minute: u16) -> Self {
        self.start_minute = Some(start_minute);
        self
    }

    /// Set the end minute-of-day
    pub fn end_minute(mut self, end_minute: u16) -> Self {
        self.end_minute = Some(end_minute);
        self
    }

    /// Set the class group this session belongs to
    pub fn group_id(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Set the room the session is held in
    pub fn room_id(mut self, room_id: i64) -> Self {
        self.room_id = Some(room_id);
        self
    }

    /// Mark the event as locked (rejects all drag gestures)
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Set the display label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the event
    pub fn build(self) -> Result<ScheduleEvent, String> {
        let id = self.id.ok_or("Event id is required")?;
        let day = self.day.ok_or("Event day is required")?;
        let start_minute = self.start_minute.ok_or("Event start minute is required")?;
        let end_minute = self.end_minute.ok_or("Event end minute is required")?;
        let group_id = self.group_id.ok_or("Event group is required")?;
        let label = self.label.ok_or("Event label is required")?;

        let event = ScheduleEvent {
            id,
            day,
            start_minute,
            end_minute,
            group_id,
            room_id: self.room_id,
            locked: self.locked,
            label,
        };

        event.validate()?;
        Ok(event)
    }
}

impl Default for ScheduleEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}
