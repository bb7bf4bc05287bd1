// Constraint configuration
// Scheduling rules supplied by the surrounding application; read-only to the core

use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Scheduling constraint configuration for one timetable.
///
/// Rule fields use `0` to mean "rule disabled" so a partially filled
/// configuration degrades to plain overlap checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintSet {
    /// Minimum schedulable granularity in minutes; drag snapping rounds to this.
    pub slot_minutes: u16,
    /// First visible hour of the grid day.
    pub day_start_hour: u8,
    /// Last visible hour of the grid day (exclusive).
    pub day_end_hour: u8,
    /// Days shown as columns, in display order.
    pub enabled_days: Vec<Weekday>,
    /// Preferred session duration in minutes; 0 disables the rule.
    pub preferred_duration_minutes: u16,
    /// Minimum break between same-group sessions in minutes; 0 disables.
    pub min_break_minutes: u16,
    /// Maximum back-to-back sessions per group; 0 disables.
    pub max_consecutive_sessions: u32,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            day_start_hour: 8,
            day_end_hour: 18,
            enabled_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            preferred_duration_minutes: 0,
            min_break_minutes: 0,
            max_consecutive_sessions: 0,
        }
    }
}

impl ConstraintSet {
    /// Parse a constraint set from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let constraints: ConstraintSet =
            toml::from_str(input).context("Failed to parse constraint configuration")?;
        constraints
            .validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid constraint configuration")?;
        Ok(constraints)
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.slot_minutes == 0 {
            return Err("Slot granularity must be at least one minute".to_string());
        }

        if self.day_end_hour > 24 {
            return Err("Day end hour cannot exceed 24".to_string());
        }

        if self.day_start_hour >= self.day_end_hour {
            return Err("Day start hour must be before day end hour".to_string());
        }

        if self.enabled_days.is_empty() {
            return Err("At least one day must be enabled".to_string());
        }

        Ok(())
    }

    /// First schedulable minute-of-day.
    pub fn day_start_minute(&self) -> u16 {
        self.day_start_hour as u16 * 60
    }

    /// Last schedulable minute-of-day (exclusive).
    pub fn day_end_minute(&self) -> u16 {
        self.day_end_hour as u16 * 60
    }

    /// Number of day columns on the grid.
    pub fn day_count(&self) -> usize {
        self.enabled_days.len()
    }

    /// Column index of a weekday, if that day is enabled.
    pub fn day_index_of(&self, day: Weekday) -> Option<usize> {
        self.enabled_days.iter().position(|d| *d == day)
    }

    /// Weekday occupying a column index.
    pub fn day_at(&self, index: usize) -> Option<Weekday> {
        self.enabled_days.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let constraints = ConstraintSet::default();
        assert_eq!(constraints.slot_minutes, 30);
        assert_eq!(constraints.day_count(), 5);
        assert_eq!(constraints.day_start_minute(), 480);
        assert_eq!(constraints.day_end_minute(), 1080);
        assert!(constraints.validate().is_ok());
    }

    #[test]
    fn test_day_index_round_trip() {
        let constraints = ConstraintSet::default();
        assert_eq!(constraints.day_index_of(Weekday::Wed), Some(2));
        assert_eq!(constraints.day_at(2), Some(Weekday::Wed));
        assert_eq!(constraints.day_index_of(Weekday::Sun), None);
        assert_eq!(constraints.day_at(9), None);
    }

    #[test]
    fn test_validate_rejects_zero_slot() {
        let constraints = ConstraintSet {
            slot_minutes: 0,
            ..ConstraintSet::default()
        };
        assert!(constraints.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_hours() {
        let constraints = ConstraintSet {
            day_start_hour: 18,
            day_end_hour: 8,
            ..ConstraintSet::default()
        };
        assert!(constraints.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_no_days() {
        let constraints = ConstraintSet {
            enabled_days: vec![],
            ..ConstraintSet::default()
        };
        assert!(constraints.validate().is_err());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let constraints = ConstraintSet::from_toml_str(
            r#"
            slotMinutes = 15
            dayStartHour = 9
            dayEndHour = 17
            preferredDurationMinutes = 45
            "#,
        )
        .unwrap();

        assert_eq!(constraints.slot_minutes, 15);
        assert_eq!(constraints.day_start_hour, 9);
        assert_eq!(constraints.preferred_duration_minutes, 45);
        // Untouched fields keep their defaults
        assert_eq!(constraints.day_count(), 5);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let result = ConstraintSet::from_toml_str("slotMinutes = 0");
        assert!(result.is_err());
    }
}
