// Minute-of-day utility functions

/// Format a minute-of-day as "HH:MM".
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Format a minute range as "HH:MM-HH:MM".
pub fn format_minute_range(start: u16, end: u16) -> String {
    format!("{}-{}", format_minute(start), format_minute(end))
}

/// Format a duration in minutes as "2h", "45m" or "1h 30m".
pub fn format_duration_minutes(minutes: u16) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    if h > 0 && m > 0 {
        format!("{}h {}m", h, m)
    } else if h > 0 {
        format!("{}h", h)
    } else {
        format!("{}m", m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minute() {
        assert_eq!(format_minute(0), "00:00");
        assert_eq!(format_minute(540), "09:00");
        assert_eq!(format_minute(1439), "23:59");
    }

    #[test]
    fn test_format_minute_range() {
        assert_eq!(format_minute_range(540, 630), "09:00-10:30");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_minutes(45), "45m");
        assert_eq!(format_duration_minutes(120), "2h");
        assert_eq!(format_duration_minutes(90), "1h 30m");
        assert_eq!(format_duration_minutes(0), "0m");
    }
}
