//! Transient notices and the conflict banner.
//!
//! Notices are non-blocking feedback messages that expire on their own,
//! used for action confirmations like "Event moved" or commit failures.
//! The conflict banner is different: it holds a blocking [`ConflictReport`]
//! until the user explicitly dismisses it.

use std::time::{Duration, Instant};

use crate::services::conflict::ConflictReport;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Get the icon for this notice level
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Error => "✗",
        }
    }
}

/// A single transient notice
#[derive(Debug, Clone)]
pub struct Notice {
    /// The message to display
    pub message: String,
    /// The severity level
    pub level: NoticeLevel,
    /// When this notice was created
    pub created_at: Instant,
    /// How long to show this notice
    pub duration: Duration,
}

impl Notice {
    /// Create a new notice
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    /// Create a success notice
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    /// Create an info notice
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Info)
    }

    /// Create a warning notice
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Warning)
    }

    /// Create an error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Error)
    }

    /// Set custom duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if this notice has expired
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// Collects notices and the active conflict banner for the shell to display.
#[derive(Debug, Default)]
pub struct NoticeCenter {
    notices: Vec<Notice>,
    conflict_banner: Option<ConflictReport>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice
    pub fn add(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Add a success notice
    pub fn success(&mut self, message: impl Into<String>) {
        self.add(Notice::success(message));
    }

    /// Add an info notice
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Notice::info(message));
    }

    /// Add a warning notice
    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Notice::warning(message));
    }

    /// Add an error notice
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Notice::error(message));
    }

    /// Remove expired notices
    pub fn cleanup(&mut self) {
        self.notices.retain(|n| !n.is_expired());
    }

    /// Currently visible notices, oldest first.
    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    /// Show a blocked save's conflict report; replaces any previous banner.
    pub fn show_conflicts(&mut self, report: ConflictReport) {
        self.conflict_banner = Some(report);
    }

    /// The pending conflict banner, if any.
    pub fn conflict_banner(&self) -> Option<&ConflictReport> {
        self.conflict_banner.as_ref()
    }

    /// Dismiss the banner; the report is discarded.
    pub fn dismiss_conflicts(&mut self) {
        self.conflict_banner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_levels() {
        assert_eq!(Notice::success("ok").level, NoticeLevel::Success);
        assert_eq!(Notice::error("bad").level, NoticeLevel::Error);
        assert_eq!(NoticeLevel::Warning.icon(), "⚠");
    }

    #[test]
    fn test_cleanup_drops_expired() {
        let mut center = NoticeCenter::new();
        center.add(Notice::info("gone").with_duration(Duration::ZERO));
        center.add(Notice::info("stays"));

        center.cleanup();
        assert_eq!(center.active().len(), 1);
        assert_eq!(center.active()[0].message, "stays");
    }

    #[test]
    fn test_banner_lifecycle() {
        let mut center = NoticeCenter::new();
        assert!(center.conflict_banner().is_none());

        let report = ConflictReport {
            local_violations: vec!["Overlaps \"Algebra\"".to_string()],
            server_conflicts: None,
        };
        center.show_conflicts(report.clone());
        assert_eq!(center.conflict_banner(), Some(&report));

        center.dismiss_conflicts();
        assert!(center.conflict_banner().is_none());
    }
}
