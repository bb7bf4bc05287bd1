// Generation job model
// State of one asynchronous timetable-generation run

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation job.
///
/// `Completed` and `Failed` are terminal: once reached, the status only
/// changes when a new job lifecycle is started explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states stop all polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One asynchronous schedule-generation run, as known to this client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub task_id: String,
    pub status: JobStatus,
    pub errors: Vec<String>,
    pub started_at: DateTime<Local>,
}

impl GenerationJob {
    /// Create a freshly started job.
    pub fn started(task_id: impl Into<String>, started_at: DateTime<Local>) -> Self {
        Self {
            task_id: task_id.into(),
            status: JobStatus::InProgress,
            errors: Vec::new(),
            started_at,
        }
    }
}
