//! External interface to the surrounding scheduling service.
//!
//! The core owns no wire format of its own; the application shell supplies an
//! implementation of [`SchedulingApi`] (typically backed by its REST client)
//! and the core consumes it at three suspension points: the per-save conflict
//! check, the mutation commit, and each generation poll.

use async_trait::async_trait;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::event::ScheduleEvent;
use crate::models::job::JobStatus;

/// Errors surfaced by the scheduling service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The service asked us to back off; handled by a dedicated cooldown path.
    #[error("rate limited by the scheduling service")]
    RateLimited,
    /// Network or connection failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Filter for listing the events of one visible timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub timetable_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
}

/// The changed fields of a committed placement; nothing else is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
}

/// One authoritative conflict check for a day/time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictQuery {
    pub timetable_id: i64,
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_id: Option<i64>,
}

/// A single conflict reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetail {
    pub event_id: i64,
    /// What resource collides, e.g. "room" or "group".
    pub kind: String,
    pub message: String,
}

/// Result of a conflict check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheck {
    #[serde(default)]
    pub conflicts: Vec<ConflictDetail>,
}

/// Parameters for triggering a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub timetable_id: i64,
    #[serde(default)]
    pub clear_existing: bool,
}

/// Acknowledgement of a triggered generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStarted {
    pub task_id: String,
}

/// Snapshot of a generation job as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub task_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Operations the surrounding system must supply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// List the stored events matching a filter.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<ScheduleEvent>, ApiError>;

    /// Persist the changed day/time fields of one event.
    async fn update_event(&self, id: i64, patch: &EventPatch)
        -> Result<ScheduleEvent, ApiError>;

    /// Authoritative conflict check for a day/time window.
    async fn check_conflicts(&self, query: &ConflictQuery) -> Result<ConflictCheck, ApiError>;

    /// Kick off an asynchronous generation run.
    async fn trigger_generation(
        &self,
        params: &GenerationParams,
    ) -> Result<GenerationStarted, ApiError>;

    /// Fetch the current status of a generation job.
    async fn fetch_job_status(&self, task_id: &str) -> Result<JobStatusResponse, ApiError>;
}
