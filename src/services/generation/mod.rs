//! Generation job tracking.
//!
//! A tick-driven polling state machine that monitors one asynchronous
//! schedule-generation job. The embedding event loop calls
//! [`tick_with_fetcher_at`] (or the async [`poll_once`]) as often as it
//! likes; the tracker only fetches when a poll is due, adapts its cadence to
//! the job's age, backs off on transient errors, and pauses entirely when the
//! service rate-limits. Ticks take an explicit `now` so every transition is
//! testable without timers.
//!
//! [`tick_with_fetcher_at`]: GenerationStatusTracker::tick_with_fetcher_at
//! [`poll_once`]: GenerationStatusTracker::poll_once

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local};

use crate::api::{ApiError, GenerationParams, JobStatusResponse, SchedulingApi};
use crate::models::job::{GenerationJob, JobStatus};

/// Consecutive non-rate-limit errors tolerated before the job is failed.
const MAX_CONSECUTIVE_ERRORS: u32 = 5;
/// Ceiling for every poll delay.
const MAX_INTERVAL_MS: i64 = 60_000;
/// Cooldown grows by this step per consecutive error while rate limited.
const COOLDOWN_STEP_MS: i64 = 5_000;

/// Phase of the polling state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Nothing scheduled: not started, torn down, or the job is terminal.
    Idle,
    /// Healthy cadence-based polling.
    Polling,
    /// Delayed retry after a transient polling error.
    Backoff,
    /// Paused after a rate-limited response.
    Cooldown,
}

/// What one tick did, and when the next poll is due.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerTick {
    /// Whether a status fetch was issued this tick.
    pub polled: bool,
    /// The job status after the tick.
    pub status: Option<JobStatus>,
    /// Set when the job just completed; the grid should reload its events.
    pub refresh_requested: bool,
    /// Delay until the next poll is due, if any is scheduled.
    pub next_due_in: Option<StdDuration>,
}

enum PollGate {
    Skip(TrackerTick),
    Fetch(String),
}

/// Adaptive cadence tier for a job of the given age.
fn cadence_ms(elapsed_ms: i64) -> i64 {
    if elapsed_ms < 10_000 {
        1_000
    } else if elapsed_ms < 30_000 {
        2_000
    } else if elapsed_ms < 60_000 {
        5_000
    } else {
        10_000
    }
}

/// Monitors one generation job lifecycle.
#[derive(Debug)]
pub struct GenerationStatusTracker {
    job: Option<GenerationJob>,
    phase: TrackerPhase,
    consecutive_errors: u32,
    /// Pressure multiplier applied to the cadence; doubles on rate limits.
    interval_multiplier: u32,
    last_poll_at: Option<DateTime<Local>>,
    next_poll_at: Option<DateTime<Local>>,
}

impl Default for GenerationStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationStatusTracker {
    pub fn new() -> Self {
        Self {
            job: None,
            phase: TrackerPhase::Idle,
            consecutive_errors: 0,
            interval_multiplier: 1,
            last_poll_at: None,
            next_poll_at: None,
        }
    }

    pub fn job(&self) -> Option<&GenerationJob> {
        self.job.as_ref()
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.job.as_ref().map(|job| job.status)
    }

    /// Delay until the next scheduled poll, if any.
    pub fn next_due_in(&self, now: DateTime<Local>) -> Option<StdDuration> {
        self.next_poll_at.map(|at| {
            (at - now)
                .to_std()
                .unwrap_or_else(|_| StdDuration::from_secs(0))
        })
    }

    /// Begin a new job lifecycle: record the start instant and enter polling.
    /// Any previous lifecycle, terminal or not, is replaced.
    pub fn start_at(&mut self, now: DateTime<Local>, task_id: impl Into<String>) {
        let task_id = task_id.into();
        log::info!("Tracking generation job {task_id}");
        self.job = Some(GenerationJob::started(task_id, now));
        self.phase = TrackerPhase::Polling;
        self.consecutive_errors = 0;
        self.interval_multiplier = 1;
        self.last_poll_at = Some(now);
        self.next_poll_at = Some(now + Duration::milliseconds(self.effective_interval_ms(now)));
    }

    /// Trigger a generation run on the service and start tracking it.
    pub async fn start(
        &mut self,
        api: &dyn SchedulingApi,
        params: &GenerationParams,
    ) -> Result<String, ApiError> {
        let started = api.trigger_generation(params).await?;
        self.start_at(Local::now(), started.task_id.clone());
        Ok(started.task_id)
    }

    /// Advance the state machine. Fetches the job status only when a poll is
    /// due; otherwise just reports the remaining delay (retuning it when the
    /// cadence tier has changed since the poll was scheduled).
    pub fn tick_with_fetcher_at<F>(&mut self, now: DateTime<Local>, mut fetcher: F) -> TrackerTick
    where
        F: FnMut(&str) -> Result<JobStatusResponse, ApiError>,
    {
        match self.gate_at(now) {
            PollGate::Skip(tick) => tick,
            PollGate::Fetch(task_id) => {
                let outcome = fetcher(&task_id);
                self.apply_poll_at(now, outcome)
            }
        }
    }

    /// Async counterpart of [`tick_with_fetcher_at`] against the service.
    ///
    /// [`tick_with_fetcher_at`]: Self::tick_with_fetcher_at
    pub async fn poll_once(&mut self, api: &dyn SchedulingApi) -> TrackerTick {
        let now = Local::now();
        match self.gate_at(now) {
            PollGate::Skip(tick) => tick,
            PollGate::Fetch(task_id) => {
                let outcome = api.fetch_job_status(&task_id).await;
                self.apply_poll_at(Local::now(), outcome)
            }
        }
    }

    /// Fetch the status immediately, regardless of the schedule. Clears any
    /// outstanding schedule first and never restarts a stopped lifecycle.
    pub fn refresh_with_fetcher_at<F>(
        &mut self,
        now: DateTime<Local>,
        mut fetcher: F,
    ) -> TrackerTick
    where
        F: FnMut(&str) -> Result<JobStatusResponse, ApiError>,
    {
        let Some(task_id) = self.job.as_ref().map(|job| job.task_id.clone()) else {
            return TrackerTick::default();
        };

        let was_stopped = self.phase == TrackerPhase::Idle;
        self.next_poll_at = None;

        let tick = self.apply_poll_at(now, fetcher(&task_id));
        if was_stopped {
            self.stop_polling();
            return TrackerTick {
                next_due_in: None,
                ..tick
            };
        }
        tick
    }

    /// Tear down: clear every outstanding schedule. The job record is kept
    /// for display; a new lifecycle requires an explicit start.
    pub fn shutdown(&mut self) {
        log::debug!("Generation tracker shut down");
        self.stop_polling();
    }

    fn stop_polling(&mut self) {
        self.phase = TrackerPhase::Idle;
        self.last_poll_at = None;
        self.next_poll_at = None;
    }

    fn effective_interval_ms(&self, now: DateTime<Local>) -> i64 {
        let elapsed_ms = self
            .job
            .as_ref()
            .map(|job| (now - job.started_at).num_milliseconds().max(0))
            .unwrap_or(0);
        (cadence_ms(elapsed_ms) * self.interval_multiplier as i64).min(MAX_INTERVAL_MS)
    }

    fn gate_at(&mut self, now: DateTime<Local>) -> PollGate {
        if self.phase == TrackerPhase::Idle {
            return PollGate::Skip(TrackerTick {
                status: self.status(),
                ..TrackerTick::default()
            });
        }

        let Some(mut due) = self.next_poll_at else {
            self.stop_polling();
            return PollGate::Skip(TrackerTick {
                status: self.status(),
                ..TrackerTick::default()
            });
        };

        // Restart the pending delay when the cadence tier moved on.
        if self.phase == TrackerPhase::Polling {
            if let Some(last) = self.last_poll_at {
                let retuned = last + Duration::milliseconds(self.effective_interval_ms(now));
                if retuned != due {
                    log::debug!("Polling cadence retuned");
                    self.next_poll_at = Some(retuned);
                    due = retuned;
                }
            }
        }

        if now < due {
            return PollGate::Skip(TrackerTick {
                status: self.status(),
                next_due_in: self.next_due_in(now),
                ..TrackerTick::default()
            });
        }

        if self.phase == TrackerPhase::Cooldown && self.status() != Some(JobStatus::InProgress) {
            // The job left the running state while we were cooling down.
            self.stop_polling();
            return PollGate::Skip(TrackerTick {
                status: self.status(),
                ..TrackerTick::default()
            });
        }

        match self.job.as_ref() {
            Some(job) => PollGate::Fetch(job.task_id.clone()),
            None => {
                self.stop_polling();
                PollGate::Skip(TrackerTick::default())
            }
        }
    }

    fn apply_poll_at(
        &mut self,
        now: DateTime<Local>,
        outcome: Result<JobStatusResponse, ApiError>,
    ) -> TrackerTick {
        self.last_poll_at = Some(now);

        match outcome {
            Ok(response) => {
                self.consecutive_errors = 0;

                let mut refresh_requested = false;
                if let Some(job) = self.job.as_mut() {
                    // Terminal states are absorbing until an explicit restart.
                    if !job.status.is_terminal() {
                        refresh_requested = response.status == JobStatus::Completed
                            && job.status != JobStatus::Completed;
                        job.status = response.status;
                        job.errors = response.errors;
                    }
                }

                let status = self.status();
                if status.is_some_and(|s| s.is_terminal()) {
                    log::info!("Generation job finished with status {status:?}");
                    self.stop_polling();
                    TrackerTick {
                        polled: true,
                        status,
                        refresh_requested,
                        next_due_in: None,
                    }
                } else {
                    self.phase = TrackerPhase::Polling;
                    self.next_poll_at =
                        Some(now + Duration::milliseconds(self.effective_interval_ms(now)));
                    TrackerTick {
                        polled: true,
                        status,
                        refresh_requested: false,
                        next_due_in: self.next_due_in(now),
                    }
                }
            }
            Err(ApiError::RateLimited) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                self.interval_multiplier = self.interval_multiplier.saturating_mul(2).min(64);

                let cooldown_ms =
                    (COOLDOWN_STEP_MS * self.consecutive_errors as i64).min(MAX_INTERVAL_MS);
                self.phase = TrackerPhase::Cooldown;
                self.next_poll_at = Some(now + Duration::milliseconds(cooldown_ms));
                log::warn!(
                    "Job status poll rate limited; cooling down for {}ms",
                    cooldown_ms
                );

                TrackerTick {
                    polled: true,
                    status: self.status(),
                    refresh_requested: false,
                    next_due_in: self.next_due_in(now),
                }
            }
            Err(err) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                log::warn!(
                    "Job status poll failed ({}/{}): {}",
                    self.consecutive_errors,
                    MAX_CONSECUTIVE_ERRORS,
                    err
                );

                if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    if let Some(job) = self.job.as_mut() {
                        if !job.status.is_terminal() {
                            job.status = JobStatus::Failed;
                            job.errors
                                .push(format!("Status polling failed repeatedly: {err}"));
                        }
                    }
                    self.stop_polling();
                    return TrackerTick {
                        polled: true,
                        status: self.status(),
                        refresh_requested: false,
                        next_due_in: None,
                    };
                }

                self.phase = TrackerPhase::Backoff;
                let elapsed_ms = self
                    .job
                    .as_ref()
                    .map(|job| (now - job.started_at).num_milliseconds().max(0))
                    .unwrap_or(0);
                let delay_ms = cadence_ms(elapsed_ms)
                    .saturating_mul(2_i64.saturating_pow(self.consecutive_errors))
                    .min(MAX_INTERVAL_MS);
                self.next_poll_at = Some(now + Duration::milliseconds(delay_ms));

                TrackerTick {
                    polled: true,
                    status: self.status(),
                    refresh_requested: false,
                    next_due_in: self.next_due_in(now),
                }
            }
        }
    }
}
