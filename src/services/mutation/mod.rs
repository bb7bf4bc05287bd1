//! Optimistic schedule mutations.
//!
//! The coordinator exclusively owns the in-memory event cache for the visible
//! timetable. Committing a validated candidate snapshots the cache, applies
//! the change optimistically, persists only the changed fields, and restores
//! the snapshot exactly if persistence fails. Wholesale reloads go through a
//! monotonic refresh token so a stale response can never overwrite a newer
//! one.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Weekday;

use crate::api::{ApiError, EventFilter, EventPatch, SchedulingApi};
use crate::models::event::ScheduleEvent;
use crate::services::conflict::CandidatePlacement;
use crate::services::notice::NoticeCenter;
use crate::utils::time::format_minute_range;

/// In-memory cache of the visible timetable's events.
///
/// Backed by an ordered vec plus an id index; the two are kept consistent by
/// construction since all mutation goes through this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCache {
    events: Vec<ScheduleEvent>,
    index: HashMap<i64, usize>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<ScheduleEvent>) -> Self {
        let index = events
            .iter()
            .enumerate()
            .map(|(position, event)| (event.id, position))
            .collect();
        Self { events, index }
    }

    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    pub fn get(&self, id: i64) -> Option<&ScheduleEvent> {
        self.index.get(&id).map(|&position| &self.events[position])
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replace the whole cache contents.
    pub fn replace_all(&mut self, events: Vec<ScheduleEvent>) {
        *self = Self::from_events(events);
    }

    /// Insert or overwrite one event.
    pub fn upsert(&mut self, event: ScheduleEvent) {
        match self.index.get(&event.id) {
            Some(&position) => self.events[position] = event,
            None => {
                self.index.insert(event.id, self.events.len());
                self.events.push(event);
            }
        }
    }

    /// Rewrite the day/time fields of one event. Returns false when the id
    /// is not cached.
    fn place(&mut self, id: i64, day: Weekday, start_minute: u16, end_minute: u16) -> bool {
        match self.index.get(&id) {
            Some(&position) => {
                let event = &mut self.events[position];
                event.day = day;
                event.start_minute = start_minute;
                event.end_minute = end_minute;
                true
            }
            None => false,
        }
    }
}

/// Ticket for one wholesale cache reload; stale tickets are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshToken(u64);

/// Result of one commit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Persisted; the cache holds the server's copy of the event.
    Committed(ScheduleEvent),
    /// Persistence failed; the cache was restored to its pre-commit state.
    RolledBack(ApiError),
    /// The candidate referenced an event that is not in the cache.
    UnknownEvent,
}

/// Applies validated candidates to the cache and persists them.
#[derive(Debug, Default)]
pub struct ScheduleMutationCoordinator {
    cache: EventCache,
    refresh_serial: u64,
}

impl ScheduleMutationCoordinator {
    pub fn new(cache: EventCache) -> Self {
        Self {
            cache,
            refresh_serial: 0,
        }
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    /// Commit a conflict-checked placement.
    ///
    /// The caller guarantees the placement passed [`ConflictEvaluator`];
    /// blocked candidates must be surfaced as a banner instead and never
    /// reach this method.
    ///
    /// [`ConflictEvaluator`]: crate::services::conflict::ConflictEvaluator
    pub async fn commit(
        &mut self,
        api: &dyn SchedulingApi,
        placement: &CandidatePlacement,
        notices: &mut NoticeCenter,
    ) -> CommitOutcome {
        let Some(event) = self.cache.get(placement.event_id) else {
            log::warn!(
                "Commit requested for unknown event {}",
                placement.event_id
            );
            return CommitOutcome::UnknownEvent;
        };
        let label = event.label.clone();

        let snapshot = self.cache.clone();
        self.cache.place(
            placement.event_id,
            placement.day,
            placement.start_minute,
            placement.end_minute,
        );

        let patch = EventPatch {
            day: placement.day,
            start_minute: placement.start_minute,
            end_minute: placement.end_minute,
        };

        match api.update_event(placement.event_id, &patch).await {
            Ok(updated) => {
                self.cache.upsert(updated.clone());
                notices.success(format!(
                    "Moved \"{}\" to {} {}",
                    label,
                    placement.day,
                    format_minute_range(placement.start_minute, placement.end_minute)
                ));
                CommitOutcome::Committed(updated)
            }
            Err(err) => {
                log::error!(
                    "Failed to persist event {}: {}",
                    placement.event_id,
                    err
                );
                self.cache = snapshot;
                notices.error(format!("Could not move \"{}\": {}", label, err));
                CommitOutcome::RolledBack(err)
            }
        }
    }

    /// Start a wholesale reload; the returned token must accompany the
    /// loaded events. Issuing a new token invalidates all prior ones.
    pub fn begin_refresh(&mut self) -> RefreshToken {
        self.refresh_serial += 1;
        RefreshToken(self.refresh_serial)
    }

    /// Install a reload's events, unless a newer reload has started since.
    /// Returns whether the events were installed.
    pub fn apply_refresh(&mut self, token: RefreshToken, events: Vec<ScheduleEvent>) -> bool {
        if token.0 != self.refresh_serial {
            log::debug!(
                "Discarding stale event load (token {} < {})",
                token.0,
                self.refresh_serial
            );
            return false;
        }
        self.cache.replace_all(events);
        true
    }

    /// Reload the cache from the scheduling service. Returns the number of
    /// events installed; a concurrently started newer reload wins and this
    /// one installs nothing.
    pub async fn refresh_from(
        &mut self,
        api: &dyn SchedulingApi,
        filter: &EventFilter,
    ) -> Result<usize> {
        let token = self.begin_refresh();
        let events = api
            .list_events(filter)
            .await
            .context("Failed to load schedule events")?;

        let count = events.len();
        if self.apply_refresh(token, events) {
            Ok(count)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockSchedulingApi;
    use crate::services::notice::NoticeLevel;
    use pretty_assertions::assert_eq;

    fn event(id: i64, start: u16, end: u16) -> ScheduleEvent {
        ScheduleEvent::new(id, Weekday::Mon, start, end, 1, format!("E{id}")).unwrap()
    }

    fn placement(event_id: i64, day: Weekday, start: u16, end: u16) -> CandidatePlacement {
        CandidatePlacement {
            event_id,
            group_id: 1,
            day,
            start_minute: start,
            end_minute: end,
        }
    }

    fn seeded_coordinator() -> ScheduleMutationCoordinator {
        ScheduleMutationCoordinator::new(EventCache::from_events(vec![
            event(1, 540, 600),
            event(2, 660, 720),
        ]))
    }

    #[test]
    fn test_cache_lookup_and_upsert() {
        let mut cache = EventCache::from_events(vec![event(1, 540, 600)]);
        assert_eq!(cache.get(1).unwrap().start_minute, 540);
        assert!(cache.get(9).is_none());

        cache.upsert(event(9, 600, 660));
        assert_eq!(cache.len(), 2);

        let mut replacement = event(1, 700, 760);
        replacement.label = "Renamed".to_string();
        cache.upsert(replacement);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1).unwrap().label, "Renamed");
    }

    #[tokio::test]
    async fn test_commit_success_installs_server_copy() {
        let mut coordinator = seeded_coordinator();
        let mut notices = NoticeCenter::new();

        let mut api = MockSchedulingApi::new();
        api.expect_update_event().returning(|id, patch| {
            let mut updated = event(id, patch.start_minute, patch.end_minute);
            updated.day = patch.day;
            Ok(updated)
        });

        let outcome = coordinator
            .commit(&api, &placement(1, Weekday::Tue, 600, 660), &mut notices)
            .await;

        assert!(matches!(outcome, CommitOutcome::Committed(_)));
        let cached = coordinator.cache().get(1).unwrap();
        assert_eq!(cached.day, Weekday::Tue);
        assert_eq!(cached.start_minute, 600);

        assert_eq!(notices.active().len(), 1);
        assert_eq!(notices.active()[0].level, NoticeLevel::Success);
        assert!(notices.active()[0].message.contains("10:00-11:00"));
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back_exactly() {
        let mut coordinator = seeded_coordinator();
        let before = coordinator.cache().clone();
        let mut notices = NoticeCenter::new();

        let mut api = MockSchedulingApi::new();
        api.expect_update_event()
            .returning(|_, _| Err(ApiError::Transport("connection reset".to_string())));

        let outcome = coordinator
            .commit(&api, &placement(1, Weekday::Tue, 600, 660), &mut notices)
            .await;

        assert!(matches!(outcome, CommitOutcome::RolledBack(_)));
        // Bit-for-bit restoration of the pre-mutation cache.
        assert_eq!(coordinator.cache(), &before);
        assert_eq!(notices.active()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_commit_unknown_event() {
        let mut coordinator = seeded_coordinator();
        let mut notices = NoticeCenter::new();
        let api = MockSchedulingApi::new();

        let outcome = coordinator
            .commit(&api, &placement(77, Weekday::Tue, 600, 660), &mut notices)
            .await;

        assert_eq!(outcome, CommitOutcome::UnknownEvent);
        assert!(!notices.has_notices());
    }

    #[test]
    fn test_stale_refresh_discarded() {
        let mut coordinator = seeded_coordinator();

        let stale = coordinator.begin_refresh();
        let fresh = coordinator.begin_refresh();

        // The newer load lands first.
        assert!(coordinator.apply_refresh(fresh, vec![event(5, 540, 600)]));
        // The older one resolves late and must not overwrite it.
        assert!(!coordinator.apply_refresh(stale, vec![event(6, 540, 600)]));

        assert_eq!(coordinator.cache().len(), 1);
        assert!(coordinator.cache().get(5).is_some());
    }

    #[tokio::test]
    async fn test_refresh_from_installs_events() {
        let mut coordinator = ScheduleMutationCoordinator::default();

        let mut api = MockSchedulingApi::new();
        api.expect_list_events()
            .returning(|_| Ok(vec![event(1, 540, 600), event(2, 660, 720)]));

        let count = coordinator
            .refresh_from(&api, &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(coordinator.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_from_propagates_errors() {
        let mut coordinator = seeded_coordinator();

        let mut api = MockSchedulingApi::new();
        api.expect_list_events()
            .returning(|_| Err(ApiError::RateLimited));

        let result = coordinator.refresh_from(&api, &EventFilter::default()).await;
        assert!(result.is_err());
        // The cache is untouched on a failed reload.
        assert_eq!(coordinator.cache().len(), 2);
    }
}
