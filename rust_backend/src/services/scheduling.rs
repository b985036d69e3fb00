//! The scheduling engine.
//!
//! [`SchedulingEngine`] is the only writer of events. It resolves requests into
//! candidate events, checks them against the instructor's existing bookings
//! and rules, and persists them. The check-then-write sequence of every write
//! runs under a per-instructor async lock, so two concurrent requests for the
//! same instructor cannot both pass the conflict check.
//!
//! Writes that touch a training class (booking, designation, rescheduling,
//! cancellation) first take that class's lock, then the instructor's. Locks
//! are always acquired in that order.
//!
//! # Example
//! ```
//! use chrono::NaiveDate;
//! use instructor_scheduling::api::NewEventRequest;
//! use instructor_scheduling::config::SchedulingSettings;
//! use instructor_scheduling::db::{DirectoryRepository, LocalRepository};
//! use instructor_scheduling::models::{Instructor, InstructorId};
//! use instructor_scheduling::services::SchedulingEngine;
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let repo = Arc::new(LocalRepository::new());
//!     repo.store_instructor(&Instructor::new(InstructorId(1), "Ada")).await.unwrap();
//!     let engine = SchedulingEngine::new(repo, SchedulingSettings::default());
//!
//!     let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     engine
//!         .create_event(NewEventRequest::weekly(InstructorId(1), monday, None, vec![1]))
//!         .await
//!         .unwrap();
//!
//!     let next_monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//!     assert!(!engine.is_instructor_idle(InstructorId(1), next_monday, next_monday).await.unwrap());
//! });
//! ```

use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::algorithms::conflicts::{find_conflict, first_conflict_day, rule_blocks_day};
use crate::api::{EventDraft, NewEventRequest};
use crate::config::{RuleConflictScope, SchedulingSettings};
use crate::db::repository::{
    ChangeSet, DirectoryRepository, EventFilter, EventPatch, EventRepository, FullRepository,
    RepositoryError,
};
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{CalendarDay, Event, EventId, EventType, InstructorId, TrainingClassId};
use crate::services::calendar::build_calendar;
use crate::time::DateRange;

/// Scope of a write lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Class(TrainingClassId),
    Instructor(InstructorId),
    /// Used for every instructor write when rules are checked against all bookings.
    Global,
}

pub struct SchedulingEngine {
    repo: Arc<dyn FullRepository>,
    settings: SchedulingSettings,
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl SchedulingEngine {
    pub fn new(repo: Arc<dyn FullRepository>, settings: SchedulingSettings) -> Self {
        Self {
            repo,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    pub fn settings(&self) -> &SchedulingSettings {
        &self.settings
    }

    async fn lock_for(&self, instructor: InstructorId) -> OwnedMutexGuard<()> {
        let key = match self.settings.rule_conflict_scope {
            RuleConflictScope::Instructor => LockKey::Instructor(instructor),
            RuleConflictScope::Global => LockKey::Global,
        };
        self.acquire(key).await
    }

    /// Serialize writes to one training class and its booking.
    pub(crate) async fn lock_class(&self, training_class: TrainingClassId) -> OwnedMutexGuard<()> {
        self.acquire(LockKey::Class(training_class)).await
    }

    async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only the map references are neither held nor awaited.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }

    // ==================== Writes ====================

    /// Validate, conflict-check and persist a new event.
    ///
    /// # Errors
    /// * `Validation` - inconsistent request fields, or a class without instructor
    /// * `NotFound` - unknown instructor or training class
    /// * `ScheduleConflict` - the candidate collides with a booking or rule
    pub async fn create_event(&self, request: NewEventRequest) -> SchedulingResult<Event> {
        let _class_guard = match &request {
            NewEventRequest::ClassBooking { training_class } => {
                Some(self.lock_class(*training_class).await)
            }
            _ => None,
        };
        self.create_event_holding_class(request).await
    }

    /// [`Self::create_event`] for callers already holding the class lock of a
    /// booking request.
    pub(crate) async fn create_event_holding_class(
        &self,
        request: NewEventRequest,
    ) -> SchedulingResult<Event> {
        request.validate()?;
        let candidate = self.candidate_for(&request).await?;
        let instructor = candidate.instructor.ok_or_else(|| {
            SchedulingError::validation("Event has no instructor")
        })?;

        let _guard = self.lock_for(instructor).await;
        let stored = match candidate.event_type {
            EventType::ClassSchedule => self.insert_booking(candidate).await?,
            EventType::OneTimeUnavailability | EventType::RecurringUnavailability => {
                self.insert_rule(candidate).await?
            }
            EventType::CancelUnavailability => self.repo.save_event(&candidate).await?,
        };

        info!(
            "Created {} event {} for instructor {} starting {}",
            stored.event_type,
            stored.id.map_or_else(|| "?".to_string(), |id| id.to_string()),
            instructor,
            stored.start_date
        );
        Ok(stored)
    }

    /// Resolve flat host fields and create the event.
    pub async fn create_event_from_draft(&self, draft: EventDraft) -> SchedulingResult<Event> {
        let request = draft.resolve()?;
        self.create_event(request).await
    }

    /// Build the unsaved event for `request`, resolving class bookings
    /// through the directory.
    async fn candidate_for(&self, request: &NewEventRequest) -> SchedulingResult<Event> {
        if let Some(event) = request.to_event() {
            if let Some(instructor) = event.instructor {
                self.repo.get_instructor(instructor).await?;
            }
            return Ok(event);
        }

        let NewEventRequest::ClassBooking { training_class } = request else {
            return Err(SchedulingError::validation("Unresolvable event request"));
        };
        let class = self.repo.get_training_class(*training_class).await?;
        let instructor = class.instructor.ok_or_else(|| {
            SchedulingError::validation(format!(
                "Training class {} has no instructor assigned",
                class.id
            ))
        })?;
        self.repo.get_instructor(instructor).await?;

        let window = class.window(self.settings.class_duration_days);
        Ok(Event::class_schedule(class.id, instructor, window.start, window.end))
    }

    async fn insert_rule(&self, rule: Event) -> SchedulingResult<Event> {
        let instructor = rule.instructor;
        let mut filter = EventFilter::new().event_types(&[EventType::ClassSchedule]);
        if self.settings.rule_conflict_scope == RuleConflictScope::Instructor {
            if let Some(instructor) = instructor {
                filter = filter.instructor(instructor);
            }
        }

        let bookings = self.repo.find_events(&filter).await?;
        debug!(
            "Checking {} rule against {} bookings",
            rule.event_type,
            bookings.len()
        );
        for booking in &bookings {
            if let Some(day) = first_conflict_day(booking, &rule, &[]) {
                warn!(
                    "Rejected {} rule: booking {:?} on {}",
                    rule.event_type, booking.id, day
                );
                return Err(SchedulingError::conflict(
                    "rule conflicts with an existing class schedule",
                    booking.id,
                    Some(day),
                ));
            }
        }

        // A new rule re-establishes unavailability on days that were cancelled.
        let mut changes = ChangeSet::new().insert(rule.clone());
        if let Some(instructor) = instructor {
            let cancellations = self
                .repo
                .find_events(
                    &EventFilter::new()
                        .instructor(instructor)
                        .event_types(&[EventType::CancelUnavailability]),
                )
                .await?;
            for cancellation in cancellations
                .iter()
                .filter(|c| first_conflict_day(c, &rule, &[]).is_some())
            {
                if let Some(id) = cancellation.id {
                    debug!("Superseding cancellation {} on {}", id, cancellation.start_date);
                    changes = changes.delete(id);
                }
            }
        }

        let inserted = self.repo.apply_changes(&changes).await?;
        if !changes.deletes.is_empty() {
            info!("Removed {} superseded cancellations", changes.deletes.len());
        }
        inserted.into_iter().next().ok_or_else(|| {
            SchedulingError::Repository(RepositoryError::internal(
                "Change set committed without returning the inserted rule",
            ))
        })
    }

    /// Reject `booking` if it hits a rule or another booking of its instructor.
    ///
    /// `ignore` excludes an existing booking, used when it is being moved.
    async fn check_booking(&self, booking: &Event, ignore: Option<EventId>) -> SchedulingResult<()> {
        let Some(instructor) = booking.instructor else {
            return Err(SchedulingError::validation("Class schedule has no instructor"));
        };
        let existing = self
            .repo
            .find_events(&EventFilter::new().instructor(instructor))
            .await?;

        let cancellations: Vec<Event> = existing
            .iter()
            .filter(|e| e.is_cancellation())
            .cloned()
            .collect();

        if let Some(conflict) = find_conflict(
            booking,
            existing.iter().filter(|e| e.is_rule()),
            &cancellations,
        ) {
            warn!(
                "Rejected booking for instructor {}: rule {:?} on {}",
                instructor, conflict.existing_event, conflict.day
            );
            return Err(SchedulingError::conflict(
                "class schedule conflicts with an existing rule",
                conflict.existing_event,
                Some(conflict.day),
            ));
        }

        if let Some(conflict) = find_conflict(
            booking,
            existing
                .iter()
                .filter(|e| e.is_booking() && (ignore.is_none() || e.id != ignore)),
            &[],
        ) {
            warn!(
                "Rejected booking for instructor {}: overlaps booking {:?} on {}",
                instructor, conflict.existing_event, conflict.day
            );
            return Err(SchedulingError::conflict(
                "class schedule overlaps an existing class schedule",
                conflict.existing_event,
                Some(conflict.day),
            ));
        }

        Ok(())
    }

    async fn insert_booking(&self, booking: Event) -> SchedulingResult<Event> {
        if let Some(training_class) = booking.training_class {
            if let Some(existing) = self.repo.booking_for_class(training_class).await? {
                return Err(SchedulingError::conflict(
                    format!("training class {} is already booked", training_class),
                    existing.id,
                    Some(existing.start_date),
                ));
            }
        }
        self.check_booking(&booking, None).await?;
        Ok(self.repo.save_event(&booking).await?)
    }

    /// Move a class booking to start on `new_start`, keeping its length.
    ///
    /// The class's own start date follows the booking.
    pub async fn reschedule_booking(
        &self,
        training_class: TrainingClassId,
        new_start: NaiveDate,
    ) -> SchedulingResult<Event> {
        let _class_guard = self.lock_class(training_class).await;
        let instructor = self.require_booking(training_class).await?.instructor;
        let Some(instructor) = instructor else {
            return Err(SchedulingError::validation(format!(
                "Booking for training class {} has no instructor",
                training_class
            )));
        };

        let _guard = self.lock_for(instructor).await;
        let booking = self.require_booking(training_class).await?;
        let Some(id) = booking.id else {
            return Err(SchedulingError::validation("Stored booking has no id"));
        };
        let length = booking.span().len_days().saturating_sub(1) as i64;
        let mut moved = booking.clone();
        moved.start_date = new_start;
        moved.end_date = Some(new_start + Duration::days(length));
        self.check_booking(&moved, Some(id)).await?;

        let mut class = self.repo.get_training_class(training_class).await?;
        class.start_date = new_start;
        let changes = ChangeSet::new()
            .update(id, EventPatch::shift(moved.start_date, moved.end_date))
            .store_class(class);
        self.repo.apply_changes(&changes).await?;
        let updated = self.repo.get_event(id).await?;

        info!(
            "Rescheduled booking {} for class {} from {} to {}",
            id, training_class, booking.start_date, new_start
        );
        Ok(updated)
    }

    /// Delete an event and return it.
    pub async fn delete_event(&self, id: EventId) -> SchedulingResult<Event> {
        let instructor = self.repo.get_event(id).await?.instructor;
        let _guard = match instructor {
            Some(instructor) => Some(self.lock_for(instructor).await),
            None => None,
        };
        let event = self.repo.get_event(id).await?;
        self.repo.delete_event(id).await?;
        info!("Deleted {} event {}", event.event_type, id);
        Ok(event)
    }

    // ==================== Reads ====================

    pub async fn get_event(&self, id: EventId) -> SchedulingResult<Event> {
        Ok(self.repo.get_event(id).await?)
    }

    pub async fn events_for_instructor(&self, instructor: InstructorId) -> SchedulingResult<Vec<Event>> {
        Ok(self
            .repo
            .find_events(&EventFilter::new().instructor(instructor))
            .await?)
    }

    pub async fn booking_for_class(
        &self,
        training_class: TrainingClassId,
    ) -> SchedulingResult<Option<Event>> {
        Ok(self.repo.booking_for_class(training_class).await?)
    }

    async fn require_booking(&self, training_class: TrainingClassId) -> SchedulingResult<Event> {
        self.booking_for_class(training_class).await?.ok_or_else(|| {
            SchedulingError::NotFound(format!(
                "Training class {} has no booking",
                training_class
            ))
        })
    }

    /// Whether the instructor has no booking and no effective rule over
    /// `[start, end]`. Days restored by a cancellation count as free.
    pub async fn is_instructor_idle(
        &self,
        instructor: InstructorId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SchedulingResult<bool> {
        if end < start {
            return Err(SchedulingError::validation(format!(
                "end_date {} is before start_date {}",
                end, start
            )));
        }
        let range = DateRange::new(start, end);
        let events = self
            .repo
            .find_events(&EventFilter::new().instructor(instructor).overlapping(range))
            .await?;

        if events.iter().any(|e| e.is_booking()) {
            return Ok(false);
        }

        let (rules, cancellations): (Vec<Event>, Vec<Event>) = events
            .into_iter()
            .filter(|e| !e.is_booking())
            .partition(|e| e.is_rule());

        Ok(!range
            .days()
            .any(|day| rule_blocks_day(&rules, &cancellations, day)))
    }

    /// Calendar of one instructor's events over `[start, end]`.
    pub async fn instructor_calendar(
        &self,
        instructor: InstructorId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SchedulingResult<Vec<CalendarDay>> {
        let events = self
            .repo
            .find_events(
                &EventFilter::new()
                    .instructor(instructor)
                    .overlapping(DateRange::new(start, end)),
            )
            .await?;
        Ok(build_calendar(&events, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::models::{FreqType, Instructor, TrainingClass};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn engine_with(settings: SchedulingSettings) -> (SchedulingEngine, Arc<LocalRepository>) {
        let repo = Arc::new(LocalRepository::new());
        for (id, name) in [(1, "Ada"), (2, "Grace")] {
            repo.store_instructor(&Instructor::new(InstructorId(id), name))
                .await
                .unwrap();
        }
        (SchedulingEngine::new(repo.clone(), settings), repo)
    }

    async fn add_class(repo: &LocalRepository, id: i64, instructor: i64, start: NaiveDate) {
        repo.store_training_class(
            &TrainingClass::new(TrainingClassId(id), "Class", start).with_instructor(InstructorId(instructor)),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_booking_derives_window_and_instructor() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 3, 1)).await;

        let booking = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();
        assert_eq!(booking.instructor, Some(InstructorId(1)));
        assert_eq!(booking.end_date, Some(d(2024, 3, 2)));
        assert_eq!(
            engine.booking_for_class(TrainingClassId(10)).await.unwrap(),
            Some(booking)
        );
    }

    #[tokio::test]
    async fn test_class_without_instructor_is_invalid() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        repo.store_training_class(&TrainingClass::new(TrainingClassId(3), "Open", d(2024, 3, 1)))
            .await
            .unwrap();

        let err = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(3)))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unknown_references_are_not_found() {
        let (engine, _) = engine_with(SchedulingSettings::default()).await;
        let err = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(99)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = engine
            .create_event(NewEventRequest::one_time(InstructorId(42), d(2024, 1, 1), None))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_double_booking_rejected() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 3, 1)).await;
        add_class(&repo, 11, 1, d(2024, 3, 2)).await;
        add_class(&repo, 12, 2, d(2024, 3, 2)).await;

        let first = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();
        let err = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(11)))
            .await
            .unwrap_err();
        match err {
            SchedulingError::ScheduleConflict {
                conflicting_event,
                day,
                ..
            } => {
                assert_eq!(conflicting_event, first.id);
                assert_eq!(day, Some(d(2024, 3, 2)));
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        // Another instructor is unaffected.
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(12)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_class_booked_once() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 3, 1)).await;
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();
        let err = engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_rule_scope() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 2, d(2024, 3, 1)).await;
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();

        // Instructor scope: another instructor's booking does not block the rule.
        engine
            .create_event(NewEventRequest::one_time(InstructorId(1), d(2024, 3, 1), Some(d(2024, 3, 1))))
            .await
            .unwrap();

        let global = SchedulingSettings {
            rule_conflict_scope: RuleConflictScope::Global,
            ..Default::default()
        };
        let engine = SchedulingEngine::new(repo.clone(), global);
        let err = engine
            .create_event(NewEventRequest::one_time(InstructorId(1), d(2024, 3, 2), Some(d(2024, 3, 2))))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_rule_supersedes_cancellations() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        let cancel = engine
            .create_event(NewEventRequest::cancel(InstructorId(1), d(2024, 1, 8)))
            .await
            .unwrap();
        let unrelated = engine
            .create_event(NewEventRequest::cancel(InstructorId(1), d(2024, 1, 9)))
            .await
            .unwrap();

        engine
            .create_event(NewEventRequest::weekly(InstructorId(1), d(2024, 1, 1), None, vec![1]))
            .await
            .unwrap();

        assert!(engine.get_event(cancel.id.unwrap()).await.unwrap_err().is_not_found());
        assert!(engine.get_event(unrelated.id.unwrap()).await.is_ok());
        assert_eq!(repo.event_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rejected_rule_keeps_cancellations() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 1, 8)).await;
        engine
            .create_event(NewEventRequest::cancel(InstructorId(1), d(2024, 1, 15)))
            .await
            .unwrap();
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();

        let err = engine
            .create_event(NewEventRequest::weekly(InstructorId(1), d(2024, 1, 1), None, vec![1]))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.event_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_idle_checks() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        engine
            .create_event(NewEventRequest::monthly(InstructorId(1), d(2024, 1, 1), None, vec![15]))
            .await
            .unwrap();
        engine
            .create_event(NewEventRequest::cancel(InstructorId(1), d(2024, 2, 15)))
            .await
            .unwrap();
        add_class(&repo, 10, 1, d(2024, 1, 20)).await;
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();

        let idle = |s, e| engine.is_instructor_idle(InstructorId(1), s, e);
        assert!(!idle(d(2024, 1, 14), d(2024, 1, 16)).await.unwrap());
        assert!(idle(d(2024, 1, 16), d(2024, 1, 19)).await.unwrap());
        assert!(!idle(d(2024, 1, 21), d(2024, 1, 21)).await.unwrap());
        assert!(idle(d(2024, 2, 14), d(2024, 2, 16)).await.unwrap());
        assert!(idle(d(2024, 1, 14), d(2024, 1, 16)).await.is_ok());
        assert!(idle(d(2024, 1, 16), d(2024, 1, 15)).await.unwrap_err().is_validation());
        assert!(engine
            .is_instructor_idle(InstructorId(2), d(2024, 1, 15), d(2024, 1, 15))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reschedule_booking() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 3, 4)).await;
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();
        engine
            .create_event(NewEventRequest::one_time(InstructorId(1), d(2024, 3, 12), Some(d(2024, 3, 12))))
            .await
            .unwrap();

        // Overlapping its own old slot is fine.
        let moved = engine
            .reschedule_booking(TrainingClassId(10), d(2024, 3, 5))
            .await
            .unwrap();
        assert_eq!(moved.end_date, Some(d(2024, 3, 6)));
        let class = repo.get_training_class(TrainingClassId(10)).await.unwrap();
        assert_eq!(class.start_date, d(2024, 3, 5));

        let err = engine
            .reschedule_booking(TrainingClassId(10), d(2024, 3, 11))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = engine
            .reschedule_booking(TrainingClassId(77), d(2024, 3, 11))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_event() {
        let (engine, _) = engine_with(SchedulingSettings::default()).await;
        let rule = engine
            .create_event(NewEventRequest::weekly(InstructorId(1), d(2024, 1, 1), None, vec![1]))
            .await
            .unwrap();
        let id = rule.id.unwrap();

        assert_eq!(engine.delete_event(id).await.unwrap(), rule);
        assert!(engine.delete_event(id).await.unwrap_err().is_not_found());
        assert!(engine
            .events_for_instructor(InstructorId(1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_instructor_calendar_filters_by_instructor() {
        let (engine, _) = engine_with(SchedulingSettings::default()).await;
        engine
            .create_event(NewEventRequest::weekly(InstructorId(1), d(2024, 1, 1), None, vec![1]))
            .await
            .unwrap();
        engine
            .create_event(NewEventRequest::weekly(InstructorId(2), d(2024, 1, 1), None, vec![2]))
            .await
            .unwrap();

        let calendar = engine
            .instructor_calendar(InstructorId(1), d(2024, 1, 1), d(2024, 1, 14))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = calendar.iter().map(|day| day.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 8)]);
        assert!(calendar.iter().all(|day| day.rules[0].freq_type == Some(FreqType::Weekly)));
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        add_class(&repo, 10, 1, d(2024, 3, 1)).await;
        engine
            .create_event(NewEventRequest::class_booking(TrainingClassId(10)))
            .await
            .unwrap();
        engine
            .create_event(NewEventRequest::cancel(InstructorId(2), d(2024, 3, 1)))
            .await
            .unwrap();

        let locks = engine.locks.lock().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key(&LockKey::Instructor(InstructorId(2))));
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let (engine, repo) = engine_with(SchedulingSettings::default()).await;
        repo.set_healthy(false).unwrap();
        let err = engine
            .create_event(NewEventRequest::cancel(InstructorId(1), d(2024, 1, 8)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Repository(_)));
        assert!(err.is_retryable());
    }
}
