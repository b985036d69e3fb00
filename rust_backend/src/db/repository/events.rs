//! Event store trait.
//!
//! Persistence contract for scheduling facts: filtered reads, single-event
//! writes, and an atomic change set used when the engine must write several
//! records together.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Event, EventId, EventType, InstructorId, TrainingClass, TrainingClassId};
use crate::time::DateRange;

/// Criteria for [`EventRepository::find_events`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub instructor: Option<InstructorId>,
    pub training_class: Option<TrainingClassId>,
    /// Empty means every type.
    pub event_types: Vec<EventType>,
    /// Only events whose bounds intersect this range.
    pub overlapping: Option<DateRange>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructor(mut self, instructor: InstructorId) -> Self {
        self.instructor = Some(instructor);
        self
    }

    pub fn training_class(mut self, training_class: TrainingClassId) -> Self {
        self.training_class = Some(training_class);
        self
    }

    pub fn event_types(mut self, types: &[EventType]) -> Self {
        self.event_types = types.to_vec();
        self
    }

    pub fn overlapping(mut self, range: DateRange) -> Self {
        self.overlapping = Some(range);
        self
    }

    pub fn accepts(&self, event: &Event) -> bool {
        self.instructor.map_or(true, |i| event.instructor == Some(i))
            && self
                .training_class
                .map_or(true, |c| event.training_class == Some(c))
            && (self.event_types.is_empty() || self.event_types.contains(&event.event_type))
            && self.overlapping.map_or(true, |r| event.overlaps(&r))
    }
}

/// Date shift applied by [`EventRepository::update_event`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` clears the end date.
    pub end_date: Option<Option<NaiveDate>>,
}

impl EventPatch {
    pub fn shift(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
    }
}

/// Event writes, plus the training classes they move, committed as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub inserts: Vec<Event>,
    pub deletes: Vec<EventId>,
    pub updates: Vec<(EventId, EventPatch)>,
    pub classes: Vec<TrainingClass>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, event: Event) -> Self {
        self.inserts.push(event);
        self
    }

    pub fn delete(mut self, id: EventId) -> Self {
        self.deletes.push(id);
        self
    }

    pub fn update(mut self, id: EventId, patch: EventPatch) -> Self {
        self.updates.push((id, patch));
        self
    }

    /// Store `training_class` (insert or replace) with the event writes.
    pub fn store_class(mut self, training_class: TrainingClass) -> Self {
        self.classes.push(training_class);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
            && self.deletes.is_empty()
            && self.updates.is_empty()
            && self.classes.is_empty()
    }
}

/// Repository trait for scheduling events.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Events matching `filter`, ordered by start date then id.
    async fn find_events(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>>;

    /// A single event.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the event doesn't exist
    async fn get_event(&self, id: EventId) -> RepositoryResult<Event>;

    /// Persist a new event; the returned copy carries the assigned id.
    async fn save_event(&self, event: &Event) -> RepositoryResult<Event>;

    /// Apply `patch` to an existing event and return the updated copy.
    async fn update_event(&self, id: EventId, patch: &EventPatch) -> RepositoryResult<Event>;

    /// Remove an event.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the event doesn't exist
    async fn delete_event(&self, id: EventId) -> RepositoryResult<()>;

    /// Commit `changes` atomically: either every write in the set lands or none.
    ///
    /// Deletes and updates of unknown events fail the whole set with
    /// `TransactionError`.
    ///
    /// # Returns
    /// The inserted events with their assigned ids, in insertion order.
    async fn apply_changes(&self, changes: &ChangeSet) -> RepositoryResult<Vec<Event>>;

    /// The class-schedule event booked for `training_class`, if any.
    async fn booking_for_class(
        &self,
        training_class: TrainingClassId,
    ) -> RepositoryResult<Option<Event>> {
        let filter = EventFilter::new()
            .training_class(training_class)
            .event_types(&[EventType::ClassSchedule]);
        Ok(self.find_events(&filter).await?.into_iter().next())
    }
}
