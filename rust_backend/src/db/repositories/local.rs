//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing, local development and the CLI. All data lives
//! in ordered maps behind a single `RwLock`, so every trait call observes a
//! consistent snapshot and [`EventRepository::apply_changes`] is atomic.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::repository::*;
use crate::models::{
    ClassStatus, Enrolment, EnrolmentId, EnrolmentStatus, Event, EventId, Instructor,
    InstructorId, TrainingClass, TrainingClassId,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use instructor_scheduling::db::repositories::LocalRepository;
/// use instructor_scheduling::db::EventRepository;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// runtime.block_on(async {
///     let repo = LocalRepository::new();
///     assert!(repo.health_check().await.unwrap());
/// });
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    events: BTreeMap<EventId, Event>,
    instructors: HashMap<InstructorId, Instructor>,
    training_classes: BTreeMap<TrainingClassId, TrainingClass>,
    enrolments: BTreeMap<EnrolmentId, Enrolment>,

    // ID counters
    next_event_id: i64,
    next_enrolment_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            events: BTreeMap::new(),
            instructors: HashMap::new(),
            training_classes: BTreeMap::new(),
            enrolments: BTreeMap::new(),
            next_event_id: 1,
            next_enrolment_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn allocate_event_id(&mut self) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        id
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) -> RepositoryResult<()> {
        self.write()?.is_healthy = healthy;
        Ok(())
    }

    /// Clear all data from the repository.
    pub fn clear(&self) -> RepositoryResult<()> {
        let mut data = self.write()?;
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
        Ok(())
    }

    /// Number of stored events.
    pub fn event_count(&self) -> RepositoryResult<usize> {
        Ok(self.read()?.events.len())
    }

    /// Insert an event keeping its id (seed data).
    ///
    /// Events without an id are assigned the next free one.
    pub fn insert_event_with_id(&self, mut event: Event) -> RepositoryResult<EventId> {
        let mut data = self.write()?;
        let id = match event.id {
            Some(id) => {
                if data.events.contains_key(&id) {
                    return Err(RepositoryError::validation_with_context(
                        format!("Duplicate event id {}", id),
                        ErrorContext::new("insert_event_with_id").with_entity("event").with_entity_id(id),
                    ));
                }
                data.next_event_id = data.next_event_id.max(id.0 + 1);
                id
            }
            None => data.allocate_event_id(),
        };
        event.id = Some(id);
        data.events.insert(id, event);
        Ok(id)
    }

    /// Insert or replace an instructor without going through the async trait.
    pub fn insert_instructor(&self, instructor: Instructor) -> RepositoryResult<()> {
        self.write()?.instructors.insert(instructor.id, instructor);
        Ok(())
    }

    /// Insert or replace a training class without going through the async trait.
    pub fn insert_training_class(&self, training_class: TrainingClass) -> RepositoryResult<()> {
        self.write()?
            .training_classes
            .insert(training_class.id, training_class);
        Ok(())
    }

    /// Insert an enrolment keeping its id (seed data).
    pub fn insert_enrolment_with_id(&self, mut enrolment: Enrolment) -> RepositoryResult<EnrolmentId> {
        let mut data = self.write()?;
        let id = match enrolment.id {
            Some(id) => {
                data.next_enrolment_id = data.next_enrolment_id.max(id.0 + 1);
                id
            }
            None => {
                let id = EnrolmentId(data.next_enrolment_id);
                data.next_enrolment_id += 1;
                id
            }
        };
        enrolment.id = Some(id);
        data.enrolments.insert(id, enrolment);
        Ok(id)
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, LocalData>> {
        self.data
            .read()
            .map_err(|_| RepositoryError::internal("Local repository lock poisoned"))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, LocalData>> {
        self.data
            .write()
            .map_err(|_| RepositoryError::internal("Local repository lock poisoned"))
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.read()?.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

fn event_not_found(id: EventId, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Event {} not found", id),
        ErrorContext::new(operation).with_entity("event").with_entity_id(id),
    )
}

#[async_trait]
impl EventRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.read()?.is_healthy)
    }

    async fn find_events(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>> {
        self.check_health()?;
        let data = self.read()?;
        let mut events: Vec<Event> = data
            .events
            .values()
            .filter(|e| filter.accepts(e))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.start_date, e.id));
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> RepositoryResult<Event> {
        self.check_health()?;
        self.read()?
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| event_not_found(id, "get_event"))
    }

    async fn save_event(&self, event: &Event) -> RepositoryResult<Event> {
        self.check_health()?;
        let mut data = self.write()?;
        let id = data.allocate_event_id();
        let mut stored = event.clone();
        stored.id = Some(id);
        data.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_event(&self, id: EventId, patch: &EventPatch) -> RepositoryResult<Event> {
        self.check_health()?;
        let mut data = self.write()?;
        let event = data
            .events
            .get_mut(&id)
            .ok_or_else(|| event_not_found(id, "update_event"))?;
        patch.apply(event);
        Ok(event.clone())
    }

    async fn delete_event(&self, id: EventId) -> RepositoryResult<()> {
        self.check_health()?;
        self.write()?
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| event_not_found(id, "delete_event"))
    }

    async fn apply_changes(&self, changes: &ChangeSet) -> RepositoryResult<Vec<Event>> {
        self.check_health()?;
        let mut data = self.write()?;

        // Validate the whole set before touching anything.
        let mut touched = changes
            .deletes
            .iter()
            .chain(changes.updates.iter().map(|(id, _)| id));
        if let Some(missing) = touched.find(|id| !data.events.contains_key(*id)) {
            return Err(RepositoryError::TransactionError {
                message: format!("Event {} not found, change set rolled back", missing),
                context: ErrorContext::new("apply_changes")
                    .with_entity("event")
                    .with_entity_id(missing),
            });
        }

        for id in &changes.deletes {
            data.events.remove(id);
        }
        for (id, patch) in &changes.updates {
            if let Some(event) = data.events.get_mut(id) {
                patch.apply(event);
            }
        }
        for training_class in &changes.classes {
            data.training_classes
                .insert(training_class.id, training_class.clone());
        }

        let mut inserted = Vec::with_capacity(changes.inserts.len());
        for event in &changes.inserts {
            let id = data.allocate_event_id();
            let mut stored = event.clone();
            stored.id = Some(id);
            data.events.insert(id, stored.clone());
            inserted.push(stored);
        }

        Ok(inserted)
    }
}

#[async_trait]
impl DirectoryRepository for LocalRepository {
    async fn get_instructor(&self, id: InstructorId) -> RepositoryResult<Instructor> {
        self.check_health()?;
        self.read()?.instructors.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Instructor {} not found", id),
                ErrorContext::new("get_instructor")
                    .with_entity("instructor")
                    .with_entity_id(id),
            )
        })
    }

    async fn store_instructor(&self, instructor: &Instructor) -> RepositoryResult<()> {
        self.check_health()?;
        self.write()?
            .instructors
            .insert(instructor.id, instructor.clone());
        Ok(())
    }

    async fn get_training_class(&self, id: TrainingClassId) -> RepositoryResult<TrainingClass> {
        self.check_health()?;
        self.read()?.training_classes.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Training class {} not found", id),
                ErrorContext::new("get_training_class")
                    .with_entity("training_class")
                    .with_entity_id(id),
            )
        })
    }

    async fn store_training_class(&self, training_class: &TrainingClass) -> RepositoryResult<()> {
        self.check_health()?;
        self.write()?
            .training_classes
            .insert(training_class.id, training_class.clone());
        Ok(())
    }

    async fn list_training_classes(
        &self,
        status: Option<ClassStatus>,
    ) -> RepositoryResult<Vec<TrainingClass>> {
        self.check_health()?;
        Ok(self
            .read()?
            .training_classes
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EnrolmentRepository for LocalRepository {
    async fn store_enrolment(&self, enrolment: &Enrolment) -> RepositoryResult<Enrolment> {
        self.check_health()?;
        let mut data = self.write()?;
        let id = EnrolmentId(data.next_enrolment_id);
        data.next_enrolment_id += 1;
        let mut stored = enrolment.clone();
        stored.id = Some(id);
        data.enrolments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_enrolment(&self, id: EnrolmentId) -> RepositoryResult<Enrolment> {
        self.check_health()?;
        self.read()?.enrolments.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Enrolment {} not found", id),
                ErrorContext::new("get_enrolment")
                    .with_entity("enrolment")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_enrolments(&self, filter: &EnrolmentFilter) -> RepositoryResult<Vec<Enrolment>> {
        self.check_health()?;
        Ok(self
            .read()?
            .enrolments
            .values()
            .filter(|e| filter.accepts(e))
            .cloned()
            .collect())
    }

    async fn update_enrolment_status(
        &self,
        id: EnrolmentId,
        status: EnrolmentStatus,
    ) -> RepositoryResult<Enrolment> {
        self.check_health()?;
        let mut data = self.write()?;
        let enrolment = data.enrolments.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Enrolment {} not found", id),
                ErrorContext::new("update_enrolment_status")
                    .with_entity("enrolment")
                    .with_entity_id(id),
            )
        })?;
        enrolment.status = status;
        Ok(enrolment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false).unwrap();
        assert!(!repo.health_check().await.unwrap());
        assert!(matches!(
            repo.find_events(&EventFilter::new()).await,
            Err(RepositoryError::ConnectionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = LocalRepository::new();
        let a = repo
            .save_event(&Event::one_time(InstructorId(1), d(2024, 3, 1), None))
            .await
            .unwrap();
        let b = repo
            .save_event(&Event::cancellation(InstructorId(1), d(2024, 3, 2)))
            .await
            .unwrap();

        assert_eq!(a.id, Some(EventId(1)));
        assert_eq!(b.id, Some(EventId(2)));
        assert_eq!(repo.get_event(EventId(2)).await.unwrap(), b);
    }

    #[tokio::test]
    async fn test_find_events_filters_and_orders() {
        let repo = LocalRepository::new();
        repo.save_event(&Event::one_time(InstructorId(1), d(2024, 3, 5), Some(d(2024, 3, 5))))
            .await
            .unwrap();
        repo.save_event(&Event::one_time(InstructorId(2), d(2024, 3, 1), Some(d(2024, 3, 1))))
            .await
            .unwrap();
        repo.save_event(&Event::cancellation(InstructorId(1), d(2024, 3, 2)))
            .await
            .unwrap();

        let mine = repo
            .find_events(&EventFilter::new().instructor(InstructorId(1)))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].event_type, EventType::CancelUnavailability);

        let rules = repo
            .find_events(&EventFilter::new().event_types(&EventType::RULES))
            .await
            .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].instructor, Some(InstructorId(2)));

        let window = crate::time::DateRange::new(d(2024, 3, 4), d(2024, 3, 10));
        let overlapping = repo
            .find_events(&EventFilter::new().overlapping(window))
            .await
            .unwrap();
        assert_eq!(overlapping.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_changes_is_all_or_nothing() {
        let repo = LocalRepository::new();
        let cancel = repo
            .save_event(&Event::cancellation(InstructorId(1), d(2024, 3, 2)))
            .await
            .unwrap();

        let bad = ChangeSet::new()
            .insert(Event::one_time(InstructorId(1), d(2024, 3, 2), None))
            .delete(EventId(999));
        let result = repo.apply_changes(&bad).await;
        assert!(matches!(result, Err(RepositoryError::TransactionError { .. })));
        assert_eq!(repo.event_count().unwrap(), 1);

        let good = ChangeSet::new()
            .insert(Event::one_time(InstructorId(1), d(2024, 3, 2), None))
            .delete(cancel.id.unwrap());
        let inserted = repo.apply_changes(&good).await.unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(repo.event_count().unwrap(), 1);
        assert!(repo.get_event(cancel.id.unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_changes_moves_event_and_class_together() {
        let repo = LocalRepository::new();
        let class = TrainingClass::new(TrainingClassId(4), "Moving", d(2024, 3, 4));
        repo.store_training_class(&class).await.unwrap();
        let booking = repo
            .save_event(&Event::class_schedule(TrainingClassId(4), InstructorId(1), d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();
        let id = booking.id.unwrap();

        let mut moved_class = class.clone();
        moved_class.start_date = d(2024, 3, 11);
        let bad = ChangeSet::new()
            .update(id, EventPatch::shift(d(2024, 3, 11), Some(d(2024, 3, 12))))
            .update(EventId(999), EventPatch::shift(d(2024, 3, 11), None))
            .store_class(moved_class.clone());
        assert!(matches!(
            repo.apply_changes(&bad).await,
            Err(RepositoryError::TransactionError { .. })
        ));
        assert_eq!(repo.get_event(id).await.unwrap().start_date, d(2024, 3, 4));
        assert_eq!(
            repo.get_training_class(TrainingClassId(4)).await.unwrap().start_date,
            d(2024, 3, 4)
        );

        let good = ChangeSet::new()
            .update(id, EventPatch::shift(d(2024, 3, 11), Some(d(2024, 3, 12))))
            .store_class(moved_class);
        assert!(repo.apply_changes(&good).await.unwrap().is_empty());
        assert_eq!(repo.get_event(id).await.unwrap().end_date, Some(d(2024, 3, 12)));
        assert_eq!(
            repo.get_training_class(TrainingClassId(4)).await.unwrap().start_date,
            d(2024, 3, 11)
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_event() {
        let repo = LocalRepository::new();
        let saved = repo
            .save_event(&Event::one_time(InstructorId(1), d(2024, 3, 1), Some(d(2024, 3, 1))))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let moved = repo
            .update_event(id, &EventPatch::shift(d(2024, 3, 8), Some(d(2024, 3, 9))))
            .await
            .unwrap();
        assert_eq!(moved.start_date, d(2024, 3, 8));
        assert_eq!(moved.end_date, Some(d(2024, 3, 9)));

        repo.delete_event(id).await.unwrap();
        let err = repo.delete_event(id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_seed_ids_are_preserved() {
        let repo = LocalRepository::new();
        let mut event = Event::cancellation(InstructorId(1), d(2024, 3, 2));
        event.id = Some(EventId(10));
        assert_eq!(repo.insert_event_with_id(event.clone()).unwrap(), EventId(10));
        assert!(repo.insert_event_with_id(event).is_err());

        let next = repo
            .save_event(&Event::cancellation(InstructorId(1), d(2024, 3, 3)))
            .await
            .unwrap();
        assert_eq!(next.id, Some(EventId(11)));
    }

    #[tokio::test]
    async fn test_directory_not_found() {
        let repo = LocalRepository::new();
        let err = repo.get_instructor(InstructorId(5)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.context().entity.as_deref(), Some("instructor"));
    }
}
