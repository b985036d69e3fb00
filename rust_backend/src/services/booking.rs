//! Booking workflows built on the engine.
//!
//! These are the flows that call [`SchedulingEngine::create_event`] on behalf
//! of the host: designating an instructor for a class, handling applications
//! to advertised classes, and cancelling a booked class.

use chrono::NaiveDateTime;
use log::{info, warn};

use super::scheduling::SchedulingEngine;
use crate::api::NewEventRequest;
use crate::db::repository::{DirectoryRepository, EnrolmentFilter, EnrolmentRepository};
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{
    ClassStatus, Enrolment, EnrolmentId, EnrolmentStatus, Event, InstructorId, TrainingClassId,
};

/// Assign `instructor` to a class and book them over its window.
///
/// The class must exist and have no booking; the instructor must exist, be
/// active and be idle over the window. If creating the booking fails, the
/// class is restored to its previous state. The whole sequence holds the
/// class lock, so concurrent designations of one class cannot both book it.
pub async fn designate_instructor(
    engine: &SchedulingEngine,
    training_class: TrainingClassId,
    instructor: InstructorId,
) -> SchedulingResult<Event> {
    let _class_guard = engine.lock_class(training_class).await;
    let repo = engine.repository();
    let class = repo.get_training_class(training_class).await?;
    if matches!(class.status, ClassStatus::Completed | ClassStatus::Cancelled) {
        return Err(SchedulingError::validation(format!(
            "Training class {} is {:?} and cannot be staffed",
            training_class, class.status
        )));
    }
    if engine.booking_for_class(training_class).await?.is_some() {
        return Err(SchedulingError::validation(format!(
            "Training class {} already has a booking",
            training_class
        )));
    }

    let person = repo.get_instructor(instructor).await?;
    if !person.is_active {
        return Err(SchedulingError::validation(format!(
            "Instructor {} is not active",
            instructor
        )));
    }

    let window = class.window(engine.settings().class_duration_days);
    if !engine
        .is_instructor_idle(instructor, window.start, window.end)
        .await?
    {
        return Err(SchedulingError::conflict(
            format!(
                "instructor {} is not available from {} to {}",
                instructor, window.start, window.end
            ),
            None,
            Some(window.start),
        ));
    }

    let mut staffed = class.clone();
    staffed.instructor = Some(instructor);
    staffed.status = ClassStatus::Scheduled;
    repo.store_training_class(&staffed).await?;

    match engine
        .create_event_holding_class(NewEventRequest::class_booking(training_class))
        .await
    {
        Ok(booking) => {
            info!(
                "Designated instructor {} for class {}",
                instructor, training_class
            );
            Ok(booking)
        }
        Err(err) => {
            warn!(
                "Booking class {} for instructor {} failed, restoring class: {}",
                training_class, instructor, err
            );
            repo.store_training_class(&class).await?;
            Err(err)
        }
    }
}

/// Record an instructor's application to an advertised class.
pub async fn apply_for_class(
    engine: &SchedulingEngine,
    training_class: TrainingClassId,
    instructor: InstructorId,
    now: NaiveDateTime,
) -> SchedulingResult<Enrolment> {
    let repo = engine.repository();
    let class = repo.get_training_class(training_class).await?;
    if class.status != ClassStatus::Advertised {
        return Err(SchedulingError::validation(format!(
            "Training class {} is not open for applications",
            training_class
        )));
    }
    let person = repo.get_instructor(instructor).await?;
    if !person.is_active {
        return Err(SchedulingError::validation(format!(
            "Instructor {} is not active",
            instructor
        )));
    }

    let duplicate = EnrolmentFilter {
        training_class: Some(training_class),
        instructor: Some(instructor),
        status: Some(EnrolmentStatus::Pending),
    };
    if !repo.list_enrolments(&duplicate).await?.is_empty() {
        return Err(SchedulingError::validation(format!(
            "Instructor {} already applied for class {}",
            instructor, training_class
        )));
    }

    let enrolment = repo
        .store_enrolment(&Enrolment::pending(training_class, instructor, now))
        .await?;
    info!(
        "Instructor {} applied for class {}",
        instructor, training_class
    );
    Ok(enrolment)
}

/// Accept a pending application: designate its instructor and reject the
/// other pending applications for the class.
pub async fn accept_enrolment(
    engine: &SchedulingEngine,
    enrolment_id: EnrolmentId,
) -> SchedulingResult<Enrolment> {
    let repo = engine.repository();
    let enrolment = repo.get_enrolment(enrolment_id).await?;
    if enrolment.status != EnrolmentStatus::Pending {
        return Err(SchedulingError::validation(format!(
            "Enrolment {} is {:?}, only pending enrolments can be accepted",
            enrolment_id, enrolment.status
        )));
    }

    designate_instructor(engine, enrolment.training_class, enrolment.instructor).await?;
    let accepted = repo
        .update_enrolment_status(enrolment_id, EnrolmentStatus::Accepted)
        .await?;

    let others = EnrolmentFilter {
        training_class: Some(enrolment.training_class),
        status: Some(EnrolmentStatus::Pending),
        ..Default::default()
    };
    for other in repo.list_enrolments(&others).await? {
        if let Some(id) = other.id {
            repo.update_enrolment_status(id, EnrolmentStatus::Rejected)
                .await?;
        }
    }

    Ok(accepted)
}

/// Remove a class's booking and mark the class cancelled.
pub async fn cancel_booking(
    engine: &SchedulingEngine,
    training_class: TrainingClassId,
) -> SchedulingResult<Event> {
    let _class_guard = engine.lock_class(training_class).await;
    let repo = engine.repository();
    let mut class = repo.get_training_class(training_class).await?;
    let booking = engine
        .booking_for_class(training_class)
        .await?
        .ok_or_else(|| {
            SchedulingError::NotFound(format!(
                "Training class {} has no booking",
                training_class
            ))
        })?;
    let id = booking.id.ok_or_else(|| {
        SchedulingError::validation("Stored booking has no id")
    })?;

    let deleted = engine.delete_event(id).await?;
    class.status = ClassStatus::Cancelled;
    repo.store_training_class(&class).await?;
    info!("Cancelled booking {} for class {}", id, training_class);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulingSettings;
    use crate::db::repositories::LocalRepository;
    use crate::models::{Instructor, TrainingClass};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, m: u32, day: u32, hour: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(hour, 0, 0).unwrap()
    }

    async fn setup() -> (SchedulingEngine, Arc<LocalRepository>) {
        let repo = Arc::new(LocalRepository::new());
        repo.store_instructor(&Instructor::new(InstructorId(1), "Ada"))
            .await
            .unwrap();
        repo.store_instructor(&Instructor::new(InstructorId(2), "Grace"))
            .await
            .unwrap();
        let mut retired = Instructor::new(InstructorId(3), "Linus");
        retired.is_active = false;
        repo.store_instructor(&retired).await.unwrap();
        repo.store_training_class(&TrainingClass::new(TrainingClassId(10), "Knots", d(2024, 3, 4)))
            .await
            .unwrap();
        (
            SchedulingEngine::new(repo.clone(), SchedulingSettings::default()),
            repo,
        )
    }

    #[tokio::test]
    async fn test_designate_instructor() {
        let (engine, repo) = setup().await;
        let booking = designate_instructor(&engine, TrainingClassId(10), InstructorId(1))
            .await
            .unwrap();
        assert_eq!(booking.start_date, d(2024, 3, 4));

        let class = repo.get_training_class(TrainingClassId(10)).await.unwrap();
        assert_eq!(class.instructor, Some(InstructorId(1)));
        assert_eq!(class.status, ClassStatus::Scheduled);

        let err = designate_instructor(&engine, TrainingClassId(10), InstructorId(2))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_designate_rejects_busy_or_inactive_instructor() {
        let (engine, repo) = setup().await;
        engine
            .create_event(NewEventRequest::one_time(InstructorId(1), d(2024, 3, 5), Some(d(2024, 3, 5))))
            .await
            .unwrap();

        let err = designate_instructor(&engine, TrainingClassId(10), InstructorId(1))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        let class = repo.get_training_class(TrainingClassId(10)).await.unwrap();
        assert_eq!(class.instructor, None);
        assert_eq!(class.status, ClassStatus::Advertised);

        let err = designate_instructor(&engine, TrainingClassId(10), InstructorId(3))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_enrolment_flow() {
        let (engine, repo) = setup().await;
        let first = apply_for_class(&engine, TrainingClassId(10), InstructorId(1), at(2024, 2, 1, 9))
            .await
            .unwrap();
        let second = apply_for_class(&engine, TrainingClassId(10), InstructorId(2), at(2024, 2, 1, 10))
            .await
            .unwrap();

        let dup = apply_for_class(&engine, TrainingClassId(10), InstructorId(1), at(2024, 2, 1, 11)).await;
        assert!(dup.unwrap_err().is_validation());

        let accepted = accept_enrolment(&engine, second.id.unwrap()).await.unwrap();
        assert_eq!(accepted.status, EnrolmentStatus::Accepted);

        let rejected = repo.get_enrolment(first.id.unwrap()).await.unwrap();
        assert_eq!(rejected.status, EnrolmentStatus::Rejected);

        let booking = engine.booking_for_class(TrainingClassId(10)).await.unwrap().unwrap();
        assert_eq!(booking.instructor, Some(InstructorId(2)));

        // Class is no longer advertised.
        let late = apply_for_class(&engine, TrainingClassId(10), InstructorId(1), at(2024, 2, 2, 9)).await;
        assert!(late.unwrap_err().is_validation());
        assert!(accept_enrolment(&engine, first.id.unwrap()).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_cancel_booking() {
        let (engine, repo) = setup().await;
        let booking = designate_instructor(&engine, TrainingClassId(10), InstructorId(1))
            .await
            .unwrap();

        let deleted = cancel_booking(&engine, TrainingClassId(10)).await.unwrap();
        assert_eq!(deleted, booking);
        assert_eq!(
            repo.get_training_class(TrainingClassId(10)).await.unwrap().status,
            ClassStatus::Cancelled
        );
        assert!(cancel_booking(&engine, TrainingClassId(10)).await.unwrap_err().is_not_found());
    }
}
