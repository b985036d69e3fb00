//! Status transitions run by the host's periodic scheduler.
//!
//! Reads never change state; these sweeps are the only place where pending
//! enrolments expire and finished classes are closed.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::info;

use crate::db::repository::{
    DirectoryRepository, EnrolmentFilter, EnrolmentRepository, EventRepository, FullRepository,
    RepositoryResult,
};
use crate::models::{ClassStatus, EnrolmentStatus};

/// Mark pending enrolments created at least `timeout` before `now` as expired.
///
/// # Returns
/// Number of enrolments expired.
pub async fn sweep_expired_enrolments<R: FullRepository + ?Sized>(
    repo: &R,
    now: NaiveDateTime,
    timeout: Duration,
) -> RepositoryResult<usize> {
    let pending = repo
        .list_enrolments(&EnrolmentFilter {
            status: Some(EnrolmentStatus::Pending),
            ..Default::default()
        })
        .await?;

    let mut expired = 0;
    for enrolment in pending.iter().filter(|e| e.is_expired_at(now, timeout)) {
        if let Some(id) = enrolment.id {
            repo.update_enrolment_status(id, EnrolmentStatus::Expired)
                .await?;
            expired += 1;
        }
    }

    if expired > 0 {
        info!("Expired {} pending enrolments", expired);
    }
    Ok(expired)
}

/// Mark scheduled classes whose booking ended before `today` as completed.
///
/// # Returns
/// Number of classes completed.
pub async fn sweep_completed_classes<R: FullRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
) -> RepositoryResult<usize> {
    let scheduled = repo
        .list_training_classes(Some(ClassStatus::Scheduled))
        .await?;

    let mut completed = 0;
    for mut class in scheduled {
        let Some(booking) = repo.booking_for_class(class.id).await? else {
            continue;
        };
        if booking.end_date.unwrap_or(booking.start_date) < today {
            class.status = ClassStatus::Completed;
            repo.store_training_class(&class).await?;
            completed += 1;
        }
    }

    if completed > 0 {
        info!("Completed {} training classes", completed);
    }
    Ok(completed)
}
