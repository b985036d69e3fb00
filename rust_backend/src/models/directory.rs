//! Entities owned by the host's CRUD layer that the engine resolves by id.
//!
//! A training class does not point back at its booking event; use
//! [`crate::db::EventRepository::booking_for_class`] for that lookup.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{EnrolmentId, InstructorId, TrainingClassId};
use crate::time::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: InstructorId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Instructor {
    pub fn new(id: InstructorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
        }
    }
}

/// Lifecycle of a training class as far as scheduling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    /// Published and waiting for an instructor.
    Advertised,
    /// Instructor designated and booking created.
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingClass {
    pub id: TrainingClassId,
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub instructor: Option<InstructorId>,
    #[serde(default = "default_status")]
    pub status: ClassStatus,
}

fn default_status() -> ClassStatus {
    ClassStatus::Advertised
}

impl TrainingClass {
    pub fn new(id: TrainingClassId, title: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id,
            title: title.into(),
            start_date,
            instructor: None,
            status: ClassStatus::Advertised,
        }
    }

    pub fn with_instructor(mut self, instructor: InstructorId) -> Self {
        self.instructor = Some(instructor);
        self
    }

    /// Days the class occupies for a class lasting `duration_days` (at least one).
    pub fn window(&self, duration_days: u32) -> DateRange {
        let extra = i64::from(duration_days.max(1)) - 1;
        DateRange::new(self.start_date, self.start_date + Duration::days(extra))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrolmentStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

/// An instructor's application to teach an advertised class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrolment {
    #[serde(default)]
    pub id: Option<EnrolmentId>,
    pub training_class: TrainingClassId,
    pub instructor: InstructorId,
    pub status: EnrolmentStatus,
    pub created_at: NaiveDateTime,
}

impl Enrolment {
    pub fn pending(
        training_class: TrainingClassId,
        instructor: InstructorId,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: None,
            training_class,
            instructor,
            status: EnrolmentStatus::Pending,
            created_at,
        }
    }

    /// A pending enrolment older than `timeout` at `now`.
    pub fn is_expired_at(&self, now: NaiveDateTime, timeout: Duration) -> bool {
        self.status == EnrolmentStatus::Pending && self.created_at + timeout <= now
    }
}
