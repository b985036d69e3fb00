//! Instructor applications to advertised classes.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Enrolment, EnrolmentId, EnrolmentStatus, InstructorId, TrainingClassId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrolmentFilter {
    pub training_class: Option<TrainingClassId>,
    pub instructor: Option<InstructorId>,
    pub status: Option<EnrolmentStatus>,
}

impl EnrolmentFilter {
    pub fn accepts(&self, enrolment: &Enrolment) -> bool {
        self.training_class
            .map_or(true, |c| enrolment.training_class == c)
            && self.instructor.map_or(true, |i| enrolment.instructor == i)
            && self.status.map_or(true, |s| enrolment.status == s)
    }
}

#[async_trait]
pub trait EnrolmentRepository: Send + Sync {
    /// Persist a new enrolment; the returned copy carries the assigned id.
    async fn store_enrolment(&self, enrolment: &Enrolment) -> RepositoryResult<Enrolment>;

    async fn get_enrolment(&self, id: EnrolmentId) -> RepositoryResult<Enrolment>;

    async fn list_enrolments(&self, filter: &EnrolmentFilter) -> RepositoryResult<Vec<Enrolment>>;

    async fn update_enrolment_status(
        &self,
        id: EnrolmentId,
        status: EnrolmentStatus,
    ) -> RepositoryResult<Enrolment>;
}
