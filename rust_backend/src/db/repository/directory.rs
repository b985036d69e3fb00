//! Instructor and training-class lookups.
//!
//! These entities belong to the host's CRUD layer; the engine only resolves
//! them by id and records the scheduling-related fields it owns (the class's
//! designated instructor and status).

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{ClassStatus, Instructor, InstructorId, TrainingClass, TrainingClassId};

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the instructor doesn't exist
    async fn get_instructor(&self, id: InstructorId) -> RepositoryResult<Instructor>;

    async fn store_instructor(&self, instructor: &Instructor) -> RepositoryResult<()>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the class doesn't exist
    async fn get_training_class(&self, id: TrainingClassId) -> RepositoryResult<TrainingClass>;

    /// Insert or replace a training class.
    async fn store_training_class(&self, training_class: &TrainingClass) -> RepositoryResult<()>;

    async fn list_training_classes(
        &self,
        status: Option<ClassStatus>,
    ) -> RepositoryResult<Vec<TrainingClass>>;
}
