//! Repository trait definitions for storage operations.
//!
//! Responsibilities are split across focused traits so a store can be swapped
//! or mocked one concern at a time.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`events`]: Scheduling events (bookings, rules, cancellations)
//! - [`directory`]: Instructor and training-class lookups
//! - [`enrolments`]: Instructor applications to advertised classes
//!
//! # Convenience Trait Bound
//!
//! Code that needs every capability takes a [`FullRepository`]:
//!
//! ```ignore
//! async fn purge_class<R: FullRepository + ?Sized>(repo: &R, id: TrainingClassId) -> RepositoryResult<()> {
//!     if let Some(booking) = repo.booking_for_class(id).await? {
//!         repo.delete_event(booking.id.unwrap()).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod directory;
pub mod enrolments;
pub mod error;
pub mod events;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use directory::DirectoryRepository;
pub use enrolments::{EnrolmentFilter, EnrolmentRepository};
pub use events::{ChangeSet, EventFilter, EventPatch, EventRepository};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
pub trait FullRepository: EventRepository + DirectoryRepository + EnrolmentRepository {}

impl<T> FullRepository for T where T: EventRepository + DirectoryRepository + EnrolmentRepository {}
