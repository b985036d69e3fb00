pub mod calendar;
pub mod directory;
pub mod event;
pub mod macros;

crate::define_id_type!(i64, EventId);
crate::define_id_type!(i64, InstructorId);
crate::define_id_type!(i64, TrainingClassId);
crate::define_id_type!(i64, EnrolmentId);

pub use calendar::*;
pub use directory::*;
pub use event::*;
