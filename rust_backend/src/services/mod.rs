//! Service layer: scheduling rules on top of the repository traits.
//!
//! - [`scheduling`]: the engine (event creation, conflict checks, idle queries)
//! - [`calendar`]: calendar rendering over a date window
//! - [`booking`]: designation, enrolment and cancellation workflows
//! - [`maintenance`]: periodic status sweeps

pub mod booking;
pub mod calendar;
pub mod maintenance;
pub mod scheduling;

pub use booking::{accept_enrolment, apply_for_class, cancel_booking, designate_instructor};
pub use calendar::build_calendar;
pub use maintenance::{sweep_completed_classes, sweep_expired_enrolments};
pub use scheduling::SchedulingEngine;
