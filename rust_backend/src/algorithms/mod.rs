//! Day-level scheduling algorithms.
//!
//! # Components
//!
//! - [`rules`]: Availability rule evaluation (one-time and weekly/monthly recurrence)
//! - [`conflicts`]: Conflict detection between bookings, rules and cancellations
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use instructor_scheduling::algorithms::conflicts;
//! use instructor_scheduling::models::{Event, FreqType, InstructorId, TrainingClassId};
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//! let rule = Event::recurring(InstructorId(1), monday, None, FreqType::Weekly, vec![1]);
//! let booking = Event::class_schedule(
//!     TrainingClassId(7),
//!     InstructorId(1),
//!     monday,
//!     monday.succ_opt().unwrap(),
//! );
//! assert!(conflicts(&booking, &rule));
//! ```

pub mod conflicts;
pub mod rules;

pub use conflicts::{
    conflicts, find_conflict, first_conflict_day, is_cancelled, rule_blocks_day,
    SchedulingConflict,
};
pub use rules::{matches, occupies, recurrence_matches};
