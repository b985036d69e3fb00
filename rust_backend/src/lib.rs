//! Instructor availability and scheduling engine.
//!
//! Tracks instructor time commitments (class bookings and unavailability
//! rules), rejects conflicting writes, and renders calendar views over
//! arbitrary date ranges.
//!
//! # Layout
//!
//! - [`time`]: calendar-day ranges and date keys
//! - [`models`]: events, directory entities and calendar records
//! - [`algorithms`]: rule evaluation and conflict detection
//! - [`api`]: event creation requests
//! - [`db`]: repository traits, the in-memory store and the factory
//! - [`services`]: the scheduling engine, calendar builder, booking workflows
//!   and maintenance sweeps
//! - [`config`]: TOML configuration
//! - [`parsing`]: JSON seed documents
//! - `python` (feature `python`): PyO3 bindings

pub mod algorithms;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parsing;
pub mod services;
pub mod time;

#[cfg(feature = "python")]
pub mod python;

pub use error::{SchedulingError, SchedulingResult};
pub use services::SchedulingEngine;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Instructor scheduling engine for the Django host.
#[cfg(feature = "python")]
#[pymodule]
fn instructor_scheduling(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_engine_functions(m)?;
    Ok(())
}
