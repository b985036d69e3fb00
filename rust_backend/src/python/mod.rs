//! Python bindings for the scheduling engine.
//!
//! This module exposes the engine to the host's Django process via PyO3.
//! Dates cross the boundary as `"YYYY-MM-DD"` strings and records come back
//! as plain dicts and lists.
//!
//! # Modules
//!
//! - [`engine`]: engine initialization, event creation, idle and calendar
//!   queries, designation and maintenance sweeps
//!
//! # Python API
//!
//! All functions are available in the `instructor_scheduling` Python module
//! after installation, together with the `ValidationError`,
//! `ScheduleConflictError` and `NotFoundError` exception classes.

pub mod engine;

pub use engine::register_engine_functions;
