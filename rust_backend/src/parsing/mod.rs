//! Parsers for host-supplied scheduling data.
//!
//! # Parsers
//!
//! - [`seed`]: JSON snapshots of instructors, classes, events and enrolments
//!
//! # Example
//!
//! ```no_run
//! use instructor_scheduling::parsing::seed::load_seed_file;
//! use std::path::Path;
//!
//! let seed = load_seed_file(Path::new("seed.json"))
//!     .expect("Failed to parse seed");
//! ```

pub mod seed;

pub use seed::{load_seed_file, parse_events_str, parse_seed_str, seed_local_repository, SeedDocument};
