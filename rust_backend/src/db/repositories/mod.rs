//! Repository implementations module.
//!
//! - `local`: In-memory implementation for unit testing, local development and
//!   the CLI. Durable storage stays in the host application.

pub mod local;

pub use local::LocalRepository;
