//! Storage layer for scheduling events and the host directory.
//!
//! This module provides abstractions for storage via the Repository pattern,
//! so the engine never depends on a concrete backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (Python bindings, CLI)               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services) - Scheduling rules     │
//! │  - Conflict detection and idle queries                   │
//! │  - Booking workflows and maintenance sweeps              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                 │
//! ┌───▼──────────────┐     ┌──────────▼──────────────┐
//! │ Local Repository │     │  Fixture Repository     │
//! │ (in-memory)      │     │  (in-memory, seeded)    │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```no_run
//! use instructor_scheduling::config::EngineConfig;
//! use instructor_scheduling::db::RepositoryFactory;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_default_location()?;
//!     let repo = RepositoryFactory::from_config(&config)?;
//!     Ok(())
//! }
//! ```

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use repository::{
    ChangeSet, DirectoryRepository, EnrolmentFilter, EnrolmentRepository, ErrorContext,
    EventFilter, EventPatch, EventRepository, FullRepository, RepositoryError, RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

use crate::config::EngineConfig;

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton from `config`.
///
/// Later calls are no-ops; the first configuration wins.
pub fn init_repository(config: &EngineConfig) -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = RepositoryFactory::from_config(config)
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    get_repository()
}

/// Get a reference to the global repository instance.
///
/// Falls back to an empty local repository when nothing was initialized.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = REPOSITORY.set(RepositoryFactory::create_local());
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
