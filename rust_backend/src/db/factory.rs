//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration. The `fixture`
//! backend is a local repository pre-populated from a JSON seed file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::config::EngineConfig;
use crate::parsing::seed;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Empty in-memory store
    Local,
    /// In-memory store loaded from a JSON seed
    Fixture,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "fixture" => Ok(Self::Fixture),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Local if unset or unknown.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use instructor_scheduling::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::Local, None).unwrap();
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// assert!(runtime.block_on(repo.health_check()).unwrap());
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `fixture_path` - Seed file, required for `Fixture`
    pub fn create(
        repo_type: RepositoryType,
        fixture_path: Option<&Path>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Fixture => {
                let path = fixture_path.ok_or_else(|| {
                    RepositoryError::configuration("Fixture repository requires a seed path")
                })?;
                let repo = Self::create_fixture(path)?;
                Ok(Arc::new(repo) as Arc<dyn FullRepository>)
            }
        }
    }

    /// Create an empty in-memory repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create an in-memory repository populated from a JSON seed file.
    pub fn create_fixture(path: &Path) -> RepositoryResult<LocalRepository> {
        let document = seed::load_seed_file(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to load seed '{}': {:#}",
                path.display(),
                e
            ))
        })?;
        let repo = LocalRepository::new();
        seed::seed_local_repository(&repo, &document)?;
        log::info!(
            "Loaded fixture repository from {} ({} events)",
            path.display(),
            document.events.len()
        );
        Ok(repo)
    }

    /// Create the repository described by an engine configuration.
    pub fn from_config(config: &EngineConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type()?;
        Self::create(repo_type, config.repository.fixture_path.as_deref())
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```
/// use instructor_scheduling::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Local)
///     .build()
///     .unwrap();
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    fixture_path: Option<PathBuf>,
}

impl RepositoryBuilder {
    /// Create a new repository builder. Defaults to a local repository.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::Local,
            fixture_path: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Set the seed file used by the fixture backend.
    pub fn fixture_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture_path = Some(path.into());
        self
    }

    /// Load repository selection from environment variables.
    pub fn from_env(mut self) -> Self {
        self.repo_type = RepositoryType::from_env();
        if let Ok(path) = std::env::var("SCHEDULING_FIXTURE_PATH") {
            self.fixture_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Build the repository instance.
    pub fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryFactory::create(self.repo_type, self.fixture_path.as_deref())
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
