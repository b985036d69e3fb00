//! Engine configuration file support.
//!
//! Configuration is read from a TOML file (`scheduling.toml`) and may be
//! overridden by environment variables:
//!
//! ```toml
//! [repository]
//! type = "fixture"
//! fixture_path = "data/seed.json"
//!
//! [scheduling]
//! class_duration_days = 2
//! rule_conflict_scope = "instructor"
//! enrolment_timeout_hours = 48
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;
use crate::db::repository::RepositoryError;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
}

/// Repository backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
    /// JSON seed loaded by the `fixture` backend.
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

fn default_repo_type() -> String {
    "local".to_string()
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
            fixture_path: None,
        }
    }
}

/// Which bookings a new availability rule is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleConflictScope {
    /// Only the bookings of the rule's instructor.
    Instructor,
    /// Every booking in the store, whatever the instructor.
    Global,
}

impl FromStr for RuleConflictScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instructor" => Ok(Self::Instructor),
            "global" => Ok(Self::Global),
            other => Err(format!("Unknown rule conflict scope: {}", other)),
        }
    }
}

/// Scheduling behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// Length of every class booking, in days.
    #[serde(default = "default_class_duration_days")]
    pub class_duration_days: u32,
    #[serde(default = "default_rule_conflict_scope")]
    pub rule_conflict_scope: RuleConflictScope,
    /// Pending enrolments older than this are expired by the maintenance sweep.
    #[serde(default = "default_enrolment_timeout_hours")]
    pub enrolment_timeout_hours: i64,
}

fn default_class_duration_days() -> u32 {
    2
}

fn default_rule_conflict_scope() -> RuleConflictScope {
    RuleConflictScope::Instructor
}

fn default_enrolment_timeout_hours() -> i64 {
    48
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            class_duration_days: default_class_duration_days(),
            rule_conflict_scope: default_rule_conflict_scope(),
            enrolment_timeout_hours: default_enrolment_timeout_hours(),
        }
    }
}

impl SchedulingSettings {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.class_duration_days == 0 {
            return Err(RepositoryError::configuration(
                "'scheduling.class_duration_days' must be at least 1",
            ));
        }
        if self.enrolment_timeout_hours <= 0 {
            return Err(RepositoryError::configuration(
                "'scheduling.enrolment_timeout_hours' must be positive",
            ));
        }
        Ok(())
    }

    pub fn enrolment_timeout(&self) -> chrono::Duration {
        chrono::Duration::hours(self.enrolment_timeout_hours)
    }
}

fn default_search_paths() -> [PathBuf; 3] {
    [
        PathBuf::from("scheduling.toml"),
        PathBuf::from("rust_backend/scheduling.toml"),
        PathBuf::from("../scheduling.toml"),
    ]
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `scheduling.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        Self::from_first_existing(&default_search_paths())?.ok_or_else(|| {
            RepositoryError::configuration("No scheduling.toml found in standard locations")
        })
    }

    /// Like [`Self::from_default_location`], but built-in defaults when no
    /// file exists. A file that exists and fails to load is still an error.
    pub fn load_or_default() -> Result<Self, RepositoryError> {
        Ok(Self::from_first_existing(&default_search_paths())?.unwrap_or_default())
    }

    /// Load the first of `paths` that exists.
    ///
    /// # Returns
    /// * `Ok(None)` if none of the paths exists
    /// * `Err(RepositoryError)` if the file found cannot be read, parsed or validated
    pub fn from_first_existing<P: AsRef<Path>>(paths: &[P]) -> Result<Option<Self>, RepositoryError> {
        match paths.iter().map(|p| p.as_ref()).find(|path| path.exists()) {
            Some(path) => Self::from_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), RepositoryError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// Recognised keys: `REPOSITORY_TYPE`, `SCHEDULING_FIXTURE_PATH`,
    /// `SCHEDULING_CLASS_DURATION_DAYS`, `SCHEDULING_RULE_SCOPE`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Some(path) = lookup("SCHEDULING_FIXTURE_PATH") {
            self.repository.fixture_path = Some(PathBuf::from(path));
        }
        if let Some(days) = lookup("SCHEDULING_CLASS_DURATION_DAYS") {
            self.scheduling.class_duration_days = days.trim().parse().map_err(|e| {
                RepositoryError::configuration(format!(
                    "Invalid SCHEDULING_CLASS_DURATION_DAYS '{}': {}",
                    days, e
                ))
            })?;
        }
        if let Some(scope) = lookup("SCHEDULING_RULE_SCOPE") {
            self.scheduling.rule_conflict_scope =
                scope.parse().map_err(RepositoryError::configuration)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), RepositoryError> {
        let repo_type = self.repository_type()?;
        if repo_type == RepositoryType::Fixture && self.repository.fixture_path.is_none() {
            return Err(RepositoryError::configuration(
                "Fixture repository requires 'repository.fixture_path' setting",
            ));
        }
        self.scheduling.validate()
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, RepositoryError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })
    }
}
