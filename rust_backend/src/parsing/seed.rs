use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::db::repositories::LocalRepository;
use crate::db::repository::RepositoryResult;
use crate::models::{Enrolment, Event, Instructor, TrainingClass};

/// Snapshot of host data used to populate an in-memory repository.
///
/// Every section is optional so a seed may carry only events, or only the
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub training_classes: Vec<TrainingClass>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub enrolments: Vec<Enrolment>,
}

/// Parse a seed file from disk.
pub fn load_seed_file(path: &Path) -> Result<SeedDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    parse_seed_str(&content)
}

/// Parse a seed document from a JSON string.
///
/// Errors name the JSON path of the offending value, e.g.
/// `events[3].start_date`.
pub fn parse_seed_str(json: &str) -> Result<SeedDocument> {
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        anyhow::anyhow!("Invalid seed document at '{}': {}", path, err.into_inner())
    })
}

/// Parse a bare JSON array of events, as handed over by the host.
pub fn parse_events_str(json: &str) -> Result<Vec<Event>> {
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        anyhow::anyhow!("Invalid event list at '{}': {}", path, err.into_inner())
    })
}

/// Load every section of `document` into `repo`, keeping the seeded ids.
pub fn seed_local_repository(repo: &LocalRepository, document: &SeedDocument) -> RepositoryResult<()> {
    for instructor in &document.instructors {
        repo.insert_instructor(instructor.clone())?;
    }
    for training_class in &document.training_classes {
        repo.insert_training_class(training_class.clone())?;
    }
    for event in &document.events {
        repo.insert_event_with_id(event.clone())?;
    }
    for enrolment in &document.enrolments {
        repo.insert_enrolment_with_id(enrolment.clone())?;
    }
    Ok(())
}
