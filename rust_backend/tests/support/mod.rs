#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use instructor_scheduling::config::SchedulingSettings;
use instructor_scheduling::db::{DirectoryRepository, LocalRepository};
use instructor_scheduling::models::{Instructor, InstructorId, TrainingClass, TrainingClassId};
use instructor_scheduling::services::SchedulingEngine;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Instructor `I` used throughout the scenarios.
pub const INSTRUCTOR: InstructorId = InstructorId(1);

/// An engine over a fresh store holding instructors 1 and 2.
pub async fn engine() -> (SchedulingEngine, Arc<LocalRepository>) {
    engine_with(SchedulingSettings::default()).await
}

pub async fn engine_with(settings: SchedulingSettings) -> (SchedulingEngine, Arc<LocalRepository>) {
    let repo = Arc::new(LocalRepository::new());
    repo.store_instructor(&Instructor::new(InstructorId(1), "Ada Lovelace"))
        .await
        .unwrap();
    repo.store_instructor(&Instructor::new(InstructorId(2), "Grace Hopper"))
        .await
        .unwrap();
    (SchedulingEngine::new(repo.clone(), settings), repo)
}

/// Store a class taught by `instructor` starting on `start`.
pub async fn add_class(repo: &LocalRepository, id: i64, instructor: InstructorId, start: NaiveDate) {
    repo.store_training_class(
        &TrainingClass::new(TrainingClassId(id), format!("Class {}", id), start)
            .with_instructor(instructor),
    )
    .await
    .unwrap();
}
