//! Python bindings for the scheduling engine.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use pyo3::exceptions::{PyException, PyRuntimeError};
use pyo3::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tokio::runtime::Runtime;

use crate::api::EventDraft;
use crate::config::EngineConfig;
use crate::db::{self, RepositoryFactory};
use crate::error::SchedulingError;
use crate::models::{EventId, EventType, FreqType, InstructorId, TrainingClassId};
use crate::parsing::parse_events_str;
use crate::services::{self, SchedulingEngine};
use crate::time::parse_key;

pyo3::create_exception!(instructor_scheduling, ValidationError, PyException);
pyo3::create_exception!(instructor_scheduling, ScheduleConflictError, PyException);
pyo3::create_exception!(instructor_scheduling, NotFoundError, PyException);

static ENGINE: RwLock<Option<Arc<SchedulingEngine>>> = RwLock::new(None);

fn runtime_error(message: impl Into<String>) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(message.into())
}

fn to_py_err(err: SchedulingError) -> PyErr {
    match err {
        SchedulingError::Validation(message) => ValidationError::new_err(message),
        SchedulingError::ScheduleConflict { message, .. } => ScheduleConflictError::new_err(message),
        SchedulingError::NotFound(message) => NotFoundError::new_err(message),
        SchedulingError::Repository(e) => runtime_error(e.to_string()),
    }
}

fn runtime() -> PyResult<Runtime> {
    Runtime::new().map_err(|e| runtime_error(format!("Failed to create async runtime: {}", e)))
}

fn parse_date(field: &str, raw: &str) -> PyResult<NaiveDate> {
    parse_key(raw).map_err(|e| ValidationError::new_err(format!("{}: {}", field, e)))
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> PyResult<Option<NaiveDate>> {
    raw.map(|r| parse_date(field, r)).transpose()
}

/// Serialize through JSON so records reach Python as plain dicts and lists.
fn to_python<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<Py<PyAny>> {
    let json = serde_json::to_string(value)
        .map_err(|e| runtime_error(format!("Serialization failed: {}", e)))?;
    let obj = py.import("json")?.call_method1("loads", (json,))?;
    Ok(obj.unbind())
}

/// Configuration from `config_path` or the default locations, with
/// environment overrides applied.
///
/// Built-in defaults are used only when no file exists; a file that fails to
/// load raises `RuntimeError`.
fn load_config(config_path: Option<&str>) -> PyResult<EngineConfig> {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_file(Path::new(path)),
        None => EngineConfig::load_or_default(),
    }
    .map_err(|e| runtime_error(e.to_string()))?;
    config
        .apply_env_overrides()
        .map_err(|e| runtime_error(e.to_string()))?;
    Ok(config)
}

/// The engine installed by `init_engine`, or one over the default repository.
fn engine() -> PyResult<Arc<SchedulingEngine>> {
    let installed = ENGINE
        .read()
        .map_err(|_| runtime_error("Engine lock poisoned"))?
        .clone();
    if let Some(engine) = installed {
        return Ok(engine);
    }

    let config = load_config(None)?;
    let repo = db::init_repository(&config).map_err(|e| runtime_error(e.to_string()))?;
    let engine = Arc::new(SchedulingEngine::new(repo.clone(), config.scheduling));
    let mut slot = ENGINE
        .write()
        .map_err(|_| runtime_error("Engine lock poisoned"))?;
    Ok(slot.get_or_insert(engine).clone())
}

/// Build the engine from a configuration file and/or a seed file.
///
/// Without `config_path` the default search locations are tried and the
/// built-in defaults used when nothing is found; a config file that exists
/// but is invalid raises `RuntimeError`. A `seed_path` selects the
/// fixture repository. Calling it again replaces the engine.
#[pyfunction]
#[pyo3(signature = (config_path=None, seed_path=None))]
pub fn init_engine(config_path: Option<&str>, seed_path: Option<&str>) -> PyResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(seed) = seed_path {
        config.repository.repo_type = "fixture".to_string();
        config.repository.fixture_path = Some(seed.into());
    }

    let repo = RepositoryFactory::from_config(&config).map_err(|e| runtime_error(e.to_string()))?;
    let engine = Arc::new(SchedulingEngine::new(repo, config.scheduling));
    *ENGINE
        .write()
        .map_err(|_| runtime_error("Engine lock poisoned"))? = Some(engine);
    Ok(())
}

/// Create an event from the flat host fields.
///
/// Returns the stored event as a dict.
#[pyfunction]
#[pyo3(signature = (
    event_type=None,
    instructor=None,
    training_class=None,
    start_date=None,
    end_date=None,
    freq_type=None,
    freq_interval=None
))]
#[allow(clippy::too_many_arguments)]
pub fn create_event(
    py: Python<'_>,
    event_type: Option<&str>,
    instructor: Option<i64>,
    training_class: Option<i64>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    freq_type: Option<&str>,
    freq_interval: Option<Vec<u32>>,
) -> PyResult<Py<PyAny>> {
    let draft = EventDraft {
        event_type: event_type
            .map(EventType::from_str)
            .transpose()
            .map_err(ValidationError::new_err)?,
        instructor: instructor.map(InstructorId),
        training_class: training_class.map(TrainingClassId),
        start_date: parse_optional_date("start_date", start_date)?,
        end_date: parse_optional_date("end_date", end_date)?,
        freq_type: freq_type.map(FreqType::parse),
        freq_interval: freq_interval.unwrap_or_default(),
    };

    let engine = engine()?;
    let event = py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(engine.create_event_from_draft(draft))
            .map_err(to_py_err)
    })?;
    to_python(py, &event)
}

/// Delete an event; returns the deleted event as a dict.
#[pyfunction]
pub fn delete_event(py: Python<'_>, event_id: i64) -> PyResult<Py<PyAny>> {
    let engine = engine()?;
    let event = py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(engine.delete_event(EventId(event_id)))
            .map_err(to_py_err)
    })?;
    to_python(py, &event)
}

#[pyfunction]
pub fn is_instructor_idle(
    py: Python<'_>,
    instructor: i64,
    start_date: &str,
    end_date: &str,
) -> PyResult<bool> {
    let start = parse_date("start_date", start_date)?;
    let end = parse_date("end_date", end_date)?;
    let engine = engine()?;
    py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(engine.is_instructor_idle(InstructorId(instructor), start, end))
            .map_err(to_py_err)
    })
}

/// Calendar of one instructor's stored events.
#[pyfunction]
pub fn instructor_calendar(
    py: Python<'_>,
    instructor: i64,
    start_date: &str,
    end_date: &str,
) -> PyResult<Py<PyAny>> {
    let start = parse_date("start_date", start_date)?;
    let end = parse_date("end_date", end_date)?;
    let engine = engine()?;
    let days = py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(engine.instructor_calendar(InstructorId(instructor), start, end))
            .map_err(to_py_err)
    })?;
    to_python(py, &days)
}

/// Calendar of an arbitrary JSON list of events; no store access.
#[pyfunction]
pub fn build_calendar(
    py: Python<'_>,
    events_json: &str,
    start_date: &str,
    end_date: &str,
) -> PyResult<Py<PyAny>> {
    let start = parse_date("start_date", start_date)?;
    let end = parse_date("end_date", end_date)?;
    let events = parse_events_str(events_json).map_err(|e| ValidationError::new_err(e.to_string()))?;
    let days = services::build_calendar(&events, start, end);
    to_python(py, &days)
}

#[pyfunction]
pub fn designate_instructor(py: Python<'_>, training_class: i64, instructor: i64) -> PyResult<Py<PyAny>> {
    let engine = engine()?;
    let booking = py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(services::designate_instructor(
                &engine,
                TrainingClassId(training_class),
                InstructorId(instructor),
            ))
            .map_err(to_py_err)
    })?;
    to_python(py, &booking)
}

/// Expire stale pending enrolments. `now` is `YYYY-MM-DDTHH:MM:SS`, default the current UTC time.
#[pyfunction]
#[pyo3(signature = (now=None))]
pub fn sweep_expired_enrolments(py: Python<'_>, now: Option<&str>) -> PyResult<usize> {
    let now = match now {
        Some(raw) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| ValidationError::new_err(format!("now: {}", e)))?,
        None => Utc::now().naive_utc(),
    };
    let engine = engine()?;
    let timeout = engine.settings().enrolment_timeout();
    py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(services::sweep_expired_enrolments(
                engine.repository().as_ref(),
                now,
                timeout,
            ))
            .map_err(|e| to_py_err(e.into()))
    })
}

/// Close scheduled classes whose booking has ended. `today` defaults to the current UTC date.
#[pyfunction]
#[pyo3(signature = (today=None))]
pub fn sweep_completed_classes(py: Python<'_>, today: Option<&str>) -> PyResult<usize> {
    let today = match today {
        Some(raw) => parse_date("today", raw)?,
        None => Utc::now().date_naive(),
    };
    let engine = engine()?;
    py.detach(|| -> PyResult<_> {
        runtime()?
            .block_on(services::sweep_completed_classes(
                engine.repository().as_ref(),
                today,
            ))
            .map_err(|e| to_py_err(e.into()))
    })
}

/// Register the engine functions and exception types on `m`.
pub fn register_engine_functions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("ValidationError", py.get_type::<ValidationError>())?;
    m.add("ScheduleConflictError", py.get_type::<ScheduleConflictError>())?;
    m.add("NotFoundError", py.get_type::<NotFoundError>())?;

    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(create_event, m)?)?;
    m.add_function(wrap_pyfunction!(delete_event, m)?)?;
    m.add_function(wrap_pyfunction!(is_instructor_idle, m)?)?;
    m.add_function(wrap_pyfunction!(instructor_calendar, m)?)?;
    m.add_function(wrap_pyfunction!(build_calendar, m)?)?;
    m.add_function(wrap_pyfunction!(designate_instructor, m)?)?;
    m.add_function(wrap_pyfunction!(sweep_expired_enrolments, m)?)?;
    m.add_function(wrap_pyfunction!(sweep_completed_classes, m)?)?;
    Ok(())
}
