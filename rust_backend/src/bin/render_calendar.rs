//! Calendar rendering binary.
//!
//! Loads a JSON seed into an in-memory repository and prints one
//! instructor's calendar as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin render-calendar -- seed.json 3 2024-04-01 2024-04-30
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter directives, e.g. `instructor_scheduling=debug` (default: warn)
//! - `SCHEDULING_CLASS_DURATION_DAYS`, `SCHEDULING_RULE_SCOPE`: engine settings

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use instructor_scheduling::config::EngineConfig;
use instructor_scheduling::db::{RepositoryBuilder, RepositoryType};
use instructor_scheduling::models::InstructorId;
use instructor_scheduling::services::SchedulingEngine;
use instructor_scheduling::time::parse_key;

/// Filter from `RUST_LOG`-style directives, `warn` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

const USAGE: &str = "usage: render-calendar <seed.json> <instructor-id> <start YYYY-MM-DD> <end YYYY-MM-DD>";

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [seed, instructor, start, end] = args.as_slice() else {
        bail!(USAGE);
    };

    let instructor: i64 = instructor
        .parse()
        .with_context(|| format!("Invalid instructor id '{}'", instructor))?;
    let start = parse_key(start).map_err(anyhow::Error::msg).context("Invalid start date")?;
    let end = parse_key(end).map_err(anyhow::Error::msg).context("Invalid end date")?;

    let mut config = EngineConfig::default();
    config
        .apply_env_overrides()
        .context("Invalid environment configuration")?;

    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Fixture)
        .fixture_path(PathBuf::from(seed))
        .build()
        .context("Failed to load seed")?;
    info!("Seed {} loaded", seed);

    let engine = SchedulingEngine::new(Arc::clone(&repo), config.scheduling);
    let calendar = engine
        .instructor_calendar(InstructorId(instructor), start, end)
        .await
        .context("Failed to build calendar")?;

    println!("{}", serde_json::to_string_pretty(&calendar)?);
    Ok(())
}
