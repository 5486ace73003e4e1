//! Uptime report binary.
//!
//! Loads a JSON snapshot of the store tables into the in-memory repository,
//! runs a report job through the job registry and prints the report rows as
//! JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! UPTIME_SNAPSHOT=stores.json cargo run --bin uptime-report
//! ```
//!
//! # Environment Variables
//!
//! - `UPTIME_SNAPSHOT`: Path to the snapshot (`{statuses, business_hours, timezones}`)
//! - `UPTIME_NOW`: Evaluation instant, RFC 3339 (default: latest poll, else current time)
//! - `UPTIME_DEFAULT_TIMEZONE`, `UPTIME_MAX_CONCURRENCY`, `UPTIME_JOB_TTL_SECS`: config overrides
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use store_uptime::config::ReportConfig;
use store_uptime::db::LocalRepository;
use store_uptime::services::{trigger_report, wait_for_report, JobTracker, ReportGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = ReportConfig::from_default_location()
        .and_then(ReportConfig::with_env_overrides)
        .context("Failed to load report configuration")?;

    let snapshot_path =
        env::var("UPTIME_SNAPSHOT").context("UPTIME_SNAPSHOT environment variable not set")?;
    let repository = LocalRepository::from_snapshot_file(&snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path))?;
    info!(
        "Loaded {} status polls from {}",
        repository.sample_count(),
        snapshot_path
    );

    let now = match env::var("UPTIME_NOW") {
        Ok(value) => DateTime::parse_from_rfc3339(&value)
            .context("UPTIME_NOW must be an RFC 3339 timestamp")?
            .with_timezone(&Utc),
        Err(_) => repository.latest_sample_timestamp().unwrap_or_else(Utc::now),
    };

    let generator = ReportGenerator::new(Arc::new(repository), &config)?;
    let tracker = JobTracker::new(config.job_ttl());

    let job_id = trigger_report(generator, &tracker, now);
    info!("Report job {} started", job_id);

    let report = wait_for_report(&tracker, &job_id, Duration::from_millis(50))
        .await
        .with_context(|| {
            let reason = tracker
                .get_job(&job_id)
                .and_then(|job| job.error)
                .unwrap_or_else(|| "unknown error".to_string());
            format!("Report job {} did not complete: {}", job_id, reason)
        })?;

    println!("{}", serde_json::to_string_pretty(&report.to_rows())?);
    info!("Report job {} complete ({} stores)", job_id, report.len());

    Ok(())
}
