//! Async report processing service.
//!
//! Runs report generation in the background and records progress in the
//! job registry, so callers can trigger a report and poll for it later.

use chrono::{DateTime, Utc};

use super::error::{ReportError, ReportResult};
use super::job_tracker::{JobTracker, LogLevel};
use super::report::ReportGenerator;
use crate::api::UptimeReport;

/// Generate a report for an already created job.
///
/// Progress is logged to the tracker. On success the job is marked complete
/// with the report; on a fatal error (the store list cannot be read) it is
/// marked failed. Fails with [`ReportError::JobNotFound`] when `job_id` is
/// not a pending job.
///
/// # Arguments
/// * `job_id` - The job ID for tracking progress
/// * `tracker` - Job registry
/// * `generator` - Report generator bound to a repository
/// * `now` - Evaluation instant the trailing windows are anchored at
pub async fn run_report_job(
    job_id: String,
    tracker: JobTracker,
    generator: ReportGenerator,
    now: DateTime<Utc>,
) -> ReportResult<()> {
    if !tracker.start_job(&job_id) {
        return Err(ReportError::JobNotFound(job_id));
    }
    tracker.log(&job_id, LogLevel::Info, format!("Generating uptime report at {}", now));

    match generator.generate_report(now).await {
        Ok(report) => {
            if report.is_empty() {
                tracker.log(&job_id, LogLevel::Warning, "Repository lists no stores");
            }
            tracker.log(
                &job_id,
                LogLevel::Success,
                format!("✓ Computed uptime for {} stores", report.len()),
            );
            tracker.complete_job(&job_id, report);
            Ok(())
        }
        Err(e) => {
            tracker.fail_job(&job_id, format!("Report generation failed: {}", e));
            Err(e)
        }
    }
}

/// Create a job, spawn its generation on the tokio runtime and return the job
/// id immediately. Expired jobs are reaped first.
pub fn trigger_report(
    generator: ReportGenerator,
    tracker: &JobTracker,
    now: DateTime<Utc>,
) -> String {
    let reaped = tracker.reap_expired(Utc::now());
    if reaped > 0 {
        log::debug!(
            "Reaped {} expired report jobs, {} still tracked",
            reaped,
            tracker.job_count()
        );
    }
    let job_id = tracker.create_job();
    let response_job_id = job_id.clone();
    let tracker = tracker.clone();

    tokio::spawn(async move {
        if let Err(e) = run_report_job(job_id.clone(), tracker, generator, now).await {
            log::warn!("Report job {} failed: {}", job_id, e);
        }
    });

    response_job_id
}

/// Poll the registry until the job finishes or disappears.
///
/// Returns the report of a complete job, `None` for a failed or unknown one.
pub async fn wait_for_report(
    tracker: &JobTracker,
    job_id: &str,
    poll_interval: std::time::Duration,
) -> Option<std::sync::Arc<UptimeReport>> {
    loop {
        match tracker.status(job_id) {
            Some(status) if status.is_finished() => return tracker.result(job_id),
            Some(_) => tokio::time::sleep(poll_interval).await,
            None => return None,
        }
    }
}
