//! Job tracking for asynchronous report generation.
//!
//! This module provides an in-memory registry of report jobs. A job moves
//! through `pending -> running -> complete | failed` and is reaped once it has
//! been finished for longer than the configured TTL. The registry is an
//! ordinary value handed to whoever needs it.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::UptimeReport;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Job status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// Job metadata, logs and result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportJob {
    pub job_id: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The finished report, shared so lookups do not copy it.
    pub result: Option<Arc<UptimeReport>>,
    pub error: Option<String>,
}

/// In-memory report job registry.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, ReportJob>>>,
    ttl: Duration,
}

impl JobTracker {
    /// Create a new job tracker reaping finished jobs after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a new pending job and return its ID.
    pub fn create_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = ReportJob {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    /// Mark a pending job as running. Returns `false` if the job is unknown
    /// or no longer pending.
    pub fn start_job(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(job_id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Running;
                true
            }
            _ => false,
        }
    }

    /// Add a log entry to a job.
    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a job as complete with its report.
    pub fn complete_job(&self, job_id: &str, report: UptimeReport) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = JobStatus::Complete;
            job.completed_at = Some(Utc::now());
            job.result = Some(Arc::new(report));
        }
    }

    /// Mark a job as failed.
    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        let error_message = error_message.into();
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id) {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Error,
                message: error_message.clone(),
            });
            job.error = Some(error_message);
        }
    }

    /// Get a job by ID.
    pub fn get_job(&self, job_id: &str) -> Option<ReportJob> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Status of a job, `None` when the id is unknown or already reaped.
    pub fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().get(job_id).map(|job| job.status)
    }

    /// The report of a complete job.
    pub fn result(&self, job_id: &str) -> Option<Arc<UptimeReport>> {
        self.jobs
            .read()
            .get(job_id)
            .and_then(|job| job.result.clone())
    }

    /// Get all logs for a job.
    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }

    /// Drop finished jobs whose completion is at least `ttl` before `now`.
    /// Returns the number of jobs removed.
    pub fn reap_expired(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            Some(done) if job.status.is_finished() => now - done < ttl,
            _ => true,
        });
        before - jobs.len()
    }

    /// Number of jobs currently tracked, finished or not.
    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}
