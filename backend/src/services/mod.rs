//! Service layer for business logic and orchestration.
//!
//! Services sit between the repository and the job layer: they resolve store
//! configuration, build business windows, integrate status polls and assemble
//! the report.

pub mod business_window;
pub mod error;
pub mod integrator;
pub mod job_tracker;
pub mod report;
pub mod report_processor;
pub mod store_config;

pub use business_window::{business_minutes, business_windows_for, translate};
pub use error::{ReportError, ReportResult};
pub use integrator::{integrate, StatusInterval, StatusTimeline};
pub use job_tracker::{JobStatus, JobTracker, LogEntry, LogLevel, ReportJob};
pub use report::{compute_store_uptime, ReportGenerator};
pub use report_processor::{run_report_job, trigger_report, wait_for_report};
pub use store_config::{
    parse_timezone, resolve_rules, DailyRule, ResolvedStoreConfig, StoreConfigResolver,
};
