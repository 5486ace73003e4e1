//! Report configuration file support.
//!
//! This module reads report settings from a TOML file and applies
//! environment-variable overrides on top.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::repository::{ErrorContext, RepositoryError};

/// Timezone assumed for stores without a timezone row.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Report configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub jobs: JobSettings,
}

/// Settings for the uptime computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Upper bound on stores processed concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

/// Settings for the report job registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Finished jobs older than this are reaped.
    #[serde(default = "default_job_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_job_ttl_secs() -> u64 {
    3600
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_job_ttl_secs(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ReportConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let config: ReportConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `uptime.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Falls back to built-in defaults when no file exists.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("uptime.toml"),
            PathBuf::from("backend/uptime.toml"),
            PathBuf::from("../uptime.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        log::debug!("No uptime.toml found, using default report configuration");
        Ok(Self::default())
    }

    /// Apply `UPTIME_DEFAULT_TIMEZONE`, `UPTIME_MAX_CONCURRENCY` and
    /// `UPTIME_JOB_TTL_SECS` on top of the loaded values.
    pub fn with_env_overrides(mut self) -> Result<Self, RepositoryError> {
        if let Ok(tz) = std::env::var("UPTIME_DEFAULT_TIMEZONE") {
            self.report.default_timezone = tz;
        }
        if let Ok(val) = std::env::var("UPTIME_MAX_CONCURRENCY") {
            self.report.max_concurrency = val.parse().map_err(|_| {
                RepositoryError::configuration(
                    "UPTIME_MAX_CONCURRENCY must be a positive integer",
                )
            })?;
        }
        if let Ok(val) = std::env::var("UPTIME_JOB_TTL_SECS") {
            self.jobs.ttl_secs = val.parse().map_err(|_| {
                RepositoryError::configuration("UPTIME_JOB_TTL_SECS must be an integer")
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Parsed default timezone.
    pub fn default_tz(&self) -> Result<Tz, RepositoryError> {
        self.report.default_timezone.parse::<Tz>().map_err(|_| {
            RepositoryError::configuration_with_context(
                format!(
                    "Invalid default timezone '{}'",
                    self.report.default_timezone
                ),
                ErrorContext::new("load_config").with_entity("report.default_timezone"),
            )
        })
    }

    pub fn job_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.jobs.ttl_secs).unwrap_or(i64::MAX))
    }

    fn validate(&self) -> Result<(), RepositoryError> {
        self.default_tz()?;
        if self.report.max_concurrency == 0 {
            return Err(RepositoryError::configuration(
                "report.max_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}
