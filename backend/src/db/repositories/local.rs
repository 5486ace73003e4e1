//! In-memory local repository implementation.
//!
//! This module provides a local implementation of [`StoreRepository`]
//! suitable for unit testing, local runs and snapshot replays. All data is stored
//! in memory, giving fast, deterministic, and isolated execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::api::{BusinessHoursRule, StatusSample, StoreId, StoreTimezone};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, StoreRepository};

/// Serialized form of the three input tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub statuses: Vec<StatusSample>,
    #[serde(default)]
    pub business_hours: Vec<BusinessHoursRule>,
    #[serde(default)]
    pub timezones: Vec<StoreTimezone>,
}

impl StoreSnapshot {
    /// Reject business-hours rows whose weekday is outside `0..=6`.
    pub fn validate(&self) -> RepositoryResult<()> {
        match self.business_hours.iter().find(|rule| rule.day_of_week > 6) {
            Some(rule) => Err(RepositoryError::validation_with_context(
                format!("Invalid day of week {}", rule.day_of_week),
                ErrorContext::new("load_snapshot")
                    .with_entity("store_hours")
                    .with_entity_id(rule.store_id),
            )),
            None => Ok(()),
        }
    }
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use store_uptime::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.sample_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    samples: HashMap<StoreId, Vec<StatusSample>>,
    business_hours: HashMap<StoreId, Vec<BusinessHoursRule>>,
    timezones: HashMap<StoreId, String>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            samples: HashMap::new(),
            business_hours: HashMap::new(),
            timezones: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-populated with a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let repo = Self::new();
        repo.insert_samples(snapshot.statuses);
        repo.insert_business_hours(snapshot.business_hours);
        repo.insert_timezones(snapshot.timezones);
        repo
    }

    /// Parse a JSON snapshot, validate it and load it.
    pub fn from_snapshot_json(json: &str) -> RepositoryResult<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(json).map_err(|e| {
            RepositoryError::validation_with_context(
                format!("Failed to parse store snapshot: {}", e),
                ErrorContext::new("load_snapshot"),
            )
        })?;
        snapshot.validate()?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Read a JSON snapshot file and load it.
    pub fn from_snapshot_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration_with_context(
                format!("Failed to read snapshot file: {}", e),
                ErrorContext::new("load_snapshot").with_details(path.display().to_string()),
            )
        })?;
        Self::from_snapshot_json(&content)
    }

    /// Append status polls. Per-store ordering by timestamp is maintained,
    /// ties keep insertion order.
    pub fn insert_samples(&self, samples: impl IntoIterator<Item = StatusSample>) {
        let mut data = self.data.write();
        let mut touched = BTreeSet::new();
        for sample in samples {
            touched.insert(sample.store_id);
            data.samples.entry(sample.store_id).or_default().push(sample);
        }
        for store_id in touched {
            if let Some(store_samples) = data.samples.get_mut(&store_id) {
                store_samples.sort_by_key(|s| s.timestamp_utc);
            }
        }
    }

    /// Append business-hours rows.
    pub fn insert_business_hours(&self, rules: impl IntoIterator<Item = BusinessHoursRule>) {
        let mut data = self.data.write();
        for rule in rules {
            data.business_hours.entry(rule.store_id).or_default().push(rule);
        }
    }

    /// Insert timezone rows. A later row for the same store replaces the earlier one.
    pub fn insert_timezones(&self, timezones: impl IntoIterator<Item = StoreTimezone>) {
        let mut data = self.data.write();
        for tz in timezones {
            data.timezones.insert(tz.store_id, tz.timezone_str);
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Total number of stored status polls.
    pub fn sample_count(&self) -> usize {
        self.data.read().samples.values().map(Vec::len).sum()
    }

    /// Timestamp of the most recent poll across all stores.
    pub fn latest_sample_timestamp(&self) -> Option<DateTime<Utc>> {
        self.data
            .read()
            .samples
            .values()
            .filter_map(|samples| samples.last())
            .map(|s| s.timestamp_utc)
            .max()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Store repository is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.check_health("list_store_ids")?;
        let data = self.data.read();
        let ids: BTreeSet<StoreId> = data
            .samples
            .keys()
            .chain(data.business_hours.keys())
            .chain(data.timezones.keys())
            .copied()
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn fetch_samples(&self, store_id: StoreId) -> RepositoryResult<Vec<StatusSample>> {
        self.check_health("fetch_samples")?;
        Ok(self
            .data
            .read()
            .samples
            .get(&store_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_business_hours(
        &self,
        store_id: StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>> {
        self.check_health("fetch_business_hours")?;
        Ok(self
            .data
            .read()
            .business_hours
            .get(&store_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>> {
        self.check_health("fetch_timezone")?;
        Ok(self.data.read().timezones.get(&store_id).cloned())
    }
}
