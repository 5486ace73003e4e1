//! Uptime report aggregation.
//!
//! Drives configuration resolution, business-window translation and interval
//! integration for every known store and all three trailing windows.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::business_window::business_windows_for;
use super::error::ReportResult;
use super::integrator::StatusTimeline;
use super::store_config::{ResolvedStoreConfig, StoreConfigResolver};
use crate::api::{StatusSample, StoreId, StoreUptime, TrailingWindow, UptimeReport};
use crate::config::ReportConfig;
use crate::db::repository::StoreRepository;

/// Compute the six uptime/downtime figures of one store.
///
/// The step-function timeline is built once and clipped against each
/// trailing window and the business windows that fall inside it.
pub fn compute_store_uptime(
    samples: &[StatusSample],
    config: &ResolvedStoreConfig,
    now: DateTime<Utc>,
) -> StoreUptime {
    let timeline = StatusTimeline::build(samples, now);
    let mut uptime = StoreUptime::default();
    if timeline.is_empty() {
        return uptime;
    }

    for trailing in TrailingWindow::ALL {
        let window = trailing.window(now);
        let business_windows = business_windows_for(&window, config);
        uptime.set(trailing, timeline.integrate(&window, &business_windows));
    }
    uptime
}

/// Generates uptime reports from an injected repository.
#[derive(Clone)]
pub struct ReportGenerator {
    repository: Arc<dyn StoreRepository>,
    resolver: StoreConfigResolver,
    max_concurrency: usize,
}

impl ReportGenerator {
    /// Create a generator using the default timezone and concurrency limit of `config`.
    pub fn new(
        repository: Arc<dyn StoreRepository>,
        config: &ReportConfig,
    ) -> ReportResult<Self> {
        let default_timezone = config.default_tz()?;
        Ok(Self::with_resolver(
            repository,
            StoreConfigResolver::new(default_timezone),
            config.report.max_concurrency,
        ))
    }

    pub fn with_resolver(
        repository: Arc<dyn StoreRepository>,
        resolver: StoreConfigResolver,
        max_concurrency: usize,
    ) -> Self {
        Self {
            repository,
            resolver,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Uptime figures of a single store.
    pub async fn store_uptime(
        &self,
        store_id: StoreId,
        now: DateTime<Utc>,
    ) -> ReportResult<StoreUptime> {
        let config = self.resolver.resolve(self.repository.as_ref(), store_id).await;
        let samples = self.fetch_samples(store_id).await?;

        debug!(
            "Store {}: {} samples, timezone {}",
            store_id,
            samples.len(),
            config.timezone.name()
        );
        Ok(compute_store_uptime(&samples, &config, now))
    }

    /// Polls of one store. A retryable failure is retried once.
    async fn fetch_samples(&self, store_id: StoreId) -> ReportResult<Vec<StatusSample>> {
        let samples = match self.repository.fetch_samples(store_id).await {
            Err(e) if e.is_retryable() => {
                debug!("Store {}: retrying fetch_samples after: {}", store_id, e);
                self.repository.fetch_samples(store_id).await
            }
            other => other,
        }
        .map_err(|e| e.with_operation("fetch_samples"))?;
        Ok(samples)
    }

    /// Build the report for every store known to the repository.
    ///
    /// Each store runs as its own task on the runtime, at most
    /// `max_concurrency` at a time. A store whose computation fails (or whose
    /// task panics) is logged and reported with all-zero figures; only a
    /// failure to list the stores aborts the report.
    pub async fn generate_report(&self, now: DateTime<Utc>) -> ReportResult<UptimeReport> {
        let store_ids = self
            .repository
            .list_store_ids()
            .await
            .map_err(|e| e.with_operation("list_store_ids"))?;
        info!(
            "Generating uptime report for {} stores at {} (default timezone {})",
            store_ids.len(),
            now,
            self.resolver.default_timezone().name()
        );

        let mut report = UptimeReport::new(now);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        for store_id in store_ids {
            report.stores.insert(store_id, StoreUptime::default());
            let generator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (store_id, generator.store_uptime(store_id, now).await)
            });
        }

        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((store_id, Ok(uptime))) => {
                    report.stores.insert(store_id, uptime);
                }
                Ok((store_id, Err(e))) => {
                    warn!("Store {}: uptime computation failed: {}", store_id, e);
                    failed += 1;
                }
                Err(e) => {
                    warn!("Store task did not finish: {}", e);
                    failed += 1;
                }
            }
        }

        info!(
            "Uptime report complete: {} stores, {} degraded to zero",
            report.len(),
            failed
        );
        Ok(report)
    }
}
