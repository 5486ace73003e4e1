//! Store repository trait for the three read-only input tables.
//!
//! The report pipeline never writes through this trait: status polls,
//! business hours and timezones are appended by the ingestion side and only
//! read here.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{BusinessHoursRule, StatusSample, StoreId};

/// Repository trait for store status, business hours and timezone lookups.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one instance can be shared by all
/// report workers.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List every store id appearing in any of the three tables.
    ///
    /// # Returns
    /// * `Ok(Vec<StoreId>)` - Distinct ids in ascending order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn list_store_ids(&self) -> RepositoryResult<Vec<StoreId>>;

    /// Fetch all status polls of a store, ordered by timestamp.
    ///
    /// Samples sharing a timestamp keep their insertion order.
    ///
    /// # Arguments
    /// * `store_id` - The store to fetch
    ///
    /// # Returns
    /// * `Ok(Vec<StatusSample>)` - Possibly empty, ascending by `timestamp_utc`
    /// * `Err(RepositoryError)` - If the operation fails
    async fn fetch_samples(&self, store_id: StoreId) -> RepositoryResult<Vec<StatusSample>>;

    /// Fetch the business-hours rows of a store (may be empty).
    async fn fetch_business_hours(
        &self,
        store_id: StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>>;

    /// Fetch the IANA timezone name of a store, `None` when no row exists.
    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>>;
}
