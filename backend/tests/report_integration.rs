//! End-to-end report generation against the in-memory repository.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use store_uptime::api::{
    BusinessHoursRule, ReportRow, StatusSample, StoreId, StoreStatus, StoreUptime,
};
use store_uptime::config::ReportConfig;
use store_uptime::db::{
    LocalRepository, RepositoryError, RepositoryResult, StoreRepository, StoreSnapshot,
};
use store_uptime::services::{
    trigger_report, wait_for_report, JobStatus, JobTracker, ReportGenerator,
};
use support::{poll, timezone, utc, weekly_hours};

use StoreStatus::{Active, Inactive};

fn generator(repo: impl StoreRepository + 'static) -> ReportGenerator {
    ReportGenerator::new(Arc::new(repo), &ReportConfig::default()).unwrap()
}

fn noon() -> DateTime<Utc> {
    utc(2023, 1, 25, 12, 0)
}

fn scenario_polls(store: i64, now: DateTime<Utc>) -> Vec<StatusSample> {
    vec![
        poll(store, now, 90, Active),
        poll(store, now, 40, Inactive),
        poll(store, now, 5, Active),
    ]
}

#[tokio::test]
async fn test_last_hour_uptime_from_three_polls() {
    let repo = LocalRepository::new();
    repo.insert_samples(scenario_polls(1, noon()));
    repo.insert_timezones([timezone(1, "UTC")]);

    let report = generator(repo).generate_report(noon()).await.unwrap();
    let uptime = report.get(StoreId(1)).unwrap();

    assert_eq!(uptime.uptime_last_hour, 25.0);
    assert_eq!(uptime.downtime_last_hour, 35.0);
    // Nothing is attributed before the first poll.
    assert_eq!(uptime.uptime_last_day, 55.0);
    assert_eq!(uptime.downtime_last_day, 35.0);
    assert_eq!(uptime.uptime_last_week, 55.0);
    assert_eq!(uptime.downtime_last_week, 35.0);
}

#[tokio::test]
async fn test_single_poll_reports_zero() {
    let repo = LocalRepository::new();
    repo.insert_samples([poll(7, noon(), 30, Active)]);

    let report = generator(repo).generate_report(noon()).await.unwrap();
    assert_eq!(report.get(StoreId(7)), Some(&StoreUptime::default()));
}

#[tokio::test]
async fn test_missing_hours_equal_explicit_full_day() {
    let repo = LocalRepository::new();
    let polls = |store| {
        vec![
            poll(store, noon(), 3 * 24 * 60, Active),
            poll(store, noon(), 26 * 60, Inactive),
            poll(store, noon(), 20 * 60, Active),
            poll(store, noon(), 30, Inactive),
        ]
    };
    repo.insert_samples(polls(1));
    repo.insert_samples(polls(2));
    repo.insert_timezones([timezone(1, "America/New_York"), timezone(2, "America/New_York")]);
    repo.insert_business_hours(weekly_hours(2, (0, 0, 0), (23, 59, 59)));

    let report = generator(repo).generate_report(noon()).await.unwrap();
    assert_eq!(report.get(StoreId(1)), report.get(StoreId(2)));
    assert!(report.get(StoreId(1)).unwrap().uptime_last_week > 0.0);
}

#[tokio::test]
async fn test_malformed_timezone_uses_default() {
    let repo = LocalRepository::new();
    for store in 1..=3 {
        repo.insert_samples(scenario_polls(store, noon()));
        repo.insert_samples([poll(store, noon(), 10 * 60, Inactive)]);
        repo.insert_business_hours(weekly_hours(store, (4, 0, 0), (6, 0, 0)));
    }
    repo.insert_timezones([timezone(1, "Not/AZone"), timezone(3, "America/Chicago")]);

    let report = generator(repo).generate_report(noon()).await.unwrap();
    let defaulted = report.get(StoreId(2)).unwrap();
    assert_eq!(report.get(StoreId(1)).unwrap(), defaulted);
    assert_eq!(report.get(StoreId(3)).unwrap(), defaulted);
    // 04:00-06:00 Chicago is 10:00-12:00 UTC in January.
    assert_eq!(defaulted.uptime_last_hour, 25.0);
    assert_eq!(defaulted.downtime_last_hour, 35.0);
    assert_eq!(defaulted.downtime_last_day, 30.0 + 35.0);
}

#[tokio::test]
async fn test_business_hours_across_spring_forward() {
    // 2023-03-12 is the spring-forward Sunday in Chicago.
    let now = utc(2023, 3, 13, 0, 0);
    let repo = LocalRepository::new();
    repo.insert_samples([
        StatusSample {
            store_id: StoreId(5),
            timestamp_utc: utc(2023, 3, 12, 13, 0),
            status: Active,
        },
        StatusSample {
            store_id: StoreId(5),
            timestamp_utc: utc(2023, 3, 12, 20, 0),
            status: Inactive,
        },
    ]);
    repo.insert_timezones([timezone(5, "America/Chicago")]);
    repo.insert_business_hours(weekly_hours(5, (9, 0, 0), (17, 0, 0)));

    let report = generator(repo).generate_report(now).await.unwrap();
    let uptime = report.get(StoreId(5)).unwrap();

    // Open 14:00-22:00 UTC under CDT.
    assert_eq!(uptime.uptime_last_day, 360.0);
    assert_eq!(uptime.downtime_last_day, 120.0);
    assert_eq!(uptime.uptime_last_week, 360.0);
    assert_eq!(uptime.downtime_last_week, 120.0);
    assert_eq!(uptime.uptime_last_hour, 0.0);
    assert_eq!(uptime.downtime_last_hour, 0.0);
}

#[tokio::test]
async fn test_stores_without_polls_are_listed() {
    let repo = LocalRepository::new();
    repo.insert_samples(scenario_polls(1, noon()));
    repo.insert_timezones([timezone(2, "Asia/Tokyo")]);
    repo.insert_business_hours(weekly_hours(3, (9, 0, 0), (17, 0, 0)));

    let report = generator(repo).generate_report(noon()).await.unwrap();
    let ids: Vec<StoreId> = report.to_rows().iter().map(|row| row.store_id).collect();

    assert_eq!(ids, vec![StoreId(1), StoreId(2), StoreId(3)]);
    assert_eq!(report.get(StoreId(2)), Some(&StoreUptime::default()));
    assert_eq!(report.get(StoreId(3)), Some(&StoreUptime::default()));
}

#[tokio::test]
async fn test_snapshot_json_round_trip_into_report() {
    let json = r#"{
        "statuses": [
            {"store_id": 9, "timestamp_utc": "2023-01-25T10:30:00Z", "status": "active"},
            {"store_id": 9, "timestamp_utc": "2023-01-25T11:20:00Z", "status": "inactive"},
            {"store_id": 9, "timestamp_utc": "2023-01-25T11:55:00Z", "status": "active"}
        ],
        "business_hours": [],
        "timezones": [{"store_id": 9, "timezone_str": "UTC"}]
    }"#;
    let repo = LocalRepository::from_snapshot_json(json).unwrap();

    let report = generator(repo).generate_report(noon()).await.unwrap();
    let rows: Vec<ReportRow> = report.to_rows();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].uptime_last_hour, 25.0);
    assert_eq!(rows[0].downtime_last_hour, 35.0);
}

/// Repository whose sample lookups for one store fail `failures` times, or
/// panic when `panics` is set.
struct FlakyRepository {
    inner: LocalRepository,
    broken: StoreId,
    failures: AtomicUsize,
    panics: bool,
}

impl FlakyRepository {
    fn new(inner: LocalRepository, broken: i64, failures: usize) -> Self {
        Self {
            inner,
            broken: StoreId(broken),
            failures: AtomicUsize::new(failures),
            panics: false,
        }
    }

    fn should_fail(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl StoreRepository for FlakyRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn list_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.inner.list_store_ids().await
    }

    async fn fetch_samples(&self, store_id: StoreId) -> RepositoryResult<Vec<StatusSample>> {
        if store_id == self.broken {
            if self.panics {
                panic!("status table corrupted for store {}", store_id);
            }
            if self.should_fail() {
                return Err(RepositoryError::connection("status table unavailable"));
            }
        }
        self.inner.fetch_samples(store_id).await
    }

    async fn fetch_business_hours(
        &self,
        store_id: StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>> {
        self.inner.fetch_business_hours(store_id).await
    }

    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>> {
        self.inner.fetch_timezone(store_id).await
    }
}

fn four_utc_stores() -> LocalRepository {
    let repo = LocalRepository::new();
    for store in 1..=4 {
        repo.insert_samples(scenario_polls(store, noon()));
        repo.insert_timezones([timezone(store, "UTC")]);
    }
    repo
}

#[tokio::test]
async fn test_failing_store_does_not_abort_report() {
    let repo = FlakyRepository::new(four_utc_stores(), 3, usize::MAX);

    let report = generator(repo).generate_report(noon()).await.unwrap();

    assert_eq!(report.len(), 4);
    assert_eq!(report.get(StoreId(3)), Some(&StoreUptime::default()));
    for store in [1, 2, 4] {
        assert_eq!(report.get(StoreId(store)).unwrap().uptime_last_hour, 25.0);
    }
}

#[tokio::test]
async fn test_transient_sample_failure_is_retried() {
    let repo = FlakyRepository::new(four_utc_stores(), 2, 1);

    let report = generator(repo).generate_report(noon()).await.unwrap();

    for store in 1..=4 {
        assert_eq!(report.get(StoreId(store)).unwrap().uptime_last_hour, 25.0);
    }
}

#[tokio::test]
async fn test_panicking_store_keeps_zero_row() {
    let mut repo = FlakyRepository::new(four_utc_stores(), 4, 0);
    repo.panics = true;

    let report = generator(repo).generate_report(noon()).await.unwrap();

    assert_eq!(report.len(), 4);
    assert_eq!(report.get(StoreId(4)), Some(&StoreUptime::default()));
    assert_eq!(report.get(StoreId(1)).unwrap().downtime_last_hour, 35.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_stores_with_bounded_concurrency() {
    let repo = LocalRepository::new();
    for store in 1..=200 {
        repo.insert_samples(scenario_polls(store, noon()));
        repo.insert_timezones([timezone(store, "UTC")]);
    }
    let mut config = ReportConfig::default();
    config.report.max_concurrency = 3;
    let generator = ReportGenerator::new(Arc::new(repo), &config).unwrap();

    let report = generator.generate_report(noon()).await.unwrap();

    assert_eq!(report.len(), 200);
    assert!(report
        .to_rows()
        .iter()
        .all(|row| row.uptime_last_hour == 25.0 && row.downtime_last_hour == 35.0));
}

#[tokio::test]
async fn test_unreachable_repository_fails_report() {
    let repo = LocalRepository::from_snapshot(StoreSnapshot::default());
    repo.set_healthy(false);

    let result = generator(repo).generate_report(noon()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_report_job_flow() {
    let repo = LocalRepository::new();
    repo.insert_samples(scenario_polls(1, noon()));
    repo.insert_timezones([timezone(1, "UTC")]);
    let tracker = JobTracker::default();

    let job_id = trigger_report(generator(repo), &tracker, noon());
    let report = wait_for_report(&tracker, &job_id, StdDuration::from_millis(5))
        .await
        .expect("report should complete");

    assert_eq!(tracker.status(&job_id), Some(JobStatus::Complete));
    assert_eq!(report.generated_at, noon());
    assert_eq!(report.get(StoreId(1)).unwrap().downtime_last_hour, 35.0);
    assert!(!tracker.get_logs(&job_id).is_empty());
}

#[tokio::test]
async fn test_failed_job_has_no_report() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    let tracker = JobTracker::default();

    let job_id = trigger_report(generator(repo), &tracker, noon());
    let report = wait_for_report(&tracker, &job_id, StdDuration::from_millis(5)).await;

    assert!(report.is_none());
    assert_eq!(tracker.status(&job_id), Some(JobStatus::Failed));
    assert!(tracker.get_job(&job_id).unwrap().error.is_some());
}
