#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use store_uptime::api::{BusinessHoursRule, StatusSample, StoreId, StoreStatus, StoreTimezone};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Poll of `store` taken `minutes_before` minutes before `now`.
pub fn poll(
    store: i64,
    now: DateTime<Utc>,
    minutes_before: i64,
    status: StoreStatus,
) -> StatusSample {
    StatusSample {
        store_id: StoreId(store),
        timestamp_utc: now - Duration::minutes(minutes_before),
        status,
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn timezone(store: i64, name: &str) -> StoreTimezone {
    StoreTimezone {
        store_id: StoreId(store),
        timezone_str: name.to_string(),
    }
}

/// The same opening hours on every weekday.
pub fn weekly_hours(
    store: i64,
    start: (u32, u32, u32),
    end: (u32, u32, u32),
) -> Vec<BusinessHoursRule> {
    (0..7)
        .map(|day| BusinessHoursRule {
            store_id: StoreId(store),
            day_of_week: day,
            start_time_local: NaiveTime::from_hms_opt(start.0, start.1, start.2).unwrap(),
            end_time_local: NaiveTime::from_hms_opt(end.0, end.1, end.2).unwrap(),
        })
        .collect()
}
