//! Store configuration resolution.
//!
//! Produces, for one store, the timezone and the seven daily business-hours
//! rules the report works with. Missing data falls back to defaults so
//! resolution always yields a usable configuration.

use chrono::NaiveTime;
use chrono_tz::Tz;
use log::{debug, warn};

use super::error::{ReportError, ReportResult};
use crate::api::{BusinessHoursRule, StoreId};
use crate::db::repository::StoreRepository;

/// Local opening hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRule {
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

impl DailyRule {
    pub fn new(start_time_local: NaiveTime, end_time_local: NaiveTime) -> Self {
        Self {
            start_time_local,
            end_time_local,
        }
    }

    /// `00:00:00`–`23:59:59`, used for weekdays without a rule.
    pub fn full_day() -> Self {
        Self {
            start_time_local: NaiveTime::MIN,
            end_time_local: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        }
    }

    /// A rule whose end does not come after its start covers nothing.
    pub fn is_empty(&self) -> bool {
        self.end_time_local <= self.start_time_local
    }
}

impl From<&BusinessHoursRule> for DailyRule {
    fn from(rule: &BusinessHoursRule) -> Self {
        Self::new(rule.start_time_local, rule.end_time_local)
    }
}

/// Fully resolved configuration of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStoreConfig {
    pub store_id: StoreId,
    pub timezone: Tz,
    /// Indexed by days from Monday (0 = Monday, 6 = Sunday).
    pub rules: [DailyRule; 7],
    /// True when no usable timezone row existed.
    pub timezone_defaulted: bool,
}

impl ResolvedStoreConfig {
    pub fn rule_for(&self, day_of_week: u32) -> DailyRule {
        self.rules[(day_of_week % 7) as usize]
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> ReportResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ReportError::configuration(format!("Unknown timezone '{}'", name)))
}

/// Collapse raw business-hours rows into one rule per weekday.
///
/// Weekdays without a row get [`DailyRule::full_day`]. When a weekday has
/// several rows, the first one in source order is kept. Rows with a weekday
/// outside `0..=6` are ignored.
pub fn resolve_rules(store_id: StoreId, rows: &[BusinessHoursRule]) -> [DailyRule; 7] {
    let mut resolved: [Option<DailyRule>; 7] = [None; 7];

    for row in rows {
        let Some(slot) = resolved.get_mut(row.day_of_week as usize) else {
            warn!(
                "Ignoring business hours for store {} with invalid day {}",
                store_id, row.day_of_week
            );
            continue;
        };
        match slot {
            Some(_) => debug!(
                "Store {} has several business-hours rows for day {}, keeping the first",
                store_id, row.day_of_week
            ),
            None => *slot = Some(DailyRule::from(row)),
        }
    }

    resolved.map(|rule| rule.unwrap_or_else(DailyRule::full_day))
}

/// Resolves store timezone and business hours, applying defaults.
#[derive(Debug, Clone)]
pub struct StoreConfigResolver {
    default_timezone: Tz,
}

impl StoreConfigResolver {
    pub fn new(default_timezone: Tz) -> Self {
        Self { default_timezone }
    }

    pub fn default_timezone(&self) -> Tz {
        self.default_timezone
    }

    /// Pick the timezone for a store.
    ///
    /// Returns the default timezone and `true` when the name is absent or
    /// cannot be parsed. Unparseable names are logged.
    pub fn resolve_timezone(&self, store_id: StoreId, name: Option<&str>) -> (Tz, bool) {
        match name {
            None => (self.default_timezone, true),
            Some(name) => match parse_timezone(name) {
                Ok(tz) => (tz, false),
                Err(e) => {
                    warn!(
                        "Store {}: {}; falling back to {}",
                        store_id,
                        e,
                        self.default_timezone.name()
                    );
                    (self.default_timezone, true)
                }
            },
        }
    }

    /// Resolve from already fetched rows.
    pub fn resolve_from(
        &self,
        store_id: StoreId,
        timezone: Option<&str>,
        rows: &[BusinessHoursRule],
    ) -> ResolvedStoreConfig {
        let (timezone, timezone_defaulted) = self.resolve_timezone(store_id, timezone);
        ResolvedStoreConfig {
            store_id,
            timezone,
            rules: resolve_rules(store_id, rows),
            timezone_defaulted,
        }
    }

    /// Fetch and resolve the configuration of one store.
    ///
    /// Storage failures while fetching configuration are logged and treated
    /// as missing data, so this never fails.
    pub async fn resolve(
        &self,
        repository: &dyn StoreRepository,
        store_id: StoreId,
    ) -> ResolvedStoreConfig {
        let timezone = repository
            .fetch_timezone(store_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Store {}: failed to fetch timezone: {}", store_id, e);
                None
            });
        let rows = repository
            .fetch_business_hours(store_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Store {}: failed to fetch business hours: {}", store_id, e);
                Vec::new()
            });

        self.resolve_from(store_id, timezone.as_deref(), &rows)
    }
}

impl Default for StoreConfigResolver {
    fn default() -> Self {
        Self::new(chrono_tz::America::Chicago)
    }
}
