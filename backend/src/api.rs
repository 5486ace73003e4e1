//! Public API surface for the uptime backend.
//!
//! This file consolidates the data types exchanged with the storage collaborator
//! and the report consumer. All types derive Serialize/Deserialize.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id_type;
pub use crate::models::{TimeWindow, TrailingWindow};

define_id_type!(i64, StoreId);

/// Observed state of a store at poll time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, StoreStatus::Active)
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Active => write!(f, "active"),
            StoreStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for StoreStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown store status: {}", s)),
        }
    }
}

/// One poll result: the store was seen in `status` at `timestamp_utc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSample {
    pub store_id: StoreId,
    pub timestamp_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

/// Local opening hours of a store for one weekday (0 = Monday, 6 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursRule {
    pub store_id: StoreId,
    #[serde(alias = "day")]
    pub day_of_week: u8,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimezone {
    pub store_id: StoreId,
    pub timezone_str: String,
}

/// Active/inactive minutes attributed to one window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UptimeMinutes {
    pub active: f64,
    pub inactive: f64,
}

impl UptimeMinutes {
    pub fn total(&self) -> f64 {
        self.active + self.inactive
    }
}

/// Uptime and downtime of one store over the three trailing windows, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreUptime {
    pub uptime_last_hour: f64,
    pub uptime_last_day: f64,
    pub uptime_last_week: f64,
    pub downtime_last_hour: f64,
    pub downtime_last_day: f64,
    pub downtime_last_week: f64,
}

impl StoreUptime {
    /// Record the integrated minutes for one trailing window.
    pub fn set(&mut self, window: TrailingWindow, minutes: UptimeMinutes) {
        match window {
            TrailingWindow::LastHour => {
                self.uptime_last_hour = minutes.active;
                self.downtime_last_hour = minutes.inactive;
            }
            TrailingWindow::LastDay => {
                self.uptime_last_day = minutes.active;
                self.downtime_last_day = minutes.inactive;
            }
            TrailingWindow::LastWeek => {
                self.uptime_last_week = minutes.active;
                self.downtime_last_week = minutes.inactive;
            }
        }
    }

    pub fn get(&self, window: TrailingWindow) -> UptimeMinutes {
        match window {
            TrailingWindow::LastHour => UptimeMinutes {
                active: self.uptime_last_hour,
                inactive: self.downtime_last_hour,
            },
            TrailingWindow::LastDay => UptimeMinutes {
                active: self.uptime_last_day,
                inactive: self.downtime_last_day,
            },
            TrailingWindow::LastWeek => UptimeMinutes {
                active: self.uptime_last_week,
                inactive: self.downtime_last_week,
            },
        }
    }
}

/// Flat report record. Field order matches the delivery header
/// `store_id, uptime_last_hour, uptime_last_day, uptime_last_week,
/// downtime_last_hour, downtime_last_day, downtime_last_week`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub store_id: StoreId,
    pub uptime_last_hour: f64,
    pub uptime_last_day: f64,
    pub uptime_last_week: f64,
    pub downtime_last_hour: f64,
    pub downtime_last_day: f64,
    pub downtime_last_week: f64,
}

impl ReportRow {
    pub const HEADER: [&'static str; 7] = [
        "store_id",
        "uptime_last_hour",
        "uptime_last_day",
        "uptime_last_week",
        "downtime_last_hour",
        "downtime_last_day",
        "downtime_last_week",
    ];

    pub fn new(store_id: StoreId, uptime: &StoreUptime) -> Self {
        Self {
            store_id,
            uptime_last_hour: uptime.uptime_last_hour,
            uptime_last_day: uptime.uptime_last_day,
            uptime_last_week: uptime.uptime_last_week,
            downtime_last_hour: uptime.downtime_last_hour,
            downtime_last_day: uptime.downtime_last_day,
            downtime_last_week: uptime.downtime_last_week,
        }
    }
}

/// Result of one report generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeReport {
    /// Evaluation instant the trailing windows are anchored at.
    pub generated_at: DateTime<Utc>,
    pub stores: BTreeMap<StoreId, StoreUptime>,
}

impl UptimeReport {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            stores: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn get(&self, store_id: StoreId) -> Option<&StoreUptime> {
        self.stores.get(&store_id)
    }

    /// Rows ordered by store id.
    pub fn to_rows(&self) -> Vec<ReportRow> {
        self.stores
            .iter()
            .map(|(store_id, uptime)| ReportRow::new(*store_id, uptime))
            .collect()
    }
}
