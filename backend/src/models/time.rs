use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` range of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a new window. An `end` before `start` yields an empty window at `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The window `[now - width, now)`.
    pub fn trailing(now: DateTime<Utc>, width: Duration) -> Self {
        Self::new(now - width, now)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Overlap of two windows, `None` when they do not share any instant.
    pub fn intersect(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end > start {
            Some(TimeWindow { start, end })
        } else {
            None
        }
    }

    pub fn duration(&self) -> Duration {
        if self.is_empty() {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }

    /// Length of the window in (fractional) minutes.
    pub fn minutes(&self) -> f64 {
        let duration = self.duration();
        match duration.num_nanoseconds() {
            Some(nanos) => nanos as f64 / 60_000_000_000.0,
            None => duration.num_milliseconds() as f64 / 60_000.0,
        }
    }
}

/// The three lookback ranges reported for every store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingWindow {
    LastHour,
    LastDay,
    LastWeek,
}

impl TrailingWindow {
    pub const ALL: [TrailingWindow; 3] = [
        TrailingWindow::LastHour,
        TrailingWindow::LastDay,
        TrailingWindow::LastWeek,
    ];

    pub fn width(&self) -> Duration {
        match self {
            TrailingWindow::LastHour => Duration::hours(1),
            TrailingWindow::LastDay => Duration::days(1),
            TrailingWindow::LastWeek => Duration::days(7),
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::trailing(now, self.width())
    }
}

/// Sort windows and coalesce the ones that overlap or touch. Empty windows are dropped.
pub fn merge_windows(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
    windows.retain(|w| !w.is_empty());
    windows.sort_by_key(|w| w.start);

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }
    merged
}
