//! Interval integration of sparse status polls.
//!
//! Status is treated as a step function: each poll's status holds until the
//! next poll, and the last poll's status holds until the evaluation instant.
//! Nothing is attributed before the first poll. The resulting intervals are
//! clipped to a trailing window and to the store's business windows, and the
//! overlap is summed into active and inactive minutes.

use chrono::{DateTime, Utc};

use crate::api::{StatusSample, StoreStatus, UptimeMinutes};
use crate::models::{merge_windows, TimeWindow};

/// A span of time during which the store is assumed to be in `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInterval {
    pub window: TimeWindow,
    pub status: StoreStatus,
}

/// Step-function timeline built from one store's polls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTimeline {
    intervals: Vec<StatusInterval>,
}

impl StatusTimeline {
    /// Build the timeline from polls in any order.
    ///
    /// Polls are sorted by timestamp (stable, so the later of two polls with
    /// the same timestamp wins). Fewer than two polls give an empty timeline.
    pub fn build(samples: &[StatusSample], now: DateTime<Utc>) -> Self {
        if samples.len() < 2 {
            return Self::default();
        }

        let mut ordered: Vec<(DateTime<Utc>, StoreStatus)> = samples
            .iter()
            .map(|s| (s.timestamp_utc, s.status))
            .collect();
        ordered.sort_by_key(|(ts, _)| *ts);

        let mut intervals: Vec<StatusInterval> = ordered
            .windows(2)
            .map(|pair| StatusInterval {
                window: TimeWindow::new(pair[0].0, pair[1].0),
                status: pair[0].1,
            })
            .collect();

        if let Some(&(last_ts, last_status)) = ordered.last() {
            // Polls stamped after `now` produce an empty tail.
            intervals.push(StatusInterval {
                window: TimeWindow::new(last_ts, now),
                status: last_status,
            });
        }

        intervals.retain(|i| !i.window.is_empty());
        Self { intervals }
    }

    pub fn intervals(&self) -> &[StatusInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sum the timeline inside `window ∩ business_windows`.
    ///
    /// `business_windows` must be sorted and non-overlapping, as returned by
    /// [`merge_windows`].
    pub fn integrate(
        &self,
        window: &TimeWindow,
        business_windows: &[TimeWindow],
    ) -> UptimeMinutes {
        let mut minutes = UptimeMinutes::default();
        let mut first_open = 0;

        for interval in &self.intervals {
            let Some(overlap) = interval.window.intersect(window) else {
                continue;
            };

            while first_open < business_windows.len()
                && business_windows[first_open].end <= overlap.start
            {
                first_open += 1;
            }

            let covered: f64 = business_windows[first_open..]
                .iter()
                .take_while(|bw| bw.start < overlap.end)
                .filter_map(|bw| overlap.intersect(bw))
                .map(|w| w.minutes())
                .sum();

            if interval.status.is_active() {
                minutes.active += covered.max(0.0);
            } else {
                minutes.inactive += covered.max(0.0);
            }
        }

        minutes
    }
}

/// Active and inactive minutes of `samples` inside `window`, restricted to
/// `business_windows`, with the last poll extended to `now`.
pub fn integrate(
    samples: &[StatusSample],
    window: &TimeWindow,
    business_windows: &[TimeWindow],
    now: DateTime<Utc>,
) -> UptimeMinutes {
    let business_windows = merge_windows(business_windows.to_vec());
    StatusTimeline::build(samples, now).integrate(window, &business_windows)
}
