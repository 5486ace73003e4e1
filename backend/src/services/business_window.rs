//! Business-window translation.
//!
//! Turns a store's local opening hours into UTC instant ranges, one per local
//! calendar day, taking daylight-saving transitions into account.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use super::store_config::{DailyRule, ResolvedStoreConfig};
use crate::models::{merge_windows, TimeWindow};

/// Which side of a window a local time bounds. Decides how ambiguous local
/// times (repeated hour at DST end) are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Convert a local wall-clock time to a UTC instant.
///
/// Ambiguous times resolve to the earliest instant for a start and the latest
/// for an end. Times inside a spring-forward gap are read with the offset in
/// effect before the transition, which moves them forward by the gap length.
fn local_to_utc(tz: Tz, local: NaiveDateTime, bound: Bound) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, latest) => match bound {
            Bound::Start => earliest.with_timezone(&Utc),
            Bound::End => latest.with_timezone(&Utc),
        },
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    }
}

/// UTC range covered by `rule` on the local calendar `date` in `tz`.
///
/// The range is empty when the rule's end is not after its start; rules never
/// wrap past midnight.
pub fn translate(date: NaiveDate, rule: DailyRule, tz: Tz) -> TimeWindow {
    let start = local_to_utc(tz, date.and_time(rule.start_time_local), Bound::Start);
    if rule.is_empty() {
        return TimeWindow::new(start, start);
    }
    let end = local_to_utc(tz, date.and_time(rule.end_time_local), Bound::End);
    TimeWindow::new(start, end)
}

/// Business windows of a store clipped to `window`, sorted and non-overlapping.
///
/// Every local date the window touches is considered, plus one day of margin
/// on each side so that rules of neighbouring days shifted by the UTC offset
/// are not missed.
pub fn business_windows_for(
    window: &TimeWindow,
    config: &ResolvedStoreConfig,
) -> Vec<TimeWindow> {
    if window.is_empty() {
        return Vec::new();
    }

    let tz = config.timezone;
    let first = window.start.with_timezone(&tz).date_naive() - Duration::days(1);
    let last = window.end.with_timezone(&tz).date_naive() + Duration::days(1);

    let mut windows = Vec::new();
    let mut date = first;
    while date <= last {
        let rule = config.rule_for(date.weekday().num_days_from_monday());
        if let Some(clipped) = translate(date, rule, tz).intersect(window) {
            windows.push(clipped);
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    merge_windows(windows)
}

/// Total business minutes inside `window`.
pub fn business_minutes(window: &TimeWindow, config: &ResolvedStoreConfig) -> f64 {
    business_windows_for(window, config)
        .iter()
        .map(TimeWindow::minutes)
        .sum()
}
