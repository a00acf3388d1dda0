use chrono::NaiveDate;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::conflict::TimeRange;
use crate::models::schedule::{ClockTime, ScheduledItem};

/// Half-open overlap: ranges that only touch at an endpoint do not overlap.
pub fn time_ranges_overlap(
    a_start: ClockTime,
    a_end: ClockTime,
    b_start: ClockTime,
    b_end: ClockTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn overlap_range(
    a_start: ClockTime,
    a_end: ClockTime,
    b_start: ClockTime,
    b_end: ClockTime,
) -> Option<TimeRange> {
    if !time_ranges_overlap(a_start, a_end, b_start, b_end) {
        return None;
    }
    Some(TimeRange {
        start: a_start.max(b_start),
        end: a_end.min(b_end),
    })
}

pub fn items_overlap(a: &ScheduledItem, b: &ScheduledItem) -> bool {
    if a.date != b.date {
        return false;
    }
    time_ranges_overlap(a.start_time, a.end_time, b.start_time, b.end_time)
}

pub fn item_overlap_range(a: &ScheduledItem, b: &ScheduledItem) -> Option<TimeRange> {
    if a.date != b.date {
        return None;
    }
    overlap_range(a.start_time, a.end_time, b.start_time, b.end_time)
}

/// Strict zero-padded "HH:MM"; "24:00" is accepted as end of day.
pub fn parse_clock_time(value: &str) -> AppResult<ClockTime> {
    value.parse::<ClockTime>().map_err(|err| {
        AppError::validation_with_details(
            "invalid time format",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        AppError::validation_with_details(
            "invalid date format",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}
