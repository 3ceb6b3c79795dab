//! Schedule display formatting.
//!
//! Class schedules arrive from the backend in one of two shapes: a flat list
//! of slots, or a per-day object of `{selected, ranges}` entries. Both
//! normalize to the same [`DaySchedule`] list in Monday-to-Sunday order.
//! Malformed input degrades to an empty list; nothing here returns an error.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Canonical display order.
pub const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

/// One recurring class slot.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ScheduleSlot {
    #[serde(alias = "dayOfWeek", alias = "day")]
    pub day_of_week: String,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Availability for one weekday in the per-day shape.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DaySelection {
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

/// Display row: a weekday and its formatted time ranges.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: String,
    pub times: Vec<String>,
}

/// Position of a weekday in [`WEEKDAYS`]. Accepts full or three-letter
/// names in any case.
#[must_use]
pub fn weekday_index(name: &str) -> Option<usize> {
    let name = name.trim().to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    WEEKDAYS.iter().position(|day| {
        let day = day.to_ascii_lowercase();
        name == day || name == day[..3]
    })
}

/// `"HH:MM"` or `"HH:MM:SS"` (24h) to `"H:MM AM"`.
#[must_use]
pub fn format_time(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hour = parse_field(parts.next()?, 1, 23)?;
    let minute = parse_field(parts.next()?, 2, 59)?;
    if let Some(second) = parts.next() {
        parse_field(second, 2, 59)?;
    }
    if parts.next().is_some() {
        return None;
    }

    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{hour12}:{minute:02} {suffix}"))
}

/// Digits only, `min_len..=2` wide, at most `max`.
fn parse_field(field: &str, min_len: usize, max: u8) -> Option<u8> {
    if !(min_len..=2).contains(&field.len()) || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u8>().ok().filter(|v| *v <= max)
}

#[must_use]
pub fn format_time_range(start: &str, end: &str) -> Option<String> {
    Some(format!("{} - {}", format_time(start)?, format_time(end)?))
}

/// Group a flat slot list by weekday.
///
/// Slots with an unknown day or an unparseable time are skipped. Within a
/// day, ranges keep their input order.
#[must_use]
pub fn format_slots(slots: &[ScheduleSlot]) -> Vec<DaySchedule> {
    let mut days: [Vec<String>; 7] = Default::default();
    for slot in slots {
        let Some(index) = weekday_index(&slot.day_of_week) else {
            debug!(day = %slot.day_of_week, "skipping slot with unknown weekday");
            continue;
        };
        let Some(mut range) = format_time_range(&slot.start_time, &slot.end_time) else {
            debug!(start = %slot.start_time, end = %slot.end_time, "skipping slot with bad time");
            continue;
        };
        if let Some(location) = slot.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            range.push_str(&format!(" ({location})"));
        }
        days[index].push(range);
    }
    collect_days(days)
}

/// Format the per-day shape, dropping unselected days.
#[must_use]
pub fn format_weekly(weekly: &BTreeMap<String, DaySelection>) -> Vec<DaySchedule> {
    let mut days: [Vec<String>; 7] = Default::default();
    for (name, selection) in weekly {
        if !selection.selected {
            continue;
        }
        let Some(index) = weekday_index(name) else {
            debug!(day = %name, "skipping unknown weekday key");
            continue;
        };
        days[index].extend(selection.ranges.iter().filter_map(|r| format_time_range(&r.start, &r.end)));
    }
    collect_days(days)
}

fn collect_days(days: [Vec<String>; 7]) -> Vec<DaySchedule> {
    WEEKDAYS
        .iter()
        .zip(days)
        .filter(|(_, times)| !times.is_empty())
        .map(|(day, times)| DaySchedule { day: (*day).to_owned(), times })
        .collect()
}

/// Format either schedule shape. A JSON string is decoded once and then
/// formatted; anything else malformed yields an empty list.
#[must_use]
pub fn format_schedule(value: &Value) -> Vec<DaySchedule> {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(inner @ (Value::Array(_) | Value::Object(_))) => format_shape(&inner),
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(error = %e, "schedule string is not JSON");
                Vec::new()
            }
        },
        other => format_shape(other),
    }
}

/// [`format_schedule`] over raw JSON text.
#[must_use]
pub fn format_schedule_str(raw: &str) -> Vec<DaySchedule> {
    format_schedule(&Value::String(raw.to_owned()))
}

fn format_shape(value: &Value) -> Vec<DaySchedule> {
    match value {
        Value::Array(_) => match Vec::<ScheduleSlot>::deserialize(value) {
            Ok(slots) => format_slots(&slots),
            Err(e) => {
                debug!(error = %e, "malformed slot list");
                Vec::new()
            }
        },
        Value::Object(_) => match BTreeMap::<String, DaySelection>::deserialize(value) {
            Ok(weekly) => format_weekly(&weekly),
            Err(e) => {
                debug!(error = %e, "malformed weekly schedule");
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}
