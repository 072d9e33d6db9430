//! Free-text schedule parsing.
//!
//! The recognition endpoint returns schedules like
//! `"9:00-10:00 CSC 510, 10:00-11:00 CSC 508"` or `"Mon 10-12; Tue 8-10 MTH 201"`.
//! Segments are separated by `;` or `,`; inside a segment the first
//! whitespace-delimited token is the time range, the rest is the course.

use crate::defaults::NO_SCHEDULE_SENTINEL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub time_range: String,
    pub course: Option<String>,
}

/// Split a schedule string into entries. Returns an empty list for blank
/// text and for the backend's "no schedule" sentinel.
pub fn parse_schedule(text: &str) -> Vec<ScheduleEntry> {
    let text = text.trim();
    if text.is_empty() || text == NO_SCHEDULE_SENTINEL {
        return Vec::new();
    }

    text.split([';', ','])
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .map(|seg| match seg.split_once(char::is_whitespace) {
            Some((range, course)) => ScheduleEntry {
                time_range: range.to_string(),
                course: Some(course.trim().to_string()),
            },
            None => ScheduleEntry {
                time_range: seg.to_string(),
                course: None,
            },
        })
        .collect()
}
