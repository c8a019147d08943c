//! Deadline parsing and urgency classification.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Deadlines closer than this (inclusive) are flagged as [`Urgency::Warning`].
pub const WARNING_WINDOW_HOURS: i64 = 24;

/// A deadline decoded from a `DD-MM-YYYY HH:MM` cell, in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParsedDeadline(NaiveDateTime);

impl ParsedDeadline {
    /// Builds a deadline from calendar components, `month` being 1-based.
    ///
    /// Out-of-range components are rejected, never rolled over into the next
    /// month or day.
    pub fn from_components(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Option<Self> {
        let instant = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        let deadline = Self(instant);
        deadline
            .matches(year, month, day, hour, minute)
            .then_some(deadline)
    }

    pub fn instant(&self) -> NaiveDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    fn matches(&self, year: i32, month: u32, day: u32, hour: u32, minute: u32) -> bool {
        self.year() == year
            && self.month() == month
            && self.day() == day
            && self.hour() == hour
            && self.minute() == minute
    }
}

/// Urgency of a deadline relative to the moment it was evaluated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Upcoming,
    Warning,
    Overdue,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Upcoming, Urgency::Warning, Urgency::Overdue];

    /// Marker class carried by every cell annotated with this urgency.
    pub fn css_class(self) -> &'static str {
        match self {
            Urgency::Upcoming => "status-upcoming",
            Urgency::Warning => "status-warning",
            Urgency::Overdue => "status-overdue",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Urgency::Upcoming => "Upcoming",
            Urgency::Warning => "Due within 24 hours",
            Urgency::Overdue => "Overdue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Upcoming => "upcoming",
            Urgency::Warning => "warning",
            Urgency::Overdue => "overdue",
        }
    }
}

/// Urgency plus the signed delta (`deadline - now`) it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineStatus {
    pub urgency: Urgency,
    pub delta: Duration,
}

/// Parses `DD-MM-YYYY HH:MM`. Fields may be separated by `-`, space or `:`;
/// anything past the fifth field is ignored.
pub fn parse_timestamp(text: &str) -> Option<ParsedDeadline> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let fields: Vec<&str> = text.split(['-', ' ', ':']).collect();
    if fields.len() < 5 {
        log::warn!("invalid deadline format: {text:?}");
        return None;
    }

    let day = fields[0].parse::<u32>().ok();
    let month = fields[1].parse::<u32>().ok();
    let year = fields[2].parse::<i32>().ok();
    let hour = fields[3].parse::<u32>().ok();
    let minute = fields[4].parse::<u32>().ok();

    let (Some(day), Some(month), Some(year), Some(hour), Some(minute)) =
        (day, month, year, hour, minute)
    else {
        log::warn!("invalid deadline components: {text:?}");
        return None;
    };

    let deadline = ParsedDeadline::from_components(year, month, day, hour, minute);
    if deadline.is_none() {
        log::warn!("deadline is not a calendar instant: {text:?}");
    }
    deadline
}

/// Three-way partition of `deadline - now`; the 24 hour boundary is a warning.
pub fn classify(deadline: NaiveDateTime, now: NaiveDateTime) -> DeadlineStatus {
    let delta = deadline.signed_duration_since(now);
    let urgency = if delta < Duration::zero() {
        Urgency::Overdue
    } else if delta <= Duration::hours(WARNING_WINDOW_HOURS) {
        Urgency::Warning
    } else {
        Urgency::Upcoming
    };
    DeadlineStatus { urgency, delta }
}

/// Tooltip text describing how far away the deadline is. Components are
/// truncated, never rounded.
pub fn format_remaining(deadline: NaiveDateTime, now: NaiveDateTime) -> String {
    let delta = deadline.signed_duration_since(now);
    if delta < Duration::zero() {
        let overdue = delta.abs();
        format!(
            "Overdue by: {}d {}h",
            overdue.num_days(),
            overdue.num_hours() % 24
        )
    } else {
        format!(
            "Time remaining: {}d {}h {}m",
            delta.num_days(),
            delta.num_hours() % 24,
            delta.num_minutes() % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, month: u32, year: i32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn parses_portal_format() {
        let deadline = parse_timestamp("05-03-2024 14:30").unwrap();
        assert_eq!(
            (deadline.day(), deadline.month(), deadline.year()),
            (5, 3, 2024)
        );
        assert_eq!((deadline.hour(), deadline.minute()), (14, 30));
    }

    #[test]
    fn trailing_fields_are_ignored() {
        let deadline = parse_timestamp("  05-03-2024 14:30:59 ").unwrap();
        assert_eq!(deadline.instant(), at(5, 3, 2024, 14, 30, 0));
    }

    #[test]
    fn rejects_impossible_dates_instead_of_rolling_over() {
        assert_eq!(parse_timestamp("31-04-2024 10:00"), None);
        assert_eq!(parse_timestamp("29-02-2023 10:00"), None);
        assert_eq!(parse_timestamp("10-13-2024 10:00"), None);
        assert_eq!(parse_timestamp("10-12-2024 24:00"), None);
        assert_eq!(parse_timestamp("10-12-2024 23:60"), None);
        assert!(parse_timestamp("29-02-2024 10:00").is_some());
    }

    #[test]
    fn rejects_empty_and_malformed_text() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("garbage"), None);
        assert_eq!(parse_timestamp("05-03-2024"), None);
        assert_eq!(parse_timestamp("05-03-2024  14:30"), None);
        assert_eq!(parse_timestamp("aa-03-2024 14:30"), None);
    }

    #[test]
    fn warning_boundary_is_inclusive() {
        let now = at(1, 1, 2024, 12, 0, 0);
        let exactly = at(2, 1, 2024, 12, 0, 0);
        let just_after = at(2, 1, 2024, 12, 0, 1);
        let just_before_now = at(1, 1, 2024, 11, 59, 59);

        assert_eq!(classify(exactly, now).urgency, Urgency::Warning);
        assert_eq!(classify(just_after, now).urgency, Urgency::Upcoming);
        assert_eq!(classify(just_before_now, now).urgency, Urgency::Overdue);
        assert_eq!(classify(now, now).urgency, Urgency::Warning);
        assert_eq!(classify(just_after, now).delta, Duration::seconds(86_401));
    }

    #[test]
    fn remaining_text_truncates_components() {
        let now = at(1, 1, 2024, 0, 0, 0);
        assert_eq!(
            format_remaining(at(3, 1, 2024, 5, 7, 59), now),
            "Time remaining: 2d 5h 7m"
        );
        assert_eq!(
            format_remaining(now - Duration::minutes(26 * 60 + 59), now),
            "Overdue by: 1d 2h"
        );
        assert_eq!(format_remaining(now, now), "Time remaining: 0d 0h 0m");
    }
}
