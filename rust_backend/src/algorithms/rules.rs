//! Availability rule evaluation.
//!
//! Decides whether a one-time or recurring unavailability rule applies to a
//! given calendar day.

use chrono::{Datelike, NaiveDate};

use crate::models::{Event, EventType, FreqType};
use crate::time::iso_weekday;

/// Whether `rule` marks the instructor unavailable on `day`.
///
/// - One-time rules match every day in `[start_date, end_date or +inf]`.
/// - Recurring rules must be within the same bounds and then match the
///   ISO weekday (`weekly`) or day of month (`monthly`) against
///   `freq_interval`. Any other frequency never matches.
///
/// Events that are not rules never match.
pub fn matches(rule: &Event, day: NaiveDate) -> bool {
    match rule.event_type {
        EventType::OneTimeUnavailability => rule.within_bounds(day),
        EventType::RecurringUnavailability => {
            rule.within_bounds(day) && recurrence_matches(rule.freq_type, &rule.freq_interval, day)
        }
        EventType::ClassSchedule | EventType::CancelUnavailability => false,
    }
}

/// Recurrence pattern check, independent of the rule's bounds.
pub fn recurrence_matches(freq_type: Option<FreqType>, freq_interval: &[u32], day: NaiveDate) -> bool {
    match freq_type {
        Some(FreqType::Weekly) => freq_interval.contains(&iso_weekday(day)),
        Some(FreqType::Monthly) => freq_interval.contains(&day.day()),
        Some(FreqType::Unsupported) | None => false,
    }
}

/// Whether `event` occupies `day`.
///
/// Rules occupy the days they match; bookings and cancellations occupy every
/// day within their bounds.
pub fn occupies(event: &Event, day: NaiveDate) -> bool {
    if event.is_rule() {
        matches(event, day)
    } else {
        event.within_bounds(day)
    }
}
