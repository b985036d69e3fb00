//! Inclusive calendar-day ranges.
//!
//! All dates are timezone-naive calendar days. Ranges are inclusive on both
//! ends; a range whose end precedes its start is empty.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Format used for calendar keys exchanged with the host.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// An inclusive `[start, end]` range of calendar days.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use instructor_scheduling::time::DateRange;
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
/// );
/// assert_eq!(range.len_days(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of days in the range (0 when empty).
    pub fn len_days(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as u64 + 1
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Overlap of two ranges, `None` when they do not share a day.
    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let clipped = DateRange::new(self.start.max(other.start), self.end.min(other.end));
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Clip a possibly open-ended span `[start, end or +inf]` to this range.
    pub fn clip(&self, start: NaiveDate, end: Option<NaiveDate>) -> Option<DateRange> {
        self.intersect(&DateRange::new(start, end.unwrap_or(self.end)))
    }

    /// Iterate each day of the range in ascending order.
    pub fn days(&self) -> Days {
        Days {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

/// Ascending iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.end {
            current.checked_add_signed(Duration::days(1))
        } else {
            None
        };
        Some(current)
    }
}

/// ISO weekday number, 1 = Monday through 7 = Sunday.
pub fn iso_weekday(day: NaiveDate) -> u32 {
    day.weekday().number_from_monday()
}

/// Render a day as a `YYYY-MM-DD` key.
pub fn format_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` key.
pub fn parse_key(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_KEY_FORMAT)
        .map_err(|e| format!("Invalid date '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_inclusive() {
        let days: Vec<_> = DateRange::new(d(2024, 2, 28), d(2024, 3, 1)).days().collect();
        assert_eq!(days, vec![d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);
    }

    #[test]
    fn test_empty_range() {
        let range = DateRange::new(d(2024, 3, 2), d(2024, 3, 1));
        assert!(range.is_empty());
        assert_eq!(range.len_days(), 0);
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn test_intersect() {
        let a = DateRange::new(d(2024, 3, 1), d(2024, 3, 5));
        let b = DateRange::new(d(2024, 3, 4), d(2024, 3, 9));
        assert_eq!(a.intersect(&b), Some(DateRange::new(d(2024, 3, 4), d(2024, 3, 5))));

        let c = DateRange::new(d(2024, 3, 6), d(2024, 3, 9));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_clip_open_ended() {
        let window = DateRange::new(d(2024, 4, 1), d(2024, 4, 30));
        assert_eq!(
            window.clip(d(2024, 1, 1), None),
            Some(window),
        );
        assert_eq!(
            window.clip(d(2024, 4, 10), Some(d(2024, 5, 10))),
            Some(DateRange::new(d(2024, 4, 10), d(2024, 4, 30))),
        );
        assert_eq!(window.clip(d(2024, 5, 1), None), None);
    }

    #[test]
    fn test_iso_weekday() {
        // 2024-01-01 was a Monday
        assert_eq!(iso_weekday(d(2024, 1, 1)), 1);
        assert_eq!(iso_weekday(d(2024, 1, 7)), 7);
    }

    #[test]
    fn test_key_round_trip() {
        assert_eq!(format_key(d(2024, 4, 2)), "2024-04-02");
        assert_eq!(parse_key("2024-04-02").unwrap(), d(2024, 4, 2));
        assert!(parse_key("04/02/2024").is_err());
    }
}
