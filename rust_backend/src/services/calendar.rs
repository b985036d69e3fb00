//! Calendar rendering over an arbitrary date window.
//!
//! Events are overlaid onto a blank skeleton in three passes so the result
//! does not depend on input order:
//!
//! 1. cancellations mark their days cancelled and available,
//! 2. bookings add a summary on the first day of their clipped span,
//! 3. rules mark matching, non-cancelled days unavailable.
//!
//! Days left untouched are dropped from the output.

use chrono::NaiveDate;

use crate::algorithms::rules::matches;
use crate::models::{CalendarDay, ClassBookingSummary, Event, EventType, RuleSummary};
use crate::time::DateRange;

/// Build the calendar for `[start, end]` from `events`.
///
/// Returns the non-blank days in ascending date order. An empty window
/// (`end < start`) yields an empty calendar.
pub fn build_calendar<'a, I>(events: I, start: NaiveDate, end: NaiveDate) -> Vec<CalendarDay>
where
    I: IntoIterator<Item = &'a Event>,
{
    let window = DateRange::new(start, end);
    let mut days: Vec<CalendarDay> = window.days().map(CalendarDay::blank).collect();
    if days.is_empty() {
        return days;
    }

    let mut bookings = Vec::new();
    let mut cancellations = Vec::new();
    let mut rules = Vec::new();
    for event in events {
        let Some(clipped) = window.clip(event.start_date, event.end_date) else {
            continue;
        };
        match event.event_type {
            EventType::ClassSchedule => bookings.push((event, clipped)),
            EventType::CancelUnavailability => cancellations.push(clipped),
            EventType::OneTimeUnavailability | EventType::RecurringUnavailability => {
                rules.push((event, clipped))
            }
        }
    }

    let slot = |day: NaiveDate| (day - start).num_days() as usize;

    for clipped in cancellations {
        for day in clipped.days() {
            let entry = &mut days[slot(day)];
            entry.is_canceled = true;
            entry.is_available = true;
        }
    }

    for (event, clipped) in bookings {
        let entry = &mut days[slot(clipped.start)];
        entry.data.push(ClassBookingSummary::from(event));
        entry.count += 1;
    }

    for (rule, clipped) in rules {
        for day in clipped.days() {
            let entry = &mut days[slot(day)];
            if entry.is_canceled || !matches(rule, day) {
                continue;
            }
            entry.is_available = false;
            entry.rules.push(RuleSummary::from(rule));
        }
    }

    days.retain(|day| !day.is_blank());
    days
}
