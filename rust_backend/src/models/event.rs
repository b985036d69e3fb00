//! The persisted scheduling fact and its vocabulary.
//!
//! An [`Event`] is either a class booking, an unavailability rule (one-time or
//! recurring), or a cancellation that restores availability for a single day.
//! The flat shape mirrors what the host stores; construction goes through
//! [`crate::api::NewEventRequest`] so the optional fields are resolved once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EventId, InstructorId, TrainingClassId};
use crate::time::DateRange;

/// Kind of scheduling fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ClassSchedule,
    OneTimeUnavailability,
    RecurringUnavailability,
    CancelUnavailability,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::ClassSchedule,
        EventType::OneTimeUnavailability,
        EventType::RecurringUnavailability,
        EventType::CancelUnavailability,
    ];

    /// Unavailability rules (one-time or recurring).
    pub const RULES: [EventType; 2] = [
        EventType::OneTimeUnavailability,
        EventType::RecurringUnavailability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ClassSchedule => "class_schedule",
            EventType::OneTimeUnavailability => "one_time_unavailability",
            EventType::RecurringUnavailability => "recurring_unavailability",
            EventType::CancelUnavailability => "cancel_unavailability",
        }
    }

    pub fn is_rule(&self) -> bool {
        matches!(
            self,
            EventType::OneTimeUnavailability | EventType::RecurringUnavailability
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "class_schedule" => Ok(EventType::ClassSchedule),
            "one_time_unavailability" => Ok(EventType::OneTimeUnavailability),
            "recurring_unavailability" => Ok(EventType::RecurringUnavailability),
            "cancel_unavailability" => Ok(EventType::CancelUnavailability),
            other => Err(format!("Unknown event type: {}", other)),
        }
    }
}

/// Recurrence frequency of a recurring rule.
///
/// Values the engine does not understand deserialize to `Unsupported` and never
/// match any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreqType {
    Weekly,
    Monthly,
    #[serde(other)]
    Unsupported,
}

impl FreqType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreqType::Weekly => "weekly",
            FreqType::Monthly => "monthly",
            FreqType::Unsupported => "unsupported",
        }
    }

    /// Parse a frequency name; anything unknown maps to `Unsupported`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weekly" => FreqType::Weekly,
            "monthly" => FreqType::Monthly,
            _ => FreqType::Unsupported,
        }
    }
}

impl fmt::Display for FreqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduling fact as persisted by the event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: Option<EventId>,
    pub event_type: EventType,
    #[serde(default)]
    pub instructor: Option<InstructorId>,
    #[serde(default)]
    pub training_class: Option<TrainingClassId>,
    pub start_date: NaiveDate,
    /// `None` means the event extends indefinitely.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub freq_type: Option<FreqType>,
    #[serde(default)]
    pub freq_interval: Vec<u32>,
}

impl Event {
    /// A confirmed class booking occupying `[start_date, end_date]`.
    pub fn class_schedule(
        training_class: TrainingClassId,
        instructor: InstructorId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            event_type: EventType::ClassSchedule,
            instructor: Some(instructor),
            training_class: Some(training_class),
            start_date,
            end_date: Some(end_date),
            freq_type: None,
            freq_interval: Vec::new(),
        }
    }

    pub fn one_time(
        instructor: InstructorId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: None,
            event_type: EventType::OneTimeUnavailability,
            instructor: Some(instructor),
            training_class: None,
            start_date,
            end_date,
            freq_type: None,
            freq_interval: Vec::new(),
        }
    }

    pub fn recurring(
        instructor: InstructorId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        freq_type: FreqType,
        freq_interval: Vec<u32>,
    ) -> Self {
        Self {
            id: None,
            event_type: EventType::RecurringUnavailability,
            instructor: Some(instructor),
            training_class: None,
            start_date,
            end_date,
            freq_type: Some(freq_type),
            freq_interval,
        }
    }

    /// A single-day cancellation of whatever rule covers `date`.
    pub fn cancellation(instructor: InstructorId, date: NaiveDate) -> Self {
        Self {
            id: None,
            event_type: EventType::CancelUnavailability,
            instructor: Some(instructor),
            training_class: None,
            start_date: date,
            end_date: Some(date),
            freq_type: None,
            freq_interval: Vec::new(),
        }
    }

    pub fn is_rule(&self) -> bool {
        self.event_type.is_rule()
    }

    pub fn is_booking(&self) -> bool {
        self.event_type == EventType::ClassSchedule
    }

    pub fn is_cancellation(&self) -> bool {
        self.event_type == EventType::CancelUnavailability
    }

    /// Days the event itself spans when scanned for conflicts.
    ///
    /// Open-ended events are scanned from their start day only.
    pub fn span(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date.unwrap_or(self.start_date))
    }

    /// Whether `day` falls within `[start_date, end_date or +inf]`.
    pub fn within_bounds(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.map_or(true, |end| day <= end)
    }

    /// Whether the event's bounds intersect `range`.
    pub fn overlaps(&self, range: &DateRange) -> bool {
        if range.is_empty() {
            return false;
        }
        self.start_date <= range.end && self.end_date.map_or(true, |end| end >= range.start)
    }
}
