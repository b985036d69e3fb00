//! Calendar records handed to the display layer.
//!
//! The serialized shape (`date`, `is_available`, `data`, `rules`, `count`) is
//! consumed verbatim by the host's calendar endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Event, EventId, EventType, FreqType, InstructorId, TrainingClassId};

/// One rendered calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    #[serde(with = "date_key")]
    pub date: NaiveDate,
    pub is_available: bool,
    /// Set when a cancellation restored availability on this day.
    #[serde(skip)]
    pub is_canceled: bool,
    pub data: Vec<ClassBookingSummary>,
    pub rules: Vec<RuleSummary>,
    pub count: u32,
}

impl CalendarDay {
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            date,
            is_available: true,
            is_canceled: false,
            data: Vec::new(),
            rules: Vec::new(),
            count: 0,
        }
    }

    /// Nothing was booked or ruled out on this day.
    pub fn is_blank(&self) -> bool {
        self.data.is_empty() && self.rules.is_empty() && self.is_available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBookingSummary {
    pub event_id: Option<EventId>,
    pub training_class: Option<TrainingClassId>,
    pub instructor: Option<InstructorId>,
    #[serde(with = "date_key")]
    pub start_date: NaiveDate,
    #[serde(with = "optional_date_key")]
    pub end_date: Option<NaiveDate>,
}

impl From<&Event> for ClassBookingSummary {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            training_class: event.training_class,
            instructor: event.instructor,
            start_date: event.start_date,
            end_date: event.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub event_id: Option<EventId>,
    pub event_type: EventType,
    #[serde(with = "date_key")]
    pub start_date: NaiveDate,
    #[serde(with = "optional_date_key")]
    pub end_date: Option<NaiveDate>,
    pub freq_type: Option<FreqType>,
    pub freq_interval: Vec<u32>,
}

impl From<&Event> for RuleSummary {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type,
            start_date: event.start_date,
            end_date: event.end_date,
            freq_type: event.freq_type,
            freq_interval: event.freq_interval.clone(),
        }
    }
}

mod date_key {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::time::{format_key, parse_key};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_key(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse_key(&raw).map_err(serde::de::Error::custom)
    }
}

mod optional_date_key {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::time::{format_key, parse_key};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&format_key(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| parse_key(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
