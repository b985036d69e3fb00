//! Event creation requests.
//!
//! [`EventDraft`] carries the flat, all-optional field set the host forms
//! submit. It is resolved exactly once into a [`NewEventRequest`], whose
//! variants make the required fields of each event category explicit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{Event, EventType, FreqType, InstructorId, TrainingClassId};

/// Recurrence pattern of a recurring unavailability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "freq_type", content = "freq_interval", rename_all = "snake_case")]
pub enum Recurrence {
    /// ISO weekdays, 1 = Monday through 7 = Sunday.
    Weekly(Vec<u32>),
    /// Days of the month, 1 through 31.
    Monthly(Vec<u32>),
}

impl Recurrence {
    pub fn freq_type(&self) -> FreqType {
        match self {
            Recurrence::Weekly(_) => FreqType::Weekly,
            Recurrence::Monthly(_) => FreqType::Monthly,
        }
    }

    pub fn days(&self) -> &[u32] {
        match self {
            Recurrence::Weekly(days) | Recurrence::Monthly(days) => days,
        }
    }

    fn validate(&self) -> SchedulingResult<()> {
        let (max, unit) = match self {
            Recurrence::Weekly(_) => (7, "weekday"),
            Recurrence::Monthly(_) => (31, "day of month"),
        };
        if self.days().is_empty() {
            return Err(SchedulingError::validation(
                "freq_interval must not be empty for a recurring rule",
            ));
        }
        if let Some(bad) = self.days().iter().find(|&&d| d < 1 || d > max) {
            return Err(SchedulingError::validation(format!(
                "freq_interval value {} is not a valid {} (1-{})",
                bad, unit, max
            )));
        }
        Ok(())
    }
}

/// A validated request to create one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum NewEventRequest {
    /// Book the instructor of `training_class` over the class window.
    #[serde(rename = "class_schedule")]
    ClassBooking { training_class: TrainingClassId },
    OneTimeUnavailability {
        instructor: InstructorId,
        start_date: NaiveDate,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
    RecurringUnavailability {
        instructor: InstructorId,
        start_date: NaiveDate,
        #[serde(default)]
        end_date: Option<NaiveDate>,
        #[serde(flatten)]
        recurrence: Recurrence,
    },
    /// Restore availability on `date`.
    CancelUnavailability {
        instructor: InstructorId,
        date: NaiveDate,
    },
}

impl NewEventRequest {
    pub fn class_booking(training_class: TrainingClassId) -> Self {
        Self::ClassBooking { training_class }
    }

    pub fn one_time(instructor: InstructorId, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self::OneTimeUnavailability {
            instructor,
            start_date,
            end_date,
        }
    }

    pub fn weekly(
        instructor: InstructorId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        weekdays: Vec<u32>,
    ) -> Self {
        Self::RecurringUnavailability {
            instructor,
            start_date,
            end_date,
            recurrence: Recurrence::Weekly(weekdays),
        }
    }

    pub fn monthly(
        instructor: InstructorId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        days: Vec<u32>,
    ) -> Self {
        Self::RecurringUnavailability {
            instructor,
            start_date,
            end_date,
            recurrence: Recurrence::Monthly(days),
        }
    }

    pub fn cancel(instructor: InstructorId, date: NaiveDate) -> Self {
        Self::CancelUnavailability { instructor, date }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::ClassBooking { .. } => EventType::ClassSchedule,
            Self::OneTimeUnavailability { .. } => EventType::OneTimeUnavailability,
            Self::RecurringUnavailability { .. } => EventType::RecurringUnavailability,
            Self::CancelUnavailability { .. } => EventType::CancelUnavailability,
        }
    }

    /// Instructor named directly by the request; bookings derive theirs from the class.
    pub fn instructor(&self) -> Option<InstructorId> {
        match self {
            Self::ClassBooking { .. } => None,
            Self::OneTimeUnavailability { instructor, .. }
            | Self::RecurringUnavailability { instructor, .. }
            | Self::CancelUnavailability { instructor, .. } => Some(*instructor),
        }
    }

    /// Check field consistency that the variant shape cannot express.
    pub fn validate(&self) -> SchedulingResult<()> {
        match self {
            Self::ClassBooking { .. } | Self::CancelUnavailability { .. } => Ok(()),
            Self::OneTimeUnavailability {
                start_date,
                end_date,
                ..
            } => check_bounds(*start_date, *end_date),
            Self::RecurringUnavailability {
                start_date,
                end_date,
                recurrence,
                ..
            } => {
                check_bounds(*start_date, *end_date)?;
                recurrence.validate()
            }
        }
    }

    /// Candidate event for requests that need no directory lookup.
    ///
    /// Returns `None` for class bookings.
    pub fn to_event(&self) -> Option<Event> {
        match self {
            Self::ClassBooking { .. } => None,
            Self::OneTimeUnavailability {
                instructor,
                start_date,
                end_date,
            } => Some(Event::one_time(*instructor, *start_date, *end_date)),
            Self::RecurringUnavailability {
                instructor,
                start_date,
                end_date,
                recurrence,
            } => Some(Event::recurring(
                *instructor,
                *start_date,
                *end_date,
                recurrence.freq_type(),
                recurrence.days().to_vec(),
            )),
            Self::CancelUnavailability { instructor, date } => {
                Some(Event::cancellation(*instructor, *date))
            }
        }
    }
}

fn check_bounds(start: NaiveDate, end: Option<NaiveDate>) -> SchedulingResult<()> {
    match end {
        Some(end) if end < start => Err(SchedulingError::validation(format!(
            "end_date {} is before start_date {}",
            end, start
        ))),
        _ => Ok(()),
    }
}

/// Flat event fields as submitted by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub instructor: Option<InstructorId>,
    #[serde(default)]
    pub training_class: Option<TrainingClassId>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub freq_type: Option<FreqType>,
    #[serde(default)]
    pub freq_interval: Vec<u32>,
}

impl EventDraft {
    /// Resolve the draft into a typed request.
    ///
    /// A draft naming a training class and no event type is a class booking;
    /// its dates and instructor come from the class, so any supplied here are
    /// ignored.
    pub fn resolve(self) -> SchedulingResult<NewEventRequest> {
        let event_type = match (self.event_type, self.training_class) {
            (Some(t), _) => t,
            (None, Some(_)) => EventType::ClassSchedule,
            (None, None) => {
                return Err(SchedulingError::validation(
                    "event_type is required when no training_class is given",
                ))
            }
        };

        if event_type != EventType::ClassSchedule && self.training_class.is_some() {
            return Err(SchedulingError::validation(format!(
                "training_class can only be set on class_schedule events, not {}",
                event_type
            )));
        }

        let request = match event_type {
            EventType::ClassSchedule => {
                let training_class = self.training_class.ok_or_else(|| {
                    SchedulingError::validation("class_schedule events require a training_class")
                })?;
                NewEventRequest::ClassBooking { training_class }
            }
            EventType::OneTimeUnavailability => NewEventRequest::OneTimeUnavailability {
                instructor: required_instructor(self.instructor, event_type)?,
                start_date: required_start(self.start_date, event_type)?,
                end_date: self.end_date,
            },
            EventType::RecurringUnavailability => {
                let freq_type = self.freq_type.ok_or_else(|| {
                    SchedulingError::validation("recurring_unavailability requires freq_type")
                })?;
                let recurrence = match freq_type {
                    FreqType::Weekly => Recurrence::Weekly(self.freq_interval),
                    FreqType::Monthly => Recurrence::Monthly(self.freq_interval),
                    FreqType::Unsupported => {
                        return Err(SchedulingError::validation(
                            "freq_type must be 'weekly' or 'monthly'",
                        ))
                    }
                };
                NewEventRequest::RecurringUnavailability {
                    instructor: required_instructor(self.instructor, event_type)?,
                    start_date: required_start(self.start_date, event_type)?,
                    end_date: self.end_date,
                    recurrence,
                }
            }
            EventType::CancelUnavailability => {
                let date = required_start(self.start_date, event_type)?;
                if let Some(end) = self.end_date {
                    if end != date {
                        return Err(SchedulingError::validation(
                            "cancel_unavailability must start and end on the same day",
                        ));
                    }
                }
                NewEventRequest::CancelUnavailability {
                    instructor: required_instructor(self.instructor, event_type)?,
                    date,
                }
            }
        };

        request.validate()?;
        Ok(request)
    }
}

fn required_instructor(
    instructor: Option<InstructorId>,
    event_type: EventType,
) -> SchedulingResult<InstructorId> {
    instructor.ok_or_else(|| SchedulingError::validation(format!("{} requires an instructor", event_type)))
}

fn required_start(start: Option<NaiveDate>, event_type: EventType) -> SchedulingResult<NaiveDate> {
    start.ok_or_else(|| SchedulingError::validation(format!("{} requires a start_date", event_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_training_class_implies_booking() {
        let draft = EventDraft {
            training_class: Some(TrainingClassId(4)),
            start_date: Some(d(2030, 1, 1)),
            ..Default::default()
        };
        assert_eq!(
            draft.resolve().unwrap(),
            NewEventRequest::class_booking(TrainingClassId(4))
        );
    }

    #[test]
    fn test_missing_event_type_and_class() {
        let err = EventDraft::default().resolve().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_booking_without_class() {
        let draft = EventDraft {
            event_type: Some(EventType::ClassSchedule),
            instructor: Some(InstructorId(1)),
            start_date: Some(d(2024, 1, 8)),
            ..Default::default()
        };
        assert!(draft.resolve().unwrap_err().is_validation());
    }

    #[test]
    fn test_rule_with_training_class_rejected() {
        let draft = EventDraft {
            event_type: Some(EventType::OneTimeUnavailability),
            instructor: Some(InstructorId(1)),
            training_class: Some(TrainingClassId(2)),
            start_date: Some(d(2024, 1, 8)),
            ..Default::default()
        };
        assert!(draft.resolve().unwrap_err().is_validation());
    }

    #[test]
    fn test_recurring_requires_freq_fields() {
        let base = EventDraft {
            event_type: Some(EventType::RecurringUnavailability),
            instructor: Some(InstructorId(1)),
            start_date: Some(d(2024, 1, 1)),
            ..Default::default()
        };

        let missing_freq = base.clone();
        assert!(missing_freq.resolve().unwrap_err().is_validation());

        let empty_interval = EventDraft {
            freq_type: Some(FreqType::Weekly),
            ..base.clone()
        };
        assert!(empty_interval.resolve().unwrap_err().is_validation());

        let bad_weekday = EventDraft {
            freq_type: Some(FreqType::Weekly),
            freq_interval: vec![0, 3],
            ..base.clone()
        };
        assert!(bad_weekday.resolve().unwrap_err().is_validation());

        let unsupported = EventDraft {
            freq_type: Some(FreqType::Unsupported),
            freq_interval: vec![1],
            ..base.clone()
        };
        assert!(unsupported.resolve().unwrap_err().is_validation());

        let monthly = EventDraft {
            freq_type: Some(FreqType::Monthly),
            freq_interval: vec![15, 31],
            ..base
        };
        assert_eq!(
            monthly.resolve().unwrap(),
            NewEventRequest::monthly(InstructorId(1), d(2024, 1, 1), None, vec![15, 31])
        );
    }

    #[test]
    fn test_rule_needs_instructor_and_start() {
        let no_instructor = EventDraft {
            event_type: Some(EventType::OneTimeUnavailability),
            start_date: Some(d(2024, 1, 1)),
            ..Default::default()
        };
        assert!(no_instructor.resolve().unwrap_err().is_validation());

        let no_start = EventDraft {
            event_type: Some(EventType::OneTimeUnavailability),
            instructor: Some(InstructorId(1)),
            ..Default::default()
        };
        assert!(no_start.resolve().unwrap_err().is_validation());
    }

    #[test]
    fn test_reversed_bounds_rejected() {
        let draft = EventDraft {
            event_type: Some(EventType::OneTimeUnavailability),
            instructor: Some(InstructorId(1)),
            start_date: Some(d(2024, 1, 5)),
            end_date: Some(d(2024, 1, 4)),
            ..Default::default()
        };
        assert!(draft.resolve().unwrap_err().is_validation());
    }

    #[test]
    fn test_cancellation_is_single_day() {
        let draft = EventDraft {
            event_type: Some(EventType::CancelUnavailability),
            instructor: Some(InstructorId(1)),
            start_date: Some(d(2024, 1, 8)),
            end_date: Some(d(2024, 1, 9)),
            ..Default::default()
        };
        assert!(draft.clone().resolve().unwrap_err().is_validation());

        let same_day = EventDraft {
            end_date: Some(d(2024, 1, 8)),
            ..draft
        };
        let request = same_day.resolve().unwrap();
        assert_eq!(request, NewEventRequest::cancel(InstructorId(1), d(2024, 1, 8)));
        let event = request.to_event().unwrap();
        assert_eq!(event.end_date, Some(d(2024, 1, 8)));
    }

    #[test]
    fn test_request_json_shape() {
        let json = r#"{"event_type": "recurring_unavailability", "instructor": 3,
                       "start_date": "2024-01-01", "freq_type": "weekly", "freq_interval": [1, 3]}"#;
        let request: NewEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            NewEventRequest::weekly(InstructorId(3), d(2024, 1, 1), None, vec![1, 3])
        );
    }
}
