use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rules::{matches, occupies};
use crate::models::{Event, EventId};

/// A detected overlap between a candidate event and an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConflict {
    pub candidate_start: NaiveDate,
    pub existing_event: Option<EventId>,
    pub day: NaiveDate,
}

/// Whether some day of `a`'s span is occupied by `b`.
///
/// `a` is scanned day by day over `[start_date, end_date or start_date]`; `b`
/// contributes its bounds and, for recurring rules, its pattern. The check is
/// instructor-agnostic: callers pass events of the instructor they care about.
pub fn conflicts(a: &Event, b: &Event) -> bool {
    first_conflict_day(a, b, &[]).is_some()
}

/// First day of `a`'s span occupied by `b`.
///
/// When `b` is a rule, days restored by any of `cancellations` are skipped.
pub fn first_conflict_day(a: &Event, b: &Event, cancellations: &[Event]) -> Option<NaiveDate> {
    a.span().days().find(|&day| {
        occupies(b, day) && !(b.is_rule() && is_cancelled(cancellations, day))
    })
}

/// Whether one of `cancellations` covers `day`.
pub fn is_cancelled(cancellations: &[Event], day: NaiveDate) -> bool {
    cancellations
        .iter()
        .any(|c| c.is_cancellation() && c.within_bounds(day))
}

/// Scan `existing` for the first event `candidate` collides with.
pub fn find_conflict<'a, I>(
    candidate: &Event,
    existing: I,
    cancellations: &[Event],
) -> Option<SchedulingConflict>
where
    I: IntoIterator<Item = &'a Event>,
{
    existing.into_iter().find_map(|other| {
        first_conflict_day(candidate, other, cancellations).map(|day| SchedulingConflict {
            candidate_start: candidate.start_date,
            existing_event: other.id,
            day,
        })
    })
}

/// Whether any rule in `rules` marks `day` unavailable, honouring cancellations.
pub fn rule_blocks_day(rules: &[Event], cancellations: &[Event], day: NaiveDate) -> bool {
    !is_cancelled(cancellations, day) && rules.iter().any(|rule| matches(rule, day))
}
