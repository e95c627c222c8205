//! Recurrence and daily-task scheduling engine.
//!
//! Everything in this module is synchronous, pure computation over in-memory
//! values. Callers resolve external inputs (pickup calendars, contract rows)
//! first and pass them in as data; the only I/O-performing consumers are the
//! materializer (`crate::materialize`) and the entity modules.
//!
//! Both the preview projector and the job materializer go through
//! [`plan::build_plan`]; there is deliberately no second expansion or
//! aggregation path.

mod aggregate;
mod collection;
mod expansion;
mod plan;
mod recurrence;

pub use aggregate::{aggregate, DailyAggregate, ManualTaskSchedule, FALLBACK_TASK};
pub use collection::{
    overall_provenance, pickup_weekday_for_prep, prep_weekday, CollectionSchedule, CollectionType,
    PrepIndex, Provenance,
};
pub use expansion::{expand, ExpansionBounds, INSTANCE_CEILING};
pub use plan::{build_plan, PlanContext};
pub use recurrence::{EndBound, RecurrenceKind, RecurrenceRule};

use chrono::{Datelike, NaiveDate};

/// Canonical weekday table, Sunday = 0. Every weekday label in the system
/// resolves through this one table; the weekday index of a date resolves
/// through [`weekday_index`].
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Weekday index of a calendar date, Sunday = 0.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES[(weekday % 7) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_index_sunday_is_zero() {
        // 2025-01-05 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(weekday_index(sunday), 0);

        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(weekday_index(monday), 1);

        let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        assert_eq!(weekday_index(saturday), 6);
    }

    #[test]
    fn test_weekday_name_wraps() {
        assert_eq!(weekday_name(0), "Sunday");
        assert_eq!(weekday_name(6), "Saturday");
        assert_eq!(weekday_name(7), "Sunday");
    }
}
