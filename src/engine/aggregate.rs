use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::collection::{pickup_weekday_for_prep, PrepIndex};
use super::{weekday_index, weekday_name};

/// Label a date carries when nothing else is scheduled on it. A visit is
/// never emitted with zero tasks.
pub const FALLBACK_TASK: &str = "General maintenance";

/// A fixed task recurring on a weekday set, independent of the recurrence
/// rule that drives date expansion. The two sets are combined only here in
/// the aggregator, never merged upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTaskSchedule {
    pub label: String,
    pub weekdays: Vec<u8>,
}

impl ManualTaskSchedule {
    pub fn new(label: impl Into<String>, weekdays: Vec<u8>) -> Self {
        ManualTaskSchedule {
            label: label.into(),
            weekdays,
        }
    }

    /// An empty schedule that applies to no weekday.
    pub fn none() -> Self {
        ManualTaskSchedule {
            label: String::new(),
            weekdays: Vec::new(),
        }
    }

    pub fn applies_on(&self, weekday: u8) -> bool {
        self.weekdays.contains(&weekday)
    }
}

/// Everything a field technician needs to know about one visit date. The
/// same shape backs preview rows and materialized job instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub weekday_label: String,
    pub tasks: Vec<String>,
}

impl DailyAggregate {
    /// One-line form used for job-instance task summaries.
    pub fn summary(&self) -> String {
        self.tasks.join("; ")
    }
}

/// Build the task list for one date. Ordering is a user-visible contract
/// (technicians read top-to-bottom): the manual task comes first, then one
/// prep line per collection type in caller-supplied order. Prep lines name
/// the pickup day, not the prep day, since pickup is the operationally
/// meaningful fact.
pub fn aggregate(
    date: NaiveDate,
    manual: &ManualTaskSchedule,
    prep: &PrepIndex,
) -> DailyAggregate {
    let weekday = weekday_index(date);
    let mut tasks: Vec<String> = Vec::new();

    if manual.applies_on(weekday) {
        tasks.push(manual.label.clone());
    }

    for collection_type in prep.types_for(weekday) {
        let pickup = pickup_weekday_for_prep(weekday);
        tasks.push(format!(
            "{} prep (pickup {})",
            collection_type.label(),
            weekday_name(pickup)
        ));
    }

    if tasks.is_empty() {
        tasks.push(FALLBACK_TASK.to_string());
    }

    DailyAggregate {
        date,
        weekday_label: weekday_name(weekday).to_string(),
        tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collection::{CollectionSchedule, CollectionType, Provenance};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prep_for(schedules: Vec<CollectionSchedule>) -> PrepIndex {
        PrepIndex::build(&schedules)
    }

    #[test]
    fn test_fallback_when_nothing_scheduled() {
        // No manual tasks, no pickup types: exactly the fallback label
        let agg = aggregate(
            date(2025, 1, 8),
            &ManualTaskSchedule::none(),
            &PrepIndex::default(),
        );
        assert_eq!(agg.tasks, vec![FALLBACK_TASK.to_string()]);
    }

    #[test]
    fn test_recycling_monday_pickup_preps_sunday() {
        let prep = prep_for(vec![CollectionSchedule {
            collection_type: CollectionType::Recycling,
            pickup_weekdays: vec![1], // Monday
            provenance: Provenance::Real,
        }]);

        // 2025-01-05 is a Sunday
        let agg = aggregate(date(2025, 1, 5), &ManualTaskSchedule::none(), &prep);

        assert_eq!(agg.weekday_label, "Sunday");
        assert_eq!(agg.tasks, vec!["Recycling prep (pickup Monday)".to_string()]);
    }

    #[test]
    fn test_manual_task_comes_first() {
        let prep = prep_for(vec![CollectionSchedule {
            collection_type: CollectionType::Refuse,
            pickup_weekdays: vec![1],
            provenance: Provenance::Real,
        }]);
        // Manual cleaning on Sundays (0)
        let manual = ManualTaskSchedule::new("Interior cleaning", vec![0]);

        let agg = aggregate(date(2025, 1, 5), &manual, &prep);

        assert_eq!(
            agg.tasks,
            vec![
                "Interior cleaning".to_string(),
                "Refuse prep (pickup Monday)".to_string(),
            ]
        );
    }

    #[test]
    fn test_type_order_follows_caller_order() {
        let prep = prep_for(vec![
            CollectionSchedule {
                collection_type: CollectionType::Organics,
                pickup_weekdays: vec![1],
                provenance: Provenance::Real,
            },
            CollectionSchedule {
                collection_type: CollectionType::Refuse,
                pickup_weekdays: vec![1],
                provenance: Provenance::Real,
            },
        ]);

        let agg = aggregate(date(2025, 1, 5), &ManualTaskSchedule::none(), &prep);

        assert_eq!(
            agg.tasks,
            vec![
                "Organics prep (pickup Monday)".to_string(),
                "Refuse prep (pickup Monday)".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_fallback_when_manual_task_applies() {
        let manual = ManualTaskSchedule::new("Interior cleaning", vec![3]);
        let agg = aggregate(date(2025, 1, 8), &manual, &PrepIndex::default());
        assert_eq!(agg.tasks, vec!["Interior cleaning".to_string()]);
    }

    #[test]
    fn test_aggregate_never_empty() {
        // The fallback invariant holds for every weekday
        for offset in 0..7 {
            let d = date(2025, 1, 5) + chrono::Duration::days(offset);
            let agg = aggregate(d, &ManualTaskSchedule::none(), &PrepIndex::default());
            assert!(!agg.tasks.is_empty());
        }
    }

    #[test]
    fn test_summary_joins_tasks() {
        let manual = ManualTaskSchedule::new("Interior cleaning", vec![0]);
        let prep = prep_for(vec![CollectionSchedule {
            collection_type: CollectionType::Recycling,
            pickup_weekdays: vec![1],
            provenance: Provenance::Real,
        }]);
        let agg = aggregate(date(2025, 1, 5), &manual, &prep);

        assert_eq!(
            agg.summary(),
            "Interior cleaning; Recycling prep (pickup Monday)"
        );
    }
}
