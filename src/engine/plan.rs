use chrono::NaiveDate;

use super::aggregate::{aggregate, DailyAggregate, ManualTaskSchedule};
use super::collection::{PrepIndex, Provenance};
use super::expansion::{expand, ExpansionBounds};
use super::recurrence::RecurrenceRule;

/// Expand a rule and aggregate each date. This is the one entry point the
/// preview projector and the job materializer both call; any divergence
/// between what a preview shows and what materialization writes is a defect,
/// so neither consumer gets its own expansion path.
pub fn build_plan(
    rule: &RecurrenceRule,
    start: NaiveDate,
    bounds: &ExpansionBounds,
    manual: &ManualTaskSchedule,
    prep: &PrepIndex,
) -> Vec<DailyAggregate> {
    expand(rule, start, bounds)
        .into_iter()
        .map(|date| aggregate(date, manual, prep))
        .collect()
}

/// Resolved inputs for planning one contract's visits: the typed rule, the
/// manual-task weekday set, the prep index built from the property's pickup
/// calendars, and the worst-case provenance of those calendars.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub rule: RecurrenceRule,
    pub manual: ManualTaskSchedule,
    pub prep: PrepIndex,
    pub provenance: Provenance,
}

impl PlanContext {
    pub fn plan(&self, start: NaiveDate, bounds: &ExpansionBounds) -> Vec<DailyAggregate> {
        build_plan(&self.rule, start, bounds, &self.manual, &self.prep)
    }

    /// Disclosure line for job notes and preview headers.
    pub fn provenance_note(&self) -> String {
        format!("Pickup data: {}", self.provenance)
    }
}
