use chrono::{Datelike, Duration, NaiveDate};

use super::recurrence::{RecurrenceKind, RecurrenceRule};
use super::weekday_index;

/// Hard ceiling on dates produced for materialization. Prevents unbounded
/// instance generation when a rule carries no end condition.
pub const INSTANCE_CEILING: usize = 52;

/// Safety cap for preview scans; generous enough for a daily rule over the
/// longest selectable horizon.
const PREVIEW_CEILING: usize = 366;

/// Bounds on an expansion run. Previews are bounded by a horizon measured
/// from "today" (not from the rule's start date); materialization is bounded
/// by the rule's own end conditions and the instance ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionBounds {
    /// Inclusive last date a candidate may fall on. None for materialization.
    pub horizon_end: Option<NaiveDate>,
    /// Maximum number of dates to emit.
    pub max_dates: usize,
}

impl ExpansionBounds {
    /// Preview window: `horizon_days` calendar days starting at `today`.
    pub fn preview(today: NaiveDate, horizon_days: u32) -> Self {
        ExpansionBounds {
            horizon_end: Some(today + Duration::days(horizon_days as i64 - 1)),
            max_dates: PREVIEW_CEILING,
        }
    }

    /// Materialization: run until the rule's end condition, capped at the
    /// instance ceiling.
    pub fn materialize() -> Self {
        ExpansionBounds {
            horizon_end: None,
            max_dates: INSTANCE_CEILING,
        }
    }
}

/// Expand a recurrence rule into an ordered sequence of dates >= `start`.
///
/// Emission stops at the rule's end date (inclusive), its occurrence count,
/// the bounds' horizon, or the bounds' date cap, whichever comes first. An
/// end date before `start` yields an empty sequence, not an error; so does a
/// custom rule with an empty weekday set. Every generator below walks
/// strictly forward, so the result is sorted and duplicate-free by
/// construction.
pub fn expand(rule: &RecurrenceRule, start: NaiveDate, bounds: &ExpansionBounds) -> Vec<NaiveDate> {
    let mut max_dates = bounds.max_dates;
    if let Some(count) = rule.end().max_visits {
        max_dates = max_dates.min(count as usize);
    }
    if max_dates == 0 {
        return Vec::new();
    }

    let in_bounds = |date: NaiveDate| -> bool {
        if let Some(until) = rule.end().until {
            if date > until {
                return false;
            }
        }
        if let Some(horizon_end) = bounds.horizon_end {
            if date > horizon_end {
                return false;
            }
        }
        true
    };

    let mut dates: Vec<NaiveDate> = Vec::new();

    match rule.kind() {
        RecurrenceKind::None => {
            // One-shot: the start date itself, if the window admits it
            if in_bounds(start) {
                dates.push(start);
            }
        }
        RecurrenceKind::Daily | RecurrenceKind::Weekly => {
            let step = match rule.kind() {
                RecurrenceKind::Daily => rule.interval() as i64,
                _ => rule.interval() as i64 * 7,
            };
            let mut k: i64 = 0;
            loop {
                let candidate = start + Duration::days(k * step);
                if !in_bounds(candidate) {
                    break;
                }
                dates.push(candidate);
                if dates.len() == max_dates {
                    break;
                }
                k += 1;
            }
        }
        RecurrenceKind::Monthly => {
            let mut k: u32 = 0;
            loop {
                let candidate = add_months_clamped(start, k * rule.interval());
                if !in_bounds(candidate) {
                    break;
                }
                dates.push(candidate);
                if dates.len() == max_dates {
                    break;
                }
                k += 1;
            }
        }
        RecurrenceKind::Custom => {
            if rule.weekdays().is_empty() {
                return dates;
            }
            let mut day = start;
            while in_bounds(day) {
                if rule.weekdays().contains(&weekday_index(day)) {
                    dates.push(day);
                    if dates.len() == max_dates {
                        break;
                    }
                }
                day = match day.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    dates
}

/// Advance a date by whole calendar months, clamping the day-of-month to the
/// last day of the target month (Jan 31 + 1 month = Feb 28/29). The clamp is
/// applied against the original date each time, so Jan 31 + 2 months is
/// Mar 31, not Mar 28.
fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() as i64 + months as i64;
    let year = date.year() as i64 + total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year as i32, month));

    NaiveDate::from_ymd_opt(year as i32, month, day).expect("clamped day is always valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .expect("first of month always has a predecessor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recurrence::{EndBound, RecurrenceKind, RecurrenceRule};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(kind: RecurrenceKind, interval: u32, weekdays: Vec<u8>, end: EndBound) -> RecurrenceRule {
        RecurrenceRule::new(kind, interval, weekdays, end).unwrap()
    }

    #[test]
    fn test_weekly_rule_over_two_week_horizon() {
        // Start on a Monday with a 14-day preview horizon: exactly two
        // Mondays, seven days apart
        let monday = date(2025, 1, 6);
        let weekly = rule(RecurrenceKind::Weekly, 1, vec![], EndBound::none());
        let dates = expand(&weekly, monday, &ExpansionBounds::preview(monday, 14));

        assert_eq!(dates, vec![monday, date(2025, 1, 13)]);
        assert_eq!(weekday_index(dates[0]), 1);
        assert_eq!(weekday_index(dates[1]), 1);
    }

    #[test]
    fn test_custom_tue_fri_over_ten_day_horizon() {
        // Tue/Fri set over a 10-day window starting Monday: that Tuesday,
        // that Friday, and the following Tuesday
        let monday = date(2025, 1, 6);
        let custom = rule(RecurrenceKind::Custom, 1, vec![2, 5], EndBound::none());
        let dates = expand(&custom, monday, &ExpansionBounds::preview(monday, 10));

        assert_eq!(
            dates,
            vec![date(2025, 1, 7), date(2025, 1, 10), date(2025, 1, 14)]
        );
    }

    #[test]
    fn test_daily_interval_three() {
        let start = date(2025, 3, 1);
        let daily = rule(RecurrenceKind::Daily, 3, vec![], EndBound::max_visits(4));
        let dates = expand(&daily, start, &ExpansionBounds::materialize());

        assert_eq!(
            dates,
            vec![start, date(2025, 3, 4), date(2025, 3, 7), date(2025, 3, 10)]
        );
    }

    #[test]
    fn test_monthly_clamps_month_end() {
        let start = date(2025, 1, 31);
        let monthly = rule(RecurrenceKind::Monthly, 1, vec![], EndBound::max_visits(4));
        let dates = expand(&monthly, start, &ExpansionBounds::materialize());

        // Feb clamps to 28, later months recover the original day
        assert_eq!(
            dates,
            vec![start, date(2025, 2, 28), date(2025, 3, 31), date(2025, 4, 30)]
        );
    }

    #[test]
    fn test_monthly_clamp_leap_year() {
        let start = date(2024, 1, 31);
        let monthly = rule(RecurrenceKind::Monthly, 1, vec![], EndBound::max_visits(2));
        let dates = expand(&monthly, start, &ExpansionBounds::materialize());

        assert_eq!(dates, vec![start, date(2024, 2, 29)]);
    }

    #[test]
    fn test_end_date_before_start_yields_empty() {
        let start = date(2025, 6, 10);
        let weekly = rule(
            RecurrenceKind::Weekly,
            1,
            vec![],
            EndBound::until(date(2025, 6, 1)),
        );
        let dates = expand(&weekly, start, &ExpansionBounds::materialize());
        assert!(dates.is_empty());
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let start = date(2025, 6, 2);
        let weekly = rule(
            RecurrenceKind::Weekly,
            1,
            vec![],
            EndBound::until(date(2025, 6, 9)),
        );
        let dates = expand(&weekly, start, &ExpansionBounds::materialize());
        assert_eq!(dates, vec![start, date(2025, 6, 9)]);
    }

    #[test]
    fn test_count_bound_wins_over_horizon() {
        // Unbounded weekly rule with count 3: exactly 3 dates regardless of
        // how wide the horizon is
        let start = date(2025, 1, 6);
        let weekly = rule(RecurrenceKind::Weekly, 1, vec![], EndBound::max_visits(3));
        let dates = expand(&weekly, start, &ExpansionBounds::preview(start, 90));
        assert_eq!(dates.len(), 3);
    }

    #[test]
    fn test_both_bounds_stop_at_first_reached() {
        let start = date(2025, 1, 6);
        let end = EndBound {
            until: Some(date(2025, 1, 20)),
            max_visits: Some(10),
        };
        let weekly = rule(RecurrenceKind::Weekly, 1, vec![], end);
        let dates = expand(&weekly, start, &ExpansionBounds::materialize());
        // Date bound reached first: Jan 6, 13, 20
        assert_eq!(dates.len(), 3);

        let end = EndBound {
            until: Some(date(2025, 12, 31)),
            max_visits: Some(2),
        };
        let weekly = rule(RecurrenceKind::Weekly, 1, vec![], end);
        let dates = expand(&weekly, start, &ExpansionBounds::materialize());
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn test_custom_empty_weekday_set_yields_empty() {
        let start = date(2025, 1, 6);
        let custom = rule(RecurrenceKind::Custom, 1, vec![], EndBound::none());
        let dates = expand(&custom, start, &ExpansionBounds::preview(start, 30));
        assert!(dates.is_empty());
    }

    #[test]
    fn test_one_shot_emits_start_only() {
        let start = date(2025, 5, 1);
        let dates = expand(
            &RecurrenceRule::one_shot(),
            start,
            &ExpansionBounds::materialize(),
        );
        assert_eq!(dates, vec![start]);
    }

    #[test]
    fn test_instance_ceiling_caps_unbounded_rules() {
        let start = date(2025, 1, 1);
        let daily = rule(RecurrenceKind::Daily, 1, vec![], EndBound::none());
        let dates = expand(&daily, start, &ExpansionBounds::materialize());
        assert_eq!(dates.len(), INSTANCE_CEILING);
    }

    proptest! {
        #[test]
        fn prop_weekly_dates_are_exactly_7n_apart(
            interval in 1u32..5,
            count in 2u32..10,
            day_offset in 0i64..3650,
        ) {
            let start = date(2020, 1, 1) + Duration::days(day_offset);
            let weekly = rule(
                RecurrenceKind::Weekly,
                interval,
                vec![],
                EndBound::max_visits(count),
            );
            let dates = expand(&weekly, start, &ExpansionBounds::materialize());

            prop_assert_eq!(dates.len(), count as usize);
            for pair in dates.windows(2) {
                prop_assert_eq!((pair[1] - pair[0]).num_days(), interval as i64 * 7);
            }
        }

        #[test]
        fn prop_custom_dates_match_weekday_set_with_no_gaps(
            weekday_mask in 1u8..128,
            day_offset in 0i64..3650,
        ) {
            let weekdays: Vec<u8> = (0..7).filter(|d| weekday_mask & (1 << d) != 0).collect();
            let start = date(2020, 1, 1) + Duration::days(day_offset);
            let custom = rule(RecurrenceKind::Custom, 1, weekdays.clone(), EndBound::none());
            let bounds = ExpansionBounds::preview(start, 28);
            let dates = expand(&custom, start, &bounds);

            // Every emitted date's weekday is in the set
            for d in &dates {
                prop_assert!(weekdays.contains(&weekday_index(*d)));
            }

            // Every qualifying day inside the window is present (no gaps)
            let mut day = start;
            let horizon_end = bounds.horizon_end.unwrap();
            while day <= horizon_end {
                if weekdays.contains(&weekday_index(day)) {
                    prop_assert!(dates.contains(&day));
                }
                day = day.succ_opt().unwrap();
            }
        }

        #[test]
        fn prop_expansion_is_sorted_and_deduplicated(
            kind_pick in 0u8..4,
            interval in 1u32..4,
            day_offset in 0i64..3650,
        ) {
            let kind = match kind_pick {
                0 => RecurrenceKind::Daily,
                1 => RecurrenceKind::Weekly,
                2 => RecurrenceKind::Monthly,
                _ => RecurrenceKind::Custom,
            };
            let weekdays = if kind == RecurrenceKind::Custom { vec![1, 4] } else { vec![] };
            let start = date(2020, 1, 1) + Duration::days(day_offset);
            let r = rule(kind, interval, weekdays, EndBound::none());
            let dates = expand(&r, start, &ExpansionBounds::materialize());

            for pair in dates.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
