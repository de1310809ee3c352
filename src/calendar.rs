//! Calendar projection and workout statistics
//!
//! Two date rules exist for placing a plan on the calendar:
//!
//! - [`DateStrategy::Sequential`] advances one calendar day per `Day` entry and
//!   drives the calendar view.
//! - [`DateStrategy::FixedWeek`] places a day at `week_index * 7 + day_index`
//!   and drives the FIT and iCalendar exports.
//!
//! They agree only when every week lists exactly seven days.

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::extract::extract_display_name;
use crate::intensity::classify_day;
use crate::models::{Day, Intensity, TrainingPlan, WorkoutStats};

const DAYS_PER_WEEK: u64 = 7;
const MINUTES_PER_HOUR: u32 = 60;

/// Rule for turning a day's position in the plan into a calendar date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStrategy {
    /// One calendar day per `Day`, ignoring week boundaries
    #[default]
    Sequential,
    /// Every week spans seven calendar days
    FixedWeek,
}

impl FromStr for DateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(DateStrategy::Sequential),
            "fixed_week" | "week" => Ok(DateStrategy::FixedWeek),
            _ => Err(format!("Invalid date strategy: {}", s)),
        }
    }
}

/// A plan day with its assigned date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledDay<'p> {
    pub date: NaiveDate,
    pub week_index: usize,
    pub day_index: usize,
    pub day: &'p Day,
}

impl DateStrategy {
    /// Assign a date to every day of the plan, in plan order
    pub fn schedule<'p>(&self, plan: &'p TrainingPlan, start: NaiveDate) -> Vec<ScheduledDay<'p>> {
        let mut scheduled = Vec::with_capacity(plan.total_days());
        let mut sequence: u64 = 0;

        for (week_index, week) in plan.weeks.iter().enumerate() {
            for (day_index, day) in week.days.iter().enumerate() {
                let offset = match self {
                    DateStrategy::Sequential => sequence,
                    DateStrategy::FixedWeek => week_index as u64 * DAYS_PER_WEEK + day_index as u64,
                };
                sequence += 1;

                let Some(date) = start.checked_add_days(Days::new(offset)) else {
                    tracing::warn!(offset, %start, "Plan extends past the supported date range");
                    return scheduled;
                };

                scheduled.push(ScheduledDay {
                    date,
                    week_index,
                    day_index,
                    day,
                });
            }
        }

        scheduled
    }
}

/// Map each plan day to a calendar date, one day per `Day` entry
///
/// Rest days are present with an empty workout list.
pub fn map_to_dates(plan: &TrainingPlan, start: NaiveDate) -> BTreeMap<NaiveDate, Vec<String>> {
    map_to_dates_with(plan, start, DateStrategy::Sequential)
}

/// Same as [`map_to_dates`] with an explicit date rule.
///
/// When two days land on the same date the later one wins.
pub fn map_to_dates_with(
    plan: &TrainingPlan,
    start: NaiveDate,
    strategy: DateStrategy,
) -> BTreeMap<NaiveDate, Vec<String>> {
    strategy
        .schedule(plan, start)
        .into_iter()
        .map(|scheduled| (scheduled.date, scheduled.day.workouts.clone()))
        .collect()
}

/// Last calendar date covered by the plan under the sequential rule
pub fn plan_end_date(plan: &TrainingPlan, start: NaiveDate) -> Option<NaiveDate> {
    let total = plan.total_days() as u64;
    if total == 0 {
        return None;
    }
    start.checked_add_days(Days::new(total - 1))
}

pub fn is_within_plan(plan: &TrainingPlan, start: NaiveDate, date: NaiveDate) -> bool {
    plan_end_date(plan, start)
        .map(|end| date >= start && date <= end)
        .unwrap_or(false)
}

static STATS_DISTANCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:km|k|miles?|mi)\b").ok());

static STATS_DURATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(min|minutes?|hrs?|hours?)").ok());

/// Distance and duration of a single workout
///
/// Takes the first distance token (numeric value as written, miles included)
/// and the first duration token, converting hours to minutes. A distance unit
/// must end at a word boundary so "30 min" is not read as 30 miles.
pub fn workout_stats(workout: &str) -> WorkoutStats {
    let lower = workout.to_lowercase();

    let distance_km = STATS_DISTANCE
        .as_ref()
        .and_then(|re| re.captures(&lower))
        .and_then(|caps| Decimal::from_str(caps.get(1)?.as_str()).ok())
        .unwrap_or(Decimal::ZERO);

    let duration_minutes = STATS_DURATION
        .as_ref()
        .and_then(|re| re.captures(&lower))
        .and_then(|caps| {
            let value: u32 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2)?.as_str();
            if unit.starts_with('h') {
                Some(value.saturating_mul(MINUTES_PER_HOUR))
            } else {
                Some(value)
            }
        })
        .unwrap_or(0);

    WorkoutStats {
        distance_km,
        duration_minutes,
    }
}

/// Total distance and duration across workouts
pub fn aggregate_stats<S: AsRef<str>>(workouts: &[S]) -> WorkoutStats {
    workouts.iter().map(|w| workout_stats(w.as_ref())).sum()
}

/// Totals per Monday-first calendar week, keyed by the week's Monday
pub fn weekly_stats(dated: &BTreeMap<NaiveDate, Vec<String>>) -> BTreeMap<NaiveDate, WorkoutStats> {
    let mut weeks: BTreeMap<NaiveDate, WorkoutStats> = BTreeMap::new();
    for (date, workouts) in dated {
        let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
        let monday = date.checked_sub_days(back).unwrap_or(*date);
        *weeks.entry(monday).or_default() += aggregate_stats(workouts);
    }
    weeks
}

/// One row of the calendar view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub week_number: String,
    pub day_name: String,
    /// Display name of the first workout, empty on rest days
    pub title: String,
    pub intensity: Intensity,
    pub stats: WorkoutStats,
    pub workouts: Vec<String>,
}

/// Calendar rows for every plan day under the given date rule
///
/// Rest days are labelled with [`Intensity::Recovery`].
pub fn calendar_entries(
    plan: &TrainingPlan,
    start: NaiveDate,
    strategy: DateStrategy,
) -> Vec<CalendarEntry> {
    strategy
        .schedule(plan, start)
        .into_iter()
        .map(|scheduled| {
            let workouts = &scheduled.day.workouts;
            CalendarEntry {
                date: scheduled.date,
                week_number: plan.weeks[scheduled.week_index].number.clone(),
                day_name: scheduled.day.name.clone(),
                title: extract_display_name(workouts),
                intensity: classify_day(workouts).unwrap_or(Intensity::Recovery),
                stats: aggregate_stats(workouts),
                workouts: workouts.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Week;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plan_with_days(days_per_week: &[usize]) -> TrainingPlan {
        TrainingPlan {
            weeks: days_per_week
                .iter()
                .enumerate()
                .map(|(w, &count)| Week {
                    number: (w + 1).to_string(),
                    description: String::new(),
                    days: (0..count)
                        .map(|d| Day {
                            name: format!("Day {}", d + 1),
                            workouts: vec![format!("Easy run {}km", d + 1)],
                        })
                        .collect(),
                })
                .collect(),
            ..TrainingPlan::default()
        }
    }

    #[test]
    fn test_sequential_mapping_advances_per_day() {
        let plan = plan_with_days(&[3, 2]);
        let map = map_to_dates(&plan, date(2024, 1, 1));

        let dates: Vec<NaiveDate> = map.keys().copied().collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 2),
                date(2024, 1, 3),
                date(2024, 1, 4),
                date(2024, 1, 5),
            ]
        );
        assert_eq!(map[&date(2024, 1, 4)], vec!["Easy run 1km".to_string()]);
    }

    #[test]
    fn test_strategies_diverge_for_short_weeks() {
        let plan = plan_with_days(&[5, 5]);
        let start = date(2024, 1, 1);

        let sequential = DateStrategy::Sequential.schedule(&plan, start);
        let fixed = DateStrategy::FixedWeek.schedule(&plan, start);

        // first day of week 2
        assert_eq!(sequential[5].date, date(2024, 1, 6));
        assert_eq!(fixed[5].date, date(2024, 1, 8));
        assert_eq!(fixed[5].week_index, 1);
        assert_eq!(fixed[5].day_index, 0);
    }

    #[test]
    fn test_strategies_agree_for_full_weeks() {
        let plan = plan_with_days(&[7, 7]);
        let start = date(2024, 3, 4);

        let sequential: Vec<NaiveDate> = DateStrategy::Sequential
            .schedule(&plan, start)
            .iter()
            .map(|s| s.date)
            .collect();
        let fixed: Vec<NaiveDate> = DateStrategy::FixedWeek
            .schedule(&plan, start)
            .iter()
            .map(|s| s.date)
            .collect();
        assert_eq!(sequential, fixed);
    }

    #[test]
    fn test_rest_days_are_mapped() {
        let mut plan = plan_with_days(&[2]);
        plan.weeks[0].days[1].workouts.clear();

        let map = map_to_dates(&plan, date(2024, 1, 1));
        assert_eq!(map.len(), 2);
        assert!(map[&date(2024, 1, 2)].is_empty());
    }

    #[test]
    fn test_workout_stats() {
        let stats = workout_stats("Long run 21.1km, about 2 hours");
        assert_eq!(stats.distance_km, dec!(21.1));
        assert_eq!(stats.duration_minutes, 120);

        let stats = workout_stats("Bike 45 min at HR 130-140");
        assert_eq!(stats.distance_km, Decimal::ZERO);
        assert_eq!(stats.duration_minutes, 45);

        let stats = workout_stats("Easy 5 miles");
        assert_eq!(stats.distance_km, dec!(5));

        assert!(workout_stats("Rest").is_rest());
    }

    #[test]
    fn test_aggregate_equals_sum_of_parts() {
        let workouts = vec![
            "Tempo 8km".to_string(),
            "Swim 30 minutes".to_string(),
            "Ride 1 hr".to_string(),
        ];
        let total = aggregate_stats(&workouts);
        let parts: WorkoutStats = workouts.iter().map(|w| workout_stats(w)).sum();

        assert_eq!(total, parts);
        assert_eq!(total.distance_km, dec!(8));
        assert_eq!(total.duration_minutes, 90);
    }

    #[test]
    fn test_aggregate_saturates_on_huge_distances() {
        let workouts = ["Long run 79228162514264337593543950335km"; 2];
        let total = aggregate_stats(&workouts);
        assert_eq!(total.distance_km, Decimal::MAX);
    }

    #[test]
    fn test_plan_span() {
        let plan = plan_with_days(&[3, 4]);
        let start = date(2024, 2, 26);

        assert_eq!(plan_end_date(&plan, start), Some(date(2024, 3, 3)));
        assert!(is_within_plan(&plan, start, date(2024, 3, 1)));
        assert!(!is_within_plan(&plan, start, date(2024, 3, 4)));
        assert!(!is_within_plan(&plan, start, date(2024, 2, 25)));
        assert_eq!(plan_end_date(&TrainingPlan::default(), start), None);
    }

    #[test]
    fn test_weekly_stats_group_by_monday() {
        // 2024-01-03 is a Wednesday
        let plan = plan_with_days(&[7]);
        let map = map_to_dates(&plan, date(2024, 1, 3));
        let weeks = weekly_stats(&map);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[&date(2024, 1, 1)].distance_km, dec!(15)); // 1+2+3+4+5
        assert_eq!(weeks[&date(2024, 1, 8)].distance_km, dec!(13)); // 6+7
    }

    #[test]
    fn test_calendar_entries() {
        let mut plan = plan_with_days(&[2]);
        plan.weeks[0].days[1].workouts = vec![];
        let entries = calendar_entries(&plan, date(2024, 1, 1), DateStrategy::Sequential);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Easy run");
        assert_eq!(entries[0].intensity, Intensity::Easy);
        assert_eq!(entries[0].stats.distance_km, dec!(1));
        assert_eq!(entries[1].title, "");
        assert_eq!(entries[1].intensity, Intensity::Recovery);
    }

    #[test]
    fn test_date_strategy_parsing() {
        assert_eq!("fixed-week".parse::<DateStrategy>().unwrap(), DateStrategy::FixedWeek);
        assert_eq!("Sequential".parse::<DateStrategy>().unwrap(), DateStrategy::Sequential);
        assert!("monthly".parse::<DateStrategy>().is_err());
    }
}
