use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::calendar::DateStrategy;
use crate::config::ExportConfig;
use crate::extract::extract_details;
use crate::models::{DatedWorkout, Sport, TrainingPlan};
use crate::parser;

pub mod fit;
pub mod ics;

pub use fit::FitEncoder;
pub use ics::IcsEncoder;

/// Default base name for exported files
pub const DEFAULT_FILE_STEM: &str = "training-plan";

const MAX_FALLBACK_NAME_CHARS: usize = 50;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Garmin FIT workout file
    Fit,
    /// iCalendar event feed
    Ics,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Fit => "fit",
            ExportFormat::Ics => "ics",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fit" => Ok(ExportFormat::Fit),
            "ics" | "ical" | "icalendar" => Ok(ExportFormat::Ics),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No training plan data to export")]
    MissingPlanData,
    #[error("Encoded payload of {size} bytes exceeds the FIT data size field")]
    Overflow { size: usize },
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject blank plan text before parsing
pub fn ensure_plan_text(raw: &str) -> Result<(), ExportError> {
    if raw.trim().is_empty() {
        return Err(ExportError::MissingPlanData);
    }
    Ok(())
}

/// Reject plans that have nothing to place on a calendar
pub fn ensure_plan_data(plan: &TrainingPlan) -> Result<(), ExportError> {
    if plan.is_empty() {
        return Err(ExportError::MissingPlanData);
    }
    Ok(())
}

/// Midnight UTC of a calendar date
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Flatten a plan into dated workouts, seven calendar days per week
///
/// Rest days produce no records.
pub fn flatten_plan(plan: &TrainingPlan, start: NaiveDate, sport: Sport) -> Vec<DatedWorkout> {
    DateStrategy::FixedWeek
        .schedule(plan, start)
        .into_iter()
        .flat_map(|scheduled| {
            scheduled
                .day
                .workouts
                .iter()
                .enumerate()
                .map(move |(workout_index, workout)| {
                    dated_workout(workout, scheduled.date, sport, scheduled.week_index, scheduled.day_index, workout_index)
                })
        })
        .collect()
}

fn dated_workout(
    workout: &str,
    date: NaiveDate,
    sport: Sport,
    week_index: usize,
    day_index: usize,
    workout_index: usize,
) -> DatedWorkout {
    let details = extract_details(workout);
    let distance_km = details.distance.as_deref().and_then(parse_distance_km);
    let duration_seconds = estimate_duration(distance_km, details.pace.as_deref());

    let name = if details.name.is_empty() {
        workout.chars().take(MAX_FALLBACK_NAME_CHARS).collect()
    } else {
        details.name
    };

    DatedWorkout {
        date,
        name,
        sport,
        distance_km,
        duration_seconds,
        description: workout.to_string(),
        week_index,
        day_index,
        workout_index,
    }
}

/// Numeric value of a `"<n>km"` distance label
pub fn parse_distance_km(label: &str) -> Option<Decimal> {
    let value = label.trim().trim_end_matches("km").trim();
    Decimal::from_str(value).ok()
}

/// Minutes per km from an `mm:ss` pace
pub fn pace_minutes_per_km(pace: &str) -> Option<Decimal> {
    let (minutes, seconds) = pace.trim().split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    Some(Decimal::from(minutes) + Decimal::from(seconds) / Decimal::from(60))
}

/// Estimated workout duration in seconds
///
/// Uses distance × pace when both are known, otherwise a distance bracket.
pub fn estimate_duration(distance_km: Option<Decimal>, pace: Option<&str>) -> u32 {
    let Some(distance) = distance_km else {
        return 3600;
    };

    if let Some(minutes_per_km) = pace.and_then(pace_minutes_per_km) {
        let seconds = distance
            .checked_mul(minutes_per_km)
            .and_then(|minutes| minutes.checked_mul(Decimal::from(60)))
            .and_then(|seconds| seconds.round().to_u32());
        if let Some(seconds) = seconds {
            return seconds;
        }
    }

    if distance <= Decimal::from(5) {
        1800
    } else if distance <= Decimal::from(10) {
        3600
    } else if distance <= Decimal::from(21) {
        7200
    } else {
        10800
    }
}

/// Output file name derived from the plan name
pub fn file_name(plan_name: Option<&str>, format: ExportFormat) -> String {
    let stem = plan_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_STEM);
    let stem = stem.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    format!("{}.{}", stem, format.extension())
}

/// Export configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub sport: Sport,
    pub start: NaiveDate,
    pub plan_name: Option<String>,
    /// Creation/stamp time written into the file; defaults to the start date
    pub created_at: Option<DateTime<Utc>>,
}

impl ExportOptions {
    pub fn new(format: ExportFormat, start: NaiveDate) -> Self {
        ExportOptions {
            format,
            sport: Sport::default(),
            start,
            plan_name: None,
            created_at: None,
        }
    }
}

/// Renders plans to export formats and writes them out
#[derive(Debug, Clone)]
pub struct ExportManager {
    profile_version: u16,
    product_id: String,
    uid_domain: String,
}

impl ExportManager {
    pub fn new() -> Self {
        Self::from_config(&ExportConfig::default())
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        ExportManager {
            profile_version: config.fit_profile_version,
            product_id: config.ics_product_id.clone(),
            uid_domain: config.uid_domain.clone(),
        }
    }

    /// Parse raw plan text and encode it in the requested format
    pub fn render(&self, raw: &str, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        ensure_plan_text(raw)?;
        let plan = parser::parse(raw);
        self.render_plan(&plan, options)
    }

    pub fn render_plan(&self, plan: &TrainingPlan, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        ensure_plan_data(plan)?;

        match options.format {
            ExportFormat::Fit => {
                let mut encoder = FitEncoder::new(options.sport).with_profile_version(self.profile_version);
                if let Some(created_at) = options.created_at {
                    encoder = encoder.with_time_created(created_at);
                }
                encoder.encode(plan, options.start)
            }
            ExportFormat::Ics => {
                let mut encoder = IcsEncoder::new()
                    .with_product_id(&self.product_id)
                    .with_uid_domain(&self.uid_domain);
                if let Some(created_at) = options.created_at {
                    encoder = encoder.with_dtstamp(created_at);
                }
                encoder
                    .encode(plan, options.start, options.plan_name.as_deref())
                    .map(String::into_bytes)
            }
        }
    }

    /// Render and write into `output_dir`, returning the written path
    pub fn export<P: AsRef<Path>>(
        &self,
        raw: &str,
        options: &ExportOptions,
        output_dir: P,
    ) -> Result<PathBuf, ExportError> {
        let bytes = self.render(raw, options)?;
        let path = output_dir
            .as_ref()
            .join(file_name(options.plan_name.as_deref(), options.format));

        std::fs::write(&path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), format = %options.format, "Exported training plan");

        Ok(path)
    }
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Week};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const PLAN_TEXT: &str = "\
**Week 1**
**Monday**
Tempo Run: 8km @ 4:30/km HR 150-160
**Tuesday**
**Wednesday**
Easy Run: 5km
- Strides 6 x 100m
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("FIT".parse::<ExportFormat>().unwrap(), ExportFormat::Fit);
        assert_eq!("ical".parse::<ExportFormat>().unwrap(), ExportFormat::Ics);
        assert!(matches!(
            "gpx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_flatten_uses_seven_day_weeks() {
        let plan = TrainingPlan {
            weeks: vec![
                Week {
                    number: "1".to_string(),
                    description: String::new(),
                    days: vec![
                        Day {
                            name: "Monday".to_string(),
                            workouts: vec!["Easy 5km".to_string()],
                        },
                        Day {
                            name: "Tuesday".to_string(),
                            workouts: vec![],
                        },
                    ],
                },
                Week {
                    number: "2".to_string(),
                    description: String::new(),
                    days: vec![Day {
                        name: "Monday".to_string(),
                        workouts: vec!["Long run 15km".to_string(), "Core".to_string()],
                    }],
                },
            ],
            ..TrainingPlan::default()
        };

        let flat = flatten_plan(&plan, date(2024, 1, 1), Sport::Cycling);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].date, date(2024, 1, 1));
        assert_eq!(flat[1].date, date(2024, 1, 8));
        assert_eq!(flat[2].date, date(2024, 1, 8));
        assert_eq!(flat[2].workout_index, 1);
        assert_eq!(flat[1].name, "Long run");
        assert_eq!(flat[1].distance_km, Some(dec!(15)));
        assert!(flat.iter().all(|w| w.sport == Sport::Cycling));
    }

    #[test]
    fn test_estimate_duration() {
        // 8km at 4:30/km = 36 minutes
        assert_eq!(estimate_duration(Some(dec!(8)), Some("4:30")), 2160);
        assert_eq!(estimate_duration(Some(dec!(5)), None), 1800);
        assert_eq!(estimate_duration(Some(dec!(10)), Some("Easy pace")), 3600);
        assert_eq!(estimate_duration(Some(dec!(21)), None), 7200);
        assert_eq!(estimate_duration(Some(dec!(42.2)), None), 10800);
        assert_eq!(estimate_duration(None, Some("5:00")), 3600);
    }

    #[test]
    fn test_estimate_duration_falls_back_on_overflow() {
        assert_eq!(estimate_duration(Some(Decimal::MAX), Some("5:00")), 10800);
        // Fits a Decimal but not a u32 number of seconds
        assert_eq!(estimate_duration(Some(dec!(100000000)), Some("5:00")), 10800);
    }

    #[test]
    fn test_render_huge_distance() {
        let raw = "**Week 1**\n**Monday**\nEasy 79228162514264337593543950335km @ 5:00/km";
        let plan = parser::parse(raw);
        let flat = flatten_plan(&plan, date(2024, 1, 1), Sport::Running);
        assert_eq!(flat[0].distance_km, Some(Decimal::MAX));
        assert_eq!(flat[0].duration_seconds, 10800);

        let manager = ExportManager::new();
        for format in [ExportFormat::Fit, ExportFormat::Ics] {
            let options = ExportOptions::new(format, date(2024, 1, 1));
            assert!(!manager.render(raw, &options).unwrap().is_empty());
        }
    }

    #[test]
    fn test_distance_and_pace_parsing() {
        assert_eq!(parse_distance_km("21.1km"), Some(dec!(21.1)));
        assert_eq!(parse_distance_km("far"), None);
        assert_eq!(pace_minutes_per_km("5:30"), Some(dec!(5.5)));
        assert_eq!(pace_minutes_per_km("fast"), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Some("Spring  Marathon Build"), ExportFormat::Fit), "spring-marathon-build.fit");
        assert_eq!(file_name(None, ExportFormat::Ics), "training-plan.ics");
        assert_eq!(file_name(Some("   "), ExportFormat::Fit), "training-plan.fit");
    }

    #[test]
    fn test_missing_plan_data() {
        let manager = ExportManager::new();
        let options = ExportOptions::new(ExportFormat::Fit, date(2024, 1, 1));

        assert!(matches!(manager.render("  \n ", &options), Err(ExportError::MissingPlanData)));
        assert!(matches!(
            manager.render("Just some prose", &options),
            Err(ExportError::MissingPlanData)
        ));
    }

    #[test]
    fn test_render_both_formats() {
        let manager = ExportManager::new();
        let fit = manager
            .render(PLAN_TEXT, &ExportOptions::new(ExportFormat::Fit, date(2024, 1, 1)))
            .unwrap();
        assert_eq!(fit.len(), 44 + 37 * 3);

        let ics = manager
            .render(PLAN_TEXT, &ExportOptions::new(ExportFormat::Ics, date(2024, 1, 1)))
            .unwrap();
        let ics = String::from_utf8(ics).unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let manager = ExportManager::new();
        let mut options = ExportOptions::new(ExportFormat::Ics, date(2024, 1, 1));
        options.plan_name = Some("Base Block".to_string());

        let path = manager.export(PLAN_TEXT, &options, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "base-block.ics");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("X-WR-CALNAME:Base Block"));
    }
}
