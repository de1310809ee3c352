use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Structured training plan produced by the plan parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// Free text before the first week header
    pub intro: String,

    /// Weeks in document order
    pub weeks: Vec<Week>,

    /// Free text after the tips header
    pub tips: String,
}

impl TrainingPlan {
    /// A plan without weeks carries nothing to schedule or export
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Total number of `Day` entries across all weeks
    pub fn total_days(&self) -> usize {
        self.weeks.iter().map(|w| w.days.len()).sum()
    }

    /// Total number of workouts across all days
    pub fn total_workouts(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .map(|d| d.workouts.len())
            .sum()
    }
}

/// One week of the plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    /// Raw digit string captured from the week header
    pub number: String,

    /// Text between the week header and its first day
    pub description: String,

    /// Days in document order
    pub days: Vec<Day>,
}

/// One day of a week
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Header text with emphasis markers removed
    pub name: String,

    /// Workout texts; empty for a rest day
    pub workouts: Vec<String>,
}

impl Day {
    pub fn is_rest_day(&self) -> bool {
        self.workouts.is_empty()
    }
}

/// Fields extracted from a single workout line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutDetail {
    pub name: String,
    pub distance: Option<String>,
    pub heart_rate: Option<String>,
    pub pace: Option<String>,
    pub description: String,
}

/// A workout placed on a calendar date, ready for encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedWorkout {
    pub date: NaiveDate,
    pub name: String,
    pub sport: Sport,
    pub distance_km: Option<Decimal>,
    pub duration_seconds: u32,
    /// Raw workout text
    pub description: String,
    pub week_index: usize,
    pub day_index: usize,
    pub workout_index: usize,
}

/// Sports a plan can be exported for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    #[default]
    Running,
    Cycling,
    Swimming,
    Triathlon,
}

impl Sport {
    /// FIT profile `sport` enum value
    ///
    /// Triathlon has no single-sport workout in FIT and is exported as running.
    pub fn fit_code(&self) -> u8 {
        match self {
            Sport::Running | Sport::Triathlon => 1,
            Sport::Cycling => 2,
            Sport::Swimming => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Running => "running",
            Sport::Cycling => "cycling",
            Sport::Swimming => "swimming",
            Sport::Triathlon => "triathlon",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" | "run" => Ok(Sport::Running),
            "cycling" | "bike" | "ride" => Ok(Sport::Cycling),
            "swimming" | "swim" => Ok(Sport::Swimming),
            "triathlon" | "tri" => Ok(Sport::Triathlon),
            _ => Err(format!("Unknown sport: {}", s)),
        }
    }
}

/// Intensity label for a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Easy,
    Moderate,
    Hard,
    Recovery,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Easy => "easy",
            Intensity::Moderate => "moderate",
            Intensity::Hard => "hard",
            Intensity::Recovery => "recovery",
        }
    }

    /// Capitalized label shown on calendar badges
    pub fn display_label(&self) -> &'static str {
        match self {
            Intensity::Easy => "Easy",
            Intensity::Moderate => "Moderate",
            Intensity::Hard => "Hard",
            Intensity::Recovery => "Recovery",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance and duration totals for a set of workouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutStats {
    /// Numeric distance as written in the text (miles are not converted)
    pub distance_km: Decimal,

    pub duration_minutes: u32,
}

impl WorkoutStats {
    pub fn is_rest(&self) -> bool {
        self.distance_km.is_zero() && self.duration_minutes == 0
    }
}

impl Add for WorkoutStats {
    type Output = WorkoutStats;

    fn add(self, rhs: WorkoutStats) -> WorkoutStats {
        WorkoutStats {
            distance_km: self.distance_km.saturating_add(rhs.distance_km),
            duration_minutes: self.duration_minutes.saturating_add(rhs.duration_minutes),
        }
    }
}

impl AddAssign for WorkoutStats {
    fn add_assign(&mut self, rhs: WorkoutStats) {
        *self = *self + rhs;
    }
}

impl Sum for WorkoutStats {
    fn sum<I: Iterator<Item = WorkoutStats>>(iter: I) -> Self {
        iter.fold(WorkoutStats::default(), Add::add)
    }
}

/// A card from a stretching routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub duration: String,
    pub description: String,
}
