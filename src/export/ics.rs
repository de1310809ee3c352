//! iCalendar (RFC 5545) export, one all-day-anchored event per workout

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::{ensure_plan_data, flatten_plan, midnight_utc, ExportError};
use crate::models::{DatedWorkout, Sport, TrainingPlan};

pub const DEFAULT_PRODUCT_ID: &str = "-//planrs//Training Plan//EN";
pub const DEFAULT_UID_DOMAIN: &str = "planrs.local";
pub const DEFAULT_CALENDAR_NAME: &str = "Training Plan";

const LINE_ENDING: &str = "\r\n";
const EVENT_LENGTH_HOURS: i64 = 1;

/// Encodes training plans as iCalendar feeds
#[derive(Debug, Clone)]
pub struct IcsEncoder {
    product_id: String,
    uid_domain: String,
    dtstamp: Option<DateTime<Utc>>,
}

impl IcsEncoder {
    pub fn new() -> Self {
        IcsEncoder {
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
            dtstamp: None,
        }
    }

    pub fn with_product_id(mut self, product_id: &str) -> Self {
        self.product_id = product_id.to_string();
        self
    }

    pub fn with_uid_domain(mut self, uid_domain: &str) -> Self {
        self.uid_domain = uid_domain.to_string();
        self
    }

    /// Override DTSTAMP (defaults to the plan start at midnight UTC)
    pub fn with_dtstamp(mut self, dtstamp: DateTime<Utc>) -> Self {
        self.dtstamp = Some(dtstamp);
        self
    }

    pub fn encode(
        &self,
        plan: &TrainingPlan,
        start: NaiveDate,
        plan_name: Option<&str>,
    ) -> Result<String, ExportError> {
        ensure_plan_data(plan)?;

        let workouts = flatten_plan(plan, start, Sport::default());
        let dtstamp = self.dtstamp.unwrap_or_else(|| midnight_utc(start));
        Ok(self.encode_workouts(&workouts, plan_name, dtstamp))
    }

    pub fn encode_workouts(
        &self,
        workouts: &[DatedWorkout],
        plan_name: Option<&str>,
        dtstamp: DateTime<Utc>,
    ) -> String {
        let calendar_name = plan_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_CALENDAR_NAME);

        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", self.product_id),
            "CALSCALE:GREGORIAN".to_string(),
            "METHOD:PUBLISH".to_string(),
            format!("X-WR-CALNAME:{}", escape_text(calendar_name)),
            "X-WR-TIMEZONE:UTC".to_string(),
        ];

        let stamp = format_timestamp(dtstamp);
        for workout in workouts {
            let starts = midnight_utc(workout.date);
            let ends = starts + Duration::hours(EVENT_LENGTH_HOURS);

            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!(
                "UID:workout-{}-{}-{}@{}",
                workout.week_index, workout.day_index, workout.workout_index, self.uid_domain
            ));
            lines.push(format!("DTSTAMP:{}", stamp));
            lines.push(format!("DTSTART:{}", format_timestamp(starts)));
            lines.push(format!("DTEND:{}", format_timestamp(ends)));
            lines.push(format!("SUMMARY:{}", escape_text(&event_summary(workout))));
            lines.push(format!("DESCRIPTION:{}", escape_text(&workout.description)));
            lines.push("STATUS:CONFIRMED".to_string());
            lines.push("END:VEVENT".to_string());
        }

        lines.push("END:VCALENDAR".to_string());

        tracing::debug!(events = workouts.len(), "Encoded iCalendar feed");

        let mut out = lines.join(LINE_ENDING);
        out.push_str(LINE_ENDING);
        out
    }
}

impl Default for IcsEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn event_summary(workout: &DatedWorkout) -> String {
    if workout.name.trim().is_empty() {
        format!(
            "Workout - Week {} Day {}",
            workout.week_index + 1,
            workout.day_index + 1
        )
    } else {
        workout.name.clone()
    }
}

/// UTC timestamp in basic format, e.g. `20240101T000000Z`
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT property value
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}
