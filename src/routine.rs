//! Stretching routine cards
//!
//! A routine is a list of `**Name** - duration` headers, each followed by free
//! text describing the movement. Text before the first header is ignored.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Exercise;

static EXERCISE_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*\s*[-–—]\s*(.+)").ok());

/// Split routine text into exercise cards
pub fn parse_routine(text: &str) -> Vec<Exercise> {
    let Some(header) = EXERCISE_HEADER.as_ref() else {
        return Vec::new();
    };

    let mut exercises: Vec<Exercise> = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(caps) = header.captures(line) {
            exercises.push(Exercise {
                name: caps[1].trim().to_string(),
                duration: caps[2].trim().to_string(),
                description: String::new(),
            });
        } else if let Some(current) = exercises.last_mut() {
            if !current.description.is_empty() {
                current.description.push(' ');
            }
            current.description.push_str(line);
        }
    }

    tracing::debug!(exercises = exercises.len(), "Parsed stretching routine");
    exercises
}
