//! Field extraction for individual workout lines
//!
//! Workouts arrive as free text such as
//! `"Tempo Run: 8km @ 4:30/km HR 150-160"`. Each field is pulled out by an
//! ordered [`Cascade`] of patterns; the first rule that produces a value wins.
//! Every function here has a final fallback, so extraction never fails.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::cascade::Cascade;
use crate::models::WorkoutDetail;

/// Description used when nothing descriptive remains after stripping stats
pub const FALLBACK_DESCRIPTION: &str =
    "Complete this workout as prescribed to build your fitness and progress toward your goals.";

/// Name used when no word survives the name fallback
pub const FALLBACK_NAME: &str = "Workout";

const MAX_DESCRIPTION_CHARS: usize = 300;
const MAX_DESCRIPTION_SENTENCES: usize = 4;
const MAX_FALLBACK_NAME_WORDS: usize = 5;

/// Unit a distance token was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeartRateForm {
    Range,
    Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaceForm {
    Clock,
    Qualitative,
}

static LEADING_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: "1. - ", "2) ", "- ", "• ", "3.- "
    Regex::new(r"^(?:\d+\.?\s*[-–—•]\s*|(?:\d+[.)]|[-–—•*]+)\s+)+").ok()
});

static NAME_RULES: LazyLock<Cascade<()>> = LazyLock::new(|| {
    Cascade::compile(&[
        ("before_colon", r"^([^:•]+?):", ()),
        ("before_bullet", r"^([^•]+?)•", ()),
        ("before_distance", r"(?i)^(.*?)\s+\d+(?:\.\d+)?\s*(?:km|k|mi|miles)", ()),
        ("before_keyword", r"(?i)^(.*?)\s+(?:HR|Heart Rate|Zone|Pace)", ()),
    ])
});

static STAT_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\d|@|(?:km|k|mi|miles?|hr|zone|pace|bpm)\W*$)").ok()
});

static DISTANCE_RULES: LazyLock<Cascade<DistanceUnit>> = LazyLock::new(|| {
    Cascade::compile(&[
        ("km", r"(?i)(\d+(?:\.\d+)?)\s*km\b", DistanceUnit::Kilometers),
        ("k", r"(?i)(\d+(?:\.\d+)?)\s*k\b", DistanceUnit::Kilometers),
        ("kilometers", r"(?i)(\d+(?:\.\d+)?)\s*kilometers?", DistanceUnit::Kilometers),
        ("miles", r"(?i)(\d+(?:\.\d+)?)\s*miles?", DistanceUnit::Miles),
        ("mi", r"(?i)(\d+(?:\.\d+)?)\s*mi\b", DistanceUnit::Miles),
    ])
});

static HEART_RATE_RULES: LazyLock<Cascade<HeartRateForm>> = LazyLock::new(|| {
    Cascade::compile(&[
        ("hr_range", r"(?i)HR[:\s]+(\d+\s*-\s*\d+)\s*(?:bpm|%)?", HeartRateForm::Range),
        (
            "heart_rate_range",
            r"(?i)Heart\s*Rate[:\s]+(\d+\s*-\s*\d+)\s*(?:bpm|%)?",
            HeartRateForm::Range,
        ),
        ("zone", r"(?i)Zone\s+(\d+)", HeartRateForm::Zone),
        ("bpm_range", r"(?i)(\d+\s*-\s*\d+)\s*bpm", HeartRateForm::Range),
        ("percent_max", r"(?i)(\d+\s*-\s*\d+)\s*%\s*(?:max|MHR)", HeartRateForm::Range),
        ("hr_zone", r"(?i)HR[:\s]+Zone\s+(\d+)", HeartRateForm::Zone),
        ("hr_compact_range", r"(?i)HR[:\s]+(\d+-\d+)", HeartRateForm::Range),
    ])
});

static PACE_RULES: LazyLock<Cascade<PaceForm>> = LazyLock::new(|| {
    Cascade::compile(&[
        ("pace_clock", r"(?i)Pace[:\s]+(\d+:\d+)\s*(?:/|per)?\s*km", PaceForm::Clock),
        (
            "pace_word",
            r"(?i)Pace[:\s]+(easy|moderate|tempo|steady|recovery|comfortable|conversational|fast|slow)",
            PaceForm::Qualitative,
        ),
        ("at_clock", r"(?i)@\s*(\d+:\d+)\s*(?:/|per)?\s*km", PaceForm::Clock),
        ("clock_per_km", r"(?i)(\d+:\d+)\s*(?:/|per)\s*km", PaceForm::Clock),
        (
            "at_word_pace",
            r"(?i)(?:at|@)\s+(?:an?\s+)?(easy|moderate|tempo|steady|recovery|comfortable|conversational)\s*pace",
            PaceForm::Qualitative,
        ),
    ])
});

static DISTANCE_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+(?:\.\d+)?\s*(?:kilometers?|km|k|miles?|mi)\b").ok()
});

/// Stat substrings removed from the description, applied in order
static STAT_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)HR[:\s]+\d+\s*-?\s*\d*\s*(?:bpm|%)?",
        r"(?i)Heart\s*Rate[:\s]+\d+\s*-?\s*\d*\s*(?:bpm|%)?",
        r"(?i)Zone\s+\d+(?:-\d+)?",
        r"(?i)(?:Pace|@)[:\s]+\d+:\d+\s*(?:min\s*)?(?:/|per)?\s*km",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static SEPARATORS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[:\-–—•]+").ok());
static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());
static LEADING_PUNCTUATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\s,.]+").ok());
static SENTENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").ok());

/// Extract name, distance, heart rate, pace and description from one workout
pub fn extract_details(workout: &str) -> WorkoutDetail {
    let text = clean_workout_text(workout);
    let name = extract_name(&text);

    WorkoutDetail {
        distance: extract_distance(&text),
        heart_rate: extract_heart_rate(&text),
        pace: extract_pace(&text),
        description: extract_description(&text, &name),
        name,
    }
}

/// Remove emphasis markers and a leading ordinal or bullet
pub fn clean_workout_text(workout: &str) -> String {
    let text = workout.replace("**", "");
    let text = text.trim();
    match LEADING_PREFIX.as_ref() {
        Some(prefix) => prefix.replace(text, "").trim().to_string(),
        None => text.to_string(),
    }
}

/// Workout name from cleaned text
pub fn extract_name(text: &str) -> String {
    NAME_RULES
        .first_accepted(text, |_, caps| non_empty_group(caps, 1))
        .unwrap_or_else(|| fallback_name(text))
}

fn fallback_name(text: &str) -> String {
    let words: Vec<&str> = text
        .split_whitespace()
        .take(MAX_FALLBACK_NAME_WORDS)
        .take_while(|word| !is_stat_token(word))
        .collect();

    if words.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        words.join(" ")
    }
}

/// Whether a word looks like a number or a stat label rather than a name
pub(crate) fn is_stat_token(word: &str) -> bool {
    STAT_TOKEN
        .as_ref()
        .map(|re| re.is_match(word))
        .unwrap_or(false)
}

/// Distance normalized to `"<n>km"`
pub fn extract_distance(text: &str) -> Option<String> {
    DISTANCE_RULES
        .first_match(text)
        .and_then(|(rule, caps)| caps.get(1).map(|m| distance_label(m.as_str(), rule.value)))
}

/// Render a captured distance with the km suffix.
///
/// Miles are passed through unconverted: `"5 miles"` becomes `"5km"`.
pub fn distance_label(value: &str, unit: DistanceUnit) -> String {
    match unit {
        DistanceUnit::Kilometers | DistanceUnit::Miles => format!("{}km", value),
    }
}

/// Heart-rate range, or `"Zone <n>"` for zone references
pub fn extract_heart_rate(text: &str) -> Option<String> {
    let (rule, caps) = HEART_RATE_RULES.first_match(text)?;
    let value = caps.get(1)?.as_str();

    let is_zone = rule.value == HeartRateForm::Zone || value.chars().all(|c| c.is_ascii_digit());
    if is_zone {
        Some(format!("Zone {}", value))
    } else {
        Some(value.to_string())
    }
}

/// `mm:ss` pace, or a capitalized qualitative pace such as `"Easy pace"`
pub fn extract_pace(text: &str) -> Option<String> {
    let (rule, caps) = PACE_RULES.first_match(text)?;
    let value = caps.get(1)?.as_str();

    match rule.value {
        PaceForm::Clock => Some(value.to_string()),
        PaceForm::Qualitative => Some(format!("{} pace", capitalize(value))),
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Descriptive text left after removing the name and all stats
pub fn extract_description(text: &str, name: &str) -> String {
    let mut description = strip_name_prefix(text, name);
    description = strip_distances(&description);

    for pattern in STAT_NOISE.iter() {
        description = pattern.replace_all(&description, "").into_owned();
    }

    description = replace_all(&SEPARATORS, &description, "").trim().to_string();
    description = replace_all(&WHITESPACE, &description, " ");
    description = replace_all(&LEADING_PUNCTUATION, &description, "");

    let sentences: Vec<&str> = SENTENCE
        .as_ref()
        .map(|re| {
            re.find_iter(&description)
                .map(|m| m.as_str().trim())
                .take(MAX_DESCRIPTION_SENTENCES)
                .collect()
        })
        .unwrap_or_default();

    if !sentences.is_empty() {
        return sentences.join(" ");
    }

    let description = description.trim();
    if description.is_empty() {
        return FALLBACK_DESCRIPTION.to_string();
    }

    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", truncated.trim_end())
    } else {
        description.to_string()
    }
}

fn strip_name_prefix(text: &str, name: &str) -> String {
    if name.is_empty() {
        return text.to_string();
    }

    let pattern = format!(r"(?i)^{}[:\s•\-–—]*", regex::escape(name));
    match Regex::new(&pattern) {
        Ok(re) => re.replace(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Remove distance tokens, keeping rate units such as `"5 km/h"`
fn strip_distances(text: &str) -> String {
    let Some(re) = DISTANCE_TOKEN.as_ref() else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if text[m.end()..].trim_start().starts_with('/') {
            out.push_str(m.as_str());
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

fn non_empty_group(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Calendar display name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayRule {
    /// "<Type> Run:" style prefix, taken as is
    Explicit,
    /// Label before a separator, rejected if it contains stat words
    Labelled,
    /// Text before a stat, trailing punctuation removed
    Leading,
}

const MIN_DISPLAY_NAME_CHARS: usize = 3;
const MAX_DISPLAY_NAME_CHARS: usize = 50;
const MAX_DISPLAY_FALLBACK_WORDS: usize = 6;
const DISPLAY_FALLBACK_CHARS: usize = 40;
const MAX_DISPLAY_WORD_CHARS: usize = 20;

static DISPLAY_LEADING_ORDINAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").ok());
static DISPLAY_LEADING_BULLET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[-–—•*]+\s*").ok());
static DISPLAY_STAT_WORDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(km|mi|bpm|zone|hr|pace)").ok());
static DISPLAY_TRAILING_PUNCTUATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\s,.:;\-–—•]+$").ok());

static DISPLAY_RULES: LazyLock<Cascade<DisplayRule>> = LazyLock::new(|| {
    Cascade::compile(&[
        (
            "explicit_type",
            r"(?i)^((?:Easy|Long|Recovery|Tempo|Interval|Speed|Hill|Fartlek|Threshold|Base|Foundation|Endurance|Progressive)\s+(?:Run|Ride|Swim|Session|Workout))[:\-–—•]",
            DisplayRule::Explicit,
        ),
        ("before_colon", r"^([^:]+?):\s", DisplayRule::Labelled),
        ("before_dash", r"^([^–—•]+)[–—•]", DisplayRule::Labelled),
        (
            "before_distance",
            r"(?i)^(.*?)\s+\d+(?:\.\d+)?\s*(?:km|k|mi|miles)",
            DisplayRule::Leading,
        ),
        ("before_heart_rate", r"(?i)^(.*?)\s+(?:HR|Heart Rate|Zone|@)", DisplayRule::Leading),
    ])
});

/// Short name for a day's first workout, as shown in a calendar cell
///
/// Returns an empty string when the day has no workouts.
pub fn extract_display_name<S: AsRef<str>>(workouts: &[S]) -> String {
    let Some(first) = workouts.first() else {
        return String::new();
    };

    let text = first.as_ref().replace("**", "");
    let text = replace_all(&DISPLAY_LEADING_ORDINAL, text.trim(), "");
    let text = replace_all(&DISPLAY_LEADING_BULLET, &text, "");

    DISPLAY_RULES
        .first_accepted(&text, |rule, caps| {
            let raw = caps.get(1)?.as_str().trim();
            match rule.value {
                DisplayRule::Explicit => Some(raw.to_string()),
                DisplayRule::Labelled => {
                    let has_stats = DISPLAY_STAT_WORDS
                        .as_ref()
                        .map(|re| re.is_match(raw))
                        .unwrap_or(false);
                    (is_display_sized(raw) && !has_stats).then(|| raw.to_string())
                }
                DisplayRule::Leading => {
                    let name = replace_all(&DISPLAY_TRAILING_PUNCTUATION, raw, "");
                    is_display_sized(&name).then_some(name)
                }
            }
        })
        .unwrap_or_else(|| display_fallback(&text))
}

fn is_display_sized(name: &str) -> bool {
    let len = name.chars().count();
    (MIN_DISPLAY_NAME_CHARS..=MAX_DISPLAY_NAME_CHARS).contains(&len)
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

fn display_fallback(text: &str) -> String {
    let mut name = String::new();
    for word in text.split_whitespace().take(MAX_DISPLAY_FALLBACK_WORDS) {
        if is_stat_token(word) || word.chars().count() > MAX_DISPLAY_WORD_CHARS {
            break;
        }
        if !name.is_empty() {
            name.push(' ');
        }
        name.push_str(word);
        if name.chars().count() > DISPLAY_FALLBACK_CHARS {
            break;
        }
    }

    if name.is_empty() {
        text.chars().take(DISPLAY_FALLBACK_CHARS).collect::<String>().trim().to_string()
    } else {
        name
    }
}

/// Labels of the distance rules in evaluation order
pub fn distance_rule_labels() -> Vec<&'static str> {
    DISTANCE_RULES.labels()
}

/// Labels of the heart-rate rules in evaluation order
pub fn heart_rate_rule_labels() -> Vec<&'static str> {
    HEART_RATE_RULES.labels()
}

/// Labels of the pace rules in evaluation order
pub fn pace_rule_labels() -> Vec<&'static str> {
    PACE_RULES.labels()
}

/// Labels of the name rules in evaluation order
pub fn name_rule_labels() -> Vec<&'static str> {
    NAME_RULES.labels()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_run_fields() {
        let detail = extract_details("Tempo Run: 8km @ 4:30/km HR 150-160");
        assert_eq!(detail.name, "Tempo Run");
        assert_eq!(detail.distance.as_deref(), Some("8km"));
        assert_eq!(detail.pace.as_deref(), Some("4:30"));
        assert_eq!(detail.heart_rate.as_deref(), Some("150-160"));
        assert_eq!(detail.description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_rule_tables_compile_in_order() {
        assert_eq!(
            name_rule_labels(),
            vec!["before_colon", "before_bullet", "before_distance", "before_keyword"]
        );
        assert_eq!(distance_rule_labels(), vec!["km", "k", "kilometers", "miles", "mi"]);
        assert_eq!(heart_rate_rule_labels().len(), 7);
        assert_eq!(pace_rule_labels().len(), 5);
        assert_eq!(DISPLAY_RULES.len(), 5);
        assert_eq!(STAT_NOISE.len(), 4);
    }

    #[test]
    fn test_clean_strips_emphasis_and_prefix() {
        assert_eq!(clean_workout_text("**1. - Easy Run**: 5km"), "Easy Run: 5km");
        assert_eq!(clean_workout_text("- Long run 16km"), "Long run 16km");
        assert_eq!(clean_workout_text("2) Hill repeats"), "Hill repeats");
        assert_eq!(clean_workout_text("10.5km steady"), "10.5km steady");
    }

    #[test]
    fn test_name_cascade_order() {
        assert_eq!(extract_name("Easy Run: 5km"), "Easy Run");
        assert_eq!(extract_name("Strides • 6 x 100m"), "Strides");
        assert_eq!(extract_name("Long easy run 18km at conversational pace"), "Long easy run");
        assert_eq!(extract_name("Aerobic jog HR 130-140"), "Aerobic jog");
        assert_eq!(extract_name("Cross training 45 min bike"), "Cross training");
        assert_eq!(extract_name("Rest"), "Rest");
        assert_eq!(extract_name("45 min bike"), FALLBACK_NAME);
    }

    #[test]
    fn test_distance_units_are_copied_through() {
        assert_eq!(extract_distance("Long run 21.1 km").as_deref(), Some("21.1km"));
        assert_eq!(extract_distance("Race 10k").as_deref(), Some("10km"));
        assert_eq!(extract_distance("Easy 5 kilometers").as_deref(), Some("5km"));
        assert_eq!(extract_distance("Easy 6 miles").as_deref(), Some("6km"));
        assert_eq!(extract_distance("Jog 3 mi").as_deref(), Some("3km"));
        assert_eq!(extract_distance("Core session"), None);
    }

    #[test]
    fn test_distance_priority_prefers_km_over_earlier_miles() {
        // km rule is tried before the miles rule regardless of position
        assert_eq!(extract_distance("4 miles or 6km").as_deref(), Some("6km"));
    }

    #[test]
    fn test_distance_label_keeps_value() {
        assert_eq!(distance_label("13.1", DistanceUnit::Miles), "13.1km");
        assert_eq!(distance_label("5", DistanceUnit::Kilometers), "5km");
    }

    #[test]
    fn test_heart_rate_forms() {
        assert_eq!(extract_heart_rate("HR: 140-150 bpm").as_deref(), Some("140-150"));
        assert_eq!(extract_heart_rate("Heart Rate 130 - 145").as_deref(), Some("130 - 145"));
        assert_eq!(extract_heart_rate("Stay in Zone 2").as_deref(), Some("Zone 2"));
        assert_eq!(extract_heart_rate("keep it 120-135 bpm").as_deref(), Some("120-135"));
        assert_eq!(extract_heart_rate("effort 70-80% max").as_deref(), Some("70-80"));
        assert_eq!(extract_heart_rate("no heart data"), None);
    }

    #[test]
    fn test_pace_forms() {
        assert_eq!(extract_pace("Pace: 5:15/km").as_deref(), Some("5:15"));
        assert_eq!(extract_pace("Pace: easy").as_deref(), Some("Easy pace"));
        assert_eq!(extract_pace("6x800m @ 3:50 per km").as_deref(), Some("3:50"));
        assert_eq!(extract_pace("run 5:30/km").as_deref(), Some("5:30"));
        assert_eq!(extract_pace("run at a CONVERSATIONAL pace").as_deref(), Some("Conversational pace"));
        assert_eq!(extract_pace("Strength work"), None);
    }

    #[test]
    fn test_description_keeps_sentences() {
        let detail = extract_details(
            "Easy Run: 6km Zone 2. Keep it relaxed. Builds aerobic base. Focus on form. Hydrate well. Stretch after.",
        );
        assert_eq!(detail.name, "Easy Run");
        assert_eq!(detail.heart_rate.as_deref(), Some("Zone 2"));
        assert_eq!(
            detail.description,
            "Keep it relaxed. Builds aerobic base. Focus on form. Hydrate well."
        );
    }

    #[test]
    fn test_description_truncates_without_sentences() {
        let long = format!("Drills: {}", "skip ".repeat(100));
        let detail = extract_details(&long);
        assert_eq!(detail.name, "Drills");
        assert!(detail.description.ends_with("..."));
        assert!(detail.description.chars().count() <= MAX_DESCRIPTION_CHARS + 3);

        let short = extract_details("Drills: high knees and butt kicks");
        assert_eq!(short.description, "high knees and butt kicks");
    }

    #[test]
    fn test_description_keeps_rate_units() {
        let detail = extract_details("Spin: 20 km/h cadence drills");
        assert!(detail.description.contains("km/h"));
    }

    #[test]
    fn test_extraction_never_panics_on_odd_input() {
        for input in ["", "   ", "**", "•", ":", "1.", "– – –", "ünïcødé run 5km ✓"] {
            let detail = extract_details(input);
            assert!(!detail.name.is_empty());
            assert!(!detail.description.is_empty());
        }
    }

    #[test]
    fn test_display_name_cascade() {
        assert_eq!(extract_display_name(&["Easy Run: 5km relaxed"]), "Easy Run");
        assert_eq!(extract_display_name(&["**1. Recovery Jog: 20 min**"]), "Recovery Jog");
        assert_eq!(extract_display_name(&["Hill repeats – 8 x 60s"]), "Hill repeats");
        assert_eq!(extract_display_name(&["Steady ride, 40km"]), "Steady ride");
        assert_eq!(extract_display_name(&["Aerobic swim @ comfortable effort"]), "Aerobic swim");
        assert_eq!(extract_display_name(&["Mobility and core"]), "Mobility and core");
        assert_eq!(extract_display_name::<&str>(&[]), "");
    }

    #[test]
    fn test_display_name_rejects_stat_labels() {
        // "Pace" in the label sends the cascade on to the distance rule
        assert_eq!(extract_display_name(&["Pace work: 8km intervals"]), "Pace work");
        assert_eq!(extract_display_name(&["Zone 2: run easy"]), "Zone 2: run easy");
    }
}
