//! Keyword-based intensity classification

use std::sync::LazyLock;

use crate::cascade::Cascade;
use crate::models::Intensity;

/// Rules in priority order. "recovery" is claimed by the easy rule, so only a
/// bare "rest" reaches [`Intensity::Recovery`].
static INTENSITY_RULES: LazyLock<Cascade<Intensity>> = LazyLock::new(|| {
    Cascade::compile(&[
        ("easy", r"easy|recovery|light|warm.*up|cool.*down", Intensity::Easy),
        ("hard", r"hard|intense|max|threshold|vo2", Intensity::Hard),
        ("moderate", r"moderate|tempo|steady", Intensity::Moderate),
        ("rest", r"rest", Intensity::Recovery),
    ])
});

/// Classify a workout's text; unmatched text is [`Intensity::Moderate`]
pub fn classify(text: &str) -> Intensity {
    let lower = text.to_lowercase();
    INTENSITY_RULES
        .first_match(&lower)
        .map(|(rule, _)| rule.value)
        .unwrap_or(Intensity::Moderate)
}

/// Intensity of a day, taken from its first workout
pub fn classify_day<S: AsRef<str>>(workouts: &[S]) -> Option<Intensity> {
    workouts.first().map(|w| classify(w.as_ref()))
}

pub fn rule_labels() -> Vec<&'static str> {
    INTENSITY_RULES.labels()
}
