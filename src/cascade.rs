//! Ordered first-match-wins pattern cascades
//!
//! The extractors and classifiers in this crate are sequences of independent
//! regex attempts with a fixed priority. Keeping each sequence as a labelled
//! list makes that priority inspectable from tests.

use regex::{Captures, Regex};

/// A single labelled pattern carrying a payload
#[derive(Debug, Clone)]
pub struct PatternRule<T> {
    pub label: &'static str,
    pub pattern: Regex,
    pub value: T,
}

/// Rules evaluated in declaration order; the first matching rule wins
#[derive(Debug, Clone)]
pub struct Cascade<T> {
    rules: Vec<PatternRule<T>>,
}

impl<T: Clone> Cascade<T> {
    /// Compile `(label, pattern, value)` triples in order.
    ///
    /// Patterns are static; one that fails to compile is skipped and reported,
    /// which the per-module label tests catch.
    pub fn compile(specs: &[(&'static str, &str, T)]) -> Self {
        let rules = specs
            .iter()
            .filter_map(|(label, pattern, value)| match Regex::new(pattern) {
                Ok(pattern) => Some(PatternRule {
                    label,
                    pattern,
                    value: value.clone(),
                }),
                Err(err) => {
                    tracing::error!(rule = label, error = %err, "Failed to compile cascade pattern");
                    None
                }
            })
            .collect();

        Self { rules }
    }
}

impl<T> Cascade<T> {
    /// First rule whose pattern matches anywhere in `text`
    pub fn first_match<'r, 't>(
        &'r self,
        text: &'t str,
    ) -> Option<(&'r PatternRule<T>, Captures<'t>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule, caps)))
    }

    /// First rule for which `accept` yields a value
    pub fn first_accepted<'t, R>(
        &self,
        text: &'t str,
        mut accept: impl FnMut(&PatternRule<T>, &Captures<'t>) -> Option<R>,
    ) -> Option<R> {
        self.rules.iter().find_map(|rule| {
            rule.pattern
                .captures(text)
                .and_then(|caps| accept(rule, &caps))
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(text))
    }

    /// Rule labels in evaluation order
    pub fn labels(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.label).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
