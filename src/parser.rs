//! Training plan text parser
//!
//! Segments a loosely formatted plan document into an intro, weeks, days and
//! workouts, and a trailing tips section. The document conventions are
//! markdown-ish: `**Week 1**` and `**Monday**` style emphasis headers, bullet
//! or numbered workout lines, and a `**Tips**` section at the end.
//!
//! Parsing never fails. Text without any recognized header ends up in
//! [`TrainingPlan::intro`] with no weeks.

use regex::Regex;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::{Day, TrainingPlan, Week};

static WEEK_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Week\s+(\d+)").ok());

static DAY_HEADER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*(?:Day|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\s*(\d*)")
        .ok()
});

static TIPS_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*(?:Tips|Advice|Notes|Important)").ok());

static WORKOUT_START: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Bullets ("- ", "• ", "1. ", "2) "), emphasized starts ("**Tempo"),
    // or a workout keyword at the start of the line
    Regex::new(
        r"(?i)^(?:[-•*]+|[-•*\d]+[.)])\s+|^\*\*[A-Z]|^(?:Rest|Easy|Recovery|Tempo|Interval|Long|Speed|Hill|Fartlek|Threshold)",
    )
    .ok()
});

/// Parse raw plan text into a [`TrainingPlan`]
pub fn parse(text: &str) -> TrainingPlan {
    let plan = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(ParserState::default(), ParserState::consume)
        .finish();

    tracing::debug!(
        weeks = plan.weeks.len(),
        days = plan.total_days(),
        workouts = plan.total_workouts(),
        "Parsed training plan"
    );

    plan
}

impl FromStr for TrainingPlan {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    #[default]
    Intro,
    Week,
    Tips,
}

/// How a single line is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    WeekHeader { number: &'a str },
    DayHeader,
    TipsHeader,
    Content,
}

type LineRule = for<'a> fn(&ParserState, &'a str) -> Option<LineKind<'a>>;

/// Line classification, first match wins; anything unmatched is content
const LINE_RULES: [(&str, LineRule); 4] = [
    ("tips_body", tips_body as LineRule),
    ("week_header", week_header as LineRule),
    ("day_header", day_header as LineRule),
    ("tips_header", tips_header as LineRule),
];

fn tips_body<'a>(state: &ParserState, _line: &'a str) -> Option<LineKind<'a>> {
    // Headers after the tips section are kept as tips text
    (state.section == Section::Tips).then_some(LineKind::Content)
}

fn week_header<'a>(_state: &ParserState, line: &'a str) -> Option<LineKind<'a>> {
    let caps = WEEK_HEADER.as_ref()?.captures(line)?;
    let number = caps.get(1)?.as_str();
    Some(LineKind::WeekHeader { number })
}

fn day_header<'a>(state: &ParserState, line: &'a str) -> Option<LineKind<'a>> {
    if state.week.is_none() {
        return None;
    }
    DAY_HEADER
        .as_ref()?
        .is_match(line)
        .then_some(LineKind::DayHeader)
}

fn tips_header<'a>(_state: &ParserState, line: &'a str) -> Option<LineKind<'a>> {
    TIPS_HEADER
        .as_ref()?
        .is_match(line)
        .then_some(LineKind::TipsHeader)
}

fn starts_new_workout(line: &str) -> bool {
    WORKOUT_START
        .as_ref()
        .map(|re| re.is_match(line))
        .unwrap_or(false)
}

/// Accumulator threaded through the fold over lines
#[derive(Debug, Default)]
struct ParserState {
    section: Section,
    intro: String,
    tips: String,
    weeks: Vec<Week>,
    week: Option<Week>,
    day: Option<Day>,
    /// Workout text being assembled from one or more lines
    workout: String,
}

impl ParserState {
    fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        LINE_RULES
            .iter()
            .find_map(|(_, rule)| rule(self, line))
            .unwrap_or(LineKind::Content)
    }

    fn consume(mut self, line: &str) -> Self {
        match self.classify(line) {
            LineKind::WeekHeader { number } => {
                self.close_week();
                self.week = Some(Week {
                    number: number.to_string(),
                    ..Week::default()
                });
                self.section = Section::Week;
            }
            LineKind::DayHeader => {
                self.close_day();
                self.day = Some(Day {
                    name: line.replace("**", "").trim().to_string(),
                    workouts: Vec::new(),
                });
            }
            LineKind::TipsHeader => {
                self.close_week();
                self.section = Section::Tips;
            }
            LineKind::Content => self.push_content(line),
        }
        self
    }

    fn push_content(&mut self, line: &str) {
        if self.section == Section::Intro && self.week.is_none() {
            append_text(&mut self.intro, line);
        } else if self.day.is_some() {
            if starts_new_workout(line) {
                self.flush_workout();
            }
            append_text(&mut self.workout, line);
        } else if let Some(week) = self.week.as_mut() {
            append_text(&mut week.description, line);
        } else {
            append_text(&mut self.tips, line);
        }
    }

    fn flush_workout(&mut self) {
        let workout = std::mem::take(&mut self.workout);
        let workout = workout.trim();
        if workout.is_empty() {
            return;
        }
        if let Some(day) = self.day.as_mut() {
            day.workouts.push(workout.to_string());
        }
    }

    fn close_day(&mut self) {
        self.flush_workout();
        if let Some(day) = self.day.take() {
            if let Some(week) = self.week.as_mut() {
                week.days.push(day);
            }
        }
    }

    fn close_week(&mut self) {
        self.close_day();
        if let Some(mut week) = self.week.take() {
            week.description = week.description.trim().to_string();
            self.weeks.push(week);
        }
    }

    fn finish(mut self) -> TrainingPlan {
        self.close_week();
        TrainingPlan {
            intro: self.intro.trim().to_string(),
            weeks: self.weeks,
            tips: self.tips.trim().to_string(),
        }
    }
}

fn append_text(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(line);
}

/// Labels of the line classification rules in evaluation order
pub fn line_rule_labels() -> Vec<&'static str> {
    LINE_RULES.iter().map(|(label, _)| *label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PLAN: &str = "\
Here is your 2-week 10K plan.
It builds gradually.

**Week 1: Base**
Focus on easy aerobic running.
**Monday**
- Easy Run: 5km @ 6:00/km
  keep it conversational
- Strides: 4 x 20s
**Tuesday**: Rest
**Wednesday**
Tempo Run: 6km HR 150-160

**Week 2: Build**
**Monday**
1. Long run 12km Zone 2
**Tuesday**
Interval session 6 x 800m

**Tips**
Sleep well.
**Week 3** is not part of the plan
";

    #[test]
    fn test_parse_sample_plan_structure() {
        let plan = parse(SAMPLE_PLAN);

        assert_eq!(plan.intro, "Here is your 2-week 10K plan. It builds gradually.");
        assert_eq!(plan.weeks.len(), 2);

        let week1 = &plan.weeks[0];
        assert_eq!(week1.number, "1");
        assert_eq!(week1.description, "Focus on easy aerobic running.");
        assert_eq!(week1.days.len(), 3);
        assert_eq!(week1.days[0].name, "Monday");
        assert_eq!(
            week1.days[0].workouts,
            vec![
                "- Easy Run: 5km @ 6:00/km keep it conversational".to_string(),
                "- Strides: 4 x 20s".to_string(),
            ]
        );
        assert_eq!(week1.days[1].name, "Tuesday: Rest");
        assert!(week1.days[1].is_rest_day());
        assert_eq!(week1.days[2].workouts, vec!["Tempo Run: 6km HR 150-160".to_string()]);

        let week2 = &plan.weeks[1];
        assert_eq!(week2.number, "2");
        assert_eq!(week2.days.len(), 2);
        assert_eq!(week2.days[1].workouts, vec!["Interval session 6 x 800m".to_string()]);

        assert_eq!(plan.tips, "Sleep well. **Week 3** is not part of the plan");
    }

    #[test]
    fn test_plain_text_folds_into_intro() {
        let plan = parse("Just run a lot.\n\nAnd sleep.\n- bullet without structure");
        assert!(plan.weeks.is_empty());
        assert_eq!(plan.intro, "Just run a lot. And sleep. - bullet without structure");
        assert!(plan.tips.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), TrainingPlan::default());
        assert_eq!(parse("\n  \n\t\n"), TrainingPlan::default());
    }

    #[test]
    fn test_day_header_outside_week_is_intro_text() {
        let plan = parse("**Monday** easy start\n**Week 1**\n**Monday**\nEasy 3km");
        assert_eq!(plan.intro, "**Monday** easy start");
        assert_eq!(plan.weeks.len(), 1);
        assert_eq!(plan.weeks[0].days[0].workouts, vec!["Easy 3km".to_string()]);
    }

    #[test]
    fn test_continuation_lines_join_workout() {
        let plan = parse("**Week 1**\n**Day 1**\nWarm up jog\nthen 4 x hill sprints\nfinish with stretching");
        assert_eq!(
            plan.weeks[0].days[0].workouts,
            vec!["Warm up jog then 4 x hill sprints finish with stretching".to_string()]
        );
    }

    #[test]
    fn test_keyword_lines_start_new_workouts() {
        let plan = parse("**Week 1**\n**Saturday**\nLong run 20km\nRecovery shake after\nEasy spin 30 min");
        assert_eq!(
            plan.weeks[0].days[0].workouts,
            vec![
                "Long run 20km".to_string(),
                "Recovery shake after".to_string(),
                "Easy spin 30 min".to_string(),
            ]
        );
    }

    #[test]
    fn test_bullets_and_numbered_items_start_new_workouts() {
        let plan = parse("**Week 1**\n**Monday**\nwarm up\n- drills\n• strides\n2) cool down\n3. stretch");
        assert_eq!(
            plan.weeks[0].days[0].workouts,
            vec![
                "warm up".to_string(),
                "- drills".to_string(),
                "• strides".to_string(),
                "2) cool down".to_string(),
                "3. stretch".to_string(),
            ]
        );
    }

    #[test]
    fn test_tips_header_closes_open_week_and_day() {
        let plan = parse("**Week 1**\n**Monday**\nEasy 5km\n**Important notes**\nListen to your body");
        assert_eq!(plan.weeks.len(), 1);
        assert_eq!(plan.weeks[0].days.len(), 1);
        assert_eq!(plan.weeks[0].days[0].workouts.len(), 1);
        assert_eq!(plan.tips, "Listen to your body");
    }

    #[test]
    fn test_week_number_is_raw_capture() {
        let plan = parse("**Week 3**\n**week 3**\n**WEEK 10 - Taper**");
        let numbers: Vec<&str> = plan.weeks.iter().map(|w| w.number.as_str()).collect();
        assert_eq!(numbers, vec!["3", "3", "10"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(SAMPLE_PLAN), parse(SAMPLE_PLAN));
        let via_from_str: TrainingPlan = SAMPLE_PLAN.parse().unwrap();
        assert_eq!(via_from_str, parse(SAMPLE_PLAN));
    }

    #[test]
    fn test_line_rule_order() {
        assert_eq!(
            line_rule_labels(),
            vec!["tips_body", "week_header", "day_header", "tips_header"]
        );
    }
}
