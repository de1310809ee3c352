use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use planrs::calendar::{self, CalendarEntry, DateStrategy};
use planrs::config::AppConfig;
use planrs::error::{ErrorSeverity, PlanRsError};
use planrs::export::{ExportFormat, ExportManager, ExportOptions};
use planrs::extract::extract_details;
use planrs::intensity::classify;
use planrs::logging::init_logging;
use planrs::models::{Intensity, Sport, TrainingPlan, WorkoutStats};
use planrs::{parser, routine};

/// planrs - Training Plan Converter CLI
///
/// Turns a free-text training plan into a structured plan, a dated calendar,
/// and FIT or iCalendar files.
#[derive(Parser)]
#[command(name = "planrs")]
#[command(version)]
#[command(about = "Training plan parser and exporter", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a plan and show its structure
    Parse {
        /// Plan text file ("-" for stdin)
        input: PathBuf,

        /// Print the parsed plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract name, distance, heart rate and pace from workout lines
    Details {
        /// Workout text, one argument per workout
        #[arg(required = true)]
        workouts: Vec<String>,

        /// Print the extracted fields as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lay the plan out on a calendar
    Calendar {
        /// Plan text file ("-" for stdin)
        input: PathBuf,

        /// First day of the plan (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Date rule (sequential, fixed-week); defaults to the config value
        #[arg(long)]
        strategy: Option<String>,

        /// Print calendar entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the plan as a FIT workout file or iCalendar feed
    Export {
        /// Plan text file ("-" for stdin)
        input: PathBuf,

        /// First day of the plan (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Export format (fit, ics)
        #[arg(short = 'f', long, default_value = "fit")]
        format: String,

        /// Sport for FIT workouts (running, cycling, swimming, triathlon)
        #[arg(long)]
        sport: Option<String>,

        /// Plan name used for the calendar and the output file name
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a stretching routine into exercise cards
    Routine {
        /// Routine text file ("-" for stdin)
        input: PathBuf,
    },

    /// Show or initialize the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Only print the configuration file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct CalendarRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Workout")]
    workout: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

impl From<&CalendarEntry> for CalendarRow {
    fn from(entry: &CalendarEntry) -> Self {
        let rest = entry.workouts.is_empty();
        CalendarRow {
            date: entry.date.format("%a %Y-%m-%d").to_string(),
            week: entry.week_number.clone(),
            day: entry.day_name.clone(),
            workout: if rest { "Rest".to_string() } else { entry.title.clone() },
            intensity: entry.intensity.display_label().to_string(),
            distance: format_distance(&entry.stats),
            duration: format_duration(&entry.stats),
        }
    }
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week of")]
    monday: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    if let Err(err) = init_logging(&log_config) {
        eprintln!("{} {:#}", "Logging disabled:".yellow(), err);
    }

    if let Err(err) = run(cli.command, &config) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> AppConfig {
    match path {
        Some(path) => AppConfig::load_from_file(path).unwrap_or_else(|err| {
            eprintln!("{} {:#}", "Using default configuration:".yellow(), err);
            AppConfig::default()
        }),
        None => AppConfig::load_or_default(),
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<PlanRsError>() {
        Some(plan_err) => {
            match plan_err.severity() {
                ErrorSeverity::Warning | ErrorSeverity::Info => {
                    tracing::warn!(error = %plan_err, "Command failed")
                }
                ErrorSeverity::Error | ErrorSeverity::Critical => {
                    tracing::error!(error = %plan_err, "Command failed")
                }
            }
            eprintln!("{} {}", "Error:".red().bold(), plan_err.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Parse { input, json } => {
            let plan = parser::parse(&read_input(&input)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }

        Commands::Details { workouts, json } => {
            let details: Vec<_> = workouts.iter().map(|w| extract_details(w)).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                for (workout, detail) in workouts.iter().zip(&details) {
                    println!("{}", detail.name.bold());
                    print_field("Intensity", Some(classify(workout).display_label()));
                    print_field("Distance", detail.distance.as_deref());
                    print_field("Heart rate", detail.heart_rate.as_deref());
                    print_field("Pace", detail.pace.as_deref());
                    println!("  {}", detail.description.dimmed());
                    println!();
                }
            }
        }

        Commands::Calendar {
            input,
            start,
            strategy,
            json,
        } => {
            let plan = parser::parse(&read_input(&input)?);
            let start = parse_start_date(&start)?;
            let strategy = match strategy {
                Some(value) => value
                    .parse::<DateStrategy>()
                    .map_err(PlanRsError::Validation)?,
                None => config.calendar.date_strategy,
            };

            let entries = calendar::calendar_entries(&plan, start, strategy);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            print_calendar(&plan, start, strategy, &entries, config.calendar.show_weekly_stats);
        }

        Commands::Export {
            input,
            start,
            format,
            sport,
            name,
            output,
        } => {
            let raw = read_input(&input)?;
            let format: ExportFormat = format.parse().map_err(PlanRsError::from)?;
            let sport = match sport {
                Some(value) => value.parse::<Sport>().map_err(PlanRsError::Validation)?,
                None => config.export.default_sport,
            };

            let mut options = ExportOptions::new(format, parse_start_date(&start)?);
            options.sport = sport;
            options.plan_name = name.or_else(|| config.export.default_plan_name.clone());
            options.created_at = Some(Utc::now());

            let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
            let manager = ExportManager::from_config(&config.export);
            let path = manager
                .export(&raw, &options, &output_dir)
                .map_err(PlanRsError::from)?;

            println!(
                "{} {}",
                format!("✓ Exported {} file:", format.extension().to_uppercase()).green(),
                path.display()
            );
        }

        Commands::Routine { input } => {
            let exercises = routine::parse_routine(&read_input(&input)?);
            if exercises.is_empty() {
                println!("{}", "No exercises found".yellow());
            }
            for (index, exercise) in exercises.iter().enumerate() {
                println!(
                    "{}. {} {}",
                    index + 1,
                    exercise.name.bold(),
                    format!("({})", exercise.duration).cyan()
                );
                if !exercise.description.is_empty() {
                    println!("   {}", exercise.description);
                }
            }
        }

        Commands::Config { init, path } => {
            let config_path = AppConfig::default_config_path();
            if path {
                println!("{}", config_path.display());
            } else if init {
                let mut fresh = AppConfig::default();
                let written = fresh.save_default()?;
                println!("{} {}", "✓ Wrote configuration to".green(), written.display());
            } else {
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", toml::to_string_pretty(config)?);
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read plan from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .map_err(PlanRsError::from)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_start_date(value: &str) -> std::result::Result<NaiveDate, PlanRsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        PlanRsError::Validation(format!("Start date '{}' is not in YYYY-MM-DD form", value))
    })
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {:<11} {}", format!("{}:", label), value);
    }
}

fn intensity_colored(intensity: Intensity) -> ColoredString {
    let label = intensity.display_label();
    match intensity {
        Intensity::Easy => label.green(),
        Intensity::Moderate => label.yellow(),
        Intensity::Hard => label.red(),
        Intensity::Recovery => label.blue(),
    }
}

fn print_plan(plan: &TrainingPlan) {
    if !plan.intro.is_empty() {
        println!("{}", plan.intro.dimmed());
        println!();
    }

    if plan.is_empty() {
        println!("{}", "No weeks found in this plan".yellow());
    }

    for week in &plan.weeks {
        println!("{}", format!("Week {}", week.number).bold());
        if !week.description.is_empty() {
            println!("  {}", week.description.italic());
        }
        for day in &week.days {
            match planrs::intensity::classify_day(&day.workouts) {
                Some(intensity) => println!(
                    "  {} [{}] {} workout(s)",
                    day.name.cyan(),
                    intensity_colored(intensity),
                    day.workouts.len()
                ),
                None => println!("  {} {}", day.name.cyan(), "rest".dimmed()),
            }
            for workout in &day.workouts {
                println!("    - {}", workout);
            }
        }
    }

    if !plan.tips.is_empty() {
        println!();
        println!("{} {}", "Tips:".bold(), plan.tips);
    }

    println!();
    println!(
        "{}",
        format!(
            "{} weeks, {} days, {} workouts",
            plan.weeks.len(),
            plan.total_days(),
            plan.total_workouts()
        )
        .green()
    );
}

fn print_calendar(
    plan: &TrainingPlan,
    start: NaiveDate,
    strategy: DateStrategy,
    entries: &[CalendarEntry],
    show_weekly_stats: bool,
) {
    if entries.is_empty() {
        println!("{}", "No days to schedule".yellow());
        return;
    }

    let rows: Vec<CalendarRow> = entries.iter().map(CalendarRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if let Some(end) = calendar::plan_end_date(plan, start) {
        println!("Plan runs {} to {}", start.to_string().bold(), end.to_string().bold());
    }

    if show_weekly_stats {
        let dated = calendar::map_to_dates_with(plan, start, strategy);
        let weeks: Vec<WeekRow> = calendar::weekly_stats(&dated)
            .into_iter()
            .map(|(monday, stats)| WeekRow {
                monday: monday.format("%Y-%m-%d").to_string(),
                distance: format_distance(&stats),
                duration: format_duration(&stats),
            })
            .collect();
        println!("{}", Table::new(weeks).with(Style::rounded()));
    }
}

fn format_distance(stats: &WorkoutStats) -> String {
    if stats.distance_km.is_zero() {
        "-".to_string()
    } else {
        format!("{} km", stats.distance_km.normalize())
    }
}

fn format_duration(stats: &WorkoutStats) -> String {
    match (stats.duration_minutes / 60, stats.duration_minutes % 60) {
        (0, 0) => "-".to_string(),
        (0, minutes) => format!("{}m", minutes),
        (hours, 0) => format!("{}h", hours),
        (hours, minutes) => format!("{}h {}m", hours, minutes),
    }
}
