// Library interface for planrs modules
// The CLI and the integration tests both build on these

pub mod calendar;
pub mod cascade;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod intensity;
pub mod logging;
pub mod models;
pub mod parser;
pub mod routine;

// Re-export commonly used types for convenience
pub use models::*;
pub use calendar::{aggregate_stats, map_to_dates, DateStrategy};
pub use export::{ExportError, ExportFormat, ExportManager, FitEncoder, IcsEncoder};
pub use extract::{extract_details, extract_display_name};
pub use intensity::classify;
pub use parser::parse;
pub use routine::parse_routine;
pub use error::{PlanRsError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
