//! Error hierarchy for planrs
//!
//! Parsing and extraction never fail; errors come from exporting, file I/O,
//! configuration and argument validation.

use thiserror::Error;

use crate::export::ExportError;

/// Top-level error type for planrs operations
#[derive(Debug, Error)]
pub enum PlanRsError {
    /// Encoding or writing an export failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid user input such as a malformed start date
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for planrs operations
pub type Result<T> = std::result::Result<T, PlanRsError>;

impl PlanRsError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlanRsError::Io(_) | PlanRsError::Export(ExportError::Io(_))
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlanRsError::Export(ExportError::MissingPlanData) => ErrorSeverity::Warning,
            PlanRsError::Export(ExportError::UnsupportedFormat(_)) => ErrorSeverity::Warning,
            PlanRsError::Validation(_) => ErrorSeverity::Warning,
            PlanRsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PlanRsError::Export(ExportError::MissingPlanData) => {
                "No weeks found in the plan text. Add headers such as **Week 1** and try again."
                    .to_string()
            }
            PlanRsError::Export(ExportError::UnsupportedFormat(format)) => {
                format!("Cannot export as '{}'. Supported formats are fit and ics.", format)
            }
            PlanRsError::Export(ExportError::Overflow { .. }) => {
                "The plan has too many workouts to fit in a single FIT file.".to_string()
            }
            PlanRsError::Configuration(reason) => {
                format!("Could not load configuration: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Unexpected failure inside planrs
    Critical,
    /// Error that prevents the operation
    Error,
    /// Problem with the input the user can fix
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
