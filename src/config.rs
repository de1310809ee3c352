use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::calendar::DateStrategy;
use crate::error::PlanRsError;
use crate::export::fit::FIT_PROFILE_VERSION;
use crate::export::ics::{DEFAULT_PRODUCT_ID, DEFAULT_UID_DOMAIN};
use crate::logging::LogConfig;
use crate::models::Sport;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Calendar view settings
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Defaults applied by the export command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sport written into FIT workout records
    pub default_sport: Sport,

    /// Plan name used for calendar names and file names
    pub default_plan_name: Option<String>,

    /// Directory exports are written to
    pub output_dir: PathBuf,

    /// FIT profile version in the file header
    pub fit_profile_version: u16,

    /// PRODID of generated calendars
    pub ics_product_id: String,

    /// Domain part of event UIDs
    pub uid_domain: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            default_sport: Sport::Running,
            default_plan_name: None,
            output_dir: PathBuf::from("."),
            fit_profile_version: FIT_PROFILE_VERSION,
            ics_product_id: DEFAULT_PRODUCT_ID.to_string(),
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
        }
    }
}

/// Calendar view settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// How plan days are assigned to dates
    pub date_strategy: DateStrategy,

    /// Print Monday-first weekly totals under the calendar
    pub show_weekly_stats: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            date_strategy: DateStrategy::Sequential,
            show_weekly_stats: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            export: ExportConfig::default(),
            calendar: CalendarConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".planrs")
            .join("config.toml")
    }

    /// Load the default configuration file, falling back to defaults
    ///
    /// A missing file is normal; an unreadable or invalid one is reported.
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!(
                    "Ignoring config file {}: {:#}",
                    config_path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<PathBuf> {
        let config_path = Self::default_config_path();
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }

    /// Check values that would produce unusable exports
    pub fn validate(&self) -> std::result::Result<(), PlanRsError> {
        if self.export.fit_profile_version == 0 {
            return Err(PlanRsError::Configuration(
                "export.fit_profile_version must be greater than zero".to_string(),
            ));
        }
        if self.export.uid_domain.trim().is_empty() {
            return Err(PlanRsError::Configuration(
                "export.uid_domain must not be empty".to_string(),
            ));
        }
        if self.export.ics_product_id.trim().is_empty() {
            return Err(PlanRsError::Configuration(
                "export.ics_product_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
