//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{CrewCallError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_scheduler_config(&settings.scheduler)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CrewCallError::Config("Database URL is required".to_string()));
    }

    if !config.url.starts_with("sqlite:") {
        return Err(CrewCallError::Config(
            "Database URL must be a sqlite: URL".to_string(),
        ));
    }

    if config.max_connections == 0 {
        return Err(CrewCallError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate scheduler configuration
fn validate_scheduler_config(config: &super::SchedulerConfig) -> Result<()> {
    if config.sweep_interval_secs == 0 {
        return Err(CrewCallError::Config(
            "Sweep interval must be greater than 0".to_string(),
        ));
    }

    // Reminder offsets are minute-granular; a sweep slower than a minute
    // would miss fire windows.
    if config.sweep_interval_secs > 60 {
        return Err(CrewCallError::Config(
            "Sweep interval must be at most 60 seconds".to_string(),
        ));
    }

    if config.poll_refresh_interval_secs == 0 {
        return Err(CrewCallError::Config(
            "Poll refresh interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CrewCallError::Config("Log level is required".to_string()));
    }

    Ok(())
}
