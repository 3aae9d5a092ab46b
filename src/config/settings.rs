//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Bot-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Users allowed to run admin operations (stat resets, forced closes)
    pub admin_ids: Vec<i64>,
    /// Display timezone for rendered timestamps; storage is always UTC
    pub timezone: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Background sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Reminder sweep cadence; must stay well under the finest reminder offset
    pub sweep_interval_secs: u64,
    /// Open-poll tally refresh cadence
    pub poll_refresh_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// Wire the poll engine into event scheduling (auto map votes)
    pub polls: bool,
    /// Enable persistent crew management
    pub crews: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("CREWCALL"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CrewCallError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                admin_ids: vec![],
                timezone: "America/New_York".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://crewcall.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            scheduler: SchedulerConfig {
                sweep_interval_secs: 30,
                poll_refresh_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/crewcall".to_string(),
            },
            features: FeaturesConfig {
                polls: true,
                crews: true,
            },
        }
    }
}
