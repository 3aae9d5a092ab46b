//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the CrewCall application.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard keeps the file writer's background thread alive;
/// the caller must hold it for the process lifetime or the rolling log
/// never flushes.
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "crewcall.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log reminder dispatch outcomes
pub fn log_reminder_dispatch(event_id: i64, offset_minutes: i64, delivered: bool) {
    if delivered {
        info!(
            event_id = event_id,
            offset_minutes = offset_minutes,
            "Reminder delivered"
        );
    } else {
        warn!(
            event_id = event_id,
            offset_minutes = offset_minutes,
            "Reminder delivery failed, will retry on next sweep"
        );
    }
}
