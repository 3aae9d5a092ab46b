//! CrewCall event engine
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crewcall::{
    config::Settings,
    database::{connection, DatabaseService},
    services::{LogOnlyDelivery, LogOnlyPanelHost, LogOnlyRoleGateway, ServiceFactory},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer flushing until
    // the process exits.
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", crewcall::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        busy_timeout: Duration::from_secs(5),
    };
    let pool = connection::create_pool(&db_config).await?;
    connection::run_migrations(&pool).await?;

    let database_service = DatabaseService::new(pool);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(
        database_service.clone(),
        &settings,
        Arc::new(LogOnlyDelivery),
        Arc::new(LogOnlyRoleGateway),
        Arc::new(LogOnlyPanelHost),
    );

    // Rebuild runtime state from storage before any sweep runs
    let report = services.restoration(database_service).run().await?;
    info!(
        events_restored = report.events_restored,
        events_fastforwarded = report.events_fastforwarded,
        polls_restored = report.polls_restored,
        "Restoration complete"
    );

    // Background sweeps
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_handle = services.scheduler.clone().spawn(
        Duration::from_secs(settings.scheduler.sweep_interval_secs),
        shutdown_rx.clone(),
    );
    let poll_handle = services.polls.clone().map(|engine| {
        engine.spawn_refresh_sweep(
            Duration::from_secs(settings.scheduler.poll_refresh_interval_secs),
            shutdown_rx,
        )
    });

    info!("CrewCall is ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping sweeps...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = sweep_handle.await {
        error!(error = %e, "Reminder sweep task panicked");
    }
    if let Some(handle) = poll_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Poll refresh task panicked");
        }
    }

    info!("CrewCall has been shut down");
    Ok(())
}
