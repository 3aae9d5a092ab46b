//! CrewCall event engine
//!
//! Event lifecycle, reminder scheduling, polls, and persistent crews for
//! gaming communities. This library provides the durable store, the
//! lifecycle state machine, the reminder sweep, the poll engine, and the
//! restoration pass that rebuilds runtime state after a restart.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CrewCallError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
