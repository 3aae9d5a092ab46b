//! Error handling for CrewCall
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for CrewCall application
#[derive(Error, Debug)]
pub enum CrewCallError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Poll not found: {poll_id}")]
    PollNotFound { poll_id: i64 },

    #[error("Crew not found: {crew_id}")]
    CrewNotFound { crew_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("User {user_id} is already signed up for event {event_id}")]
    AlreadySignedUp { event_id: i64, user_id: i64 },

    #[error("User {user_id} is not signed up for event {event_id}")]
    NotSignedUp { event_id: i64, user_id: i64 },

    #[error("Team '{team}' is full ({capacity} slots)")]
    CapacityExceeded { team: String, capacity: i32 },

    #[error("Team '{team}' already has a commander")]
    CommanderTaken { team: String },

    #[error("User {user_id} is already a member of crew {crew_id}")]
    AlreadyMember { crew_id: i64, user_id: i64 },

    #[error("Poll {poll_id} is closed")]
    PollClosed { poll_id: i64 },

    #[error("Feature disabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the external delivery collaborator
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery target unreachable: {0}")]
    Unreachable(String),

    #[error("Delivery timed out")]
    Timeout,

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Result type alias for CrewCall operations
pub type Result<T> = std::result::Result<T, CrewCallError>;

/// Result type alias for delivery collaborator calls
pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

impl CrewCallError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CrewCallError::Database(_) => false,
            CrewCallError::Migration(_) => false,
            CrewCallError::Config(_) => false,
            CrewCallError::InvalidInput(_) => false,
            CrewCallError::PermissionDenied(_) => false,
            CrewCallError::EventNotFound { .. } => false,
            CrewCallError::PollNotFound { .. } => false,
            CrewCallError::CrewNotFound { .. } => false,
            CrewCallError::InvalidStateTransition { .. } => false,
            CrewCallError::AlreadySignedUp { .. } => false,
            CrewCallError::NotSignedUp { .. } => false,
            CrewCallError::CapacityExceeded { .. } => false,
            CrewCallError::CommanderTaken { .. } => false,
            CrewCallError::AlreadyMember { .. } => false,
            CrewCallError::PollClosed { .. } => false,
            CrewCallError::FeatureDisabled(_) => false,
            CrewCallError::Delivery(_) => true,
            CrewCallError::Serialization(_) => false,
            CrewCallError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CrewCallError::Database(_) => ErrorSeverity::Critical,
            CrewCallError::Migration(_) => ErrorSeverity::Critical,
            CrewCallError::Config(_) => ErrorSeverity::Critical,
            CrewCallError::PermissionDenied(_) => ErrorSeverity::Warning,
            CrewCallError::Delivery(_) => ErrorSeverity::Warning,
            CrewCallError::InvalidInput(_)
            | CrewCallError::AlreadySignedUp { .. }
            | CrewCallError::NotSignedUp { .. }
            | CrewCallError::CapacityExceeded { .. }
            | CrewCallError::CommanderTaken { .. }
            | CrewCallError::AlreadyMember { .. }
            | CrewCallError::PollClosed { .. }
            | CrewCallError::FeatureDisabled(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether the error is a user-caused conflict or validation failure,
    /// safe to render verbatim in a user-facing message.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CrewCallError::InvalidInput(_)
                | CrewCallError::AlreadySignedUp { .. }
                | CrewCallError::NotSignedUp { .. }
                | CrewCallError::CapacityExceeded { .. }
                | CrewCallError::CommanderTaken { .. }
                | CrewCallError::AlreadyMember { .. }
                | CrewCallError::PollClosed { .. }
                | CrewCallError::PermissionDenied(_)
                | CrewCallError::FeatureDisabled(_)
        )
    }

    /// Message shown to the user. Persistence failures collapse into a
    /// generic retry prompt, everything user-caused renders as-is.
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            "Something went wrong, please try again.".to_string()
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
