//! Database repositories module
//!
//! This module contains repository implementations for data access,
//! one repository per entity family.

pub mod crew;
pub mod event;
pub mod guild;
pub mod poll;
pub mod reminder;

// Re-export repositories
pub use crew::CrewRepository;
pub use event::EventRepository;
pub use guild::{GuildRepository, StatCounter};
pub use poll::PollRepository;
pub use reminder::ReminderRepository;
