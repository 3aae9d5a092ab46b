//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod crew;
pub mod event;
pub mod guild;
pub mod poll;
pub mod reminder;

// Re-export commonly used models
pub use crew::{Crew, CrewInvite, CrewMember, CrewRole, InviteResponse, InviteStatus};
pub use event::{
    CreateEventRequest, Event, EventPreset, EventStatus, NewEvent, Signup, SignupRequest,
    SignupRole, Team,
};
pub use guild::{GuildSettings, UpdateGuildSettingsRequest, UserStat};
pub use poll::{OpenPollRequest, Poll, PollOption, PollStatus, PollVote, TallyLine};
pub use reminder::ReminderEntry;
