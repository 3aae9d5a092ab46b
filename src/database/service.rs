//! Database service layer
//!
//! This module bundles the per-entity repositories behind one handle.

use crate::database::{
    CrewRepository, DatabasePool, EventRepository, GuildRepository, PollRepository,
    ReminderRepository,
};

#[derive(Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub reminders: ReminderRepository,
    pub polls: PollRepository,
    pub crews: CrewRepository,
    pub guilds: GuildRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            reminders: ReminderRepository::new(pool.clone()),
            polls: PollRepository::new(pool.clone()),
            crews: CrewRepository::new(pool.clone()),
            guilds: GuildRepository::new(pool),
        }
    }
}
