//! Guild settings and user stat models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-guild configuration. Absence of a row is equivalent to all defaults;
/// values are frozen into events and polls at creation time, so changing
/// them never retroactively alters already-scheduled records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: i64,
    pub team_capacity: i32,
    pub reminder_offsets: Vec<i64>,
    pub map_pool: Vec<String>,
    pub polls_enabled: bool,
    pub crews_enabled: bool,
    pub event_category_id: Option<i64>,
    pub announce_channel_id: Option<i64>,
}

impl GuildSettings {
    pub fn defaults_for(guild_id: i64) -> Self {
        Self {
            guild_id,
            team_capacity: 6,
            reminder_offsets: vec![60, 30, 10],
            map_pool: vec![
                "El Alamein".to_string(),
                "Kursk".to_string(),
                "Stalingrad".to_string(),
                "Carentan".to_string(),
            ],
            polls_enabled: true,
            crews_enabled: true,
            event_category_id: None,
            announce_channel_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGuildSettingsRequest {
    pub team_capacity: Option<i32>,
    pub reminder_offsets: Option<Vec<i64>>,
    pub map_pool: Option<Vec<String>>,
    pub polls_enabled: Option<bool>,
    pub crews_enabled: Option<bool>,
    pub event_category_id: Option<i64>,
    pub announce_channel_id: Option<i64>,
}

/// Per-(guild, user) counters. Monotonically non-decreasing except for
/// explicit admin resets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStat {
    pub guild_id: i64,
    pub user_id: i64,
    pub events_created: i64,
    pub events_attended: i64,
    pub crews_joined: i64,
    pub polls_voted: i64,
    pub updated_at: DateTime<Utc>,
}
