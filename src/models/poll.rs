//! Poll models: time-boxed votes with a periodically refreshed tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Open,
    Closed,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Open => "open",
            PollStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Poll {
    pub id: i64,
    pub guild_id: i64,
    /// Present when the poll was auto-created from a scheduled event
    pub event_id: Option<i64>,
    pub title: String,
    pub status: PollStatus,
    pub ends_at: DateTime<Utc>,
    /// Set exactly once when the poll closes; polls are archived, not deleted
    pub winner_option_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A candidate option. `position` records creation order and breaks ties:
/// among tied leaders the lowest position wins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub position: i32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PollVote {
    pub poll_id: i64,
    pub user_id: i64,
    pub option_id: i64,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPollRequest {
    pub guild_id: i64,
    pub event_id: Option<i64>,
    pub title: String,
    pub options: Vec<String>,
    pub ends_at: DateTime<Utc>,
}

/// One ranked tally line, ordered by vote count descending then position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyLine {
    pub option_id: i64,
    pub label: String,
    pub position: i32,
    pub votes: i64,
}
