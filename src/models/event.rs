//! Event and signup models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of an event.
///
/// Transitions are monotonic: Scheduled -> Active -> Completed, with
/// Cancelled reachable from Scheduled and Active only. Completed and
/// Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(EventStatus::Scheduled),
            "active" => Some(EventStatus::Active),
            "completed" => Some(EventStatus::Completed),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: EventStatus) -> bool {
        matches!(
            (self, to),
            (EventStatus::Scheduled, EventStatus::Active)
                | (EventStatus::Scheduled, EventStatus::Completed)
                | (EventStatus::Scheduled, EventStatus::Cancelled)
                | (EventStatus::Active, EventStatus::Completed)
                | (EventStatus::Active, EventStatus::Cancelled)
        )
    }
}

/// One of the two fixed battle teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Allies,
    Axis,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Allies => "allies",
            Team::Axis => "axis",
        }
    }
}

/// Named event templates supplying default title and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPreset {
    SaturdayBrawl,
    SundayOps,
    Training,
    Tournament,
    Custom,
}

impl EventPreset {
    pub fn default_title(&self) -> &'static str {
        match self {
            EventPreset::SaturdayBrawl => "Saturday Tank Brawl",
            EventPreset::SundayOps => "Sunday Armor Operations",
            EventPreset::Training => "Armor Training Session",
            EventPreset::Tournament => "Armor Tournament",
            EventPreset::Custom => "Custom Armor Event",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            EventPreset::SaturdayBrawl => {
                "Victory Condition: team with the most time on the middle cap wins. Format: crew battles."
            }
            EventPreset::SundayOps => {
                "Mission Type: combined arms operations. Format: tactical gameplay."
            }
            EventPreset::Training => "Focus: skill development and practice.",
            EventPreset::Tournament => "Format: competitive bracket. Stakes: championship event.",
            EventPreset::Custom => "Format: custom event. Details TBD.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub guild_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: EventStatus,
    /// Per-team slot limit, frozen from guild settings at creation
    pub team_capacity: i32,
    pub category_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + chrono::Duration::minutes(self.duration_minutes)
    }
}

/// Role a signup holds within its team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignupRole {
    Commander,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signup {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub team: Team,
    pub member_role: SignupRole,
    /// Set when the user joined through a persistent crew
    pub crew_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub guild_id: i64,
    pub created_by: i64,
    pub preset: EventPreset,
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Fully resolved event row ready for insertion: preset defaults applied,
/// guild settings frozen in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub guild_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub team_capacity: i32,
    pub category_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub event_id: i64,
    pub user_id: i64,
    pub team: Team,
    pub member_role: SignupRole,
    pub crew_id: Option<i64>,
}
