//! Persistent crew models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A durable, event-independent group of users, scoped to a guild.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Crew {
    pub id: i64,
    pub guild_id: i64,
    pub name: String,
    pub owner_id: i64,
    pub wins: i64,
    pub losses: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CrewRole {
    Owner,
    Lead,
    Member,
}

impl CrewRole {
    /// Owners and leads may remove members and disband the crew.
    pub fn can_manage(&self) -> bool {
        matches!(self, CrewRole::Owner | CrewRole::Lead)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrewMember {
    pub crew_id: i64,
    pub user_id: i64,
    pub member_role: CrewRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrewInvite {
    pub id: i64,
    pub crew_id: i64,
    pub invitee_id: i64,
    pub invited_by: i64,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

/// User's answer to a pending invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteResponse {
    Accept,
    Decline,
}
