//! Reminder entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A one-shot notification tied to an event's start time minus an offset.
///
/// Identity is (event_id, offset_minutes). Once delivered the entry is
/// immutable; entries are deleted when their event is cancelled or
/// completed, or pruned lazily by the sweep.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReminderEntry {
    pub id: i64,
    pub event_id: i64,
    pub offset_minutes: i64,
    pub fire_at: DateTime<Utc>,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}
