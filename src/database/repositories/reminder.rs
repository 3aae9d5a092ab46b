//! Reminder entry repository implementation

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::reminder::ReminderEntry;
use crate::utils::errors::CrewCallError;

#[derive(Clone)]
pub struct ReminderRepository {
    pool: SqlitePool,
}

impl ReminderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List undelivered entries due at or before `now`, in ascending
    /// fire-time order so earlier offsets are attempted first.
    pub async fn due_entries(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderEntry>, CrewCallError> {
        let entries = sqlx::query_as::<_, ReminderEntry>(
            r#"
            SELECT id, event_id, offset_minutes, fire_at, delivered, created_at
            FROM reminder_entries
            WHERE delivered = 0 AND fire_at <= $1
            ORDER BY fire_at ASC, id ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Mark an entry delivered. Returns false when the entry was already
    /// delivered, which makes repeated sweeps idempotent.
    pub async fn mark_delivered(&self, id: i64) -> Result<bool, CrewCallError> {
        let result =
            sqlx::query("UPDATE reminder_entries SET delivered = 1 WHERE id = $1 AND delivered = 0")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all entries for an event
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<ReminderEntry>, CrewCallError> {
        let entries = sqlx::query_as::<_, ReminderEntry>(
            r#"
            SELECT id, event_id, offset_minutes, fire_at, delivered, created_at
            FROM reminder_entries
            WHERE event_id = $1
            ORDER BY fire_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Delete all entries for an event (cancellation / completion cleanup)
    pub async fn delete_for_event(&self, event_id: i64) -> Result<u64, CrewCallError> {
        let result = sqlx::query("DELETE FROM reminder_entries WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
