//! Poll repository implementation

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::poll::{OpenPollRequest, Poll, PollOption, PollVote, TallyLine};
use crate::utils::errors::CrewCallError;

const POLL_COLUMNS: &str =
    "id, guild_id, event_id, title, status, ends_at, winner_option_id, created_at, closed_at";

#[derive(Clone)]
pub struct PollRepository {
    pool: SqlitePool,
}

impl PollRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a poll together with its candidate options in one
    /// transaction. Option positions record creation order.
    pub async fn create(&self, request: OpenPollRequest) -> Result<Poll, CrewCallError> {
        let mut tx = self.pool.begin().await?;

        let poll = sqlx::query_as::<_, Poll>(&format!(
            r#"
            INSERT INTO polls (guild_id, event_id, title, status, ends_at, created_at)
            VALUES ($1, $2, $3, 'open', $4, $5)
            RETURNING {POLL_COLUMNS}
            "#
        ))
        .bind(request.guild_id)
        .bind(request.event_id)
        .bind(request.title)
        .bind(request.ends_at)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for (position, label) in request.options.iter().enumerate() {
            sqlx::query("INSERT INTO poll_options (poll_id, position, label) VALUES ($1, $2, $3)")
                .bind(poll.id)
                .bind(position as i32)
                .bind(label)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(poll)
    }

    /// Find poll by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Poll>, CrewCallError> {
        let poll =
            sqlx::query_as::<_, Poll>(&format!("SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(poll)
    }

    /// Find the poll linked to an event
    pub async fn find_by_event(&self, event_id: i64) -> Result<Option<Poll>, CrewCallError> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(poll)
    }

    /// List all open polls
    pub async fn list_open(&self) -> Result<Vec<Poll>, CrewCallError> {
        let polls = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE status = 'open' ORDER BY ends_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(polls)
    }

    /// Get a poll's options in creation order
    pub async fn get_options(&self, poll_id: i64) -> Result<Vec<PollOption>, CrewCallError> {
        let options = sqlx::query_as::<_, PollOption>(
            "SELECT id, poll_id, position, label FROM poll_options WHERE poll_id = $1 ORDER BY position ASC",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    /// Find a voter's current choice
    pub async fn find_vote(
        &self,
        poll_id: i64,
        user_id: i64,
    ) -> Result<Option<PollVote>, CrewCallError> {
        let vote = sqlx::query_as::<_, PollVote>(
            "SELECT poll_id, user_id, option_id, cast_at FROM poll_votes WHERE poll_id = $1 AND user_id = $2",
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vote)
    }

    /// Record a vote, overwriting any prior choice by the same voter
    /// (last write wins, keyed on (poll_id, user_id)).
    pub async fn upsert_vote(
        &self,
        poll_id: i64,
        user_id: i64,
        option_id: i64,
    ) -> Result<PollVote, CrewCallError> {
        let vote = sqlx::query_as::<_, PollVote>(
            r#"
            INSERT INTO poll_votes (poll_id, user_id, option_id, cast_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (poll_id, user_id) DO UPDATE SET option_id = $3, cast_at = $4
            RETURNING poll_id, user_id, option_id, cast_at
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(option_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(vote)
    }

    /// Ranked tally: vote count descending, then creation order. The
    /// first line is the current leader under the documented tie-break.
    pub async fn tally(&self, poll_id: i64) -> Result<Vec<TallyLine>, CrewCallError> {
        let lines = sqlx::query_as::<_, (i64, String, i32, i64)>(
            r#"
            SELECT o.id, o.label, o.position, COUNT(v.user_id) AS votes
            FROM poll_options o
            LEFT JOIN poll_votes v ON v.option_id = o.id
            WHERE o.poll_id = $1
            GROUP BY o.id, o.label, o.position
            ORDER BY votes DESC, o.position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines
            .into_iter()
            .map(|(option_id, label, position, votes)| TallyLine {
                option_id,
                label,
                position,
                votes,
            })
            .collect())
    }

    /// Close a poll, recording the winner. Guarded on the Open status so
    /// only the first invocation reports having closed it; repeated calls
    /// are no-ops.
    pub async fn close(
        &self,
        poll_id: i64,
        winner_option_id: Option<i64>,
    ) -> Result<bool, CrewCallError> {
        let result = sqlx::query(
            r#"
            UPDATE polls
            SET status = 'closed', winner_option_id = $2, closed_at = $3
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(poll_id)
        .bind(winner_option_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
