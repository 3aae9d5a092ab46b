//! Event repository implementation

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::event::{Event, EventStatus, NewEvent, Signup, SignupRequest, Team};
use crate::utils::errors::CrewCallError;

const EVENT_COLUMNS: &str = "id, guild_id, title, description, starts_at, duration_minutes, status, team_capacity, category_id, channel_id, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new event together with its reminder entries.
    ///
    /// The event row and all reminder rows commit in one transaction, so a
    /// failed write leaves no partial record behind. `fire_times` carries
    /// (offset_minutes, fire_at) pairs already filtered by the caller.
    pub async fn create_with_reminders(
        &self,
        new_event: NewEvent,
        fire_times: &[(i64, DateTime<Utc>)],
    ) -> Result<Event, CrewCallError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (guild_id, title, description, starts_at, duration_minutes, status, team_capacity, category_id, channel_id, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(new_event.guild_id)
        .bind(new_event.title)
        .bind(new_event.description)
        .bind(new_event.starts_at)
        .bind(new_event.duration_minutes)
        .bind(new_event.team_capacity)
        .bind(new_event.category_id)
        .bind(new_event.channel_id)
        .bind(new_event.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (offset_minutes, fire_at) in fire_times {
            sqlx::query(
                r#"
                INSERT INTO reminder_entries (event_id, offset_minutes, fire_at, delivered, created_at)
                VALUES ($1, $2, $3, 0, $4)
                "#,
            )
            .bind(event.id)
            .bind(offset_minutes)
            .bind(fire_at)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, CrewCallError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Update event status, refreshing `updated_at`. The caller is
    /// responsible for state-machine validation.
    pub async fn update_status(&self, id: i64, status: EventStatus) -> Result<Event, CrewCallError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// List events in a given status
    pub async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, CrewCallError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = $1 ORDER BY starts_at ASC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Load all non-terminal events leniently for restoration.
    ///
    /// Rows whose status column fails to parse are skipped rather than
    /// failing the whole load, so one corrupt record cannot block
    /// restoration of the others. Returns the events plus the ids of
    /// skipped rows.
    pub async fn list_restorable(&self) -> Result<(Vec<Event>, Vec<i64>), CrewCallError> {
        type Row = (
            i64,
            i64,
            String,
            Option<String>,
            DateTime<Utc>,
            i64,
            String,
            i32,
            Option<i64>,
            Option<i64>,
            i64,
            DateTime<Utc>,
            DateTime<Utc>,
        );

        let rows = sqlx::query_as::<_, Row>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status NOT IN ('completed', 'cancelled') ORDER BY starts_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::new();
        let mut skipped = Vec::new();
        for (
            id,
            guild_id,
            title,
            description,
            starts_at,
            duration_minutes,
            status,
            team_capacity,
            category_id,
            channel_id,
            created_by,
            created_at,
            updated_at,
        ) in rows
        {
            match EventStatus::parse(&status) {
                Some(status) => events.push(Event {
                    id,
                    guild_id,
                    title,
                    description,
                    starts_at,
                    duration_minutes,
                    status,
                    team_capacity,
                    category_id,
                    channel_id,
                    created_by,
                    created_at,
                    updated_at,
                }),
                None => skipped.push(id),
            }
        }

        Ok((events, skipped))
    }

    /// Add a signup. The (event_id, user_id) uniqueness constraint backs
    /// the one-signup-per-event invariant.
    pub async fn add_signup(&self, request: SignupRequest) -> Result<Signup, CrewCallError> {
        let signup = sqlx::query_as::<_, Signup>(
            r#"
            INSERT INTO signups (event_id, user_id, team, member_role, crew_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, event_id, user_id, team, member_role, crew_id, created_at
            "#,
        )
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(request.team)
        .bind(request.member_role)
        .bind(request.crew_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(signup)
    }

    /// Find a user's signup for an event
    pub async fn find_signup(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Signup>, CrewCallError> {
        let signup = sqlx::query_as::<_, Signup>(
            "SELECT id, event_id, user_id, team, member_role, crew_id, created_at FROM signups WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(signup)
    }

    /// Remove a signup. Returns whether a row was deleted.
    pub async fn delete_signup(&self, event_id: i64, user_id: i64) -> Result<bool, CrewCallError> {
        let result = sqlx::query("DELETE FROM signups WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all signups for an event in join order
    pub async fn get_signups(&self, event_id: i64) -> Result<Vec<Signup>, CrewCallError> {
        let signups = sqlx::query_as::<_, Signup>(
            "SELECT id, event_id, user_id, team, member_role, crew_id, created_at FROM signups WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(signups)
    }

    /// Count signups on one team of an event
    pub async fn count_team(&self, event_id: i64, team: Team) -> Result<i64, CrewCallError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM signups WHERE event_id = $1 AND team = $2")
                .bind(event_id)
                .bind(team)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Check whether a team already has a commander
    pub async fn team_has_commander(
        &self,
        event_id: i64,
        team: Team,
    ) -> Result<bool, CrewCallError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM signups WHERE event_id = $1 AND team = $2 AND member_role = 'commander'",
        )
        .bind(event_id)
        .bind(team)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
