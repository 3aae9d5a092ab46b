//! Guild settings and user stat repository implementation

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::guild::{GuildSettings, UpdateGuildSettingsRequest, UserStat};
use crate::utils::errors::CrewCallError;

/// Counter selected by stat-bump operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    EventsCreated,
    EventsAttended,
    CrewsJoined,
    PollsVoted,
}

impl StatCounter {
    fn column(&self) -> &'static str {
        match self {
            StatCounter::EventsCreated => "events_created",
            StatCounter::EventsAttended => "events_attended",
            StatCounter::CrewsJoined => "crews_joined",
            StatCounter::PollsVoted => "polls_voted",
        }
    }
}

#[derive(Clone)]
pub struct GuildRepository {
    pool: SqlitePool,
}

impl GuildRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a guild's settings, if a row exists. The offset and map-pool
    /// lists are stored as JSON text, so the row is mapped by hand.
    pub async fn get_settings(&self, guild_id: i64) -> Result<Option<GuildSettings>, CrewCallError> {
        type Row = (
            i64,
            i32,
            String,
            String,
            bool,
            bool,
            Option<i64>,
            Option<i64>,
        );

        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT guild_id, team_capacity, reminder_offsets, map_pool, polls_enabled, crews_enabled, event_category_id, announce_channel_id
            FROM guild_settings
            WHERE guild_id = $1
            "#,
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((
                guild_id,
                team_capacity,
                reminder_offsets,
                map_pool,
                polls_enabled,
                crews_enabled,
                event_category_id,
                announce_channel_id,
            )) => Ok(Some(GuildSettings {
                guild_id,
                team_capacity,
                reminder_offsets: serde_json::from_str(&reminder_offsets)?,
                map_pool: serde_json::from_str(&map_pool)?,
                polls_enabled,
                crews_enabled,
                event_category_id,
                announce_channel_id,
            })),
            None => Ok(None),
        }
    }

    /// Get settings, falling back to defaults when no row exists. The
    /// missing row is not materialized; absence means "all defaults".
    pub async fn get_or_default(&self, guild_id: i64) -> Result<GuildSettings, CrewCallError> {
        Ok(self
            .get_settings(guild_id)
            .await?
            .unwrap_or_else(|| GuildSettings::defaults_for(guild_id)))
    }

    /// Apply an admin update, creating the row lazily on first write.
    pub async fn update_settings(
        &self,
        guild_id: i64,
        request: UpdateGuildSettingsRequest,
    ) -> Result<GuildSettings, CrewCallError> {
        let mut settings = self.get_or_default(guild_id).await?;

        if let Some(capacity) = request.team_capacity {
            settings.team_capacity = capacity;
        }
        if let Some(offsets) = request.reminder_offsets {
            settings.reminder_offsets = offsets;
        }
        if let Some(maps) = request.map_pool {
            settings.map_pool = maps;
        }
        if let Some(polls) = request.polls_enabled {
            settings.polls_enabled = polls;
        }
        if let Some(crews) = request.crews_enabled {
            settings.crews_enabled = crews;
        }
        if let Some(category) = request.event_category_id {
            settings.event_category_id = Some(category);
        }
        if let Some(channel) = request.announce_channel_id {
            settings.announce_channel_id = Some(channel);
        }

        sqlx::query(
            r#"
            INSERT INTO guild_settings (guild_id, team_capacity, reminder_offsets, map_pool, polls_enabled, crews_enabled, event_category_id, announce_channel_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (guild_id) DO UPDATE SET
                team_capacity = $2,
                reminder_offsets = $3,
                map_pool = $4,
                polls_enabled = $5,
                crews_enabled = $6,
                event_category_id = $7,
                announce_channel_id = $8
            "#,
        )
        .bind(settings.guild_id)
        .bind(settings.team_capacity)
        .bind(serde_json::to_string(&settings.reminder_offsets)?)
        .bind(serde_json::to_string(&settings.map_pool)?)
        .bind(settings.polls_enabled)
        .bind(settings.crews_enabled)
        .bind(settings.event_category_id)
        .bind(settings.announce_channel_id)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Increment one counter for a (guild, user) pair, creating the stat
    /// row on first touch.
    pub async fn bump_stat(
        &self,
        guild_id: i64,
        user_id: i64,
        counter: StatCounter,
    ) -> Result<(), CrewCallError> {
        let column = counter.column();
        sqlx::query(&format!(
            r#"
            INSERT INTO user_stats (guild_id, user_id, {column}, updated_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (guild_id, user_id) DO UPDATE SET
                {column} = {column} + 1,
                updated_at = $3
            "#
        ))
        .bind(guild_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user's stats within a guild
    pub async fn get_stats(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Option<UserStat>, CrewCallError> {
        let stat = sqlx::query_as::<_, UserStat>(
            r#"
            SELECT guild_id, user_id, events_created, events_attended, crews_joined, polls_voted, updated_at
            FROM user_stats
            WHERE guild_id = $1 AND user_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stat)
    }

    /// Reset a user's counters (explicit admin operation, the only
    /// permitted decrease).
    pub async fn reset_stats(&self, guild_id: i64, user_id: i64) -> Result<(), CrewCallError> {
        sqlx::query(
            r#"
            UPDATE user_stats
            SET events_created = 0, events_attended = 0, crews_joined = 0, polls_voted = 0, updated_at = $3
            WHERE guild_id = $1 AND user_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
