//! Crew repository implementation

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::crew::{Crew, CrewInvite, CrewMember, CrewRole, InviteStatus};
use crate::utils::errors::CrewCallError;

const CREW_COLUMNS: &str = "id, guild_id, name, owner_id, wins, losses, created_at";
const INVITE_COLUMNS: &str = "id, crew_id, invitee_id, invited_by, status, created_at";

#[derive(Clone)]
pub struct CrewRepository {
    pool: SqlitePool,
}

impl CrewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a crew with its owner as the first member, in one transaction.
    pub async fn create(
        &self,
        guild_id: i64,
        name: &str,
        owner_id: i64,
    ) -> Result<Crew, CrewCallError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let crew = sqlx::query_as::<_, Crew>(&format!(
            r#"
            INSERT INTO crews (guild_id, name, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {CREW_COLUMNS}
            "#
        ))
        .bind(guild_id)
        .bind(name)
        .bind(owner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO crew_members (crew_id, user_id, member_role, joined_at) VALUES ($1, $2, 'owner', $3)",
        )
        .bind(crew.id)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(crew)
    }

    /// Find crew by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Crew>, CrewCallError> {
        let crew =
            sqlx::query_as::<_, Crew>(&format!("SELECT {CREW_COLUMNS} FROM crews WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(crew)
    }

    /// List crews a user belongs to within a guild
    pub async fn user_crews(&self, guild_id: i64, user_id: i64) -> Result<Vec<Crew>, CrewCallError> {
        let crews = sqlx::query_as::<_, Crew>(
            r#"
            SELECT c.id, c.guild_id, c.name, c.owner_id, c.wins, c.losses, c.created_at
            FROM crews c
            JOIN crew_members m ON m.crew_id = c.id
            WHERE c.guild_id = $1 AND m.user_id = $2
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(crews)
    }

    /// Get crew members ordered by join time
    pub async fn get_members(&self, crew_id: i64) -> Result<Vec<CrewMember>, CrewCallError> {
        let members = sqlx::query_as::<_, CrewMember>(
            "SELECT crew_id, user_id, member_role, joined_at FROM crew_members WHERE crew_id = $1 ORDER BY joined_at ASC, user_id ASC",
        )
        .bind(crew_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Get one member's role, if they belong to the crew
    pub async fn member_role(
        &self,
        crew_id: i64,
        user_id: i64,
    ) -> Result<Option<CrewRole>, CrewCallError> {
        let role: Option<(CrewRole,)> = sqlx::query_as(
            "SELECT member_role FROM crew_members WHERE crew_id = $1 AND user_id = $2",
        )
        .bind(crew_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role.map(|(r,)| r))
    }

    /// Add a member
    pub async fn add_member(
        &self,
        crew_id: i64,
        user_id: i64,
        role: CrewRole,
    ) -> Result<CrewMember, CrewCallError> {
        let member = sqlx::query_as::<_, CrewMember>(
            r#"
            INSERT INTO crew_members (crew_id, user_id, member_role, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING crew_id, user_id, member_role, joined_at
            "#,
        )
        .bind(crew_id)
        .bind(user_id)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Remove a member. Returns whether a row was deleted.
    pub async fn remove_member(&self, crew_id: i64, user_id: i64) -> Result<bool, CrewCallError> {
        let result = sqlx::query("DELETE FROM crew_members WHERE crew_id = $1 AND user_id = $2")
            .bind(crew_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a pending invite
    pub async fn create_invite(
        &self,
        crew_id: i64,
        invitee_id: i64,
        invited_by: i64,
    ) -> Result<CrewInvite, CrewCallError> {
        let invite = sqlx::query_as::<_, CrewInvite>(&format!(
            r#"
            INSERT INTO crew_invites (crew_id, invitee_id, invited_by, status, created_at)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(crew_id)
        .bind(invitee_id)
        .bind(invited_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    /// Find a user's pending invite to a crew
    pub async fn pending_invite(
        &self,
        crew_id: i64,
        invitee_id: i64,
    ) -> Result<Option<CrewInvite>, CrewCallError> {
        let invite = sqlx::query_as::<_, CrewInvite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM crew_invites WHERE crew_id = $1 AND invitee_id = $2 AND status = 'pending'"
        ))
        .bind(crew_id)
        .bind(invitee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    /// Resolve an invite to accepted or declined
    pub async fn set_invite_status(
        &self,
        invite_id: i64,
        status: InviteStatus,
    ) -> Result<(), CrewCallError> {
        sqlx::query("UPDATE crew_invites SET status = $2 WHERE id = $1")
            .bind(invite_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Record a battle result on the crew's running tally
    pub async fn record_result(&self, crew_id: i64, won: bool) -> Result<(), CrewCallError> {
        let column = if won { "wins" } else { "losses" };
        sqlx::query(&format!(
            "UPDATE crews SET {column} = {column} + 1 WHERE id = $1"
        ))
        .bind(crew_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Disband a crew: members, invites and the crew row go in one
    /// transaction.
    pub async fn delete(&self, crew_id: i64) -> Result<(), CrewCallError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM crew_invites WHERE crew_id = $1")
            .bind(crew_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM crew_members WHERE crew_id = $1")
            .bind(crew_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM crews WHERE id = $1")
            .bind(crew_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
