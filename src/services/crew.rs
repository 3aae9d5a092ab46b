//! Crew manager
//!
//! Persistent sub-groups that outlive individual events. Invitations use
//! a two-tier delivery policy: direct message first, with an explicit,
//! logged fallback to the guild announce channel when the direct channel
//! is unreachable.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::{DatabaseService, StatCounter};
use crate::models::crew::{Crew, CrewInvite, CrewMember, CrewRole, InviteResponse, InviteStatus};
use crate::services::delivery::{Delivery, DeliveryTarget};
use crate::utils::errors::{CrewCallError, Result};

#[derive(Clone)]
pub struct CrewManager {
    db: DatabaseService,
    delivery: Arc<dyn Delivery>,
}

impl CrewManager {
    pub fn new(db: DatabaseService, delivery: Arc<dyn Delivery>) -> Self {
        Self { db, delivery }
    }

    /// Create a new crew owned by `owner_id`.
    pub async fn create(&self, guild_id: i64, name: &str, owner_id: i64) -> Result<Crew> {
        let settings = self.db.guilds.get_or_default(guild_id).await?;
        if !settings.crews_enabled {
            return Err(CrewCallError::FeatureDisabled("crews"));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(CrewCallError::InvalidInput(
                "crew name must not be empty".to_string(),
            ));
        }

        let crew = self.db.crews.create(guild_id, name, owner_id).await?;
        self.db
            .guilds
            .bump_stat(guild_id, owner_id, StatCounter::CrewsJoined)
            .await?;

        info!(crew_id = crew.id, guild_id = guild_id, owner_id = owner_id, "Crew created");
        Ok(crew)
    }

    /// Invite a user. Inviting an existing member yields `AlreadyMember`;
    /// a still-pending invite is returned as-is rather than duplicated.
    pub async fn invite(&self, crew_id: i64, inviter_id: i64, invitee_id: i64) -> Result<CrewInvite> {
        let crew = self.require_crew(crew_id).await?;
        self.require_manager(crew_id, inviter_id).await?;

        if self.db.crews.member_role(crew_id, invitee_id).await?.is_some() {
            return Err(CrewCallError::AlreadyMember {
                crew_id,
                user_id: invitee_id,
            });
        }

        if let Some(pending) = self.db.crews.pending_invite(crew_id, invitee_id).await? {
            return Ok(pending);
        }

        let invite = self.db.crews.create_invite(crew_id, invitee_id, inviter_id).await?;
        self.deliver_invite(&crew, invitee_id).await;

        info!(crew_id = crew_id, invitee_id = invitee_id, inviter_id = inviter_id, "Crew invite sent");
        Ok(invite)
    }

    /// Direct message first; on failure the fallback to the guild
    /// announce channel is explicit and logged, never silent.
    async fn deliver_invite(&self, crew: &Crew, invitee_id: i64) {
        let content = format!("You have been invited to join crew '{}'.", crew.name);
        match self
            .delivery
            .notify(DeliveryTarget::User(invitee_id), &content)
            .await
        {
            Ok(()) => {}
            Err(e) => {
                warn!(
                    crew_id = crew.id,
                    invitee_id = invitee_id,
                    error = %e,
                    "Direct invite delivery failed, falling back to guild channel"
                );
                let settings = match self.db.guilds.get_or_default(crew.guild_id).await {
                    Ok(settings) => settings,
                    Err(e) => {
                        warn!(crew_id = crew.id, error = %e, "Failed to load guild settings for invite fallback");
                        return;
                    }
                };
                let Some(channel_id) = settings.announce_channel_id else {
                    warn!(crew_id = crew.id, invitee_id = invitee_id, "No announce channel, invite notification dropped");
                    return;
                };
                let fallback = format!(
                    "Crew invite for user {invitee_id}: you have been invited to join '{}'.",
                    crew.name
                );
                if let Err(e) = self
                    .delivery
                    .notify(DeliveryTarget::Channel(channel_id), &fallback)
                    .await
                {
                    warn!(crew_id = crew.id, error = %e, "Fallback invite delivery failed");
                }
            }
        }
    }

    /// Accept or decline a pending invite. Accepting when already a
    /// member resolves to `AlreadyMember` instead of a duplicate row.
    pub async fn respond(
        &self,
        crew_id: i64,
        invitee_id: i64,
        response: InviteResponse,
    ) -> Result<Option<CrewMember>> {
        let crew = self.require_crew(crew_id).await?;

        if self.db.crews.member_role(crew_id, invitee_id).await?.is_some() {
            return Err(CrewCallError::AlreadyMember {
                crew_id,
                user_id: invitee_id,
            });
        }

        let invite = self
            .db
            .crews
            .pending_invite(crew_id, invitee_id)
            .await?
            .ok_or_else(|| {
                CrewCallError::InvalidInput("no pending invite for this crew".to_string())
            })?;

        match response {
            InviteResponse::Accept => {
                let member = self
                    .db
                    .crews
                    .add_member(crew_id, invitee_id, CrewRole::Member)
                    .await?;
                self.db
                    .crews
                    .set_invite_status(invite.id, InviteStatus::Accepted)
                    .await?;
                self.db
                    .guilds
                    .bump_stat(crew.guild_id, invitee_id, StatCounter::CrewsJoined)
                    .await?;

                info!(crew_id = crew_id, user_id = invitee_id, "Crew invite accepted");
                Ok(Some(member))
            }
            InviteResponse::Decline => {
                self.db
                    .crews
                    .set_invite_status(invite.id, InviteStatus::Declined)
                    .await?;

                info!(crew_id = crew_id, user_id = invitee_id, "Crew invite declined");
                Ok(None)
            }
        }
    }

    /// Remove a member. Owners and leads may remove others; anyone may
    /// remove themselves. The owner cannot be removed, only disbanded.
    pub async fn remove(&self, crew_id: i64, actor_id: i64, target_id: i64) -> Result<()> {
        let crew = self.require_crew(crew_id).await?;

        if actor_id != target_id {
            self.require_manager(crew_id, actor_id).await?;
        }
        if target_id == crew.owner_id {
            return Err(CrewCallError::InvalidInput(
                "the crew owner cannot be removed, disband the crew instead".to_string(),
            ));
        }

        let removed = self.db.crews.remove_member(crew_id, target_id).await?;
        if !removed {
            return Err(CrewCallError::InvalidInput(
                "user is not a member of this crew".to_string(),
            ));
        }

        info!(crew_id = crew_id, actor_id = actor_id, target_id = target_id, "Crew member removed");
        Ok(())
    }

    /// Disband a crew. Owner/lead only; explicit disbandment is the only
    /// way a crew is deleted.
    pub async fn disband(&self, crew_id: i64, actor_id: i64) -> Result<()> {
        self.require_crew(crew_id).await?;
        self.require_manager(crew_id, actor_id).await?;

        self.db.crews.delete(crew_id).await?;

        info!(crew_id = crew_id, actor_id = actor_id, "Crew disbanded");
        Ok(())
    }

    /// List a user's crews within a guild
    pub async fn user_crews(&self, guild_id: i64, user_id: i64) -> Result<Vec<Crew>> {
        self.db.crews.user_crews(guild_id, user_id).await
    }

    /// Members of a crew, ordered by join time
    pub async fn members(&self, crew_id: i64) -> Result<Vec<CrewMember>> {
        self.require_crew(crew_id).await?;
        self.db.crews.get_members(crew_id).await
    }

    async fn require_crew(&self, crew_id: i64) -> Result<Crew> {
        self.db
            .crews
            .find_by_id(crew_id)
            .await?
            .ok_or(CrewCallError::CrewNotFound { crew_id })
    }

    async fn require_manager(&self, crew_id: i64, user_id: i64) -> Result<CrewRole> {
        let role = self
            .db
            .crews
            .member_role(crew_id, user_id)
            .await?
            .ok_or_else(|| {
                CrewCallError::PermissionDenied("you are not a member of this crew".to_string())
            })?;
        if !role.can_manage() {
            return Err(CrewCallError::PermissionDenied(
                "only the crew owner or a lead may do that".to_string(),
            ));
        }
        Ok(role)
    }
}
