//! Event lifecycle manager
//!
//! Owns event creation, state transitions, signup bookkeeping and the
//! role hooks tied to an event's boundaries. Guild configuration (team
//! capacity, reminder offsets, channel placement, map pool) is read once
//! at schedule time and frozen into the created records, so later
//! settings changes never retroactively alter scheduled events.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::database::{DatabaseService, StatCounter};
use crate::models::event::{
    CreateEventRequest, Event, EventStatus, NewEvent, Signup, SignupRequest, SignupRole,
};
use crate::models::poll::{OpenPollRequest, Poll};
use crate::services::delivery::{Delivery, DeliveryTarget, RoleGateway, RoleScope};
use crate::services::panel::{EventRosterSnapshot, PanelHost, RosterLine};
use crate::services::poll::PollEngine;
use crate::utils::errors::{CrewCallError, Result};

/// Offsets already more than this far in the past at schedule time are
/// dropped instead of firing a stale reminder on the first sweep.
const OVERDUE_OFFSET_GRACE_SECS: i64 = 60;

/// Map votes end an hour before the event. Only when that leaves a
/// window of 15 minutes or less does the vote fall back to a 30-minute
/// minimum, so late scheduling still gets a usable vote.
const MAP_VOTE_LEAD_MINUTES: i64 = 60;
const MAP_VOTE_SHORT_WINDOW_MINUTES: i64 = 15;
const MAP_VOTE_MINIMUM_MINUTES: i64 = 30;

/// What happened to the automatic map vote when an event was scheduled.
#[derive(Debug, Clone)]
pub enum MapVoteOutcome {
    Opened(Poll),
    /// Poll engine not wired, or polls disabled for the guild
    Disabled,
    /// Guild has no map pool to vote on
    NoMapPool,
}

#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub event: Event,
    pub map_vote: MapVoteOutcome,
}

/// Counts from one `advance_due` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub activated: usize,
    pub completed: usize,
}

#[derive(Clone)]
pub struct EventLifecycleManager {
    db: DatabaseService,
    delivery: Arc<dyn Delivery>,
    roles: Arc<dyn RoleGateway>,
    panels: Arc<dyn PanelHost>,
    /// Optional capability: absent means auto map votes report
    /// `Disabled` instead of faulting.
    poll_engine: Option<PollEngine>,
}

impl EventLifecycleManager {
    pub fn new(
        db: DatabaseService,
        delivery: Arc<dyn Delivery>,
        roles: Arc<dyn RoleGateway>,
        panels: Arc<dyn PanelHost>,
        poll_engine: Option<PollEngine>,
    ) -> Self {
        Self {
            db,
            delivery,
            roles,
            panels,
            poll_engine,
        }
    }

    /// Schedule a new event: validates the start time, freezes guild
    /// settings into the record, creates the reminder entries, and opens
    /// the linked map vote when the poll capability is available.
    pub async fn schedule(&self, request: CreateEventRequest) -> Result<ScheduleOutcome> {
        let now = Utc::now();
        if request.starts_at <= now {
            return Err(CrewCallError::InvalidInput(
                "cannot schedule an event in the past".to_string(),
            ));
        }
        if request.duration_minutes <= 0 {
            return Err(CrewCallError::InvalidInput(
                "event duration must be positive".to_string(),
            ));
        }

        let settings = self.db.guilds.get_or_default(request.guild_id).await?;

        let title = request
            .title
            .clone()
            .unwrap_or_else(|| request.preset.default_title().to_string());
        let description = request
            .description
            .clone()
            .or_else(|| Some(request.preset.default_description().to_string()));

        let mut fire_times: Vec<(i64, DateTime<Utc>)> = Vec::new();
        for &offset in &settings.reminder_offsets {
            if offset <= 0 {
                continue;
            }
            let fire_at = request.starts_at - Duration::minutes(offset);
            if fire_at < now - Duration::seconds(OVERDUE_OFFSET_GRACE_SECS) {
                continue;
            }
            if fire_times.iter().any(|(o, _)| *o == offset) {
                continue;
            }
            fire_times.push((offset, fire_at));
        }

        let new_event = NewEvent {
            guild_id: request.guild_id,
            title,
            description,
            starts_at: request.starts_at,
            duration_minutes: request.duration_minutes,
            team_capacity: settings.team_capacity,
            category_id: settings.event_category_id,
            channel_id: settings.announce_channel_id,
            created_by: request.created_by,
        };
        let event = self.db.events.create_with_reminders(new_event, &fire_times).await?;

        self.db
            .guilds
            .bump_stat(event.guild_id, event.created_by, StatCounter::EventsCreated)
            .await?;

        info!(
            event_id = event.id,
            guild_id = event.guild_id,
            starts_at = %event.starts_at,
            reminders = fire_times.len(),
            "Event scheduled"
        );

        let map_vote = if settings.polls_enabled {
            self.open_map_vote(&event, &settings.map_pool).await
        } else {
            MapVoteOutcome::Disabled
        };
        self.rebind_panel(&event).await;

        Ok(ScheduleOutcome { event, map_vote })
    }

    async fn open_map_vote(&self, event: &Event, map_pool: &[String]) -> MapVoteOutcome {
        let Some(engine) = &self.poll_engine else {
            return MapVoteOutcome::Disabled;
        };
        if map_pool.len() < 2 {
            return MapVoteOutcome::NoMapPool;
        }

        // Vote closes an hour before start. The 30-minute minimum kicks
        // in only once the remaining window shrinks to 15 minutes or
        // less; anything longer keeps the full lead.
        let now = Utc::now();
        let lead_end = event.starts_at - Duration::minutes(MAP_VOTE_LEAD_MINUTES);
        let ends_at = if lead_end - now <= Duration::minutes(MAP_VOTE_SHORT_WINDOW_MINUTES) {
            now + Duration::minutes(MAP_VOTE_MINIMUM_MINUTES)
        } else {
            lead_end
        };

        let request = OpenPollRequest {
            guild_id: event.guild_id,
            event_id: Some(event.id),
            title: format!("Map vote: {}", event.title),
            options: map_pool.to_vec(),
            ends_at,
        };
        match engine.open(request).await {
            Ok(poll) => MapVoteOutcome::Opened(poll),
            Err(e) => {
                warn!(event_id = event.id, error = %e, "Auto map vote could not be opened");
                MapVoteOutcome::Disabled
            }
        }
    }

    /// Sign a user up for one team of an event.
    ///
    /// Hard errors, surfaced for a user-facing message: the team is full
    /// (`CapacityExceeded`), the user already holds a signup for this
    /// event (`AlreadySignedUp`), or a second commander claim
    /// (`CommanderTaken`). The role grant is attempted after the signup
    /// commits and never blocks it.
    pub async fn signup(&self, request: SignupRequest) -> Result<Signup> {
        let event = self.require_event(request.event_id).await?;
        if event.status.is_terminal() {
            return Err(CrewCallError::InvalidStateTransition {
                from: event.status.as_str().to_string(),
                to: "signup".to_string(),
            });
        }

        if self
            .db
            .events
            .find_signup(request.event_id, request.user_id)
            .await?
            .is_some()
        {
            return Err(CrewCallError::AlreadySignedUp {
                event_id: request.event_id,
                user_id: request.user_id,
            });
        }

        if request.member_role == SignupRole::Commander
            && self
                .db
                .events
                .team_has_commander(request.event_id, request.team)
                .await?
        {
            return Err(CrewCallError::CommanderTaken {
                team: request.team.as_str().to_string(),
            });
        }

        let team_count = self.db.events.count_team(request.event_id, request.team).await?;
        if team_count >= event.team_capacity as i64 {
            return Err(CrewCallError::CapacityExceeded {
                team: request.team.as_str().to_string(),
                capacity: event.team_capacity,
            });
        }

        let team = request.team;
        let user_id = request.user_id;
        let signup = self.db.events.add_signup(request).await?;

        let scope = RoleScope {
            event_id: event.id,
            team: Some(team),
        };
        if let Err(e) = self.roles.grant_role(user_id, scope).await {
            warn!(event_id = event.id, user_id = user_id, error = %e, "Role grant failed");
        }

        info!(event_id = event.id, user_id = user_id, team = team.as_str(), "User signed up");
        self.rebind_panel(&event).await;
        Ok(signup)
    }

    /// Sign a whole persistent crew up on one team. The caller must be
    /// able to manage the crew; capacity must fit every member at once.
    pub async fn signup_with_crew(
        &self,
        event_id: i64,
        crew_id: i64,
        actor_id: i64,
        team: crate::models::event::Team,
    ) -> Result<Vec<Signup>> {
        let event = self.require_event(event_id).await?;
        let role = self
            .db
            .crews
            .member_role(crew_id, actor_id)
            .await?
            .ok_or(CrewCallError::CrewNotFound { crew_id })?;
        if !role.can_manage() {
            return Err(CrewCallError::PermissionDenied(
                "only the crew owner or a lead may sign the crew up".to_string(),
            ));
        }

        let members = self.db.crews.get_members(crew_id).await?;
        for member in &members {
            if self
                .db
                .events
                .find_signup(event_id, member.user_id)
                .await?
                .is_some()
            {
                return Err(CrewCallError::AlreadySignedUp {
                    event_id,
                    user_id: member.user_id,
                });
            }
        }

        let team_count = self.db.events.count_team(event_id, team).await?;
        if team_count + members.len() as i64 > event.team_capacity as i64 {
            return Err(CrewCallError::CapacityExceeded {
                team: team.as_str().to_string(),
                capacity: event.team_capacity,
            });
        }

        let mut signups = Vec::with_capacity(members.len());
        for member in &members {
            let signup = self
                .signup(SignupRequest {
                    event_id,
                    user_id: member.user_id,
                    team,
                    member_role: SignupRole::Member,
                    crew_id: Some(crew_id),
                })
                .await?;
            signups.push(signup);
        }

        info!(event_id = event_id, crew_id = crew_id, members = signups.len(), "Crew signed up");
        Ok(signups)
    }

    /// Withdraw a user's signup and revoke their team role.
    pub async fn withdraw(&self, event_id: i64, user_id: i64) -> Result<()> {
        let event = self.require_event(event_id).await?;
        let signup = self
            .db
            .events
            .find_signup(event_id, user_id)
            .await?
            .ok_or(CrewCallError::NotSignedUp { event_id, user_id })?;

        self.db.events.delete_signup(event_id, user_id).await?;

        let scope = RoleScope {
            event_id,
            team: Some(signup.team),
        };
        if let Err(e) = self.roles.revoke_role(user_id, scope).await {
            warn!(event_id = event_id, user_id = user_id, error = %e, "Role revoke failed");
        }

        info!(event_id = event_id, user_id = user_id, "User withdrew from event");
        self.rebind_panel(&event).await;
        Ok(())
    }

    /// Cancel an event: terminal transition, reminder cleanup, bulk role
    /// revoke. Historical signups stay for stats.
    pub async fn cancel(&self, event_id: i64) -> Result<Event> {
        let event = self.transition(event_id, EventStatus::Cancelled).await?;
        self.db.reminders.delete_for_event(event_id).await?;
        self.revoke_all_roles(&event).await;

        if let Some(engine) = &self.poll_engine {
            if let Some(poll) = self.db.polls.find_by_event(event_id).await? {
                engine.close(poll.id).await?;
            }
        }

        if let Some(channel_id) = event.channel_id {
            let content = format!("{} has been cancelled.", event.title);
            if let Err(e) = self
                .delivery
                .notify(DeliveryTarget::Channel(channel_id), &content)
                .await
            {
                warn!(event_id = event_id, error = %e, "Cancellation notice failed");
            }
        }

        info!(event_id = event_id, "Event cancelled");
        self.rebind_panel(&event).await;
        Ok(event)
    }

    /// Complete an event: terminal transition, reminder cleanup, role
    /// revoke, attendance counters.
    pub async fn complete(&self, event_id: i64) -> Result<Event> {
        let event = self.transition(event_id, EventStatus::Completed).await?;
        self.db.reminders.delete_for_event(event_id).await?;
        self.revoke_all_roles(&event).await;

        for signup in self.db.events.get_signups(event_id).await? {
            self.db
                .guilds
                .bump_stat(event.guild_id, signup.user_id, StatCounter::EventsAttended)
                .await?;
        }

        info!(event_id = event_id, "Event completed");
        self.rebind_panel(&event).await;
        Ok(event)
    }

    /// Mark a Scheduled event Active once its start time arrives.
    pub async fn activate(&self, event_id: i64) -> Result<Event> {
        let event = self.transition(event_id, EventStatus::Active).await?;
        info!(event_id = event_id, "Event is now active");
        self.rebind_panel(&event).await;
        Ok(event)
    }

    /// Advance every event whose clock boundary passed: Scheduled events
    /// past their start go Active (or straight to Completed when the
    /// whole window elapsed, e.g. after downtime), Active events past
    /// their end go Completed. Called from the reminder sweep and from
    /// restoration.
    pub async fn advance_due(&self, now: DateTime<Utc>) -> Result<AdvanceReport> {
        let mut report = AdvanceReport::default();

        for event in self.db.events.list_by_status(EventStatus::Scheduled).await? {
            if event.ends_at() <= now {
                self.complete(event.id).await?;
                report.completed += 1;
            } else if event.starts_at <= now {
                self.activate(event.id).await?;
                report.activated += 1;
            }
        }

        for event in self.db.events.list_by_status(EventStatus::Active).await? {
            if event.ends_at() <= now {
                self.complete(event.id).await?;
                report.completed += 1;
            }
        }

        Ok(report)
    }

    /// Build and re-bind the roster panel snapshot for an event. Used on
    /// every roster mutation and by restoration.
    pub async fn rebind_panel(&self, event: &Event) {
        let signups = match self.db.events.get_signups(event.id).await {
            Ok(signups) => signups,
            Err(e) => {
                warn!(event_id = event.id, error = %e, "Failed to build roster snapshot");
                return;
            }
        };

        let snapshot = EventRosterSnapshot {
            event_id: event.id,
            title: event.title.clone(),
            status: event.status,
            starts_at: event.starts_at,
            team_capacity: event.team_capacity,
            roster: signups
                .into_iter()
                .map(|s| RosterLine {
                    user_id: s.user_id,
                    team: s.team,
                    member_role: s.member_role,
                    crew_id: s.crew_id,
                })
                .collect(),
        };
        if let Err(e) = self.panels.bind_event_panel(snapshot).await {
            warn!(event_id = event.id, error = %e, "Failed to bind event panel");
        }
    }

    async fn require_event(&self, event_id: i64) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(CrewCallError::EventNotFound { event_id })
    }

    /// Validated status transition; rejects anything the state machine
    /// does not allow, which keeps terminal states terminal.
    async fn transition(&self, event_id: i64, to: EventStatus) -> Result<Event> {
        let event = self.require_event(event_id).await?;
        if !event.status.can_transition_to(to) {
            return Err(CrewCallError::InvalidStateTransition {
                from: event.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.db.events.update_status(event_id, to).await
    }

    async fn revoke_all_roles(&self, event: &Event) {
        let signups = match self.db.events.get_signups(event.id).await {
            Ok(signups) => signups,
            Err(e) => {
                warn!(event_id = event.id, error = %e, "Failed to load signups for role revoke");
                return;
            }
        };

        for signup in signups {
            let scope = RoleScope {
                event_id: event.id,
                team: Some(signup.team),
            };
            if let Err(e) = self.roles.revoke_role(signup.user_id, scope).await {
                warn!(
                    event_id = event.id,
                    user_id = signup.user_id,
                    error = %e,
                    "Role revoke failed"
                );
            }
        }
    }
}
