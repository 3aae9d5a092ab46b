//! Poll engine
//!
//! Time-boxed votes (map votes in particular) with a last-write-wins vote
//! mapping and a periodically refreshed tally. `refresh` is the single
//! periodic entry point: it recomputes the ranked tally, re-binds the
//! panel, and self-closes the poll once its end time passes, so a
//! displayed tally stays current with no new votes and no external
//! trigger. Closing is guarded by the Open -> Closed status transition,
//! which makes it safe to re-invoke from restoration without announcing
//! a winner twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::database::{DatabaseService, StatCounter};
use crate::models::poll::{OpenPollRequest, Poll, PollStatus, PollVote, TallyLine};
use crate::services::delivery::{Delivery, DeliveryTarget};
use crate::services::panel::{PanelHost, PollTallySnapshot};
use crate::utils::errors::{CrewCallError, Result};

/// Result of a `refresh` pass.
#[derive(Debug, Clone)]
pub struct PollRefresh {
    pub poll: Poll,
    pub tally: Vec<TallyLine>,
    /// True when this refresh performed the Open -> Closed transition
    pub closed_now: bool,
}

#[derive(Clone)]
pub struct PollEngine {
    db: DatabaseService,
    delivery: Arc<dyn Delivery>,
    panels: Arc<dyn PanelHost>,
}

impl PollEngine {
    pub fn new(
        db: DatabaseService,
        delivery: Arc<dyn Delivery>,
        panels: Arc<dyn PanelHost>,
    ) -> Self {
        Self {
            db,
            delivery,
            panels,
        }
    }

    /// Open a new poll. Requires at least two options and an end time in
    /// the future.
    pub async fn open(&self, request: OpenPollRequest) -> Result<Poll> {
        if request.options.len() < 2 {
            return Err(CrewCallError::InvalidInput(
                "a poll needs at least two options".to_string(),
            ));
        }
        if request.ends_at <= Utc::now() {
            return Err(CrewCallError::InvalidInput(
                "poll end time must be in the future".to_string(),
            ));
        }

        let poll = self.db.polls.create(request).await?;
        info!(poll_id = poll.id, ends_at = %poll.ends_at, "Poll opened");

        self.rebind_panel(&poll).await;
        Ok(poll)
    }

    /// Cast or change a vote. One active choice per voter; a repeat vote
    /// overwrites the previous one.
    pub async fn vote(&self, poll_id: i64, user_id: i64, option_id: i64) -> Result<PollVote> {
        let poll = self
            .db
            .polls
            .find_by_id(poll_id)
            .await?
            .ok_or(CrewCallError::PollNotFound { poll_id })?;

        if poll.status == PollStatus::Closed || poll.ends_at <= Utc::now() {
            // A poll past its end time is closed in effect even before
            // the sweep gets to it.
            return Err(CrewCallError::PollClosed { poll_id });
        }

        let options = self.db.polls.get_options(poll_id).await?;
        if !options.iter().any(|o| o.id == option_id) {
            return Err(CrewCallError::InvalidInput(format!(
                "option {option_id} does not belong to poll {poll_id}"
            )));
        }

        let first_vote = self.db.polls.find_vote(poll_id, user_id).await?.is_none();
        let vote = self.db.polls.upsert_vote(poll_id, user_id, option_id).await?;
        if first_vote {
            self.db
                .guilds
                .bump_stat(poll.guild_id, user_id, StatCounter::PollsVoted)
                .await?;
        }

        debug!(poll_id = poll_id, user_id = user_id, option_id = option_id, "Vote recorded");
        self.rebind_panel(&poll).await;
        Ok(vote)
    }

    /// Recompute the ranked tally and re-bind the panel; close the poll
    /// if its end time has passed. Idempotent: refreshing twice without
    /// intervening votes yields the same tally and no repeated side
    /// effects.
    pub async fn refresh(&self, poll_id: i64) -> Result<PollRefresh> {
        let poll = self
            .db
            .polls
            .find_by_id(poll_id)
            .await?
            .ok_or(CrewCallError::PollNotFound { poll_id })?;

        let mut closed_now = false;
        let poll = if poll.status == PollStatus::Open && poll.ends_at <= Utc::now() {
            closed_now = self.close(poll_id).await?;
            self.db
                .polls
                .find_by_id(poll_id)
                .await?
                .ok_or(CrewCallError::PollNotFound { poll_id })?
        } else {
            poll
        };

        let tally = self.db.polls.tally(poll_id).await?;
        self.rebind_panel(&poll).await;

        Ok(PollRefresh {
            poll,
            tally,
            closed_now,
        })
    }

    /// Close a poll, freezing its vote mapping and announcing the winner.
    /// Idempotent: closing an already-closed poll is a no-op, not an
    /// error. Returns whether this call performed the close.
    pub async fn close(&self, poll_id: i64) -> Result<bool> {
        let poll = self
            .db
            .polls
            .find_by_id(poll_id)
            .await?
            .ok_or(CrewCallError::PollNotFound { poll_id })?;

        let tally = self.db.polls.tally(poll_id).await?;
        // Leader under the documented tie-break: highest vote count,
        // earliest-created option among ties.
        let winner = tally.first().map(|line| line.option_id);

        let closed_now = self.db.polls.close(poll_id, winner).await?;
        if !closed_now {
            return Ok(false);
        }

        info!(poll_id = poll_id, winner_option_id = ?winner, "Poll closed");

        if let Some(line) = tally.first() {
            self.announce_winner(&poll, line).await;
        }

        Ok(true)
    }

    /// Winner announcement goes to the guild announce channel when one is
    /// configured. Delivery failure never blocks the close itself.
    async fn announce_winner(&self, poll: &Poll, winner: &TallyLine) {
        let settings = match self.db.guilds.get_or_default(poll.guild_id).await {
            Ok(settings) => settings,
            Err(e) => {
                error!(poll_id = poll.id, error = %e, "Failed to load guild settings for announcement");
                return;
            }
        };

        let Some(channel_id) = settings.announce_channel_id else {
            debug!(poll_id = poll.id, "No announce channel configured, skipping winner announcement");
            return;
        };

        let content = format!(
            "{} has closed. Winner: {} ({} votes)",
            poll.title, winner.label, winner.votes
        );
        if let Err(e) = self
            .delivery
            .notify(DeliveryTarget::Channel(channel_id), &content)
            .await
        {
            warn!(poll_id = poll.id, error = %e, "Failed to announce poll winner");
        }
    }

    /// Current ranked tally without side effects.
    pub async fn tally(&self, poll_id: i64) -> Result<Vec<TallyLine>> {
        self.db.polls.tally(poll_id).await
    }

    /// One pass of the refresh sweep over all open polls. Per-poll
    /// failures are logged and do not stop the pass.
    pub async fn run_refresh_sweep(&self) -> Result<usize> {
        let open = self.db.polls.list_open().await?;
        let count = open.len();

        for poll in open {
            if let Err(e) = self.refresh(poll.id).await {
                error!(poll_id = poll.id, error = %e, "Poll refresh failed");
            }
        }

        Ok(count)
    }

    /// Spawn the periodic refresh sweep. The loop finishes an in-flight
    /// pass before honoring shutdown; a tick that arrives while a pass is
    /// still running is skipped rather than overlapped.
    pub fn spawn_refresh_sweep(
        self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_refresh_sweep().await {
                            error!(error = %e, "Poll refresh sweep failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("Poll refresh sweep shutting down");
                        break;
                    }
                }
            }
        })
    }

    async fn rebind_panel(&self, poll: &Poll) {
        let tally = match self.db.polls.tally(poll.id).await {
            Ok(tally) => tally,
            Err(e) => {
                error!(poll_id = poll.id, error = %e, "Failed to build poll snapshot");
                return;
            }
        };

        let snapshot = PollTallySnapshot {
            poll_id: poll.id,
            title: poll.title.clone(),
            status: poll.status,
            ends_at: poll.ends_at,
            tally,
        };
        if let Err(e) = self.panels.bind_poll_panel(snapshot).await {
            warn!(poll_id = poll.id, error = %e, "Failed to bind poll panel");
        }
    }
}
