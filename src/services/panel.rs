//! Interactive panel binding
//!
//! The rendering layer owns buttons and menus; the engine only hands it
//! opaque state snapshots to draw from. Panels are a derived, rebuildable
//! cache over the store: the Restoration Coordinator re-binds them from
//! durable rows at startup, so they are never the only copy of state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::event::{EventStatus, SignupRole, Team};
use crate::models::poll::{PollStatus, TallyLine};
use crate::utils::errors::DeliveryResult;

/// One line of an event's team roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterLine {
    pub user_id: i64,
    pub team: Team,
    pub member_role: SignupRole,
    pub crew_id: Option<i64>,
}

/// Snapshot of an event's interactive state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRosterSnapshot {
    pub event_id: i64,
    pub title: String,
    pub status: EventStatus,
    pub starts_at: DateTime<Utc>,
    pub team_capacity: i32,
    pub roster: Vec<RosterLine>,
}

/// Snapshot of a poll's interactive state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollTallySnapshot {
    pub poll_id: i64,
    pub title: String,
    pub status: PollStatus,
    pub ends_at: DateTime<Utc>,
    pub tally: Vec<TallyLine>,
}

#[async_trait]
pub trait PanelHost: Send + Sync {
    async fn bind_event_panel(&self, snapshot: EventRosterSnapshot) -> DeliveryResult<()>;
    async fn bind_poll_panel(&self, snapshot: PollTallySnapshot) -> DeliveryResult<()>;
}

/// Panel host that only logs, for running without a rendering layer.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyPanelHost;

#[async_trait]
impl PanelHost for LogOnlyPanelHost {
    async fn bind_event_panel(&self, snapshot: EventRosterSnapshot) -> DeliveryResult<()> {
        debug!(
            event_id = snapshot.event_id,
            roster_len = snapshot.roster.len(),
            "Event panel bound (log-only host)"
        );
        Ok(())
    }

    async fn bind_poll_panel(&self, snapshot: PollTallySnapshot) -> DeliveryResult<()> {
        debug!(
            poll_id = snapshot.poll_id,
            options = snapshot.tally.len(),
            "Poll panel bound (log-only host)"
        );
        Ok(())
    }
}
