//! Restoration coordinator
//!
//! Runs exactly once at startup, before any sweep task starts: it reloads
//! every non-terminal event and open poll from storage, fast-forwards
//! anything whose clock boundary passed during downtime, and re-binds
//! the interactive panels. One corrupt record is logged and skipped, not
//! allowed to abort the rest of the pass.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::database::DatabaseService;
use crate::models::event::EventStatus;
use crate::services::lifecycle::EventLifecycleManager;
use crate::services::poll::PollEngine;
use crate::utils::errors::Result;

/// Counts from one restoration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub events_restored: usize,
    pub events_fastforwarded: usize,
    pub polls_restored: usize,
    pub polls_closed: usize,
    pub records_skipped: usize,
}

pub struct RestorationCoordinator {
    db: DatabaseService,
    lifecycle: EventLifecycleManager,
    poll_engine: Option<PollEngine>,
}

impl RestorationCoordinator {
    pub fn new(
        db: DatabaseService,
        lifecycle: EventLifecycleManager,
        poll_engine: Option<PollEngine>,
    ) -> Self {
        Self {
            db,
            lifecycle,
            poll_engine,
        }
    }

    pub async fn run(&self) -> Result<RestoreReport> {
        let now = Utc::now();
        let mut report = RestoreReport::default();

        let (events, skipped) = self.db.events.list_restorable().await?;
        for id in &skipped {
            warn!(event_id = id, "Skipped unreadable event record during restoration");
        }
        report.records_skipped += skipped.len();

        for event in events {
            let fastforward = if event.ends_at() <= now {
                Some(self.lifecycle.complete(event.id).await)
            } else if event.status == EventStatus::Scheduled && event.starts_at <= now {
                Some(self.lifecycle.activate(event.id).await)
            } else {
                None
            };

            match fastforward {
                Some(Ok(_)) => {
                    report.events_fastforwarded += 1;
                    info!(event_id = event.id, "Fast-forwarded event past its boundary");
                }
                Some(Err(e)) => {
                    error!(event_id = event.id, error = %e, "Failed to fast-forward event, skipping");
                    report.records_skipped += 1;
                }
                None => {
                    self.lifecycle.rebind_panel(&event).await;
                    report.events_restored += 1;
                }
            }
        }

        if let Some(engine) = &self.poll_engine {
            for poll in self.db.polls.list_open().await? {
                match engine.refresh(poll.id).await {
                    Ok(refresh) if refresh.closed_now => {
                        report.polls_closed += 1;
                        info!(poll_id = poll.id, "Closed stale poll during restoration");
                    }
                    Ok(_) => report.polls_restored += 1,
                    Err(e) => {
                        error!(poll_id = poll.id, error = %e, "Failed to restore poll, skipping");
                        report.records_skipped += 1;
                    }
                }
            }
        }

        info!(
            events_restored = report.events_restored,
            events_fastforwarded = report.events_fastforwarded,
            polls_restored = report.polls_restored,
            polls_closed = report.polls_closed,
            records_skipped = report.records_skipped,
            "Restoration finished"
        );
        Ok(report)
    }
}
