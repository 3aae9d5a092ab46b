//! Reminder scheduler
//!
//! The periodic sweep that drives time forward: it advances event status
//! by wall clock, then delivers every reminder entry whose fire time has
//! passed. An entry is marked delivered only after every target accepted
//! the notification, so a partial failure is retried wholesale on the
//! next sweep. Entries whose event vanished or reached a terminal state
//! are pruned instead of delivered.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::database::DatabaseService;
use crate::models::event::{Event, EventStatus};
use crate::models::reminder::ReminderEntry;
use crate::services::delivery::{Delivery, DeliveryTarget};
use crate::services::lifecycle::EventLifecycleManager;
use crate::utils::errors::Result;

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub delivered: usize,
    pub failed: usize,
    /// Events (not individual entries) whose stale entries were removed
    pub pruned: usize,
    pub activated: usize,
    pub completed: usize,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    db: DatabaseService,
    delivery: Arc<dyn Delivery>,
    lifecycle: EventLifecycleManager,
}

impl ReminderScheduler {
    pub fn new(
        db: DatabaseService,
        delivery: Arc<dyn Delivery>,
        lifecycle: EventLifecycleManager,
    ) -> Self {
        Self {
            db,
            delivery,
            lifecycle,
        }
    }

    /// One sweep pass at `now`. Status advancement runs first so an
    /// entry for an event that just ended is pruned, not announced.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let advance = self.lifecycle.advance_due(now).await?;
        let mut report = SweepReport {
            activated: advance.activated,
            completed: advance.completed,
            ..SweepReport::default()
        };

        let due = self.db.reminders.due_entries(now).await?;
        // Pruning removes every entry for the event at once, so later due
        // entries for the same event are already gone.
        let mut pruned_events = HashSet::new();
        for entry in due {
            if pruned_events.contains(&entry.event_id) {
                continue;
            }
            match self.db.events.find_by_id(entry.event_id).await? {
                Some(event) if !event.status.is_terminal() => {
                    if self.deliver_entry(&entry, &event).await {
                        report.delivered += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                _ => {
                    // Event deleted, cancelled, or completed under us
                    self.db.reminders.delete_for_event(entry.event_id).await?;
                    pruned_events.insert(entry.event_id);
                    report.pruned += 1;
                    debug!(
                        entry_id = entry.id,
                        event_id = entry.event_id,
                        "Pruned reminder entries for gone event"
                    );
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                delivered = report.delivered,
                failed = report.failed,
                pruned = report.pruned,
                activated = report.activated,
                completed = report.completed,
                "Reminder sweep finished"
            );
        }
        Ok(report)
    }

    /// Deliver one entry to the event channel and every signed-up user.
    /// Returns true only when every target accepted it, and the delivered
    /// flag is flipped only in that case.
    async fn deliver_entry(&self, entry: &ReminderEntry, event: &Event) -> bool {
        let content = reminder_text(event, entry.offset_minutes);

        let mut all_ok = true;
        if let Some(channel_id) = event.channel_id {
            if let Err(e) = self
                .delivery
                .notify(DeliveryTarget::Channel(channel_id), &content)
                .await
            {
                warn!(entry_id = entry.id, channel_id = channel_id, error = %e, "Channel reminder failed");
                all_ok = false;
            }
        }

        let signups = match self.db.events.get_signups(event.id).await {
            Ok(signups) => signups,
            Err(e) => {
                error!(event_id = event.id, error = %e, "Failed to load signups for reminder");
                return false;
            }
        };
        for signup in &signups {
            if let Err(e) = self
                .delivery
                .notify(DeliveryTarget::User(signup.user_id), &content)
                .await
            {
                warn!(entry_id = entry.id, user_id = signup.user_id, error = %e, "User reminder failed");
                all_ok = false;
            }
        }

        crate::utils::logging::log_reminder_dispatch(event.id, entry.offset_minutes, all_ok);

        if all_ok {
            match self.db.reminders.mark_delivered(entry.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(entry_id = entry.id, "Entry already marked delivered");
                }
                Err(e) => {
                    error!(entry_id = entry.id, error = %e, "Failed to mark reminder delivered");
                    return false;
                }
            }
        }
        all_ok
    }

    /// Spawn the periodic sweep. An in-flight pass is finished before
    /// shutdown is honored; ticks that arrive mid-pass are skipped.
    pub fn spawn(
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
                        if let Err(e) = self.run_sweep(Utc::now()).await {
                            error!(error = %e, "Reminder sweep failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("Reminder sweep shutting down");
                        break;
                    }
                }
            }
        })
    }
}

fn reminder_text(event: &Event, offset_minutes: i64) -> String {
    match event.status {
        EventStatus::Active => format!("'{}' is underway!", event.title),
        _ if offset_minutes <= 0 => format!("'{}' is starting now!", event.title),
        _ => format!("'{}' starts in {} minutes.", event.title, offset_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventStatus;
    use chrono::Duration as ChronoDuration;

    fn sample_event(status: EventStatus) -> Event {
        let now = Utc::now();
        Event {
            id: 1,
            guild_id: 10,
            title: "Saturday Brawl".to_string(),
            description: None,
            starts_at: now + ChronoDuration::minutes(30),
            duration_minutes: 120,
            status,
            team_capacity: 6,
            category_id: None,
            channel_id: None,
            created_by: 7,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reminder_text_counts_down_to_start() {
        let event = sample_event(EventStatus::Scheduled);
        assert_eq!(reminder_text(&event, 30), "'Saturday Brawl' starts in 30 minutes.");
        assert_eq!(reminder_text(&event, 0), "'Saturday Brawl' is starting now!");
    }

    #[test]
    fn reminder_text_for_active_event() {
        let event = sample_event(EventStatus::Active);
        assert_eq!(reminder_text(&event, 10), "'Saturday Brawl' is underway!");
    }
}
