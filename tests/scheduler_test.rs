//! Reminder sweep integration tests

mod helpers;

use chrono::{Duration, Utc};

use crewcall::models::event::{EventStatus, SignupRequest, SignupRole, Team};
use crewcall::services::DeliveryTarget;
use helpers::{event_request, TestContext};

async fn signup(ctx: &TestContext, event_id: i64, user_id: i64) {
    ctx.services
        .lifecycle
        .signup(SignupRequest {
            event_id,
            user_id,
            team: Team::Allies,
            member_role: SignupRole::Member,
            crew_id: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn sweep_delivers_only_entries_whose_time_has_come() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;

    // Of the 60/30/10 offsets only the 60-minute one is due right now.
    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);

    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    let delivered: Vec<i64> = entries
        .iter()
        .filter(|e| e.delivered)
        .map(|e| e.offset_minutes)
        .collect();
    assert_eq!(delivered, vec![60]);

    assert_eq!(ctx.delivery.sent_to(DeliveryTarget::User(1)).len(), 1);
}

#[tokio::test]
async fn delivered_entries_are_not_redelivered() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;

    ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    let sent_before = ctx.delivery.sent_count();

    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(ctx.delivery.sent_count(), sent_before);
}

#[tokio::test]
async fn failed_delivery_is_retried_on_the_next_sweep() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;

    ctx.delivery.fail_target(DeliveryTarget::User(1));
    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 1);

    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert!(entries.iter().all(|e| !e.delivered));

    // Target back up: the same entry goes out and is marked done.
    ctx.delivery.heal_target(DeliveryTarget::User(1));
    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(ctx.delivery.sent_to(DeliveryTarget::User(1)).len(), 1);
}

#[tokio::test]
async fn entries_for_terminal_events_are_pruned_not_delivered() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;
    ctx.services.lifecycle.cancel(event.id).await.unwrap();

    // Cancellation already cleared the entries; plant a straggler as if
    // a crash interrupted the cleanup.
    sqlx::query(
        "INSERT INTO reminder_entries (event_id, offset_minutes, fire_at, delivered, created_at)
         VALUES ($1, 60, $2, 0, $2)",
    )
    .bind(event.id)
    .bind(Utc::now() - Duration::minutes(1))
    .execute(&ctx.pool)
    .await
    .unwrap();

    let sent_before = ctx.delivery.sent_count();
    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.pruned, 1);
    assert_eq!(report.delivered, 0);
    assert_eq!(ctx.delivery.sent_count(), sent_before);

    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn several_stragglers_for_one_gone_event_prune_as_one() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    ctx.services.lifecycle.cancel(event.id).await.unwrap();

    // Three leftover entries, all overdue, all for the same cancelled
    // event. The first prune clears every row.
    for offset in [60, 30, 10] {
        sqlx::query(
            "INSERT INTO reminder_entries (event_id, offset_minutes, fire_at, delivered, created_at)
             VALUES ($1, $2, $3, 0, $3)",
        )
        .bind(event.id)
        .bind(offset)
        .bind(Utc::now() - Duration::minutes(1))
        .execute(&ctx.pool)
        .await
        .unwrap();
    }

    let report = ctx.services.scheduler.run_sweep(Utc::now()).await.unwrap();
    assert_eq!(report.pruned, 1);

    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn sweep_advances_event_status_before_delivering() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;

    let report = ctx
        .services
        .scheduler
        .run_sweep(event.starts_at + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(report.activated, 1);

    let event = ctx.db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Active);

    // All three entries were due by start; messages reflect the live event.
    let messages = ctx.delivery.sent_to(DeliveryTarget::User(1));
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.contains("underway")));
}

#[tokio::test]
async fn sweep_past_the_event_window_completes_and_goes_quiet() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(60))
        .await
        .unwrap()
        .event;
    signup(&ctx, event.id, 1).await;

    let report = ctx
        .services
        .scheduler
        .run_sweep(event.ends_at() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.delivered, 0);

    let event = ctx.db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Completed);
    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert!(entries.is_empty());
}
