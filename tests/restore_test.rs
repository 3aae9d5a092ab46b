//! Startup restoration integration tests

mod helpers;

use chrono::{Duration, Utc};

use crewcall::models::event::EventStatus;
use crewcall::models::poll::PollStatus;
use helpers::{event_request, TestContext};

#[tokio::test]
async fn live_records_survive_a_restart_unchanged() {
    let ctx = TestContext::new().await;
    let outcome = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap();

    let report = ctx.restoration().run().await.unwrap();

    // One scheduled event, one open map vote, nothing to fast-forward.
    assert_eq!(report.events_restored, 1);
    assert_eq!(report.events_fastforwarded, 0);
    assert_eq!(report.polls_restored, 1);
    assert_eq!(report.polls_closed, 0);
    assert_eq!(report.records_skipped, 0);

    let event = ctx
        .db
        .events
        .find_by_id(outcome.event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.status, EventStatus::Scheduled);
    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert_eq!(entries.len(), 3);
}

#[tokio::test]
async fn terminal_events_are_left_alone() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap()
        .event;
    ctx.services.lifecycle.cancel(event.id).await.unwrap();

    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.events_restored, 0);
    assert_eq!(report.events_fastforwarded, 0);
}

#[tokio::test]
async fn event_that_started_during_downtime_goes_active() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap()
        .event;

    // Started half an hour ago, still inside its two-hour window.
    ctx.backdate_event(event.id, Utc::now() - Duration::minutes(30)).await;

    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.events_fastforwarded, 1);

    let event = ctx.db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Active);
}

#[tokio::test]
async fn event_that_elapsed_during_downtime_is_completed() {
    let ctx = TestContext::new().await;
    let event = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap()
        .event;

    // Whole two-hour window is behind us.
    ctx.backdate_event(event.id, Utc::now() - Duration::minutes(300)).await;

    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.events_fastforwarded, 1);

    let event = ctx.db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Completed);
    let entries = ctx.db.reminders.list_for_event(event.id).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn stale_poll_is_closed_during_restoration_without_a_double_announce() {
    let ctx = TestContext::new().await;
    let outcome = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap();
    let poll = match outcome.map_vote {
        crewcall::services::MapVoteOutcome::Opened(poll) => poll,
        other => panic!("expected a map vote, got {other:?}"),
    };
    let options = ctx.db.polls.get_options(poll.id).await.unwrap();
    ctx.services
        .polls
        .as_ref()
        .unwrap()
        .vote(poll.id, 1, options[0].id)
        .await
        .unwrap();

    ctx.backdate_poll(poll.id, Utc::now() - Duration::minutes(5)).await;

    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.polls_closed, 1);

    let closed = ctx.db.polls.find_by_id(poll.id).await.unwrap().unwrap();
    assert_eq!(closed.status, PollStatus::Closed);
    assert_eq!(closed.winner_option_id, Some(options[0].id));

    // Running restoration again must not close or announce twice.
    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.polls_closed, 0);
    assert_eq!(report.polls_restored, 0);
}

#[tokio::test]
async fn a_corrupt_record_does_not_block_the_rest() {
    let ctx = TestContext::new().await;
    let broken = ctx
        .services
        .lifecycle
        .schedule(event_request(120))
        .await
        .unwrap()
        .event;
    let healthy = ctx
        .services
        .lifecycle
        .schedule(event_request(240))
        .await
        .unwrap()
        .event;

    ctx.corrupt_event_status(broken.id).await;

    let report = ctx.restoration().run().await.unwrap();
    assert_eq!(report.records_skipped, 1);
    assert!(report.events_restored >= 1);

    let event = ctx.db.events.find_by_id(healthy.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Scheduled);
}
