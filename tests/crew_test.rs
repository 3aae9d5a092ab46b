//! Crew management integration tests

mod helpers;

use assert_matches::assert_matches;

use crewcall::config::Settings;
use crewcall::models::crew::{CrewRole, InviteResponse, InviteStatus};
use crewcall::services::DeliveryTarget;
use crewcall::utils::errors::CrewCallError;
use helpers::{TestContext, GUILD, ORGANIZER};

const INVITEE: i64 = 2001;

#[tokio::test]
async fn create_makes_the_creator_the_owner() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    assert_eq!(crew.owner_id, ORGANIZER);
    assert_eq!(crew.wins, 0);
    assert_eq!(crew.losses, 0);

    let members = ctx.services.crews.members(crew.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].member_role, CrewRole::Owner);

    let stats = ctx.db.guilds.get_stats(GUILD, ORGANIZER).await.unwrap().unwrap();
    assert_eq!(stats.crews_joined, 1);
}

#[tokio::test]
async fn crews_can_be_switched_off_per_guild() {
    let ctx = TestContext::new().await;
    ctx.db
        .guilds
        .update_settings(
            GUILD,
            crewcall::models::guild::UpdateGuildSettingsRequest {
                team_capacity: None,
                reminder_offsets: None,
                map_pool: None,
                polls_enabled: None,
                crews_enabled: Some(false),
                event_category_id: None,
                announce_channel_id: None,
            },
        )
        .await
        .unwrap();

    let result = ctx.services.crews.create(GUILD, "Steel Wolves", ORGANIZER).await;
    assert_matches!(result, Err(CrewCallError::FeatureDisabled("crews")));
}

#[tokio::test]
async fn invite_accept_adds_a_member() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    let invite = ctx
        .services
        .crews
        .invite(crew.id, ORGANIZER, INVITEE)
        .await
        .unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(ctx.delivery.sent_to(DeliveryTarget::User(INVITEE)).len(), 1);

    let member = ctx
        .services
        .crews
        .respond(crew.id, INVITEE, InviteResponse::Accept)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.member_role, CrewRole::Member);

    let members = ctx.services.crews.members(crew.id).await.unwrap();
    assert_eq!(members.len(), 2);
}

#[tokio::test]
async fn declined_invite_adds_nobody() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();
    ctx.services.crews.invite(crew.id, ORGANIZER, INVITEE).await.unwrap();

    let member = ctx
        .services
        .crews
        .respond(crew.id, INVITEE, InviteResponse::Decline)
        .await
        .unwrap();
    assert!(member.is_none());

    let members = ctx.services.crews.members(crew.id).await.unwrap();
    assert_eq!(members.len(), 1);

    // Declining spends the invite; a fresh one is needed to respond again.
    let again = ctx
        .services
        .crews
        .respond(crew.id, INVITEE, InviteResponse::Accept)
        .await;
    assert_matches!(again, Err(CrewCallError::InvalidInput(_)));
}

#[tokio::test]
async fn inviting_an_existing_member_is_flagged() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();
    ctx.services.crews.invite(crew.id, ORGANIZER, INVITEE).await.unwrap();
    ctx.services
        .crews
        .respond(crew.id, INVITEE, InviteResponse::Accept)
        .await
        .unwrap();

    let again = ctx.services.crews.invite(crew.id, ORGANIZER, INVITEE).await;
    assert_matches!(again, Err(CrewCallError::AlreadyMember { .. }));
}

#[tokio::test]
async fn repeat_invite_reuses_the_pending_one() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    let first = ctx.services.crews.invite(crew.id, ORGANIZER, INVITEE).await.unwrap();
    let second = ctx.services.crews.invite(crew.id, ORGANIZER, INVITEE).await.unwrap();
    assert_eq!(first.id, second.id);
    // No second notification for the reused invite.
    assert_eq!(ctx.delivery.sent_to(DeliveryTarget::User(INVITEE)).len(), 1);
}

#[tokio::test]
async fn only_managers_may_invite() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();
    ctx.db
        .crews
        .add_member(crew.id, INVITEE, CrewRole::Member)
        .await
        .unwrap();

    let denied = ctx.services.crews.invite(crew.id, INVITEE, 3001).await;
    assert_matches!(denied, Err(CrewCallError::PermissionDenied(_)));

    // A lead can.
    ctx.db.crews.add_member(crew.id, 3001, CrewRole::Lead).await.unwrap();
    ctx.services.crews.invite(crew.id, 3001, 4001).await.unwrap();
}

#[tokio::test]
async fn unreachable_invitee_falls_back_to_the_announce_channel() {
    let settings = Settings::default();
    let ctx = TestContext::with_settings(settings).await;
    ctx.db
        .guilds
        .update_settings(
            GUILD,
            crewcall::models::guild::UpdateGuildSettingsRequest {
                team_capacity: None,
                reminder_offsets: None,
                map_pool: None,
                polls_enabled: None,
                crews_enabled: None,
                event_category_id: None,
                announce_channel_id: Some(555),
            },
        )
        .await
        .unwrap();

    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    ctx.delivery.fail_target(DeliveryTarget::User(INVITEE));
    let invite = ctx
        .services
        .crews
        .invite(crew.id, ORGANIZER, INVITEE)
        .await
        .unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);

    // Nothing reached the user; the channel carried the notice instead.
    assert!(ctx.delivery.sent_to(DeliveryTarget::User(INVITEE)).is_empty());
    let channel = ctx.delivery.sent_to(DeliveryTarget::Channel(555));
    assert_eq!(channel.len(), 1);
    assert!(channel[0].contains("Steel Wolves"));
}

#[tokio::test]
async fn members_may_leave_but_not_evict() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();
    ctx.db.crews.add_member(crew.id, INVITEE, CrewRole::Member).await.unwrap();
    ctx.db.crews.add_member(crew.id, 3001, CrewRole::Member).await.unwrap();

    let denied = ctx.services.crews.remove(crew.id, INVITEE, 3001).await;
    assert_matches!(denied, Err(CrewCallError::PermissionDenied(_)));

    // Self-removal is always allowed.
    ctx.services.crews.remove(crew.id, INVITEE, INVITEE).await.unwrap();
    let members = ctx.services.crews.members(crew.id).await.unwrap();
    assert_eq!(members.len(), 2);
}

#[tokio::test]
async fn the_owner_cannot_be_removed() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    let result = ctx.services.crews.remove(crew.id, ORGANIZER, ORGANIZER).await;
    assert_matches!(result, Err(CrewCallError::InvalidInput(_)));
}

#[tokio::test]
async fn disband_deletes_the_crew_and_its_members() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();
    ctx.db.crews.add_member(crew.id, INVITEE, CrewRole::Member).await.unwrap();

    ctx.services.crews.disband(crew.id, ORGANIZER).await.unwrap();

    let gone = ctx.db.crews.find_by_id(crew.id).await.unwrap();
    assert!(gone.is_none());
    let crews = ctx.services.crews.user_crews(GUILD, INVITEE).await.unwrap();
    assert!(crews.is_empty());
}

#[tokio::test]
async fn stat_counters_survive_until_an_admin_reset() {
    let ctx = TestContext::new().await;
    ctx.services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    let stats = ctx.db.guilds.get_stats(GUILD, ORGANIZER).await.unwrap().unwrap();
    assert_eq!(stats.crews_joined, 1);

    ctx.db.guilds.reset_stats(GUILD, ORGANIZER).await.unwrap();
    let stats = ctx.db.guilds.get_stats(GUILD, ORGANIZER).await.unwrap().unwrap();
    assert_eq!(stats.crews_joined, 0);
    assert_eq!(stats.events_created, 0);
}

#[tokio::test]
async fn match_results_accumulate_on_the_crew() {
    let ctx = TestContext::new().await;
    let crew = ctx
        .services
        .crews
        .create(GUILD, "Steel Wolves", ORGANIZER)
        .await
        .unwrap();

    ctx.db.crews.record_result(crew.id, true).await.unwrap();
    ctx.db.crews.record_result(crew.id, true).await.unwrap();
    ctx.db.crews.record_result(crew.id, false).await.unwrap();

    let crew = ctx.db.crews.find_by_id(crew.id).await.unwrap().unwrap();
    assert_eq!(crew.wins, 2);
    assert_eq!(crew.losses, 1);
}
