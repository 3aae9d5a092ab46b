//! Test helpers module
//!
//! This module provides utilities for testing the CrewCall engine:
//! an in-memory database, recording collaborator doubles, and wiring
//! shortcuts for the service layer.

// Each test binary uses a different slice of these helpers.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crewcall::config::Settings;
use crewcall::database::DatabaseService;
use crewcall::models::event::{CreateEventRequest, EventPreset};
use crewcall::services::{
    Delivery, DeliveryTarget, LogOnlyPanelHost, PanelHost, RoleGateway, RoleScope, ServiceFactory,
};
use crewcall::utils::errors::{DeliveryError, DeliveryResult};

/// Fresh in-memory database with migrations applied.
///
/// The pool is capped at one connection: every `:memory:` connection is
/// its own database, so a larger pool would hand tests an empty schema.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");
    pool
}

pub async fn test_db() -> DatabaseService {
    DatabaseService::new(test_pool().await)
}

/// Delivery double that records every notification and can be told to
/// fail specific targets.
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(DeliveryTarget, String)>>,
    failing: Mutex<HashSet<DeliveryTarget>>,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_target(&self, target: DeliveryTarget) {
        self.failing.lock().unwrap().insert(target);
    }

    pub fn heal_target(&self, target: DeliveryTarget) {
        self.failing.lock().unwrap().remove(&target);
    }

    pub fn sent_to(&self, target: DeliveryTarget) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn notify(&self, target: DeliveryTarget, content: &str) -> DeliveryResult<()> {
        if self.failing.lock().unwrap().contains(&target) {
            return Err(DeliveryError::Unreachable(format!("{target:?}")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((target, content.to_string()));
        Ok(())
    }
}

/// Role gateway double that records grants and revokes.
#[derive(Default)]
pub struct RecordingRoleGateway {
    pub granted: Mutex<Vec<(i64, RoleScope)>>,
    pub revoked: Mutex<Vec<(i64, RoleScope)>>,
}

impl RecordingRoleGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl RoleGateway for RecordingRoleGateway {
    async fn grant_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()> {
        self.granted.lock().unwrap().push((user_id, scope));
        Ok(())
    }

    async fn revoke_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()> {
        self.revoked.lock().unwrap().push((user_id, scope));
        Ok(())
    }
}

/// Full service wiring over a fresh in-memory database.
pub struct TestContext {
    pub pool: SqlitePool,
    pub db: DatabaseService,
    pub services: ServiceFactory,
    pub delivery: Arc<RecordingDelivery>,
    pub roles: Arc<RecordingRoleGateway>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let pool = test_pool().await;
        let db = DatabaseService::new(pool.clone());
        let delivery = RecordingDelivery::new();
        let roles = RecordingRoleGateway::new();
        let panels: Arc<dyn PanelHost> = Arc::new(LogOnlyPanelHost);
        let services = ServiceFactory::new(
            db.clone(),
            &settings,
            delivery.clone(),
            roles.clone(),
            panels,
        );
        Self {
            pool,
            db,
            services,
            delivery,
            roles,
        }
    }

    pub fn restoration(&self) -> crewcall::services::RestorationCoordinator {
        self.services.restoration(self.db.clone())
    }

    /// Rewind a poll's end time so sweeps and restoration see it as stale.
    pub async fn backdate_poll(&self, poll_id: i64, ends_at: DateTime<Utc>) {
        sqlx::query("UPDATE polls SET ends_at = $1 WHERE id = $2")
            .bind(ends_at)
            .bind(poll_id)
            .execute(&self.pool)
            .await
            .expect("failed to backdate poll");
    }

    /// Rewind an event's window for downtime scenarios.
    pub async fn backdate_event(&self, event_id: i64, starts_at: DateTime<Utc>) {
        sqlx::query("UPDATE events SET starts_at = $1 WHERE id = $2")
            .bind(starts_at)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .expect("failed to backdate event");
    }

    /// Corrupt an event's status column to exercise lenient restoration.
    pub async fn corrupt_event_status(&self, event_id: i64) {
        sqlx::query("UPDATE events SET status = 'armed' WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .expect("failed to corrupt event status");
    }
}

pub const GUILD: i64 = 4242;
pub const ORGANIZER: i64 = 1001;

/// Request for an event starting `minutes_ahead` from now.
pub fn event_request(minutes_ahead: i64) -> CreateEventRequest {
    event_request_at(Utc::now() + Duration::minutes(minutes_ahead))
}

pub fn event_request_at(starts_at: DateTime<Utc>) -> CreateEventRequest {
    CreateEventRequest {
        guild_id: GUILD,
        created_by: ORGANIZER,
        preset: EventPreset::SaturdayBrawl,
        title: None,
        description: None,
        starts_at,
        duration_minutes: 120,
    }
}
