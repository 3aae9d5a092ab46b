//! External delivery and role collaborator contracts
//!
//! The chat platform itself is out of scope; the engine talks to it
//! through these traits. Reminders, poll results and crew invites go
//! through [`Delivery`]; team role grant/revoke on signup and withdrawal
//! goes through [`RoleGateway`]. Log-only implementations back the binary
//! until a platform adapter is wired in.

use async_trait::async_trait;
use tracing::info;

use crate::models::event::Team;
use crate::utils::errors::DeliveryResult;

/// Where a notification should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryTarget {
    /// Direct message to a user
    User(i64),
    /// A guild channel
    Channel(i64),
}

#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver `content` to `target`. Failures are transient from the
    /// engine's point of view; callers decide whether to retry or fall
    /// back.
    async fn notify(&self, target: DeliveryTarget, content: &str) -> DeliveryResult<()>;
}

/// Scope of a platform role tied to an event's boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleScope {
    pub event_id: i64,
    /// None grants the event-wide participant role
    pub team: Option<Team>,
}

#[async_trait]
pub trait RoleGateway: Send + Sync {
    async fn grant_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()>;
    async fn revoke_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()>;
}

/// Delivery implementation that only logs, for running without a
/// platform adapter.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyDelivery;

#[async_trait]
impl Delivery for LogOnlyDelivery {
    async fn notify(&self, target: DeliveryTarget, content: &str) -> DeliveryResult<()> {
        info!(target = ?target, content = content, "Notification (log-only delivery)");
        Ok(())
    }
}

/// Role gateway implementation that only logs.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyRoleGateway;

#[async_trait]
impl RoleGateway for LogOnlyRoleGateway {
    async fn grant_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()> {
        info!(user_id = user_id, scope = ?scope, "Role granted (log-only gateway)");
        Ok(())
    }

    async fn revoke_role(&self, user_id: i64, scope: RoleScope) -> DeliveryResult<()> {
        info!(user_id = user_id, scope = ?scope, "Role revoked (log-only gateway)");
        Ok(())
    }
}
