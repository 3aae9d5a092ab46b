//! Services module
//!
//! This module contains business logic services

pub mod crew;
pub mod delivery;
pub mod lifecycle;
pub mod panel;
pub mod poll;
pub mod restore;
pub mod scheduler;

// Re-export commonly used services
pub use crew::CrewManager;
pub use delivery::{Delivery, DeliveryTarget, LogOnlyDelivery, LogOnlyRoleGateway, RoleGateway, RoleScope};
pub use lifecycle::{AdvanceReport, EventLifecycleManager, MapVoteOutcome, ScheduleOutcome};
pub use panel::{EventRosterSnapshot, LogOnlyPanelHost, PanelHost, PollTallySnapshot, RosterLine};
pub use poll::{PollEngine, PollRefresh};
pub use restore::{RestorationCoordinator, RestoreReport};
pub use scheduler::{ReminderScheduler, SweepReport};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and wiring all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub lifecycle: EventLifecycleManager,
    /// Present only when the polls feature is enabled
    pub polls: Option<PollEngine>,
    pub crews: CrewManager,
    pub scheduler: ReminderScheduler,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        db: DatabaseService,
        settings: &Settings,
        delivery: Arc<dyn Delivery>,
        roles: Arc<dyn RoleGateway>,
        panels: Arc<dyn PanelHost>,
    ) -> Self {
        let polls = if settings.features.polls {
            Some(PollEngine::new(db.clone(), delivery.clone(), panels.clone()))
        } else {
            None
        };
        let lifecycle = EventLifecycleManager::new(
            db.clone(),
            delivery.clone(),
            roles,
            panels,
            polls.clone(),
        );
        let crews = CrewManager::new(db.clone(), delivery.clone());
        let scheduler = ReminderScheduler::new(db.clone(), delivery, lifecycle.clone());

        Self {
            lifecycle,
            polls,
            crews,
            scheduler,
        }
    }

    /// Build the startup restoration pass over the wired services
    pub fn restoration(&self, db: DatabaseService) -> RestorationCoordinator {
        RestorationCoordinator::new(db, self.lifecycle.clone(), self.polls.clone())
    }
}
