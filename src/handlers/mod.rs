pub mod analytics;
pub mod crash_reports;
pub mod dashboard;
pub mod exports;
pub mod maintenance;
pub mod notifications;
pub mod technicians;
pub mod trains;
pub mod users;

use std::sync::Arc;

use crate::{db::DbPool, events::EventSender};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer encapsulating the business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub analytics: Arc<crate::services::analytics::AnalyticsService>,
    pub dashboard: Arc<crate::services::dashboard::DashboardService>,
    pub trains: Arc<crate::services::trains::TrainService>,
    pub crash_reports: Arc<crate::services::crash_reports::CrashReportService>,
    pub maintenance: Arc<crate::services::maintenance::MaintenanceService>,
    pub technicians: Arc<crate::services::technicians::TechnicianService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            analytics: Arc::new(crate::services::analytics::AnalyticsService::new(db.clone())),
            dashboard: Arc::new(crate::services::dashboard::DashboardService::new(db.clone())),
            trains: Arc::new(crate::services::trains::TrainService::new(
                db.clone(),
                event_sender.clone(),
            )),
            crash_reports: Arc::new(crate::services::crash_reports::CrashReportService::new(
                db.clone(),
                event_sender.clone(),
            )),
            maintenance: Arc::new(crate::services::maintenance::MaintenanceService::new(
                db.clone(),
                event_sender.clone(),
            )),
            technicians: Arc::new(crate::services::technicians::TechnicianService::new(
                db,
                event_sender,
            )),
        }
    }
}
