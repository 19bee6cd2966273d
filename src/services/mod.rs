pub mod analytics;
pub mod crash_reports;
pub mod dashboard;
pub mod maintenance;
pub mod technicians;
pub mod trains;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Related-train fields embedded in denormalized listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainSummary {
    pub train_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub train_type: String,
}

/// Related-technician fields embedded in denormalized listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechnicianSummary {
    pub name: String,
    pub expertise: String,
    pub contact: String,
}
