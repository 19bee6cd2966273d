//! Fixed vocabularies shared by entities, aggregation, and the export
//! encoders. Lifecycle columns are stored as plain strings (values written
//! by the dashboard forms); these enums give the aggregation layer a total
//! view of the known values while unknown strings fall through to the
//! documented fallbacks.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Crash-report damage severity, ascending by urgency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Crash-report lifecycle tag. Any status may move to any other; the forms
/// do not enforce a transition graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum CrashStatus {
    Open,
    #[strum(serialize = "On Progress")]
    #[serde(rename = "On Progress")]
    OnProgress,
    Finished,
}

/// Maintenance urgency; distinct vocabulary from crash-report severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Urgent,
}

/// Maintenance lifecycle tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum MaintenanceStatus {
    Pending,
    #[strum(serialize = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

/// Inspection risk level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Derived train condition label: `Perbaikan` when the train carries any
/// open crash report, `Maintenance` while under active service, `Layak`
/// otherwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum TrainCondition {
    Layak,
    Perbaikan,
    Maintenance,
}
