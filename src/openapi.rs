//! OpenAPI document and Swagger UI mount.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TrainCare API",
        description = "Administrative backend for train maintenance operations"
    ),
    paths(
        // Dashboard
        crate::handlers::dashboard::get_stats,
        crate::handlers::dashboard::get_weekly,
        crate::handlers::dashboard::get_severity,
        crate::handlers::dashboard::get_recent,
        // Analytics
        crate::handlers::analytics::get_monthly_trend,
        crate::handlers::analytics::get_top_trains,
        crate::handlers::analytics::get_leaderboard,
        crate::handlers::analytics::get_calendar,
        crate::handlers::analytics::get_status_distribution,
        crate::handlers::analytics::get_comparison,
        // Exports
        crate::handlers::exports::export_excel,
        crate::handlers::exports::export_pdf,
        // Trains
        crate::handlers::trains::list_trains,
        crate::handlers::trains::get_train,
        crate::handlers::trains::create_train,
        crate::handlers::trains::update_train,
        crate::handlers::trains::delete_train,
        crate::handlers::trains::get_train_types,
        // Crash reports
        crate::handlers::crash_reports::list_reports,
        crate::handlers::crash_reports::get_report,
        crate::handlers::crash_reports::create_report,
        crate::handlers::crash_reports::update_report,
        crate::handlers::crash_reports::delete_report,
        // Maintenance
        crate::handlers::maintenance::list_maintenance,
        crate::handlers::maintenance::get_maintenance,
        crate::handlers::maintenance::create_maintenance,
        crate::handlers::maintenance::update_maintenance,
        crate::handlers::maintenance::delete_maintenance,
        // Technicians
        crate::handlers::technicians::list_technicians,
        crate::handlers::technicians::get_technician,
        crate::handlers::technicians::create_technician,
        crate::handlers::technicians::update_technician,
        crate::handlers::technicians::delete_technician,
        crate::handlers::technicians::get_expertise,
        crate::handlers::technicians::get_technician_stats,
        // Users and permissions
        crate::handlers::users::list_users,
        crate::handlers::users::get_role_permissions,
        // Notifications
        crate::handlers::notifications::get_feed,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,
        crate::handlers::notifications::delete_notification,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::domain::Severity,
        crate::domain::CrashStatus,
        crate::domain::Urgency,
        crate::domain::MaintenanceStatus,
        crate::domain::RiskLevel,
        crate::domain::TrainCondition,
        crate::auth::Role,
        crate::auth::Module,
        crate::auth::Action,
        crate::auth::ModulePermissions,
        crate::services::TrainSummary,
        crate::services::TechnicianSummary,
        crate::services::dashboard::DashboardStats,
        crate::services::dashboard::WeeklyBucket,
        crate::services::dashboard::SeveritySlice,
        crate::services::dashboard::RecentIssue,
        crate::services::analytics::MonthlyTrendPoint,
        crate::services::analytics::TopTrain,
        crate::services::analytics::LeaderboardEntry,
        crate::services::analytics::CalendarEvent,
        crate::services::analytics::StatusSlice,
        crate::services::analytics::ComparisonSnapshot,
        crate::services::analytics::ComparisonMetric,
        crate::services::analytics::TrendDirection,
        crate::handlers::analytics::ComparisonResponse,
        crate::handlers::exports::ExportRequest,
        crate::reports::ReportFilters,
        crate::services::trains::TrainWithStats,
        crate::services::trains::TrainDetail,
        crate::services::trains::TrainReport,
        crate::services::trains::CreateTrain,
        crate::services::trains::UpdateTrain,
        crate::services::crash_reports::CrashReportWithDetails,
        crate::services::crash_reports::CreateCrashReport,
        crate::services::crash_reports::UpdateCrashReport,
        crate::services::maintenance::MaintenanceWithDetails,
        crate::services::maintenance::CreateMaintenance,
        crate::services::maintenance::UpdateMaintenance,
        crate::services::technicians::TechnicianWithStats,
        crate::services::technicians::TechnicianDetail,
        crate::services::technicians::TechnicianReport,
        crate::services::technicians::TechnicianStatsBlock,
        crate::services::technicians::TechnicianStats,
        crate::services::technicians::CreateTechnician,
        crate::services::technicians::UpdateTechnician,
        crate::handlers::users::RolePermissions,
        crate::handlers::notifications::NotificationFeed,
        crate::notifications::Notification,
        crate::notifications::NotificationKind,
        crate::entities::train::Model,
        crate::entities::crash_report::Model,
        crate::entities::maintenance::Model,
        crate::entities::technician::Model,
        crate::entities::inspection::Model,
        crate::entities::user_profile::Model,
    )),
    tags(
        (name = "Dashboard", description = "Headline dashboard aggregates"),
        (name = "Analytics", description = "Trend, ranking, and comparison aggregates"),
        (name = "Exports", description = "Excel and PDF crash report export"),
        (name = "Trains", description = "Fleet registry"),
        (name = "Crash Reports", description = "Damage report lifecycle"),
        (name = "Maintenance", description = "Maintenance scheduling"),
        (name = "Technicians", description = "Technician registry and stats"),
        (name = "Users", description = "Account profiles and role capabilities"),
        (name = "Notifications", description = "Per-user notification feed")
    )
)]
pub struct ApiDoc;

/// Swagger UI serving the generated document at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
