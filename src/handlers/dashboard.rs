use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    services::dashboard::{DashboardStats, RecentIssue, SeveritySlice, WeeklyBucket},
    ApiResponse, AppState,
};

/// Build the dashboard Router scoped under `/api/v1/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/weekly", get(get_weekly))
        .route("/severity", get(get_severity))
        .route("/recent", get(get_recent))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of issues to return (default: 5)
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses(
        (status = 200, description = "Headline dashboard statistics", body = ApiResponse<DashboardStats>)
    ),
    tag = "Dashboard"
)]
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardStats>>, ServiceError> {
    let stats = state.services.dashboard.stats().await;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/weekly",
    responses(
        (status = 200, description = "Reports per week over the last 28 days", body = ApiResponse<Vec<WeeklyBucket>>)
    ),
    tag = "Dashboard"
)]
pub async fn get_weekly(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WeeklyBucket>>>, ServiceError> {
    let buckets = state.services.dashboard.weekly_reports().await;
    Ok(Json(ApiResponse::success(buckets)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/severity",
    responses(
        (status = 200, description = "Crash report counts per severity", body = ApiResponse<Vec<SeveritySlice>>)
    ),
    tag = "Dashboard"
)]
pub async fn get_severity(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SeveritySlice>>>, ServiceError> {
    let slices = state.services.dashboard.severity_distribution().await;
    Ok(Json(ApiResponse::success(slices)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Latest crash reports with train summaries", body = ApiResponse<Vec<RecentIssue>>)
    ),
    tag = "Dashboard"
)]
pub async fn get_recent(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<RecentIssue>>>, ServiceError> {
    let limit = params.limit.unwrap_or(5).min(50);
    let issues = state.services.dashboard.recent_issues(limit).await;
    Ok(Json(ApiResponse::success(issues)))
}
