use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ServiceError,
    services::analytics::{
        comparison_metrics, CalendarEvent, ComparisonMetric, ComparisonSnapshot, LeaderboardEntry,
        MonthlyTrendPoint, StatusSlice, TopTrain,
    },
    ApiResponse, AppState,
};

/// Build the analytics Router scoped under `/api/v1/analytics`.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/trend", get(get_monthly_trend))
        .route("/top-trains", get(get_top_trains))
        .route("/leaderboard", get(get_leaderboard))
        .route("/calendar", get(get_calendar))
        .route("/status-distribution", get(get_status_distribution))
        .route("/comparison", get(get_comparison))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendQuery {
    /// Number of calendar months to cover (default: 6)
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LimitQuery {
    /// Maximum number of entries to return (default: 5)
    pub limit: Option<usize>,
}

/// Current and previous month snapshots plus per-metric deltas.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComparisonResponse {
    pub current: ComparisonSnapshot,
    pub previous: ComparisonSnapshot,
    pub metrics: Vec<ComparisonMetric>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/trend",
    params(TrendQuery),
    responses(
        (status = 200, description = "Monthly crash report trend", body = ApiResponse<Vec<MonthlyTrendPoint>>),
        (status = 400, description = "Invalid trend window", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_monthly_trend(
    State(state): State<AppState>,
    Query(params): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<MonthlyTrendPoint>>>, ServiceError> {
    let months = params.months.unwrap_or(6);
    if !(1..=24).contains(&months) {
        return Err(ServiceError::ValidationError(
            "Months must be between 1 and 24".to_string(),
        ));
    }

    let trend = state.services.analytics.monthly_trend(months).await;
    Ok(Json(ApiResponse::success(trend)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/top-trains",
    params(LimitQuery),
    responses(
        (status = 200, description = "Trains ranked by crash report count", body = ApiResponse<Vec<TopTrain>>)
    ),
    tag = "Analytics"
)]
pub async fn get_top_trains(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<TopTrain>>>, ServiceError> {
    let limit = params.limit.unwrap_or(5).min(50);
    let items = state.services.analytics.top_trains(limit).await;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/leaderboard",
    params(LimitQuery),
    responses(
        (status = 200, description = "Technicians ranked by performance score", body = ApiResponse<Vec<LeaderboardEntry>>)
    ),
    tag = "Analytics"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, ServiceError> {
    let limit = params.limit.unwrap_or(5).min(50);
    let entries = state.services.analytics.technician_leaderboard(limit).await;
    Ok(Json(ApiResponse::success(entries)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/calendar",
    responses(
        (status = 200, description = "All maintenance records as calendar events", body = ApiResponse<Vec<CalendarEvent>>)
    ),
    tag = "Analytics"
)]
pub async fn get_calendar(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CalendarEvent>>>, ServiceError> {
    let events = state.services.analytics.maintenance_calendar().await;
    Ok(Json(ApiResponse::success(events)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/status-distribution",
    responses(
        (status = 200, description = "Crash report counts per status", body = ApiResponse<Vec<StatusSlice>>)
    ),
    tag = "Analytics"
)]
pub async fn get_status_distribution(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StatusSlice>>>, ServiceError> {
    let slices = state.services.analytics.status_distribution().await;
    Ok(Json(ApiResponse::success(slices)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/comparison",
    responses(
        (status = 200, description = "Month-over-month comparison with per-metric polarity", body = ApiResponse<ComparisonResponse>)
    ),
    tag = "Analytics"
)]
pub async fn get_comparison(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ComparisonResponse>>, ServiceError> {
    let (current, previous) = state.services.analytics.month_over_month().await;
    let metrics = comparison_metrics(&current, &previous);
    Ok(Json(ApiResponse::success(ComparisonResponse {
        current,
        previous,
        metrics,
    })))
}
