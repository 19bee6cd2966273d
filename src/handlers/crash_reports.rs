use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::{
    auth::{self, Action, Module},
    entities::crash_report,
    errors::ServiceError,
    services::crash_reports::{
        CrashReportFilters, CrashReportWithDetails, CreateCrashReport, UpdateCrashReport,
    },
    ApiResponse, AppState,
};

/// Build the crash reports Router scoped under `/api/v1/reports`.
pub fn crash_report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route(
            "/:id",
            get(get_report).put(update_report).delete(delete_report),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(CrashReportFilters),
    responses(
        (status = 200, description = "Filtered crash reports with related summaries", body = ApiResponse<Vec<CrashReportWithDetails>>)
    ),
    tag = "Crash Reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    Query(filters): Query<CrashReportFilters>,
) -> Result<Json<ApiResponse<Vec<CrashReportWithDetails>>>, ServiceError> {
    let items = state.services.crash_reports.list(&filters).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    responses(
        (status = 200, description = "Crash report detail", body = ApiResponse<CrashReportWithDetails>),
        (status = 404, description = "Report not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Crash Reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CrashReportWithDetails>>, ServiceError> {
    let report = state.services.crash_reports.get(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateCrashReport,
    responses(
        (status = 200, description = "Crash report created", body = ApiResponse<crash_report::Model>),
        (status = 403, description = "Role lacks laporan:create", body = crate::errors::ErrorResponse)
    ),
    tag = "Crash Reports"
)]
pub async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateCrashReport>,
) -> Result<Json<ApiResponse<crash_report::Model>>, ServiceError> {
    auth::require(&headers, Module::Laporan, Action::Create)?;
    let created = state.services.crash_reports.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}",
    request_body = UpdateCrashReport,
    responses(
        (status = 200, description = "Crash report updated", body = ApiResponse<crash_report::Model>),
        (status = 403, description = "Role lacks laporan:edit", body = crate::errors::ErrorResponse)
    ),
    tag = "Crash Reports"
)]
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateCrashReport>,
) -> Result<Json<ApiResponse<crash_report::Model>>, ServiceError> {
    auth::require(&headers, Module::Laporan, Action::Edit)?;
    let updated = state.services.crash_reports.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    responses(
        (status = 200, description = "Crash report deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Role lacks laporan:delete", body = crate::errors::ErrorResponse)
    ),
    tag = "Crash Reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    auth::require(&headers, Module::Laporan, Action::Delete)?;
    state.services.crash_reports.delete(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
