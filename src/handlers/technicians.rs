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
    entities::technician,
    errors::ServiceError,
    services::technicians::{
        CreateTechnician, TechnicianDetail, TechnicianFilters, TechnicianStats,
        TechnicianWithStats, UpdateTechnician,
    },
    ApiResponse, AppState,
};

/// Build the technicians Router scoped under `/api/v1/technicians`.
pub fn technician_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_technicians).post(create_technician))
        .route("/expertise", get(get_expertise))
        .route("/stats", get(get_technician_stats))
        .route(
            "/:id",
            get(get_technician)
                .put(update_technician)
                .delete(delete_technician),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians",
    params(TechnicianFilters),
    responses(
        (status = 200, description = "Technicians with workload stats", body = ApiResponse<Vec<TechnicianWithStats>>)
    ),
    tag = "Technicians"
)]
pub async fn list_technicians(
    State(state): State<AppState>,
    Query(filters): Query<TechnicianFilters>,
) -> Result<Json<ApiResponse<Vec<TechnicianWithStats>>>, ServiceError> {
    let items = state.services.technicians.list(&filters).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians/{id}",
    responses(
        (status = 200, description = "Technician detail with assigned reports", body = ApiResponse<TechnicianDetail>),
        (status = 404, description = "Technician not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Technicians"
)]
pub async fn get_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TechnicianDetail>>, ServiceError> {
    let detail = state.services.technicians.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/technicians",
    request_body = CreateTechnician,
    responses(
        (status = 200, description = "Technician created", body = ApiResponse<technician::Model>),
        (status = 403, description = "Role lacks teknisi:create", body = crate::errors::ErrorResponse)
    ),
    tag = "Technicians"
)]
pub async fn create_technician(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateTechnician>,
) -> Result<Json<ApiResponse<technician::Model>>, ServiceError> {
    auth::require(&headers, Module::Teknisi, Action::Create)?;
    let created = state.services.technicians.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/technicians/{id}",
    request_body = UpdateTechnician,
    responses(
        (status = 200, description = "Technician updated", body = ApiResponse<technician::Model>),
        (status = 403, description = "Role lacks teknisi:edit", body = crate::errors::ErrorResponse)
    ),
    tag = "Technicians"
)]
pub async fn update_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateTechnician>,
) -> Result<Json<ApiResponse<technician::Model>>, ServiceError> {
    auth::require(&headers, Module::Teknisi, Action::Edit)?;
    let updated = state.services.technicians.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/technicians/{id}",
    responses(
        (status = 200, description = "Technician deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Role lacks teknisi:delete", body = crate::errors::ErrorResponse)
    ),
    tag = "Technicians"
)]
pub async fn delete_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    auth::require(&headers, Module::Teknisi, Action::Delete)?;
    state.services.technicians.delete(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians/expertise",
    responses(
        (status = 200, description = "Distinct expertise tags", body = ApiResponse<Vec<String>>)
    ),
    tag = "Technicians"
)]
pub async fn get_expertise(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, ServiceError> {
    let tags = state.services.technicians.expertise().await?;
    Ok(Json(ApiResponse::success(tags)))
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians/stats",
    responses(
        (status = 200, description = "Organization-wide technician totals", body = ApiResponse<TechnicianStats>)
    ),
    tag = "Technicians"
)]
pub async fn get_technician_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TechnicianStats>>, ServiceError> {
    let stats = state.services.technicians.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}
