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
    entities::maintenance,
    errors::ServiceError,
    services::maintenance::{
        CreateMaintenance, MaintenanceFilters, MaintenanceWithDetails, UpdateMaintenance,
    },
    ApiResponse, AppState,
};

/// Build the maintenance Router scoped under `/api/v1/maintenance`.
pub fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_maintenance).post(create_maintenance))
        .route(
            "/:id",
            get(get_maintenance)
                .put(update_maintenance)
                .delete(delete_maintenance),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance",
    params(MaintenanceFilters),
    responses(
        (status = 200, description = "Filtered maintenance schedule", body = ApiResponse<Vec<MaintenanceWithDetails>>)
    ),
    tag = "Maintenance"
)]
pub async fn list_maintenance(
    State(state): State<AppState>,
    Query(filters): Query<MaintenanceFilters>,
) -> Result<Json<ApiResponse<Vec<MaintenanceWithDetails>>>, ServiceError> {
    let items = state.services.maintenance.list(&filters).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance/{id}",
    responses(
        (status = 200, description = "Maintenance record detail", body = ApiResponse<MaintenanceWithDetails>),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Maintenance"
)]
pub async fn get_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceWithDetails>>, ServiceError> {
    let record = state.services.maintenance.get(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

#[utoipa::path(
    post,
    path = "/api/v1/maintenance",
    request_body = CreateMaintenance,
    responses(
        (status = 200, description = "Maintenance scheduled", body = ApiResponse<maintenance::Model>),
        (status = 403, description = "Role lacks maintenance:create", body = crate::errors::ErrorResponse)
    ),
    tag = "Maintenance"
)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateMaintenance>,
) -> Result<Json<ApiResponse<maintenance::Model>>, ServiceError> {
    auth::require(&headers, Module::Maintenance, Action::Create)?;
    let created = state.services.maintenance.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/maintenance/{id}",
    request_body = UpdateMaintenance,
    responses(
        (status = 200, description = "Maintenance updated", body = ApiResponse<maintenance::Model>),
        (status = 403, description = "Role lacks maintenance:edit", body = crate::errors::ErrorResponse)
    ),
    tag = "Maintenance"
)]
pub async fn update_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateMaintenance>,
) -> Result<Json<ApiResponse<maintenance::Model>>, ServiceError> {
    auth::require(&headers, Module::Maintenance, Action::Edit)?;
    let updated = state.services.maintenance.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/maintenance/{id}",
    responses(
        (status = 200, description = "Maintenance deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Role lacks maintenance:delete", body = crate::errors::ErrorResponse)
    ),
    tag = "Maintenance"
)]
pub async fn delete_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    auth::require(&headers, Module::Maintenance, Action::Delete)?;
    state.services.maintenance.delete(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
