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
    errors::ServiceError,
    entities::train,
    services::trains::{CreateTrain, TrainDetail, TrainFilters, TrainWithStats, UpdateTrain},
    ApiResponse, AppState,
};

/// Build the trains Router scoped under `/api/v1/trains`.
pub fn train_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trains).post(create_train))
        .route("/types", get(get_train_types))
        .route(
            "/:id",
            get(get_train).put(update_train).delete(delete_train),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/trains",
    params(TrainFilters),
    responses(
        (status = 200, description = "Fleet listing with stats and condition labels", body = ApiResponse<Vec<TrainWithStats>>)
    ),
    tag = "Trains"
)]
pub async fn list_trains(
    State(state): State<AppState>,
    Query(filters): Query<TrainFilters>,
) -> Result<Json<ApiResponse<Vec<TrainWithStats>>>, ServiceError> {
    let items = state.services.trains.list(&filters).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/trains/{id}",
    responses(
        (status = 200, description = "Train detail with reports, maintenance, and inspections", body = ApiResponse<TrainDetail>),
        (status = 404, description = "Train not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Trains"
)]
pub async fn get_train(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TrainDetail>>, ServiceError> {
    let detail = state.services.trains.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/trains",
    request_body = CreateTrain,
    responses(
        (status = 200, description = "Train created", body = ApiResponse<train::Model>),
        (status = 403, description = "Role lacks kereta:create", body = crate::errors::ErrorResponse)
    ),
    tag = "Trains"
)]
pub async fn create_train(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateTrain>,
) -> Result<Json<ApiResponse<train::Model>>, ServiceError> {
    auth::require(&headers, Module::Kereta, Action::Create)?;
    let created = state.services.trains.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/trains/{id}",
    request_body = UpdateTrain,
    responses(
        (status = 200, description = "Train updated", body = ApiResponse<train::Model>),
        (status = 403, description = "Role lacks kereta:edit", body = crate::errors::ErrorResponse)
    ),
    tag = "Trains"
)]
pub async fn update_train(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateTrain>,
) -> Result<Json<ApiResponse<train::Model>>, ServiceError> {
    auth::require(&headers, Module::Kereta, Action::Edit)?;
    let updated = state.services.trains.update(id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/trains/{id}",
    responses(
        (status = 200, description = "Train deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Role lacks kereta:delete", body = crate::errors::ErrorResponse)
    ),
    tag = "Trains"
)]
pub async fn delete_train(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    auth::require(&headers, Module::Kereta, Action::Delete)?;
    state.services.trains.delete(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}

#[utoipa::path(
    get,
    path = "/api/v1/trains/types",
    responses(
        (status = 200, description = "Distinct train types", body = ApiResponse<Vec<String>>)
    ),
    tag = "Trains"
)]
pub async fn get_train_types(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, ServiceError> {
    let types = state.services.trains.types().await?;
    Ok(Json(ApiResponse::success(types)))
}
