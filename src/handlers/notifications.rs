use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{errors::ServiceError, notifications::Notification, ApiResponse, AppState};

/// Build the notifications Router scoped under `/api/v1/notifications`.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_feed))
        .route("/:user_id/read-all", post(mark_all_read))
        .route("/:user_id/:id/read", post(mark_read))
        .route("/:user_id/:id", delete(delete_notification))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/{user_id}",
    responses(
        (status = 200, description = "A user's notification feed, newest first", body = ApiResponse<NotificationFeed>)
    ),
    tag = "Notifications"
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationFeed>>, ServiceError> {
    let notifications = state.notifications.list(user_id);
    let unread_count = state.notifications.unread_count(user_id);
    Ok(Json(ApiResponse::success(NotificationFeed {
        notifications,
        unread_count,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{user_id}/{id}/read",
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.notifications.mark_read(user_id, id)?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "read": id }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{user_id}/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.notifications.mark_all_read(user_id);
    Ok(Json(ApiResponse::success(serde_json::json!({ "read": "all" }))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{user_id}/{id}",
    responses(
        (status = 200, description = "Notification deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.notifications.delete(user_id, id)?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
