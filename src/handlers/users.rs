use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::{
    auth::{permission_matrix, role_label, ModulePermissions, Role},
    entities::user_profile,
    errors::ServiceError,
    ApiResponse, AppState,
};

/// Build the users Router scoped under `/api/v1/users`.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

/// Build the permissions Router scoped under `/api/v1/permissions`.
pub fn permission_routes() -> Router<AppState> {
    Router::new().route("/:role", get(get_role_permissions))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RolePermissions {
    pub role: Role,
    pub label: String,
    pub modules: Vec<ModulePermissions>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Dashboard account profiles", body = ApiResponse<Vec<user_profile::Model>>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<user_profile::Model>>>, ServiceError> {
    let users = user_profile::Entity::find()
        .order_by_asc(user_profile::Column::Email)
        .all(&*state.db)
        .await?;
    Ok(Json(ApiResponse::success(users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/permissions/{role}",
    responses(
        (status = 200, description = "Capability matrix for a role", body = ApiResponse<RolePermissions>),
        (status = 400, description = "Unknown role", body = crate::errors::ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn get_role_permissions(
    Path(role): Path<String>,
) -> Result<Json<ApiResponse<RolePermissions>>, ServiceError> {
    let role = Role::from_str(&role)
        .map_err(|_| ServiceError::InvalidInput(format!("unknown role: {}", role)))?;

    Ok(Json(ApiResponse::success(RolePermissions {
        role,
        label: role_label(role).to_string(),
        modules: permission_matrix(role),
    })))
}
