pub mod permissions;

pub use permissions::{
    can_create, can_delete, can_edit, can_view, is_allowed, permission_matrix, role_label, Action,
    Module, ModulePermissions, Role,
};

use crate::errors::ServiceError;
use axum::http::HeaderMap;
use std::str::FromStr;

/// Header carrying the acting user's role. Session handling lives outside
/// this service, so callers state the role explicitly.
pub const ROLE_HEADER: &str = "x-user-role";

/// Resolve the acting role from request headers. A missing or unparseable
/// role fails closed.
pub fn role_from_headers(headers: &HeaderMap) -> Result<Role, ServiceError> {
    let raw = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::Forbidden("missing role header".to_string()))?;

    Role::from_str(raw).map_err(|_| ServiceError::Forbidden(format!("unknown role: {}", raw)))
}

/// Gate a mutating endpoint: resolve the role and check the capability
/// table, returning 403 on denial.
pub fn require(headers: &HeaderMap, module: Module, action: Action) -> Result<Role, ServiceError> {
    let role = role_from_headers(headers)?;
    if is_allowed(role, module, action) {
        Ok(role)
    } else {
        Err(ServiceError::Forbidden(format!(
            "role {} may not {} {}",
            role, action, module
        )))
    }
}
