//! Role capability policy.
//!
//! Three roles, six dashboard modules, four actions. The table is encoded
//! as an exhaustive match so adding a role or module forces every
//! combination to be revisited at compile time; anything that falls through
//! is denied.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teknisi,
    Viewer,
}

/// Dashboard modules, named as the UI routes name them (laporan = crash
/// reports, kereta = trains, teknisi = technicians).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Dashboard,
    Laporan,
    Kereta,
    Maintenance,
    Teknisi,
    Settings,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

/// The capability table. Total over every (role, module, action)
/// combination; the final arm denies whatever is not explicitly granted.
pub fn is_allowed(role: Role, module: Module, action: Action) -> bool {
    match (role, module, action) {
        (Role::Admin, _, _) => true,
        // Every role may view every module.
        (_, _, Action::View) => true,
        (Role::Teknisi, Module::Laporan, Action::Create | Action::Edit) => true,
        (Role::Teknisi, Module::Maintenance, Action::Edit) => true,
        (Role::Teknisi, Module::Settings, Action::Edit) => true,
        _ => false,
    }
}

pub fn can_view(role: Role, module: Module) -> bool {
    is_allowed(role, module, Action::View)
}

pub fn can_create(role: Role, module: Module) -> bool {
    is_allowed(role, module, Action::Create)
}

pub fn can_edit(role: Role, module: Module) -> bool {
    is_allowed(role, module, Action::Edit)
}

pub fn can_delete(role: Role, module: Module) -> bool {
    is_allowed(role, module, Action::Delete)
}

/// String-keyed check for callers holding raw values (e.g. stored profile
/// rows). Unknown roles or modules deny.
pub fn check(role: &str, module: &str, action: Action) -> bool {
    match (Role::from_str(role), Module::from_str(module)) {
        (Ok(role), Ok(module)) => is_allowed(role, module, action),
        _ => false,
    }
}

/// Per-module capability summary for one role, consumed by the UI to gate
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModulePermissions {
    pub module: Module,
    pub view: bool,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
}

pub fn permission_matrix(role: Role) -> Vec<ModulePermissions> {
    Module::iter()
        .map(|module| ModulePermissions {
            module,
            view: can_view(role, module),
            create: can_create(role, module),
            edit: can_edit(role, module),
            delete: can_delete(role, module),
        })
        .collect()
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Administrator",
        Role::Teknisi => "Teknisi",
        Role::Viewer => "Viewer",
    }
}
