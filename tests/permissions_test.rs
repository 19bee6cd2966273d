//! The role capability matrix, swept combination by combination.

use test_case::test_case;

use traincare_api::auth::{
    can_create, can_delete, can_edit, can_view, is_allowed, permission_matrix, role_label, Action,
    Module, Role,
};
use traincare_api::auth::permissions::check;

use strum::IntoEnumIterator;

#[test_case(Module::Dashboard)]
#[test_case(Module::Laporan)]
#[test_case(Module::Kereta)]
#[test_case(Module::Maintenance)]
#[test_case(Module::Teknisi)]
#[test_case(Module::Settings)]
fn admin_has_full_control(module: Module) {
    assert!(can_view(Role::Admin, module));
    assert!(can_create(Role::Admin, module));
    assert!(can_edit(Role::Admin, module));
    assert!(can_delete(Role::Admin, module));
}

#[test_case(Module::Dashboard, false, false)]
#[test_case(Module::Laporan, true, true)]
#[test_case(Module::Kereta, false, false)]
#[test_case(Module::Maintenance, false, true)]
#[test_case(Module::Teknisi, false, false)]
#[test_case(Module::Settings, false, true)]
fn teknisi_capabilities_match_the_table(module: Module, create: bool, edit: bool) {
    assert!(can_view(Role::Teknisi, module));
    assert_eq!(can_create(Role::Teknisi, module), create);
    assert_eq!(can_edit(Role::Teknisi, module), edit);
    assert!(!can_delete(Role::Teknisi, module));
}

#[test_case(Module::Dashboard)]
#[test_case(Module::Laporan)]
#[test_case(Module::Kereta)]
#[test_case(Module::Maintenance)]
#[test_case(Module::Teknisi)]
#[test_case(Module::Settings)]
fn viewer_is_read_only(module: Module) {
    assert!(can_view(Role::Viewer, module));
    assert!(!can_create(Role::Viewer, module));
    assert!(!can_edit(Role::Viewer, module));
    assert!(!can_delete(Role::Viewer, module));
}

#[test]
fn every_combination_is_defined() {
    // Totality: no combination panics, and the accessors agree with the
    // underlying table.
    for role in Role::iter() {
        for module in Module::iter() {
            for action in Action::iter() {
                let allowed = is_allowed(role, module, action);
                let accessor = match action {
                    Action::View => can_view(role, module),
                    Action::Create => can_create(role, module),
                    Action::Edit => can_edit(role, module),
                    Action::Delete => can_delete(role, module),
                };
                assert_eq!(allowed, accessor);
            }
        }
    }
}

#[test]
fn unknown_strings_deny_instead_of_failing_open() {
    assert!(!check("admin", "payroll", Action::View));
    assert!(!check("admin", "payroll", Action::Delete));
    assert!(!check("root", "laporan", Action::View));
    assert!(!check("", "", Action::View));
    // Case matters: stored roles are lowercase.
    assert!(check("admin", "laporan", Action::Delete));
    assert!(!check("Admin ", "laporan", Action::Delete));
}

#[test]
fn matrix_summary_covers_all_modules() {
    let matrix = permission_matrix(Role::Teknisi);
    assert_eq!(matrix.len(), 6);

    let laporan = matrix
        .iter()
        .find(|m| m.module == Module::Laporan)
        .unwrap();
    assert!(laporan.view && laporan.create && laporan.edit && !laporan.delete);

    let kereta = matrix.iter().find(|m| m.module == Module::Kereta).unwrap();
    assert!(kereta.view && !kereta.create && !kereta.edit && !kereta.delete);
}

#[test]
fn role_labels_are_display_names() {
    assert_eq!(role_label(Role::Admin), "Administrator");
    assert_eq!(role_label(Role::Teknisi), "Teknisi");
    assert_eq!(role_label(Role::Viewer), "Viewer");
}
