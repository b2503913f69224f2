//! Tree validation: checks that need nothing but the unit's own source and
//! the file names of its neighbours.

use crate::project::Project;
use crate::source::{DeclSource, DeclSourceKind};
use crate::unit::{PhasedUnit, UnitState};
use lattice_common::{DiagnosticBag, diagnostic_codes};
use rustc_hash::FxHashMap;

pub(crate) fn validate_tree(project: &Project, unit: &PhasedUnit, state: &mut UnitState) {
    let source = unit.source();
    let file_name = source.file_name();
    if !file_name.is_ascii() {
        state
            .diagnostics
            .report(diagnostic_codes::NON_ASCII_FILE_NAME, file_name, &[file_name]);
    }

    for other in project.units() {
        if other.id() == unit.id() || other.package() != unit.package() {
            continue;
        }
        let other_name = other.source().file_name();
        if other_name == file_name {
            state.diagnostics.report(
                diagnostic_codes::IDENTICAL_SOURCE_FILES,
                file_name,
                &[unit.path(), other.path()],
            );
        } else if other_name.eq_ignore_ascii_case(file_name) {
            state.diagnostics.report(
                diagnostic_codes::FILE_NAMES_DIFFER_BY_CASE,
                file_name,
                &[unit.path(), other.path()],
            );
        }
    }

    check_names(&source.declarations, "", &mut state.diagnostics);
}

/// Duplicate names within one scope. Member functions sharing a name are
/// overloads, not duplicates.
fn check_names(declarations: &[DeclSource], prefix: &str, diagnostics: &mut DiagnosticBag) {
    let mut seen: FxHashMap<&str, DeclSourceKind> = FxHashMap::default();
    for declaration in declarations {
        let subject = format!("{prefix}{}", declaration.name);
        match seen.get(declaration.name.as_str()) {
            Some(DeclSourceKind::Function)
                if declaration.kind == DeclSourceKind::Function && !prefix.is_empty() => {}
            Some(_) => {
                diagnostics.report(
                    diagnostic_codes::DUPLICATE_DECLARATION,
                    subject.as_str(),
                    &[subject.as_str()],
                );
            }
            None => {
                seen.insert(&declaration.name, declaration.kind);
            }
        }

        let mut parameters: Vec<&str> = Vec::new();
        for parameter in &declaration.type_parameters {
            if parameters.contains(&parameter.name.as_str()) {
                diagnostics.report(
                    diagnostic_codes::DUPLICATE_TYPE_PARAMETER,
                    subject.as_str(),
                    &[parameter.name.as_str(), declaration.name.as_str()],
                );
            } else {
                parameters.push(&parameter.name);
            }
        }

        check_names(&declaration.members, &format!("{subject}."), diagnostics);
    }
}

#[cfg(test)]
#[path = "../tests/tree_tests.rs"]
mod tests;
