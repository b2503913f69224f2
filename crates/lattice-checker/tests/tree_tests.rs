use super::*;
use crate::fixture::{codes, n, project};
use crate::source::{TypeParamSource, UnitSource};
use lattice_solver::Variance;

fn validated(units: Vec<UnitSource>) -> Project {
    let project = project(units);
    for unit in project.units() {
        unit.validate_tree(&project).expect("tree validation has no prerequisite");
    }
    project
}

#[test]
fn test_clean_unit_has_no_diagnostics() {
    let project = validated(vec![crate::fixture::zoo()]);
    assert!(project.diagnostics().is_empty());
}

#[test]
fn test_non_ascii_file_name_warns() {
    let project = validated(vec![UnitSource::new("zoo/tiergärten.lat", "zoo")]);
    let diagnostics = project.diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::NON_ASCII_FILE_NAME]);
    assert!(diagnostics[0].is_warning());
    assert_eq!(diagnostics[0].subject.as_deref(), Some("tiergärten.lat"));
}

#[test]
fn test_identical_files_in_one_package() {
    let project = validated(vec![
        UnitSource::new("a/dog.lat", "zoo"),
        UnitSource::new("b/dog.lat", "zoo"),
        UnitSource::new("c/dog.lat", "farm"),
    ]);
    // Each of the pair reports the other; the unit in `farm` is unaffected.
    assert_eq!(project.units()[0].error_count(), 1);
    assert_eq!(project.units()[1].error_count(), 1);
    assert!(project.units()[2].diagnostics().is_empty());
    assert_eq!(
        project.units()[0].diagnostics()[0].message,
        "identical source files: a/dog.lat and b/dog.lat"
    );
}

#[test]
fn test_file_names_differing_by_case() {
    let project = validated(vec![
        UnitSource::new("a/Dog.lat", "zoo"),
        UnitSource::new("b/dog.lat", "zoo"),
    ]);
    let diagnostics = project.diagnostics();
    assert_eq!(
        codes(&diagnostics),
        vec![
            diagnostic_codes::FILE_NAMES_DIFFER_BY_CASE,
            diagnostic_codes::FILE_NAMES_DIFFER_BY_CASE
        ]
    );
    assert!(diagnostics.iter().all(|d| d.is_warning()));
}

#[test]
fn test_duplicate_toplevel_declaration() {
    let project = validated(vec![
        UnitSource::new("zoo/a.lat", "zoo")
            .declare(DeclSource::class("Dog"))
            .declare(DeclSource::interface("Dog"))
            .declare(DeclSource::function("feed"))
            .declare(DeclSource::function("feed")),
    ]);
    let diagnostics = project.diagnostics();
    assert_eq!(
        codes(&diagnostics),
        vec![
            diagnostic_codes::DUPLICATE_DECLARATION,
            diagnostic_codes::DUPLICATE_DECLARATION
        ]
    );
    assert_eq!(diagnostics[0].subject.as_deref(), Some("Dog"));
    assert_eq!(diagnostics[1].subject.as_deref(), Some("feed"));
}

#[test]
fn test_member_overloads_are_allowed() {
    let project = validated(vec![
        UnitSource::new("zoo/a.lat", "zoo").declare(
            DeclSource::class("Keeper")
                .member(DeclSource::function("feed").parameter(n("Dog")))
                .member(DeclSource::function("feed").parameter(n("Cat")))
                .member(DeclSource::value("name", n("String")))
                .member(DeclSource::function("name")),
        ),
    ]);
    let diagnostics = project.diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::DUPLICATE_DECLARATION]);
    assert_eq!(diagnostics[0].subject.as_deref(), Some("Keeper.name"));
}

#[test]
fn test_duplicate_type_parameter() {
    let project = validated(vec![
        UnitSource::new("zoo/a.lat", "zoo").declare(
            DeclSource::class("Pair")
                .type_parameter(TypeParamSource::new("T", Variance::Invariant))
                .type_parameter(TypeParamSource::new("T", Variance::Covariant)),
        ),
    ]);
    let diagnostics = project.diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::DUPLICATE_TYPE_PARAMETER]);
    assert_eq!(
        diagnostics[0].message,
        "duplicate type parameter name: T of Pair"
    );
}
