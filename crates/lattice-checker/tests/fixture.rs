//! Units and helpers for the unit tests.

#![allow(dead_code)]

use crate::project::Project;
use crate::source::{DeclSource, TypeExpr, TypeParamSource, UnitSource};
use crate::unit::Phase;
use lattice_common::Diagnostic;
use lattice_solver::{DeclId, Variance};

pub(crate) const PACKAGE: &str = "zoo";

pub(crate) fn n(name: &str) -> TypeExpr {
    TypeExpr::name(name)
}

pub(crate) fn app(name: &str, args: &[&str]) -> TypeExpr {
    TypeExpr::applied(name, args.iter().map(|a| n(a)).collect())
}

/// `Animal`, the pets `Dog` and `Cat` enumerated by `Pet`, and a covariant
/// `Box` with a `get` member.
pub(crate) fn zoo() -> UnitSource {
    UnitSource::new("zoo/animals.lat", PACKAGE)
        .declare(DeclSource::interface("Animal").shared())
        .declare(
            DeclSource::class("Pet")
                .abstracted()
                .shared()
                .satisfies(n("Animal"))
                .cases(vec![n("Dog"), n("Cat")]),
        )
        .declare(DeclSource::class("Dog").shared().extends(n("Pet")))
        .declare(DeclSource::class("Cat").shared().extends(n("Pet")))
        .declare(
            DeclSource::class("Box")
                .shared()
                .type_parameter(TypeParamSource::new("T", Variance::Covariant))
                .member(DeclSource::function("get").typed(n("T"))),
        )
}

pub(crate) fn project(units: Vec<UnitSource>) -> Project {
    Project::new(&[], units).expect("project assembles")
}

/// Run every phase up to and including `last`, completing each phase for
/// every unit before starting the next.
pub(crate) fn run_through(project: &Project, last: Phase) {
    for phase in Phase::ALL.into_iter().filter(|p| *p <= last) {
        for unit in project.units() {
            unit.run_phase(phase, project)
                .expect("phases run in order");
        }
        if phase == Phase::RefinementValidation {
            project.break_flagged_supertypes();
        }
    }
}

pub(crate) fn lookup(project: &Project, name: &str) -> DeclId {
    project
        .graph()
        .lookup_toplevel(PACKAGE, name)
        .unwrap_or_else(|| panic!("{name} is declared"))
}

pub(crate) fn codes(diagnostics: &[Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}
