//! Type, flow and usage analysis over a unit's checks.

use crate::project::Project;
use crate::resolve::{TypeResolver, drain_engine_issues};
use crate::source::{Check, CheckSource};
use crate::unit::{PhasedUnit, UnitState};
use lattice_common::diagnostic_codes;
use lattice_solver::{DeclId, ProducedType, TypeEngine, TypePrinter};
use rustc_hash::FxHashSet;
use tracing::debug;

// =============================================================================
// Type analysis
// =============================================================================

pub(crate) fn analyse_types(project: &Project, unit: &PhasedUnit, state: &mut UnitState) {
    let graph = project.graph();
    let printer = TypePrinter::new(graph);
    let mut resolver = TypeResolver::new(project, unit).canonical();
    let mut engine = project.engine();
    let mut checked = 0usize;

    for (index, check) in unit.source().checks.iter().enumerate() {
        let subject = CheckSource::subject(index);
        let at = Some(subject.as_str());
        match &check.check {
            Check::Assignable { from, to } => {
                let from = resolver.resolve(from, None, at);
                let to = resolver.resolve(to, None, at);
                if from.contains_unknowns() || to.contains_unknowns() {
                    continue;
                }
                if !engine.is_subtype_of(&from, &to) {
                    let (a, b) = (printer.print(&from), printer.print(&to));
                    state.diagnostics.report(
                        diagnostic_codes::NOT_ASSIGNABLE,
                        subject.as_str(),
                        &[a.as_str(), b.as_str()],
                    );
                }
            }
            Check::Exactly { left, right } => {
                let left = resolver.resolve(left, None, at);
                let right = resolver.resolve(right, None, at);
                if left.contains_unknowns() || right.contains_unknowns() {
                    continue;
                }
                if !engine.is_exactly(&left, &right) {
                    let (a, b) = (printer.print(&left), printer.print(&right));
                    state.diagnostics.report(
                        diagnostic_codes::NOT_EXACTLY,
                        subject.as_str(),
                        &[a.as_str(), b.as_str()],
                    );
                }
            }
            Check::Member {
                receiver,
                name,
                arguments,
                spread,
            } => {
                let receiver = resolver.resolve(receiver, None, at);
                let arguments: Option<Vec<ProducedType>> = arguments.as_ref().map(|args| {
                    args.iter()
                        .map(|arg| resolver.resolve(arg, None, at))
                        .collect()
                });
                if receiver.contains_unknowns()
                    || arguments
                        .iter()
                        .flatten()
                        .any(ProducedType::contains_unknowns)
                {
                    continue;
                }
                match find_member(&mut engine, &receiver, name, arguments.as_deref(), *spread) {
                    Some(member) => {
                        state.references.insert(member);
                    }
                    None => {
                        let printed = printer.print(&receiver);
                        state.diagnostics.report(
                            diagnostic_codes::MEMBER_NOT_FOUND,
                            subject.as_str(),
                            &[name.as_str(), printed.as_str()],
                        );
                    }
                }
            }
            Check::Switch { .. } => continue,
        }
        checked += 1;
        drain_engine_issues(&mut engine, state, unit.path(), &subject);
    }
    resolver.finish(state);
    debug!(unit = unit.path(), checked, "types analysed");
}

/// The member `name` of `receiver`. Unions and intersections look in the
/// supertype that declares the member.
fn find_member(
    engine: &mut TypeEngine<'_>,
    receiver: &ProducedType,
    name: &str,
    signature: Option<&[ProducedType]>,
    spread: bool,
) -> Option<DeclId> {
    let receiver = engine.resolve_aliases(receiver);
    let scope = match receiver.declaration() {
        Some(declaration) if !engine.graph().is_type_parameter(declaration) => declaration,
        _ => engine
            .get_declaring_supertype(&receiver, name)?
            .declaration()?,
    };
    engine.get_member(scope, name, signature, spread)
}

// =============================================================================
// Flow analysis
// =============================================================================

pub(crate) fn analyse_flow(project: &Project, unit: &PhasedUnit, state: &mut UnitState) {
    let graph = project.graph();
    let printer = TypePrinter::new(graph);
    let mut resolver = TypeResolver::new(project, unit).canonical();
    let mut engine = project.engine();

    for (index, check) in unit.source().checks.iter().enumerate() {
        let Check::Switch { subject: switched, cases } = &check.check else {
            continue;
        };
        let subject = CheckSource::subject(index);
        let at = Some(subject.as_str());
        let switched = resolver.resolve(switched, None, at);
        let cases: Vec<ProducedType> = cases
            .iter()
            .map(|case| resolver.resolve(case, None, at))
            .collect();
        if switched.contains_unknowns() || cases.iter().any(ProducedType::contains_unknowns) {
            continue;
        }
        let covered = engine.union_of(cases);
        if !engine.covers(&covered, &switched) {
            let expanded = engine.union_of_cases(&switched);
            let missing = engine.minus(&expanded, &covered);
            let missing = if missing.is_nothing() { switched.clone() } else { missing };
            let (a, b) = (printer.print(&switched), printer.print(&missing));
            state.diagnostics.report(
                diagnostic_codes::CASES_DO_NOT_COVER,
                subject.as_str(),
                &[a.as_str(), b.as_str()],
            );
        }
        drain_engine_issues(&mut engine, state, unit.path(), &subject);
    }
    resolver.finish(state);
    debug!(unit = unit.path(), "flow analysed");
}

// =============================================================================
// Usage analysis
// =============================================================================

/// Warn on non-shared toplevel declarations that no unit refers to.
pub(crate) fn analyse_usage(
    project: &Project,
    state: &mut UnitState,
    referenced: &FxHashSet<DeclId>,
) {
    let graph = project.graph();
    let unused: Vec<(String, String)> = state
        .entries
        .iter()
        .filter(|e| graph.is_toplevel(e.id) && !e.source.shared && !referenced.contains(&e.id))
        .map(|e| (e.subject.clone(), graph.qualified_name(e.id)))
        .collect();
    for (subject, name) in unused {
        state.diagnostics.report(
            diagnostic_codes::UNUSED_DECLARATION,
            subject.as_str(),
            &[name.as_str()],
        );
    }
}

#[cfg(test)]
#[path = "../tests/analysis_tests.rs"]
mod tests;
