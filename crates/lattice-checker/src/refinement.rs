//! Refinement validation.
//!
//! Runs once every unit's types are scanned, with a fresh engine and no
//! supertype cache. A cyclic or undecidable supertype edge is only
//! recorded on the unit; the seal graph stage cuts it once every unit has
//! finished, moving it aside on the declaration so that later queries
//! never follow it.

use crate::error::PhaseError;
use crate::project::Project;
use crate::resolve::{drain_engine_issues, self_type};
use crate::unit::{DeclEntry, PhasedUnit, UnitState};
use lattice_common::{DiagnosticBag, diagnostic_codes};
use lattice_solver::{
    DeclId, DeclKind, DeclarationGraph, ProducedType, TypeEngine, TypePrinter, Variance,
};
use rustc_hash::FxHashSet;
use tracing::debug;

pub(crate) fn validate_refinement(
    project: &Project,
    unit: &PhasedUnit,
    state: &mut UnitState,
) -> Result<(), PhaseError> {
    let graph = project.graph();
    let mut engine = TypeEngine::new(graph);
    let entries = state.entries.clone();
    for entry in &entries {
        let Some(kind) = graph.kind(entry.id) else {
            return Err(PhaseError::MissingDeclaration {
                unit: unit.path().to_string(),
                name: entry.subject.clone(),
            });
        };
        let mut checker = RefinementChecker {
            graph,
            engine: &mut engine,
            printer: TypePrinter::new(graph),
            diagnostics: &mut state.diagnostics,
            broken_edges: &mut state.broken_edges,
            entry,
        };
        match kind {
            DeclKind::Alias(_) => checker.check_alias(),
            DeclKind::Class { .. } | DeclKind::Interface => checker.check_supertypes(),
            DeclKind::Function | DeclKind::Value => checker.check_member(),
            DeclKind::TypeParameter { .. } => {}
        }
        drain_engine_issues(&mut engine, state, unit.path(), &entry.subject);
    }
    debug!(unit = unit.path(), "refinement validated");
    Ok(())
}

struct RefinementChecker<'a, 'g> {
    graph: &'g DeclarationGraph,
    engine: &'a mut TypeEngine<'g>,
    printer: TypePrinter<'g>,
    diagnostics: &'a mut DiagnosticBag,
    broken_edges: &'a mut Vec<(DeclId, ProducedType)>,
    entry: &'a DeclEntry,
}

impl RefinementChecker<'_, '_> {
    fn report(&mut self, code: u32, args: &[&str]) {
        self.diagnostics.report(code, self.entry.subject.as_str(), args);
    }

    fn names(&self, ids: &[DeclId]) -> String {
        ids.iter()
            .map(|id| self.graph.name(*id).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn check_alias(&mut self) {
        let id = self.entry.id;
        let Some(definition) = self.graph.extended_type(id) else {
            return;
        };
        let visited: FxHashSet<DeclId> = [id].into_iter().collect();
        let cycle = self
            .engine
            .is_recursive_type_alias_definition(&definition, &visited);
        if cycle.is_empty() {
            return;
        }
        let name = self.graph.name(id);
        let involving = self.names(&cycle);
        self.report(diagnostic_codes::CIRCULAR_ALIAS, &[&*name, involving.as_str()]);
        self.broken_edges.push((id, definition));
    }

    fn check_supertypes(&mut self) {
        let id = self.entry.id;
        let declared: Vec<ProducedType> = self
            .graph
            .extended_type(id)
            .into_iter()
            .chain(self.graph.satisfied_types(id))
            .collect();
        for supertype in declared {
            let visited: FxHashSet<DeclId> = [id].into_iter().collect();
            let cycle = self
                .engine
                .is_recursive_raw_type_definition(&supertype, &visited);
            if !cycle.is_empty() {
                let name = self.graph.name(id);
                let involving = self.names(&cycle);
                self.report(diagnostic_codes::CIRCULAR_INHERITANCE, &[&*name, involving.as_str()]);
                self.broken_edges.push((id, supertype));
                continue;
            }

            let undecidable = self.engine.check_decidability(&supertype);
            if !undecidable.is_empty() {
                let printed = self.printer.print(&supertype);
                for declaration in undecidable {
                    let name = self.graph.name(declaration);
                    self.report(diagnostic_codes::UNDECIDABLE_SUPERTYPE, &[&*name, printed.as_str()]);
                }
                self.broken_edges.push((id, supertype));
                continue;
            }

            let location = format!("supertype {}", self.printer.print(&supertype));
            // A type's own parameters are checked in its supertypes, so none is exempt.
            self.check_variance(&supertype, true, false, DeclId::NONE, &location);
        }
    }

    /// Report every type parameter `t` uses at a position its variance
    /// forbids.
    fn check_variance(
        &mut self,
        t: &ProducedType,
        covariant: bool,
        contravariant: bool,
        declaration: DeclId,
        location: &str,
    ) {
        for parameter in self
            .engine
            .check_variance(t, covariant, contravariant, declaration)
        {
            let variance = self.graph.variance(parameter);
            let position = match variance {
                Variance::Covariant => "contravariant or invariant",
                Variance::Contravariant => "covariant or invariant",
                Variance::Invariant => continue,
            };
            let name = self.graph.name(parameter);
            self.report(
                diagnostic_codes::VARIANCE_VIOLATION,
                &[variance.name(), &*name, position, location],
            );
        }
    }

    fn check_member(&mut self) {
        let id = self.entry.id;
        let Some(container) = self
            .graph
            .container(id)
            .filter(|c| self.graph.is_class_or_interface(*c))
        else {
            return;
        };
        let Some((kind, parameters, value_type)) = self
            .graph
            .with(id, |d| (d.kind, d.parameters.clone(), d.value_type.clone()))
        else {
            return;
        };
        let name = self.graph.name(id);

        if let Some(t) = &value_type {
            self.check_variance(t, true, false, id, &format!("type of {name}"));
        }
        for parameter in &parameters {
            self.check_variance(parameter, false, true, id, &format!("parameter of {name}"));
        }

        let Some(member_type) = value_type else {
            return;
        };
        let receiver = self_type(self.graph, container);
        for supertype in self.engine.supertypes(&receiver) {
            let Some(declaration) = supertype.declaration() else {
                continue;
            };
            if declaration == container {
                continue;
            }
            let refined = self
                .graph
                .direct_members_named(declaration, &name)
                .into_iter()
                .find(|m| {
                    self.graph
                        .with(*m, |d| d.kind == kind && d.parameters.len() == parameters.len())
                        .unwrap_or(false)
                });
            let Some(refined) = refined else {
                continue;
            };
            let Some(refined_type) = self.engine.typed_member_type(&receiver, refined) else {
                return;
            };
            if member_type.contains_unknowns() || refined_type.contains_unknowns() {
                return;
            }
            if !self.engine.is_subtype_of(&member_type, &refined_type) {
                let actual = self.printer.print(&member_type);
                let expected = self.printer.print(&refined_type);
                self.report(
                    diagnostic_codes::REFINEMENT_NOT_ASSIGNABLE,
                    &[&*name, actual.as_str(), expected.as_str()],
                );
            }
            return;
        }
    }
}

#[cfg(test)]
#[path = "../tests/refinement_tests.rs"]
mod tests;
