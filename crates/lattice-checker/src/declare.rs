//! Declaration scanning, wiring and type scanning.
//!
//! The three phases fill the graph in layers so that each can rely on the
//! previous one being complete for every unit:
//!
//! 1. `scan_declarations` interns every declaration, member and type
//!    parameter of the unit
//! 2. `wire_type_declarations` sets the declaration-level supertype edges
//! 3. `scan_type_declarations` resolves the produced types of supertypes,
//!    cases, bounds, aliases and member signatures

use crate::error::PhaseError;
use crate::project::{Project, TypeDefault};
use crate::resolve::TypeResolver;
use crate::source::{DeclSource, DeclSourceKind, TypeExpr};
use crate::unit::{DeclEntry, PhasedUnit, UnitState};
use lattice_common::{DiagnosticBag, diagnostic_codes};
use lattice_solver::{
    AliasForm, DeclId, DeclKey, Declaration, DeclarationGraph, ProducedType, qualify,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

// =============================================================================
// Declaration scan
// =============================================================================

pub(crate) fn scan_declarations(project: &Project, unit: &PhasedUnit, state: &mut UnitState) {
    for source in &unit.source().declarations {
        let key = DeclKey::toplevel(unit.package(), &source.name);
        register(project, unit, state, source, key, None, source.name.clone());
    }
    debug!(
        unit = unit.path(),
        declarations = state.entries.len(),
        "declarations scanned"
    );
}

fn declaration_of(source: &DeclSource) -> Declaration {
    let name = source.name.as_str();
    match source.kind {
        DeclSourceKind::Class if source.is_abstract => Declaration::abstract_class(name),
        DeclSourceKind::Class => Declaration::class(name),
        DeclSourceKind::Interface => Declaration::interface(name),
        DeclSourceKind::Alias => Declaration::alias(name, AliasForm::Type),
        DeclSourceKind::ClassAlias => Declaration::alias(name, AliasForm::Class),
        DeclSourceKind::InterfaceAlias => Declaration::alias(name, AliasForm::Interface),
        DeclSourceKind::Function => Declaration::function(name),
        DeclSourceKind::Value => Declaration::value(name),
    }
}

fn report_duplicate(state: &mut UnitState, subject: &str, name: &str) {
    state
        .diagnostics
        .report(diagnostic_codes::DUPLICATE_DECLARATION, subject, &[name]);
}

fn register(
    project: &Project,
    unit: &PhasedUnit,
    state: &mut UnitState,
    source: &DeclSource,
    key: DeclKey,
    container: Option<DeclId>,
    subject: String,
) {
    if container.is_none() && project.toplevel_owner(unit.package(), &source.name) != Some(unit.id()) {
        report_duplicate(state, &subject, &qualify(unit.package(), &source.name));
        return;
    }

    let graph = project.graph();
    let mut declaration = declaration_of(source)
        .in_package(unit.package())
        .with_origin(unit.path())
        .with_shared(source.shared)
        .with_sequenced(source.sequenced);
    if let Some(container) = container {
        declaration = declaration.with_container(container);
    }
    let id = graph.declare(key, declaration);

    // A builtin holds the key. Duplicates inside this unit were already
    // reported by tree validation.
    let owned = graph
        .with(id, |d| d.origin.as_deref() == Some(unit.path()))
        .unwrap_or(false);
    if !owned {
        let name = match container {
            Some(_) => subject.clone(),
            None => qualify(unit.package(), &source.name),
        };
        report_duplicate(state, &subject, &name);
        return;
    }
    if state.entries.iter().any(|e| e.id == id) {
        return;
    }
    if let Some(container) = container {
        graph.add_member(container, id);
    }
    trace!(decl_id = id.0, subject = %subject, "registered declaration");

    let mut type_parameters = Vec::with_capacity(source.type_parameters.len());
    for parameter in &source.type_parameters {
        let pid = graph.declare(
            DeclKey::member(id, &parameter.name),
            Declaration::type_parameter(
                parameter.name.as_str(),
                id,
                parameter.variance,
                parameter.is_defaulted(),
            )
            .in_package(unit.package())
            .with_origin(unit.path()),
        );
        if type_parameters.contains(&pid) {
            continue;
        }
        if let Some(default) = &parameter.default {
            project.set_default(
                pid,
                TypeDefault {
                    unit: unit.id(),
                    expression: default.clone(),
                },
            );
        }
        type_parameters.push(pid);
    }
    graph.set_type_parameters(id, type_parameters.clone());

    state.entries.push(DeclEntry {
        id,
        subject: subject.clone(),
        source: source.clone(),
        type_parameters,
    });

    let mut overloads: FxHashMap<&str, u32> = FxHashMap::default();
    for member in &source.members {
        let key = if member.kind == DeclSourceKind::Function {
            let next = overloads.entry(member.name.as_str()).or_insert(0);
            let key = DeclKey::overload(id, &member.name, *next);
            *next += 1;
            key
        } else {
            DeclKey::member(id, &member.name)
        };
        let member_subject = format!("{subject}.{}", member.name);
        register(project, unit, state, member, key, Some(id), member_subject);
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub(crate) fn wire_type_declarations(
    project: &Project,
    unit: &PhasedUnit,
    state: &mut UnitState,
) -> Result<(), PhaseError> {
    let graph = project.graph();
    let anything = graph.builtins().anything;
    let object = graph.builtins().object;
    let resolver = TypeResolver::new(project, unit);
    let UnitState {
        entries,
        diagnostics,
        ..
    } = state;

    for entry in entries.iter() {
        let id = entry.id;
        if !graph.contains(id) {
            return Err(PhaseError::MissingDeclaration {
                unit: unit.path().to_string(),
                name: entry.subject.clone(),
            });
        }
        let scope = Some(id);
        let subject = entry.subject.as_str();

        for pid in &entry.type_parameters {
            graph.set_extended_type_declaration(*pid, anything);
            let Some(parameter) = entry
                .source
                .type_parameters
                .iter()
                .find(|p| *graph.name(*pid) == *p.name)
            else {
                continue;
            };
            for bound in &parameter.satisfies {
                if let Some(bound) = wire_head(graph, &resolver, bound, scope, None) {
                    graph.add_satisfied_type_declaration(*pid, bound);
                }
            }
        }

        match entry.source.kind {
            DeclSourceKind::Class | DeclSourceKind::Interface => {
                let extended = match &entry.source.extends {
                    Some(expr) => {
                        wire_head(graph, &resolver, expr, scope, Some((&mut *diagnostics, subject)))
                    }
                    None => Some(object),
                };
                if let Some(extended) = extended {
                    graph.set_extended_type_declaration(id, extended);
                }
                for satisfied in &entry.source.satisfies {
                    let reporting = Some((&mut *diagnostics, subject));
                    if let Some(satisfied) = wire_head(graph, &resolver, satisfied, scope, reporting)
                    {
                        graph.add_satisfied_type_declaration(id, satisfied);
                    }
                }
            }
            DeclSourceKind::ClassAlias | DeclSourceKind::InterfaceAlias => {
                // Unknown names in the aliased type are reported by the scan.
                if let Some(aliased) = &entry.source.type_ {
                    if let Some(target) = wire_head(graph, &resolver, aliased, scope, None) {
                        graph.set_extended_type_declaration(id, target);
                    }
                }
            }
            DeclSourceKind::Alias | DeclSourceKind::Function | DeclSourceKind::Value => {}
        }
    }
    debug!(unit = unit.path(), "type declarations wired");
    Ok(())
}

/// The declaration a supertype expression names, if it names a type.
fn wire_head(
    graph: &DeclarationGraph,
    resolver: &TypeResolver<'_>,
    expr: &TypeExpr,
    scope: Option<DeclId>,
    reporting: Option<(&mut DiagnosticBag, &str)>,
) -> Option<DeclId> {
    // Member types of a qualifier are wired from the resolved type.
    if let TypeExpr::Applied {
        qualifier: Some(_), ..
    } = expr
    {
        return None;
    }
    let head = expr.head()?;
    match resolver.lookup(head, scope) {
        Some(found) if graph.kind(found).is_some_and(|k| k.is_type_declaration()) => Some(found),
        Some(_) => None,
        None => {
            if let Some((diagnostics, subject)) = reporting {
                diagnostics.report(diagnostic_codes::TYPE_NOT_FOUND, subject, &[head]);
            }
            None
        }
    }
}

// =============================================================================
// Type scan
// =============================================================================

pub(crate) fn scan_type_declarations(
    project: &Project,
    unit: &PhasedUnit,
    state: &mut UnitState,
) -> Result<(), PhaseError> {
    let graph = project.graph();
    let mut resolver = TypeResolver::new(project, unit);

    for entry in &state.entries {
        let id = entry.id;
        if !graph.contains(id) {
            return Err(PhaseError::MissingDeclaration {
                unit: unit.path().to_string(),
                name: entry.subject.clone(),
            });
        }
        let scope = Some(id);
        let subject = entry.subject.as_str();
        let source = &entry.source;

        for pid in &entry.type_parameters {
            graph.set_extended_type(*pid, graph.anything_type());
            let Some(parameter) = source
                .type_parameters
                .iter()
                .find(|p| *graph.name(*pid) == *p.name)
            else {
                continue;
            };
            for bound in &parameter.satisfies {
                let bound = resolver.resolve(bound, scope, Some(subject));
                if !bound.is_unknown() {
                    graph.add_satisfied_type(*pid, bound);
                }
            }
        }

        match source.kind {
            DeclSourceKind::Class | DeclSourceKind::Interface => {
                let extended = match &source.extends {
                    Some(expr) => resolver.resolve_supertype(expr, scope, subject),
                    None => graph.object_type(),
                };
                let extended = if extended.declaration().is_some() {
                    extended
                } else {
                    graph.object_type()
                };
                set_extended(graph, id, extended);
                for satisfied in &source.satisfies {
                    let satisfied = resolver.resolve_supertype(satisfied, scope, subject);
                    if let Some(declaration) = satisfied.declaration() {
                        if !graph.satisfied_decls(id).contains(&declaration) {
                            graph.add_satisfied_type_declaration(id, declaration);
                        }
                        graph.add_satisfied_type(id, satisfied);
                    }
                }
                if let Some(cases) = &source.cases {
                    let cases = cases
                        .iter()
                        .map(|case| resolver.resolve(case, scope, Some(subject)))
                        .collect();
                    graph.set_case_types(id, cases);
                }
            }
            DeclSourceKind::Alias | DeclSourceKind::ClassAlias | DeclSourceKind::InterfaceAlias => {
                let aliased = match &source.type_ {
                    Some(expr) => resolver.resolve(expr, scope, Some(subject)),
                    None => ProducedType::unknown(),
                };
                graph.set_extended_type(id, aliased);
            }
            DeclSourceKind::Function | DeclSourceKind::Value => {
                let parameters = source
                    .parameters
                    .iter()
                    .map(|p| resolver.resolve(p, scope, Some(subject)))
                    .collect();
                let value_type = source
                    .type_
                    .as_ref()
                    .map(|t| resolver.resolve(t, scope, Some(subject)));
                graph.set_signature(id, parameters, value_type);
            }
        }
    }
    resolver.finish(state);
    debug!(unit = unit.path(), "type declarations scanned");
    Ok(())
}

/// Keep the declaration-level edge in step with the produced type.
fn set_extended(graph: &DeclarationGraph, id: DeclId, extended: ProducedType) {
    if let Some(declaration) = extended.declaration() {
        if graph.extended_decl(id) != Some(declaration) {
            graph.set_extended_type_declaration(id, declaration);
        }
    }
    graph.set_extended_type(id, extended);
}

#[cfg(test)]
#[path = "../tests/declare_tests.rs"]
mod tests;
