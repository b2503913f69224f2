//! Alias resolution and definition cycles.

use crate::def::{DeclId, DeclarationGraph};
use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::recursion::RecursionProfile;
use crate::types::{DeclaredType, ProducedType, TypeArgumentMap, TypeKind};
use rustc_hash::FxHashSet;

impl TypeEngine<'_> {
    /// Replace every alias in `t` by its definition.
    ///
    /// Unions and intersections are rebuilt case by case, so a broken alias
    /// in one case leaves the others intact. Results are memoized for the
    /// lifetime of the engine.
    pub(crate) fn resolve(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        if let Some(resolved) = self.aliases.get(t) {
            return Ok(carry_markers(t, resolved.clone()));
        }
        self.enter(RecursionProfile::Canonicalization)?;
        let result = self.resolve_step(t);
        self.leave();
        let resolved = result?;
        self.aliases.insert(t.clone(), resolved.clone());
        self.aliases
            .entry(resolved.clone())
            .or_insert_with(|| resolved.clone());
        Ok(carry_markers(t, resolved))
    }

    fn resolve_step(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        match t.kind() {
            TypeKind::Nothing | TypeKind::Unknown => Ok(t.clone()),
            TypeKind::Union(cases) => {
                let mut list = Vec::with_capacity(cases.len());
                for case in cases {
                    let case = self.resolve(case)?;
                    self.add_to_union(&mut list, case)?;
                }
                Ok(crate::canonical::union_from(list))
            }
            TypeKind::Intersection(members) => {
                let mut list = Vec::with_capacity(members.len());
                for member in members {
                    let member = self.resolve(member)?;
                    self.add_to_intersection(&mut list, member)?;
                }
                self.canonical_intersection(list)
            }
            TypeKind::Declared(declared) => {
                let mut arguments = declared.arguments.clone();
                for argument in arguments.iter_mut().flatten() {
                    *argument = self.resolve(argument)?;
                }
                let qualifying = match &declared.qualifying {
                    Some(q) => Some(self.resolve(q)?),
                    None => None,
                };
                if !self.graph.is_alias(declared.declaration) {
                    return Ok(ProducedType::from_declared(DeclaredType {
                        declaration: declared.declaration,
                        arguments,
                        qualifying,
                        underlying: declared.underlying.clone(),
                        raw: declared.raw,
                    }));
                }
                let Some(definition) = self.graph.extended_type(declared.declaration) else {
                    return Ok(ProducedType::unknown());
                };
                let definition = self.resolve(&definition)?;
                let mut bindings: TypeArgumentMap = qualifying
                    .as_ref()
                    .map(|q| q.type_argument_map(self.graph))
                    .unwrap_or_default();
                for (parameter, argument) in self
                    .graph
                    .type_parameters(declared.declaration)
                    .into_iter()
                    .zip(arguments)
                {
                    if let Some(argument) = argument {
                        bindings.insert(parameter, argument);
                    }
                }
                self.try_substitute(&definition, &bindings)
            }
        }
    }
}

/// The resolved form keeps the underlying marker and raw flag of the
/// original.
fn carry_markers(original: &ProducedType, resolved: ProducedType) -> ProducedType {
    let Some(declared) = original.as_declared() else {
        return resolved;
    };
    let mut resolved = resolved;
    if let Some(marker) = &declared.underlying {
        if resolved.underlying_type() != Some(&**marker) {
            resolved = resolved.with_underlying_type(marker.clone());
        }
    }
    if declared.raw {
        resolved = resolved.as_raw();
    }
    resolved
}

// =============================================================================
// Definition cycles
// =============================================================================

fn extend(visited: &FxHashSet<DeclId>, declaration: DeclId) -> FxHashSet<DeclId> {
    let mut extended = visited.clone();
    extended.insert(declaration);
    extended
}

fn push_unique(mut cycle: Vec<DeclId>, declaration: DeclId) -> Vec<DeclId> {
    if !cycle.contains(&declaration) {
        cycle.push(declaration);
    }
    cycle
}

/// The aliases involved in a cycle reachable from `t`, or empty.
pub(crate) fn recursive_alias_definition(
    graph: &DeclarationGraph,
    t: &ProducedType,
    visited: &FxHashSet<DeclId>,
) -> Vec<DeclId> {
    match t.kind() {
        TypeKind::Nothing | TypeKind::Unknown => Vec::new(),
        TypeKind::Union(types) | TypeKind::Intersection(types) => types
            .iter()
            .map(|member| recursive_alias_definition(graph, member, visited))
            .find(|cycle| !cycle.is_empty())
            .unwrap_or_default(),
        TypeKind::Declared(declared) => {
            let declaration = declared.declaration;
            if graph.is_alias(declaration) {
                if visited.contains(&declaration) {
                    return vec![declaration];
                }
                let inner = extend(visited, declaration);
                let definitions = graph
                    .extended_type(declaration)
                    .into_iter()
                    .chain(graph.broken_supertypes(declaration));
                for definition in definitions {
                    let cycle = recursive_alias_definition(graph, &definition, &inner);
                    if !cycle.is_empty() {
                        return push_unique(cycle, declaration);
                    }
                }
                return Vec::new();
            }
            declared
                .arguments
                .iter()
                .flatten()
                .chain(declared.qualifying.iter())
                .map(|component| recursive_alias_definition(graph, component, visited))
                .find(|cycle| !cycle.is_empty())
                .unwrap_or_default()
        }
    }
}

/// The declarations involved in an inheritance cycle reachable from `t`,
/// ignoring type arguments, or empty.
pub(crate) fn recursive_raw_definition(
    graph: &DeclarationGraph,
    t: &ProducedType,
    visited: &FxHashSet<DeclId>,
) -> Vec<DeclId> {
    match t.kind() {
        TypeKind::Nothing | TypeKind::Unknown => Vec::new(),
        TypeKind::Union(types) | TypeKind::Intersection(types) => types
            .iter()
            .map(|member| recursive_raw_definition(graph, member, visited))
            .find(|cycle| !cycle.is_empty())
            .unwrap_or_default(),
        TypeKind::Declared(declared) => {
            let declaration = declared.declaration;
            if visited.contains(&declaration) {
                return vec![declaration];
            }
            let inner = extend(visited, declaration);
            if let Some(extended) = graph.extended_type(declaration) {
                let mut cycle = recursive_raw_definition(graph, &extended, &inner);
                if !cycle.is_empty() {
                    if graph.is_alias(declaration) {
                        return push_unique(cycle, declaration);
                    }
                    cycle.insert(0, declaration);
                    return cycle;
                }
            }
            let mut rest = graph.broken_supertypes(declaration);
            if !graph.is_alias(declaration) {
                rest.extend(graph.satisfied_types(declaration));
            }
            for supertype in rest {
                let cycle = recursive_raw_definition(graph, &supertype, &inner);
                if !cycle.is_empty() {
                    return push_unique(cycle, declaration);
                }
            }
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "../tests/alias_tests.rs"]
mod tests;
