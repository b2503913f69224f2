//! Type argument substitution.
//!
//! Two variants:
//! - [`TypeEngine::try_substitute`] rebuilds unions and intersections
//!   through the canonical builders, dropping duplicate cases, and
//!   simplifies single-case unions.
//! - [`TypeEngine::substitute_raw`] pushes cases as they come. It never
//!   calls back into subtyping, so the supertype search can project
//!   through inheritance without recursing into duplicate detection.

use crate::canonical::{intersection_from, union_from};
use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::types::{DeclaredType, ProducedType, TypeArgumentMap, TypeKind};

impl TypeEngine<'_> {
    pub fn try_substitute(
        &mut self,
        t: &ProducedType,
        bindings: &TypeArgumentMap,
    ) -> RelationResult<ProducedType> {
        let substituted = self.substitute_canonical(t, bindings)?;
        Ok(self.simple(&substituted))
    }

    fn substitute_canonical(
        &mut self,
        t: &ProducedType,
        bindings: &TypeArgumentMap,
    ) -> RelationResult<ProducedType> {
        match t.kind() {
            TypeKind::Nothing | TypeKind::Unknown => Ok(t.clone()),
            TypeKind::Union(cases) => {
                let mut list = Vec::with_capacity(cases.len());
                for case in cases {
                    let case = self.substitute_canonical(case, bindings)?;
                    self.add_to_union(&mut list, case)?;
                }
                Ok(ProducedType::union_unchecked(list))
            }
            TypeKind::Intersection(members) => {
                let mut list = Vec::with_capacity(members.len());
                for member in members {
                    let member = self.substitute_canonical(member, bindings)?;
                    self.add_to_intersection(&mut list, member)?;
                }
                self.canonical_intersection(list)
            }
            TypeKind::Declared(declared) => {
                if let Some(argument) = self.bound_parameter(declared, bindings) {
                    return Ok(argument);
                }
                let mut arguments = declared.arguments.clone();
                for argument in arguments.iter_mut().flatten() {
                    *argument = self.substitute_canonical(argument, bindings)?;
                }
                let qualifying = match &declared.qualifying {
                    Some(q) => Some(self.substitute_canonical(q, bindings)?),
                    None => None,
                };
                Ok(ProducedType::from_declared(DeclaredType {
                    declaration: declared.declaration,
                    arguments,
                    qualifying,
                    underlying: declared.underlying.clone(),
                    raw: false,
                }))
            }
        }
    }

    pub(crate) fn substitute_raw(
        &self,
        t: &ProducedType,
        bindings: &TypeArgumentMap,
    ) -> ProducedType {
        if bindings.is_empty() {
            return t.clone();
        }
        match t.kind() {
            TypeKind::Nothing | TypeKind::Unknown => t.clone(),
            TypeKind::Union(cases) => ProducedType::union_unchecked(
                cases
                    .iter()
                    .map(|case| self.substitute_raw(case, bindings))
                    .collect(),
            ),
            TypeKind::Intersection(members) => ProducedType::intersection_unchecked(
                members
                    .iter()
                    .map(|member| self.substitute_raw(member, bindings))
                    .collect(),
            ),
            TypeKind::Declared(declared) => {
                if let Some(argument) = self.bound_parameter(declared, bindings) {
                    return argument;
                }
                ProducedType::from_declared(DeclaredType {
                    declaration: declared.declaration,
                    arguments: declared
                        .arguments
                        .iter()
                        .map(|a| a.as_ref().map(|a| self.substitute_raw(a, bindings)))
                        .collect(),
                    qualifying: declared
                        .qualifying
                        .as_ref()
                        .map(|q| self.substitute_raw(q, bindings)),
                    underlying: declared.underlying.clone(),
                    raw: false,
                })
            }
        }
    }

    fn bound_parameter(
        &self,
        declared: &DeclaredType,
        bindings: &TypeArgumentMap,
    ) -> Option<ProducedType> {
        if self.graph.is_type_parameter(declared.declaration) {
            bindings.get(&declared.declaration).cloned()
        } else {
            None
        }
    }

    /// Unwrap single-member unions and intersections, recursively through
    /// type arguments.
    pub(crate) fn simple(&self, t: &ProducedType) -> ProducedType {
        match t.kind() {
            TypeKind::Union(cases) if cases.len() <= 1 => union_from(cases.clone()),
            TypeKind::Intersection(members) if members.len() <= 1 => {
                intersection_from(self.graph, members.clone())
            }
            TypeKind::Declared(declared) => ProducedType::from_declared(DeclaredType {
                arguments: declared
                    .arguments
                    .iter()
                    .map(|a| a.as_ref().map(|a| self.simple(a)))
                    .collect(),
                qualifying: declared.qualifying.as_ref().map(|q| self.simple(q)),
                ..declared.clone()
            }),
            _ => t.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Projection through declarations
    // -------------------------------------------------------------------------

    /// The declaration's extended type seen from `t`, substituted with the
    /// raw variant.
    pub(crate) fn internal_extended_type(&self, t: &ProducedType) -> Option<ProducedType> {
        let declaration = t.declaration()?;
        let extended = self.graph.extended_type(declaration)?;
        Some(self.substitute_raw(&extended, &t.type_argument_map(self.graph)))
    }

    /// Satisfied types seen from `t`; the members of an intersection.
    pub(crate) fn internal_satisfied_types(&self, t: &ProducedType) -> Vec<ProducedType> {
        match t.kind() {
            TypeKind::Intersection(members) => members.clone(),
            TypeKind::Declared(declared) => {
                let bindings = t.type_argument_map(self.graph);
                self.graph
                    .satisfied_types(declared.declaration)
                    .iter()
                    .map(|s| self.substitute_raw(s, &bindings))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// The declaration's extended type seen from `t`.
    pub fn extended_type(&mut self, t: &ProducedType) -> RelationResult<Option<ProducedType>> {
        let Some(extended) = t.declaration().and_then(|d| self.graph.extended_type(d)) else {
            return Ok(None);
        };
        let bindings = t.type_argument_map(self.graph);
        if bindings.is_empty() {
            return Ok(Some(extended));
        }
        self.try_substitute(&extended, &bindings).map(Some)
    }

    /// Satisfied types seen from `t`; the members of an intersection.
    pub fn satisfied_types(&mut self, t: &ProducedType) -> RelationResult<Vec<ProducedType>> {
        match t.kind() {
            TypeKind::Intersection(members) => Ok(members.clone()),
            TypeKind::Declared(declared) => {
                let bindings = t.type_argument_map(self.graph);
                let satisfied = self.graph.satisfied_types(declared.declaration);
                if bindings.is_empty() {
                    return Ok(satisfied);
                }
                satisfied
                    .iter()
                    .map(|s| self.try_substitute(s, &bindings))
                    .collect()
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Enumerated cases seen from `t`; the cases of a union.
    pub fn case_types(&mut self, t: &ProducedType) -> RelationResult<Option<Vec<ProducedType>>> {
        match t.kind() {
            TypeKind::Union(cases) => Ok(Some(cases.clone())),
            TypeKind::Declared(declared) => {
                let Some(cases) = self.graph.case_types(declared.declaration) else {
                    return Ok(None);
                };
                let bindings = t.type_argument_map(self.graph);
                if bindings.is_empty() {
                    return Ok(Some(cases));
                }
                cases
                    .iter()
                    .map(|c| self.try_substitute(c, &bindings))
                    .collect::<RelationResult<Vec<_>>>()
                    .map(Some)
            }
            _ => Ok(None),
        }
    }

    /// The type of `member` as seen from `receiver`: the member's declared
    /// type with the arguments of the receiver's declaring supertype.
    pub fn typed_member_type(
        &mut self,
        receiver: &ProducedType,
        member: crate::def::DeclId,
    ) -> Option<ProducedType> {
        let container = self.graph.container(member)?;
        let member_type = self.graph.with(member, |d| d.value_type.clone()).flatten()?;
        let declaring = self.get_supertype(receiver, container)?;
        let bindings = declaring.type_argument_map(self.graph);
        Some(self.substitute(&member_type, &bindings))
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
