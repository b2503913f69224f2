//! Member lookup and overload resolution.
//!
//! Lookup starts at a scope, searches its own members, then the members
//! it inherits (nearest supertypes first), and only then climbs to the
//! containing scope. The first scope with a match wins; matches from
//! different scopes are never merged.

use crate::def::{DeclId, DeclKind};
use crate::engine::TypeEngine;
use crate::types::ProducedType;
use lattice_common::limits::MAX_SUPERTYPE_CHECK_DEPTH;
use rustc_hash::FxHashSet;

impl TypeEngine<'_> {
    /// Resolve `name` from `scope`.
    ///
    /// With a `signature`, only functions whose parameters accept the
    /// argument types match. `allow_sequenced` treats the last argument as
    /// a spread matched directly against a sequenced parameter.
    pub fn get_member(
        &mut self,
        scope: DeclId,
        name: &str,
        signature: Option<&[ProducedType]>,
        allow_sequenced: bool,
    ) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            if let Some(found) = self.member_in_scope(scope, name, signature, allow_sequenced) {
                return Some(found);
            }
            current = self.graph.container(scope);
        }
        None
    }

    /// Own and inherited members of `scope`, level by level.
    fn member_in_scope(
        &mut self,
        scope: DeclId,
        name: &str,
        signature: Option<&[ProducedType]>,
        allow_sequenced: bool,
    ) -> Option<DeclId> {
        let mut visited = FxHashSet::default();
        visited.insert(scope);
        let mut level = vec![scope];
        let mut depth = 0;
        while !level.is_empty() && depth <= MAX_SUPERTYPE_CHECK_DEPTH {
            let candidates: Vec<DeclId> = level
                .iter()
                .flat_map(|d| self.graph.direct_members_named(*d, name))
                .collect();
            if let Some(found) = self.select_overload(&candidates, signature, allow_sequenced) {
                return Some(found);
            }
            let mut next = Vec::new();
            for declaration in &level {
                let extended = self.graph.extended_decl(*declaration);
                for supertype in extended
                    .into_iter()
                    .chain(self.graph.satisfied_decls(*declaration))
                {
                    if visited.insert(supertype) {
                        next.push(supertype);
                    }
                }
            }
            level = next;
            depth += 1;
        }
        None
    }

    fn select_overload(
        &mut self,
        candidates: &[DeclId],
        signature: Option<&[ProducedType]>,
        allow_sequenced: bool,
    ) -> Option<DeclId> {
        let Some(arguments) = signature else {
            return candidates.first().copied();
        };
        let mut matching = Vec::new();
        for candidate in candidates {
            if self.accepts(*candidate, arguments, allow_sequenced) {
                matching.push(*candidate);
            }
        }
        if matching.len() <= 1 {
            return matching.first().copied();
        }
        for candidate in &matching {
            let mut most_specific = true;
            for other in &matching {
                if other != candidate && !self.more_specific(*candidate, *other) {
                    most_specific = false;
                    break;
                }
            }
            if most_specific {
                return Some(*candidate);
            }
        }
        matching.first().copied()
    }

    fn accepts(&mut self, candidate: DeclId, arguments: &[ProducedType], allow_sequenced: bool) -> bool {
        let Some((kind, parameters, sequenced)) = self
            .graph
            .with(candidate, |d| (d.kind, d.parameters.clone(), d.sequenced))
        else {
            return false;
        };
        if kind != DeclKind::Function {
            return false;
        }
        let sequenced = sequenced && !parameters.is_empty();
        if !sequenced || allow_sequenced {
            return parameters.len() == arguments.len()
                && self.all_assignable(arguments, &parameters);
        }
        let fixed = parameters.len() - 1;
        if arguments.len() < fixed {
            return false;
        }
        if !self.all_assignable(&arguments[..fixed], &parameters[..fixed]) {
            return false;
        }
        let element = &parameters[fixed];
        arguments[fixed..]
            .iter()
            .all(|argument| self.is_subtype_of(argument, element))
    }

    fn all_assignable(&mut self, arguments: &[ProducedType], parameters: &[ProducedType]) -> bool {
        arguments
            .iter()
            .zip(parameters)
            .all(|(argument, parameter)| self.is_subtype_of(argument, parameter))
    }

    /// Every parameter of `a` is a subtype of the matching parameter of `b`.
    fn more_specific(&mut self, a: DeclId, b: DeclId) -> bool {
        let pa = self.graph.with(a, |d| d.parameters.clone()).unwrap_or_default();
        let pb = self.graph.with(b, |d| d.parameters.clone()).unwrap_or_default();
        self.all_assignable(&pa, &pb)
    }
}

#[cfg(test)]
#[path = "../tests/lookup_tests.rs"]
mod tests;
