//! Principal supertype search.
//!
//! `get_supertype(t, D)` answers the unique instantiation of `D` that `t`
//! inherits. A declaration-level pre-check settles the common cases; the
//! rest goes through [`TypeEngine::search`], which walks extended and
//! satisfied types and merges what it finds:
//!
//! - a candidate that is a subtype of the current result replaces it
//! - two instantiations of one declaration merge into their principal
//!   instantiation
//! - two incomparable candidates of different declarations are ambiguous:
//!   the unknown type, or for member lookups a search of their union
//!
//! Unions additionally derive a supertype shared by all their cases.

use crate::canonical::union_from;
use crate::def::DeclId;
use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::recursion::RecursionProfile;
use crate::types::{DeclaredType, ProducedType, TypeKind};
use lattice_common::limits::MAX_SUPERTYPE_CHECK_DEPTH;
use std::sync::Arc;

/// What the search is looking for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Criteria {
    /// An instantiation of this declaration.
    Supertype(DeclId),
    /// A type directly declaring a member with this name.
    DeclaresMember(Arc<str>),
}

impl Criteria {
    fn is_member_lookup(&self) -> bool {
        matches!(self, Criteria::DeclaresMember(_))
    }
}

/// Result of the declaration-level pre-check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SupertypeCheck {
    Yes,
    No,
    Maybe,
}

impl TypeEngine<'_> {
    fn satisfies(&self, criteria: &Criteria, declaration: DeclId) -> bool {
        match criteria {
            Criteria::Supertype(target) => declaration == *target,
            Criteria::DeclaresMember(name) => !self
                .graph
                .direct_members_named(declaration, name)
                .is_empty(),
        }
    }

    pub(crate) fn get_supertype_internal(
        &mut self,
        t: &ProducedType,
        target: DeclId,
    ) -> RelationResult<Option<ProducedType>> {
        let cache = self
            .cache
            .filter(|cache| cache.is_enabled() && !t.has_underlying_type());
        let key = (t.without_underlying_type(), target);
        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit);
            }
        }
        let result = match self.check_supertype(t, target) {
            SupertypeCheck::No => None,
            SupertypeCheck::Yes
                if self.graph.is_class_or_interface(target)
                    && self.graph.is_toplevel(target)
                    && self.graph.type_parameters(target).is_empty() =>
            {
                Some(ProducedType::of(target))
            }
            SupertypeCheck::Yes
                if t.declaration() == Some(target) && self.graph.is_toplevel(target) =>
            {
                Some(t.clone())
            }
            _ => self.search(t, &Criteria::Supertype(target))?,
        };
        if let Some(cache) = cache {
            cache.insert(key, result.clone());
        }
        Ok(result)
    }

    /// Can `target` be reached from `t` through declaration-level edges?
    pub fn check_supertype(&self, t: &ProducedType, target: DeclId) -> SupertypeCheck {
        match t.kind() {
            TypeKind::Declared(declared) => {
                self.check_declaration_supertype(declared.declaration, target, 0)
            }
            TypeKind::Union(cases) => {
                if cases.is_empty() {
                    return SupertypeCheck::No;
                }
                for case in cases {
                    let check = self.check_supertype(case, target);
                    if check != SupertypeCheck::Yes {
                        return check;
                    }
                }
                SupertypeCheck::Yes
            }
            TypeKind::Intersection(members) => {
                if members.is_empty() {
                    return SupertypeCheck::No;
                }
                let mut perhaps = false;
                for member in members {
                    match self.check_supertype(member, target) {
                        SupertypeCheck::Yes => return SupertypeCheck::Yes,
                        SupertypeCheck::Maybe => perhaps = true,
                        SupertypeCheck::No => {}
                    }
                }
                if perhaps {
                    SupertypeCheck::Maybe
                } else {
                    SupertypeCheck::No
                }
            }
            TypeKind::Nothing | TypeKind::Unknown => SupertypeCheck::Maybe,
        }
    }

    fn check_declaration_supertype(
        &self,
        declaration: DeclId,
        target: DeclId,
        depth: u32,
    ) -> SupertypeCheck {
        let (Some(kind), Some(target_kind)) = (self.graph.kind(declaration), self.graph.kind(target))
        else {
            return SupertypeCheck::Maybe;
        };
        // An interface has exactly two class supertypes.
        if kind.is_interface() && target_kind.is_class() {
            let builtins = self.graph.builtins();
            return if target == builtins.object || target == builtins.anything {
                SupertypeCheck::Yes
            } else {
                SupertypeCheck::No
            };
        }
        if !target_kind.is_class_or_interface() {
            return SupertypeCheck::Maybe;
        }
        if !kind.is_class_or_interface() {
            return SupertypeCheck::Maybe;
        }
        if declaration == target {
            return SupertypeCheck::Yes;
        }
        if depth >= MAX_SUPERTYPE_CHECK_DEPTH {
            return SupertypeCheck::No;
        }
        let mut perhaps = false;
        let extended = self.graph.extended_decl(declaration);
        for next in extended.into_iter().chain(self.graph.satisfied_decls(declaration)) {
            match self.check_declaration_supertype(next, target, depth + 1) {
                SupertypeCheck::Yes => return SupertypeCheck::Yes,
                SupertypeCheck::Maybe => perhaps = true,
                SupertypeCheck::No => {}
            }
        }
        if perhaps {
            SupertypeCheck::Maybe
        } else {
            SupertypeCheck::No
        }
    }

    /// The most specific supertype of `t` satisfying `criteria`.
    pub(crate) fn search(
        &mut self,
        t: &ProducedType,
        criteria: &Criteria,
    ) -> RelationResult<Option<ProducedType>> {
        self.enter(RecursionProfile::SubtypeCheck)?;
        let result = self.search_step(t, criteria);
        self.leave();
        result
    }

    fn search_step(
        &mut self,
        t: &ProducedType,
        criteria: &Criteria,
    ) -> RelationResult<Option<ProducedType>> {
        if let Some(declaration) = t.declaration() {
            if self.satisfies(criteria, declaration) {
                return self.qualified_by_declaring_type(t).map(Some);
            }
        }
        if !self.is_well_defined(t) {
            return Ok(None);
        }
        let result = self.principal_search(t, criteria)?;
        self.search_cases(t, criteria, result)
    }

    /// Replace the qualifying type of a member type by the supertype of
    /// the qualifying type that declares it.
    fn qualified_by_declaring_type(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        let Some(declared) = t.as_declared() else {
            return Ok(t.clone());
        };
        let Some(qualifying) = &declared.qualifying else {
            return Ok(t.clone());
        };
        if !self.graph.is_member(declared.declaration) {
            return Ok(t.clone());
        }
        let Some(container) = self.graph.container(declared.declaration) else {
            return Ok(t.clone());
        };
        let declaring = self.get_supertype_internal(qualifying, container)?;
        Ok(ProducedType::from_declared(DeclaredType {
            qualifying: declaring,
            ..declared.clone()
        }))
    }

    fn principal_search(
        &mut self,
        t: &ProducedType,
        criteria: &Criteria,
    ) -> RelationResult<Option<ProducedType>> {
        let mut result = None;
        if let Some(extended) = self.internal_extended_type(t) {
            result = self.search(&extended, criteria)?;
        }
        let satisfied = self.internal_satisfied_types(t);
        for supertype in &satisfied {
            let Some(possible) = self.search(supertype, criteria)? else {
                continue;
            };
            let Some(current) = result.clone() else {
                result = Some(possible);
                continue;
            };
            if self.subtype_internal(&possible, &current)? {
                result = Some(possible);
            } else if !self.subtype_internal(&current, &possible)? {
                match (current.declaration(), possible.declaration()) {
                    (Some(cd), Some(pd)) if cd == pd => {
                        result = Some(self.try_principal_instantiation(cd, &possible, &current)?);
                    }
                    _ if criteria.is_member_lookup() => {
                        // A|B is a supertype of both candidates.
                        let union = ProducedType::union_unchecked(vec![current, possible]);
                        match self.search(&union, criteria)? {
                            Some(found) => result = Some(found),
                            None => return Ok(Some(ProducedType::unknown())),
                        }
                    }
                    _ => return Ok(Some(ProducedType::unknown())),
                }
            }
        }
        Ok(result)
    }

    /// For a union, a supertype shared by every case.
    fn search_cases(
        &mut self,
        t: &ProducedType,
        criteria: &Criteria,
        result: Option<ProducedType>,
    ) -> RelationResult<Option<ProducedType>> {
        let TypeKind::Union(cases) = t.kind() else {
            return Ok(result);
        };
        if cases.is_empty() {
            return Ok(result);
        }
        let Some(common) = self.find_common_superclass(criteria, cases)? else {
            return Ok(result);
        };
        let Some(declaration) = common.declaration() else {
            return Ok(result);
        };
        let Some(candidate) = self.common_supertype(cases, declaration)? else {
            return Ok(result);
        };
        match &result {
            None => Ok(Some(candidate)),
            Some(current) if self.subtype_internal(&candidate, current)? => Ok(Some(candidate)),
            Some(_) => Ok(result),
        }
    }

    /// The most refined class or interface satisfying `criteria` that every
    /// case inherits, ignoring type arguments.
    fn find_common_superclass(
        &mut self,
        criteria: &Criteria,
        cases: &[ProducedType],
    ) -> RelationResult<Option<ProducedType>> {
        let mut found: Option<ProducedType> = None;
        for candidate in self.supertypes_internal(&cases[0])? {
            let Some(declaration) = candidate.declaration() else {
                continue;
            };
            if !self.graph.is_class_or_interface(declaration) || !self.satisfies(criteria, declaration)
            {
                continue;
            }
            if !cases.iter().all(|case| self.inherits_declaration(case, declaration)) {
                continue;
            }
            match found.as_ref().and_then(ProducedType::declaration) {
                None => found = Some(candidate),
                Some(current) if self.graph.inherits(declaration, current) => {
                    found = Some(candidate);
                }
                Some(current) if self.graph.inherits(current, declaration) => {}
                Some(_) => return Ok(None),
            }
        }
        Ok(found)
    }

    fn inherits_declaration(&self, t: &ProducedType, declaration: DeclId) -> bool {
        match t.kind() {
            TypeKind::Declared(declared) => self.graph.inherits(declared.declaration, declaration),
            TypeKind::Union(cases) => cases.iter().all(|c| self.inherits_declaration(c, declaration)),
            TypeKind::Intersection(members) => members
                .iter()
                .any(|m| self.inherits_declaration(m, declaration)),
            TypeKind::Nothing => true,
            TypeKind::Unknown => false,
        }
    }

    /// An instantiation of `declaration` that is a supertype of every case:
    /// covariant and invariant arguments are unioned, contravariant ones
    /// intersected.
    fn common_supertype(
        &mut self,
        cases: &[ProducedType],
        declaration: DeclId,
    ) -> RelationResult<Option<ProducedType>> {
        let parameters = self.graph.type_parameters(declaration);
        let mut arguments = Vec::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            let contravariant = self.graph.variance(*parameter).is_contravariant();
            let mut list = Vec::with_capacity(cases.len());
            for case in cases {
                let Some(supertype) = self.get_supertype_internal(case, declaration)? else {
                    return Ok(None);
                };
                let Some(argument) = supertype.arguments().get(i).cloned().flatten() else {
                    return Ok(None);
                };
                if contravariant {
                    self.add_to_intersection(&mut list, argument)?;
                } else {
                    self.add_to_union(&mut list, argument)?;
                }
            }
            let argument = if contravariant {
                self.canonical_intersection(list)?
            } else {
                union_from(list)
            };
            arguments.push(Some(argument));
        }
        let qualifying = if self.graph.is_member(declaration) {
            let Some(outer) = self.graph.container(declaration) else {
                return Ok(None);
            };
            let mut outers = Vec::with_capacity(cases.len());
            for case in cases {
                let members = match case.members() {
                    Some(members) => members.to_vec(),
                    None => vec![case.clone()],
                };
                for member in members {
                    let is_member = member
                        .declaration()
                        .is_some_and(|d| self.graph.is_member(d));
                    let Some(q) = member.qualifying_type().filter(|_| is_member) else {
                        continue;
                    };
                    match self.get_supertype_internal(q, outer)? {
                        Some(declaring) => outers.push(declaring),
                        None => return Ok(None),
                    }
                }
            }
            if outers.is_empty() {
                None
            } else {
                self.common_supertype(&outers, outer)?
            }
        } else {
            None
        };
        let candidate = ProducedType::declared(declaration, arguments, qualifying);
        for case in cases {
            if !self.subtype_internal(case, &candidate)? {
                return Ok(None);
            }
        }
        Ok(Some(candidate))
    }

    // -------------------------------------------------------------------------
    // All supertypes
    // -------------------------------------------------------------------------

    pub(crate) fn supertypes_internal(&mut self, t: &ProducedType) -> RelationResult<Vec<ProducedType>> {
        let mut list = Vec::new();
        self.collect_supertypes(t, &mut list)?;
        Ok(list)
    }

    fn collect_supertypes(
        &mut self,
        t: &ProducedType,
        list: &mut Vec<ProducedType>,
    ) -> RelationResult<()> {
        self.enter(RecursionProfile::SubtypeCheck)?;
        let result = self.collect_supertypes_step(t, list);
        self.leave();
        result
    }

    fn collect_supertypes_step(
        &mut self,
        t: &ProducedType,
        list: &mut Vec<ProducedType>,
    ) -> RelationResult<()> {
        if !self.is_well_defined(t) {
            return Ok(());
        }
        let composite = t.is_union() || t.is_intersection();
        if !composite && !self.add_to_supertypes(list, t)? {
            return Ok(());
        }
        if let Some(extended) = self.extended_type(t)? {
            self.collect_supertypes(&extended, list)?;
        }
        for satisfied in self.satisfied_types(t)? {
            self.collect_supertypes(&satisfied, list)?;
        }
        if let TypeKind::Union(cases) = t.kind() {
            for case in cases {
                if self.already_listed(list, case)? {
                    continue;
                }
                for candidate in self.supertypes_internal(case)? {
                    let mut shared = true;
                    for other in cases {
                        if !self.subtype_internal(other, &candidate)? {
                            shared = false;
                            break;
                        }
                    }
                    if shared {
                        self.add_to_supertypes(list, &candidate)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn add_to_supertypes(
        &mut self,
        list: &mut Vec<ProducedType>,
        t: &ProducedType,
    ) -> RelationResult<bool> {
        for existing in list.iter() {
            if existing.declaration() == t.declaration() && existing == t {
                return Ok(false);
            }
        }
        let candidates: Vec<ProducedType> = list
            .iter()
            .filter(|existing| existing.declaration() == t.declaration())
            .cloned()
            .collect();
        for existing in &candidates {
            if self.exactly_internal(t, existing)? {
                return Ok(false);
            }
        }
        list.push(t.clone());
        Ok(true)
    }

    fn already_listed(&mut self, list: &[ProducedType], t: &ProducedType) -> RelationResult<bool> {
        if list.is_empty() {
            return Ok(false);
        }
        if t.is_union() || t.is_intersection() {
            return Ok(true);
        }
        for existing in list {
            if existing.declaration() == t.declaration() && self.exactly_internal(t, existing)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "../tests/supertype_tests.rs"]
mod tests;
