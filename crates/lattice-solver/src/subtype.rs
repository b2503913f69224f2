//! Subtyping and exact equality.
//!
//! Both relations expect alias-resolved operands; the public entry points
//! on [`TypeEngine`] resolve first.
//!
//! ## Subtyping by shape
//!
//! | left / right     | rule                                               |
//! |------------------|----------------------------------------------------|
//! | `Nothing` / any  | true                                               |
//! | any / `Nothing`  | false                                              |
//! | union / any      | every case is a subtype                            |
//! | any / union      | some case is a supertype                           |
//! | any / intersection | every member is a supertype                      |
//! | intersection / any | the principal supertype, else some member        |
//! | declared / declared | principal supertype, then qualifying type and arguments by variance |

use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::recursion::RecursionProfile;
use crate::types::{ProducedType, TypeKind};

impl TypeEngine<'_> {
    pub(crate) fn subtype_internal(
        &mut self,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<bool> {
        self.enter(RecursionProfile::SubtypeCheck)?;
        let result = self.subtype_step(a, b);
        self.leave();
        result
    }

    fn subtype_step(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        if a.is_nothing() {
            return Ok(true);
        }
        if b.is_nothing() {
            return Ok(false);
        }
        if let TypeKind::Union(cases) = a.kind() {
            for case in cases {
                if !self.subtype_internal(case, b)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if let TypeKind::Union(cases) = b.kind() {
            for case in cases {
                if self.subtype_internal(a, case)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if let TypeKind::Intersection(members) = b.kind() {
            for member in members {
                if !self.subtype_internal(a, member)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if let TypeKind::Intersection(members) = a.kind() {
            // The principal supertype combines the arguments inherited
            // through every member.
            if let Some(target) = b.declaration() {
                if self.graph.is_class_or_interface(target) {
                    if let Some(principal) = self.get_supertype_internal(a, target)? {
                        if self.subtype_internal(&principal, b)? {
                            return Ok(true);
                        }
                    }
                }
            }
            for member in members {
                if self.subtype_internal(member, b)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if a.is_unknown() || b.is_unknown() {
            return Ok(a.is_unknown() && b.is_unknown());
        }
        let Some(target) = b.declaration() else {
            return Ok(false);
        };
        let Some(supertype) = self.get_supertype_internal(a, target)? else {
            return Ok(false);
        };
        if supertype.is_unknown() {
            return Ok(false);
        }
        let supertype = self.resolve(&supertype)?;
        if !self.qualifying_subtype(&supertype, b)? {
            return Ok(false);
        }
        let parameters = self.graph.type_parameters(target);
        for (i, parameter) in parameters.into_iter().enumerate() {
            let argument = supertype.arguments().get(i).cloned().flatten();
            let other = b.arguments().get(i).cloned().flatten();
            let (Some(argument), Some(other)) = (argument, other) else {
                self.missing_argument(parameter, target);
                return Ok(false);
            };
            let variance = self.graph.variance(parameter);
            let related = if variance.is_covariant() {
                self.subtype_internal(&argument, &other)?
            } else if variance.is_contravariant() {
                self.subtype_internal(&other, &argument)?
            } else {
                self.exactly_internal(&argument, &other)?
            };
            if !related {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The qualifying type of `b` may be an invariant subtype of the type
    /// that declares the member type.
    fn qualifying_subtype(
        &mut self,
        supertype: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<bool> {
        match (supertype.qualifying_type(), b.qualifying_type()) {
            (None, None) => Ok(true),
            (Some(_), None) | (None, Some(_)) => Ok(false),
            (Some(sq), Some(tq)) => {
                let Some(target) = b.declaration() else {
                    return Ok(false);
                };
                if !self.graph.is_member(target) {
                    return self.subtype_internal(sq, tq);
                }
                let Some(container) = self.graph.container(target) else {
                    return Ok(false);
                };
                match self.get_supertype_internal(tq, container)? {
                    Some(declaring) => self.subtype_internal(sq, &declaring),
                    None => Ok(false),
                }
            }
        }
    }

    pub(crate) fn exactly_internal(
        &mut self,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<bool> {
        self.enter(RecursionProfile::SubtypeCheck)?;
        let result = self.exactly_step(a, b);
        self.leave();
        result
    }

    fn exactly_step(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        match (a.kind(), b.kind()) {
            (TypeKind::Nothing, _) => Ok(b.is_nothing()),
            (TypeKind::Union(cases), TypeKind::Union(others)) => {
                if cases.len() != others.len() {
                    return Ok(false);
                }
                for case in cases {
                    if !self.has_exact_match(case, others)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeKind::Union(cases), _) => match cases.as_slice() {
                [single] => self.exactly_internal(single, b),
                _ => Ok(false),
            },
            (TypeKind::Intersection(members), TypeKind::Intersection(others)) => {
                if members.len() != others.len() {
                    return Ok(false);
                }
                for member in members {
                    if !self.intersection_member_matches(a, member, b, others)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeKind::Intersection(members), _) => match members.as_slice() {
                [single] => self.exactly_internal(single, b),
                _ => Ok(false),
            },
            (_, TypeKind::Union(others)) | (_, TypeKind::Intersection(others)) => {
                match others.as_slice() {
                    [single] => self.exactly_internal(a, single),
                    _ => Ok(false),
                }
            }
            (TypeKind::Unknown, _) => Ok(b.is_unknown()),
            (TypeKind::Declared(left), TypeKind::Declared(right)) => {
                if left.declaration != right.declaration {
                    return Ok(false);
                }
                let declaration = left.declaration;
                match (&left.qualifying, &right.qualifying) {
                    (None, None) => {}
                    (Some(_), None) | (None, Some(_)) => return Ok(false),
                    (Some(lq), Some(rq)) => {
                        let Some(container) = self.graph.container(declaration) else {
                            return Ok(false);
                        };
                        let ls = self.get_supertype_internal(lq, container)?;
                        let rs = self.get_supertype_internal(rq, container)?;
                        let (Some(ls), Some(rs)) = (ls, rs) else {
                            return Ok(false);
                        };
                        if !self.exactly_internal(&ls, &rs)? {
                            return Ok(false);
                        }
                    }
                }
                let parameters = self.graph.type_parameters(declaration);
                for (i, parameter) in parameters.into_iter().enumerate() {
                    let argument = left.arguments.get(i).cloned().flatten();
                    let other = right.arguments.get(i).cloned().flatten();
                    let (Some(argument), Some(other)) = (argument, other) else {
                        self.missing_argument(parameter, declaration);
                        return Ok(false);
                    };
                    if !self.exactly_internal(&argument, &other)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypeKind::Declared(_), _) => Ok(false),
        }
    }

    fn has_exact_match(
        &mut self,
        t: &ProducedType,
        candidates: &[ProducedType],
    ) -> RelationResult<bool> {
        for candidate in candidates {
            if self.exactly_internal(t, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `A&Co<B>` is exactly `A&Co<B&Co<A>>` when both sides inherit the
    /// same principal instantiation of `Co`.
    fn intersection_member_matches(
        &mut self,
        a: &ProducedType,
        member: &ProducedType,
        b: &ProducedType,
        others: &[ProducedType],
    ) -> RelationResult<bool> {
        let Some(declaration) = member.declaration() else {
            return self.has_exact_match(member, others);
        };
        for other in others {
            if other.declaration() != Some(declaration) {
                continue;
            }
            if self.exactly_internal(member, other)? {
                return Ok(true);
            }
            let left = self.get_supertype_internal(a, declaration)?;
            let right = self.get_supertype_internal(b, declaration)?;
            if let (Some(left), Some(right)) = (left, right) {
                if self.exactly_internal(&left, &right)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
