//! Canonical unions and intersections.
//!
//! Unions absorb subtypes of existing cases and intersections absorb
//! supertypes of existing members, so the builders call back into the
//! subtype relation and are fallible.
//!
//! Canonical intersections are distributed over unions:
//! `(A|B)&C` becomes `A&C|B&C`.

use crate::def::{DeclId, DeclarationGraph};
use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::types::{ProducedType, TypeKind};

/// A union over an already canonical case list.
pub(crate) fn union_from(mut cases: Vec<ProducedType>) -> ProducedType {
    match cases.len() {
        0 => ProducedType::nothing(),
        1 => cases.swap_remove(0),
        _ => ProducedType::union_unchecked(cases),
    }
}

/// An intersection over an already canonical member list.
pub(crate) fn intersection_from(
    graph: &DeclarationGraph,
    mut members: Vec<ProducedType>,
) -> ProducedType {
    match members.len() {
        0 => graph.anything_type(),
        1 => members.swap_remove(0),
        _ => ProducedType::intersection_unchecked(members),
    }
}

impl TypeEngine<'_> {
    pub(crate) fn is_anything(&self, t: &ProducedType) -> bool {
        t.declaration() == Some(self.graph.builtins().anything)
    }

    /// Add `t` to a union case list.
    pub(crate) fn add_to_union(
        &mut self,
        list: &mut Vec<ProducedType>,
        t: ProducedType,
    ) -> RelationResult<()> {
        if t.is_nothing() {
            if list.is_empty() {
                list.push(t);
            }
            return Ok(());
        }
        if self.is_anything(&t) {
            list.clear();
            list.push(t);
            return Ok(());
        }
        if let TypeKind::Union(cases) = t.kind() {
            for case in cases {
                self.add_to_union(list, case.clone())?;
            }
            return Ok(());
        }
        if !self.is_well_defined(&t) {
            if !list.contains(&t) {
                list.push(t);
            }
            return Ok(());
        }
        let mut index = 0;
        while index < list.len() {
            let existing = list[index].clone();
            if !self.is_well_defined(&existing) {
                index += 1;
                continue;
            }
            if self.subtype_internal(&t, &existing)? {
                return Ok(());
            }
            if self.subtype_internal(&existing, &t)? {
                list.remove(index);
            } else {
                index += 1;
            }
        }
        list.push(t);
        Ok(())
    }

    /// Add `t` to an intersection member list.
    pub(crate) fn add_to_intersection(
        &mut self,
        list: &mut Vec<ProducedType>,
        t: ProducedType,
    ) -> RelationResult<()> {
        if self.is_anything(&t) {
            if list.is_empty() {
                list.push(t);
            }
            return Ok(());
        }
        if t.is_nothing() {
            list.clear();
            list.push(t);
            return Ok(());
        }
        if let TypeKind::Intersection(members) = t.kind() {
            for member in members {
                self.add_to_intersection(list, member.clone())?;
            }
            return Ok(());
        }
        if !self.is_well_defined(&t) {
            if !list.contains(&t) {
                list.push(t);
            }
            return Ok(());
        }
        let mut index = 0;
        while index < list.len() {
            let existing = list[index].clone();
            if !self.is_well_defined(&existing) {
                index += 1;
                continue;
            }
            if self.subtype_internal(&existing, &t)? {
                return Ok(());
            }
            if self.subtype_internal(&t, &existing)? {
                list.remove(index);
                continue;
            }
            if self.disjoint_classes(&t, &existing) {
                list.clear();
                list.push(ProducedType::nothing());
                return Ok(());
            }
            index += 1;
        }
        list.push(t);
        Ok(())
    }

    /// Two classes neither of which inherits the other have no common
    /// instances.
    fn disjoint_classes(&self, a: &ProducedType, b: &ProducedType) -> bool {
        let (Some(ad), Some(bd)) = (a.declaration(), b.declaration()) else {
            return false;
        };
        let is_class = |d: DeclId| {
            matches!(
                self.graph.kind(d),
                Some(crate::def::DeclKind::Class { .. })
            )
        };
        is_class(ad) && is_class(bd) && !self.graph.inherits(ad, bd) && !self.graph.inherits(bd, ad)
    }

    /// Distribute an intersection over its first union member.
    pub(crate) fn canonical_intersection(
        &mut self,
        members: Vec<ProducedType>,
    ) -> RelationResult<ProducedType> {
        let Some(position) = members.iter().position(ProducedType::is_union) else {
            return Ok(intersection_from(self.graph, members));
        };
        let cases = members[position].cases().map(<[_]>::to_vec).unwrap_or_default();
        let mut union = Vec::with_capacity(cases.len());
        for case in cases {
            let mut list = Vec::with_capacity(members.len());
            for (i, member) in members.iter().enumerate() {
                let next = if i == position { case.clone() } else { member.clone() };
                self.add_to_intersection(&mut list, next)?;
            }
            let distributed = self.canonical_intersection(list)?;
            self.add_to_union(&mut union, distributed)?;
        }
        Ok(union_from(union))
    }

    pub fn try_principal_instantiation(
        &mut self,
        declaration: DeclId,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<ProducedType> {
        let parameters = self.graph.type_parameters(declaration);
        let mut arguments = Vec::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            let left = a.arguments().get(i).cloned().flatten();
            let right = b.arguments().get(i).cloned().flatten();
            let (Some(left), Some(right)) = (left, right) else {
                self.missing_argument(*parameter, declaration);
                return Ok(ProducedType::unknown());
            };
            let variance = self.graph.variance(*parameter);
            let argument = if variance.is_covariant() {
                self.try_intersection_of([left, right])?
            } else if variance.is_contravariant() {
                self.try_union_of([left, right])?
            } else if self.exactly_internal(&left, &right)? {
                left
            } else {
                return Ok(ProducedType::unknown());
            };
            arguments.push(Some(argument));
        }
        let qualifying = match (a.qualifying_type(), b.qualifying_type()) {
            (Some(qa), Some(qb)) if qa != qb => match qa.declaration() {
                Some(outer) if qb.declaration() == Some(outer) => {
                    Some(self.try_principal_instantiation(outer, qa, qb)?)
                }
                _ => Some(qa.clone()),
            },
            (qa, _) => qa.cloned(),
        };
        Ok(ProducedType::declared(declaration, arguments, qualifying))
    }
}

#[cfg(test)]
#[path = "../tests/canonical_tests.rs"]
mod tests;
