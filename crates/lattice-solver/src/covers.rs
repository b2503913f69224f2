//! Exhaustiveness: case unions, `covers` and `minus`.

use crate::canonical::union_from;
use crate::engine::TypeEngine;
use crate::error::RelationResult;
use crate::recursion::RecursionProfile;
use crate::types::{ProducedType, TypeKind};

impl TypeEngine<'_> {
    /// The union of all cases of `t`, recursively reducing enumerated
    /// cases to their own cases. An intersection `(U|V)&B` becomes
    /// `U&B|V&B`.
    pub(crate) fn union_of_cases_internal(
        &mut self,
        t: &ProducedType,
    ) -> RelationResult<ProducedType> {
        self.enter(RecursionProfile::Canonicalization)?;
        let result = self.union_of_cases_step(t);
        self.leave();
        result
    }

    fn union_of_cases_step(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        if let TypeKind::Intersection(members) = t.kind() {
            let mut list = Vec::with_capacity(members.len());
            for member in members {
                let cases = self.union_of_cases_internal(member)?;
                self.add_to_intersection(&mut list, cases)?;
            }
            return self.canonical_intersection(list);
        }
        let Some(cases) = self.case_types(t)? else {
            return Ok(t.clone());
        };
        let mut list = Vec::with_capacity(cases.len());
        for case in &cases {
            let flattened = self.union_of_cases_internal(case)?;
            self.add_to_union(&mut list, flattened)?;
        }
        Ok(union_from(list))
    }

    /// `a` covers `b` when the union of cases of `b` is a subtype of `a`,
    /// or when every case of a union `b` is covered, or when `b` inherits
    /// a covered type.
    pub(crate) fn covers_internal(
        &mut self,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<bool> {
        self.enter(RecursionProfile::SubtypeCheck)?;
        let result = self.covers_step(a, b);
        self.leave();
        result
    }

    fn covers_step(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        let cases = self.union_of_cases_internal(b)?;
        if self.subtype_internal(&cases, a)? {
            return Ok(true);
        }
        match b.kind() {
            TypeKind::Nothing => Ok(true),
            TypeKind::Unknown => Ok(false),
            TypeKind::Union(_) => {
                let flattened = match cases.cases() {
                    Some(flattened) => flattened.to_vec(),
                    None => vec![cases.clone()],
                };
                for case in &flattened {
                    if case == b {
                        return Ok(false);
                    }
                    if !self.covers_internal(a, case)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            TypeKind::Intersection(members) => {
                for member in members {
                    if self.covers_internal(a, member)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TypeKind::Declared(_) => {
                if let Some(extended) = self.internal_extended_type(b) {
                    if self.covers_internal(a, &extended)? {
                        return Ok(true);
                    }
                }
                for satisfied in self.internal_satisfied_types(b) {
                    if self.covers_internal(a, &satisfied)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Remove from `a` every case covered by `b`.
    pub(crate) fn minus_internal(
        &mut self,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<ProducedType> {
        if self.covers_internal(b, a)? {
            return Ok(ProducedType::nothing());
        }
        let cases = self.union_of_cases_internal(a)?;
        let Some(cases) = cases.cases() else {
            return Ok(a.clone());
        };
        let mut list = Vec::with_capacity(cases.len());
        for case in cases {
            let remaining = self.try_minus(case, b)?;
            self.add_to_union(&mut list, remaining)?;
        }
        Ok(union_from(list))
    }
}

#[cfg(test)]
#[path = "../tests/covers_tests.rs"]
mod tests;
