//! Variance and decidability checks.
//!
//! Both walk a type's argument tree carrying the variance of the current
//! position as a `(covariant, contravariant)` pair:
//!
//! - a covariant parameter keeps the position
//! - a contravariant parameter flips a variant position and keeps an
//!   invariant one
//! - an invariant parameter makes the position invariant

use crate::def::{DeclId, DeclKind, Variance};
use crate::engine::TypeEngine;
use crate::types::{ProducedType, TypeKind};

fn nested_position(variance: Variance, covariant: bool, contravariant: bool) -> (bool, bool) {
    match variance {
        Variance::Covariant => (covariant, contravariant),
        Variance::Contravariant if covariant || contravariant => (!covariant, !contravariant),
        Variance::Contravariant => (covariant, contravariant),
        Variance::Invariant => (false, false),
    }
}

impl TypeEngine<'_> {
    /// Type parameters of `t` that appear at a position their variance
    /// forbids. References to the parameters of `declaration` itself are
    /// exempt.
    pub fn check_variance(
        &self,
        t: &ProducedType,
        covariant: bool,
        contravariant: bool,
        declaration: DeclId,
    ) -> Vec<DeclId> {
        let mut errors = Vec::new();
        self.collect_variance_errors(t, covariant, contravariant, declaration, &mut errors);
        errors
    }

    fn collect_variance_errors(
        &self,
        t: &ProducedType,
        covariant: bool,
        contravariant: bool,
        declaration: DeclId,
        errors: &mut Vec<DeclId>,
    ) {
        match t.kind() {
            TypeKind::Nothing | TypeKind::Unknown => {}
            TypeKind::Union(types) | TypeKind::Intersection(types) => {
                for member in types {
                    self.collect_variance_errors(member, covariant, contravariant, declaration, errors);
                }
            }
            TypeKind::Declared(declared) => {
                if let Some(DeclKind::TypeParameter {
                    owner, variance, ..
                }) = self.graph.kind(declared.declaration)
                {
                    let ok = owner == declaration
                        || ((covariant || !variance.is_covariant())
                            && (contravariant || !variance.is_contravariant()));
                    if !ok {
                        errors.push(declared.declaration);
                    }
                    return;
                }
                if let Some(qualifying) = &declared.qualifying {
                    self.collect_variance_errors(
                        qualifying,
                        covariant,
                        contravariant,
                        declaration,
                        errors,
                    );
                }
                let parameters = self.graph.type_parameters(declared.declaration);
                for (parameter, argument) in parameters.into_iter().zip(declared.arguments.iter()) {
                    let Some(argument) = argument else {
                        continue;
                    };
                    let (co, contra) =
                        nested_position(self.graph.variance(parameter), covariant, contravariant);
                    self.collect_variance_errors(argument, co, contra, declaration, errors);
                }
            }
        }
    }

    /// Declarations with contravariant parameters that appear at a
    /// non-covariant position of the supertype `t`. The subtype search is
    /// only guaranteed to terminate when this is empty.
    pub fn check_decidability(&self, t: &ProducedType) -> Vec<DeclId> {
        let mut errors = Vec::new();
        let Some(declared) = t.as_declared() else {
            return errors;
        };
        let parameters = self.graph.type_parameters(declared.declaration);
        for (parameter, argument) in parameters.into_iter().zip(declared.arguments.iter()) {
            if let Some(argument) = argument {
                let variance = self.graph.variance(parameter);
                self.collect_undecidable(
                    argument,
                    variance.is_covariant(),
                    variance.is_contravariant(),
                    &mut errors,
                );
            }
        }
        errors
    }

    fn collect_undecidable(
        &self,
        t: &ProducedType,
        covariant: bool,
        contravariant: bool,
        errors: &mut Vec<DeclId>,
    ) {
        match t.kind() {
            TypeKind::Nothing | TypeKind::Unknown => {}
            TypeKind::Union(types) | TypeKind::Intersection(types) => {
                for member in types {
                    self.collect_undecidable(member, covariant, contravariant, errors);
                }
            }
            TypeKind::Declared(declared) => {
                if self.graph.is_type_parameter(declared.declaration) {
                    return;
                }
                let parameters = self.graph.type_parameters(declared.declaration);
                for (i, parameter) in parameters.into_iter().enumerate() {
                    let variance = self.graph.variance(parameter);
                    if !covariant && variance.is_contravariant() {
                        errors.push(declared.declaration);
                    }
                    if let Some(Some(argument)) = declared.arguments.get(i) {
                        let (co, contra) = nested_position(variance, covariant, contravariant);
                        self.collect_undecidable(argument, co, contra, errors);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/variance_tests.rs"]
mod tests;
