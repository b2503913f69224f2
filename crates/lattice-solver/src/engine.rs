//! The type engine: entry point for every relation query.
//!
//! A [`TypeEngine`] borrows the declaration graph, optionally the shared
//! [`SupertypeCache`], and owns the per-caller state: the recursion depth,
//! the alias-resolution memo and the issues recorded so far. One engine is
//! created per unit and phase, so nothing here is shared between workers.
//!
//! ## Two layers
//!
//! Every operation has a fallible `try_*` form that propagates
//! [`RelationError`] with `?`, and an infallible form that downgrades a
//! failure to `false` (or the unknown type) and records a
//! [`RelationIssue`]. Phases use the infallible forms and drain the issues
//! with [`TypeEngine::take_issues`].

use crate::cache::SupertypeCache;
use crate::def::{DeclId, DeclarationGraph};
use crate::error::{RelationError, RelationIssue, RelationResult};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{ProducedType, TypeArgumentMap};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

pub struct TypeEngine<'g> {
    pub(crate) graph: &'g DeclarationGraph,
    pub(crate) cache: Option<&'g SupertypeCache>,
    pub(crate) depth: DepthCounter,
    pub(crate) aliases: FxHashMap<ProducedType, ProducedType>,
    issues: Vec<RelationIssue>,
}

impl<'g> TypeEngine<'g> {
    pub fn new(graph: &'g DeclarationGraph) -> Self {
        TypeEngine {
            graph,
            cache: None,
            depth: DepthCounter::with_profile(RecursionProfile::Canonicalization),
            aliases: FxHashMap::default(),
            issues: Vec::new(),
        }
    }

    pub fn with_cache(graph: &'g DeclarationGraph, cache: &'g SupertypeCache) -> Self {
        TypeEngine {
            cache: Some(cache),
            ..Self::new(graph)
        }
    }

    pub fn graph(&self) -> &'g DeclarationGraph {
        self.graph
    }

    pub fn issues(&self) -> &[RelationIssue] {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<RelationIssue> {
        std::mem::take(&mut self.issues)
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    /// Enter one level of a recursive computation. Pair with [`Self::leave`].
    pub(crate) fn enter(&mut self, profile: RecursionProfile) -> RelationResult<()> {
        if self.depth.enter_bounded(profile.max_depth()) {
            Ok(())
        } else {
            Err(RelationError::undecidable(profile.name()))
        }
    }

    pub(crate) fn leave(&mut self) {
        self.depth.leave();
    }

    pub(crate) fn record(&mut self, error: &RelationError) {
        self.issues.push(RelationIssue::from(error));
    }

    /// Record a missing type argument. The comparison that found it
    /// answers `false`.
    pub(crate) fn missing_argument(&mut self, parameter: DeclId, declaration: DeclId) {
        let error = RelationError::MissingTypeArgument {
            parameter: self.graph.name(parameter).to_string(),
            declaration: self.graph.qualified_name(declaration),
        };
        self.record(&error);
    }

    fn recover<T>(&mut self, result: RelationResult<T>, fallback: impl FnOnce() -> T) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "type relation abandoned");
                self.record(&error);
                fallback()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    /// Structural equality after alias resolution.
    pub fn is_exactly(&mut self, a: &ProducedType, b: &ProducedType) -> bool {
        let result = self.try_is_exactly(a, b);
        self.recover(result, || false)
    }

    pub fn try_is_exactly(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        self.exactly_internal(&a, &b)
    }

    /// Is `a` assignable to `b`?
    pub fn is_subtype_of(&mut self, a: &ProducedType, b: &ProducedType) -> bool {
        let result = self.try_is_subtype_of(a, b);
        self.recover(result, || false)
    }

    pub fn try_is_subtype_of(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        self.subtype_internal(&a, &b)
    }

    pub fn is_supertype_of(&mut self, a: &ProducedType, b: &ProducedType) -> bool {
        self.is_subtype_of(b, a)
    }

    /// The instantiation of `declaration` that `t` is an invariant subtype
    /// of. An undecidable query answers the unknown type.
    pub fn get_supertype(&mut self, t: &ProducedType, declaration: DeclId) -> Option<ProducedType> {
        let result = self.try_get_supertype(t, declaration);
        self.recover(result, || Some(ProducedType::unknown()))
    }

    pub fn try_get_supertype(
        &mut self,
        t: &ProducedType,
        declaration: DeclId,
    ) -> RelationResult<Option<ProducedType>> {
        let t = self.resolve(t)?;
        self.get_supertype_internal(&t, declaration)
    }

    /// The supertype of `t` that declares a member called `name`.
    ///
    /// Ambiguous instantiations are recovered by searching the union of
    /// the candidates.
    pub fn get_declaring_supertype(&mut self, t: &ProducedType, name: &str) -> Option<ProducedType> {
        let result = self.try_get_declaring_supertype(t, name);
        self.recover(result, || Some(ProducedType::unknown()))
    }

    pub fn try_get_declaring_supertype(
        &mut self,
        t: &ProducedType,
        name: &str,
    ) -> RelationResult<Option<ProducedType>> {
        let t = self.resolve(t)?;
        self.search(&t, &crate::supertype::Criteria::DeclaresMember(name.into()))
    }

    /// Every supertype of `t`, without duplicates.
    pub fn supertypes(&mut self, t: &ProducedType) -> Vec<ProducedType> {
        let result = self.try_supertypes(t);
        self.recover(result, Vec::new)
    }

    pub fn try_supertypes(&mut self, t: &ProducedType) -> RelationResult<Vec<ProducedType>> {
        let t = self.resolve(t)?;
        self.supertypes_internal(&t)
    }

    /// Does `a` cover every case of `b`?
    pub fn covers(&mut self, a: &ProducedType, b: &ProducedType) -> bool {
        let result = self.try_covers(a, b);
        self.recover(result, || false)
    }

    pub fn try_covers(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<bool> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        self.covers_internal(&a, &b)
    }

    /// The union of the cases of `t`, recursively flattened.
    pub fn union_of_cases(&mut self, t: &ProducedType) -> ProducedType {
        let result = self.try_union_of_cases(t);
        self.recover(result, || t.clone())
    }

    pub fn try_union_of_cases(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        let t = self.resolve(t)?;
        self.union_of_cases_internal(&t)
    }

    /// `a` with every case covered by `b` removed.
    pub fn minus(&mut self, a: &ProducedType, b: &ProducedType) -> ProducedType {
        let result = self.try_minus(a, b);
        self.recover(result, || a.clone())
    }

    pub fn try_minus(&mut self, a: &ProducedType, b: &ProducedType) -> RelationResult<ProducedType> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        self.minus_internal(&a, &b)
    }

    /// `a` with the union cases that are subtypes of `b` removed, without
    /// expanding enumerated cases.
    pub fn shallow_minus(&mut self, a: &ProducedType, b: &ProducedType) -> ProducedType {
        let result = self.try_shallow_minus(a, b);
        self.recover(result, || a.clone())
    }

    pub fn try_shallow_minus(
        &mut self,
        a: &ProducedType,
        b: &ProducedType,
    ) -> RelationResult<ProducedType> {
        if self.try_is_subtype_of(a, b)? {
            return Ok(ProducedType::nothing());
        }
        let Some(cases) = a.cases() else {
            return Ok(a.clone());
        };
        let mut list = Vec::with_capacity(cases.len());
        for case in cases {
            let remaining = self.try_shallow_minus(case, b)?;
            self.add_to_union(&mut list, remaining)?;
        }
        Ok(crate::canonical::union_from(list))
    }

    /// `t` without `Null`.
    pub fn eliminate_null(&mut self, t: &ProducedType) -> ProducedType {
        let result = self.try_eliminate_null(t);
        self.recover(result, || t.clone())
    }

    pub fn try_eliminate_null(&mut self, t: &ProducedType) -> RelationResult<ProducedType> {
        let null = self.graph.builtins().null;
        if self.try_get_supertype(t, null)?.is_some() {
            return Ok(ProducedType::nothing());
        }
        let Some(cases) = t.cases() else {
            return Ok(t.clone());
        };
        let mut list = Vec::with_capacity(cases.len());
        for case in cases {
            let remaining = self.try_eliminate_null(case)?;
            self.add_to_union(&mut list, remaining)?;
        }
        Ok(crate::canonical::union_from(list))
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn resolve_aliases(&mut self, t: &ProducedType) -> ProducedType {
        let result = self.resolve(t);
        self.recover(result, ProducedType::unknown)
    }

    pub fn substitute(&mut self, t: &ProducedType, bindings: &TypeArgumentMap) -> ProducedType {
        let result = self.try_substitute(t, bindings);
        self.recover(result, || t.clone())
    }

    /// Substitution that keeps duplicate union cases and leaves
    /// intersections uncanonicalized. Never fails.
    pub fn substitute_internal(&self, t: &ProducedType, bindings: &TypeArgumentMap) -> ProducedType {
        self.substitute_raw(t, bindings)
    }

    /// Canonical union of `types`, after resolving aliases.
    pub fn union_of(&mut self, types: impl IntoIterator<Item = ProducedType>) -> ProducedType {
        let result = self.try_union_of(types);
        self.recover(result, ProducedType::unknown)
    }

    pub fn try_union_of(
        &mut self,
        types: impl IntoIterator<Item = ProducedType>,
    ) -> RelationResult<ProducedType> {
        let mut list = Vec::new();
        for t in types {
            let t = self.resolve(&t)?;
            self.add_to_union(&mut list, t)?;
        }
        Ok(crate::canonical::union_from(list))
    }

    /// Canonical intersection of `types`, distributed over unions.
    pub fn intersection_of(&mut self, types: impl IntoIterator<Item = ProducedType>) -> ProducedType {
        let result = self.try_intersection_of(types);
        self.recover(result, ProducedType::unknown)
    }

    pub fn try_intersection_of(
        &mut self,
        types: impl IntoIterator<Item = ProducedType>,
    ) -> RelationResult<ProducedType> {
        let mut list = Vec::new();
        for t in types {
            let t = self.resolve(&t)?;
            self.add_to_intersection(&mut list, t)?;
        }
        self.canonical_intersection(list)
    }

    /// Merge two instantiations of `declaration` into their most specific
    /// common subtype.
    pub fn principal_instantiation(
        &mut self,
        declaration: DeclId,
        a: &ProducedType,
        b: &ProducedType,
    ) -> ProducedType {
        let result = self.try_principal_instantiation(declaration, a, b);
        self.recover(result, ProducedType::unknown)
    }

    // -------------------------------------------------------------------------
    // Structural checks
    // -------------------------------------------------------------------------

    /// False if a non-defaulted type argument is missing anywhere.
    pub fn is_well_defined(&self, t: &ProducedType) -> bool {
        let Some(declared) = t.as_declared() else {
            return true;
        };
        if let Some(qualifying) = &declared.qualifying {
            if !self.is_well_defined(qualifying) {
                return false;
            }
        }
        self.graph
            .type_parameters(declared.declaration)
            .into_iter()
            .enumerate()
            .all(|(i, parameter)| match declared.arguments.get(i).and_then(Option::as_ref) {
                Some(argument) => self.is_well_defined(argument),
                None => self.graph.is_defaulted(parameter),
            })
    }

    /// The cycle through `t`'s alias declarations, or empty.
    pub fn is_recursive_type_alias_definition(
        &self,
        t: &ProducedType,
        visited: &FxHashSet<DeclId>,
    ) -> Vec<DeclId> {
        crate::alias::recursive_alias_definition(self.graph, t, visited)
    }

    /// The inheritance cycle through `t`'s declaration, or empty.
    pub fn is_recursive_raw_type_definition(
        &self,
        t: &ProducedType,
        visited: &FxHashSet<DeclId>,
    ) -> Vec<DeclId> {
        crate::alias::recursive_raw_definition(self.graph, t, visited)
    }
}
