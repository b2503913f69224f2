//! Declaration identifiers and the declaration graph.
//!
//! Every named type or member is interned once in a [`DeclarationGraph`] and
//! referred to by a [`DeclId`] everywhere else. Identity is the
//! [`DeclKey`] (qualified name for toplevel declarations, container plus
//! local name for nested ones), so two scans of the same source produce the
//! same id instead of two structurally-equal declarations.
//!
//! ## Mutation
//!
//! Declarations are created during declaration scanning and their edges are
//! filled in during wiring and type scanning. After that the graph is
//! read-only apart from [`DeclarationGraph::break_supertype`], which the
//! refinement phase uses to cut edges it has reported as erroneous.

use crate::types::ProducedType;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lattice_common::limits::MAX_SUPERTYPE_CHECK_DEPTH;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Name of the package holding the builtin declarations.
pub const LANGUAGE_PACKAGE: &str = "lang";

// =============================================================================
// DeclId
// =============================================================================

/// Interned declaration handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    /// Sentinel value, never allocated.
    pub const NONE: Self = Self(0);

    /// First valid `DeclId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Identity of a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKey {
    /// `package::Name`
    Toplevel { qualified_name: Arc<str> },
    /// A nested declaration, type parameter, or member. `overload`
    /// distinguishes same-name overloads in one container.
    Member {
        container: DeclId,
        name: Arc<str>,
        overload: u32,
    },
}

impl DeclKey {
    pub fn toplevel(package: &str, name: &str) -> Self {
        DeclKey::Toplevel {
            qualified_name: qualify(package, name).into(),
        }
    }

    pub fn member(container: DeclId, name: &str) -> Self {
        DeclKey::Member {
            container,
            name: name.into(),
            overload: 0,
        }
    }

    pub fn overload(container: DeclId, name: &str, overload: u32) -> Self {
        DeclKey::Member {
            container,
            name: name.into(),
            overload,
        }
    }
}

pub fn qualify(package: &str, name: &str) -> String {
    format!("{package}::{name}")
}

// =============================================================================
// DeclKind
// =============================================================================

/// Variance of a type parameter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variance {
    #[serde(alias = "out")]
    Covariant,
    #[serde(alias = "in")]
    Contravariant,
    #[default]
    Invariant,
}

impl Variance {
    pub const fn is_covariant(self) -> bool {
        matches!(self, Variance::Covariant)
    }

    pub const fn is_contravariant(self) -> bool {
        matches!(self, Variance::Contravariant)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Variance::Covariant => "covariant",
            Variance::Contravariant => "contravariant",
            Variance::Invariant => "invariant",
        }
    }
}

/// The three alias forms. The aliased type is stored as the alias's
/// extended type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasForm {
    Type,
    Class,
    Interface,
}

/// Kind of declaration.
///
/// Union, intersection, `Nothing` and the unknown type are never declared;
/// they exist only as shapes of [`ProducedType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class {
        is_abstract: bool,
    },
    Interface,
    TypeParameter {
        owner: DeclId,
        variance: Variance,
        defaulted: bool,
    },
    Alias(AliasForm),
    Function,
    Value,
}

impl DeclKind {
    pub const fn is_class(self) -> bool {
        matches!(
            self,
            DeclKind::Class { .. } | DeclKind::Alias(AliasForm::Class)
        )
    }

    pub const fn is_interface(self) -> bool {
        matches!(
            self,
            DeclKind::Interface | DeclKind::Alias(AliasForm::Interface)
        )
    }

    pub const fn is_class_or_interface(self) -> bool {
        self.is_class() || self.is_interface()
    }

    pub const fn is_type_declaration(self) -> bool {
        !matches!(self, DeclKind::Function | DeclKind::Value)
    }

    pub const fn is_alias(self) -> bool {
        matches!(self, DeclKind::Alias(_))
    }

    pub const fn is_type_parameter(self) -> bool {
        matches!(self, DeclKind::TypeParameter { .. })
    }
}

// =============================================================================
// Declaration
// =============================================================================

/// A declared type or member.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub name: Arc<str>,
    pub kind: DeclKind,
    pub package: Arc<str>,
    pub container: Option<DeclId>,
    /// Path of the unit that declared it; `None` for builtins.
    pub origin: Option<Arc<str>>,
    pub shared: bool,
    pub type_parameters: Vec<DeclId>,
    pub members: Vec<DeclId>,

    // Declaration-level edges, set while wiring.
    pub extended_decl: Option<DeclId>,
    pub satisfied_decls: Vec<DeclId>,

    // Produced-type edges, set while scanning type declarations.
    pub extended_type: Option<ProducedType>,
    pub satisfied_types: Vec<ProducedType>,
    pub case_types: Option<Vec<ProducedType>>,
    pub broken_supertypes: Vec<ProducedType>,

    // Member signature: parameter types and the return type of a function,
    // or the type of a value.
    pub parameters: Vec<ProducedType>,
    pub sequenced: bool,
    pub value_type: Option<ProducedType>,
}

impl Declaration {
    pub fn new(name: impl Into<Arc<str>>, kind: DeclKind) -> Self {
        Declaration {
            name: name.into(),
            kind,
            package: LANGUAGE_PACKAGE.into(),
            container: None,
            origin: None,
            shared: true,
            type_parameters: Vec::new(),
            members: Vec::new(),
            extended_decl: None,
            satisfied_decls: Vec::new(),
            extended_type: None,
            satisfied_types: Vec::new(),
            case_types: None,
            broken_supertypes: Vec::new(),
            parameters: Vec::new(),
            sequenced: false,
            value_type: None,
        }
    }

    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DeclKind::Class { is_abstract: false })
    }

    pub fn abstract_class(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DeclKind::Class { is_abstract: true })
    }

    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DeclKind::Interface)
    }

    pub fn alias(name: impl Into<Arc<str>>, form: AliasForm) -> Self {
        Self::new(name, DeclKind::Alias(form))
    }

    pub fn type_parameter(
        name: impl Into<Arc<str>>,
        owner: DeclId,
        variance: Variance,
        defaulted: bool,
    ) -> Self {
        Self::new(
            name,
            DeclKind::TypeParameter {
                owner,
                variance,
                defaulted,
            },
        )
        .with_container(owner)
    }

    pub fn function(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DeclKind::Function)
    }

    pub fn value(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DeclKind::Value)
    }

    pub fn in_package(mut self, package: impl Into<Arc<str>>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_container(mut self, container: DeclId) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    pub fn with_sequenced(mut self, sequenced: bool) -> Self {
        self.sequenced = sequenced;
        self
    }

    /// Supertype edges that have not been cut.
    pub fn supertypes(&self) -> impl Iterator<Item = &ProducedType> {
        self.extended_type.iter().chain(self.satisfied_types.iter())
    }
}

/// Ids of the builtin declarations registered by [`DeclarationGraph::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Builtins {
    pub anything: DeclId,
    pub object: DeclId,
    pub null: DeclId,
}

// =============================================================================
// DeclarationGraph
// =============================================================================

/// Concurrent store of every declaration in a batch.
///
/// Reads clone the requested field out of the map; no shard guard is held
/// across a call back into the graph.
pub struct DeclarationGraph {
    declarations: DashMap<DeclId, Declaration>,
    keys: DashMap<DeclKey, DeclId>,
    next_id: AtomicU32,
    builtins: Builtins,
}

impl Default for DeclarationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationGraph {
    /// Create a graph holding the builtin `Anything`, `Object` and `Null`.
    pub fn new() -> Self {
        let mut graph = DeclarationGraph {
            declarations: DashMap::new(),
            keys: DashMap::new(),
            next_id: AtomicU32::new(DeclId::FIRST_VALID),
            builtins: Builtins {
                anything: DeclId::NONE,
                object: DeclId::NONE,
                null: DeclId::NONE,
            },
        };
        let anything = graph.declare(
            DeclKey::toplevel(LANGUAGE_PACKAGE, "Anything"),
            Declaration::abstract_class("Anything"),
        );
        let object = graph.declare(
            DeclKey::toplevel(LANGUAGE_PACKAGE, "Object"),
            Declaration::abstract_class("Object"),
        );
        let null = graph.declare(
            DeclKey::toplevel(LANGUAGE_PACKAGE, "Null"),
            Declaration::abstract_class("Null"),
        );
        for id in [object, null] {
            graph.set_extended_type_declaration(id, anything);
            graph.set_extended_type(id, ProducedType::of(anything));
        }
        graph.set_case_types(
            anything,
            vec![ProducedType::of(object), ProducedType::of(null)],
        );
        graph.builtins = Builtins {
            anything,
            object,
            null,
        };
        graph
    }

    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    pub fn anything_type(&self) -> ProducedType {
        ProducedType::of(self.builtins.anything)
    }

    pub fn object_type(&self) -> ProducedType {
        ProducedType::of(self.builtins.object)
    }

    pub fn null_type(&self) -> ProducedType {
        ProducedType::of(self.builtins.null)
    }

    fn allocate(&self) -> DeclId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(allocated_decl_id = id, "DeclarationGraph::allocate");
        DeclId(id)
    }

    /// Intern a declaration under `key`.
    ///
    /// Returns the existing id when the key was already declared; the new
    /// `declaration` is dropped in that case.
    pub fn declare(&self, key: DeclKey, declaration: Declaration) -> DeclId {
        match self.keys.entry(key) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let id = self.allocate();
                trace!(
                    decl_id = id.0,
                    name = %declaration.name,
                    kind = ?declaration.kind,
                    "DeclarationGraph::declare"
                );
                self.declarations.insert(id, declaration);
                slot.insert(id);
                id
            }
        }
    }

    pub fn lookup(&self, key: &DeclKey) -> Option<DeclId> {
        self.keys.get(key).map(|r| *r)
    }

    pub fn lookup_toplevel(&self, package: &str, name: &str) -> Option<DeclId> {
        self.lookup(&DeclKey::toplevel(package, name))
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.declarations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Run `f` against a declaration.
    ///
    /// `f` must not call back into the graph.
    pub fn with<R>(&self, id: DeclId, f: impl FnOnce(&Declaration) -> R) -> Option<R> {
        self.declarations.get(&id).map(|r| f(&r))
    }

    fn update(&self, id: DeclId, f: impl FnOnce(&mut Declaration)) {
        if let Some(mut entry) = self.declarations.get_mut(&id) {
            f(&mut entry);
        }
    }

    pub fn get(&self, id: DeclId) -> Option<Declaration> {
        self.with(id, Declaration::clone)
    }

    pub fn name(&self, id: DeclId) -> Arc<str> {
        self.with(id, |d| d.name.clone())
            .unwrap_or_else(|| Arc::from("<unknown>"))
    }

    pub fn kind(&self, id: DeclId) -> Option<DeclKind> {
        self.with(id, |d| d.kind)
    }

    pub fn container(&self, id: DeclId) -> Option<DeclId> {
        self.with(id, |d| d.container).flatten()
    }

    pub fn package(&self, id: DeclId) -> Option<Arc<str>> {
        self.with(id, |d| d.package.clone())
    }

    pub fn type_parameters(&self, id: DeclId) -> Vec<DeclId> {
        self.with(id, |d| d.type_parameters.clone())
            .unwrap_or_default()
    }

    pub fn members(&self, id: DeclId) -> Vec<DeclId> {
        self.with(id, |d| d.members.clone()).unwrap_or_default()
    }

    pub fn extended_decl(&self, id: DeclId) -> Option<DeclId> {
        self.with(id, |d| d.extended_decl).flatten()
    }

    pub fn satisfied_decls(&self, id: DeclId) -> Vec<DeclId> {
        self.with(id, |d| d.satisfied_decls.clone())
            .unwrap_or_default()
    }

    pub fn extended_type(&self, id: DeclId) -> Option<ProducedType> {
        self.with(id, |d| d.extended_type.clone()).flatten()
    }

    pub fn satisfied_types(&self, id: DeclId) -> Vec<ProducedType> {
        self.with(id, |d| d.satisfied_types.clone())
            .unwrap_or_default()
    }

    pub fn case_types(&self, id: DeclId) -> Option<Vec<ProducedType>> {
        self.with(id, |d| d.case_types.clone()).flatten()
    }

    pub fn broken_supertypes(&self, id: DeclId) -> Vec<ProducedType> {
        self.with(id, |d| d.broken_supertypes.clone())
            .unwrap_or_default()
    }

    /// Variance of a type parameter; invariant for anything else.
    pub fn variance(&self, id: DeclId) -> Variance {
        match self.kind(id) {
            Some(DeclKind::TypeParameter { variance, .. }) => variance,
            _ => Variance::Invariant,
        }
    }

    pub fn is_defaulted(&self, id: DeclId) -> bool {
        matches!(
            self.kind(id),
            Some(DeclKind::TypeParameter {
                defaulted: true,
                ..
            })
        )
    }

    pub fn is_type_parameter(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_type_parameter)
    }

    pub fn is_alias(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_alias)
    }

    pub fn is_class(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_class)
    }

    pub fn is_class_or_interface(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_class_or_interface)
    }

    pub fn is_toplevel(&self, id: DeclId) -> bool {
        self.container(id).is_none()
    }

    /// A member type: nested directly inside a class or interface.
    pub fn is_member(&self, id: DeclId) -> bool {
        self.container(id)
            .is_some_and(|c| self.is_class_or_interface(c))
    }

    /// `package::Outer.Inner` style name.
    pub fn qualified_name(&self, id: DeclId) -> String {
        match self.with(id, |d| (d.container, d.package.clone(), d.name.clone())) {
            Some((Some(container), _, name)) => {
                format!("{}.{}", self.qualified_name(container), name)
            }
            Some((None, package, name)) => qualify(&package, &name),
            None => "<unknown>".to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add `member` to `container`'s member list. Re-adding is a no-op.
    pub fn add_member(&self, container: DeclId, member: DeclId) {
        self.update(container, |d| {
            if !d.members.contains(&member) {
                d.members.push(member);
            }
        });
    }

    pub fn set_type_parameters(&self, id: DeclId, parameters: Vec<DeclId>) {
        self.update(id, |d| d.type_parameters = parameters);
    }

    pub fn set_extended_type_declaration(&self, id: DeclId, extended: DeclId) {
        self.update(id, |d| d.extended_decl = Some(extended));
    }

    pub fn add_satisfied_type_declaration(&self, id: DeclId, satisfied: DeclId) {
        self.update(id, |d| {
            if !d.satisfied_decls.contains(&satisfied) {
                d.satisfied_decls.push(satisfied);
            }
        });
    }

    pub fn set_extended_type(&self, id: DeclId, extended: ProducedType) {
        self.update(id, |d| d.extended_type = Some(extended));
    }

    pub fn add_satisfied_type(&self, id: DeclId, satisfied: ProducedType) {
        self.update(id, |d| d.satisfied_types.push(satisfied));
    }

    pub fn set_case_types(&self, id: DeclId, cases: Vec<ProducedType>) {
        self.update(id, |d| d.case_types = Some(cases));
    }

    /// Set the parameter types and return (or value) type of a member.
    pub fn set_signature(
        &self,
        id: DeclId,
        parameters: Vec<ProducedType>,
        value_type: Option<ProducedType>,
    ) {
        self.update(id, |d| {
            d.parameters = parameters;
            d.value_type = value_type;
        });
    }

    /// Cut a supertype edge reported as erroneous.
    ///
    /// The edge is moved to `broken_supertypes`, and the matching
    /// declaration-level edge is dropped so the supertype pre-check agrees
    /// with the search.
    pub fn break_supertype(&self, id: DeclId, supertype: &ProducedType) {
        let target = supertype.declaration();
        self.update(id, |d| {
            let mut cut = false;
            if d.extended_type.as_ref() == Some(supertype) {
                d.extended_type = None;
                cut = true;
            }
            let before = d.satisfied_types.len();
            d.satisfied_types.retain(|t| t != supertype);
            cut |= d.satisfied_types.len() != before;
            if !cut {
                return;
            }
            if let Some(target) = target {
                if d.extended_decl == Some(target) {
                    d.extended_decl = None;
                }
                d.satisfied_decls.retain(|s| *s != target);
            }
            d.broken_supertypes.push(supertype.clone());
        });
        trace!(decl_id = id.0, "DeclarationGraph::break_supertype");
    }

    // -------------------------------------------------------------------------
    // Declaration-level queries
    // -------------------------------------------------------------------------

    /// Does `id` reach `target` through extended or satisfied declarations?
    pub fn inherits(&self, id: DeclId, target: DeclId) -> bool {
        let mut visited = FxHashSet::default();
        self.inherits_within(id, target, 0, &mut visited)
    }

    fn inherits_within(
        &self,
        id: DeclId,
        target: DeclId,
        depth: u32,
        visited: &mut FxHashSet<DeclId>,
    ) -> bool {
        if id == target {
            return true;
        }
        if depth > MAX_SUPERTYPE_CHECK_DEPTH || !visited.insert(id) {
            return false;
        }
        let Some((extended, satisfied)) =
            self.with(id, |d| (d.extended_decl, d.satisfied_decls.clone()))
        else {
            return false;
        };
        extended
            .into_iter()
            .chain(satisfied)
            .any(|next| self.inherits_within(next, target, depth + 1, visited))
    }

    /// Direct members of `id` named `name`, in declaration order.
    pub fn direct_members_named(&self, id: DeclId, name: &str) -> Vec<DeclId> {
        self.members(id)
            .into_iter()
            .filter(|m| self.with(*m, |d| &*d.name == name).unwrap_or(false))
            .collect()
    }

    /// All declarations whose origin is `unit_path`, in id order.
    pub fn declarations_of(&self, unit_path: &str) -> Vec<DeclId> {
        let mut ids: Vec<DeclId> = self
            .declarations
            .iter()
            .filter(|entry| entry.origin.as_deref() == Some(unit_path))
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    /// Every declaration id, in id order.
    pub fn ids(&self) -> Vec<DeclId> {
        let mut ids: Vec<DeclId> = self.declarations.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
