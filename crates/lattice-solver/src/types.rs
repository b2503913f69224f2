//! Produced types.
//!
//! A [`ProducedType`] is an immutable, `Arc`-shared value: a declaration
//! applied to type arguments and an optional qualifying (enclosing) type,
//! or one of the synthetic shapes `Nothing`, `Unknown`, union and
//! intersection. The structural hash is computed once at construction.
//!
//! Equality and hashing are structural and ignore the underlying-type
//! marker and the raw flag.

use crate::def::{DeclId, DeclarationGraph};
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

/// Type arguments, positionally aligned with the declaration's type
/// parameters. `None` marks an argument that could not be resolved.
pub type TypeArguments = SmallVec<[Option<ProducedType>; 2]>;

/// Bindings from type parameter to argument.
pub type TypeArgumentMap = FxHashMap<DeclId, ProducedType>;

static NOTHING: LazyLock<ProducedType> =
    LazyLock::new(|| ProducedType::from_kind(TypeKind::Nothing));
static UNKNOWN: LazyLock<ProducedType> =
    LazyLock::new(|| ProducedType::from_kind(TypeKind::Unknown));

#[derive(Clone)]
pub struct ProducedType(Arc<TypeNode>);

struct TypeNode {
    kind: TypeKind,
    hash: u64,
}

/// Shape of a produced type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// The bottom type.
    Nothing,
    /// Result of an unresolvable query.
    Unknown,
    Union(Vec<ProducedType>),
    Intersection(Vec<ProducedType>),
    Declared(DeclaredType),
}

/// A declaration applied to arguments.
#[derive(Clone, Debug)]
pub struct DeclaredType {
    pub declaration: DeclId,
    pub arguments: TypeArguments,
    pub qualifying: Option<ProducedType>,
    /// Opaque interop marker. Types carrying one are never cached.
    pub underlying: Option<Arc<str>>,
    /// Used without argument checking.
    pub raw: bool,
}

impl PartialEq for DeclaredType {
    fn eq(&self, other: &Self) -> bool {
        self.declaration == other.declaration
            && self.arguments == other.arguments
            && self.qualifying == other.qualifying
    }
}

impl Eq for DeclaredType {}

impl ProducedType {
    fn from_kind(kind: TypeKind) -> Self {
        let hash = structural_hash(&kind);
        ProducedType(Arc::new(TypeNode { kind, hash }))
    }

    /// A declaration with no arguments and no qualifying type.
    pub fn of(declaration: DeclId) -> Self {
        Self::declared(declaration, TypeArguments::new(), None)
    }

    pub fn declared(
        declaration: DeclId,
        arguments: impl IntoIterator<Item = Option<ProducedType>>,
        qualifying: Option<ProducedType>,
    ) -> Self {
        Self::from_kind(TypeKind::Declared(DeclaredType {
            declaration,
            arguments: arguments.into_iter().collect(),
            qualifying,
            underlying: None,
            raw: false,
        }))
    }

    /// A toplevel declaration applied to fully resolved arguments.
    pub fn applied(
        declaration: DeclId,
        arguments: impl IntoIterator<Item = ProducedType>,
    ) -> Self {
        Self::declared(declaration, arguments.into_iter().map(Some), None)
    }

    pub fn nothing() -> Self {
        NOTHING.clone()
    }

    pub fn unknown() -> Self {
        UNKNOWN.clone()
    }

    /// A union over `cases` exactly as given, without canonicalization.
    pub fn union_unchecked(cases: Vec<ProducedType>) -> Self {
        Self::from_kind(TypeKind::Union(cases))
    }

    /// An intersection over `members` exactly as given, without
    /// canonicalization.
    pub fn intersection_unchecked(members: Vec<ProducedType>) -> Self {
        Self::from_kind(TypeKind::Intersection(members))
    }

    pub(crate) fn from_declared(declared: DeclaredType) -> Self {
        Self::from_kind(TypeKind::Declared(declared))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    pub fn as_declared(&self) -> Option<&DeclaredType> {
        match &self.0.kind {
            TypeKind::Declared(d) => Some(d),
            _ => None,
        }
    }

    pub fn declaration(&self) -> Option<DeclId> {
        self.as_declared().map(|d| d.declaration)
    }

    pub fn arguments(&self) -> &[Option<ProducedType>] {
        self.as_declared().map_or(&[], |d| d.arguments.as_slice())
    }

    pub fn qualifying_type(&self) -> Option<&ProducedType> {
        self.as_declared().and_then(|d| d.qualifying.as_ref())
    }

    pub fn underlying_type(&self) -> Option<&str> {
        self.as_declared().and_then(|d| d.underlying.as_deref())
    }

    pub fn is_raw(&self) -> bool {
        self.as_declared().is_some_and(|d| d.raw)
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self.0.kind, TypeKind::Nothing)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.0.kind, TypeKind::Unknown)
    }

    pub fn is_union(&self) -> bool {
        matches!(self.0.kind, TypeKind::Union(_))
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self.0.kind, TypeKind::Intersection(_))
    }

    /// Cases of a union.
    pub fn cases(&self) -> Option<&[ProducedType]> {
        match &self.0.kind {
            TypeKind::Union(cases) => Some(cases),
            _ => None,
        }
    }

    /// Members of an intersection.
    pub fn members(&self) -> Option<&[ProducedType]> {
        match &self.0.kind {
            TypeKind::Intersection(members) => Some(members),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Derived forms
    // -------------------------------------------------------------------------

    pub fn with_underlying_type(&self, marker: impl Into<Arc<str>>) -> Self {
        match self.as_declared() {
            Some(d) => Self::from_declared(DeclaredType {
                underlying: Some(marker.into()),
                ..d.clone()
            }),
            None => self.clone(),
        }
    }

    /// The same type without its own underlying marker.
    pub fn without_underlying_type(&self) -> Self {
        match self.as_declared() {
            Some(d) if d.underlying.is_some() => Self::from_declared(DeclaredType {
                underlying: None,
                ..d.clone()
            }),
            _ => self.clone(),
        }
    }

    pub fn as_raw(&self) -> Self {
        match self.as_declared() {
            Some(d) if !d.raw => Self::from_declared(DeclaredType {
                raw: true,
                ..d.clone()
            }),
            _ => self.clone(),
        }
    }

    /// Does an underlying marker appear anywhere in the type tree?
    pub fn has_underlying_type(&self) -> bool {
        self.any_component(&|t| t.underlying_type().is_some())
    }

    pub fn contains_unknowns(&self) -> bool {
        self.any_component(&ProducedType::is_unknown)
    }

    pub fn contains_declaration(&self, declaration: DeclId) -> bool {
        self.any_component(&|t| t.declaration() == Some(declaration))
    }

    pub fn contains_type_parameters(&self, graph: &DeclarationGraph) -> bool {
        self.any_component(&|t| t.declaration().is_some_and(|d| graph.is_type_parameter(d)))
    }

    fn any_component(&self, predicate: &dyn Fn(&ProducedType) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match &self.0.kind {
            TypeKind::Nothing | TypeKind::Unknown => false,
            TypeKind::Union(types) | TypeKind::Intersection(types) => {
                types.iter().any(|t| t.any_component(predicate))
            }
            TypeKind::Declared(d) => {
                d.arguments
                    .iter()
                    .flatten()
                    .any(|t| t.any_component(predicate))
                    || d.qualifying
                        .as_ref()
                        .is_some_and(|q| q.any_component(predicate))
            }
        }
    }

    /// Bindings of the declaration's own type parameters, plus those of
    /// the qualifying type.
    pub fn type_argument_map(&self, graph: &DeclarationGraph) -> TypeArgumentMap {
        let mut map = TypeArgumentMap::default();
        self.collect_arguments(graph, &mut map);
        map
    }

    fn collect_arguments(&self, graph: &DeclarationGraph, map: &mut TypeArgumentMap) {
        let Some(d) = self.as_declared() else {
            return;
        };
        if let Some(qualifying) = &d.qualifying {
            qualifying.collect_arguments(graph, map);
        }
        for (parameter, argument) in graph
            .type_parameters(d.declaration)
            .into_iter()
            .zip(d.arguments.iter())
        {
            if let Some(argument) = argument {
                map.insert(parameter, argument.clone());
            }
        }
    }
}

fn structural_hash(kind: &TypeKind) -> u64 {
    let mut hasher = FxHasher::default();
    match kind {
        TypeKind::Nothing => 0u8.hash(&mut hasher),
        TypeKind::Unknown => 1u8.hash(&mut hasher),
        TypeKind::Union(cases) => {
            2u8.hash(&mut hasher);
            for case in cases {
                case.0.hash.hash(&mut hasher);
            }
        }
        TypeKind::Intersection(members) => {
            3u8.hash(&mut hasher);
            for member in members {
                member.0.hash.hash(&mut hasher);
            }
        }
        TypeKind::Declared(d) => {
            4u8.hash(&mut hasher);
            d.declaration.hash(&mut hasher);
            for argument in &d.arguments {
                argument.as_ref().map(|a| a.0.hash).hash(&mut hasher);
            }
            d.qualifying.as_ref().map(|q| q.0.hash).hash(&mut hasher);
        }
    }
    hasher.finish()
}

impl PartialEq for ProducedType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for ProducedType {}

impl Hash for ProducedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for ProducedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            TypeKind::Nothing => f.write_str("Nothing"),
            TypeKind::Unknown => f.write_str("Unknown"),
            TypeKind::Union(cases) => f.debug_tuple("Union").field(cases).finish(),
            TypeKind::Intersection(members) => {
                f.debug_tuple("Intersection").field(members).finish()
            }
            TypeKind::Declared(d) => {
                write!(f, "#{}", d.declaration.0)?;
                if !d.arguments.is_empty() {
                    f.debug_list().entries(d.arguments.iter()).finish()?;
                }
                if let Some(q) = &d.qualifying {
                    write!(f, " in {q:?}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
