//! Declaration Graph and Produced Type Engine
//!
//! This crate owns the type model of the semantic core:
//!
//! - **Declaration graph**: every type and member interned once and
//!   referred to by `DeclId`, shared by all workers
//! - **Produced types**: immutable `Arc`-shared applications of
//!   declarations to arguments, plus union, intersection, `Nothing` and
//!   the unknown type
//! - **Type engine**: subtyping, principal supertypes, exhaustiveness,
//!   alias resolution, substitution and variance checks
//!
//! Key properties:
//! - One engine per worker; the graph and the supertype cache are the only
//!   shared state
//! - Every recursive operation is depth-bounded and fails with
//!   `RelationError::Undecidable` instead of overflowing the stack
mod alias;
pub mod cache;
mod canonical;
mod covers;
pub mod def;
mod engine;
pub mod error;
mod format;
mod instantiate;
mod lookup;
pub mod recursion;
mod subtype;
mod supertype;
pub mod types;
mod variance;

pub use cache::{CacheStats, SupertypeCache};
pub use def::{
    AliasForm, Builtins, DeclId, DeclKey, DeclKind, Declaration, DeclarationGraph,
    LANGUAGE_PACKAGE, Variance, qualify,
};
pub use engine::TypeEngine;
pub use error::{RelationError, RelationIssue, RelationIssueKind, RelationResult};
pub use format::{DisplayType, TypePrinter};
pub use recursion::{DepthCounter, RecursionProfile};
pub use supertype::{Criteria, SupertypeCheck};
pub use types::{DeclaredType, ProducedType, TypeArgumentMap, TypeArguments, TypeKind};

#[cfg(test)]
#[path = "../tests/fixture.rs"]
pub(crate) mod fixture;
