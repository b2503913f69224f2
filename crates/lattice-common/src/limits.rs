//! Centralized limits and thresholds.
//!
//! The solver's recursion profiles read their ceilings from here so the
//! driver, the tests, and the engine agree on a single value.

// =============================================================================
// Recursion Depth Limits (Solver)
// =============================================================================

/// Maximum nesting of subtype checks and principal supertype searches.
///
/// A user-written generic hierarchy such as
///
/// ```text
/// interface Co<out T> {}
/// interface A satisfies Co<B&Co<A>> {}
/// interface B satisfies Co<A&Co<B>> {}
/// ```
///
/// can drive `A <: Co<A>` into an expansion that never bottoms out. Past
/// this depth the query is abandoned and reported as undecidable.
pub const MAX_SUBTYPE_DEPTH: u32 = 30;

/// Maximum nesting while resolving aliases and canonicalizing types.
pub const MAX_CANONICALIZATION_DEPTH: u32 = 50;

/// Maximum length of an extends chain followed by the declaration-level
/// supertype pre-check. Overflow answers "not a supertype".
pub const MAX_SUPERTYPE_CHECK_DEPTH: u32 = 20;

// =============================================================================
// Driver Limits
// =============================================================================

/// Upper bound on worker threads accepted by the phase driver.
pub const MAX_WORKER_THREADS: usize = 256;

/// Worker count used when the host cannot report its parallelism.
pub const DEFAULT_WORKER_THREADS: usize = 4;
