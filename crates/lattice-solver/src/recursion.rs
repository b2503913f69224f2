//! Depth guard for recursive type computations.
//!
//! Every recursive engine operation enters the [`DepthCounter`] owned by the
//! calling [`TypeEngine`](crate::TypeEngine). Subtyping and alias
//! resolution recurse into each other, so both share one depth and differ
//! only in the ceiling they enter against:
//!
//! ```ignore
//! if !self.depth.enter_bounded(RecursionProfile::SubtypeCheck.max_depth()) {
//!     return Err(RelationError::undecidable("subtype check"));
//! }
//! let result = compare(a, b);
//! self.depth.leave();
//! result
//! ```
//!
//! The declaration-level supertype pre-check walks the graph iteratively
//! and caps itself with `MAX_SUPERTYPE_CHECK_DEPTH`; it never enters here.

use lattice_common::limits::{MAX_CANONICALIZATION_DEPTH, MAX_SUBTYPE_DEPTH};

/// Ceiling for each kind of recursive engine computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtyping, exactness, covers and the principal supertype search.
    ///
    /// depth = 30
    SubtypeCheck,

    /// Alias resolution and substitution. Also the counter's own ceiling.
    ///
    /// depth = 50
    Canonicalization,
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            RecursionProfile::SubtypeCheck => MAX_SUBTYPE_DEPTH,
            RecursionProfile::Canonicalization => MAX_CANONICALIZATION_DEPTH,
        }
    }

    /// Operation name carried by `RelationError::Undecidable`.
    pub const fn name(self) -> &'static str {
        match self {
            RecursionProfile::SubtypeCheck => "subtype check",
            RecursionProfile::Canonicalization => "canonicalization",
        }
    }
}

/// A depth-only guard for stack overflow protection.
///
/// In debug builds, dropping with depth > 0 panics and calling `leave()`
/// at depth 0 panics.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            depth: 0,
            max_depth: profile.max_depth(),
        }
    }

    /// Try to enter a deeper level against `limit`, itself capped by the
    /// counter's own ceiling.
    ///
    /// Returns `false` when the ceiling is reached. The depth is then not
    /// incremented and `leave()` must not be called.
    #[inline]
    pub fn enter_bounded(&mut self, limit: u32) -> bool {
        if self.depth >= limit.min(self.max_depth) {
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave the current depth level. Called exactly once after every
    /// successful [`enter_bounded`](Self::enter_bounded).
    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(
            self.depth > 0,
            "DepthCounter::leave() called at depth 0 without a matching enter"
        );
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "DepthCounter dropped with depth {}: an enter without a matching leave",
                self.depth,
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
