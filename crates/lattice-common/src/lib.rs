//! Common types shared by every lattice crate.
//!
//! - Diagnostics (`Diagnostic`, `DiagnosticSeverity`, `DiagnosticBag`) and
//!   the table of diagnostic codes
//! - Recursion ceilings and driver limits

pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticBag, DiagnosticMessage, DiagnosticSeverity, diagnostic_codes,
    format_message,
};

// Centralized limits and thresholds
pub mod limits;
