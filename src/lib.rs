//! lattice: the semantic core of a language front end.
//!
//! This crate re-exports the member crates under short names:
//!
//! - [`common`]: diagnostics and limits
//! - [`solver`]: the declaration graph and the produced type engine
//! - [`checker`]: phased units, module validation and the phase driver
//!
//! ```no_run
//! use lattice::checker::{DriverOptions, PhaseDriver, Project, UnitSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let units: Vec<UnitSource> = serde_json::from_str(r#"[{ "path": "a.lat", "package": "a" }]"#)?;
//! let project = Project::new(&[], units)?;
//! let report = PhaseDriver::new(DriverOptions::default())?.run(&project)?;
//! assert!(!report.has_errors());
//! # Ok(())
//! # }
//! ```

// Common types - diagnostics and centralized limits
pub use lattice_common as common;
pub use lattice_common::{Diagnostic, DiagnosticSeverity, diagnostic_codes, limits};

// Declaration graph, produced types and the type engine
pub use lattice_solver as solver;

// Phased analysis and the driver
pub use lattice_checker as checker;
pub use lattice_checker::{DriverOptions, DriverReport, PhaseDriver, Project};

// Tracing subscriber setup for binaries
pub mod tracing_config;
