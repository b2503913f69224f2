//! Errors raised while assembling a batch or running the driver.
//!
//! Problems in the analysed program are never errors here: they are
//! diagnostics attached to the unit that caused them.

use crate::unit::Phase;
use thiserror::Error;

/// The batch could not be assembled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("module {0} is declared more than once")]
    DuplicateModule(String),
    #[error("unit {unit} refers to unknown module {module}")]
    UnknownModule { unit: String, module: String },
    #[error("unit {unit} declares package {package}, which is outside module {module}")]
    PackageOutsideModule {
        unit: String,
        package: String,
        module: String,
    },
}

/// The driver could not run the phase loop.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("worker thread count must be between 1 and {max}, got {threads}")]
    InvalidThreadCount { threads: usize, max: usize },
    #[error("failed to spawn worker thread {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("worker thread {worker} terminated abnormally")]
    WorkerLost { worker: usize },
}

/// A phase operation refused to run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("{phase} requires {required} to have completed for {unit}")]
    OutOfOrder {
        unit: String,
        phase: Phase,
        required: Phase,
    },
    #[error("declaration {name} of {unit} is missing from the graph")]
    MissingDeclaration { unit: String, name: String },
}
