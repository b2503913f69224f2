//! Phased Semantic Analysis
//!
//! Units arrive as serialized declarations and checks ([`UnitSource`]) and
//! are analysed in seven one-shot phases against one shared declaration
//! graph:
//!
//! 1. tree validation and declaration scan
//! 2. type declaration wiring
//! 3. type declaration scan
//! 4. refinement validation (after module validation)
//! 5. type analysis
//! 6. flow analysis (after the supertype cache is enabled)
//!
//! The [`PhaseDriver`] runs each phase over every unit on a fixed pool of
//! worker threads. A barrier between phases guarantees every unit has
//! completed phase `k` before any unit starts phase `k + 1`.

mod analysis;
pub mod collect;
mod declare;
pub mod driver;
pub mod error;
pub mod module;
pub mod project;
mod refinement;
mod resolve;
pub mod source;
mod tree;
pub mod unit;
pub mod validator;

pub use collect::{AssertionCollector, Statistics, StatisticsCollector};
pub use driver::{
    CoordinatorTask, DriverOptions, DriverReport, PhaseDriver, PhaseFailure, PhaseListener,
    STAGES, Stage, StageFailure, StageTiming, StageWork,
};
pub use error::{DriverError, PhaseError, ProjectError};
pub use module::{
    DEFAULT_MODULE, ModuleId, ModuleImport, ModuleInfo, ModuleRegistry, ModuleSource, UnitId,
};
pub use project::Project;
pub use source::{
    Check, CheckSource, DeclSource, DeclSourceKind, TypeExpr, TypeParamSource, UnitSource,
};
pub use unit::{Phase, PhaseFlags, PhasedUnit};
pub use validator::ModuleValidator;

#[cfg(test)]
#[path = "../tests/fixture.rs"]
pub(crate) mod fixture;
