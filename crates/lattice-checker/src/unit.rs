//! Per-unit phase state.
//!
//! A [`PhasedUnit`] advances through seven one-shot phases. Each phase
//! operation takes the unit's lock, checks the completion flag, runs the
//! analysis, and only then sets the flag. A second call is a no-op, and a
//! phase whose predecessor has not completed refuses to run.

use crate::analysis;
use crate::collect::{AssertionCollector, StatisticsCollector};
use crate::declare;
use crate::error::PhaseError;
use crate::module::{ModuleId, UnitId};
use crate::project::Project;
use crate::refinement;
use crate::source::{DeclSource, UnitSource};
use crate::tree;
use bitflags::bitflags;
use lattice_common::{Diagnostic, DiagnosticBag};
use lattice_solver::{DeclId, DeclarationGraph, ProducedType};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

bitflags! {
    /// Completed phases of one unit. Bits are only ever added.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PhaseFlags: u8 {
        const TREE_VALIDATED = 1 << 0;
        const DECLARATIONS_SCANNED = 1 << 1;
        const TYPE_DECLARATIONS_WIRED = 1 << 2;
        const TYPE_DECLARATIONS_SCANNED = 1 << 3;
        const REFINEMENT_VALIDATED = 1 << 4;
        const FULLY_TYPED = 1 << 5;
        const FLOW_ANALYZED = 1 << 6;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    TreeValidation,
    DeclarationScan,
    TypeDeclarationWiring,
    TypeDeclarationScan,
    RefinementValidation,
    TypeAnalysis,
    FlowAnalysis,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::TreeValidation,
        Phase::DeclarationScan,
        Phase::TypeDeclarationWiring,
        Phase::TypeDeclarationScan,
        Phase::RefinementValidation,
        Phase::TypeAnalysis,
        Phase::FlowAnalysis,
    ];

    pub const fn flag(self) -> PhaseFlags {
        match self {
            Phase::TreeValidation => PhaseFlags::TREE_VALIDATED,
            Phase::DeclarationScan => PhaseFlags::DECLARATIONS_SCANNED,
            Phase::TypeDeclarationWiring => PhaseFlags::TYPE_DECLARATIONS_WIRED,
            Phase::TypeDeclarationScan => PhaseFlags::TYPE_DECLARATIONS_SCANNED,
            Phase::RefinementValidation => PhaseFlags::REFINEMENT_VALIDATED,
            Phase::TypeAnalysis => PhaseFlags::FULLY_TYPED,
            Phase::FlowAnalysis => PhaseFlags::FLOW_ANALYZED,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::TreeValidation => "tree validation",
            Phase::DeclarationScan => "declaration scan",
            Phase::TypeDeclarationWiring => "type declaration wiring",
            Phase::TypeDeclarationScan => "type declaration scan",
            Phase::RefinementValidation => "refinement validation",
            Phase::TypeAnalysis => "type analysis",
            Phase::FlowAnalysis => "flow analysis",
        }
    }

    /// The phase that must have completed first. Tree validation and the
    /// declaration scan are independent of each other.
    pub const fn requires(self) -> Option<Phase> {
        match self {
            Phase::TreeValidation | Phase::DeclarationScan => None,
            Phase::TypeDeclarationWiring => Some(Phase::DeclarationScan),
            Phase::TypeDeclarationScan => Some(Phase::TypeDeclarationWiring),
            Phase::RefinementValidation => Some(Phase::TypeDeclarationScan),
            Phase::TypeAnalysis => Some(Phase::RefinementValidation),
            Phase::FlowAnalysis => Some(Phase::TypeAnalysis),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declaration registered by this unit, with the source it came from.
#[derive(Clone, Debug)]
pub(crate) struct DeclEntry {
    pub id: DeclId,
    /// Dotted path inside the unit (`Box.put`), used as diagnostic subject.
    pub subject: String,
    pub source: DeclSource,
    pub type_parameters: Vec<DeclId>,
}

#[derive(Debug)]
pub(crate) struct UnitState {
    pub flags: PhaseFlags,
    pub entries: Vec<DeclEntry>,
    pub diagnostics: DiagnosticBag,
    /// Declarations of any unit this unit refers to.
    pub references: FxHashSet<DeclId>,
    /// Supertype edges refinement found cyclic or undecidable. Cut by the
    /// seal graph stage, once no unit is querying the graph.
    pub broken_edges: Vec<(DeclId, ProducedType)>,
    pub assertions_run: bool,
}

pub struct PhasedUnit {
    id: UnitId,
    module: ModuleId,
    source: UnitSource,
    state: Mutex<UnitState>,
}

impl PhasedUnit {
    pub fn new(id: UnitId, module: ModuleId, source: UnitSource) -> Self {
        let diagnostics = DiagnosticBag::with_file(source.path.clone());
        PhasedUnit {
            id,
            module,
            source,
            state: Mutex::new(UnitState {
                flags: PhaseFlags::empty(),
                entries: Vec::new(),
                diagnostics,
                references: FxHashSet::default(),
                broken_edges: Vec::new(),
                assertions_run: false,
            }),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn source(&self) -> &UnitSource {
        &self.source
    }

    pub fn path(&self) -> &str {
        &self.source.path
    }

    pub fn package(&self) -> &str {
        &self.source.package
    }

    /// A panic inside an analysis poisons the lock; the flags it guards
    /// are still consistent because they are set last.
    pub(crate) fn lock(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn flags(&self) -> PhaseFlags {
        self.lock().flags
    }

    pub fn has_completed(&self, phase: Phase) -> bool {
        self.flags().contains(phase.flag())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().diagnostics.iter().cloned().collect()
    }

    pub fn error_count(&self) -> usize {
        self.lock().diagnostics.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.lock().diagnostics.warning_count()
    }

    /// Declarations registered by this unit, members included.
    pub fn declarations(&self) -> Vec<DeclId> {
        self.lock().entries.iter().map(|e| e.id).collect()
    }

    pub fn references(&self) -> FxHashSet<DeclId> {
        self.lock().references.clone()
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.lock().diagnostics.add(diagnostic);
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    pub fn run_phase(&self, phase: Phase, project: &Project) -> Result<bool, PhaseError> {
        match phase {
            Phase::TreeValidation => self.validate_tree(project),
            Phase::DeclarationScan => self.scan_declarations(project),
            Phase::TypeDeclarationWiring => self.wire_type_declarations(project),
            Phase::TypeDeclarationScan => self.scan_type_declarations(project),
            Phase::RefinementValidation => self.validate_refinement(project),
            Phase::TypeAnalysis => self.analyse_types(project),
            Phase::FlowAnalysis => self.analyse_flow(project),
        }
    }

    pub fn validate_tree(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::TreeValidation, |state| {
            tree::validate_tree(project, self, state);
            Ok(())
        })
    }

    pub fn scan_declarations(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::DeclarationScan, |state| {
            declare::scan_declarations(project, self, state);
            Ok(())
        })
    }

    pub fn wire_type_declarations(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::TypeDeclarationWiring, |state| {
            declare::wire_type_declarations(project, self, state)
        })
    }

    pub fn scan_type_declarations(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::TypeDeclarationScan, |state| {
            declare::scan_type_declarations(project, self, state)
        })
    }

    pub fn validate_refinement(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::RefinementValidation, |state| {
            refinement::validate_refinement(project, self, state)
        })
    }

    pub fn analyse_types(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::TypeAnalysis, |state| {
            analysis::analyse_types(project, self, state);
            Ok(())
        })
    }

    pub fn analyse_flow(&self, project: &Project) -> Result<bool, PhaseError> {
        self.advance(Phase::FlowAnalysis, |state| {
            analysis::analyse_flow(project, self, state);
            Ok(())
        })
    }

    /// Check-and-set under the unit lock. Returns whether the analysis ran.
    fn advance(
        &self,
        phase: Phase,
        analysis: impl FnOnce(&mut UnitState) -> Result<(), PhaseError>,
    ) -> Result<bool, PhaseError> {
        let mut state = self.lock();
        if state.flags.contains(phase.flag()) {
            trace!(unit = %self.source.path, %phase, "phase already complete");
            return Ok(false);
        }
        if let Some(required) = phase.requires() {
            if !state.flags.contains(required.flag()) {
                return Err(PhaseError::OutOfOrder {
                    unit: self.source.path.clone(),
                    phase,
                    required,
                });
            }
        }
        analysis(&mut state)?;
        state.flags.insert(phase.flag());
        debug!(unit = %self.source.path, %phase, "phase complete");
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Finishing passes
    // -------------------------------------------------------------------------

    /// Cut the supertype edges this unit's refinement flagged. Returns how
    /// many were cut; a second call cuts nothing.
    pub fn break_flagged_supertypes(&self, graph: &DeclarationGraph) -> usize {
        let edges = std::mem::take(&mut self.lock().broken_edges);
        for (id, supertype) in &edges {
            graph.break_supertype(*id, supertype);
        }
        edges.len()
    }

    /// Warn on non-shared toplevel declarations no unit refers to.
    pub fn analyse_usage(&self, project: &Project, referenced: &FxHashSet<DeclId>) {
        let mut state = self.lock();
        analysis::analyse_usage(project, &mut state, referenced);
    }

    pub fn generate_statistics(&self, collector: &StatisticsCollector) {
        let state = self.lock();
        collector.record_unit(self, &state);
    }

    pub fn run_assertions(&self, collector: &AssertionCollector) {
        let mut state = self.lock();
        collector.check_unit(self, &mut state);
    }
}

#[cfg(test)]
#[path = "../tests/unit_tests.rs"]
mod tests;
