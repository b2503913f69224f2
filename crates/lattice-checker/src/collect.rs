//! Finishing passes: statistics and assertions.
//!
//! Both run sequentially over every unit after the phase loop. The
//! collectors only need `&self` so a unit can be handed one without
//! caring who else holds it.

use crate::source::CheckSource;
use crate::unit::{PhaseFlags, PhasedUnit, UnitState};
use lattice_common::{Diagnostic, DiagnosticBag, diagnostic_codes};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Counters gathered over a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub units: usize,
    /// Units that completed every phase.
    pub completed_units: usize,
    pub declarations: usize,
    pub type_declarations: usize,
    pub members: usize,
    pub checks: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Default)]
pub struct StatisticsCollector {
    units: AtomicUsize,
    completed_units: AtomicUsize,
    declarations: AtomicUsize,
    type_declarations: AtomicUsize,
    members: AtomicUsize,
    checks: AtomicUsize,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_unit(&self, unit: &PhasedUnit, state: &UnitState) {
        let members = state
            .entries
            .iter()
            .filter(|e| e.subject.contains('.'))
            .count();
        let types = state
            .entries
            .iter()
            .filter(|e| e.source.kind.is_type())
            .count();

        self.units.fetch_add(1, Ordering::Relaxed);
        if state.flags.contains(PhaseFlags::all()) {
            self.completed_units.fetch_add(1, Ordering::Relaxed);
        }
        self.declarations
            .fetch_add(state.entries.len(), Ordering::Relaxed);
        self.type_declarations.fetch_add(types, Ordering::Relaxed);
        self.members.fetch_add(members, Ordering::Relaxed);
        self.checks
            .fetch_add(unit.source().checks.len(), Ordering::Relaxed);
        self.errors
            .fetch_add(state.diagnostics.error_count(), Ordering::Relaxed);
        self.warnings
            .fetch_add(state.diagnostics.warning_count(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Statistics {
        Statistics {
            units: self.units.load(Ordering::Relaxed),
            completed_units: self.completed_units.load(Ordering::Relaxed),
            declarations: self.declarations.load(Ordering::Relaxed),
            type_declarations: self.type_declarations.load(Ordering::Relaxed),
            members: self.members.load(Ordering::Relaxed),
            checks: self.checks.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
        }
    }
}

/// Matches expected errors against reported ones and gathers the final
/// diagnostics of every unit.
///
/// A check marked `expect_error` consumes the errors reported for it. A
/// marked check with no error gets an error of its own.
#[derive(Debug, Default)]
pub struct AssertionCollector {
    diagnostics: Mutex<Vec<Diagnostic>>,
    expected: AtomicUsize,
    missing: AtomicUsize,
}

impl AssertionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check_unit(&self, unit: &PhasedUnit, state: &mut UnitState) {
        if !state.assertions_run {
            state.assertions_run = true;
            let reported = std::mem::replace(
                &mut state.diagnostics,
                DiagnosticBag::with_file(unit.path()),
            )
            .into_vec();
            let mut kept = Vec::with_capacity(reported.len());
            let mut matched = vec![false; unit.source().checks.len()];
            for diagnostic in reported {
                let index = expected_index(unit, &diagnostic);
                match index {
                    Some(index) if diagnostic.is_error() => matched[index] = true,
                    _ => kept.push(diagnostic),
                }
            }
            state.diagnostics.extend(kept);
            for (index, check) in unit.source().checks.iter().enumerate() {
                if !check.expect_error {
                    continue;
                }
                if matched[index] {
                    self.expected.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.missing.fetch_add(1, Ordering::Relaxed);
                    let subject = CheckSource::subject(index);
                    state.diagnostics.report(
                        diagnostic_codes::EXPECTED_ERROR_NOT_FOUND,
                        subject.as_str(),
                        &[subject.as_str()],
                    );
                }
            }
            debug!(unit = unit.path(), "assertions checked");
        }
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(state.diagnostics.iter().cloned());
    }

    /// Expected errors that were reported.
    pub fn expected_count(&self) -> usize {
        self.expected.load(Ordering::Relaxed)
    }

    /// Expected errors that were not.
    pub fn missing_count(&self) -> usize {
        self.missing.load(Ordering::Relaxed)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index of the `expect_error` check a diagnostic was reported under.
fn expected_index(unit: &PhasedUnit, diagnostic: &Diagnostic) -> Option<usize> {
    let index = CheckSource::index_of(diagnostic.subject.as_deref()?)?;
    unit.source()
        .checks
        .get(index)
        .filter(|c| c.expect_error)
        .map(|_| index)
}

#[cfg(test)]
#[path = "../tests/collect_tests.rs"]
mod tests;
