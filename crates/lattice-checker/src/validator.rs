//! Module dependency validation.
//!
//! Runs once per batch on the coordinating thread, after every unit has
//! scanned its declarations and before refinement checking starts.

use crate::module::{DEFAULT_MODULE, ModuleId, ModuleRegistry, in_hierarchy};
use lattice_common::{Diagnostic, DiagnosticSeverity, diagnostic_codes};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

pub struct ModuleValidator<'r> {
    registry: &'r ModuleRegistry,
    strict: bool,
}

impl<'r> ModuleValidator<'r> {
    pub fn new(registry: &'r ModuleRegistry, strict: bool) -> Self {
        ModuleValidator { registry, strict }
    }

    /// Validate every module and record which units depend on each
    /// imported module.
    ///
    /// A missing import is an error when strict and a warning otherwise.
    pub fn verify(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.check_imports(&mut diagnostics);
        self.check_cycles(&mut diagnostics);
        self.check_hierarchy(&mut diagnostics);
        debug!(
            modules = self.registry.len(),
            diagnostics = diagnostics.len(),
            strict = self.strict,
            "module validation complete"
        );
        diagnostics
    }

    fn check_imports(&self, diagnostics: &mut Vec<Diagnostic>) {
        for module in self.registry.modules() {
            for import in &module.imports {
                match self.registry.by_name(&import.name) {
                    Some(imported) => self.registry.record_dependents(imported.id, &module.units),
                    None if import.optional => {}
                    None => {
                        let mut diagnostic = Diagnostic::from_code(
                            module.name.clone(),
                            diagnostic_codes::MODULE_NOT_FOUND,
                            &[import.name.as_str(), module.name.as_str()],
                        )
                        .with_subject(import.name.clone());
                        if !self.strict {
                            diagnostic.severity = DiagnosticSeverity::Warning;
                        }
                        diagnostics.push(diagnostic);
                    }
                }
            }
        }
    }

    fn check_cycles(&self, diagnostics: &mut Vec<Diagnostic>) {
        let mut state: FxHashMap<ModuleId, Visit> = FxHashMap::default();
        let mut reported: FxHashSet<Vec<ModuleId>> = FxHashSet::default();
        for module in self.registry.modules() {
            let mut path = Vec::new();
            self.visit(module.id, &mut state, &mut path, &mut |cycle| {
                let mut key = cycle.to_vec();
                key.sort();
                if !reported.insert(key) {
                    return;
                }
                let names: Vec<&str> = cycle
                    .iter()
                    .chain(cycle.first())
                    .filter_map(|id| self.registry.get(*id))
                    .map(|info| info.name.as_str())
                    .collect();
                let description = names.join(" -> ");
                let origin = names.first().copied().unwrap_or_default();
                diagnostics.push(
                    Diagnostic::from_code(origin, diagnostic_codes::MODULE_CYCLE, &[description.as_str()])
                        .with_subject(origin),
                );
            });
        }
    }

    fn visit(
        &self,
        id: ModuleId,
        state: &mut FxHashMap<ModuleId, Visit>,
        path: &mut Vec<ModuleId>,
        report: &mut dyn FnMut(&[ModuleId]),
    ) {
        match state.get(&id) {
            Some(Visit::Done) => return,
            Some(Visit::Active) => {
                if let Some(start) = path.iter().position(|m| *m == id) {
                    report(&path[start..]);
                }
                return;
            }
            None => {}
        }
        state.insert(id, Visit::Active);
        path.push(id);
        if let Some(module) = self.registry.get(id) {
            for import in &module.imports {
                if let Some(imported) = self.registry.by_name(&import.name) {
                    self.visit(imported.id, state, path, report);
                }
            }
        }
        path.pop();
        state.insert(id, Visit::Done);
    }

    fn check_hierarchy(&self, diagnostics: &mut Vec<Diagnostic>) {
        let names: Vec<&str> = self
            .registry
            .modules()
            .map(|m| m.name.as_str())
            .filter(|name| *name != DEFAULT_MODULE)
            .collect();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                if in_hierarchy(a, b) || in_hierarchy(b, a) {
                    diagnostics.push(
                        Diagnostic::from_code(*a, diagnostic_codes::MODULE_HIERARCHY, &[*a, *b])
                            .with_subject(*b),
                    );
                }
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

#[cfg(test)]
#[path = "../tests/validator_tests.rs"]
mod tests;
