//! Concurrent phase driver.
//!
//! A fixed set of worker threads and the coordinating thread share one
//! barrier. Every stage of [`STAGES`] starts after a rendezvous of all
//! parties, so every unit completes a phase before any unit starts the
//! next one. Worker `i` owns units `i, i + T, i + 2T, ...`; striping
//! spreads large and small units evenly across workers.
//!
//! Coordinator stages run on the calling thread while the workers are
//! parked at the next rendezvous. After the loop, usage analysis,
//! statistics and assertions run sequentially over all units.

use crate::collect::{AssertionCollector, Statistics, StatisticsCollector};
use crate::error::DriverError;
use crate::module::UnitId;
use crate::project::Project;
use crate::unit::{Phase, PhasedUnit};
use crate::validator::ModuleValidator;
use lattice_common::limits::{DEFAULT_WORKER_THREADS, MAX_WORKER_THREADS};
use lattice_common::{Diagnostic, diagnostic_codes};
use lattice_solver::DeclId;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::sync::{Barrier, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

// =============================================================================
// Options
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    pub threads: usize,
    /// Missing module imports are errors rather than warnings.
    pub verify_dependencies: bool,
    /// Enable the supertype cache once the graph is sealed.
    pub supertype_cache: bool,
    pub analyse_usage: bool,
    /// Log stage timings at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            threads: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(DEFAULT_WORKER_THREADS),
            verify_dependencies: true,
            supertype_cache: true,
            analyse_usage: false,
            verbose: false,
        }
    }
}

impl DriverOptions {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_verify_dependencies(mut self, verify: bool) -> Self {
        self.verify_dependencies = verify;
        self
    }

    pub fn with_supertype_cache(mut self, enabled: bool) -> Self {
        self.supertype_cache = enabled;
        self
    }

    pub fn with_usage_analysis(mut self, enabled: bool) -> Self {
        self.analyse_usage = enabled;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

// =============================================================================
// Stage table
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorTask {
    /// Validate module imports, cycles and hierarchy.
    ModuleValidation,
    /// Cut the supertype edges refinement flagged, then turn on the
    /// supertype cache. The graph no longer changes after this.
    SealGraph,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StageWork {
    /// Each worker runs these phases, in order, over its units.
    Parallel(&'static [Phase]),
    Coordinator(CoordinatorTask),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub work: StageWork,
}

pub const STAGES: [Stage; 8] = [
    Stage {
        name: "declarations",
        work: StageWork::Parallel(&[Phase::TreeValidation, Phase::DeclarationScan]),
    },
    Stage {
        name: "wiring",
        work: StageWork::Parallel(&[Phase::TypeDeclarationWiring]),
    },
    Stage {
        name: "type declarations",
        work: StageWork::Parallel(&[Phase::TypeDeclarationScan]),
    },
    Stage {
        name: "module validation",
        work: StageWork::Coordinator(CoordinatorTask::ModuleValidation),
    },
    Stage {
        name: "refinement",
        work: StageWork::Parallel(&[Phase::RefinementValidation]),
    },
    Stage {
        name: "seal graph",
        work: StageWork::Coordinator(CoordinatorTask::SealGraph),
    },
    Stage {
        name: "types",
        work: StageWork::Parallel(&[Phase::TypeAnalysis]),
    },
    Stage {
        name: "flow",
        work: StageWork::Parallel(&[Phase::FlowAnalysis]),
    },
];

/// Observes the phase loop. `phase_started` runs on a worker thread inside
/// the same panic isolation as the phase itself; `stage_finished` runs on
/// the coordinating thread once every party has passed the stage.
pub trait PhaseListener: Sync {
    fn phase_started(&self, _unit: &PhasedUnit, _phase: Phase) {}
    fn stage_finished(&self, _stage: &Stage, _elapsed: Duration) {}
}

struct SilentListener;

impl PhaseListener for SilentListener {}

// =============================================================================
// Report
// =============================================================================

/// A unit-phase call that panicked or refused to run. The unit's flag for
/// `phase` stays unset and its later phases are skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseFailure {
    pub unit: String,
    pub phase: Phase,
    pub message: String,
}

/// A coordinator task that panicked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: &'static str,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub struct DriverReport {
    pub failures: Vec<PhaseFailure>,
    pub stage_failures: Vec<StageFailure>,
    pub statistics: Statistics,
    pub errors: usize,
    pub warnings: usize,
    /// Expected errors that were reported and therefore dropped.
    pub expected_errors: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub timings: Vec<StageTiming>,
}

impl DriverReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.stage_failures.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

// =============================================================================
// Driver
// =============================================================================

pub struct PhaseDriver {
    options: DriverOptions,
}

impl PhaseDriver {
    pub fn new(options: DriverOptions) -> Result<Self, DriverError> {
        if options.threads == 0 || options.threads > MAX_WORKER_THREADS {
            return Err(DriverError::InvalidThreadCount {
                threads: options.threads,
                max: MAX_WORKER_THREADS,
            });
        }
        Ok(PhaseDriver { options })
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn run(&self, project: &Project) -> Result<DriverReport, DriverError> {
        self.run_with_listener(project, &SilentListener)
    }

    pub fn run_with_listener(
        &self,
        project: &Project,
        listener: &dyn PhaseListener,
    ) -> Result<DriverReport, DriverError> {
        let threads = self.options.threads;
        let _span = tracing::info_span!(
            "drive",
            units = project.units().len(),
            threads
        )
        .entered();
        project.cache().disable();

        let barrier = Barrier::new(threads + 1);
        let failures: Mutex<Vec<PhaseFailure>> = Mutex::new(Vec::new());
        let mut stage_failures = Vec::new();
        let mut module_diagnostics = Vec::new();
        let mut timings = Vec::with_capacity(STAGES.len() + 3);

        thread::scope(|scope| -> Result<(), DriverError> {
            let mut handles = Vec::with_capacity(threads);
            let mut starts = Vec::with_capacity(threads);
            for worker in 0..threads {
                let (start, started) = mpsc::channel::<bool>();
                let (barrier, failures) = (&barrier, &failures);
                let spawned = thread::Builder::new()
                    .name(format!("lattice-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        // Nothing runs until every worker exists; a dropped
                        // sender means the batch was abandoned.
                        if started.recv() != Ok(true) {
                            return;
                        }
                        work(worker, threads, project, barrier, failures, listener);
                    });
                match spawned {
                    Ok(handle) => {
                        handles.push(handle);
                        starts.push(start);
                    }
                    Err(source) => return Err(DriverError::Spawn { worker, source }),
                }
            }
            for start in &starts {
                // A worker that already exited cannot block the barrier
                // because it never reached it.
                let _ = start.send(true);
            }

            barrier.wait();
            for (index, stage) in STAGES.iter().enumerate() {
                let started = Instant::now();
                {
                    let _stage =
                        tracing::info_span!("phase", step = index + 1, stage = stage.name)
                            .entered();
                    if let StageWork::Coordinator(task) = stage.work {
                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                            self.coordinate(task, project)
                        }));
                        match outcome {
                            Ok(diagnostics) => module_diagnostics.extend(diagnostics),
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                error!(stage = stage.name, %message, "coordinator task failed");
                                stage_failures.push(StageFailure {
                                    stage: stage.name,
                                    message,
                                });
                            }
                        }
                    }
                    barrier.wait();
                }
                let elapsed = started.elapsed();
                if self.options.verbose {
                    info!("step {}: {} ms", index + 1, elapsed.as_millis());
                } else {
                    debug!("step {}: {} ms", index + 1, elapsed.as_millis());
                }
                listener.stage_finished(stage, elapsed);
                timings.push(StageTiming {
                    stage: stage.name,
                    elapsed,
                });
            }

            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    return Err(DriverError::WorkerLost { worker });
                }
            }
            Ok(())
        })?;

        let failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(self.finish(project, failures, stage_failures, module_diagnostics, timings))
    }

    fn coordinate(&self, task: CoordinatorTask, project: &Project) -> Vec<Diagnostic> {
        match task {
            CoordinatorTask::ModuleValidation => {
                ModuleValidator::new(project.registry(), self.options.verify_dependencies).verify()
            }
            CoordinatorTask::SealGraph => {
                project.break_flagged_supertypes();
                if self.options.supertype_cache {
                    project.cache().enable();
                }
                Vec::new()
            }
        }
    }

    fn finish(
        &self,
        project: &Project,
        failures: Vec<PhaseFailure>,
        stage_failures: Vec<StageFailure>,
        module_diagnostics: Vec<Diagnostic>,
        mut timings: Vec<StageTiming>,
    ) -> DriverReport {
        if self.options.analyse_usage {
            let started = Instant::now();
            let referenced: FxHashSet<DeclId> = project
                .units()
                .iter()
                .flat_map(|u| u.references())
                .collect();
            for unit in project.units() {
                unit.analyse_usage(project, &referenced);
            }
            timings.push(StageTiming {
                stage: "usage",
                elapsed: started.elapsed(),
            });
        }

        let started = Instant::now();
        let statistics = StatisticsCollector::new();
        for unit in project.units() {
            unit.generate_statistics(&statistics);
        }
        timings.push(StageTiming {
            stage: "statistics",
            elapsed: started.elapsed(),
        });

        let started = Instant::now();
        let assertions = AssertionCollector::new();
        for unit in project.units() {
            unit.run_assertions(&assertions);
        }
        timings.push(StageTiming {
            stage: "assertions",
            elapsed: started.elapsed(),
        });

        let expected_errors = assertions.expected_count();
        let mut diagnostics = module_diagnostics;
        diagnostics.extend(assertions.into_diagnostics());
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = diagnostics.iter().filter(|d| d.is_warning()).count();
        info!(
            errors,
            warnings,
            failures = failures.len(),
            "analysis complete"
        );
        DriverReport {
            failures,
            stage_failures,
            statistics: statistics.snapshot(),
            errors,
            warnings,
            expected_errors,
            diagnostics,
            timings,
        }
    }
}

fn work(
    worker: usize,
    threads: usize,
    project: &Project,
    barrier: &Barrier,
    failures: &Mutex<Vec<PhaseFailure>>,
    listener: &dyn PhaseListener,
) {
    let units: Vec<&PhasedUnit> = project.units().iter().skip(worker).step_by(threads).collect();
    debug!(worker, units = units.len(), "worker started");
    let mut failed: FxHashSet<UnitId> = FxHashSet::default();

    barrier.wait();
    for stage in &STAGES {
        if let StageWork::Parallel(phases) = stage.work {
            for unit in &units {
                if failed.contains(&unit.id()) {
                    continue;
                }
                for phase in phases {
                    if let Err(failure) = run_isolated(unit, *phase, project, listener) {
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(failure);
                        failed.insert(unit.id());
                        break;
                    }
                }
            }
        }
        barrier.wait();
    }
}

/// Run one phase of one unit, turning a panic or a refusal into a
/// failure and a diagnostic of that unit.
fn run_isolated(
    unit: &PhasedUnit,
    phase: Phase,
    project: &Project,
    listener: &dyn PhaseListener,
) -> Result<(), PhaseFailure> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        listener.phase_started(unit, phase);
        unit.run_phase(phase, project)
    }));
    let message = match outcome {
        Ok(Ok(_)) => return Ok(()),
        Ok(Err(error)) => error.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    warn!(unit = unit.path(), %phase, %message, "phase failed");
    unit.report(Diagnostic::from_code(
        unit.path(),
        diagnostic_codes::PHASE_FAILURE,
        &[phase.name(), message.as_str()],
    ));
    Err(PhaseFailure {
        unit: unit.path().to_string(),
        phase,
        message,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod tests;
