use super::*;
use crate::fixture::{project, zoo};
use crate::unit::PhaseFlags;

struct PanicOn(Phase);

impl PhaseListener for PanicOn {
    fn phase_started(&self, _unit: &PhasedUnit, phase: Phase) {
        if phase == self.0 {
            panic!("listener refused {phase}");
        }
    }
}

#[test]
fn test_default_options() {
    let options = DriverOptions::default();
    assert!(options.threads >= 1);
    assert!(options.verify_dependencies);
    assert!(options.supertype_cache);
    assert!(!options.analyse_usage);
    assert!(!options.verbose);
}

#[test]
fn test_option_builders() {
    let options = DriverOptions::default()
        .with_threads(3)
        .with_verify_dependencies(false)
        .with_supertype_cache(false)
        .with_usage_analysis(true)
        .with_verbose(true);
    assert_eq!(
        options,
        DriverOptions {
            threads: 3,
            verify_dependencies: false,
            supertype_cache: false,
            analyse_usage: true,
            verbose: true,
        }
    );
}

#[test]
fn test_options_from_partial_json() {
    let options: DriverOptions =
        serde_json::from_str(r#"{ "threads": 2, "analyse_usage": true }"#).expect("valid options");
    assert_eq!(options.threads, 2);
    assert!(options.analyse_usage);
    assert!(options.verify_dependencies);
}

#[test]
fn test_thread_count_is_validated() {
    let zero = PhaseDriver::new(DriverOptions::default().with_threads(0));
    assert!(matches!(
        zero,
        Err(DriverError::InvalidThreadCount { threads: 0, .. })
    ));
    let many = PhaseDriver::new(DriverOptions::default().with_threads(MAX_WORKER_THREADS + 1));
    assert!(matches!(many, Err(DriverError::InvalidThreadCount { .. })));
    assert!(PhaseDriver::new(DriverOptions::default().with_threads(MAX_WORKER_THREADS)).is_ok());
}

#[test]
fn test_stage_table_runs_every_phase_once_in_order() {
    let phases: Vec<Phase> = STAGES
        .iter()
        .filter_map(|stage| match stage.work {
            StageWork::Parallel(phases) => Some(phases),
            StageWork::Coordinator(_) => None,
        })
        .flatten()
        .copied()
        .collect();
    assert_eq!(phases, Phase::ALL.to_vec());

    let coordinator: Vec<CoordinatorTask> = STAGES
        .iter()
        .filter_map(|stage| match stage.work {
            StageWork::Coordinator(task) => Some(task),
            StageWork::Parallel(_) => None,
        })
        .collect();
    assert_eq!(
        coordinator,
        vec![CoordinatorTask::ModuleValidation, CoordinatorTask::SealGraph]
    );
    // Module validation sits between the type scan and refinement.
    assert_eq!(STAGES[3].work, StageWork::Coordinator(CoordinatorTask::ModuleValidation));
    assert_eq!(STAGES[4].work, StageWork::Parallel(&[Phase::RefinementValidation]));
}

#[test]
fn test_panic_message() {
    let from_str: Box<dyn Any + Send> = Box::new("static message");
    assert_eq!(panic_message(from_str.as_ref()), "static message");
    let from_string: Box<dyn Any + Send> = Box::new(String::from("owned message"));
    assert_eq!(panic_message(from_string.as_ref()), "owned message");
    let other: Box<dyn Any + Send> = Box::new(42u32);
    assert_eq!(panic_message(other.as_ref()), "unknown panic");
}

#[test]
fn test_isolated_panic_becomes_failure() {
    let project = project(vec![zoo()]);
    let unit = &project.units()[0];
    let listener = PanicOn(Phase::DeclarationScan);

    assert!(run_isolated(unit, Phase::TreeValidation, &project, &listener).is_ok());
    let failure = run_isolated(unit, Phase::DeclarationScan, &project, &listener)
        .expect_err("the listener panics");
    assert_eq!(failure.unit, "zoo/animals.lat");
    assert_eq!(failure.phase, Phase::DeclarationScan);
    assert_eq!(failure.message, "listener refused declaration scan");

    assert_eq!(unit.flags(), PhaseFlags::TREE_VALIDATED);
    let diagnostics = unit.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::PHASE_FAILURE);
    assert_eq!(
        diagnostics[0].message,
        "phase declaration scan failed: listener refused declaration scan"
    );
}

#[test]
fn test_refused_phase_becomes_failure() {
    let project = project(vec![zoo()]);
    let unit = &project.units()[0];
    let failure = run_isolated(unit, Phase::TypeAnalysis, &project, &SilentListener)
        .expect_err("prerequisites are missing");
    assert_eq!(failure.phase, Phase::TypeAnalysis);
    assert!(failure.message.contains("refinement validation"));
}

#[test]
fn test_run_completes_every_unit() {
    let project = project(vec![zoo()]);
    let driver = PhaseDriver::new(DriverOptions::default().with_threads(2)).expect("valid options");
    let report = driver.run(&project).expect("driver runs");
    assert!(!report.has_failures());
    assert!(!report.has_errors(), "{:?}", report.diagnostics);
    assert_eq!(project.units()[0].flags(), PhaseFlags::all());
    assert_eq!(report.timings.len(), STAGES.len() + 2);
    assert!(project.cache().is_enabled());
}

#[test]
fn test_seal_graph_cuts_cycles_found_by_refinement() {
    use crate::fixture::{PACKAGE, lookup, n};
    use crate::source::{DeclSource, UnitSource};
    use lattice_common::diagnostic_codes;

    let project = project(vec![
        zoo(),
        UnitSource::new("zoo/chicken.lat", PACKAGE).declare(DeclSource::class("Chicken").extends(n("Egg"))),
        UnitSource::new("zoo/egg.lat", PACKAGE).declare(DeclSource::class("Egg").extends(n("Chicken"))),
    ]);
    let driver = PhaseDriver::new(DriverOptions::default().with_threads(3)).expect("valid options");
    let report = driver.run(&project).expect("driver runs");
    assert!(!report.has_failures());

    let circular = project
        .diagnostics()
        .iter()
        .filter(|d| d.code == diagnostic_codes::CIRCULAR_INHERITANCE)
        .count();
    assert_eq!(circular, 2);
    assert_eq!(project.graph().extended_type(lookup(&project, "Chicken")), None);
    assert_eq!(project.graph().extended_type(lookup(&project, "Egg")), None);
    assert_eq!(project.break_flagged_supertypes(), 0);
}
