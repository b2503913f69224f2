use anyhow::{Context, Result};
use lattice_checker::{DriverReport, PhaseDriver, Project};
use std::io::IsTerminal;
use tracing::info;

use crate::args::{CliArgs, OutputFormat};
use crate::config::load_project;
use crate::reporter::Reporter;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERRORS: i32 = 1;
/// A phase or coordinator task failed, or the project could not be run.
pub const EXIT_FAILURE: i32 = 2;

pub struct Outcome {
    pub report: DriverReport,
    /// Rendered report for stdout.
    pub output: String,
    pub exit_code: i32,
}

/// Load the project named by `args`, run every phase over it and render
/// the result.
pub fn check(args: &CliArgs) -> Result<Outcome> {
    let loaded = load_project(&args.project)?;
    let _span = tracing::info_span!("check", project = %loaded.root.display()).entered();

    let options = args.apply(loaded.manifest.options.clone());
    let project = Project::new(&loaded.manifest.modules, loaded.units)
        .with_context(|| format!("failed to assemble project {}", loaded.root.display()))?;
    let report = PhaseDriver::new(options)?.run(&project)?;
    info!(
        units = report.statistics.units,
        errors = report.errors,
        warnings = report.warnings,
        "check finished"
    );

    let output = match args.format {
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => {
            let color = !args.no_color && std::io::stdout().is_terminal();
            render_text(&report, &Reporter::new(color), args.statistics)
        }
    };

    Ok(Outcome {
        exit_code: exit_code(&report),
        report,
        output,
    })
}

pub fn exit_code(report: &DriverReport) -> i32 {
    if report.has_failures() {
        EXIT_FAILURE
    } else if report.has_errors() {
        EXIT_ERRORS
    } else {
        EXIT_SUCCESS
    }
}

fn render_text(report: &DriverReport, reporter: &Reporter, statistics: bool) -> String {
    let mut out = reporter.render(&report.diagnostics);
    for failure in &report.failures {
        out.push_str(&format!(
            "{}: phase {} failed: {}\n",
            failure.unit, failure.phase, failure.message
        ));
    }
    for failure in &report.stage_failures {
        out.push_str(&format!(
            "stage {} failed: {}\n",
            failure.stage, failure.message
        ));
    }
    if statistics {
        out.push_str(&reporter.render_statistics(&report.statistics, &report.timings));
    }
    out.push_str(&reporter.summary(report));
    out.push('\n');
    out
}
