use colored::Colorize;
use lattice_checker::{DriverReport, StageTiming, Statistics};
use lattice_common::{Diagnostic, DiagnosticSeverity};
use std::fmt::Write;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// One line per diagnostic, followed by its related notes.
    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    /// `path (subject) - error L4001: message`
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = if diagnostic.file_name.is_empty() {
            "<unknown>".to_string()
        } else {
            diagnostic.file_name.clone()
        };
        if let Some(subject) = &diagnostic.subject {
            output.push_str(" (");
            output.push_str(subject);
            output.push(')');
        }
        output.push_str(" - ");
        output.push_str(&self.format_severity(diagnostic.severity));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message);

        for related in &diagnostic.related {
            let prefix = if self.color {
                "  Related".dimmed().to_string()
            } else {
                "  Related".to_string()
            };
            output.push('\n');
            output.push_str(&format!(
                "{}: {} - {}",
                prefix, related.file_name, related.message
            ));
        }
        output
    }

    pub fn summary(&self, report: &DriverReport) -> String {
        let line = format!(
            "{} error{}, {} warning{}",
            report.errors,
            plural(report.errors),
            report.warnings,
            plural(report.warnings)
        );
        if !self.color {
            line
        } else if report.errors > 0 {
            line.red().bold().to_string()
        } else if report.warnings > 0 {
            line.yellow().to_string()
        } else {
            line.green().to_string()
        }
    }

    pub fn render_statistics(&self, statistics: &Statistics, timings: &[StageTiming]) -> String {
        let mut out = String::new();
        let rows = [
            ("units", statistics.units),
            ("completed units", statistics.completed_units),
            ("declarations", statistics.declarations),
            ("type declarations", statistics.type_declarations),
            ("members", statistics.members),
            ("checks", statistics.checks),
            ("errors", statistics.errors),
            ("warnings", statistics.warnings),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "{:<20}{value:>8}", format!("{label}:"));
        }
        for timing in timings {
            let _ = writeln!(
                out,
                "{:<20}{:>6}ms",
                format!("{}:", timing.stage),
                timing.elapsed.as_millis()
            );
        }
        out
    }

    fn format_severity(&self, severity: DiagnosticSeverity) -> String {
        let label = severity.name();
        if !self.color {
            return label.to_string();
        }
        match severity {
            DiagnosticSeverity::Error => label.red().bold().to_string(),
            DiagnosticSeverity::Warning => label.yellow().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let code = format!("L{code}");
        if self.color {
            code.bright_black().to_string()
        } else {
            code
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
#[path = "../tests/reporter_tests.rs"]
mod tests;
