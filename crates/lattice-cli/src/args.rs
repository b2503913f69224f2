use clap::{Parser, ValueEnum};
use lattice_checker::DriverOptions;
use std::path::PathBuf;

/// CLI arguments for the lattice binary.
#[derive(Parser, Debug)]
#[command(
    name = "lattice",
    version,
    about = "Run the phased semantic analysis over a lattice project"
)]
pub struct CliArgs {
    /// Project directory, or the path of its lattice.json.
    #[arg(default_value = ".")]
    pub project: PathBuf,

    // ==================== Driver ====================
    /// Number of worker threads.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Report unresolved module imports as warnings instead of errors.
    #[arg(long = "no-verify-dependencies")]
    pub no_verify_dependencies: bool,

    /// Keep the supertype cache off for the analysis stages.
    #[arg(long = "no-supertype-cache")]
    pub no_supertype_cache: bool,

    /// Warn about declarations nothing references.
    #[arg(long)]
    pub usage: bool,

    /// Log stage timings at info level.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    // ==================== Output ====================
    /// Print counters and stage timings after the diagnostics.
    #[arg(long)]
    pub statistics: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable coloured output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliArgs {
    /// Layer the command-line flags over the options from the manifest.
    /// A flag only ever moves an option away from its default.
    pub fn apply(&self, mut options: DriverOptions) -> DriverOptions {
        if let Some(threads) = self.threads {
            options.threads = threads;
        }
        if self.no_verify_dependencies {
            options.verify_dependencies = false;
        }
        if self.no_supertype_cache {
            options.supertype_cache = false;
        }
        if self.usage {
            options.analyse_usage = true;
        }
        if self.verbose {
            options.verbose = true;
        }
        options
    }
}

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod tests;
