//! Subscriber setup for the `lattice` binary.
//!
//! The driver reports each stage on the `lattice_checker::driver` target:
//! a `phase` span per stage (fields `step` and `stage`) and one
//! `step N: M ms` event once every party has left it. That event is at
//! `info` under `--verbose` and at `debug` otherwise.
//!
//! The filter comes from the first of these that is present:
//!
//! 1. `LATTICE_LOG`, in `RUST_LOG` syntax
//! 2. `RUST_LOG`
//! 3. `--verbose`, which shows warnings plus the stage timings
//!
//! With none of them no subscriber is installed.
//!
//! ```bash
//! # Stage timings only
//! lattice --verbose projects/zoo
//!
//! # Every phase transition, nested under its stage span
//! LATTICE_LOG=lattice_checker=debug LATTICE_LOG_FORMAT=tree lattice projects/zoo
//!
//! # Abandoned type relations from the solver, as JSON
//! LATTICE_LOG=lattice_solver=warn LATTICE_LOG_FORMAT=json lattice projects/zoo
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Target of the driver's stage spans and timing events.
pub const STAGE_TARGET: &str = "lattice_checker::driver";

/// Filter installed by `--verbose` when no environment filter is set.
pub const VERBOSE_DIRECTIVES: &str = "warn,lattice_checker::driver=info";

/// Tracing output format, from `LATTICE_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event (default).
    Text,
    /// Events indented under their stage span via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Anything unrecognised is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// What the binary knows before it installs a subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingOptions {
    pub lattice_log: Option<String>,
    pub rust_log: Option<String>,
    pub format: Option<String>,
    pub verbose: bool,
}

impl TracingOptions {
    /// Read the environment and combine it with the `--verbose` flag.
    pub fn from_env(verbose: bool) -> Self {
        TracingOptions {
            lattice_log: std::env::var("LATTICE_LOG").ok(),
            rust_log: std::env::var("RUST_LOG").ok(),
            format: std::env::var("LATTICE_LOG_FORMAT").ok(),
            verbose,
        }
    }

    /// Filter directives to install, or `None` to stay silent.
    pub fn directives(&self) -> Option<&str> {
        self.lattice_log
            .as_deref()
            .or(self.rust_log.as_deref())
            .or(self.verbose.then_some(VERBOSE_DIRECTIVES))
    }

    pub fn format(&self) -> LogFormat {
        self.format.as_deref().map_or(LogFormat::Text, LogFormat::parse)
    }
}

/// Install the global subscriber for `options`. All output goes to stderr,
/// leaving stdout to the rendered report.
pub fn init_tracing(options: &TracingOptions) {
    let Some(directives) = options.directives() else {
        return;
    };
    let filter = EnvFilter::builder().parse_lossy(directives);

    // try_init: a subscriber installed by an embedding program wins.
    let _ = match options.format() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::new(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text if options.lattice_log.is_none() && options.rust_log.is_none() => {
            // Only stage timings reach here; the target and clock add nothing.
            let timing_layer = fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr);
            Registry::default().with(filter).with(timing_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);
            Registry::default().with(filter).with(text_layer).try_init()
        }
    };
}
