#![allow(clippy::print_stderr)]

use clap::Parser;
use lattice::tracing_config::{self, TracingOptions};
use lattice_cli::args::CliArgs;
use lattice_cli::driver::{self, EXIT_FAILURE};

fn main() {
    let args = CliArgs::parse();

    // Silent unless LATTICE_LOG, RUST_LOG or --verbose asks for output.
    tracing_config::init_tracing(&TracingOptions::from_env(args.verbose));

    match driver::check(&args) {
        Ok(outcome) => {
            print!("{}", outcome.output);
            std::process::exit(outcome.exit_code);
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
