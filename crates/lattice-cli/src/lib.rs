//! Front end for the `lattice` binary: argument parsing, project loading
//! and diagnostic rendering.

pub mod args;
pub mod config;
pub mod driver;
pub mod reporter;
