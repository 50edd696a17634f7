//! CLI module for jsonq
//!
//! Provides command-line interface for:
//! - infer: Print the compacted schema of JSON-lines input
//! - encode: Convert JSON lines to a binary value stream
//! - decode: Print a binary value stream as text

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{decode, encode, infer, load_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{open_input, open_output};
