//! CLI argument definitions using clap
//!
//! Commands:
//! - jsonq infer  [--input <path>] [--config <path>]
//! - jsonq encode [--input <path>] [--output <path>] [--config <path>]
//! - jsonq decode [--input <path>] [--output <path>] [--limit <n>] [--pretty] [--config <path>]
//!
//! A missing `--input` reads stdin; a missing `--output` writes stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jsonq - typed JSON values, schemas and binary streams
#[derive(Parser, Debug)]
#[command(name = "jsonq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an engine configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the compacted schema of a JSON-lines input
    Infer {
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Convert JSON lines into a binary value stream
    Encode {
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a binary value stream as text, one value per line
    Decode {
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// Stop after this many values
        #[arg(long)]
        limit: Option<u64>,

        /// Indent nested values by the configured step
        #[arg(long)]
        pretty: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flags() {
        let cli = Cli::try_parse_from(["jsonq", "decode", "--limit", "3", "--pretty"]).unwrap();
        match cli.command {
            Command::Decode {
                limit, pretty, input, ..
            } => {
                assert_eq!(limit, Some(3));
                assert!(pretty);
                assert!(input.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["jsonq", "infer", "--config", "engine.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("engine.json")));
    }
}
