//! Input and output streams for CLI commands
//!
//! Paths are opened buffered; without a path the process's stdin or
//! stdout is used.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::errors::{CliError, CliResult};

pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match path {
        Some(p) => {
            let file = File::open(p)
                .map_err(|e| CliError::io_error(format!("cannot open {}: {}", p.display(), e)))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

pub fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file = File::create(p)
                .map_err(|e| CliError::io_error(format!("cannot create {}: {}", p.display(), e)))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(Some(&dir.path().join("absent.jsonl"))).err().unwrap();
        assert_eq!(err.code(), &CliErrorCode::IoError);
        assert!(err.message().contains("absent.jsonl"));
    }
}
