//! CLI command implementations
//!
//! Each command loads the engine configuration (defaults when no file is
//! given), applies its log level, then runs one pass over its input.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use crate::adapter::{
    copy_all, BinaryStreamInput, BinaryStreamOutput, InputAdapter, JsonLinesInput, OutputAdapter,
    TextOutput,
};
use crate::config::EngineConfig;
use crate::iter::{BoxIter, JsonIter, Take};
use crate::schema::{compact, ArraySchema, Schema};
use crate::serialization::TextFullSerializer;

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{open_input, open_output};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.config.as_deref(), cli.command)
}

/// Run one command under the configuration at `config_path`
pub fn run_command(config_path: Option<&Path>, cmd: Command) -> CliResult<()> {
    let config = load_config(config_path)?;
    match cmd {
        Command::Infer { input } => {
            let schema = infer(&config, open_input(input.as_deref())?)?;
            let mut out = open_output(None)?;
            writeln!(out, "{}", schema)?;
            out.flush()?;
            Ok(())
        }
        Command::Encode { input, output } => {
            encode(open_input(input.as_deref())?, open_output(output.as_deref())?)?;
            Ok(())
        }
        Command::Decode {
            input,
            output,
            limit,
            pretty,
        } => {
            let indent = if pretty { config.text_indent } else { 0 };
            decode(
                open_input(input.as_deref())?,
                open_output(output.as_deref())?,
                limit,
                indent,
            )?;
            Ok(())
        }
    }
}

pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::load(p)?,
        None => EngineConfig::default(),
    };
    config.apply_logging()?;
    Ok(config)
}

/// Schema of the whole JSON-lines source: an array of the compacted
/// element schemas, or the empty array schema for no input
pub fn infer(config: &EngineConfig, input: impl BufRead) -> CliResult<Schema> {
    let options = config.compact_options()?;
    let mut source = JsonLinesInput::new(input);
    source.open()?;
    let mut observed = Vec::new();
    {
        let mut values = source.iter()?;
        while values.move_next()? {
            observed.push(Schema::infer(values.current()));
        }
    }
    source.close()?;
    Ok(match compact(&observed, &options) {
        Some(element) => Schema::array_of(element),
        None => Schema::array(ArraySchema::fixed(Vec::new())),
    })
}

/// Returns the number of values encoded
pub fn encode(input: impl BufRead, output: impl Write) -> CliResult<u64> {
    let mut source = JsonLinesInput::new(input);
    let mut sink = BinaryStreamOutput::new(output);
    Ok(copy_all(&mut source, &mut sink)?)
}

/// Returns the number of values decoded
pub fn decode(input: impl BufRead, output: impl Write, limit: Option<u64>, indent: usize) -> CliResult<u64> {
    let mut source = BinaryStreamInput::new(input);
    let mut sink = TextOutput::with_serializer(output, Arc::new(TextFullSerializer::new(indent)));
    source.open()?;
    sink.open()?;
    let mut written = 0u64;
    {
        let values = source.iter()?;
        let mut values: BoxIter<'_> = match limit {
            Some(n) => Box::new(Take::new(values, n)),
            None => values,
        };
        let mut writer = sink.writer()?;
        while values.move_next()? {
            writer.write(values.current())?;
            written += 1;
        }
        values.close()?;
        writer.close()?;
    }
    sink.close()?;
    source.close()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::value::Value;
    use serde_json::json;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_infer_compacts_lines() {
        let input = "{\"a\": 1}\n{\"a\": 7}\n";
        let schema = infer(&EngineConfig::default(), Cursor::new(input)).unwrap();
        assert!(!schema.accepts_null());
        let field = schema.element_schema().unwrap().field_schema("a");
        assert!(field.matches(&Value::Long(1)));
        assert!(field.matches(&Value::Long(7)));
        assert!(!field.matches(&Value::string("1")));
    }

    #[test]
    fn test_infer_empty_input() {
        let schema = infer(&EngineConfig::default(), Cursor::new("")).unwrap();
        assert_eq!(schema, Schema::array(ArraySchema::fixed(Vec::new())));
    }

    #[test]
    fn test_encode_then_decode() {
        let lines = "{\"id\": 1, \"tags\": [\"x\"]}\n\n\"plain\"\nnull\n";
        let mut binary = Vec::new();
        assert_eq!(encode(Cursor::new(lines), &mut binary).unwrap(), 3);

        let mut text = Vec::new();
        assert_eq!(decode(Cursor::new(binary.clone()), &mut text, None, 0).unwrap(), 3);
        let text = String::from_utf8(text).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().nth(2), Some("null"));

        let mut limited = Vec::new();
        assert_eq!(decode(Cursor::new(binary), &mut limited, Some(1), 0).unwrap(), 1);
    }

    #[test]
    fn test_encode_reports_bad_line() {
        let err = encode(Cursor::new("{}\nnot json\n"), Vec::new()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::EngineError);
        assert!(err.message().contains("JQ_ADAPTER_PARSE"));
    }

    #[test]
    fn test_config_file_is_validated() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("jsonq.json");
        fs::write(&config_path, json!({"merge_mode": "sometimes"}).to_string()).unwrap();
        let err = load_config(Some(&config_path)).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_config_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.text_indent, 2);
        assert_eq!(config.spill_cache_size, 256);
    }
}
