//! Delimited (CSV-like) text format
//!
//! One value per line. Records are written in declared field order (or
//! their own field order when no fields are declared); arrays are written
//! element by element. Cells that are strings are quoted when they contain
//! the delimiter, a quote or a line break; embedded quotes are doubled.
//! Null is an empty cell. Other values use their compact text form.
//!
//! Reading parses each unquoted cell as a text value and falls back to a
//! plain string, so `1,x` reads back as `[1, "x"]`.

use std::io::{BufRead, Write};

use super::errors::{SerializationError, SerializationResult};
use super::text::TextSerializer;
use super::text_reader::parse_value;
use super::text_writer::to_text;
use crate::value::{Record, Value};

#[derive(Debug, Clone)]
pub struct DelimitedSerializer {
    delimiter: u8,
    fields: Option<Vec<String>>,
    quote_all: bool,
}

impl Default for DelimitedSerializer {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DelimitedSerializer {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            fields: None,
            quote_all: false,
        }
    }

    /// Declared field names: records are written in this order and lines
    /// are read back as records
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Quote every string cell
    pub fn quote_all(mut self, quote: bool) -> Self {
        self.quote_all = quote;
        self
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Write the declared field names as a header line
    pub fn write_header(&self, out: &mut dyn Write) -> SerializationResult<()> {
        if let Some(fields) = &self.fields {
            let cells: Vec<Value> = fields.iter().map(|f| Value::string(f.as_str())).collect();
            self.write_cells(out, cells.iter())?;
        }
        Ok(())
    }

    fn needs_quotes(&self, s: &str) -> bool {
        self.quote_all
            || s.is_empty()
            || s.bytes()
                .any(|b| b == self.delimiter || b == b'"' || b == b'\n' || b == b'\r')
    }

    fn cell(&self, v: &Value) -> String {
        match v {
            Value::Null => String::new(),
            Value::String(s) if self.needs_quotes(s) => format!("\"{}\"", s.replace('"', "\"\"")),
            Value::String(s) => s.clone(),
            other => to_text(other, 0),
        }
    }

    fn write_cells<'v>(&self, out: &mut dyn Write, cells: impl Iterator<Item = &'v Value>) -> SerializationResult<()> {
        let mut line = String::new();
        for (i, v) in cells.enumerate() {
            if i > 0 {
                line.push(self.delimiter as char);
            }
            line.push_str(&self.cell(v));
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Split one line into (text, was_quoted) cells
    fn split(&self, line: &str) -> SerializationResult<Vec<(String, bool)>> {
        let mut cells = Vec::new();
        let mut chars = line.chars().peekable();
        let delimiter = self.delimiter as char;
        loop {
            let mut cell = String::new();
            let quoted = chars.peek() == Some(&'"');
            if quoted {
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            cell.push('"');
                        }
                        Some('"') => break,
                        Some(c) => cell.push(c),
                        None => return Err(SerializationError::malformed("unterminated quoted cell")),
                    }
                }
            }
            loop {
                match chars.peek() {
                    Some(&c) if c == delimiter => break,
                    None => break,
                    Some(&c) => {
                        if quoted {
                            return Err(SerializationError::malformed(format!(
                                "unexpected {:?} after quoted cell",
                                c
                            )));
                        }
                        cell.push(c);
                        chars.next();
                    }
                }
            }
            cells.push((cell, quoted));
            if chars.next().is_none() {
                return Ok(cells);
            }
        }
    }

    fn parse_cell(text: String, quoted: bool) -> Value {
        if quoted {
            return Value::String(text);
        }
        if text.is_empty() {
            return Value::Null;
        }
        parse_value(&text).unwrap_or(Value::String(text))
    }
}

impl TextSerializer for DelimitedSerializer {
    fn write(&self, out: &mut dyn Write, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Record(r) => match &self.fields {
                Some(fields) => {
                    let cells: Vec<Value> = fields.iter().map(|f| r.get(f).cloned().unwrap_or(Value::Null)).collect();
                    self.write_cells(out, cells.iter())
                }
                None => self.write_cells(out, r.iter().map(|(_, v)| v)),
            },
            Value::Array(items) => self.write_cells(out, items.iter()),
            other => self.write_cells(out, std::iter::once(other)),
        }
    }

    fn read(&self, input: &mut dyn BufRead) -> SerializationResult<Option<Value>> {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches(['\n', '\r']);
        let cells = self.split(line)?;
        match &self.fields {
            Some(fields) => {
                if cells.len() != fields.len() {
                    return Err(SerializationError::malformed(format!(
                        "expected {} cells, found {}",
                        fields.len(),
                        cells.len()
                    )));
                }
                let record: Record = fields
                    .iter()
                    .cloned()
                    .zip(cells.into_iter().map(|(t, q)| Self::parse_cell(t, q)))
                    .collect();
                Ok(Some(Value::Record(record)))
            }
            None => Ok(Some(Value::Array(
                cells.into_iter().map(|(t, q)| Self::parse_cell(t, q)).collect(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_record_in_declared_order() {
        let s = DelimitedSerializer::default().with_fields(vec!["id".into(), "name".into(), "tag".into()]);
        let r = Value::Record(
            Record::new()
                .with("name", Value::string("a,b"))
                .with("id", Value::Long(7)),
        );
        let mut out = Vec::new();
        s.write_header(&mut out).unwrap();
        s.write(&mut out, &r).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,name,tag\n7,\"a,b\",\n");
    }

    #[test]
    fn test_read_back_typed_cells() {
        let s = DelimitedSerializer::default().with_fields(vec!["id".into(), "name".into(), "tag".into()]);
        let mut input = "7,\"say \"\"hi\"\"\",\n".as_bytes();
        let v = s.read(&mut input).unwrap().unwrap();
        let r = v.as_record().unwrap();
        assert_eq!(r.get("id"), Some(&Value::Long(7)));
        assert_eq!(r.get("name"), Some(&Value::string("say \"hi\"")));
        assert_eq!(r.get("tag"), Some(&Value::Null));
        assert_eq!(s.read(&mut input).unwrap(), None);
    }

    #[test]
    fn test_arrays_without_fields() {
        let s = DelimitedSerializer::new(b'\t');
        let mut input = "1\tplain text\t2.5\n".as_bytes();
        let v = s.read(&mut input).unwrap().unwrap();
        assert_eq!(
            v,
            Value::Array(vec![Value::Long(1), Value::string("plain text"), Value::Double(2.5)])
        );
    }

    #[test]
    fn test_cell_count_mismatch() {
        let s = DelimitedSerializer::default().with_fields(vec!["a".into()]);
        let mut input = "1,2\n".as_bytes();
        assert!(matches!(s.read(&mut input), Err(SerializationError::Malformed(_))));
    }
}
