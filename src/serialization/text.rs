//! Text serializer contract and the default text serializer

use std::io::{BufRead, Write};

use super::errors::SerializationResult;
use super::text_reader::TextReader;
use super::text_writer::to_text;
use crate::value::Value;

/// Codec between values and a human-readable byte stream
pub trait TextSerializer: Send + Sync {
    fn write(&self, out: &mut dyn Write, value: &Value) -> SerializationResult<()>;

    /// Next value, or `None` at end of input
    fn read(&self, input: &mut dyn BufRead) -> SerializationResult<Option<Value>>;
}

/// JSON-superset text, optionally pretty-printed
#[derive(Debug, Clone, Copy)]
pub struct TextFullSerializer {
    indent_step: usize,
}

impl TextFullSerializer {
    pub fn new(indent_step: usize) -> Self {
        Self { indent_step }
    }

    pub fn compact() -> Self {
        Self::new(0)
    }

    pub fn indent_step(&self) -> usize {
        self.indent_step
    }
}

impl Default for TextFullSerializer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TextSerializer for TextFullSerializer {
    fn write(&self, out: &mut dyn Write, value: &Value) -> SerializationResult<()> {
        out.write_all(to_text(value, self.indent_step).as_bytes())?;
        Ok(())
    }

    fn read(&self, input: &mut dyn BufRead) -> SerializationResult<Option<Value>> {
        TextReader::new(input).read_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn test_values_share_one_stream() {
        let s = TextFullSerializer::default();
        let mut out = Vec::new();
        s.write(&mut out, &Value::Record(Record::new().with("a", Value::Long(1)))).unwrap();
        out.push(b'\n');
        s.write(&mut out, &Value::string("next")).unwrap();

        let mut input = out.as_slice();
        assert!(s.read(&mut input).unwrap().is_some());
        assert_eq!(s.read(&mut input).unwrap(), Some(Value::string("next")));
        assert_eq!(s.read(&mut input).unwrap(), None);
    }
}
