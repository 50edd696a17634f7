//! Input adapters

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use super::errors::{AdapterError, AdapterResult};
use super::{AdapterState, InputAdapter};
use crate::error::Result;
use crate::iter::{self, BoxIter, Cursor, JsonIter};
use crate::schema::Schema;
use crate::serialization::{FullSerializer, SerializationConfig};
use crate::value::Value;

/// Values held in memory
pub struct ArrayInput {
    values: Vec<Value>,
    state: AdapterState,
}

impl ArrayInput {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            state: AdapterState::Created,
        }
    }
}

impl InputAdapter for ArrayInput {
    fn open(&mut self) -> Result<()> {
        Ok(self.state.open()?)
    }

    fn iter(&mut self) -> Result<BoxIter<'_>> {
        self.state.require_open()?;
        Ok(iter::values(self.values.clone()))
    }

    fn schema(&self) -> Schema {
        Schema::infer(&Value::Array(self.values.clone()))
    }

    fn close(&mut self) -> Result<()> {
        self.state = AdapterState::Closed;
        Ok(())
    }
}

/// A stream of full-encoded binary values
pub struct BinaryStreamInput<R> {
    input: R,
    serializer: Arc<dyn FullSerializer>,
    schema: Schema,
    state: AdapterState,
}

impl<R: BufRead> BinaryStreamInput<R> {
    /// Read with the process-wide binary serializer
    pub fn new(input: R) -> Self {
        let serializer = SerializationConfig::process_default().binary().clone();
        Self {
            input,
            serializer,
            schema: Schema::array_of(Schema::any()),
            state: AdapterState::Created,
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn FullSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Declare the schema of the whole stream
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

impl BinaryStreamInput<BufReader<File>> {
    pub fn from_path(path: &Path) -> AdapterResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> InputAdapter for BinaryStreamInput<R> {
    fn open(&mut self) -> Result<()> {
        Ok(self.state.open()?)
    }

    fn iter(&mut self) -> Result<BoxIter<'_>> {
        self.state.require_open()?;
        Ok(Box::new(BinaryStreamIter {
            input: &mut self.input,
            serializer: self.serializer.as_ref(),
            cursor: Cursor::new(),
        }))
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn close(&mut self) -> Result<()> {
        self.state = AdapterState::Closed;
        Ok(())
    }
}

struct BinaryStreamIter<'a, R> {
    input: &'a mut R,
    serializer: &'a dyn FullSerializer,
    cursor: Cursor,
}

impl<R: BufRead> JsonIter for BinaryStreamIter<'_, R> {
    fn move_next(&mut self) -> Result<bool> {
        let (input, serializer) = (&mut *self.input, self.serializer);
        self.cursor.advance(|| {
            // a value boundary at end of input ends the stream cleanly
            if input.fill_buf()?.is_empty() {
                return Ok(None);
            }
            Ok(Some(serializer.read(input, None)?))
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        Ok(())
    }
}

/// One JSON document per line; blank lines are skipped
pub struct JsonLinesInput<R> {
    input: R,
    schema: Schema,
    state: AdapterState,
}

impl<R: BufRead> JsonLinesInput<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            schema: Schema::array_of(Schema::any()),
            state: AdapterState::Created,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

impl JsonLinesInput<BufReader<File>> {
    pub fn from_path(path: &Path) -> AdapterResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> InputAdapter for JsonLinesInput<R> {
    fn open(&mut self) -> Result<()> {
        Ok(self.state.open()?)
    }

    fn iter(&mut self) -> Result<BoxIter<'_>> {
        self.state.require_open()?;
        Ok(Box::new(JsonLinesIter {
            input: &mut self.input,
            line: String::new(),
            line_no: 0,
            cursor: Cursor::new(),
        }))
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn close(&mut self) -> Result<()> {
        self.state = AdapterState::Closed;
        Ok(())
    }
}

struct JsonLinesIter<'a, R> {
    input: &'a mut R,
    line: String,
    line_no: u64,
    cursor: Cursor,
}

impl<R: BufRead> JsonLinesIter<'_, R> {
    fn next_document(&mut self) -> Result<Option<Value>> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line).map_err(AdapterError::from)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            let json: serde_json::Value = serde_json::from_str(text).map_err(|e| AdapterError::Parse {
                line: self.line_no,
                message: e.to_string(),
            })?;
            return Ok(Some(Value::from_json(&json)));
        }
    }
}

impl<R: BufRead> JsonIter for JsonLinesIter<'_, R> {
    fn move_next(&mut self) -> Result<bool> {
        let mut cursor = std::mem::replace(&mut self.cursor, Cursor::new());
        let result = cursor.advance(|| self.next_document());
        self.cursor = cursor;
        result
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::collect_values;
    use crate::serialization::DefaultFullSerializer;
    use crate::serialization::BasicSerializer;
    use crate::value::Record;
    use std::io::Cursor as IoCursor;

    #[test]
    fn test_iter_requires_open() {
        let mut input = ArrayInput::new(vec![Value::Long(1)]);
        assert_eq!(input.iter().err().map(|e| e.code()), Some("JQ_ADAPTER_NOT_OPEN"));
        input.open().unwrap();
        input.close().unwrap();
        assert_eq!(input.iter().err().map(|e| e.code()), Some("JQ_ADAPTER_CLOSED"));
    }

    #[test]
    fn test_array_input_schema_is_array() {
        let input = ArrayInput::new(vec![Value::Long(1), Value::string("a")]);
        assert!(input.schema().is_array_or_null());
    }

    #[test]
    fn test_binary_stream_reads_back_to_back_values() {
        let ser = DefaultFullSerializer::new();
        let values = vec![
            Value::Long(0),
            Value::string("two"),
            Value::Record(Record::new().with("a", Value::Null)),
        ];
        let mut bytes = Vec::new();
        for v in &values {
            ser.encode(&mut bytes, v).unwrap();
        }
        let mut input = BinaryStreamInput::new(IoCursor::new(bytes));
        input.open().unwrap();
        let mut seq = input.iter().unwrap();
        assert_eq!(collect_values(seq.as_mut()).unwrap(), values);
    }

    #[test]
    fn test_binary_stream_truncated_value() {
        let mut bytes = Vec::new();
        DefaultFullSerializer::new()
            .encode(&mut bytes, &Value::string("truncated"))
            .unwrap();
        bytes.truncate(bytes.len() - 2);
        let mut input = BinaryStreamInput::new(IoCursor::new(bytes));
        input.open().unwrap();
        let mut seq = input.iter().unwrap();
        assert_eq!(seq.move_next().unwrap_err().code(), "JQ_SER_TRUNCATED");
    }

    #[test]
    fn test_json_lines_skip_blank_and_report_line() {
        let text = "{\"a\": 1}\n\n[true, null]\n{oops\n";
        let mut input = JsonLinesInput::new(IoCursor::new(text.as_bytes().to_vec()));
        input.open().unwrap();
        let mut seq = input.iter().unwrap();
        assert!(seq.move_next().unwrap());
        assert_eq!(seq.current(), &Value::Record(Record::new().with("a", Value::Long(1))));
        assert!(seq.move_next().unwrap());
        assert_eq!(seq.current(), &Value::Array(vec![Value::Boolean(true), Value::Null]));
        let err = seq.move_next().unwrap_err();
        assert_eq!(err.code(), "JQ_ADAPTER_PARSE");
        assert!(err.to_string().starts_with("line 4:"));
    }
}
