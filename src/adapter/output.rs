//! Output adapters

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use super::errors::{AdapterError, AdapterResult};
use super::{AdapterState, OutputAdapter, RecordWriter};
use crate::error::Result;
use crate::serialization::{
    DelimitedSerializer, FullSerializer, SerializationConfig, TextFullSerializer, TextSerializer,
};
use crate::value::Value;

/// Writer state shared by the stream writers
struct Guard {
    closed: bool,
}

impl Guard {
    fn check(&self) -> AdapterResult<()> {
        if self.closed {
            return Err(AdapterError::Closed);
        }
        Ok(())
    }
}

/// Full-encoded binary values written back to back
pub struct BinaryStreamOutput<W: Write> {
    out: W,
    serializer: Arc<dyn FullSerializer>,
    state: AdapterState,
}

impl<W: Write> BinaryStreamOutput<W> {
    pub fn new(out: W) -> Self {
        let serializer = SerializationConfig::process_default().binary().clone();
        Self {
            out,
            serializer,
            state: AdapterState::Created,
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn FullSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl BinaryStreamOutput<BufWriter<File>> {
    pub fn create(path: &Path) -> AdapterResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> OutputAdapter for BinaryStreamOutput<W> {
    fn open(&mut self) -> Result<()> {
        Ok(self.state.open()?)
    }

    fn writer(&mut self) -> Result<Box<dyn RecordWriter + '_>> {
        self.state.require_open()?;
        Ok(Box::new(BinaryStreamWriter {
            out: &mut self.out,
            serializer: self.serializer.as_ref(),
            buf: Vec::new(),
            guard: Guard { closed: false },
        }))
    }

    fn close(&mut self) -> Result<()> {
        if self.state == AdapterState::Open {
            self.out.flush().map_err(AdapterError::from)?;
        }
        self.state = AdapterState::Closed;
        Ok(())
    }
}

struct BinaryStreamWriter<'a, W> {
    out: &'a mut W,
    serializer: &'a dyn FullSerializer,
    buf: Vec<u8>,
    guard: Guard,
}

impl<W: Write> RecordWriter for BinaryStreamWriter<'_, W> {
    fn write(&mut self, value: &Value) -> Result<()> {
        self.guard.check()?;
        self.buf.clear();
        self.serializer.encode(&mut self.buf, value)?;
        self.out.write_all(&self.buf).map_err(AdapterError::from)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.guard.closed {
            self.guard.closed = true;
            self.out.flush().map_err(AdapterError::from)?;
        }
        Ok(())
    }
}

/// One value per line through a text serializer
pub struct TextOutput<W: Write> {
    out: W,
    serializer: Arc<dyn TextSerializer>,
    state: AdapterState,
}

impl<W: Write> TextOutput<W> {
    /// Compact text, one value per line
    pub fn new(out: W) -> Self {
        Self::with_serializer(out, Arc::new(TextFullSerializer::compact()))
    }

    pub fn with_serializer(out: W, serializer: Arc<dyn TextSerializer>) -> Self {
        Self {
            out,
            serializer,
            state: AdapterState::Created,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputAdapter for TextOutput<W> {
    fn open(&mut self) -> Result<()> {
        Ok(self.state.open()?)
    }

    fn writer(&mut self) -> Result<Box<dyn RecordWriter + '_>> {
        self.state.require_open()?;
        Ok(Box::new(TextWriter {
            out: &mut self.out,
            serializer: self.serializer.as_ref(),
            newline: true,
            guard: Guard { closed: false },
        }))
    }

    fn close(&mut self) -> Result<()> {
        if self.state == AdapterState::Open {
            self.out.flush().map_err(AdapterError::from)?;
        }
        self.state = AdapterState::Closed;
        Ok(())
    }
}

/// Delimited rows; the serializer terminates each row itself
pub struct DelimitedOutput<W: Write> {
    out: W,
    serializer: DelimitedSerializer,
    state: AdapterState,
}

impl<W: Write> DelimitedOutput<W> {
    /// A header row is written on open when the serializer names its fields
    pub fn new(out: W, serializer: DelimitedSerializer) -> Self {
        Self {
            out,
            serializer,
            state: AdapterState::Created,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputAdapter for DelimitedOutput<W> {
    fn open(&mut self) -> Result<()> {
        let first = self.state == AdapterState::Created;
        self.state.open()?;
        if first && self.serializer.fields().is_some() {
            self.serializer.write_header(&mut self.out)?;
        }
        Ok(())
    }

    fn writer(&mut self) -> Result<Box<dyn RecordWriter + '_>> {
        self.state.require_open()?;
        Ok(Box::new(TextWriter {
            out: &mut self.out,
            serializer: &self.serializer,
            newline: false,
            guard: Guard { closed: false },
        }))
    }

    fn close(&mut self) -> Result<()> {
        if self.state == AdapterState::Open {
            self.out.flush().map_err(AdapterError::from)?;
        }
        self.state = AdapterState::Closed;
        Ok(())
    }
}

struct TextWriter<'a, W> {
    out: &'a mut W,
    serializer: &'a dyn TextSerializer,
    newline: bool,
    guard: Guard,
}

impl<W: Write> RecordWriter for TextWriter<'_, W> {
    fn write(&mut self, value: &Value) -> Result<()> {
        self.guard.check()?;
        self.serializer.write(&mut *self.out, value)?;
        if self.newline {
            self.out.write_all(b"\n").map_err(AdapterError::from)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.guard.closed {
            self.guard.closed = true;
            self.out.flush().map_err(AdapterError::from)?;
        }
        Ok(())
    }
}

/// Values collected in memory
#[derive(Debug, Default)]
pub struct CollectingOutput {
    values: Vec<Value>,
    open: bool,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl OutputAdapter for CollectingOutput {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn writer(&mut self) -> Result<Box<dyn RecordWriter + '_>> {
        if !self.open {
            return Err(AdapterError::NotOpen.into());
        }
        Ok(Box::new(CollectingWriter {
            values: &mut self.values,
            guard: Guard { closed: false },
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

struct CollectingWriter<'a> {
    values: &'a mut Vec<Value>,
    guard: Guard,
}

impl RecordWriter for CollectingWriter<'_> {
    fn write(&mut self, value: &Value) -> Result<()> {
        self.guard.check()?;
        self.values.push(value.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.guard.closed = true;
        Ok(())
    }
}
