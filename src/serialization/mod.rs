//! Serialization subsystem
//!
//! Binary and text codecs for values.
//!
//! - Basic serializers encode one variant without a tag
//! - The full serializer writes a tag byte and dispatches to a basic one
//! - The schema serializer specializes the encoding to a known schema
//! - Text serializers render a JSON superset or delimited lines
//!
//! # Invariants
//!
//! 1. `read(write(v)) == v` for every value a serializer accepts
//! 2. Comparing encodings agrees with comparing the decoded values
//! 3. `read`, `skip` and `compare` consume exactly one encoded value
//! 4. Variable-length integers preserve order byte-wise
//!
//! Corrupt input fails with a typed error; it is never repaired.

mod basic;
mod config;
mod delimited;
mod errors;
mod full;
mod schema_binary;
mod text;
mod text_reader;
mod text_writer;
mod varint;

pub use basic::{
    ArraySerializer, BasicSerializer, BinarySerializer, BooleanSerializer, DateSerializer,
    DecimalSerializer, DoubleSerializer, FullSerializer, FunctionSerializer, LongSerializer,
    NullSerializer, RecordSerializer, RegexSerializer, SchemaValueSerializer, SpanSerializer,
    StringSerializer,
};
pub use config::{SerializationConfig, SerializerFactory};
pub use delimited::DelimitedSerializer;
pub use errors::{SerializationError, SerializationResult};
pub use full::DefaultFullSerializer;
pub use schema_binary::SchemaBinarySerializer;
pub use text::{TextFullSerializer, TextSerializer};
pub use text_reader::{parse_schema, parse_value, TextReader};
pub use text_writer::to_text;
pub use varint::{read_vslong, read_vulong, write_vslong, write_vulong};

