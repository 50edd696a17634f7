//! Type classes and encoding tags
//!
//! `JsonType` is the ordering class of a value: values of different classes
//! order by class alone. `Encoding` is the concrete representation and its
//! one-byte tag in the full binary format; several encodings may share a
//! class (the three numeric encodings all belong to `Number`).

use std::fmt;

/// Ordering class of a value, declared in total-order position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JsonType {
    Null,
    Array,
    Record,
    Boolean,
    String,
    Number,
    Binary,
    Date,
    Schema,
    Function,
    Regex,
    Span,
}

impl JsonType {
    pub fn name(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Array => "array",
            JsonType::Record => "record",
            JsonType::Boolean => "boolean",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Binary => "binary",
            JsonType::Date => "date",
            JsonType::Schema => "schema",
            JsonType::Function => "function",
            JsonType::Regex => "regex",
            JsonType::Span => "span",
        }
    }

    pub fn from_name(name: &str) -> Option<JsonType> {
        let t = match name {
            "null" => JsonType::Null,
            "array" => JsonType::Array,
            "record" => JsonType::Record,
            "boolean" => JsonType::Boolean,
            "string" => JsonType::String,
            "number" => JsonType::Number,
            "binary" => JsonType::Binary,
            "date" => JsonType::Date,
            "schema" => JsonType::Schema,
            "function" => JsonType::Function,
            "regex" => JsonType::Regex,
            "span" => JsonType::Span,
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete representation of a value; the discriminant is the wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Encoding {
    Null = 2,
    Array = 4,
    Record = 5,
    Boolean = 6,
    String = 7,
    Binary = 8,
    Long = 9,
    Decimal = 10,
    Date = 11,
    Function = 12,
    Schema = 13,
    Regex = 15,
    Span = 16,
    Double = 17,
}

impl Encoding {
    pub const ALL: [Encoding; 14] = [
        Encoding::Null,
        Encoding::Array,
        Encoding::Record,
        Encoding::Boolean,
        Encoding::String,
        Encoding::Binary,
        Encoding::Long,
        Encoding::Decimal,
        Encoding::Date,
        Encoding::Function,
        Encoding::Schema,
        Encoding::Regex,
        Encoding::Span,
        Encoding::Double,
    ];

    /// The one-byte wire tag
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Encoding> {
        Encoding::ALL.iter().copied().find(|e| e.tag() == tag)
    }

    pub fn json_type(&self) -> JsonType {
        match self {
            Encoding::Null => JsonType::Null,
            Encoding::Array => JsonType::Array,
            Encoding::Record => JsonType::Record,
            Encoding::Boolean => JsonType::Boolean,
            Encoding::String => JsonType::String,
            Encoding::Binary => JsonType::Binary,
            Encoding::Long | Encoding::Decimal | Encoding::Double => JsonType::Number,
            Encoding::Date => JsonType::Date,
            Encoding::Function => JsonType::Function,
            Encoding::Schema => JsonType::Schema,
            Encoding::Regex => JsonType::Regex,
            Encoding::Span => JsonType::Span,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Long => "long",
            Encoding::Decimal => "decimal",
            Encoding::Double => "double",
            other => other.json_type().name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_order() {
        assert!(JsonType::Null < JsonType::Array);
        assert!(JsonType::Array < JsonType::Record);
        assert!(JsonType::Record < JsonType::Boolean);
        assert!(JsonType::Boolean < JsonType::String);
        assert!(JsonType::String < JsonType::Number);
        assert!(JsonType::Number < JsonType::Binary);
        assert!(JsonType::Date < JsonType::Schema);
        assert!(JsonType::Regex < JsonType::Span);
    }

    #[test]
    fn test_wire_tags() {
        assert_eq!(Encoding::Null.tag(), 2);
        assert_eq!(Encoding::Long.tag(), 9);
        assert_eq!(Encoding::Double.tag(), 17);
        assert_eq!(Encoding::from_tag(13), Some(Encoding::Schema));
        assert_eq!(Encoding::from_tag(14), None);
        assert_eq!(Encoding::from_tag(0), None);
    }

    #[test]
    fn test_numeric_encodings_share_a_class() {
        assert_eq!(Encoding::Long.json_type(), JsonType::Number);
        assert_eq!(Encoding::Decimal.json_type(), JsonType::Number);
        assert_eq!(Encoding::Double.json_type(), JsonType::Number);
        assert_eq!(Encoding::Decimal.name(), "decimal");
    }
}
