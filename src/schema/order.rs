//! Total order on schemas
//!
//! Kinds order by `SchemaType`; ties break on nested content (constants
//! included) and finally on the annotation record. The order is used to
//! keep Or alternatives canonical and to intern identical schema graphs.

use std::cmp::Ordering;

use super::types::{ArraySchema, RecordSchema, Schema, SchemaKind};
use crate::value::cmp_f64;

fn cmp_opt_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp_f64(x, y),
    }
}

fn cmp_kind(a: &SchemaKind, b: &SchemaKind) -> Ordering {
    use SchemaKind::*;
    match (a, b) {
        (Boolean { value: x }, Boolean { value: y }) => x.cmp(y),
        (Long { min: a1, max: a2 }, Long { min: b1, max: b2 })
        | (Date { min: a1, max: a2 }, Date { min: b1, max: b2 }) => a1.cmp(b1).then_with(|| a2.cmp(b2)),
        (Decimal { min: a1, max: a2 }, Decimal { min: b1, max: b2 }) => a1.cmp(b1).then_with(|| a2.cmp(b2)),
        (Double { min: a1, max: a2 }, Double { min: b1, max: b2 }) => {
            cmp_opt_f64(*a1, *b1).then_with(|| cmp_opt_f64(*a2, *b2))
        }
        (
            String {
                min_length: a1,
                max_length: a2,
                value: av,
            },
            String {
                min_length: b1,
                max_length: b2,
                value: bv,
            },
        ) => a1.cmp(b1).then_with(|| a2.cmp(b2)).then_with(|| av.cmp(bv)),
        (
            Binary {
                min_length: a1,
                max_length: a2,
                value: av,
            },
            Binary {
                min_length: b1,
                max_length: b2,
                value: bv,
            },
        ) => a1.cmp(b1).then_with(|| a2.cmp(b2)).then_with(|| av.cmp(bv)),
        (Generic(x), Generic(y)) => x.cmp(y),
        (Array(x), Array(y)) => cmp_array(x, y),
        (Record(x), Record(y)) => cmp_record(x, y),
        (Or(x), Or(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn cmp_array(a: &ArraySchema, b: &ArraySchema) -> Ordering {
    a.head
        .cmp(&b.head)
        .then_with(|| a.rest.cmp(&b.rest))
        .then_with(|| a.min_rest.cmp(&b.min_rest))
        .then_with(|| match (a.max_rest, b.max_rest) {
            // unbounded sorts last
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        })
}

fn cmp_record(a: &RecordSchema, b: &RecordSchema) -> Ordering {
    for (fa, fb) in a.fields.iter().zip(b.fields.iter()) {
        let c = fa
            .name
            .as_bytes()
            .cmp(fb.name.as_bytes())
            .then_with(|| fa.optional.cmp(&fb.optional))
            .then_with(|| fa.schema.cmp(&fb.schema));
        if c != Ordering::Equal {
            return c;
        }
    }
    a.fields
        .len()
        .cmp(&b.fields.len())
        .then_with(|| a.additional.cmp(&b.additional))
}

impl Ord for Schema {
    fn cmp(&self, other: &Self) -> Ordering {
        self.schema_type()
            .cmp(&other.schema_type())
            .then_with(|| cmp_kind(&self.kind, &other.kind))
            .then_with(|| self.annotation.cmp(&other.annotation))
    }
}

impl PartialOrd for Schema {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Schema {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RecordField, SchemaType};
    use crate::value::{Record, Value};

    #[test]
    fn test_type_order_first() {
        assert!(Schema::any() < Schema::non_null());
        assert!(Schema::array_of(Schema::any()) < Schema::binary());
        assert!(Schema::long() < Schema::null());
        assert!(Schema::record(RecordSchema::new(vec![], None)) < Schema::string());
        assert_eq!(Schema::long().schema_type(), SchemaType::Long);
    }

    #[test]
    fn test_content_then_annotation() {
        let narrow = Schema::long_range(Some(0), Some(5));
        let wide = Schema::long_range(Some(0), Some(9));
        assert!(narrow < wide);
        assert!(Schema::long() < narrow);

        let doc = Record::new().with("doc", Value::string("x"));
        let annotated = narrow.clone().with_annotation(doc);
        assert!(narrow < annotated);
        assert_ne!(narrow, annotated);
    }

    #[test]
    fn test_record_field_order() {
        let a = Schema::record(RecordSchema::new(vec![RecordField::required("a", Schema::long())], None));
        let b = Schema::record(RecordSchema::new(vec![RecordField::optional("a", Schema::long())], None));
        let c = Schema::record(RecordSchema::new(vec![RecordField::required("b", Schema::long())], None));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_sorting_is_deterministic() {
        let mut v = vec![Schema::string(), Schema::null(), Schema::long(), Schema::boolean()];
        v.sort();
        let names: Vec<String> = v.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["boolean", "long", "null", "string"]);
    }
}
