//! Schema algebra: merge, union and compaction
//!
//! - `merge` widens: the result admits every value either input admits and
//!   may admit more (ranges widen, constants drop). Schemas of mismatched
//!   kinds become an Or in lenient mode and are "not mergeable" (`None`) in
//!   strict mode.
//! - `union` is exact: an Or of the inputs, flattened, sorted, deduplicated.
//! - `compact` merges schemas observed at the same position until a fixed
//!   point, so sampled records collapse to one representative shape.

use serde::{Deserialize, Serialize};

use super::types::{ArraySchema, RecordField, RecordSchema, Schema, SchemaKind};

/// Behaviour of `merge` on schemas of different kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Mismatched kinds merge into an Or
    #[default]
    Lenient,
    /// Mismatched kinds are not mergeable
    Strict,
}

/// Parameters of [`compact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactOptions {
    /// Records with more declared fields than this fold their optional
    /// fields into the additional-field schema
    pub max_record_fields: usize,
    pub mode: MergeMode,
}

impl Default for CompactOptions {
    fn default() -> Self {
        Self {
            max_record_fields: 64,
            mode: MergeMode::Lenient,
        }
    }
}

fn widen_min<T: Ord + Clone>(a: &Option<T>, b: &Option<T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x <= y { x.clone() } else { y.clone() }),
        _ => None,
    }
}

fn widen_max<T: Ord + Clone>(a: &Option<T>, b: &Option<T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x >= y { x.clone() } else { y.clone() }),
        _ => None,
    }
}

fn widen_min_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some(x.min(y)),
        _ => None,
    }
}

fn widen_max_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some(x.max(y)),
        _ => None,
    }
}

fn same<T: PartialEq + Clone>(a: &Option<T>, b: &Option<T>) -> Option<T> {
    if a == b {
        a.clone()
    } else {
        None
    }
}

/// Length bounds of a string or binary schema, narrowed by its constant
fn effective_lengths(min: Option<u64>, max: Option<u64>, constant_len: Option<u64>) -> (Option<u64>, Option<u64>) {
    match constant_len {
        Some(len) => (Some(len), Some(len)),
        None => (min, max),
    }
}

fn is_numeric(kind: &SchemaKind) -> bool {
    matches!(
        kind,
        SchemaKind::Long { .. } | SchemaKind::Decimal { .. } | SchemaKind::Double { .. } | SchemaKind::Numeric
    )
}

/// Merge two schemas of the same kind; `None` when the kinds differ, or when
/// a child is not mergeable in strict mode
pub(crate) fn merge_same_kind(a: &Schema, b: &Schema, mode: MergeMode) -> Option<Schema> {
    use SchemaKind::*;
    let kind = match (&a.kind, &b.kind) {
        (Null, Null) => Null,
        (AnyNonNull, AnyNonNull) => AnyNonNull,
        (Boolean { value: x }, Boolean { value: y }) => Boolean { value: same(x, y) },
        (Long { min: a1, max: a2 }, Long { min: b1, max: b2 }) => Long {
            min: widen_min(a1, b1),
            max: widen_max(a2, b2),
        },
        (Date { min: a1, max: a2 }, Date { min: b1, max: b2 }) => Date {
            min: widen_min(a1, b1),
            max: widen_max(a2, b2),
        },
        (Decimal { min: a1, max: a2 }, Decimal { min: b1, max: b2 }) => Decimal {
            min: widen_min(a1, b1),
            max: widen_max(a2, b2),
        },
        (Double { min: a1, max: a2 }, Double { min: b1, max: b2 }) => Double {
            min: widen_min_f64(*a1, *b1),
            max: widen_max_f64(*a2, *b2),
        },
        (x, y) if is_numeric(x) && is_numeric(y) => Numeric,
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
        ) => {
            let (a1, a2) = effective_lengths(*a1, *a2, av.as_ref().map(|s| s.chars().count() as u64));
            let (b1, b2) = effective_lengths(*b1, *b2, bv.as_ref().map(|s| s.chars().count() as u64));
            String {
                min_length: widen_min(&a1, &b1),
                max_length: widen_max(&a2, &b2),
                value: same(av, bv),
            }
        }
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
        ) => {
            let (a1, a2) = effective_lengths(*a1, *a2, av.as_ref().map(|b| b.len() as u64));
            let (b1, b2) = effective_lengths(*b1, *b2, bv.as_ref().map(|b| b.len() as u64));
            Binary {
                min_length: widen_min(&a1, &b1),
                max_length: widen_max(&a2, &b2),
                value: same(av, bv),
            }
        }
        (Generic(x), Generic(y)) if x == y => Generic(*x),
        (Array(x), Array(y)) => Array(merge_arrays(x, y, mode)?),
        (Record(x), Record(y)) => Record(merge_records(x, y, mode)?),
        _ => return None,
    };
    Some(Schema {
        kind,
        annotation: same(&a.annotation, &b.annotation),
    })
}

/// Lengths of the part of an array beyond its first `k` positions
fn tail_bounds(a: &ArraySchema, k: usize) -> (u64, Option<u64>) {
    let extra = (a.head.len() - k) as u64;
    (extra + a.min_rest, a.max_rest.map(|m| extra + m))
}

fn merge_arrays(a: &ArraySchema, b: &ArraySchema, mode: MergeMode) -> Option<ArraySchema> {
    let k = a.head.len().min(b.head.len());
    let mut head = Vec::with_capacity(k);
    for (x, y) in a.head.iter().zip(b.head.iter()) {
        head.push(x.merge_with(y, mode)?);
    }

    let mut tail: Vec<&Schema> = Vec::new();
    tail.extend(a.head[k..].iter());
    tail.extend(a.rest.as_deref());
    tail.extend(b.head[k..].iter());
    tail.extend(b.rest.as_deref());

    let mut rest: Option<Schema> = None;
    for s in tail {
        rest = Some(match rest {
            None => s.clone(),
            Some(acc) => acc.merge_with(s, mode)?,
        });
    }

    let (a_min, a_max) = tail_bounds(a, k);
    let (b_min, b_max) = tail_bounds(b, k);
    let max_rest = match (a_max, b_max) {
        (Some(x), Some(y)) => Some(x.max(y)),
        _ => None,
    };
    Some(ArraySchema::new(head, rest, a_min.min(b_min), max_rest))
}

fn merge_records(a: &RecordSchema, b: &RecordSchema, mode: MergeMode) -> Option<RecordSchema> {
    let mut fields = Vec::with_capacity(a.fields.len().max(b.fields.len()));

    // fields present on one side only become optional; values from the other
    // side may still carry them through its additional-field schema
    for fa in &a.fields {
        match b.field(&fa.name) {
            Some(fb) => fields.push(RecordField {
                name: fa.name.clone(),
                schema: fa.schema.merge_with(&fb.schema, mode)?,
                optional: fa.optional || fb.optional,
            }),
            None => {
                let schema = match b.additional.as_deref() {
                    Some(extra) => fa.schema.merge_with(extra, mode)?,
                    None => fa.schema.clone(),
                };
                fields.push(RecordField::optional(fa.name.clone(), schema));
            }
        }
    }
    for fb in &b.fields {
        if a.field(&fb.name).is_none() {
            let schema = match a.additional.as_deref() {
                Some(extra) => fb.schema.merge_with(extra, mode)?,
                None => fb.schema.clone(),
            };
            fields.push(RecordField::optional(fb.name.clone(), schema));
        }
    }

    let additional = match (a.additional.as_deref(), b.additional.as_deref()) {
        (Some(x), Some(y)) => Some(x.merge_with(y, mode)?),
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (None, None) => None,
    };
    Some(RecordSchema::new(fields, additional))
}

/// Build a schema from a list of alternatives: flattened, sorted, deduplicated
pub(crate) fn from_alternatives(alts: Vec<Schema>) -> Schema {
    let mut flat: Vec<Schema> = Vec::with_capacity(alts.len());
    for s in alts {
        match s.kind {
            SchemaKind::Or(inner) if s.annotation.is_none() => flat.extend(inner),
            _ => flat.push(s),
        }
    }
    flat.sort();
    flat.dedup();

    if flat.iter().any(|s| matches!(s.kind, SchemaKind::Any)) {
        return Schema::any();
    }
    if flat.iter().any(|s| matches!(s.kind, SchemaKind::AnyNonNull)) {
        let nullable = flat.iter().any(Schema::accepts_null);
        return if nullable { Schema::any() } else { Schema::non_null() };
    }
    match flat.len() {
        0 => Schema::any(),
        1 => flat.pop().unwrap_or_else(Schema::any),
        _ => Schema::new(SchemaKind::Or(flat)),
    }
}

impl Schema {
    /// Lenient merge; always `Some`
    pub fn merge(&self, other: &Schema) -> Option<Schema> {
        self.merge_with(other, MergeMode::Lenient)
    }

    /// Merge under an explicit mode
    pub fn merge_with(&self, other: &Schema, mode: MergeMode) -> Option<Schema> {
        if self == other {
            return Some(self.clone());
        }
        match (&self.kind, &other.kind) {
            (SchemaKind::Any, _) | (_, SchemaKind::Any) => return Some(Schema::any()),
            (SchemaKind::Or(_), _) | (_, SchemaKind::Or(_)) => return merge_alternatives(self, other, mode),
            (SchemaKind::AnyNonNull, _) if !other.accepts_null() => return Some(Schema::non_null()),
            (_, SchemaKind::AnyNonNull) if !self.accepts_null() => return Some(Schema::non_null()),
            _ => {}
        }
        if let Some(merged) = merge_same_kind(self, other, mode) {
            return Some(merged);
        }
        match mode {
            MergeMode::Lenient => Some(self.union(other)),
            MergeMode::Strict => None,
        }
    }

    /// Exact union of the two schemas
    pub fn union(&self, other: &Schema) -> Schema {
        if self == other {
            return self.clone();
        }
        from_alternatives(vec![self.clone(), other.clone()])
    }
}

/// Fold the alternatives of `b` into those of `a`, merging same-kind pairs
///
/// In strict mode an alternative of `b` that has no same-kind partner makes
/// the pair not mergeable.
fn merge_alternatives(a: &Schema, b: &Schema, mode: MergeMode) -> Option<Schema> {
    let mut result: Vec<Schema> = a.alternatives().to_vec();
    for s in b.alternatives() {
        let slot = result
            .iter()
            .enumerate()
            .find_map(|(i, r)| merge_same_kind(r, s, mode).map(|m| (i, m)));
        match slot {
            Some((i, merged)) => result[i] = merged,
            None => {
                if mode == MergeMode::Strict {
                    return None;
                }
                result.push(s.clone());
            }
        }
    }
    Some(from_alternatives(result))
}

/// Merge schemas observed at the same logical position until a fixed point
///
/// Returns `None` only for an empty input.
pub fn compact(schemas: &[Schema], options: &CompactOptions) -> Option<Schema> {
    let mut pool: Vec<Schema> = schemas
        .iter()
        .flat_map(|s| s.alternatives().iter().cloned())
        .collect();
    if pool.is_empty() {
        return None;
    }
    pool.sort();
    pool.dedup();

    loop {
        let mut merged_pair = None;
        'scan: for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                if let Some(m) = merge_same_kind(&pool[i], &pool[j], options.mode) {
                    merged_pair = Some((i, j, m));
                    break 'scan;
                }
            }
        }
        match merged_pair {
            Some((i, j, m)) => {
                pool[i] = m;
                pool.remove(j);
            }
            None => break,
        }
    }

    let pool = pool
        .into_iter()
        .map(|s| collapse_records(s, options))
        .collect();
    Some(from_alternatives(pool))
}

/// Fold optional fields of oversized records into their additional schema
fn collapse_records(schema: Schema, options: &CompactOptions) -> Schema {
    let Schema { kind, annotation } = schema;
    let kind = match kind {
        SchemaKind::Array(a) => SchemaKind::Array(ArraySchema {
            head: a.head.into_iter().map(|s| collapse_records(s, options)).collect(),
            rest: a.rest.map(|s| Box::new(collapse_records(*s, options))),
            min_rest: a.min_rest,
            max_rest: a.max_rest,
        }),
        SchemaKind::Or(alts) => SchemaKind::Or(alts.into_iter().map(|s| collapse_records(s, options)).collect()),
        SchemaKind::Record(r) => {
            let oversized = r.fields.len() > options.max_record_fields;
            let mut additional = r.additional.map(|s| collapse_records(*s, options));
            let mut kept = Vec::with_capacity(r.fields.len());
            for f in r.fields {
                let schema = collapse_records(f.schema, options);
                if oversized && f.optional {
                    additional = Some(match additional {
                        None => schema,
                        Some(acc) => acc.merge(&schema).unwrap_or_else(Schema::any),
                    });
                } else {
                    kept.push(RecordField {
                        name: f.name,
                        schema,
                        optional: f.optional,
                    });
                }
            }
            SchemaKind::Record(RecordSchema::new(kept, additional))
        }
        other => other,
    };
    Schema { kind, annotation }
}
