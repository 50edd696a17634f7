//! Result schema inference
//!
//! Variables resolve through loop bindings first, then the declared slot
//! schemas of the context; anything else is `any`. A deterministic scalar
//! call whose argument schemas are all constant infers the constant it
//! would produce.

use super::ast::Expr;
use super::context::Context;
use super::function::FunctionImpl;
use crate::error::Result;
use crate::schema::{ArraySchema, RecordField, RecordSchema, Schema};
use crate::value::Value;

/// Loop variables visible to a subexpression, innermost last
type Scope = Vec<(String, Schema)>;

impl Expr {
    /// The schema every value of `eval` on this expression matches
    pub fn schema(&self, ctx: &Context) -> Result<Schema> {
        self.schema_in(ctx, &mut Vec::new())
    }

    fn schema_in(&self, ctx: &Context, scope: &mut Scope) -> Result<Schema> {
        match self {
            Expr::Const(v) => Ok(Schema::of_constant(v)),
            Expr::Var(name) => Ok(lookup(ctx, scope, name)),
            Expr::Field { input, name } => Ok(input.schema_in(ctx, scope)?.field_schema(name)),
            Expr::Index { input, index } => {
                index.schema_in(ctx, scope)?;
                Ok(match input.schema_in(ctx, scope)?.element_schema() {
                    Some(element) => Schema::nullable(element),
                    None => Schema::null(),
                })
            }
            Expr::Array(items) => {
                let head = items
                    .iter()
                    .map(|e| e.schema_in(ctx, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Schema::array(ArraySchema::fixed(head)))
            }
            Expr::Record(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, e) in fields {
                    out.push(RecordField::required(name.clone(), e.schema_in(ctx, scope)?));
                }
                Ok(Schema::record(RecordSchema::new(out, None)))
            }
            Expr::Call { name, args } => {
                let function = ctx.functions().get(name)?;
                function.check_arity(args.len())?;
                let arg_schemas = args
                    .iter()
                    .map(|a| a.schema_in(ctx, scope))
                    .collect::<Result<Vec<_>>>()?;
                if function.is_deterministic() && arg_schemas.iter().all(Schema::is_constant) {
                    if let FunctionImpl::Scalar(f) = function.body() {
                        let values = arg_schemas
                            .iter()
                            .map(Schema::get_constant)
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        return Ok(Schema::of_constant(&f(&values)?));
                    }
                }
                Ok(function.result_schema().clone())
            }
            Expr::Invoke { function, args } => {
                for a in args {
                    a.schema_in(ctx, scope)?;
                }
                function.schema_in(ctx, scope)?;
                // function values have no constant schema form, so only a
                // literal reference resolves statically
                match function.as_ref() {
                    Expr::Const(Value::Function(fref)) => {
                        Ok(ctx.functions().get(&fref.name)?.result_schema().clone())
                    }
                    _ => Ok(Schema::any()),
                }
            }
            Expr::Transform { input, var, body } => {
                let source = input.schema_in(ctx, scope)?;
                over_elements(&source, |element| {
                    with_bound(scope, var, element, |scope| body.schema_in(ctx, scope))
                })
            }
            Expr::Filter {
                input,
                var,
                predicate,
            } => {
                let source = input.schema_in(ctx, scope)?;
                over_elements(&source, |element| {
                    with_bound(scope, var, element.clone(), |scope| predicate.schema_in(ctx, scope))?;
                    Ok(element)
                })
            }
            Expr::Sort { input, var, key, .. } => {
                let source = input.schema_in(ctx, scope)?;
                over_elements(&source, |element| {
                    with_bound(scope, var, element.clone(), |scope| key.schema_in(ctx, scope))?;
                    Ok(element)
                })
            }
            Expr::Expand { input, var, body } => {
                let source = input.schema_in(ctx, scope)?;
                over_elements(&source, |element| {
                    let inner = with_bound(scope, var, element, |scope| body.schema_in(ctx, scope))?;
                    Ok(inner.element_schema().unwrap_or_else(Schema::any))
                })
            }
            Expr::Concat(parts) => {
                let mut elements: Option<Schema> = None;
                for p in parts {
                    if let Some(e) = p.schema_in(ctx, scope)?.element_schema() {
                        elements = Some(match elements {
                            Some(acc) => acc.union(&e),
                            None => e,
                        });
                    }
                }
                Ok(sequence_of(elements))
            }
            Expr::IfEmpty { input, default } => {
                let a = input.schema_in(ctx, scope)?;
                let b = default.schema_in(ctx, scope)?;
                let elements = match (a.element_schema(), b.element_schema()) {
                    (Some(x), Some(y)) => Some(x.union(&y)),
                    (x, y) => x.or(y),
                };
                let out = sequence_of(elements);
                if a.accepts_null() && b.accepts_null() {
                    Ok(Schema::nullable(out))
                } else {
                    Ok(out)
                }
            }
            Expr::GroupBy {
                input,
                var,
                key,
                key_var,
                group_var,
                body,
                ..
            } => {
                let source = input.schema_in(ctx, scope)?;
                over_elements(&source, |element| {
                    let key_schema =
                        with_bound(scope, var, element.clone(), |scope| key.schema_in(ctx, scope))?;
                    with_bound(scope, key_var, key_schema, |scope| {
                        with_bound(scope, group_var, Schema::array_of(element), |scope| {
                            body.schema_in(ctx, scope)
                        })
                    })
                })
            }
        }
    }
}

fn lookup(ctx: &Context, scope: &Scope, name: &str) -> Schema {
    scope
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, s)| s.clone())
        .or_else(|| ctx.declared_schema(name).cloned())
        .unwrap_or_else(Schema::any)
}

fn with_bound<T>(
    scope: &mut Scope,
    name: &str,
    schema: Schema,
    f: impl FnOnce(&mut Scope) -> Result<T>,
) -> Result<T> {
    scope.push((name.to_string(), schema));
    let out = f(scope);
    scope.pop();
    out
}

/// Array of what `each` maps the input's element schema to; nullable when
/// the input may be null
fn over_elements(source: &Schema, each: impl FnOnce(Schema) -> Result<Schema>) -> Result<Schema> {
    let Some(element) = source.element_schema() else {
        return Ok(Schema::null());
    };
    let out = Schema::array_of(each(element)?);
    if source.accepts_null() {
        Ok(Schema::nullable(out))
    } else {
        Ok(out)
    }
}

fn sequence_of(elements: Option<Schema>) -> Schema {
    match elements {
        Some(e) => Schema::array_of(e),
        None => Schema::array(ArraySchema::fixed(Vec::new())),
    }
}
