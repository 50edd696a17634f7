//! Evaluation
//!
//! `eval` produces one value; `iter` produces a lazy sequence. Each is
//! defined for every expression: a sequence-shaped expression evaluates to
//! the array of its elements (null for the null sequence), and a value
//! expression iterates as its array (the null sequence for null).

use super::ast::Expr;
use super::context::{Binding, Context};
use super::function::{Function, FunctionImpl};
use super::group;
use crate::error::Result;
use crate::iter::{
    self, collect_values, BoxIter, Concat, DefaultIfEmpty, Filter, Flatten, JsonIter, Map,
};
use crate::value::{Record, Value, ValueError};

impl Expr {
    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        match self {
            Expr::Const(v) => Ok(v.clone()),
            Expr::Var(name) => ctx.value_of(name),
            Expr::Field { input, name } => Ok(input.eval(ctx)?.field(name)?),
            Expr::Index { input, index } => {
                let array = input.eval(ctx)?;
                let index = index.eval(ctx)?;
                element_at(&array, &index)
            }
            Expr::Array(items) => {
                let values = items.iter().map(|e| e.eval(ctx)).collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(values))
            }
            Expr::Record(fields) => {
                let mut record = Record::with_capacity(fields.len());
                for (name, e) in fields {
                    record.set(name.clone(), e.eval(ctx)?);
                }
                Ok(Value::Record(record))
            }
            Expr::Call { name, args } => {
                let function = ctx.functions().get(name)?;
                call_value(&function, args, ctx, Vec::new())
            }
            Expr::Invoke { function, args } => {
                let target = function.eval(ctx)?;
                let fref = target.as_function()?;
                let resolved = ctx.functions().get(&fref.name)?;
                call_value(&resolved, args, ctx, fref.bound.clone())
            }
            _ => {
                let mut seq = self.iter(ctx)?;
                if seq.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Array(collect_values(seq.as_mut())?))
            }
        }
    }

    pub fn iter<'a>(&'a self, ctx: &'a Context) -> Result<BoxIter<'a>> {
        match self {
            Expr::Var(name) => match ctx.lookup(name)? {
                Binding::Spilled(array) => Ok(Box::new(array.iter()?)),
                Binding::Value(v) => value_iter(v),
            },
            Expr::Call { name, args } => {
                let function = ctx.functions().get(name)?;
                match function.body() {
                    FunctionImpl::Generator(f) => {
                        function.check_arity(args.len())?;
                        let values = eval_all(args, ctx)?;
                        f(&values)
                    }
                    _ => value_iter(self.eval(ctx)?),
                }
            }
            Expr::Transform { input, var, body } => {
                let source = input.iter(ctx)?;
                if source.is_null() {
                    return Ok(source);
                }
                Ok(Box::new(Map::new(source, move |v| {
                    ctx.bind(var, v.clone())?;
                    body.eval(ctx)
                })))
            }
            Expr::Filter {
                input,
                var,
                predicate,
            } => {
                let source = input.iter(ctx)?;
                if source.is_null() {
                    return Ok(source);
                }
                Ok(Box::new(Filter::new(source, move |v| {
                    ctx.bind(var, v.clone())?;
                    match predicate.eval(ctx)? {
                        Value::Null => Ok(false),
                        other => Ok(other.as_bool()?),
                    }
                })))
            }
            Expr::Expand { input, var, body } => {
                let source = input.iter(ctx)?;
                if source.is_null() {
                    return Ok(source);
                }
                let bodies = Map::new(source, move |v| {
                    ctx.bind(var, v.clone())?;
                    body.eval(ctx)
                });
                Ok(Box::new(Flatten::new(Box::new(bodies))))
            }
            Expr::Concat(parts) => {
                let sources = parts.iter().map(|p| p.iter(ctx)).collect::<Result<Vec<_>>>()?;
                Ok(Box::new(Concat::new(sources)))
            }
            Expr::IfEmpty { input, default } => {
                let source = input.iter(ctx)?;
                let fallback = default.iter(ctx)?;
                if source.is_null() {
                    return Ok(fallback);
                }
                Ok(Box::new(DefaultIfEmpty::new(source, fallback)))
            }
            Expr::Sort {
                input,
                var,
                key,
                descending,
            } => {
                let mut source = input.iter(ctx)?;
                if source.is_null() {
                    return Ok(source);
                }
                let mut keyed = Vec::new();
                while source.move_next()? {
                    let v = source.current().clone();
                    ctx.bind(var, v.clone())?;
                    keyed.push((key.eval(ctx)?, v));
                }
                source.close()?;
                keyed.sort_by(|(a, _), (b, _)| {
                    let o = a.cmp(b);
                    if *descending {
                        o.reverse()
                    } else {
                        o
                    }
                });
                Ok(iter::values(keyed.into_iter().map(|(_, v)| v).collect()))
            }
            Expr::GroupBy {
                input,
                var,
                key,
                key_var,
                group_var,
                body,
                presorted,
            } => {
                let source = input.iter(ctx)?;
                if source.is_null() {
                    return Ok(source);
                }
                let spec = group::GroupSpec {
                    var,
                    key,
                    key_var,
                    group_var,
                    body,
                };
                if *presorted {
                    Ok(Box::new(group::PresortedGroups::new(ctx, source, spec)))
                } else {
                    Ok(Box::new(group::HashedGroups::partition(ctx, source, spec)?))
                }
            }
            _ => value_iter(self.eval(ctx)?),
        }
    }
}

fn value_iter<'a>(value: Value) -> Result<BoxIter<'a>> {
    match value {
        Value::Null => Ok(iter::null()),
        Value::Array(items) => Ok(iter::values(items)),
        other => Err(ValueError::type_mismatch("array", other.type_name()).into()),
    }
}

fn eval_all(args: &[Expr], ctx: &Context) -> Result<Vec<Value>> {
    args.iter().map(|a| a.eval(ctx)).collect()
}

/// Call `function` for a single value; `bound` arguments go first
fn call_value(function: &Function, args: &[Expr], ctx: &Context, bound: Vec<Value>) -> Result<Value> {
    function.check_arity(bound.len() + args.len())?;
    match function.body() {
        FunctionImpl::Scalar(f) => {
            let mut values = bound;
            values.extend(eval_all(args, ctx)?);
            f(&values)
        }
        FunctionImpl::Aggregate(f) => match bound.into_iter().next() {
            Some(v) => f(value_iter(v)?.as_mut()),
            None => f(args[0].iter(ctx)?.as_mut()),
        },
        FunctionImpl::Generator(f) => {
            let mut values = bound;
            values.extend(eval_all(args, ctx)?);
            let mut seq = f(&values)?;
            if seq.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Array(collect_values(seq.as_mut())?))
        }
    }
}

fn element_at(array: &Value, index: &Value) -> Result<Value> {
    if array.is_null() || index.is_null() {
        return Ok(Value::Null);
    }
    let items = array.as_array()?;
    let i = index.long_value_exact()?;
    let len = items.len() as i64;
    let pos = if i < 0 { len + i } else { i };
    if pos < 0 {
        return Ok(Value::Null);
    }
    Ok(items.get(pos as usize).cloned().unwrap_or(Value::Null))
}
