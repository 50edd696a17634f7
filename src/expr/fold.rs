//! Constant folding
//!
//! A call folds when its function is a deterministic scalar and every
//! argument has folded to a constant. Constructors of constants fold to
//! the constant they build. A variable folds only when its declared slot
//! schema admits a single value; nothing that reads a sequence folds.

use super::ast::Expr;
use super::context::Context;
use super::function::FunctionImpl;
use crate::error::Result;
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::value::{Record, Value};

impl Expr {
    /// Copy of this expression with constant subexpressions evaluated
    pub fn fold(&self, ctx: &Context) -> Result<Expr> {
        let folded = match self {
            Expr::Const(_) => self.clone(),
            Expr::Var(name) => match ctx.declared_schema(name) {
                Some(schema) if schema.is_constant() => Expr::Const(schema.get_constant()?),
                _ => self.clone(),
            },
            Expr::Field { input, name } => match input.fold(ctx)? {
                Expr::Const(v) => Expr::Const(v.field(name)?),
                input => Expr::field(input, name.clone()),
            },
            Expr::Index { input, index } => Expr::index(input.fold(ctx)?, index.fold(ctx)?),
            Expr::Array(items) => {
                let items = fold_all(items, ctx)?;
                match constants(&items) {
                    Some(values) => Expr::Const(Value::Array(values)),
                    None => Expr::Array(items),
                }
            }
            Expr::Record(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, e) in fields {
                    out.push((name.clone(), e.fold(ctx)?));
                }
                if out.iter().all(|(_, e)| matches!(e, Expr::Const(_))) {
                    let record: Record = out
                        .into_iter()
                        .filter_map(|(name, e)| match e {
                            Expr::Const(v) => Some((name, v)),
                            _ => None,
                        })
                        .collect();
                    Expr::Const(Value::Record(record))
                } else {
                    Expr::Record(out)
                }
            }
            Expr::Call { name, args } => {
                let args = fold_all(args, ctx)?;
                let function = ctx.functions().get(name)?;
                match (function.body(), constants(&args)) {
                    (FunctionImpl::Scalar(f), Some(values)) if function.is_deterministic() => {
                        function.check_arity(values.len())?;
                        let value = f(&values)?;
                        MetricsRegistry::global().increment_constants_folded();
                        Logger::trace(Event::ConstantFolded, &[("function", name.as_str())]);
                        Expr::Const(value)
                    }
                    _ => Expr::call(name.clone(), args),
                }
            }
            Expr::Invoke { function, args } => Expr::invoke(function.fold(ctx)?, fold_all(args, ctx)?),
            Expr::Transform { input, var, body } => {
                Expr::transform(input.fold(ctx)?, var.clone(), body.fold(ctx)?)
            }
            Expr::Filter {
                input,
                var,
                predicate,
            } => Expr::filter(input.fold(ctx)?, var.clone(), predicate.fold(ctx)?),
            Expr::Expand { input, var, body } => Expr::expand(input.fold(ctx)?, var.clone(), body.fold(ctx)?),
            Expr::Concat(parts) => Expr::Concat(fold_all(parts, ctx)?),
            Expr::IfEmpty { input, default } => Expr::if_empty(input.fold(ctx)?, default.fold(ctx)?),
            Expr::Sort {
                input,
                var,
                key,
                descending,
            } => Expr::sort(input.fold(ctx)?, var.clone(), key.fold(ctx)?, *descending),
            Expr::GroupBy {
                input,
                var,
                key,
                key_var,
                group_var,
                body,
                presorted,
            } => {
                let e = Expr::group_by(
                    input.fold(ctx)?,
                    var.clone(),
                    key.fold(ctx)?,
                    key_var.clone(),
                    group_var.clone(),
                    body.fold(ctx)?,
                );
                if *presorted {
                    e.presorted()
                } else {
                    e
                }
            }
        };
        Ok(folded)
    }
}

fn fold_all(exprs: &[Expr], ctx: &Context) -> Result<Vec<Expr>> {
    exprs.iter().map(|e| e.fold(ctx)).collect()
}

fn constants(exprs: &[Expr]) -> Option<Vec<Value>> {
    exprs
        .iter()
        .map(|e| match e {
            Expr::Const(v) => Some(v.clone()),
            _ => None,
        })
        .collect()
}
