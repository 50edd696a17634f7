//! Builtin functions
//!
//! Null handling follows one rule: a scalar builtin given a null argument
//! returns null, except `eq`/`ne` (which compare nulls like any other value)
//! and the three-valued `and`/`or`. Aggregates skip nulls, and the
//! aggregate of no values is null (`count` excepted, which counts nulls).

use std::cmp::Ordering;

use bigdecimal::Zero;

use super::errors::EvalError;
use super::function::{Function, FunctionRegistry};
use crate::error::Result;
use crate::iter::{self, JsonIter, RegexMatchIter};
use crate::schema::Schema;
use crate::value::{
    format_date, from_base64, from_hex, parse_date, to_base64, to_hex, JsonType, Value, ValueError,
};

pub(crate) fn register_all(registry: &mut FunctionRegistry) {
    let builtins = [
        comparison("eq", |o| o == Ordering::Equal),
        comparison("ne", |o| o != Ordering::Equal),
        comparison("lt", |o| o == Ordering::Less),
        comparison("le", |o| o != Ordering::Greater),
        comparison("gt", |o| o == Ordering::Greater),
        comparison("ge", |o| o != Ordering::Less),
        arithmetic("add", ArithOp::Add),
        arithmetic("sub", ArithOp::Sub),
        arithmetic("mul", ArithOp::Mul),
        arithmetic("div", ArithOp::Div),
        Function::scalar("not", 1, Schema::nullable(Schema::boolean()), |args| {
            match &args[0] {
                Value::Null => Ok(Value::Null),
                v => Ok(Value::Boolean(!v.as_bool()?)),
            }
        }),
        Function::scalar("and", 2, Schema::nullable(Schema::boolean()), |args| {
            kleene(&args[0], &args[1], false)
        }),
        Function::scalar("or", 2, Schema::nullable(Schema::boolean()), |args| {
            kleene(&args[0], &args[1], true)
        }),
        Function::aggregate("count", Schema::long(), |input| {
            let n = iter::count(input)?;
            let n = i64::try_from(n)
                .map_err(|_| ValueError::ArithmeticOverflow(format!("count {} does not fit a long", n)))?;
            Ok(Value::Long(n))
        }),
        Function::aggregate("sum", Schema::nullable(Schema::numeric()), |input| {
            fold_non_null(input, |acc, v| arith(ArithOp::Add, &acc, &v))
        }),
        Function::aggregate("min", Schema::any(), |input| {
            fold_non_null(input, |acc, v| Ok(if v < acc { v } else { acc }))
        }),
        Function::aggregate("max", Schema::any(), |input| {
            fold_non_null(input, |acc, v| Ok(if v > acc { v } else { acc }))
        }),
        Function::scalar("to_hex", 1, Schema::nullable(Schema::string()), |args| {
            unary(&args[0], |v| Ok(Value::String(to_hex(v.as_binary()?))))
        }),
        Function::scalar("from_hex", 1, Schema::nullable(Schema::binary()), |args| {
            unary(&args[0], |v| Ok(Value::Binary(from_hex(v.as_str()?)?)))
        }),
        Function::scalar("to_base64", 1, Schema::nullable(Schema::string()), |args| {
            unary(&args[0], |v| Ok(Value::String(to_base64(v.as_binary()?))))
        }),
        Function::scalar("from_base64", 1, Schema::nullable(Schema::binary()), |args| {
            unary(&args[0], |v| Ok(Value::Binary(from_base64(v.as_str()?)?)))
        }),
        Function::scalar("date", 1, Schema::nullable(Schema::date()), |args| {
            unary(&args[0], |v| match v {
                Value::String(s) => Ok(Value::Date(parse_date(s)?)),
                Value::Date(d) => Ok(Value::Date(*d)),
                other => Ok(Value::Date(other.long_value_exact()?)),
            })
        }),
        Function::scalar("date_millis", 1, Schema::nullable(Schema::long()), |args| {
            unary(&args[0], |v| Ok(Value::Long(v.as_date()?)))
        }),
        Function::scalar("format_date", 1, Schema::nullable(Schema::string()), |args| {
            unary(&args[0], |v| Ok(Value::String(format_date(v.as_date()?)?)))
        }),
        Function::scalar("regex", 2, Schema::nullable(Schema::generic(JsonType::Regex)), |args| {
            let flags = match args.get(1) {
                Some(Value::Null) | None => "",
                Some(v) => v.as_str()?,
            };
            unary(&args[0], |v| Ok(Value::regex(v.as_str()?, flags)?))
        })
        .with_arity(1, Some(2)),
        Function::scalar("regex_match", 2, Schema::any(), |args| {
            if args[0].is_null() || args[1].is_null() {
                return Ok(Value::Null);
            }
            let mut matches = RegexMatchIter::new(args[0].as_regex()?.clone(), args[1].as_str()?);
            let first = if matches.move_next()? {
                matches.current().clone()
            } else {
                Value::Null
            };
            matches.close()?;
            Ok(first)
        }),
        Function::generator("regex_extract_all", 2, Schema::any(), |args| {
            if args[0].is_null() || args[1].is_null() {
                return Ok(iter::null());
            }
            let regex = args[0].as_regex()?.clone();
            Ok(Box::new(RegexMatchIter::all(regex, args[1].as_str()?)))
        }),
        Function::scalar("type_of", 1, Schema::string(), |args| {
            Ok(Value::string(args[0].type_name()))
        }),
        Function::scalar("strlen", 1, Schema::nullable(Schema::long()), |args| {
            unary(&args[0], |v| Ok(Value::Long(v.as_str()?.chars().count() as i64)))
        }),
    ];
    for f in builtins {
        // names above are distinct
        let _ = registry.register(f);
    }
}

fn unary(arg: &Value, f: impl FnOnce(&Value) -> Result<Value>) -> Result<Value> {
    if arg.is_null() {
        Ok(Value::Null)
    } else {
        f(arg)
    }
}

fn comparison(name: &'static str, accept: fn(Ordering) -> bool) -> Function {
    let null_aware = matches!(name, "eq" | "ne");
    Function::scalar(name, 2, Schema::nullable(Schema::boolean()), move |args| {
        let (a, b) = (&args[0], &args[1]);
        if !null_aware && (a.is_null() || b.is_null()) {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(accept(a.cmp(b))))
    })
}

/// Three-valued and/or; `dominant` is the value that decides alone
fn kleene(a: &Value, b: &Value, dominant: bool) -> Result<Value> {
    let a = if a.is_null() { None } else { Some(a.as_bool()?) };
    let b = if b.is_null() { None } else { Some(b.as_bool()?) };
    Ok(match (a, b) {
        (Some(x), _) if x == dominant => Value::Boolean(dominant),
        (_, Some(y)) if y == dominant => Value::Boolean(dominant),
        (Some(_), Some(_)) => Value::Boolean(!dominant),
        _ => Value::Null,
    })
}

fn fold_non_null(
    input: &mut dyn JsonIter,
    mut step: impl FnMut(Value, Value) -> Result<Value>,
) -> Result<Value> {
    if input.is_null() {
        return Ok(Value::Null);
    }
    let mut acc: Option<Value> = None;
    while input.move_next()? {
        let v = input.current();
        if v.is_null() {
            continue;
        }
        acc = Some(match acc {
            None => v.clone(),
            Some(prev) => step(prev, v.clone())?,
        });
    }
    input.close()?;
    Ok(acc.unwrap_or(Value::Null))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

fn arithmetic(name: &'static str, op: ArithOp) -> Function {
    Function::scalar(name, 2, Schema::nullable(Schema::numeric()), move |args| {
        arith(op, &args[0], &args[1])
    })
}

/// Numeric arithmetic with promotion
///
/// Double wins over everything; Long results that overflow, and inexact
/// Long division, are redone exactly in Decimal.
pub(crate) fn arith(op: ArithOp, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    for v in [a, b] {
        if !v.is_number() {
            return Err(ValueError::type_mismatch("number", v.type_name()).into());
        }
    }
    if matches!(a, Value::Double(_)) || matches!(b, Value::Double(_)) {
        let (x, y) = (a.to_f64()?, b.to_f64()?);
        let r = match op {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
            ArithOp::Div => x / y,
        };
        return Ok(Value::Double(r));
    }
    if let (Value::Long(x), Value::Long(y)) = (a, b) {
        let exact = match op {
            ArithOp::Add => x.checked_add(*y),
            ArithOp::Sub => x.checked_sub(*y),
            ArithOp::Mul => x.checked_mul(*y),
            ArithOp::Div => {
                if *y == 0 {
                    return Err(EvalError::DivisionByZero.into());
                }
                match x.checked_rem(*y) {
                    Some(0) => x.checked_div(*y),
                    _ => None,
                }
            }
        };
        if let Some(r) = exact {
            return Ok(Value::Long(r));
        }
    }
    let (x, y) = (a.to_decimal()?, b.to_decimal()?);
    let r = match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
        ArithOp::Div => {
            if y.is_zero() {
                return Err(EvalError::DivisionByZero.into());
            }
            x / y
        }
    };
    Ok(Value::Decimal(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::values;

    fn registry() -> FunctionRegistry {
        FunctionRegistry::with_builtins()
    }

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        match registry().get(name).unwrap().body() {
            super::super::function::FunctionImpl::Scalar(f) => f(args),
            _ => panic!("{} is not scalar", name),
        }
    }

    fn aggregate(name: &str, items: Vec<Value>) -> Value {
        match registry().get(name).unwrap().body() {
            super::super::function::FunctionImpl::Aggregate(f) => f(values(items).as_mut()).unwrap(),
            _ => panic!("{} is not an aggregate", name),
        }
    }

    #[test]
    fn test_long_overflow_promotes_to_decimal() {
        let r = call("add", &[Value::Long(i64::MAX), Value::Long(1)]).unwrap();
        assert_eq!(r, Value::decimal("9223372036854775808").unwrap());
        assert!(matches!(r, Value::Decimal(_)));
        assert_eq!(call("mul", &[Value::Long(6), Value::Long(7)]).unwrap(), Value::Long(42));
    }

    #[test]
    fn test_division() {
        assert_eq!(call("div", &[Value::Long(10), Value::Long(2)]).unwrap(), Value::Long(5));
        assert_eq!(
            call("div", &[Value::Long(10), Value::Long(4)]).unwrap(),
            Value::decimal("2.5").unwrap()
        );
        let err = call("div", &[Value::Long(1), Value::Long(0)]).unwrap_err();
        assert_eq!(err.code(), "JQ_EVAL_DIVISION_BY_ZERO");
        assert_eq!(
            call("div", &[Value::Double(1.0), Value::Long(0)]).unwrap(),
            Value::Double(f64::INFINITY)
        );
    }

    #[test]
    fn test_comparisons_across_numeric_encodings() {
        let three = Value::decimal("3.0").unwrap();
        assert_eq!(call("eq", &[Value::Long(3), three]).unwrap(), Value::Boolean(true));
        assert_eq!(call("lt", &[Value::Double(2.5), Value::Long(3)]).unwrap(), Value::Boolean(true));
        assert_eq!(call("lt", &[Value::Null, Value::Long(3)]).unwrap(), Value::Null);
        assert_eq!(call("eq", &[Value::Null, Value::Null]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_three_valued_logic() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(call("and", &[f.clone(), Value::Null]).unwrap(), f);
        assert_eq!(call("and", &[t.clone(), Value::Null]).unwrap(), Value::Null);
        assert_eq!(call("or", &[Value::Null, t.clone()]).unwrap(), t);
        assert_eq!(call("or", &[f.clone(), f.clone()]).unwrap(), f);
        assert_eq!(call("not", &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_aggregates_skip_nulls() {
        let items = vec![Value::Long(3), Value::Null, Value::Double(1.5), Value::Long(2)];
        assert_eq!(aggregate("count", items.clone()), Value::Long(4));
        assert_eq!(aggregate("sum", items.clone()), Value::Double(6.5));
        assert_eq!(aggregate("min", items.clone()), Value::Double(1.5));
        assert_eq!(aggregate("max", items), Value::Long(3));
        assert_eq!(aggregate("sum", vec![]), Value::Null);
    }

    #[test]
    fn test_codecs_and_strings() {
        let bin = call("from_hex", &[Value::string("0aff")]).unwrap();
        assert_eq!(bin, Value::Binary(vec![0x0a, 0xff]));
        assert_eq!(call("to_base64", &[bin]).unwrap(), Value::string("Cv8="));
        assert_eq!(call("strlen", &[Value::string("héllo")]).unwrap(), Value::Long(5));
        assert_eq!(call("type_of", &[Value::Double(1.0)]).unwrap(), Value::string("double"));
        assert_eq!(call("to_hex", &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_dates() {
        let d = call("date", &[Value::string("1970-01-01T00:00:01.000Z")]).unwrap();
        assert_eq!(d, Value::Date(1000));
        assert_eq!(call("date_millis", &[d]).unwrap(), Value::Long(1000));
    }

    #[test]
    fn test_regex_match_takes_first() {
        let re = call("regex", &[Value::string("[a-z]+"), Value::string("g")]).unwrap();
        let m = call("regex_match", &[re, Value::string("12 ab cd")]).unwrap();
        assert_eq!(m, Value::string("ab"));
    }
}
