//! Evaluator Tests
//!
//! End-to-end evaluation scenarios:
//! - Lazy sequences stay terminal once exhausted or failed
//! - Group-by over spilled groups, hashed and presorted
//! - Declared slot schemas are enforced on every bind
//! - Folding and schema inference agree with evaluation

use jsonq::config::EngineConfig;
use jsonq::expr::{Context, Expr, Function};
use jsonq::iter::{self, JsonIter, Map, Take};
use jsonq::schema::Schema;
use jsonq::value::{Record, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn spilling_context(dir: &TempDir, cache_size: usize) -> Context {
    let mut config = EngineConfig::default();
    config.spill_cache_size = cache_size;
    config.spill_dir = Some(dir.path().to_path_buf());
    Context::with_config(config)
}

fn order(customer: &str, amount: i64) -> Value {
    Value::Record(
        Record::new()
            .with("customer", Value::string(customer))
            .with("amount", Value::Long(amount)),
    )
}

fn orders() -> Value {
    Value::Array(vec![
        order("carol", 5),
        order("alice", 10),
        order("bob", 7),
        order("alice", 1),
        order("carol", 2),
        order("alice", 4),
    ])
}

/// `{customer: $k, total: sum($g[*].amount), orders: count($g)}`
fn totals_body() -> Expr {
    Expr::Record(vec![
        ("customer".to_string(), Expr::var("k")),
        (
            "total".to_string(),
            Expr::call(
                "sum",
                vec![Expr::transform(Expr::var("g"), "x", Expr::field(Expr::var("x"), "amount"))],
            ),
        ),
        ("orders".to_string(), Expr::call("count", vec![Expr::var("g")])),
    ])
}

fn total(customer: &str, total: i64, orders: i64) -> Value {
    Value::Record(
        Record::new()
            .with("customer", Value::string(customer))
            .with("total", Value::Long(total))
            .with("orders", Value::Long(orders)),
    )
}

// =============================================================================
// Sequence Protocol Tests
// =============================================================================

#[test]
fn test_exhausted_sequence_stays_exhausted() {
    let mut seq = Take::new(iter::values((0..5).map(Value::Long).collect()), 2);
    assert!(seq.move_next().unwrap());
    assert!(seq.move_next().unwrap());
    for _ in 0..3 {
        assert!(!seq.move_next().unwrap());
        assert_eq!(seq.current(), &Value::Null);
    }
}

#[test]
fn test_failed_sequence_stays_failed() {
    let source = iter::values(vec![Value::Long(1), Value::string("x"), Value::Long(3)]);
    let mut seq = Map::new(source, |v| Ok(Value::Long(v.long_value_exact()? * 2)));
    assert!(seq.move_next().unwrap());
    assert_eq!(seq.move_next().unwrap_err().code(), "JQ_VALUE_TYPE_MISMATCH");
    assert_eq!(seq.move_next().unwrap_err().code(), "JQ_ITER_POISONED");
    assert_eq!(seq.move_next().unwrap_err().code(), "JQ_ITER_POISONED");
}

#[test]
fn test_null_sequence_is_not_empty() {
    let ctx = Context::new();
    let null = Expr::transform(Expr::Const(Value::Null), "x", Expr::var("x"));
    let empty = Expr::transform(Expr::Const(Value::Array(vec![])), "x", Expr::var("x"));
    assert_eq!(null.eval(&ctx).unwrap(), Value::Null);
    assert_eq!(empty.eval(&ctx).unwrap(), Value::Array(vec![]));
    let mut seq = null.iter(&ctx).unwrap();
    assert!(seq.is_null());
    assert_eq!(seq.move_next().unwrap_err().code(), "JQ_ITER_NULL_SEQUENCE");
}

// =============================================================================
// Group-By Tests
// =============================================================================

#[test]
fn test_group_by_customer_spills_groups() {
    let dir = TempDir::new().unwrap();
    let ctx = spilling_context(&dir, 1);
    let e = Expr::group_by(
        Expr::Const(orders()),
        "o",
        Expr::field(Expr::var("o"), "customer"),
        "k",
        "g",
        totals_body(),
    );
    assert_eq!(
        e.eval(&ctx).unwrap(),
        Value::Array(vec![total("alice", 15, 3), total("bob", 7, 1), total("carol", 7, 2)])
    );
}

#[test]
fn test_presorted_group_by_matches_hashed() {
    let dir = TempDir::new().unwrap();
    let ctx = spilling_context(&dir, 2);
    let sorted = Expr::sort(
        Expr::Const(orders()),
        "o",
        Expr::field(Expr::var("o"), "customer"),
        false,
    );
    let key = Expr::field(Expr::var("o"), "customer");
    let presorted =
        Expr::group_by(sorted.clone(), "o", key.clone(), "k", "g", totals_body()).presorted();
    let hashed = Expr::group_by(sorted, "o", key, "k", "g", totals_body());
    assert_eq!(presorted.eval(&ctx).unwrap(), hashed.eval(&ctx).unwrap());
}

// =============================================================================
// Slot Schema Tests
// =============================================================================

#[test]
fn test_declared_schema_rejects_loop_values() {
    let mut ctx = Context::new();
    ctx.declare("x", Schema::long_range(Some(0), Some(10)));
    let e = Expr::transform(
        Expr::Const(Value::Array(vec![Value::Long(3), Value::Long(30)])),
        "x",
        Expr::var("x"),
    );
    let err = e.eval(&ctx).unwrap_err();
    assert_eq!(err.code(), "JQ_SCHEMA_VIOLATION");
    assert!(err.to_string().contains("30"));
}

// =============================================================================
// Function Tests
// =============================================================================

#[test]
fn test_registered_function_is_callable_and_folds() {
    let mut ctx = Context::new();
    ctx.functions_mut()
        .register(Function::scalar("square", 1, Schema::long(), |args| {
            let n = args[0].long_value_exact()?;
            Ok(Value::Long(n * n))
        }))
        .unwrap();
    let e = Expr::call("square", vec![Expr::call("add", vec![Expr::constant(1i64), Expr::constant(2i64)])]);
    assert_eq!(e.fold(&ctx).unwrap(), Expr::constant(9i64));
    assert_eq!(e.eval(&ctx).unwrap(), Value::Long(9));
    let schema = e.schema(&ctx).unwrap();
    assert!(schema.matches(&Value::Long(9)));
    assert!(!schema.matches(&Value::Long(10)));
}

#[test]
fn test_duplicate_registration_fails() {
    let mut ctx = Context::new();
    let err = ctx
        .functions_mut()
        .register(Function::scalar("add", 2, Schema::any(), |args| Ok(args[0].clone())))
        .unwrap_err();
    assert_eq!(err.code(), "JQ_EVAL_DUPLICATE_FUNCTION");
}

#[test]
fn test_regex_extract_all_is_lazy() {
    let ctx = Context::new();
    let e = Expr::call(
        "regex_extract_all",
        vec![
            Expr::call("regex", vec![Expr::constant("[a-z]+")]),
            Expr::constant("one two three"),
        ],
    );
    let mut seq = e.iter(&ctx).unwrap();
    assert!(seq.move_next().unwrap());
    assert_eq!(seq.current(), &Value::string("one"));
    seq.close().unwrap();
    assert!(!seq.move_next().unwrap());
    assert_eq!(
        e.eval(&ctx).unwrap(),
        Value::Array(vec![Value::string("one"), Value::string("two"), Value::string("three")])
    );
}
