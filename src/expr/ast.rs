//! Expression tree
//!
//! Sequence-shaped expressions (`Transform` through `GroupBy`) name the
//! variable each element is bound to while their body runs.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    Var(String),
    /// Field of a record; null for a missing field or a null input
    Field { input: Box<Expr>, name: String },
    /// Element of an array; negative indexes count from the end
    Index { input: Box<Expr>, index: Box<Expr> },
    Array(Vec<Expr>),
    Record(Vec<(String, Expr)>),
    /// Call of a registered function by name
    Call { name: String, args: Vec<Expr> },
    /// Call of a function value
    Invoke { function: Box<Expr>, args: Vec<Expr> },
    Transform {
        input: Box<Expr>,
        var: String,
        body: Box<Expr>,
    },
    Filter {
        input: Box<Expr>,
        var: String,
        predicate: Box<Expr>,
    },
    /// Body yields an array (or null) per element; results are flattened
    Expand {
        input: Box<Expr>,
        var: String,
        body: Box<Expr>,
    },
    Concat(Vec<Expr>),
    IfEmpty { input: Box<Expr>, default: Box<Expr> },
    Sort {
        input: Box<Expr>,
        var: String,
        key: Box<Expr>,
        descending: bool,
    },
    /// One output per distinct key: `body` runs with the key bound to
    /// `key_var` and the group's elements bound to `group_var`
    ///
    /// Presorted input is swept run by run into one reused spilled array;
    /// otherwise groups are partitioned into one spilled array per key and
    /// emitted in key order.
    GroupBy {
        input: Box<Expr>,
        var: String,
        key: Box<Expr>,
        key_var: String,
        group_var: String,
        body: Box<Expr>,
        presorted: bool,
    },
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Expr {
        Expr::Const(value.into())
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn field(input: Expr, name: impl Into<String>) -> Expr {
        Expr::Field {
            input: Box::new(input),
            name: name.into(),
        }
    }

    pub fn index(input: Expr, index: Expr) -> Expr {
        Expr::Index {
            input: Box::new(input),
            index: Box::new(index),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn invoke(function: Expr, args: Vec<Expr>) -> Expr {
        Expr::Invoke {
            function: Box::new(function),
            args,
        }
    }

    pub fn transform(input: Expr, var: impl Into<String>, body: Expr) -> Expr {
        Expr::Transform {
            input: Box::new(input),
            var: var.into(),
            body: Box::new(body),
        }
    }

    pub fn filter(input: Expr, var: impl Into<String>, predicate: Expr) -> Expr {
        Expr::Filter {
            input: Box::new(input),
            var: var.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn expand(input: Expr, var: impl Into<String>, body: Expr) -> Expr {
        Expr::Expand {
            input: Box::new(input),
            var: var.into(),
            body: Box::new(body),
        }
    }

    pub fn if_empty(input: Expr, default: Expr) -> Expr {
        Expr::IfEmpty {
            input: Box::new(input),
            default: Box::new(default),
        }
    }

    pub fn sort(input: Expr, var: impl Into<String>, key: Expr, descending: bool) -> Expr {
        Expr::Sort {
            input: Box::new(input),
            var: var.into(),
            key: Box::new(key),
            descending,
        }
    }

    pub fn group_by(
        input: Expr,
        var: impl Into<String>,
        key: Expr,
        key_var: impl Into<String>,
        group_var: impl Into<String>,
        body: Expr,
    ) -> Expr {
        Expr::GroupBy {
            input: Box::new(input),
            var: var.into(),
            key: Box::new(key),
            key_var: key_var.into(),
            group_var: group_var.into(),
            body: Box::new(body),
            presorted: false,
        }
    }

    /// Mark a `GroupBy` as running over input already sorted by key;
    /// no effect on other expressions
    pub fn presorted(mut self) -> Expr {
        if let Expr::GroupBy { presorted, .. } = &mut self {
            *presorted = true;
        }
        self
    }

    /// Whether evaluation produces a sequence rather than a single value
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            Expr::Transform { .. }
                | Expr::Filter { .. }
                | Expr::Expand { .. }
                | Expr::Concat(_)
                | Expr::IfEmpty { .. }
                | Expr::Sort { .. }
                | Expr::GroupBy { .. }
        )
    }
}
