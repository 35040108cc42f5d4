//! Rule AST: the closed node-kind set the interpreter walks.

use std::collections::BTreeMap;

/// A dynamically-typed value produced by value-producing rule nodes
/// (`attribute`, `subscript`, `function_call`, `name`, `constant`). Booleans
/// flow through the same representation as everything else so that
/// `comparison`/`subscript` can operate uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A callable resolved by `attribute` (e.g. a builtin or a helper)
    /// that has not yet been invoked. Rare in practice — most rule ASTs
    /// invoke what they look up via `function_call` in the same breath —
    /// but `attribute`'s contract requires returning it un-called
    /// when the caller doesn't immediately apply it.
    Callable(String),
}

impl Value {
    /// Python-ish truthiness: used wherever a value-producing node result
    /// is consumed in a boolean position (e.g. as an `and`/`or` operand
    /// via a nested rule, or as a helper's return value).
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Callable(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn index(&self, idx: &Value) -> Value {
        match (self, idx) {
            (Value::List(items), Value::Int(i)) => {
                let i = *i;
                if i >= 0 {
                    items.get(i as usize).cloned().unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
            (Value::Map(map), Value::Str(key)) => map.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// Comparison operators for `comparison` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GtE,
    Gt,
    LtE,
    Lt,
    Eq,
}

/// A name/count/group/flag field that is either a literal or a nested rule
/// which must itself evaluate to that literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolvable<T> {
    Literal(T),
    Nested(Box<Rule>),
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Resolvable::Literal(value)
    }
}

/// The closed rule AST variant set.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Constant(Value),
    Name(String),
    Attribute {
        object: Box<Rule>,
        attr: String,
    },
    Subscript {
        value: Box<Rule>,
        index: Box<Rule>,
    },
    FunctionCall {
        function: Box<Rule>,
        args: Vec<Rule>,
    },
    ItemCheck {
        item: Resolvable<String>,
    },
    CountCheck {
        item: Resolvable<String>,
        count: Option<Resolvable<i64>>,
    },
    GroupCheck {
        group: Resolvable<String>,
        count: Option<Resolvable<i64>>,
    },
    StateFlag {
        flag: Resolvable<String>,
    },
    Helper {
        name: String,
        args: Vec<Rule>,
    },
    StateMethod {
        method: String,
        args: Vec<Rule>,
    },
    Comparison {
        op: CompareOp,
        left: Box<Rule>,
        right: Box<Rule>,
    },
    And(Vec<Rule>),
    Or(Vec<Rule>),
}

impl Rule {
    pub fn and(conditions: impl Into<Vec<Rule>>) -> Self {
        Rule::And(conditions.into())
    }

    pub fn or(conditions: impl Into<Vec<Rule>>) -> Self {
        Rule::Or(conditions.into())
    }

    pub fn item(name: impl Into<String>) -> Self {
        Rule::ItemCheck { item: Resolvable::Literal(name.into()) }
    }

    pub fn count(name: impl Into<String>, count: i64) -> Self {
        Rule::CountCheck {
            item: Resolvable::Literal(name.into()),
            count: Some(Resolvable::Literal(count)),
        }
    }

    pub fn always_true() -> Self {
        Rule::Constant(Value::Bool(true))
    }

    pub fn always_false() -> Self {
        Rule::Constant(Value::Bool(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_truthiness_matches_python_shaped_rules() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(1).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(!Value::List(vec![]).truthy());
    }

    #[test]
    fn list_index_out_of_range_is_null() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.index(&Value::Int(5)), Value::Null);
        assert_eq!(list.index(&Value::Int(0)), Value::Int(1));
    }
}
