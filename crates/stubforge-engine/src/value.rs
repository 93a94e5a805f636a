//! Runtime value representation for doubled calls.
//!
//! [`Value`] is the dynamic counterpart to stubforge-core's declared types.
//! Arguments passed to a double, values returned by it, and the values argument
//! constraints compare against are all `Value`s.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use stubforge_core::id::DoubleId;

/// A runtime value passed to or returned from a double.
///
/// Maps to the declared type system:
/// - Scalars: `Bool`, `Int`, `Float`, `Str`
/// - Compound: `Seq`
/// - Special: `Null` (absence), `Unit` (void operations return no value)
/// - `Double`: a reference to a synthesized double, by identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Double(DoubleId),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Unit,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Double,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Seq(_) => ValueKind::Seq,
            Value::Double(_) => ValueKind::Double,
        }
    }

    /// Returns a human-readable description of the value's type.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the double this value refers to, if any.
    pub fn as_double(&self) -> Option<DoubleId> {
        match self {
            Value::Double(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Loose equality: integers and floats compare numerically, everything
    /// else compares structurally.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Seq(a), Value::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            _ => self == other,
        }
    }

    /// Orders numbers numerically and strings lexicographically. Other
    /// combinations are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Unit => "void",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Seq => "array",
            ValueKind::Double => "double",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "(no value)"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Double(id) => write!(f, "{id}"),
        }
    }
}

/// Renders an argument list as `a, b, c`.
pub fn render_arguments(args: &[Value]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
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

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<DoubleId> for Value {
    fn from(id: DoubleId) -> Self {
        Value::Double(id)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_names() {
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from(3).type_name(), "int");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Seq(vec![]).type_name(), "array");
        assert_eq!(Value::from(DoubleId(1)).type_name(), "double");
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn loose_equality_crosses_numeric_kinds() {
        assert!(Value::Int(1).loosely_equals(&Value::Float(1.0)));
        assert!(Value::Float(2.0).loosely_equals(&Value::Int(2)));
        assert!(!Value::Int(1).loosely_equals(&Value::Str("1".into())));
        assert!(Value::Seq(vec![Value::Int(1)]).loosely_equals(&Value::Seq(vec![Value::Float(1.0)])));
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::Null.compare(&Value::Int(0)), None);
    }

    #[test]
    fn display() {
        let v = Value::Seq(vec![Value::from("a"), Value::Int(2), Value::Float(0.0), Value::Null]);
        assert_eq!(v.to_string(), r#"["a", 2, 0.0, null]"#);
        assert_eq!(render_arguments(&[Value::from(1), Value::from(false)]), "1, false");
        assert_eq!(Value::Double(DoubleId(4)).to_string(), "double#4");
    }

    #[test]
    fn serde_roundtrip() {
        let v = Value::Seq(vec![Value::Double(DoubleId(2)), Value::from("s"), Value::Unit]);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
