//! Argument constraints: predicates evaluated against one argument of a
//! recorded call.
//!
//! Constraints are data, so a report can describe exactly what was expected.
//! [`Constraint::Callback`] carries an arbitrary predicate together with a
//! description.

use std::fmt;
use std::rc::Rc;

use crate::value::{Value, ValueKind};

/// A predicate over one argument value.
#[derive(Clone)]
pub enum Constraint {
    /// Matches every value.
    Anything,
    /// Loose equality (`1` equals `1.0`).
    EqualTo(Value),
    GreaterThan(Value),
    LessThan(Value),
    /// The argument is a string containing the needle.
    StringContains(String),
    IsType(ValueKind),
    IsNull,
    Not(Box<Constraint>),
    AllOf(Vec<Constraint>),
    AnyOf(Vec<Constraint>),
    Callback {
        description: String,
        predicate: Rc<dyn Fn(&Value) -> bool>,
    },
}

impl Constraint {
    pub fn equal_to(value: impl Into<Value>) -> Self {
        Constraint::EqualTo(value.into())
    }

    pub fn greater_than(value: impl Into<Value>) -> Self {
        Constraint::GreaterThan(value.into())
    }

    pub fn less_than(value: impl Into<Value>) -> Self {
        Constraint::LessThan(value.into())
    }

    pub fn string_contains(needle: impl Into<String>) -> Self {
        Constraint::StringContains(needle.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Constraint) -> Self {
        Constraint::Not(Box::new(inner))
    }

    pub fn callback(
        description: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        Constraint::Callback {
            description: description.into(),
            predicate: Rc::new(predicate),
        }
    }

    /// Evaluates the constraint against `value`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Constraint::Anything => true,
            Constraint::EqualTo(expected) => value.loosely_equals(expected),
            Constraint::GreaterThan(bound) => value.compare(bound).is_some_and(|o| o.is_gt()),
            Constraint::LessThan(bound) => value.compare(bound).is_some_and(|o| o.is_lt()),
            Constraint::StringContains(needle) => {
                value.as_str().is_some_and(|s| s.contains(needle.as_str()))
            }
            Constraint::IsType(kind) => value.kind() == *kind,
            Constraint::IsNull => value.is_null(),
            Constraint::Not(inner) => !inner.matches(value),
            Constraint::AllOf(all) => all.iter().all(|c| c.matches(value)),
            Constraint::AnyOf(any) => any.iter().any(|c| c.matches(value)),
            Constraint::Callback { predicate, .. } => predicate(value),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Anything => write!(f, "is anything"),
            Constraint::EqualTo(v) => write!(f, "is equal to {v}"),
            Constraint::GreaterThan(v) => write!(f, "is greater than {v}"),
            Constraint::LessThan(v) => write!(f, "is less than {v}"),
            Constraint::StringContains(s) => write!(f, "contains {s:?}"),
            Constraint::IsType(kind) => write!(f, "is of type {}", kind.name()),
            Constraint::IsNull => write!(f, "is null"),
            Constraint::Not(inner) => write!(f, "not ({inner})"),
            Constraint::AllOf(all) => write_joined(f, all, " and "),
            Constraint::AnyOf(any) => write_joined(f, any, " or "),
            Constraint::Callback { description, .. } => write!(f, "{description}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Constraint], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, ")")
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constraint({self})")
    }
}
