//! Expectations: declarative call-count and argument rules attached to a
//! double's operations and checked at the verification checkpoint.
//!
//! An [`Expectation`] never influences what a call returns. It is evaluated
//! only by [`verify`](verify::verify_plans), after the code under test ran.

pub mod verify;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::value::Value;

pub use verify::{Outcome, ReportEntry, VerificationError, VerificationReport};

/// How many matching calls an expectation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationCount {
    Any,
    Never,
    AtLeastOnce,
    Exactly(usize),
    AtMost(usize),
}

impl InvocationCount {
    pub fn once() -> Self {
        InvocationCount::Exactly(1)
    }

    /// Returns `true` if `count` matching calls satisfy this rule.
    pub fn is_satisfied_by(self, count: usize) -> bool {
        match self {
            InvocationCount::Any => true,
            InvocationCount::Never => count == 0,
            InvocationCount::AtLeastOnce => count >= 1,
            InvocationCount::Exactly(n) => count == n,
            InvocationCount::AtMost(n) => count <= n,
        }
    }
}

impl fmt::Display for InvocationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationCount::Any => write!(f, "any number of times"),
            InvocationCount::Never => write!(f, "never"),
            InvocationCount::AtLeastOnce => write!(f, "at least once"),
            InvocationCount::Exactly(1) => write!(f, "exactly once"),
            InvocationCount::Exactly(n) => write!(f, "exactly {n} times"),
            InvocationCount::AtMost(n) => write!(f, "at most {n} times"),
        }
    }
}

/// A count rule plus positional argument constraints.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub count: InvocationCount,
    /// Constraint `i` applies to argument `i`. Arguments past the end of this
    /// list are unconstrained.
    pub constraints: Vec<Constraint>,
}

impl Expectation {
    pub fn new(count: InvocationCount) -> Self {
        Expectation {
            count,
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints = constraints.into_iter().collect();
        self
    }

    /// Returns `true` if a call with `args` counts toward this expectation.
    ///
    /// Every constraint must hold for the argument at its position; a call
    /// with fewer arguments than constraints never matches.
    pub fn matches(&self, args: &[Value]) -> bool {
        self.constraints
            .iter()
            .enumerate()
            .all(|(i, c)| args.get(i).is_some_and(|arg| c.matches(arg)))
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "called {}", self.count)?;
        if !self.constraints.is_empty() {
            write!(f, " with")?;
            for (i, c) in self.constraints.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}#{i} {c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rules() {
        assert!(InvocationCount::Any.is_satisfied_by(0));
        assert!(InvocationCount::Any.is_satisfied_by(99));
        assert!(InvocationCount::Never.is_satisfied_by(0));
        assert!(!InvocationCount::Never.is_satisfied_by(1));
        assert!(!InvocationCount::AtLeastOnce.is_satisfied_by(0));
        assert!(InvocationCount::AtLeastOnce.is_satisfied_by(3));
        assert!(InvocationCount::once().is_satisfied_by(1));
        assert!(!InvocationCount::Exactly(2).is_satisfied_by(1));
        assert!(!InvocationCount::Exactly(2).is_satisfied_by(3));
        assert!(InvocationCount::AtMost(2).is_satisfied_by(2));
        assert!(!InvocationCount::AtMost(2).is_satisfied_by(3));
    }

    #[test]
    fn constraints_are_positional() {
        let e = Expectation::new(InvocationCount::Any)
            .with([Constraint::equal_to("a"), Constraint::greater_than(1)]);

        assert!(e.matches(&[Value::from("a"), Value::from(2)]));
        // Extra arguments pass.
        assert!(e.matches(&[Value::from("a"), Value::from(2), Value::Null]));
        assert!(!e.matches(&[Value::from("b"), Value::from(2)]));
        // Missing arguments fail.
        assert!(!e.matches(&[Value::from("a")]));
    }

    #[test]
    fn no_constraints_match_everything() {
        let e = Expectation::new(InvocationCount::Never);
        assert!(e.matches(&[]));
        assert!(e.matches(&[Value::Int(1)]));
    }

    #[test]
    fn descriptions() {
        let e = Expectation::new(InvocationCount::once()).with([Constraint::equal_to("something")]);
        assert_eq!(e.to_string(), r#"called exactly once with #0 is equal to "something""#);
        assert_eq!(
            Expectation::new(InvocationCount::AtMost(2)).to_string(),
            "called at most 2 times"
        );
    }
}
