//! Fluent configuration of one operation of one double.
//!
//! Obtained from [`DoubleEngine::method`](crate::engine::DoubleEngine::method).
//! Every call replaces the operation's action (or expectation) and returns the
//! builder, so configuration reads as a chain:
//!
//! ```ignore
//! engine
//!     .method(mock, "update")?
//!     .expects(InvocationCount::once())
//!     .with([Constraint::equal_to("something")])
//!     .will_return(true);
//! ```

use stubforge_core::id::DoubleId;

use crate::constraint::Constraint;
use crate::engine::DoubleMode;
use crate::error::{CallError, DoubleError, ThrownError};
use crate::expectation::{Expectation, InvocationCount};
use crate::plan::{Action, BehaviorPlan};
use crate::value::Value;

/// Borrowed handle on one behavior plan.
pub struct PlanBuilder<'e> {
    pub(crate) plan: &'e mut BehaviorPlan,
    pub(crate) double: DoubleId,
    pub(crate) mode: DoubleMode,
}

impl PlanBuilder<'_> {
    /// Always return `value`.
    pub fn will_return(self, value: impl Into<Value>) -> Self {
        self.plan.set_action(Action::FixedValue(value.into()));
        self
    }

    /// Return `values` in call order, repeating the last one once they run out.
    ///
    /// A single value behaves like [`will_return`](Self::will_return).
    pub fn will_return_values(
        self,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, DoubleError> {
        let mut values: Vec<Value> = values.into_iter().collect();
        let action = match values.len() {
            0 => {
                return Err(DoubleError::EmptyValueSequence {
                    operation: self.plan.operation_name().to_string(),
                })
            }
            1 => Action::FixedValue(values.remove(0)),
            _ => Action::ValueSequence { values, cursor: 0 },
        };
        self.plan.set_action(action);
        Ok(self)
    }

    /// Fail every call with `error`.
    pub fn will_throw(self, error: ThrownError) -> Self {
        self.plan.set_action(Action::ThrowError(error));
        self
    }

    /// Return the call's argument at `index` unchanged.
    pub fn will_return_argument(self, index: usize) -> Self {
        self.plan.set_action(Action::EchoArgument(index));
        self
    }

    /// Compute the return value from the call's arguments.
    pub fn will_return_callback(self, mut f: impl FnMut(&[Value]) -> Value + 'static) -> Self {
        self.plan.set_action(Action::Callback(Box::new(
            move |args: &[Value]| -> Result<Value, CallError> { Ok(f(args)) },
        )));
        self
    }

    /// Compute the result of each call from its arguments. An `Err` is
    /// returned to the caller, so one callback can fail for some arguments
    /// and answer others.
    pub fn will_respond_with(
        self,
        f: impl FnMut(&[Value]) -> Result<Value, CallError> + 'static,
    ) -> Self {
        self.plan.set_action(Action::Callback(Box::new(f)));
        self
    }

    /// Return the double itself, for fluent interfaces.
    pub fn will_return_self(self) -> Self {
        self.plan.set_action(Action::ReturnSelf);
        self
    }

    /// Return the value mapped to the call's exact arguments.
    pub fn will_return_map(
        self,
        entries: impl IntoIterator<Item = (Vec<Value>, Value)>,
    ) -> Self {
        self.plan
            .set_action(Action::ArgumentMap(entries.into_iter().collect()));
        self
    }

    /// Attach a call-count expectation, replacing any earlier one.
    pub fn expects(self, count: InvocationCount) -> Self {
        if self.mode == DoubleMode::Stub {
            tracing::warn!(
                "expectation attached to stub {} for {}(); stubs are not verified unless configured",
                self.double,
                self.plan.operation_name()
            );
        }
        self.plan.set_expectation(Expectation::new(count));
        self
    }

    /// Constrain the arguments of counted calls positionally.
    ///
    /// Without a preceding [`expects`](Self::expects), the expectation counts
    /// any number of calls.
    pub fn with(self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        let constraints: Vec<Constraint> = constraints.into_iter().collect();
        match self.plan.expectation_mut() {
            Some(expectation) => expectation.constraints = constraints,
            None => self
                .plan
                .set_expectation(Expectation::new(InvocationCount::Any).with(constraints)),
        }
        self
    }
}
