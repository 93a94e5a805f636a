//! Behavior plans: per-operation configuration plus invocation log.
//!
//! Every operation of a double owns one [`BehaviorPlan`]. The plan's
//! [`Action`] decides what a call returns; exactly one action is active at a
//! time and configuring a new one replaces the old. Each call is appended to
//! the plan's log before the action resolves.

use std::fmt;

use stubforge_core::id::DoubleId;
use stubforge_core::{Dispatch, IntrospectedOperation};

use crate::error::{CallError, ThrownError};
use crate::expectation::Expectation;
use crate::invocation::{Arguments, Invocation};
use crate::value::Value;

/// A computed return value. Receives the call's arguments; an `Err` reaches
/// the caller the way a thrown error does.
pub type CallbackFn = Box<dyn FnMut(&[Value]) -> Result<Value, CallError>>;

/// What a call to an operation does.
pub enum Action {
    /// Nothing configured: the return value is synthesized from the declared
    /// return type.
    NoneConfigured,
    FixedValue(Value),
    /// Values handed out in order; the last one repeats once exhausted.
    ValueSequence { values: Vec<Value>, cursor: usize },
    ThrowError(ThrownError),
    /// Returns the argument at this index unchanged.
    EchoArgument(usize),
    Callback(CallbackFn),
    /// Returns the double itself.
    ReturnSelf,
    /// First entry whose arguments equal the call's arguments wins.
    ArgumentMap(Vec<(Vec<Value>, Value)>),
    /// Stand-in for a static operation: every call fails.
    Unsupported,
    /// Runs the operation's original implementation.
    Original,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoneConfigured => write!(f, "NoneConfigured"),
            Action::FixedValue(v) => f.debug_tuple("FixedValue").field(v).finish(),
            Action::ValueSequence { values, cursor } => f
                .debug_struct("ValueSequence")
                .field("values", values)
                .field("cursor", cursor)
                .finish(),
            Action::ThrowError(e) => f.debug_tuple("ThrowError").field(e).finish(),
            Action::EchoArgument(i) => f.debug_tuple("EchoArgument").field(i).finish(),
            Action::Callback(_) => write!(f, "Callback(..)"),
            Action::ReturnSelf => write!(f, "ReturnSelf"),
            Action::ArgumentMap(entries) => f.debug_tuple("ArgumentMap").field(entries).finish(),
            Action::Unsupported => write!(f, "Unsupported"),
            Action::Original => write!(f, "Original"),
        }
    }
}

/// A nested double (or the reason there is none) prepared at creation time
/// for an operation whose declared return type is a contract.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedDefault {
    Ready(Value),
    Unavailable(String),
}

/// How the engine should finish a call after the plan resolved its action.
#[derive(Debug)]
pub(crate) enum Resolution {
    Value(Value),
    Failed(CallError),
    /// Synthesize from the declared return type.
    Default,
    /// Run the original implementation.
    Original,
}

/// Configuration and invocation log of one operation of one double.
#[derive(Debug)]
pub struct BehaviorPlan {
    operation: IntrospectedOperation,
    contract: String,
    action: Action,
    invocations: Vec<Invocation>,
    expectation: Option<Expectation>,
    prepared_default: Option<PreparedDefault>,
}

impl BehaviorPlan {
    /// Creates the plan for `operation`, choosing the initial action from its
    /// dispatch. `doubled` is false for operations a partial double leaves
    /// alone.
    pub fn new(operation: IntrospectedOperation, contract: &str, doubled: bool) -> Self {
        let action = match operation.dispatch {
            Dispatch::StaticStandIn => Action::Unsupported,
            Dispatch::Original => Action::Original,
            Dispatch::Doubled if doubled => Action::NoneConfigured,
            Dispatch::Doubled => Action::Original,
        };
        BehaviorPlan {
            operation,
            contract: contract.to_string(),
            action,
            invocations: Vec::new(),
            expectation: None,
            prepared_default: None,
        }
    }

    pub fn operation(&self) -> &IntrospectedOperation {
        &self.operation
    }

    pub fn operation_name(&self) -> &str {
        &self.operation.def.name
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn expectation(&self) -> Option<&Expectation> {
        self.expectation.as_ref()
    }

    pub fn prepared_default(&self) -> Option<&PreparedDefault> {
        self.prepared_default.as_ref()
    }

    /// Returns `None` if the plan's behavior may be configured, or the reason
    /// it may not.
    pub fn override_blocker(&self) -> Option<&'static str> {
        match (&self.action, self.operation.dispatch) {
            (_, Dispatch::StaticStandIn) => Some("static"),
            (_, Dispatch::Original) if self.operation.def.is_final => Some("final"),
            (_, Dispatch::Original) => Some("private"),
            (Action::Original, Dispatch::Doubled) => Some("not doubled by this partial double"),
            _ => None,
        }
    }

    pub(crate) fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    /// Attaches an expectation, replacing any earlier one.
    pub(crate) fn set_expectation(&mut self, expectation: Expectation) {
        self.expectation = Some(expectation);
    }

    pub(crate) fn expectation_mut(&mut self) -> Option<&mut Expectation> {
        self.expectation.as_mut()
    }

    pub(crate) fn set_prepared_default(&mut self, prepared: PreparedDefault) {
        self.prepared_default = Some(prepared);
    }

    pub(crate) fn record(&mut self, sequence: u64, arguments: Arguments) {
        self.invocations.push(Invocation {
            sequence,
            arguments,
        });
    }

    /// Resolves the active action for one call.
    pub(crate) fn resolve(&mut self, args: &[Value], this: DoubleId) -> Resolution {
        match &mut self.action {
            Action::NoneConfigured => Resolution::Default,
            Action::FixedValue(v) => Resolution::Value(v.clone()),
            Action::ValueSequence { values, cursor } => {
                let value = values[*cursor].clone();
                if *cursor + 1 < values.len() {
                    *cursor += 1;
                }
                Resolution::Value(value)
            }
            Action::ThrowError(e) => Resolution::Failed(CallError::Thrown(e.clone())),
            Action::EchoArgument(index) => match args.get(*index) {
                Some(arg) => Resolution::Value(arg.clone()),
                None => Resolution::Failed(CallError::ArgumentIndexOutOfRange {
                    operation: self.operation.def.name.clone(),
                    index: *index,
                    count: args.len(),
                }),
            },
            Action::Callback(f) => match f(args) {
                Ok(value) => Resolution::Value(value),
                Err(err) => Resolution::Failed(err),
            },
            Action::ReturnSelf => Resolution::Value(Value::Double(this)),
            Action::ArgumentMap(entries) => {
                match entries.iter().find(|(inputs, _)| inputs.as_slice() == args) {
                    Some((_, output)) => Resolution::Value(output.clone()),
                    None => Resolution::Failed(CallError::NoMappingForArguments {
                        operation: self.operation.def.name.clone(),
                        arguments: args.to_vec(),
                    }),
                }
            }
            Action::Unsupported => Resolution::Failed(CallError::UnsupportedOperation {
                contract: self.contract.clone(),
                operation: self.operation.def.name.clone(),
            }),
            Action::Original => Resolution::Original,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubforge_core::{OperationDef, TypeId, Visibility};

    fn plan_for(def: OperationDef) -> BehaviorPlan {
        let dispatch = Dispatch::for_operation(&def);
        BehaviorPlan::new(
            IntrospectedOperation {
                def,
                declared_in: TypeId(10),
                dispatch,
            },
            "Subject",
            true,
        )
    }

    fn op(name: &str) -> BehaviorPlan {
        plan_for(OperationDef::new(name, vec![], TypeId::STRING))
    }

    fn value(r: Resolution) -> Value {
        match r {
            Resolution::Value(v) => v,
            other => panic!("expected a value, got {:?}", other),
        }
    }

    fn failure(r: Resolution) -> CallError {
        match r {
            Resolution::Failed(e) => e,
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn initial_actions_follow_dispatch() {
        assert!(matches!(op("a").action(), Action::NoneConfigured));
        assert!(matches!(
            plan_for(OperationDef::new("s", vec![], TypeId::VOID).static_()).action(),
            Action::Unsupported
        ));
        assert!(matches!(
            plan_for(OperationDef::new("f", vec![], TypeId::VOID).final_()).action(),
            Action::Original
        ));
    }

    #[test]
    fn override_blockers() {
        assert_eq!(op("a").override_blocker(), None);
        assert_eq!(
            plan_for(OperationDef::new("s", vec![], TypeId::VOID).static_()).override_blocker(),
            Some("static")
        );
        assert_eq!(
            plan_for(OperationDef::new("f", vec![], TypeId::VOID).final_()).override_blocker(),
            Some("final")
        );
        assert_eq!(
            plan_for(
                OperationDef::new("p", vec![], TypeId::VOID).with_visibility(Visibility::Private)
            )
            .override_blocker(),
            Some("private")
        );
    }

    #[test]
    fn sequence_saturates_at_last_value() {
        let mut plan = op("next");
        plan.set_action(Action::ValueSequence {
            values: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            cursor: 0,
        });
        let got: Vec<Value> = (0..5).map(|_| value(plan.resolve(&[], DoubleId(0)))).collect();
        assert_eq!(
            got,
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(3), Value::Int(3)]
        );
    }

    #[test]
    fn echo_argument() {
        let mut plan = op("echo");
        plan.set_action(Action::EchoArgument(1));
        let args = [Value::from("a"), Value::from("b")];
        assert_eq!(value(plan.resolve(&args, DoubleId(0))), Value::from("b"));

        match failure(plan.resolve(&args[..1], DoubleId(0))) {
            CallError::ArgumentIndexOutOfRange { index, count, .. } => {
                assert_eq!(index, 1);
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn argument_map_first_match_wins() {
        let mut plan = op("doSomething");
        plan.set_action(Action::ArgumentMap(vec![
            (vec![Value::from("a")], Value::from("first")),
            (vec![Value::from("a")], Value::from("second")),
        ]));
        assert_eq!(value(plan.resolve(&[Value::from("a")], DoubleId(0))), Value::from("first"));
        assert!(matches!(
            failure(plan.resolve(&[Value::from("a"), Value::from("b")], DoubleId(0))),
            CallError::NoMappingForArguments { .. }
        ));
    }

    #[test]
    fn callback_sees_arguments() {
        let mut plan = op("join");
        plan.set_action(Action::Callback(Box::new(|args: &[Value]| -> Result<Value, CallError> {
            Ok(Value::Str(
                args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join("+"),
            ))
        })));
        assert_eq!(
            value(plan.resolve(&[Value::Int(1), Value::Int(2)], DoubleId(0))),
            Value::from("1+2")
        );
    }

    #[test]
    fn failing_callback_fails_the_call() {
        let mut plan = op("lookup");
        plan.set_action(Action::Callback(Box::new(
            |args: &[Value]| -> Result<Value, CallError> {
                match args.first() {
                    Some(Value::Int(n)) if *n < 0 => {
                        Err(ThrownError::new("InvalidArgumentException", "negative id").into())
                    }
                    Some(arg) => Ok(arg.clone()),
                    None => Ok(Value::Null),
                }
            },
        )));

        assert_eq!(value(plan.resolve(&[Value::Int(3)], DoubleId(0))), Value::Int(3));
        assert_eq!(
            failure(plan.resolve(&[Value::Int(-1)], DoubleId(0))),
            CallError::Thrown(ThrownError::new("InvalidArgumentException", "negative id"))
        );
    }

    #[test]
    fn self_throw_and_unsupported() {
        let mut plan = op("fluent");
        plan.set_action(Action::ReturnSelf);
        assert_eq!(value(plan.resolve(&[], DoubleId(9))), Value::Double(DoubleId(9)));

        plan.set_action(Action::ThrowError(ThrownError::new("RuntimeException", "no")));
        assert_eq!(
            failure(plan.resolve(&[], DoubleId(9))),
            CallError::Thrown(ThrownError::new("RuntimeException", "no"))
        );

        let mut stat = plan_for(OperationDef::new("create", vec![], TypeId::SELF).static_());
        assert_eq!(
            failure(stat.resolve(&[], DoubleId(0))),
            CallError::UnsupportedOperation {
                contract: "Subject".into(),
                operation: "create".into()
            }
        );
    }

    #[test]
    fn record_appends_in_order() {
        let mut plan = op("log");
        plan.record(4, Arguments::from_vec(vec![Value::Int(1)]));
        plan.record(7, Arguments::new());
        assert_eq!(plan.invocations().len(), 2);
        assert_eq!(plan.invocations()[0].sequence, 4);
        assert_eq!(plan.invocations()[1].arguments.len(), 0);
    }
}
