//! The double synthesizer: an arena of doubles built from introspected
//! contracts.
//!
//! # Architecture
//!
//! - [`DoubleEngine`] borrows a [`TypeRegistry`] and owns every double created
//!   during one test. Doubles are addressed by [`DoubleId`]; a double's
//!   identity *is* its id, which is what `ReturnSelf` and nested defaults hand
//!   out as [`Value::Double`].
//! - Each double holds one [`BehaviorPlan`] per operation, indexed by name.
//!   Calls are dispatched through that table; there is no code generation.
//! - When a double is created, a synthesis pass prepares nested doubles for
//!   operations whose declared return type is a contract. The pass is keyed
//!   by contract identity, so a contract reached again returns the double
//!   already built for it and cyclic contract graphs terminate.
//! - Everything is single-threaded and synchronous. A call runs to completion
//!   before returning; verification only reads.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stubforge_core::id::DoubleId;
use stubforge_core::{
    introspect, introspect_intersection, Contract, Dispatch, TypeId, TypeRegistry,
};

use crate::builder::PlanBuilder;
use crate::config::EngineConfig;
use crate::constraint::Constraint;
use crate::defaults::{classify, Synthesized};
use crate::error::{CallError, DoubleError};
use crate::expectation::verify::{verify_plans, VerificationReport};
use crate::expectation::InvocationCount;
use crate::invocation::{Arguments, Invocation};
use crate::plan::{BehaviorPlan, PreparedDefault, Resolution};
use crate::value::Value;

/// The original implementation of a final, private or non-doubled operation.
pub type OriginalFn = Box<dyn Fn(&[Value]) -> Result<Value, CallError>>;

/// Whether a double is a stub (supplies values) or a mock (also verified).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoubleMode {
    Stub,
    Mock,
}

impl fmt::Display for DoubleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoubleMode::Stub => write!(f, "stub"),
            DoubleMode::Mock => write!(f, "mock"),
        }
    }
}

/// One synthesized double.
#[derive(Debug)]
struct DoubleState {
    contract: Contract,
    mode: DoubleMode,
    plans: IndexMap<String, BehaviorPlan>,
    /// `true` for doubles built as default return values of another double.
    nested: bool,
}

/// Doubles built during one creation call, by contract identity.
#[derive(Default)]
struct SynthesisPass {
    built: HashMap<Vec<TypeId>, DoubleId>,
}

/// Creates, configures, calls and verifies doubles.
///
/// Creating a double also creates the nested stubs its contract-returning
/// operations hand out by default, for the whole reachable contract graph.
/// Those nested doubles live in the same arena and are counted by
/// [`double_count`](Self::double_count).
pub struct DoubleEngine<'r> {
    registry: &'r TypeRegistry,
    config: EngineConfig,
    doubles: Vec<DoubleState>,
    originals: HashMap<(TypeId, String), OriginalFn>,
    next_sequence: u64,
}

impl<'r> DoubleEngine<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: &'r TypeRegistry, config: EngineConfig) -> Self {
        DoubleEngine {
            registry,
            config,
            doubles: Vec::new(),
            originals: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Creates a double of the contract `ty`.
    pub fn create_double(&mut self, ty: TypeId, mode: DoubleMode) -> Result<DoubleId, DoubleError> {
        let contract = introspect(self.registry, ty)?;
        Ok(self.build_root(contract, mode, None))
    }

    pub fn create_stub(&mut self, ty: TypeId) -> Result<DoubleId, DoubleError> {
        self.create_double(ty, DoubleMode::Stub)
    }

    pub fn create_mock(&mut self, ty: TypeId) -> Result<DoubleId, DoubleError> {
        self.create_double(ty, DoubleMode::Mock)
    }

    /// Creates a double that is an instance of every contract in `types`.
    pub fn create_intersection_double(
        &mut self,
        types: &[TypeId],
        mode: DoubleMode,
    ) -> Result<DoubleId, DoubleError> {
        let contract = introspect_intersection(self.registry, types)?;
        Ok(self.build_root(contract, mode, None))
    }

    /// Creates a double and gives each named operation a fixed return value.
    ///
    /// Every name is checked before the double is created, so an unknown or
    /// non-overridable name leaves no half-configured double behind.
    pub fn create_configured_double<S: AsRef<str>>(
        &mut self,
        ty: TypeId,
        mode: DoubleMode,
        values: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<DoubleId, DoubleError> {
        let contract = introspect(self.registry, ty)?;
        let values: Vec<(S, Value)> = values.into_iter().collect();
        for (name, _) in &values {
            check_overridable(&contract, name.as_ref())?;
        }

        let id = self.build_root(contract, mode, None);
        for (name, value) in values {
            self.method(id, name.as_ref())?.will_return(value);
        }
        Ok(id)
    }

    /// Creates a double that replaces only `operations`; every other
    /// operation keeps its original behavior.
    pub fn create_partial_double(
        &mut self,
        ty: TypeId,
        mode: DoubleMode,
        operations: &[&str],
    ) -> Result<DoubleId, DoubleError> {
        let contract = introspect(self.registry, ty)?;
        for name in operations {
            check_overridable(&contract, name)?;
        }
        Ok(self.build_root(contract, mode, Some(operations)))
    }

    fn build_root(
        &mut self,
        contract: Contract,
        mode: DoubleMode,
        only: Option<&[&str]>,
    ) -> DoubleId {
        let mut pass = SynthesisPass::default();
        let id = self.build(contract, mode, only, false, &mut pass);
        tracing::debug!(
            "created {} {} of {} ({} nested)",
            mode,
            id,
            self.doubles[id.index()].contract.name,
            pass.built.len() - 1
        );
        id
    }

    fn build(
        &mut self,
        contract: Contract,
        mode: DoubleMode,
        only: Option<&[&str]>,
        nested: bool,
        pass: &mut SynthesisPass,
    ) -> DoubleId {
        let id = DoubleId(self.doubles.len() as u32);
        pass.built.insert(contract.key().to_vec(), id);

        let plans = contract
            .operations
            .values()
            .map(|op| {
                let doubled = only.map_or(true, |names| names.contains(&op.def.name.as_str()));
                (
                    op.def.name.clone(),
                    BehaviorPlan::new(op.clone(), &contract.name, doubled),
                )
            })
            .collect();

        self.doubles.push(DoubleState {
            contract,
            mode,
            plans,
            nested,
        });

        if self.config.auto_return_values {
            self.prepare_defaults(id, pass);
        }
        id
    }

    /// Builds nested doubles for every doubled operation returning a contract.
    fn prepare_defaults(&mut self, id: DoubleId, pass: &mut SynthesisPass) {
        let needed: Vec<(String, TypeId)> = self.doubles[id.index()]
            .plans
            .values()
            .filter(|plan| plan.override_blocker().is_none())
            .filter_map(|plan| {
                match classify(self.registry, plan.operation().def.return_type) {
                    Synthesized::NeedsDouble(ty) => Some((plan.operation_name().to_string(), ty)),
                    _ => None,
                }
            })
            .collect();

        for (operation, ty) in needed {
            let prepared = match introspect(self.registry, ty) {
                Ok(contract) => {
                    let nested = match pass.built.get(contract.key()) {
                        Some(existing) => *existing,
                        None => self.build(contract, DoubleMode::Stub, None, true, pass),
                    };
                    PreparedDefault::Ready(Value::Double(nested))
                }
                Err(err) => PreparedDefault::Unavailable(err.to_string()),
            };
            if let Some(plan) = self.doubles[id.index()].plans.get_mut(&operation) {
                plan.set_prepared_default(prepared);
            }
        }
    }

    /// Registers the original implementation of `operation` of contract `ty`.
    /// Used by final, private and non-doubled operations.
    ///
    /// `operation` may be inherited; the implementation is registered for the
    /// ancestor that declares it, so every double reaching that declaration
    /// shares it.
    pub fn provide_original(
        &mut self,
        ty: TypeId,
        operation: &str,
        f: impl Fn(&[Value]) -> Result<Value, CallError> + 'static,
    ) -> Result<(), DoubleError> {
        let contract = introspect(self.registry, ty)?;
        let op = contract
            .operation(operation)
            .ok_or_else(|| DoubleError::UnknownOperation {
                contract: contract.name.clone(),
                operation: operation.to_string(),
            })?;
        self.originals
            .insert((op.declared_in, operation.to_string()), Box::new(f));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Starts configuring `operation` of double `id`.
    ///
    /// Fails with [`DoubleError::UnknownOperation`] if the contract has no such
    /// operation and with [`DoubleError::NotOverridable`] if its behavior
    /// cannot be replaced.
    pub fn method(&mut self, id: DoubleId, operation: &str) -> Result<PlanBuilder<'_>, DoubleError> {
        let state = self
            .doubles
            .get_mut(id.index())
            .ok_or(DoubleError::UnknownDouble { id })?;
        let mode = state.mode;
        let contract = &state.contract.name;
        let plan = state
            .plans
            .get_mut(operation)
            .ok_or_else(|| DoubleError::UnknownOperation {
                contract: contract.clone(),
                operation: operation.to_string(),
            })?;
        if let Some(reason) = plan.override_blocker() {
            return Err(DoubleError::NotOverridable {
                contract: contract.clone(),
                operation: operation.to_string(),
                reason: reason.to_string(),
            });
        }
        tracing::debug!("configuring {}() on {}", operation, id);
        Ok(PlanBuilder {
            plan,
            double: id,
            mode,
        })
    }

    /// Attaches an expectation to `operation`, replacing any earlier one.
    pub fn attach_expectation(
        &mut self,
        id: DoubleId,
        operation: &str,
        count: InvocationCount,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<(), DoubleError> {
        self.method(id, operation)?
            .expects(count)
            .with(constraints);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    /// Invokes `operation` on double `id` with `args`, the way the code under
    /// test would.
    ///
    /// The call is recorded before its behavior runs.
    pub fn call(
        &mut self,
        id: DoubleId,
        operation: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value, CallError> {
        let arguments: Arguments = args.into_iter().collect();
        let state = self
            .doubles
            .get_mut(id.index())
            .ok_or(CallError::UnknownDouble { id })?;
        let Some(plan) = state.plans.get_mut(operation) else {
            return Err(CallError::UnknownOperation {
                contract: state.contract.name.clone(),
                operation: operation.to_string(),
            });
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        tracing::trace!("call #{} {}::{}()", sequence, state.contract.name, operation);
        plan.record(sequence, arguments.clone());

        match plan.resolve(&arguments, id) {
            Resolution::Value(value) => Ok(value),
            Resolution::Failed(err) => Err(err),
            Resolution::Default => default_value(self.registry, &self.config, plan, id),
            Resolution::Original => {
                let key = (plan.operation().declared_in, operation.to_string());
                match self.originals.get(&key) {
                    Some(original) => original(&arguments),
                    None => Err(CallError::NoOriginalBehavior {
                        contract: self.registry.display_name(key.0),
                        operation: key.1,
                    }),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns `true` if double `id` is an instance of contract `ty`.
    pub fn is_instance_of(&self, id: DoubleId, ty: TypeId) -> bool {
        self.doubles
            .get(id.index())
            .is_some_and(|d| d.contract.satisfies(ty))
    }

    pub fn contract_of(&self, id: DoubleId) -> Option<&Contract> {
        self.doubles.get(id.index()).map(|d| &d.contract)
    }

    pub fn mode_of(&self, id: DoubleId) -> Option<DoubleMode> {
        self.doubles.get(id.index()).map(|d| d.mode)
    }

    /// Returns `true` if `id` was built as another double's default return value.
    pub fn is_nested(&self, id: DoubleId) -> bool {
        self.doubles.get(id.index()).is_some_and(|d| d.nested)
    }

    /// Number of doubles created so far, including nested doubles prepared
    /// as default return values (see [`is_nested`](Self::is_nested)).
    pub fn double_count(&self) -> usize {
        self.doubles.len()
    }

    pub fn plan(&self, id: DoubleId, operation: &str) -> Result<&BehaviorPlan, DoubleError> {
        let state = self
            .doubles
            .get(id.index())
            .ok_or(DoubleError::UnknownDouble { id })?;
        state
            .plans
            .get(operation)
            .ok_or_else(|| DoubleError::UnknownOperation {
                contract: state.contract.name.clone(),
                operation: operation.to_string(),
            })
    }

    /// Recorded calls of `operation`, in call order.
    pub fn invocations(&self, id: DoubleId, operation: &str) -> Result<&[Invocation], DoubleError> {
        Ok(self.plan(id, operation)?.invocations())
    }

    pub fn invocation_count(&self, id: DoubleId, operation: &str) -> Result<usize, DoubleError> {
        Ok(self.invocations(id, operation)?.len())
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Checks every expectation of double `id` against its invocation log.
    ///
    /// Stubs yield an empty report unless
    /// [`EngineConfig::check_stub_expectations`] is set.
    pub fn verify(&self, id: DoubleId) -> Result<VerificationReport, DoubleError> {
        let state = self
            .doubles
            .get(id.index())
            .ok_or(DoubleError::UnknownDouble { id })?;

        let report = if state.mode == DoubleMode::Stub && !self.config.check_stub_expectations {
            VerificationReport {
                double: id,
                contract: state.contract.name.clone(),
                entries: Vec::new(),
            }
        } else {
            verify_plans(
                id,
                &state.contract.name,
                state.plans.values(),
                self.config.mismatch_sample_limit,
            )
        };

        for failure in report.failures() {
            tracing::warn!("{}: {}", id, failure);
        }
        Ok(report)
    }

    /// The end-of-test checkpoint: verifies every double whose expectations
    /// are checked, in creation order.
    pub fn verify_all(&self) -> Vec<VerificationReport> {
        (0..self.doubles.len())
            .map(|i| DoubleId(i as u32))
            .filter(|id| {
                self.doubles[id.index()].mode == DoubleMode::Mock
                    || self.config.check_stub_expectations
            })
            .filter_map(|id| self.verify(id).ok())
            .collect()
    }
}

/// Synthesizes the return value of an unconfigured call.
fn default_value(
    registry: &TypeRegistry,
    config: &EngineConfig,
    plan: &BehaviorPlan,
    this: DoubleId,
) -> Result<Value, CallError> {
    let return_type = plan.operation().def.return_type;
    let operation = plan.operation_name().to_string();

    let synthesized = classify(registry, return_type);
    if synthesized == Synthesized::Value(Value::Unit) {
        return Ok(Value::Unit);
    }
    if !config.auto_return_values {
        return Err(CallError::ReturnValueNotConfigured {
            operation,
            return_type: registry.display_name(return_type),
        });
    }

    match synthesized {
        Synthesized::Value(value) => Ok(value),
        Synthesized::SelfRef => Ok(Value::Double(this)),
        Synthesized::NeedsDouble(_) => match plan.prepared_default() {
            Some(PreparedDefault::Ready(value)) => Ok(value.clone()),
            Some(PreparedDefault::Unavailable(reason)) => Err(CallError::ReturnValueNotGenerated {
                operation,
                reason: reason.clone(),
            }),
            None => Err(CallError::ReturnValueNotGenerated {
                operation,
                reason: "no nested double was prepared".to_string(),
            }),
        },
        Synthesized::Unavailable(reason) => {
            Err(CallError::ReturnValueNotGenerated { operation, reason })
        }
    }
}

/// Checks that `operation` exists on `contract` and may be replaced.
fn check_overridable(contract: &Contract, operation: &str) -> Result<(), DoubleError> {
    let op = contract
        .operation(operation)
        .ok_or_else(|| DoubleError::UnknownOperation {
            contract: contract.name.clone(),
            operation: operation.to_string(),
        })?;
    let reason = match op.dispatch {
        Dispatch::Doubled => return Ok(()),
        Dispatch::StaticStandIn => "static",
        Dispatch::Original if op.def.is_final => "final",
        Dispatch::Original => "private",
    };
    Err(DoubleError::NotOverridable {
        contract: contract.name.clone(),
        operation: operation.to_string(),
        reason: reason.to_string(),
    })
}
