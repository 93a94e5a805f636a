//! Synthesized test doubles for introspected contracts.
//!
//! A [`DoubleEngine`] creates stubs and mocks of contracts held in a
//! [`stubforge_core::TypeRegistry`], lets a test configure each operation
//! through a [`PlanBuilder`], records every call, and verifies mock
//! expectations against the recorded calls.

pub mod builder;
pub mod config;
pub mod constraint;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod expectation;
pub mod invocation;
pub mod plan;
pub mod value;

// Re-export commonly used types
pub use builder::PlanBuilder;
pub use config::EngineConfig;
pub use constraint::Constraint;
pub use defaults::{classify, Synthesized};
pub use engine::{DoubleEngine, DoubleMode, OriginalFn};
pub use error::{CallError, DoubleError, ThrownError};
pub use expectation::{
    Expectation, InvocationCount, Outcome, ReportEntry, VerificationError, VerificationReport,
};
pub use invocation::{Arguments, Invocation};
pub use plan::{Action, BehaviorPlan, PreparedDefault};
pub use value::{render_arguments, Value, ValueKind};
