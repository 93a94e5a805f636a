//! Error types for configuring and calling doubles.
//!
//! Configuration errors ([`DoubleError`]) surface immediately from the call
//! that caused them. Call errors ([`CallError`]) are what the code under test
//! sees when it invokes a double, including errors the test configured the
//! double to throw. Verification failures are never errors at call time; see
//! [`crate::expectation::VerificationError`].

use serde::{Deserialize, Serialize};
use stubforge_core::id::DoubleId;
use stubforge_core::CoreError;

use crate::value::{render_arguments, Value};

/// An error a double was configured to throw, standing in for whatever a
/// real dependency would raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ThrownError {
    /// Error class or category, e.g. `RuntimeException`.
    pub kind: String,
    pub message: String,
}

impl ThrownError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ThrownError {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while creating or configuring doubles.
#[derive(Debug, thiserror::Error)]
pub enum DoubleError {
    /// Contract resolution or introspection failed (includes `NotDoubleable`).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown double: {id}")]
    UnknownDouble { id: DoubleId },

    #[error("{contract} has no operation '{operation}'")]
    UnknownOperation { contract: String, operation: String },

    /// The operation exists but its behavior cannot be replaced.
    #[error("{contract}::{operation}() cannot be configured: it is {reason}")]
    NotOverridable {
        contract: String,
        operation: String,
        reason: String,
    },

    #[error("no values given for {operation}()")]
    EmptyValueSequence { operation: String },
}

/// Errors raised when a double is called.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    #[error("unknown double: {id}")]
    UnknownDouble { id: DoubleId },

    #[error("{contract} has no operation '{operation}'")]
    UnknownOperation { contract: String, operation: String },

    #[error("{operation}() was asked to return argument {index} but was called with {count} argument(s)")]
    ArgumentIndexOutOfRange {
        operation: String,
        index: usize,
        count: usize,
    },

    #[error("{operation}() has no return value mapped for arguments ({})", render_arguments(.arguments))]
    NoMappingForArguments {
        operation: String,
        arguments: Vec<Value>,
    },

    /// A static operation was reached through a double.
    #[error("{contract}::{operation}() is static and cannot be called on a double")]
    UnsupportedOperation { contract: String, operation: String },

    /// A final, private or unselected operation has no original implementation
    /// registered with the engine.
    #[error("{contract}::{operation}() keeps its original behavior, but none was provided")]
    NoOriginalBehavior { contract: String, operation: String },

    /// Automatic return values are disabled and nothing was configured.
    #[error("no return value configured for {operation}(): {return_type}")]
    ReturnValueNotConfigured {
        operation: String,
        return_type: String,
    },

    /// The declared return type has no default value.
    #[error("return value for {operation}() cannot be generated: {reason}; configure one explicitly")]
    ReturnValueNotGenerated { operation: String, reason: String },

    /// The error the double was configured to throw.
    #[error("{0}")]
    Thrown(#[from] ThrownError),
}
