//! Core error types for stubforge-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! type registration, type-expression resolution, contract-file loading and
//! contract introspection.

use crate::type_id::TypeId;
use thiserror::Error;

/// Core errors produced by the stubforge-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the registry.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A TypeId was not found in the type registry.
    #[error("type not found: TypeId({id})", id = id.0)]
    TypeNotFound { id: TypeId },

    /// A type expression referenced a name that is neither built in nor registered.
    #[error("unknown type name: '{name}'")]
    UnknownTypeName { name: String },

    /// A type expression could not be parsed.
    #[error("invalid type expression '{expr}': {reason}")]
    InvalidTypeExpression { expr: String, reason: String },

    /// A contract was forward-declared but never defined.
    #[error("contract '{name}' is declared but not defined")]
    UndefinedContract { name: String },

    /// The requested type cannot be doubled.
    #[error("cannot double '{name}': {reason}; prefer doubling an interface it implements")]
    NotDoubleable { name: String, reason: String },

    /// Two contracts in an intersection declare the same operation with
    /// different signatures.
    #[error("operation '{operation}' is declared by '{first}' and '{second}' with different signatures")]
    ConflictingOperation {
        operation: String,
        first: String,
        second: String,
    },

    /// A contract file could not be parsed.
    #[error("contract file error: {0}")]
    ContractFile(#[from] serde_json::Error),
}
