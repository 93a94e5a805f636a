//! The declared type model for contracts.
//!
//! Provides every type an operation can declare in its signature:
//! scalars (Bool, Int, Float, String), sequences, nullable wrappers,
//! unions, intersections, contract references, and the special types
//! `void`, `never`, `mixed`, `null` and `self`.
//!
//! All types use nominal identity via [`TypeId`]. Contracts use
//! [`IndexMap`] for insertion-ordered operations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::operation::OperationDef;
use crate::type_id::TypeId;

/// Member list for unions and intersections. Most have two or three members.
pub type TypeMembers = SmallVec<[TypeId; 4]>;

/// A type that can appear in an operation signature. Each variant represents
/// a distinct kind of type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeclaredType {
    /// Scalar types with a fixed default value.
    Scalar(ScalarType),

    /// Ordered sequence (array/list) of elements.
    Sequence { element: TypeId },

    /// `?T`: the inner type or null.
    Nullable { inner: TypeId },

    /// `A|B|...`
    Union { members: TypeMembers },

    /// `A&B&...`
    Intersection { members: TypeMembers },

    /// Named contract (interface or class) with its operations.
    Contract(ContractDef),

    /// A contract name reserved by a forward declaration but not yet defined.
    Declared { name: String },

    /// No value (operation returns nothing).
    Void,

    /// Diverging: the operation never returns normally.
    Never,

    /// Any value at all.
    Mixed,

    /// The null/absence value.
    Null,

    /// The type of the receiving double itself (`self` / `static`).
    SelfRef,
}

impl DeclaredType {
    /// Returns `true` if `null` is a valid value of this type without
    /// consulting the registry (`mixed`, `null` and `?T`).
    pub fn admits_null(&self) -> bool {
        matches!(
            self,
            DeclaredType::Nullable { .. } | DeclaredType::Mixed | DeclaredType::Null
        )
    }

    /// Returns the contract definition if this type is a contract.
    pub fn as_contract(&self) -> Option<&ContractDef> {
        match self {
            DeclaredType::Contract(def) => Some(def),
            _ => None,
        }
    }
}

/// Scalar (primitive) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    String,
}

/// What sort of type a contract describes. Drives whether it can be doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Interface,
    Class,
    AbstractClass,
    FinalClass,
    ReadonlyClass,
    Enumeration,
}

impl ContractKind {
    /// Returns `true` if a double can be synthesized for a contract of this kind.
    pub fn is_doubleable(self) -> bool {
        matches!(
            self,
            ContractKind::Interface | ContractKind::Class | ContractKind::AbstractClass
        )
    }

    /// Lower-case label used in messages and contract files.
    pub fn label(self) -> &'static str {
        match self {
            ContractKind::Interface => "interface",
            ContractKind::Class => "class",
            ContractKind::AbstractClass => "abstract class",
            ContractKind::FinalClass => "final class",
            ContractKind::ReadonlyClass => "readonly class",
            ContractKind::Enumeration => "enumeration",
        }
    }
}

/// Named contract definition with insertion-ordered operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDef {
    pub name: String,
    pub type_id: TypeId,
    pub kind: ContractKind,
    /// Parent contracts (extended classes and implemented interfaces).
    pub extends: Vec<TypeId>,
    pub operations: IndexMap<String, OperationDef>,
}

impl ContractDef {
    /// Creates a contract with no parents and no operations.
    pub fn new(name: impl Into<String>, type_id: TypeId, kind: ContractKind) -> Self {
        ContractDef {
            name: name.into(),
            type_id,
            kind,
            extends: Vec::new(),
            operations: IndexMap::new(),
        }
    }

    /// Adds an operation, replacing any earlier one with the same name.
    pub fn with_operation(mut self, op: OperationDef) -> Self {
        self.operations.insert(op.name.clone(), op);
        self
    }

    /// Adds a parent contract.
    pub fn extending(mut self, parent: TypeId) -> Self {
        self.extends.push(parent);
        self
    }
}

/// Visibility of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}
