//! Operation definitions: the signatures a contract exposes.
//!
//! [`OperationDef`] is the full operation metadata: name, ordered typed
//! parameters, declared return type, and the modifiers that decide whether a
//! double may replace the operation (`final`, `static`, visibility).

use serde::{Deserialize, Serialize};

use crate::type_id::TypeId;
use crate::types::Visibility;

/// Full operation definition including signature and modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDef {
    /// Operation name, unique within its contract.
    pub name: String,
    /// Named, typed parameters in declaration order.
    pub params: Vec<(String, TypeId)>,
    /// Return type (use `TypeId::VOID` for operations that return nothing).
    pub return_type: TypeId,
    /// Visibility to callers outside the contract.
    pub visibility: Visibility,
    /// `true` if subtypes may not override this operation.
    pub is_final: bool,
    /// `true` if the operation belongs to the type rather than an instance.
    pub is_static: bool,
}

impl OperationDef {
    /// Creates a public, non-final, instance operation.
    pub fn new(name: impl Into<String>, params: Vec<(String, TypeId)>, return_type: TypeId) -> Self {
        OperationDef {
            name: name.into(),
            params,
            return_type,
            visibility: Visibility::Public,
            is_final: false,
            is_static: false,
        }
    }

    /// Marks the operation `final`.
    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Marks the operation `static`.
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Returns the number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if two definitions have the same parameter types and
    /// return type. Parameter names are not part of the signature.
    pub fn same_signature(&self, other: &OperationDef) -> bool {
        self.return_type == other.return_type
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|((_, a), (_, b))| a == b)
            && self.is_static == other.is_static
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_operation_defaults() {
        let op = OperationDef::new(
            "add",
            vec![("a".into(), TypeId::INT), ("b".into(), TypeId::INT)],
            TypeId::INT,
        );

        assert_eq!(op.name, "add");
        assert_eq!(op.visibility, Visibility::Public);
        assert_eq!(op.arity(), 2);
        assert_eq!(op.return_type, TypeId::INT);
        assert!(!op.is_final);
        assert!(!op.is_static);
    }

    #[test]
    fn modifiers() {
        let op = OperationDef::new("create", vec![], TypeId::SELF)
            .static_()
            .final_()
            .with_visibility(Visibility::Protected);
        assert!(op.is_static);
        assert!(op.is_final);
        assert_eq!(op.visibility, Visibility::Protected);
    }

    #[test]
    fn signature_ignores_parameter_names() {
        let a = OperationDef::new("f", vec![("x".into(), TypeId::INT)], TypeId::BOOL);
        let b = OperationDef::new("f", vec![("y".into(), TypeId::INT)], TypeId::BOOL);
        let c = OperationDef::new("f", vec![("x".into(), TypeId::STRING)], TypeId::BOOL);
        assert!(a.same_signature(&b));
        assert!(!a.same_signature(&c));
    }

    #[test]
    fn serde_roundtrip_operation_def() {
        let op = OperationDef::new("find", vec![("id".into(), TypeId::INT)], TypeId::MIXED)
            .with_visibility(Visibility::Private);

        let json = serde_json::to_string(&op).unwrap();
        let back: OperationDef = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
