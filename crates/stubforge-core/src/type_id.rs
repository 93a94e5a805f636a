//! TypeId and TypeRegistry for nominal typing.
//!
//! Every type a contract can mention has a unique [`TypeId`] providing O(1)
//! identity comparison. The [`TypeRegistry`] manages type registration and
//! lookup, pre-registering the scalar and special types on construction.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ContractDef, DeclaredType, ScalarType};

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const FLOAT: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
    pub const VOID: TypeId = TypeId(4);
    pub const NEVER: TypeId = TypeId(5);
    pub const MIXED: TypeId = TypeId(6);
    pub const NULL: TypeId = TypeId(7);
    pub const SELF: TypeId = TypeId(8);
    /// Untyped sequence (`array`), element type `mixed`.
    pub const ARRAY: TypeId = TypeId(9);
}

/// Registry of all types known to a test session, providing nominal identity
/// via [`TypeId`].
///
/// On construction, the registry pre-registers the 10 built-in types listed
/// on the `TypeId` constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<DeclaredType>,
    /// Named type lookup (contracts and forward declarations)
    names: HashMap<String, TypeId>,
    /// Next available ID
    next_id: u32,
}

impl TypeRegistry {
    /// Number of built-in types pre-registered on construction.
    const BUILTIN_COUNT: u32 = 10;

    /// Creates a new type registry with the built-in types pre-registered.
    pub fn new() -> Self {
        let types = vec![
            DeclaredType::Scalar(ScalarType::Bool),
            DeclaredType::Scalar(ScalarType::Int),
            DeclaredType::Scalar(ScalarType::Float),
            DeclaredType::Scalar(ScalarType::String),
            DeclaredType::Void,
            DeclaredType::Never,
            DeclaredType::Mixed,
            DeclaredType::Null,
            DeclaredType::SelfRef,
            DeclaredType::Sequence {
                element: TypeId::MIXED,
            },
        ];

        TypeRegistry {
            types,
            names: HashMap::new(),
            next_id: Self::BUILTIN_COUNT,
        }
    }

    /// Registers an anonymous type and returns its new [`TypeId`].
    ///
    /// Use [`register_contract`](Self::register_contract) for named contracts.
    pub fn register(&mut self, ty: DeclaredType) -> TypeId {
        let id = TypeId(self.next_id);
        self.types.push(ty);
        self.next_id += 1;
        id
    }

    /// Registers a contract under its own name, returning its [`TypeId`].
    ///
    /// The definition's `type_id` field is overwritten with the allocated id.
    /// Returns [`CoreError::DuplicateTypeName`] if the name is taken.
    pub fn register_contract(&mut self, mut def: ContractDef) -> Result<TypeId, CoreError> {
        if self.names.contains_key(&def.name) {
            return Err(CoreError::DuplicateTypeName { name: def.name });
        }
        let id = TypeId(self.next_id);
        def.type_id = id;
        let name = def.name.clone();
        self.register(DeclaredType::Contract(def));
        self.names.insert(name, id);
        Ok(id)
    }

    /// Reserves a [`TypeId`] for a contract that will be defined later.
    ///
    /// Lets mutually recursive contracts reference each other before either
    /// is complete. Fill the slot with [`define_contract`](Self::define_contract).
    pub fn declare_contract(&mut self, name: &str) -> Result<TypeId, CoreError> {
        if self.names.contains_key(name) {
            return Err(CoreError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
        let id = self.register(DeclaredType::Declared {
            name: name.to_string(),
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Defines a previously declared contract.
    ///
    /// The definition takes the declared name and id. Fails with
    /// [`CoreError::DuplicateTypeName`] if the slot already holds a definition.
    pub fn define_contract(&mut self, id: TypeId, mut def: ContractDef) -> Result<(), CoreError> {
        let slot = self
            .types
            .get_mut(id.0 as usize)
            .ok_or(CoreError::TypeNotFound { id })?;
        let name = match slot {
            DeclaredType::Declared { name } => std::mem::take(name),
            DeclaredType::Contract(existing) => {
                return Err(CoreError::DuplicateTypeName {
                    name: existing.name.clone(),
                })
            }
            _ => return Err(CoreError::TypeNotFound { id }),
        };
        def.name = name;
        def.type_id = id;
        *slot = DeclaredType::Contract(def);
        Ok(())
    }

    /// Looks up a type by its [`TypeId`].
    pub fn get(&self, id: TypeId) -> Option<&DeclaredType> {
        self.types.get(id.0 as usize)
    }

    /// Looks up a named type's [`TypeId`] by name.
    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Returns the contract definition for `id`, if `id` is a defined contract.
    pub fn contract(&self, id: TypeId) -> Option<&ContractDef> {
        self.get(id).and_then(DeclaredType::as_contract)
    }

    /// Iterates over all defined contracts in registration order.
    pub fn contracts(&self) -> impl Iterator<Item = &ContractDef> {
        self.types.iter().filter_map(DeclaredType::as_contract)
    }

    /// Renders a type the way it would be written in a type expression.
    pub fn display_name(&self, id: TypeId) -> String {
        match self.get(id) {
            None => id.to_string(),
            Some(DeclaredType::Scalar(ScalarType::Bool)) => "bool".into(),
            Some(DeclaredType::Scalar(ScalarType::Int)) => "int".into(),
            Some(DeclaredType::Scalar(ScalarType::Float)) => "float".into(),
            Some(DeclaredType::Scalar(ScalarType::String)) => "string".into(),
            Some(DeclaredType::Sequence { element }) if *element == TypeId::MIXED => {
                "array".into()
            }
            Some(DeclaredType::Sequence { element }) => {
                format!("list<{}>", self.display_name(*element))
            }
            Some(DeclaredType::Nullable { inner }) => format!("?{}", self.display_name(*inner)),
            Some(DeclaredType::Union { members }) => self.join_members(members, "|"),
            Some(DeclaredType::Intersection { members }) => self.join_members(members, "&"),
            Some(DeclaredType::Contract(def)) => def.name.clone(),
            Some(DeclaredType::Declared { name }) => name.clone(),
            Some(DeclaredType::Void) => "void".into(),
            Some(DeclaredType::Never) => "never".into(),
            Some(DeclaredType::Mixed) => "mixed".into(),
            Some(DeclaredType::Null) => "null".into(),
            Some(DeclaredType::SelfRef) => "static".into(),
        }
    }

    fn join_members(&self, members: &[TypeId], sep: &str) -> String {
        members
            .iter()
            .map(|m| {
                let name = self.display_name(*m);
                // Parenthesize nested compound types.
                if name.contains('|') || name.contains('&') {
                    format!("({name})")
                } else {
                    name
                }
            })
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationDef;
    use crate::types::ContractKind;

    #[test]
    fn new_registry_has_10_builtin_types() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.types.len(), 10);
        assert_eq!(reg.next_id, 10);
    }

    #[test]
    fn builtin_special_types() {
        let reg = TypeRegistry::new();
        assert!(matches!(reg.get(TypeId::VOID), Some(DeclaredType::Void)));
        assert!(matches!(reg.get(TypeId::NEVER), Some(DeclaredType::Never)));
        assert!(matches!(reg.get(TypeId::MIXED), Some(DeclaredType::Mixed)));
        assert!(matches!(reg.get(TypeId::NULL), Some(DeclaredType::Null)));
        assert!(matches!(reg.get(TypeId::SELF), Some(DeclaredType::SelfRef)));
        assert!(matches!(
            reg.get(TypeId::ARRAY),
            Some(DeclaredType::Sequence { element }) if *element == TypeId::MIXED
        ));
    }

    #[test]
    fn register_contract_assigns_id_and_name() {
        let mut reg = TypeRegistry::new();

        let id = reg
            .register_contract(
                ContractDef::new("Mailer", TypeId(0), ContractKind::Interface).with_operation(
                    OperationDef::new("send", vec![("to".into(), TypeId::STRING)], TypeId::BOOL),
                ),
            )
            .unwrap();

        assert_eq!(id, TypeId(10));
        assert_eq!(reg.get_by_name("Mailer"), Some(id));
        let def = reg.contract(id).unwrap();
        assert_eq!(def.type_id, id);
        assert_eq!(def.operations.len(), 1);
    }

    #[test]
    fn duplicate_name_returns_error() {
        let mut reg = TypeRegistry::new();
        reg.register_contract(ContractDef::new("Foo", TypeId(0), ContractKind::Interface))
            .unwrap();

        let result =
            reg.register_contract(ContractDef::new("Foo", TypeId(0), ContractKind::Class));
        match result {
            Err(CoreError::DuplicateTypeName { name }) => assert_eq!(name, "Foo"),
            _ => panic!("expected DuplicateTypeName error"),
        }
    }

    #[test]
    fn declare_then_define() {
        let mut reg = TypeRegistry::new();
        let node = reg.declare_contract("Node").unwrap();
        assert!(matches!(reg.get(node), Some(DeclaredType::Declared { .. })));
        assert!(reg.contract(node).is_none());

        let def = ContractDef::new("ignored", TypeId(0), ContractKind::Interface)
            .with_operation(OperationDef::new("next", vec![], node));
        reg.define_contract(node, def).unwrap();

        let def = reg.contract(node).unwrap();
        assert_eq!(def.name, "Node");
        assert_eq!(def.type_id, node);
        assert_eq!(def.operations["next"].return_type, node);
    }

    #[test]
    fn define_twice_fails() {
        let mut reg = TypeRegistry::new();
        let id = reg.declare_contract("Twice").unwrap();
        reg.define_contract(id, ContractDef::new("Twice", id, ContractKind::Interface))
            .unwrap();
        let again = reg.define_contract(id, ContractDef::new("Twice", id, ContractKind::Interface));
        assert!(matches!(again, Err(CoreError::DuplicateTypeName { .. })));
    }

    #[test]
    fn display_names() {
        let mut reg = TypeRegistry::new();
        let foo = reg
            .register_contract(ContractDef::new("Foo", TypeId(0), ContractKind::Interface))
            .unwrap();
        let maybe_foo = reg.register(DeclaredType::Nullable { inner: foo });
        let ints = reg.register(DeclaredType::Sequence { element: TypeId::INT });
        let union = reg.register(DeclaredType::Union {
            members: [TypeId::INT, TypeId::STRING].into_iter().collect(),
        });
        let nested = reg.register(DeclaredType::Union {
            members: [union, TypeId::NULL].into_iter().collect(),
        });

        assert_eq!(reg.display_name(TypeId::ARRAY), "array");
        assert_eq!(reg.display_name(maybe_foo), "?Foo");
        assert_eq!(reg.display_name(ints), "list<int>");
        assert_eq!(reg.display_name(union), "int|string");
        assert_eq!(reg.display_name(nested), "(int|string)|null");
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let reg = TypeRegistry::new();
        assert!(reg.get(TypeId(999)).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut reg = TypeRegistry::new();
        reg.register_contract(ContractDef::new("Test", TypeId(0), ContractKind::Class))
            .unwrap();

        let json = serde_json::to_string(&reg).unwrap();
        let back: TypeRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(back.types.len(), reg.types.len());
        assert_eq!(back.next_id, reg.next_id);
        assert_eq!(back.get_by_name("Test"), Some(TypeId(10)));
    }
}
