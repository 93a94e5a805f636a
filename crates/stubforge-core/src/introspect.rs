//! Contract introspection: from a type to the operation set a double must
//! implement.
//!
//! [`introspect`] walks a contract and its ancestors, collecting every
//! operation with the contract that declared it and a [`Dispatch`] telling the
//! synthesizer how calls to it are routed:
//!
//! - `static` operations get a stand-in that always fails, so no static state
//!   can leak between tests.
//! - `final` and `private` operations cannot be replaced and keep their
//!   original behavior.
//! - everything else is doubled.
//!
//! Final classes, readonly classes and enumerations cannot be doubled at all;
//! introspection fails with [`CoreError::NotDoubleable`], which tells the
//! caller to double an interface instead.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::operation::OperationDef;
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::{ContractDef, ContractKind, DeclaredType, TypeMembers, Visibility};

/// How a double routes calls to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dispatch {
    /// Calls go through the operation's behavior plan.
    Doubled,
    /// Final or private: calls run the original implementation.
    Original,
    /// Static: calls fail with an unsupported-operation error.
    StaticStandIn,
}

impl Dispatch {
    /// Dispatch for an operation based on its modifiers.
    pub fn for_operation(op: &OperationDef) -> Dispatch {
        if op.is_static {
            Dispatch::StaticStandIn
        } else if op.is_final || op.visibility == Visibility::Private {
            Dispatch::Original
        } else {
            Dispatch::Doubled
        }
    }
}

/// One operation of an introspected contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectedOperation {
    pub def: OperationDef,
    /// The contract whose definition supplied this operation.
    pub declared_in: TypeId,
    pub dispatch: Dispatch,
}

/// The immutable result of introspecting one contract or an intersection of
/// contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Display name (`Logger`, or `Countable&Traversable` for intersections).
    pub name: String,
    /// The contracts that were requested, sorted by id.
    pub roots: TypeMembers,
    /// Every contract a double of this contract is an instance of: the roots
    /// and all of their ancestors.
    pub members: Vec<TypeId>,
    /// All operations in declaration order, own operations before inherited ones.
    pub operations: IndexMap<String, IntrospectedOperation>,
}

impl Contract {
    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&IntrospectedOperation> {
        self.operations.get(name)
    }

    /// Iterates over the operations a double replaces.
    pub fn doubled_operations(&self) -> impl Iterator<Item = &IntrospectedOperation> {
        self.operations
            .values()
            .filter(|op| op.dispatch == Dispatch::Doubled)
    }

    /// Returns `true` if a double of this contract is an instance of `ty`.
    pub fn satisfies(&self, ty: TypeId) -> bool {
        self.members.contains(&ty)
    }

    /// Identity of this contract for cycle detection during synthesis.
    pub fn key(&self) -> &[TypeId] {
        &self.roots
    }

    /// Returns `true` if this contract was built from an intersection.
    pub fn is_intersection(&self) -> bool {
        self.roots.len() > 1
    }
}

/// Introspects the contract identified by `id`.
///
/// An intersection type id is introspected as the intersection of its members.
pub fn introspect(registry: &TypeRegistry, id: TypeId) -> Result<Contract, CoreError> {
    if let Some(DeclaredType::Intersection { members }) = registry.get(id) {
        return introspect_intersection(registry, members);
    }

    let def = doubleable_contract(registry, id)?;
    let mut members = Vec::new();
    let mut operations = IndexMap::new();
    collect(registry, def, &mut members, &mut operations)?;

    Ok(Contract {
        name: def.name.clone(),
        roots: TypeMembers::from_slice(&[id]),
        members,
        operations,
    })
}

/// Introspects the intersection of several interfaces.
///
/// Requires at least two distinct contracts, each an interface. An operation
/// declared by more than one member is merged when the signatures agree.
pub fn introspect_intersection(
    registry: &TypeRegistry,
    ids: &[TypeId],
) -> Result<Contract, CoreError> {
    let mut roots = TypeMembers::new();
    for id in ids {
        if !roots.contains(id) {
            roots.push(*id);
        }
    }

    let display = roots
        .iter()
        .map(|id| registry.display_name(*id))
        .collect::<Vec<_>>()
        .join("&");

    if roots.len() < 2 {
        return Err(CoreError::NotDoubleable {
            name: display,
            reason: "an intersection needs at least two distinct contracts".into(),
        });
    }

    let mut members: Vec<TypeId> = Vec::new();
    let mut operations: IndexMap<String, IntrospectedOperation> = IndexMap::new();

    for id in &roots {
        let def = doubleable_contract(registry, *id)?;
        if def.kind != ContractKind::Interface {
            return Err(CoreError::NotDoubleable {
                name: display,
                reason: format!("'{}' is a {}, not an interface", def.name, def.kind.label()),
            });
        }

        let part = introspect(registry, *id)?;
        for member in part.members {
            if !members.contains(&member) {
                members.push(member);
            }
        }
        for (name, op) in part.operations {
            match operations.get(&name) {
                Some(existing) if !existing.def.same_signature(&op.def) => {
                    return Err(CoreError::ConflictingOperation {
                        operation: name,
                        first: registry.display_name(existing.declared_in),
                        second: registry.display_name(op.declared_in),
                    });
                }
                Some(_) => {}
                None => {
                    operations.insert(name, op);
                }
            }
        }
    }

    roots.sort();
    Ok(Contract {
        name: display,
        roots,
        members,
        operations,
    })
}

/// Resolves `id` to a contract definition that may be doubled.
fn doubleable_contract(registry: &TypeRegistry, id: TypeId) -> Result<&ContractDef, CoreError> {
    match registry.get(id) {
        None => Err(CoreError::TypeNotFound { id }),
        Some(DeclaredType::Declared { name }) => {
            Err(CoreError::UndefinedContract { name: name.clone() })
        }
        Some(DeclaredType::Contract(def)) if def.kind.is_doubleable() => Ok(def),
        Some(DeclaredType::Contract(def)) => Err(CoreError::NotDoubleable {
            name: def.name.clone(),
            reason: format!("it is a {}", def.kind.label()),
        }),
        Some(_) => Err(CoreError::NotDoubleable {
            name: registry.display_name(id),
            reason: "it is not a contract type".into(),
        }),
    }
}

/// Breadth-first walk over `root` and its ancestors.
///
/// The closest declaration of an operation name wins, so overrides shadow
/// inherited definitions. Ancestors at the same distance that declare the
/// same name with different signatures are a [`CoreError::ConflictingOperation`].
fn collect<'r>(
    registry: &'r TypeRegistry,
    root: &'r ContractDef,
    members: &mut Vec<TypeId>,
    operations: &mut IndexMap<String, IntrospectedOperation>,
) -> Result<(), CoreError> {
    let mut visited = HashSet::from([root.type_id]);
    let mut level = vec![root];

    while !level.is_empty() {
        let mut found: IndexMap<String, IntrospectedOperation> = IndexMap::new();
        let mut next = Vec::new();

        for def in &level {
            members.push(def.type_id);

            for op in def.operations.values() {
                if operations.contains_key(&op.name) {
                    continue;
                }
                match found.get(&op.name) {
                    Some(existing) if !existing.def.same_signature(op) => {
                        return Err(CoreError::ConflictingOperation {
                            operation: op.name.clone(),
                            first: registry.display_name(existing.declared_in),
                            second: def.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        found.insert(
                            op.name.clone(),
                            IntrospectedOperation {
                                def: op.clone(),
                                declared_in: def.type_id,
                                dispatch: Dispatch::for_operation(op),
                            },
                        );
                    }
                }
            }

            for parent in &def.extends {
                let parent_def = parent_contract(registry, def, *parent)?;
                if visited.insert(*parent) {
                    next.push(parent_def);
                }
            }
        }

        operations.extend(found);
        level = next;
    }

    Ok(())
}

fn parent_contract<'r>(
    registry: &'r TypeRegistry,
    child: &ContractDef,
    parent: TypeId,
) -> Result<&'r ContractDef, CoreError> {
    match registry.get(parent) {
        Some(DeclaredType::Contract(def)) => Ok(def),
        Some(DeclaredType::Declared { name }) => {
            Err(CoreError::UndefinedContract { name: name.clone() })
        }
        Some(_) => Err(CoreError::NotDoubleable {
            name: child.name.clone(),
            reason: format!(
                "it extends '{}', which is not a contract",
                registry.display_name(parent)
            ),
        }),
        None => Err(CoreError::TypeNotFound { id: parent }),
    }
}
