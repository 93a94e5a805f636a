pub mod types;
pub mod type_id;
pub mod type_expr;
pub mod operation;
pub mod id;
pub mod error;
pub mod loader;
pub mod introspect;
pub mod graph;

// Re-export commonly used types
pub use types::{ContractDef, ContractKind, DeclaredType, ScalarType, TypeMembers, Visibility};
pub use type_id::{TypeId, TypeRegistry};
pub use type_expr::resolve_type_expr;
pub use operation::OperationDef;
pub use id::DoubleId;
pub use error::CoreError;
pub use loader::{load_contracts, ContractFile};
pub use introspect::{introspect, introspect_intersection, Contract, Dispatch, IntrospectedOperation};
pub use graph::{Reference, ReferenceGraph};
