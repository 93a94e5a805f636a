//! JSON contract files.
//!
//! A contract file describes contracts with written type expressions:
//!
//! ```json
//! { "contracts": [
//!     { "name": "Observer", "kind": "interface",
//!       "operations": [ { "name": "update", "params": [{"name": "event", "type": "string"}] } ] }
//! ] }
//! ```
//!
//! Loading happens in two passes. Every contract name is declared first, so
//! signatures may reference contracts defined later in the file (including
//! themselves); then each signature is resolved and the contract defined.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::operation::OperationDef;
use crate::type_expr::resolve_type_expr;
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::{ContractDef, ContractKind, Visibility};

/// Top-level document of a contract file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFile {
    pub contracts: Vec<ContractEntry>,
}

/// One contract as written in a contract file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEntry {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ContractKind,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub operations: Vec<OperationEntry>,
}

/// One operation as written in a contract file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationEntry {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamEntry>,
    #[serde(default = "default_returns")]
    pub returns: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamEntry {
    pub name: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub ty: String,
}

fn default_kind() -> ContractKind {
    ContractKind::Interface
}

fn default_returns() -> String {
    "void".to_string()
}

fn default_param_type() -> String {
    "mixed".to_string()
}

impl ContractFile {
    /// Parses a contract file from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Declares and defines every contract of this file in `registry`.
    ///
    /// Returns the ids of the loaded contracts in file order.
    pub fn load_into(&self, registry: &mut TypeRegistry) -> Result<Vec<TypeId>, CoreError> {
        let ids = self
            .contracts
            .iter()
            .map(|entry| registry.declare_contract(&entry.name))
            .collect::<Result<Vec<_>, _>>()?;

        for (entry, id) in self.contracts.iter().zip(&ids) {
            let mut def = ContractDef::new(entry.name.clone(), *id, entry.kind);
            for parent in &entry.extends {
                def.extends.push(resolve_type_expr(registry, parent)?);
            }
            for op in &entry.operations {
                def = def.with_operation(resolve_operation(registry, op)?);
            }
            registry.define_contract(*id, def)?;
        }

        Ok(ids)
    }
}

fn resolve_operation(
    registry: &mut TypeRegistry,
    entry: &OperationEntry,
) -> Result<OperationDef, CoreError> {
    let params = entry
        .params
        .iter()
        .map(|p| Ok((p.name.clone(), resolve_type_expr(registry, &p.ty)?)))
        .collect::<Result<Vec<_>, CoreError>>()?;
    let return_type = resolve_type_expr(registry, &entry.returns)?;

    Ok(OperationDef {
        name: entry.name.clone(),
        params,
        return_type,
        visibility: entry.visibility,
        is_final: entry.is_final,
        is_static: entry.is_static,
    })
}

/// Builds a fresh registry holding every contract of a JSON contract file.
pub fn load_contracts(text: &str) -> Result<TypeRegistry, CoreError> {
    let mut registry = TypeRegistry::new();
    ContractFile::from_json(text)?.load_into(&mut registry)?;
    Ok(registry)
}
