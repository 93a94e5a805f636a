//! Shared contract fixtures for the engine integration tests.

#![allow(dead_code)]

use stubforge_core::{load_contracts, TypeId, TypeRegistry};

pub const CONTRACTS: &str = r#"{
    "contracts": [
        { "name": "Observer", "operations": [
            { "name": "update", "params": [{ "name": "event", "type": "string" }] },
            { "name": "name", "returns": "string" }
        ] },
        { "name": "Service", "operations": [
            { "name": "doSomething", "returns": "string" }
        ] },
        { "name": "Defaults", "operations": [
            { "name": "flag", "returns": "bool" },
            { "name": "count", "returns": "int" },
            { "name": "ratio", "returns": "float" },
            { "name": "label", "returns": "string" },
            { "name": "items", "returns": "list<string>" },
            { "name": "maybe", "returns": "?Observer" },
            { "name": "anything", "returns": "mixed" },
            { "name": "fluent", "returns": "static" },
            { "name": "choice", "returns": "string|int" },
            { "name": "observer", "returns": "Observer" },
            { "name": "reset" },
            { "name": "halt", "returns": "never" },
            { "name": "status", "returns": "Status" }
        ] },
        { "name": "Status", "kind": "enumeration" },
        { "name": "Node", "operations": [ { "name": "next", "returns": "Node" } ] },
        { "name": "Parent", "operations": [ { "name": "child", "returns": "Child" } ] },
        { "name": "Child", "operations": [ { "name": "parent", "returns": "Parent" } ] },
        { "name": "Countable", "operations": [ { "name": "count", "returns": "int" } ] },
        { "name": "Traversable", "operations": [ { "name": "rewind" } ] },
        { "name": "Collection", "extends": ["Countable", "Traversable"], "operations": [
            { "name": "first", "returns": "Countable&Traversable" }
        ] },
        { "name": "Repository", "kind": "class", "operations": [
            { "name": "find", "params": [{ "name": "id", "type": "int" }], "returns": "?string" },
            { "name": "save", "params": [{ "name": "entity", "type": "string" }], "returns": "bool" },
            { "name": "checksum", "returns": "string", "final": true },
            { "name": "connect", "returns": "bool", "visibility": "private" },
            { "name": "create", "returns": "static", "static": true }
        ] },
        { "name": "AuditedRepository", "kind": "class", "extends": ["Repository"], "operations": [
            { "name": "audit", "returns": "list<string>" }
        ] },
        { "name": "Clock", "kind": "final_class", "operations": [ { "name": "now", "returns": "int" } ] }
    ]
}"#;

pub fn registry() -> TypeRegistry {
    load_contracts(CONTRACTS).expect("fixture contracts load")
}

pub fn id(registry: &TypeRegistry, name: &str) -> TypeId {
    registry
        .get_by_name(name)
        .unwrap_or_else(|| panic!("fixture has no contract {name}"))
}
