//! ReferenceGraph: which contracts mention which other contracts.
//!
//! Nodes are contract [`TypeId`]s; a directed edge `A -> B` means a signature
//! or parent list of `A` mentions `B`. Cycles in the return-type edges are
//! exactly the contract graphs on which default-value synthesis has to stop
//! at an in-progress double, so hosts can inspect them ahead of time.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::type_id::{TypeId, TypeRegistry};
use crate::types::DeclaredType;

/// Why one contract references another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    /// Listed in `extends`.
    Extends,
    /// Mentioned in the return type of an operation.
    Returns { operation: String },
    /// Mentioned in a parameter type of an operation.
    Parameter { operation: String },
}

impl Reference {
    pub fn is_return(&self) -> bool {
        matches!(self, Reference::Returns { .. })
    }
}

/// Directed graph of contract references.
#[derive(Debug, Clone)]
pub struct ReferenceGraph {
    graph: DiGraph<TypeId, Reference, u32>,
    nodes: HashMap<TypeId, NodeIndex<u32>>,
}

impl ReferenceGraph {
    /// Builds the graph of every reference between contracts in `registry`.
    pub fn build(registry: &TypeRegistry) -> Self {
        Self::build_filtered(registry, |_| true)
    }

    /// Builds the graph of return-type references only.
    pub fn returns_only(registry: &TypeRegistry) -> Self {
        Self::build_filtered(registry, Reference::is_return)
    }

    fn build_filtered(registry: &TypeRegistry, keep: impl Fn(&Reference) -> bool) -> Self {
        let mut graph = DiGraph::<TypeId, Reference, u32>::new();
        let mut nodes = HashMap::new();

        for def in registry.contracts() {
            let idx = graph.add_node(def.type_id);
            nodes.insert(def.type_id, idx);
        }

        for def in registry.contracts() {
            let from = nodes[&def.type_id];
            let mut edges: Vec<(TypeId, Reference)> = Vec::new();

            for parent in &def.extends {
                edges.push((*parent, Reference::Extends));
            }
            for op in def.operations.values() {
                let mut targets = Vec::new();
                contracts_in(registry, op.return_type, &mut targets);
                edges.extend(targets.into_iter().map(|t| {
                    (
                        t,
                        Reference::Returns {
                            operation: op.name.clone(),
                        },
                    )
                }));
                for (_, param) in &op.params {
                    let mut targets = Vec::new();
                    contracts_in(registry, *param, &mut targets);
                    edges.extend(targets.into_iter().map(|t| {
                        (
                            t,
                            Reference::Parameter {
                                operation: op.name.clone(),
                            },
                        )
                    }));
                }
            }

            for (target, reference) in edges {
                if !keep(&reference) {
                    continue;
                }
                // Forward declarations that were never defined have no node.
                if let Some(&to) = nodes.get(&target) {
                    graph.add_edge(from, to, reference);
                }
            }
        }

        ReferenceGraph { graph, nodes }
    }

    /// Number of contracts in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of references in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Contracts referenced directly by `id`, sorted and deduplicated.
    pub fn references(&self, id: TypeId) -> Vec<TypeId> {
        let Some(&idx) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<TypeId> = self.graph.neighbors(idx).map(|n| self.graph[n]).collect();
        out.sort();
        out.dedup();
        out
    }

    /// Groups of contracts that reference each other in a cycle.
    ///
    /// Each group is sorted by id; groups are ordered by their smallest id.
    /// A single contract that references itself forms a group of one.
    pub fn cycles(&self) -> Vec<Vec<TypeId>> {
        let mut groups: Vec<Vec<TypeId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some())
            .map(|scc| {
                let mut ids: Vec<TypeId> = scc.into_iter().map(|n| self.graph[n]).collect();
                ids.sort();
                ids
            })
            .collect();
        groups.sort();
        groups
    }

    /// Returns `true` if `id` is part of any reference cycle.
    pub fn is_cyclic(&self, id: TypeId) -> bool {
        self.cycles().iter().any(|group| group.contains(&id))
    }
}

/// Collects every contract mentioned anywhere inside type `ty`.
fn contracts_in(registry: &TypeRegistry, ty: TypeId, out: &mut Vec<TypeId>) {
    match registry.get(ty) {
        Some(DeclaredType::Contract(_)) | Some(DeclaredType::Declared { .. }) => out.push(ty),
        Some(DeclaredType::Sequence { element }) => contracts_in(registry, *element, out),
        Some(DeclaredType::Nullable { inner }) => contracts_in(registry, *inner, out),
        Some(DeclaredType::Union { members }) | Some(DeclaredType::Intersection { members }) => {
            for m in members {
                contracts_in(registry, *m, out);
            }
        }
        _ => {}
    }
}
