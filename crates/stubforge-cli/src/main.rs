//! Stubforge contract inspection CLI.
//!
//! Provides the `stubforge` binary for looking at JSON contract files the way
//! the double engine sees them: which operations a contract exposes and how
//! each is dispatched, which contracts reference each other in cycles, and
//! what an unconfigured stub returns from every operation.
//!
//! Every subcommand prints JSON to stdout.

use std::fs;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use stubforge_core::{
    introspect, resolve_type_expr, ContractFile, Dispatch, ReferenceGraph, TypeId, TypeRegistry,
};
use stubforge_engine::{DoubleEngine, DoubleMode};

/// Stubforge contract tools.
#[derive(Parser)]
#[command(name = "stubforge", about = "Inspect contracts for test double synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show the introspected operations of a contract or intersection.
    Inspect {
        /// Path to the JSON contract file.
        #[arg(short, long)]
        contracts: String,

        /// Type expression to introspect, e.g. `Logger` or `Countable&Traversable`.
        #[arg(value_name = "TYPE")]
        ty: String,
    },
    /// List groups of contracts that reference each other in a cycle.
    Cycles {
        /// Path to the JSON contract file.
        #[arg(short, long)]
        contracts: String,

        /// Follow return types only (the references default synthesis follows).
        #[arg(long)]
        returns_only: bool,
    },
    /// Show what an unconfigured stub returns from every operation.
    Defaults {
        /// Path to the JSON contract file.
        #[arg(short, long)]
        contracts: String,

        /// Type expression of the contract to stub.
        #[arg(value_name = "TYPE")]
        ty: String,
    },
}

#[derive(Serialize)]
struct OperationReport {
    name: String,
    signature: String,
    declared_in: String,
    dispatch: Dispatch,
}

#[derive(Serialize)]
struct ContractReport {
    name: String,
    members: Vec<String>,
    operations: Vec<OperationReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum DefaultOutcome {
    Value(String),
    Error(String),
}

#[derive(Serialize)]
struct DefaultReport {
    operation: String,
    returns: String,
    default: DefaultOutcome,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Inspect { contracts, ty } => run_inspect(&contracts, &ty),
        Commands::Cycles {
            contracts,
            returns_only,
        } => run_cycles(&contracts, returns_only),
        Commands::Defaults { contracts, ty } => run_defaults(&contracts, &ty),
    };
    process::exit(exit_code);
}

/// Loads a contract file into a fresh registry.
///
/// Returns the exit code on failure: 3 = unreadable file, 1 = invalid contracts.
fn load_registry(path: &str) -> Result<TypeRegistry, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read contract file '{}': {}", path, e);
        3
    })?;

    let mut registry = TypeRegistry::new();
    let loaded = ContractFile::from_json(&text).and_then(|file| file.load_into(&mut registry));
    match loaded {
        Ok(ids) => {
            tracing::debug!("loaded {} contract(s) from {}", ids.len(), path);
            Ok(registry)
        }
        Err(e) => {
            eprintln!("Error: invalid contract file '{}': {}", path, e);
            Err(1)
        }
    }
}

fn resolve(registry: &mut TypeRegistry, expr: &str) -> Result<TypeId, i32> {
    resolve_type_expr(registry, expr).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            3
        }
    }
}

/// Execute the inspect subcommand.
fn run_inspect(path: &str, expr: &str) -> i32 {
    let mut registry = match load_registry(path) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let ty = match resolve(&mut registry, expr) {
        Ok(ty) => ty,
        Err(code) => return code,
    };

    let contract = match introspect(&registry, ty) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let report = ContractReport {
        name: contract.name.clone(),
        members: contract
            .members
            .iter()
            .map(|m| registry.display_name(*m))
            .collect(),
        operations: contract
            .operations
            .values()
            .map(|op| {
                let params = op
                    .def
                    .params
                    .iter()
                    .map(|(name, ty)| format!("{} ${}", registry.display_name(*ty), name))
                    .collect::<Vec<_>>()
                    .join(", ");
                OperationReport {
                    name: op.def.name.clone(),
                    signature: format!(
                        "{}({}): {}",
                        op.def.name,
                        params,
                        registry.display_name(op.def.return_type)
                    ),
                    declared_in: registry.display_name(op.declared_in),
                    dispatch: op.dispatch,
                }
            })
            .collect(),
    };
    print_json(&report)
}

/// Execute the cycles subcommand.
fn run_cycles(path: &str, returns_only: bool) -> i32 {
    let registry = match load_registry(path) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let graph = if returns_only {
        ReferenceGraph::returns_only(&registry)
    } else {
        ReferenceGraph::build(&registry)
    };
    tracing::debug!(
        "reference graph: {} contract(s), {} reference(s)",
        graph.node_count(),
        graph.edge_count()
    );

    let cycles: Vec<Vec<String>> = graph
        .cycles()
        .into_iter()
        .map(|group| group.into_iter().map(|id| registry.display_name(id)).collect())
        .collect();
    print_json(&cycles)
}

/// Execute the defaults subcommand.
fn run_defaults(path: &str, expr: &str) -> i32 {
    let mut registry = match load_registry(path) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let ty = match resolve(&mut registry, expr) {
        Ok(ty) => ty,
        Err(code) => return code,
    };

    let mut engine = DoubleEngine::new(&registry);
    let stub = match engine.create_double(ty, DoubleMode::Stub) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let operations: Vec<(String, TypeId)> = match engine.contract_of(stub) {
        Some(contract) => contract
            .operations
            .values()
            .map(|op| (op.def.name.clone(), op.def.return_type))
            .collect(),
        None => Vec::new(),
    };

    let reports: Vec<DefaultReport> = operations
        .into_iter()
        .map(|(operation, returns)| {
            let default = match engine.call(stub, &operation, []) {
                Ok(value) => DefaultOutcome::Value(value.to_string()),
                Err(e) => DefaultOutcome::Error(e.to_string()),
            };
            DefaultReport {
                operation,
                returns: registry.display_name(returns),
                default,
            }
        })
        .collect();
    print_json(&reports)
}
