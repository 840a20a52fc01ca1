//! TokenForge Core - Design Token Compiler
//!
//! # Guarantees
//! 1. Same token document, byte-identical stylesheets
//! 2. One output name per namespace, duplicates abort the run
//! 3. Nothing is written until every namespace compiled cleanly
//! 4. Legacy files change only under an explicit flag, conflicts never
//! 5. Contract checks all run, any FAIL fails the run

pub mod config;
pub mod contracts;
pub mod docs;
pub mod emit;
pub mod error;
pub mod hashing;
pub mod naming;
pub mod pipeline;
pub mod prune;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod tokens;
pub mod values;

pub use config::ProjectLayout;
pub use contracts::{CheckContext, CheckResult, CheckStatus, ContractCheck, ContractChecker};
pub use emit::ResolvedVariable;
pub use error::TokenError;
pub use pipeline::{compile_graph, BuildSummary, TokenPipeline};
pub use prune::{LegacyPruner, PrunePolicy, PruneReport};
pub use report::ContractReport;
pub use resolver::Resolver;
pub use tokens::{Namespace, TokenGraph, TokenNode};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
