//! Compiler Faults
//!
//! Every variant aborts the run. Contract check failures are not errors,
//! they are reported as `CheckResult`s.

use std::path::PathBuf;
use thiserror::Error;

use crate::tokens::Namespace;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid token document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported value for token {path} (expected string, number or boolean)")]
    UnsupportedValue { path: String },

    #[error("Unresolved reference: {reference} (in {context})")]
    UnresolvedReference { reference: String, context: String },

    #[error("Reference cycle: {}", .chain.join(" -> "))]
    ReferenceCycle { chain: Vec<String> },

    #[error(
        "[{namespace}] Duplicate CSS var \"{name}\"\n- {first_path} => {first_value}\n- {second_path} => {second_value}"
    )]
    DuplicateVariable {
        namespace: Namespace,
        name: String,
        first_path: String,
        first_value: String,
        second_path: String,
        second_value: String,
    },
}

impl TokenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
