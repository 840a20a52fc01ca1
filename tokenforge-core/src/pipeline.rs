//! Token Pipeline - Single Entry Point
//!
//! load -> resolve -> compile -> name -> guard -> render -> write.
//! Every namespace is rendered and guarded before the first file is
//! written, so a failed run leaves the previous outputs untouched.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::ProjectLayout;
use crate::emit::{assert_unique, render_stylesheet, sort_variables, ResolvedVariable};
use crate::error::TokenError;
use crate::hashing::{document_digest, sha256_hex};
use crate::naming::variable_name;
use crate::resolver::Resolver;
use crate::tokens::{Namespace, TokenGraph};
use crate::values::compile_value;
use crate::ENGINE_VERSION;

/// One rendered namespace, not yet on disk
#[derive(Debug, Clone)]
pub struct CompiledNamespace {
    pub namespace: Namespace,
    pub variables: Vec<ResolvedVariable>,
    pub contents: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedFile {
    pub namespace: Namespace,
    pub path: PathBuf,
    pub variables: usize,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub engine_version: String,
    pub source_digest: String,
    pub files: Vec<EmittedFile>,
}

/// Resolve and compile every leaf of `namespace`, unsorted.
pub fn collect_variables(
    graph: &TokenGraph,
    namespace: Namespace,
) -> Result<Vec<ResolvedVariable>, TokenError> {
    let resolver = Resolver::new(graph);
    graph
        .entries(namespace)
        .into_iter()
        .map(|entry| {
            let source_path = entry.source_path();
            let value = compile_value(&entry.leaf.value, &resolver, &source_path)?;
            Ok::<_, TokenError>(ResolvedVariable {
                name: variable_name(namespace, &entry.segments),
                value,
                source_path,
            })
        })
        .collect()
}

/// Compile the whole graph into three rendered stylesheets.
///
/// `source_label` is the token document path quoted in each header.
pub fn compile_graph(
    graph: &TokenGraph,
    layout: &ProjectLayout,
    source_label: &str,
) -> Result<Vec<CompiledNamespace>, TokenError> {
    let mut collected = Vec::with_capacity(Namespace::ALL.len());
    for namespace in Namespace::ALL {
        collected.push((namespace, collect_variables(graph, namespace)?));
    }

    Resolver::new(graph).check_cycles()?;

    let mut compiled = Vec::with_capacity(collected.len());
    for (namespace, mut variables) in collected {
        sort_variables(&mut variables);
        assert_unique(namespace, &variables)?;
        let contents = render_stylesheet(
            namespace,
            layout.generated_file(namespace),
            source_label,
            &variables,
        );
        debug!(%namespace, variables = variables.len(), "rendered namespace");
        compiled.push(CompiledNamespace {
            namespace,
            variables,
            contents,
        });
    }
    Ok(compiled)
}

pub struct TokenPipeline {
    root: PathBuf,
    layout: ProjectLayout,
}

impl TokenPipeline {
    pub fn new(root: impl Into<PathBuf>, layout: ProjectLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    /// Compile the token document and overwrite the three generated files.
    pub fn build(&self) -> Result<BuildSummary, TokenError> {
        let tokens_path = self.root.join(&self.layout.tokens);
        let document = fs::read_to_string(&tokens_path).map_err(|e| TokenError::io(&tokens_path, e))?;
        let graph = TokenGraph::from_json_str(&document)?;
        let source_digest = document_digest(&document)?;
        info!(tokens = %tokens_path.display(), leaves = graph.leaf_count(), "compiling tokens");

        let source_label = self.layout.tokens.display().to_string();
        let compiled = compile_graph(&graph, &self.layout, &source_label)?;

        let out_dir = self.root.join(&self.layout.stylesheet_dir);
        fs::create_dir_all(&out_dir).map_err(|e| TokenError::io(&out_dir, e))?;

        let mut files = Vec::with_capacity(compiled.len());
        for unit in compiled {
            let rel = self.layout.generated_path(unit.namespace);
            let path = self.root.join(&rel);
            fs::write(&path, &unit.contents).map_err(|e| TokenError::io(&path, e))?;
            let digest = sha256_hex(unit.contents.as_bytes());
            info!(file = %rel.display(), variables = unit.variables.len(), %digest, "wrote");
            files.push(EmittedFile {
                namespace: unit.namespace,
                path: rel,
                variables: unit.variables.len(),
                digest,
            });
        }

        Ok(BuildSummary {
            engine_version: ENGINE_VERSION.to_string(),
            source_digest,
            files,
        })
    }
}
