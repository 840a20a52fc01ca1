//! Project Layout - where inputs live and outputs land
//!
//! Every path is relative to the project root. A `tokenforge.json` at the
//! root overrides any subset of the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::TokenError;
use crate::tokens::Namespace;

pub const CONFIG_FILE: &str = "tokenforge.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectLayout {
    pub tokens: PathBuf,
    pub stylesheet_dir: PathBuf,
    pub primitives_file: String,
    pub semantic_file: String,
    pub component_file: String,
    pub legacy_file: String,
    pub report_dir: PathBuf,
    pub collaborators: Collaborators,
    pub fallback_scan: FallbackScan,
    pub known_typos: Vec<String>,
    pub router: RouterContract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Collaborators {
    pub executor: PathBuf,
    pub richtext: PathBuf,
    pub figure: PathBuf,
    pub site_config: PathBuf,
    pub contract: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackScan {
    pub dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterContract {
    pub required_markers: Vec<String>,
    pub safelist_hints: Vec<String>,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            tokens: PathBuf::from("tokens/tokens.json"),
            stylesheet_dir: PathBuf::from("src/assets/scss"),
            primitives_file: "_tokens--primitives.scss".to_string(),
            semantic_file: "_tokens--semantic.scss".to_string(),
            component_file: "_tokens--component.scss".to_string(),
            legacy_file: "_tokens--legacy.scss".to_string(),
            report_dir: PathBuf::from("_docs/generated"),
            collaborators: Collaborators::default(),
            fallback_scan: FallbackScan::default(),
            known_typos: vec!["--scale--".to_string()],
            router: RouterContract::default(),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            executor: PathBuf::from("src/_includes/layouts/content-cell.njk"),
            richtext: PathBuf::from("src/_includes/components/richtext.njk"),
            figure: PathBuf::from("src/_includes/components/figure.njk"),
            site_config: PathBuf::from(".eleventy.js"),
            contract: PathBuf::from("CONTRACT.md"),
        }
    }
}

impl Default for FallbackScan {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("src/assets/scss"), PathBuf::from("src/_includes")],
            extensions: ["scss", "css", "njk", "html"].iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for RouterContract {
    fn default() -> Self {
        Self {
            required_markers: ["EXECUTOR_ERROR", "UNKNOWN_INCLUDE", "item.include"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            safelist_hints: ["elseif item.include", "if item.include"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ProjectLayout {
    /// Load the layout for `root`.
    ///
    /// An explicit config path must exist. Without one, `tokenforge.json`
    /// is used when present, otherwise the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, TokenError> {
        let path = match explicit {
            Some(p) => root.join(p),
            None => {
                let candidate = root.join(CONFIG_FILE);
                if !candidate.exists() {
                    debug!(root = %root.display(), "no {CONFIG_FILE}, using default layout");
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let content = fs::read_to_string(&path).map_err(|e| TokenError::io(&path, e))?;
        let layout = serde_json::from_str(&content)?;
        debug!(config = %path.display(), "loaded project layout");
        Ok(layout)
    }

    pub fn generated_file(&self, namespace: Namespace) -> &str {
        match namespace {
            Namespace::Primitives => &self.primitives_file,
            Namespace::Semantic => &self.semantic_file,
            Namespace::Component => &self.component_file,
        }
    }

    /// Generated stylesheet path relative to the project root
    pub fn generated_path(&self, namespace: Namespace) -> PathBuf {
        self.stylesheet_dir.join(self.generated_file(namespace))
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.stylesheet_dir.join(&self.legacy_file)
    }
}
