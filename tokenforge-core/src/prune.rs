//! Legacy Pruning - retire hand-written declarations covered by generated output
//!
//! Classification per legacy name:
//! - covered: generated has the name with the same value as every legacy declaration
//! - conflict: generated has the name with a different value
//! - missing: generated lacks the name
//!
//! Only covered names are ever removed. Nothing is written unless the
//! policy says so.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ProjectLayout;
use crate::error::TokenError;
use crate::tokens::Namespace;

const MAX_LISTED_CONFLICTS: usize = 50;
const MAX_LISTED_MISSING: usize = 80;

lazy_static! {
    static ref DECLARATION_RE: Regex = Regex::new(r"(--[A-Za-z0-9_-]+)\s*:\s*([^;]+);").unwrap();
    static ref DECLARATION_LINE_RE: Regex = Regex::new(r"^\s*(--[A-Za-z0-9_-]+)\s*:\s*[^;]*;\s*$").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// What a prune run may touch. Destructive policies need explicit flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrunePolicy {
    #[default]
    ReportOnly,
    /// Write `<legacy>.pruned.scss` beside the legacy file
    NewFile,
    /// Overwrite the legacy file
    InPlace,
}

impl PrunePolicy {
    pub fn from_flags(write: bool, in_place: bool) -> Self {
        match (write, in_place) {
            (true, true) => Self::InPlace,
            (true, false) => Self::NewFile,
            (false, _) => Self::ReportOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Covered,
    Conflict,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub name: String,
    pub legacy: String,
    pub generated: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub covered: Vec<String>,
    pub conflicts: Vec<Conflict>,
    pub missing: Vec<String>,
}

impl Classification {
    pub fn coverage(&self, name: &str) -> Option<Coverage> {
        if self.covered.iter().any(|n| n == name) {
            Some(Coverage::Covered)
        } else if self.conflicts.iter().any(|c| c.name == name) {
            Some(Coverage::Conflict)
        } else if self.missing.iter().any(|n| n == name) {
            Some(Coverage::Missing)
        } else {
            None
        }
    }

    pub fn safe_to_remove(&self) -> BTreeSet<String> {
        self.covered.iter().cloned().collect()
    }
}

/// `--name: value;` declarations, values trimmed and whitespace-collapsed.
/// A later declaration of the same name replaces an earlier one.
pub fn extract_declarations(text: &str) -> BTreeMap<String, String> {
    declarations(text).collect()
}

/// Every value declared per name, in document order
pub fn extract_all_declarations(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in declarations(text) {
        out.entry(name).or_default().push(value);
    }
    out
}

fn declarations(text: &str) -> impl Iterator<Item = (String, String)> + '_ {
    DECLARATION_RE.captures_iter(text).map(|caps| {
        let value = WHITESPACE_RE.replace_all(caps[2].trim(), " ").into_owned();
        (caps[1].to_string(), value)
    })
}

/// A name is covered only when every legacy declaration of it matches the
/// generated value; the first mismatch makes it a conflict.
pub fn classify(
    legacy: &BTreeMap<String, Vec<String>>,
    generated: &BTreeMap<String, String>,
) -> Classification {
    let mut out = Classification::default();
    for (name, legacy_values) in legacy {
        let Some(gen_value) = generated.get(name) else {
            out.missing.push(name.clone());
            continue;
        };
        match legacy_values.iter().find(|v| *v != gen_value) {
            None => out.covered.push(name.clone()),
            Some(legacy_value) => out.conflicts.push(Conflict {
                name: name.clone(),
                legacy: legacy_value.clone(),
                generated: gen_value.clone(),
            }),
        }
    }
    out
}

/// Drop whole single-line declarations named in `remove`; every other line
/// is kept byte for byte.
pub fn prune_declarations(legacy_text: &str, remove: &BTreeSet<String>) -> String {
    legacy_text
        .split('\n')
        .filter(|line| match DECLARATION_LINE_RE.captures(line) {
            Some(caps) => !remove.contains(&caps[1]),
            None => true,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `_tokens--legacy.scss` -> `_tokens--legacy.pruned.scss`
pub fn pruned_path(legacy: &Path) -> PathBuf {
    let name = legacy
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pruned = match name.strip_suffix(".scss") {
        Some(stem) => format!("{stem}.pruned.scss"),
        None => format!("{name}.pruned"),
    };
    legacy.with_file_name(pruned)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneReport {
    pub legacy_path: PathBuf,
    pub generated_paths: Vec<PathBuf>,
    pub policy: PrunePolicy,
    pub classification: Classification,
    pub written: Option<PathBuf>,
}

impl PruneReport {
    pub fn render(&self) -> String {
        let c = &self.classification;
        let generated: Vec<_> = self.generated_paths.iter().map(|p| p.display().to_string()).collect();
        let mut out = String::new();
        let _ = writeln!(out, "=== Token Prune Report ===");
        let _ = writeln!(out, "Legacy file:     {}", self.legacy_path.display());
        let _ = writeln!(out, "Generated files: {}", generated.join(", "));
        let _ = writeln!(out);
        let _ = writeln!(out, "Covered by generated (safe to delete from legacy): {}", c.covered.len());
        let _ = writeln!(out, "Still missing (must remain in legacy for now):      {}", c.missing.len());
        let _ = writeln!(out, "Conflicts (same name, different value):             {}", c.conflicts.len());

        if !c.conflicts.is_empty() {
            let _ = writeln!(out, "\nConflicts (review these before deleting):");
            for conflict in c.conflicts.iter().take(MAX_LISTED_CONFLICTS) {
                let _ = writeln!(out, "- {}", conflict.name);
                let _ = writeln!(out, "  legacy:    {}", conflict.legacy);
                let _ = writeln!(out, "  generated: {}", conflict.generated);
            }
            if c.conflicts.len() > MAX_LISTED_CONFLICTS {
                let _ = writeln!(out, "  ...and {} more", c.conflicts.len() - MAX_LISTED_CONFLICTS);
            }
        }

        if !c.missing.is_empty() {
            let _ = writeln!(out, "\nMissing vars (still only in legacy):");
            for name in c.missing.iter().take(MAX_LISTED_MISSING) {
                let _ = writeln!(out, "- {name}");
            }
            if c.missing.len() > MAX_LISTED_MISSING {
                let _ = writeln!(out, "...and {} more", c.missing.len() - MAX_LISTED_MISSING);
            }
        }

        let _ = writeln!(out);
        match (&self.policy, &self.written) {
            (PrunePolicy::ReportOnly, _) => {
                let _ = writeln!(out, "DRY RUN only. Add --write to output a pruned legacy file.");
                let _ = writeln!(out, "Tip: also add --in-place to overwrite the legacy file.");
            }
            (PrunePolicy::InPlace, Some(path)) => {
                let _ = writeln!(out, "Wrote pruned legacy file in place: {}", path.display());
            }
            (_, Some(path)) => {
                let _ = writeln!(out, "Wrote pruned legacy file: {}", path.display());
            }
            (_, None) => {}
        }
        out
    }
}

pub struct LegacyPruner<'a> {
    root: &'a Path,
    layout: &'a ProjectLayout,
}

impl<'a> LegacyPruner<'a> {
    pub fn new(root: &'a Path, layout: &'a ProjectLayout) -> Self {
        Self { root, layout }
    }

    pub fn run(&self, policy: PrunePolicy) -> Result<PruneReport, TokenError> {
        let legacy_rel = self.layout.legacy_path();
        let legacy_abs = self.root.join(&legacy_rel);
        let legacy = fs::read_to_string(&legacy_abs).map_err(|e| TokenError::io(&legacy_abs, e))?;

        let mut generated_paths = Vec::new();
        let mut generated = String::new();
        for namespace in Namespace::ALL {
            let rel = self.layout.generated_path(namespace);
            let abs = self.root.join(&rel);
            generated.push_str(&fs::read_to_string(&abs).map_err(|e| TokenError::io(&abs, e))?);
            generated.push('\n');
            generated_paths.push(rel);
        }

        let classification = classify(&extract_all_declarations(&legacy), &extract_declarations(&generated));
        info!(
            covered = classification.covered.len(),
            conflicts = classification.conflicts.len(),
            missing = classification.missing.len(),
            ?policy,
            "classified legacy declarations"
        );
        if !classification.conflicts.is_empty() {
            warn!(count = classification.conflicts.len(), "legacy conflicts are kept");
        }

        let written = match policy {
            PrunePolicy::ReportOnly => None,
            PrunePolicy::NewFile | PrunePolicy::InPlace => {
                let pruned = prune_declarations(&legacy, &classification.safe_to_remove());
                let (target_rel, target_abs) = if policy == PrunePolicy::InPlace {
                    (legacy_rel.clone(), legacy_abs.clone())
                } else {
                    (pruned_path(&legacy_rel), pruned_path(&legacy_abs))
                };
                fs::write(&target_abs, pruned).map_err(|e| TokenError::io(&target_abs, e))?;
                info!(file = %target_rel.display(), "wrote pruned legacy file");
                Some(target_rel)
            }
        };

        Ok(PruneReport {
            legacy_path: legacy_rel,
            generated_paths,
            policy,
            classification,
            written,
        })
    }
}
