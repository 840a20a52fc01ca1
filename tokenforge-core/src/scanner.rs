//! Textual Scanners
//!
//! Two stateless presence/absence predicates:
//! - fallback scan: `var(--token, fallback)` anywhere under the scan dirs
//! - router invariants: required markers and a safelist branch in the router

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{FallbackScan, RouterContract};

lazy_static! {
    static ref VAR_FALLBACK_RE: Regex = Regex::new(r"var\(\s*--[^,\s)]+\s*,\s*[^)]+\)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackHit {
    /// Relative to the scan root
    pub file: PathBuf,
    /// Distinct matches in order of first appearance
    pub matches: Vec<String>,
    pub count: usize,
}

/// Every fallback-style lookup in `text`
pub fn find_fallbacks(text: &str) -> Vec<&str> {
    VAR_FALLBACK_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Files under `dir` with one of `extensions`, in path order.
/// A missing directory yields nothing.
pub fn walk_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            extensions.is_empty()
                || p.extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| extensions.iter().any(|want| want.trim_start_matches('.') == ext))
        })
        .collect()
}

pub fn scan_fallbacks(root: &Path, scan: &FallbackScan) -> Vec<FallbackHit> {
    let mut hits = Vec::new();
    for dir in &scan.dirs {
        for file in walk_files(&root.join(dir), &scan.extensions) {
            let Ok(text) = fs::read_to_string(&file) else {
                warn!(file = %file.display(), "skipping unreadable file");
                continue;
            };
            let found = find_fallbacks(&text);
            if found.is_empty() {
                continue;
            }
            let mut matches: Vec<String> = Vec::new();
            for m in &found {
                if !matches.iter().any(|seen| seen.as_str() == *m) {
                    matches.push(m.to_string());
                }
            }
            let rel = file.strip_prefix(root).unwrap_or(file.as_path()).to_path_buf();
            debug!(file = %rel.display(), count = found.len(), "fallback lookups found");
            hits.push(FallbackHit {
                file: rel,
                matches,
                count: found.len(),
            });
        }
    }
    hits
}

/// Router contract violations in `src`; empty means the contract holds.
pub fn router_violations(src: &str, contract: &RouterContract) -> Vec<String> {
    let mut violations: Vec<String> = contract
        .required_markers
        .iter()
        .filter(|marker| !src.contains(marker.as_str()))
        .map(|marker| format!("Missing required executor marker/snippet: \"{marker}\""))
        .collect();

    if !contract.safelist_hints.iter().any(|hint| src.contains(hint.as_str())) {
        let expected: Vec<_> = contract.safelist_hints.iter().map(|h| format!("\"{h}\"")).collect();
        violations.push(format!(
            "Safelist branching not detected (expected one of: {})",
            expected.join(", ")
        ));
    }
    violations
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouterOutcome {
    Holds,
    Missing { path: PathBuf },
    Violated { violations: Vec<String> },
}

pub fn check_router(root: &Path, router: &Path, contract: &RouterContract) -> RouterOutcome {
    match fs::read_to_string(root.join(router)) {
        Ok(src) => {
            let violations = router_violations(&src, contract);
            if violations.is_empty() {
                RouterOutcome::Holds
            } else {
                RouterOutcome::Violated { violations }
            }
        }
        Err(_) => RouterOutcome::Missing {
            path: router.to_path_buf(),
        },
    }
}
