//! Contract Checks - textual invariants over collaborator files
//!
//! Checks are substring/regex heuristics against literal source text, not
//! parses of the template formats. Each check yields PASS/WARN/FAIL results
//! and never stops the others from running.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::{FallbackScan, ProjectLayout};
use crate::report::ContractReport;
use crate::scanner::{router_violations, scan_fallbacks, walk_files};

lazy_static! {
    static ref OR_EMPTY_RE: Regex = Regex::new(r"\bor\s*\{\s*\}").unwrap();
    static ref INCLUDE_ITEM_RE: Regex = Regex::new(r"include\s+item\.include").unwrap();
    static ref WHITELIST_RE: Regex = Regex::new(r#"item\.include\s*==\s*["']components/"#).unwrap();
    static ref SET_OR_DEFAULT_RE: Regex = Regex::new(r#"\{%\s*set\s+\w+\s*=\s*[^%]*\bor\b[^%]*["']"#).unwrap();
    static ref DEFAULT_FILTER_RE: Regex = Regex::new(r"\|\s*default\s*\(").unwrap();
    static ref IMG_RE: Regex = Regex::new(r"(?i)<img\b").unwrap();
    static ref IMAGE_SHORTCODE_RE: Regex = Regex::new(r#"addNunjucksAsyncShortcode\(\s*["']image["']"#).unwrap();
    static ref FIGURE_OPTIMIZED_RE: Regex = Regex::new(r"(?i)figure-optimized").unwrap();
    static ref SRC_FILE_RE: Regex = Regex::new(r"(?i)\bsrcFile\b").unwrap();
    static ref SRC_RE: Regex = Regex::new(r"(?i)\bsrc\b").unwrap();
}

/// Ordered FAIL first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Fail,
    Warn,
    Pass,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warn => "WARN",
            CheckStatus::Pass => "PASS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub label: String,
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn pass(label: impl Into<String>) -> Self {
        Self { status: CheckStatus::Pass, label: label.into(), detail: None }
    }

    pub fn warn(label: impl Into<String>, detail: Option<String>) -> Self {
        Self { status: CheckStatus::Warn, label: label.into(), detail }
    }

    pub fn fail(label: impl Into<String>, detail: Option<String>) -> Self {
        Self { status: CheckStatus::Fail, label: label.into(), detail }
    }

    /// PASS when `ok`, otherwise `status` with `detail`
    fn gate(ok: bool, label: &str, status: CheckStatus, detail: &str) -> Self {
        if ok {
            Self::pass(label)
        } else {
            Self {
                status,
                label: label.to_string(),
                detail: (!detail.is_empty()).then(|| detail.to_string()),
            }
        }
    }
}

pub struct CheckContext<'a> {
    pub root: &'a Path,
    pub layout: &'a ProjectLayout,
}

impl CheckContext<'_> {
    fn read(&self, rel: &Path) -> Option<String> {
        fs::read_to_string(self.root.join(rel)).ok()
    }
}

/// One independent check against a collaborator
pub trait ContractCheck {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult>;
}

// --- Concrete Checks ---

pub struct ExecutorCheck;

impl ContractCheck for ExecutorCheck {
    fn name(&self) -> &'static str { "executor" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let path = &ctx.layout.collaborators.executor;
        let Some(ex) = ctx.read(path) else {
            return vec![CheckResult::fail(
                "Executor exists",
                Some(format!("Missing file: {}", path.display())),
            )];
        };

        let mut results = vec![CheckResult::pass("Executor exists")];
        let has_or_empty = OR_EMPTY_RE.is_match(&ex);
        results.push(CheckResult::gate(
            !has_or_empty,
            "Executor: no `or {}` param defaults",
            CheckStatus::Fail,
            "Found `or {}` in executor",
        ));
        results.push(CheckResult::gate(
            ex.contains("EXECUTOR_ERROR"),
            "Executor: missing params render EXECUTOR_ERROR comment",
            CheckStatus::Fail,
            "EXECUTOR_ERROR marker not found",
        ));
        let has_unknown = ex.contains("UNKNOWN_INCLUDE");
        results.push(CheckResult::gate(
            has_unknown,
            "Executor: unknown include renders visible comment",
            CheckStatus::Fail,
            "UNKNOWN_INCLUDE marker not found",
        ));

        let has_include_item = INCLUDE_ITEM_RE.is_match(&ex);
        let has_whitelist = WHITELIST_RE.is_match(&ex);
        results.push(if has_include_item && has_whitelist && has_unknown {
            CheckResult::pass("Executor: include dispatch is whitelisted (safe include item.include)")
        } else if has_include_item {
            CheckResult::fail(
                "Executor: include item.include is unguarded (no whitelist detected)",
                None,
            )
        } else {
            CheckResult::pass("Executor: no include item.include usage")
        });

        let violations = router_violations(&ex, &ctx.layout.router);
        results.push(CheckResult::gate(
            violations.is_empty(),
            "Executor: router invariant markers present",
            CheckStatus::Fail,
            &violations.join("; "),
        ));
        results
    }
}

pub struct RichtextCheck;

impl ContractCheck for RichtextCheck {
    fn name(&self) -> &'static str { "richtext" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let Some(rt) = ctx.read(&ctx.layout.collaborators.richtext) else {
            return vec![CheckResult::warn("Richtext component not present (skipped)", None)];
        };
        let defaulting = SET_OR_DEFAULT_RE.is_match(&rt) || DEFAULT_FILTER_RE.is_match(&rt);
        vec![CheckResult::gate(
            !defaulting,
            "Richtext: no implicit defaults (`or \"...\"` or `| default()`)",
            CheckStatus::Fail,
            "Defaulting pattern detected",
        )]
    }
}

pub struct FigureCheck;

impl ContractCheck for FigureCheck {
    fn name(&self) -> &'static str { "figure" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let path = &ctx.layout.collaborators.figure;
        let Some(fg) = ctx.read(path) else {
            return vec![CheckResult::fail(
                "Figure component exists",
                Some(format!("Missing file: {}", path.display())),
            )];
        };
        vec![
            CheckResult::gate(
                IMG_RE.is_match(&fg),
                "Figure: uses passthrough <img>",
                CheckStatus::Fail,
                "No <img> found",
            ),
            CheckResult::gate(
                !IMAGE_SHORTCODE_RE.is_match(&fg),
                "Figure: no async image shortcode logic inside component",
                CheckStatus::Fail,
                "",
            ),
            CheckResult::gate(
                fg.contains("/assets/images/") && fg.contains("FIGURE_ERROR"),
                "Figure: warns if src not under /assets/images/",
                CheckStatus::Warn,
                "",
            ),
        ]
    }
}

pub struct SiteConfigCheck;

impl ContractCheck for SiteConfigCheck {
    fn name(&self) -> &'static str { "site_config" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let Some(cfg) = ctx.read(&ctx.layout.collaborators.site_config) else {
            return vec![CheckResult::warn("Site config missing (skipped)", None)];
        };
        vec![CheckResult::gate(
            !IMAGE_SHORTCODE_RE.is_match(&cfg),
            "Site config: async image shortcode inactive (stabilize baseline)",
            CheckStatus::Warn,
            "",
        )]
    }
}

pub struct StylesheetCheck;

impl ContractCheck for StylesheetCheck {
    fn name(&self) -> &'static str { "stylesheets" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let dir = &ctx.layout.stylesheet_dir;
        if !ctx.root.join(dir).is_dir() {
            return vec![CheckResult::fail(
                "Stylesheet root exists",
                Some(format!("Missing folder: {}", dir.display())),
            )];
        }

        let scope = FallbackScan {
            dirs: vec![dir.clone()],
            extensions: vec!["scss".to_string()],
        };
        let fallbacks: usize = scan_fallbacks(ctx.root, &scope).iter().map(|h| h.count).sum();

        let mut typos = 0;
        for file in walk_files(&ctx.root.join(dir), &scope.extensions) {
            if let Ok(src) = fs::read_to_string(&file) {
                typos += ctx
                    .layout
                    .known_typos
                    .iter()
                    .map(|typo| src.matches(typo.as_str()).count())
                    .sum::<usize>();
            }
        }

        vec![
            CheckResult::gate(
                fallbacks == 0,
                "SCSS: no var(--token, fallback) usage",
                CheckStatus::Fail,
                &format!("Found {fallbacks} fallback usages"),
            ),
            CheckResult::gate(
                typos == 0,
                "SCSS: no known token typos",
                CheckStatus::Fail,
                &format!("Found {typos} token typos"),
            ),
        ]
    }
}

pub struct ContractDocCheck;

impl ContractCheck for ContractDocCheck {
    fn name(&self) -> &'static str { "contract_doc" }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        let path = &ctx.layout.collaborators.contract;
        let Some(doc) = ctx.read(path) else {
            return vec![CheckResult::fail(
                format!("{} exists", path.display()),
                Some(format!("Missing file: {}", path.display())),
            )];
        };
        let mentions_split =
            FIGURE_OPTIMIZED_RE.is_match(&doc) && SRC_FILE_RE.is_match(&doc) && SRC_RE.is_match(&doc);
        vec![CheckResult::gate(
            mentions_split,
            "CONTRACT: image split policy documented (src vs srcFile)",
            CheckStatus::Warn,
            "Could not confirm figure-optimized/srcFile policy text",
        )]
    }
}

/// Runs the fixed battery and aggregates every result
pub struct ContractChecker {
    checks: Vec<Box<dyn ContractCheck>>,
}

impl ContractChecker {
    pub fn new() -> Self {
        Self {
            checks: vec![
                Box::new(ExecutorCheck),
                Box::new(RichtextCheck),
                Box::new(FigureCheck),
                Box::new(SiteConfigCheck),
                Box::new(StylesheetCheck),
                Box::new(ContractDocCheck),
            ],
        }
    }

    pub fn run(&self, ctx: &CheckContext<'_>) -> ContractReport {
        let mut results = Vec::new();
        for check in &self.checks {
            let found = check.run(ctx);
            debug!(check = check.name(), results = found.len(), "check complete");
            results.extend(found);
        }
        ContractReport::new(results)
    }
}

impl Default for ContractChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_one(check: &dyn ContractCheck, files: &[(&str, &str)]) -> Vec<CheckResult> {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let layout = ProjectLayout::default();
        let ctx = CheckContext { root: dir.path(), layout: &layout };
        check.run(&ctx)
    }

    #[test]
    fn test_status_order() {
        let mut s = vec![CheckStatus::Pass, CheckStatus::Fail, CheckStatus::Warn];
        s.sort();
        assert_eq!(s, vec![CheckStatus::Fail, CheckStatus::Warn, CheckStatus::Pass]);
    }

    #[test]
    fn test_missing_executor_fails() {
        let results = run_one(&ExecutorCheck, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(
            results[0].detail.as_deref(),
            Some("Missing file: src/_includes/layouts/content-cell.njk")
        );
    }

    #[test]
    fn test_unguarded_include_fails() {
        let results = run_one(
            &ExecutorCheck,
            &[("src/_includes/layouts/content-cell.njk", "{% set p = item.params or {} %}{% include item.include %}")],
        );
        let failing: Vec<_> = results
            .iter()
            .filter(|r| r.status == CheckStatus::Fail)
            .map(|r| r.label.as_str())
            .collect();
        assert!(failing.contains(&"Executor: no `or {}` param defaults"));
        assert!(failing.contains(&"Executor: include item.include is unguarded (no whitelist detected)"));
        assert!(failing.contains(&"Executor: router invariant markers present"));
    }

    #[test]
    fn test_richtext_default_filter_fails_and_absence_warns() {
        let results = run_one(
            &RichtextCheck,
            &[("src/_includes/components/richtext.njk", "{{ body | default(\"x\") }}")],
        );
        assert_eq!(results[0].status, CheckStatus::Fail);
        let absent = run_one(&RichtextCheck, &[]);
        assert_eq!(absent[0].status, CheckStatus::Warn);
    }

    #[test]
    fn test_stylesheet_fallbacks_and_typos_counted() {
        let results = run_one(
            &StylesheetCheck,
            &[(
                "src/assets/scss/main.scss",
                ".a { margin: var(--spacing-m, 4px); padding: var(--scale--m); }\n.b { color: var(--x, red); }",
            )],
        );
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[0].detail.as_deref(), Some("Found 2 fallback usages"));
        assert_eq!(results[1].detail.as_deref(), Some("Found 1 token typos"));
    }

    #[test]
    fn test_contract_doc_heuristic_warns() {
        let results = run_one(&ContractDocCheck, &[("CONTRACT.md", "# Contract\nnothing here")]);
        assert_eq!(results[0].status, CheckStatus::Warn);
        let ok = run_one(
            &ContractDocCheck,
            &[("CONTRACT.md", "Use figure-optimized with srcFile; plain figure takes src.")],
        );
        assert_eq!(ok[0].status, CheckStatus::Pass);
    }
}
