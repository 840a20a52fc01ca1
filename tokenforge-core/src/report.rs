//! Compliance Report - aggregated contract results
//!
//! Results are sorted FAIL, WARN, PASS (stable within a status). The run
//! fails iff any FAIL is present.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::contracts::{CheckResult, CheckStatus};
use crate::error::TokenError;

pub const REPORT_FILE: &str = "REPORT.md";

const GATE_TEXT: [&str; 2] = [
    "This report is generated from repository state.",
    "If any FAIL appears, code must be reconciled with CONTRACT.md before proceeding.",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub fail: usize,
    pub warn: usize,
    pub pass: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

impl ContractReport {
    pub fn new(mut results: Vec<CheckResult>) -> Self {
        results.sort_by_key(|r| r.status);
        Self {
            generated_at: Utc::now(),
            results,
        }
    }

    pub fn summary(&self) -> Summary {
        let count = |status: CheckStatus| self.results.iter().filter(|r| r.status == status).count();
        Summary {
            fail: count(CheckStatus::Fail),
            warn: count(CheckStatus::Warn),
            pass: count(CheckStatus::Pass),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status == CheckStatus::Fail)
    }

    pub fn render_markdown(&self) -> String {
        let summary = self.summary();
        let mut lines: Vec<String> = GATE_TEXT.iter().map(|s| s.to_string()).collect();
        lines.push(String::new());
        lines.push("# Stabilization Report (Generated)".to_string());
        lines.push(format!(
            "Generated on: {}",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        lines.push(String::new());
        lines.push("## Summary".to_string());
        lines.push(format!("- FAIL: {}", summary.fail));
        lines.push(format!("- WARN: {}", summary.warn));
        lines.push(format!("- PASS: {}", summary.pass));
        lines.push(String::new());
        lines.push("## Checks".to_string());
        for r in &self.results {
            match &r.detail {
                Some(detail) => lines.push(format!("- [{}] {} — {}", r.status, r.label, detail)),
                None => lines.push(format!("- [{}] {}", r.status, r.label)),
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write `REPORT.md` under `report_dir`, creating it as needed.
    pub fn write(&self, root: &Path, report_dir: &Path) -> Result<PathBuf, TokenError> {
        let dir = root.join(report_dir);
        fs::create_dir_all(&dir).map_err(|e| TokenError::io(&dir, e))?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.render_markdown()).map_err(|e| TokenError::io(&path, e))?;
        let summary = self.summary();
        info!(
            report = %path.display(),
            fail = summary.fail,
            warn = summary.warn,
            pass = summary.pass,
            "wrote contract report"
        );
        Ok(report_dir.join(REPORT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ContractReport {
        ContractReport::new(vec![
            CheckResult::pass("a"),
            CheckResult::warn("b", None),
            CheckResult::fail("c", Some("broken".into())),
            CheckResult::pass("d"),
            CheckResult::fail("e", None),
        ])
    }

    #[test]
    fn test_sorted_fail_first_and_stable() {
        let labels: Vec<_> = report().results.iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["c", "e", "b", "a", "d"]);
    }

    #[test]
    fn test_summary_and_gate() {
        let r = report();
        assert_eq!(r.summary(), Summary { fail: 2, warn: 1, pass: 2 });
        assert!(r.has_failures());
        assert!(!ContractReport::new(vec![CheckResult::warn("w", None)]).has_failures());
    }

    #[test]
    fn test_markdown_lines() {
        let md = report().render_markdown();
        assert!(md.starts_with("This report is generated from repository state.\n"));
        assert!(md.contains("## Summary\n- FAIL: 2\n- WARN: 1\n- PASS: 2\n"));
        assert!(md.contains("- [FAIL] c — broken\n- [FAIL] e\n- [WARN] b\n"));
        assert!(md.ends_with("- [PASS] d\n"));
    }
}
