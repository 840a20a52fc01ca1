//! Generated Docs - router map and token snapshot
//!
//! Both documents are derived from repository state and overwritten on
//! every run; `clean` removes the whole generated docs directory.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ProjectLayout;
use crate::error::TokenError;
use crate::tokens::Namespace;

pub const ROUTER_MAP_FILE: &str = "ROUTER_MAP.md";
pub const TOKENS_SNAPSHOT_FILE: &str = "TOKENS_SNAPSHOT.md";

lazy_static! {
    static ref WHITELIST_TARGET_RE: Regex = Regex::new(r#"item\.include\s*==\s*["']([^"']+)["']"#).unwrap();
}

/// Sorted, distinct include targets compared against in the router
pub fn whitelisted_includes(router_src: &str) -> Vec<String> {
    WHITELIST_TARGET_RE
        .captures_iter(router_src)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn render_router_map(router_path: &Path, router_src: Option<&str>) -> String {
    let Some(src) = router_src else {
        return format!(
            "# ROUTER_MAP (generated)\n\nFAIL: missing source file `{}`\n",
            router_path.display()
        );
    };
    let includes = whitelisted_includes(src);
    let listing = if includes.is_empty() {
        "- (none found)".to_string()
    } else {
        includes
            .iter()
            .map(|p| format!("- `{p}`"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "# ROUTER_MAP (generated)\n\nSource: `{}`\n\n## Whitelisted includes\n{listing}\n\n## Notes\n\
         - This file is generated. Edit the router, not this doc.\n\
         - Whitelist is derived from comparisons of `item.include == \"…\"` inside the executor.\n",
        router_path.display()
    )
}

/// `sections` pairs a display path with its contents, `None` when absent.
pub fn render_tokens_snapshot(sections: &[(PathBuf, Option<String>)]) -> String {
    let parts: Vec<String> = sections
        .iter()
        .map(|(path, content)| match content {
            Some(text) => format!("## {}\n\n```scss\n{}\n```", path.display(), text.trim_end()),
            None => format!("## {}\n\nMissing file.", path.display()),
        })
        .collect();
    format!(
        "# TOKENS_SNAPSHOT (generated)\n\nSnapshots of generated token files for diffing.\n\n{}\n",
        parts.join("\n\n")
    )
}

fn write_doc(dir: &Path, name: &str, content: &str) -> Result<PathBuf, TokenError> {
    let path = dir.join(name);
    fs::write(&path, content).map_err(|e| TokenError::io(&path, e))?;
    info!(doc = %path.display(), "wrote");
    Ok(path)
}

/// Write both documents into the report directory.
pub fn generate_docs(root: &Path, layout: &ProjectLayout) -> Result<Vec<PathBuf>, TokenError> {
    let out_dir = root.join(&layout.report_dir);
    fs::create_dir_all(&out_dir).map_err(|e| TokenError::io(&out_dir, e))?;

    let router = &layout.collaborators.executor;
    let router_src = fs::read_to_string(root.join(router)).ok();
    let router_map = render_router_map(router, router_src.as_deref());

    let sections: Vec<_> = Namespace::ALL
        .iter()
        .map(|ns| {
            let rel = layout.generated_path(*ns);
            let content = fs::read_to_string(root.join(&rel)).ok();
            (rel, content)
        })
        .collect();
    let snapshot = render_tokens_snapshot(&sections);

    Ok(vec![
        write_doc(&out_dir, ROUTER_MAP_FILE, &router_map)?,
        write_doc(&out_dir, TOKENS_SNAPSHOT_FILE, &snapshot)?,
    ])
}

/// Remove the generated docs directory; absent is fine.
pub fn clean_docs(root: &Path, layout: &ProjectLayout) -> Result<(), TokenError> {
    let target = root.join(&layout.report_dir);
    match fs::remove_dir_all(&target) {
        Ok(()) => {
            info!(dir = %target.display(), "removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TokenError::io(&target, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelisted_includes_sorted_unique() {
        let src = r#"{% if item.include == "components/richtext.njk" %}
{% elseif item.include == 'components/figure.njk' %}
{% elseif item.include=="components/richtext.njk" %}"#;
        assert_eq!(
            whitelisted_includes(src),
            vec!["components/figure.njk", "components/richtext.njk"]
        );
    }

    #[test]
    fn test_router_map_missing_source() {
        let out = render_router_map(Path::new("router.njk"), None);
        assert!(out.contains("FAIL: missing source file `router.njk`"));
    }

    #[test]
    fn test_router_map_empty_whitelist() {
        let out = render_router_map(Path::new("router.njk"), Some("{% include x %}"));
        assert!(out.contains("## Whitelisted includes\n- (none found)\n"));
    }

    #[test]
    fn test_snapshot_sections() {
        let out = render_tokens_snapshot(&[
            (PathBuf::from("a.scss"), Some(":root {\n}\n".to_string())),
            (PathBuf::from("b.scss"), None),
        ]);
        assert!(out.contains("## a.scss\n\n```scss\n:root {\n}\n```"));
        assert!(out.contains("## b.scss\n\nMissing file."));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::default();
        fs::create_dir_all(dir.path().join(&layout.report_dir)).unwrap();
        clean_docs(dir.path(), &layout).unwrap();
        assert!(!dir.path().join(&layout.report_dir).exists());
        clean_docs(dir.path(), &layout).unwrap();
    }
}
