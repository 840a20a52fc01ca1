//! Build and Prune Invariant Tests
//!
//! End-to-end runs against temporary project trees.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokenforge_core::{
    prune::Coverage, scanner::find_fallbacks, LegacyPruner, Namespace, ProjectLayout, PrunePolicy,
    TokenError, TokenPipeline,
};

fn project(tokens: &Value) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("tokens")).unwrap();
    fs::write(
        dir.path().join("tokens/tokens.json"),
        serde_json::to_string_pretty(tokens).unwrap(),
    )
    .unwrap();
    dir
}

fn build(dir: &Path) -> Result<tokenforge_core::BuildSummary, TokenError> {
    TokenPipeline::new(dir, ProjectLayout::default()).build()
}

fn generated(dir: &Path, namespace: Namespace) -> String {
    fs::read_to_string(dir.join(ProjectLayout::default().generated_path(namespace))).unwrap()
}

fn sample_tokens() -> Value {
    json!({
        "primitives": {
            "scale": {"base": {"$value": "16"}, "25": {"$value": "4"}},
            "color": {"primary": {"10": {"$value": "#001133"}}}
        },
        "semantic": {
            "space": {"m": {"$value": "{scale.base}"}, "l": {"$value": "{scale.base} * 2"}},
            "radius": {"s": {"$value": "{primitives.scale.25}"}},
            "font": {"body": {"$value": "\"Georgia\", serif"}}
        },
        "component": {
            "button": {"paddingX": {"$value": "{space.m}"}}
        }
    })
}

#[test]
fn invariant_end_to_end_minimal_document() {
    let doc: Value = serde_json::from_str(
        r#"{"primitives":{"scale":{"base":{"value":"16"}}},"semantic":{"space":{"m":{"value":"{scale.base}"}}},"component":{}}"#,
    )
    .unwrap();
    let dir = project(&doc);
    build(dir.path()).unwrap();

    assert!(generated(dir.path(), Namespace::Primitives).contains("\n  --scale-base: 16px;\n"));
    assert!(generated(dir.path(), Namespace::Semantic).contains("\n  --spacing-m: var(--scale-base);\n"));
    assert!(generated(dir.path(), Namespace::Component).ends_with(":root {\n}\n"));
}

#[test]
fn invariant_build_is_deterministic() {
    let dir = project(&sample_tokens());
    let first = build(dir.path()).unwrap();
    let bytes: Vec<_> = Namespace::ALL.iter().map(|ns| generated(dir.path(), *ns)).collect();

    let second = build(dir.path()).unwrap();
    let again: Vec<_> = Namespace::ALL.iter().map(|ns| generated(dir.path(), *ns)).collect();

    assert_eq!(bytes, again);
    assert_eq!(first.source_digest, second.source_digest);
    let d1: Vec<_> = first.files.iter().map(|f| f.digest.clone()).collect();
    let d2: Vec<_> = second.files.iter().map(|f| f.digest.clone()).collect();
    assert_eq!(d1, d2);
}

#[test]
fn invariant_declarations_sorted_and_unique() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    for ns in Namespace::ALL {
        let text = generated(dir.path(), ns);
        let names: Vec<_> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix("--").map(|rest| rest.split(':').next().unwrap().to_string()))
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted, "{ns} must be sorted and unique");
    }
}

#[test]
fn invariant_value_compilation_rules() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    let semantic = generated(dir.path(), Namespace::Semantic);
    assert!(semantic.contains("  --spacing-l: calc(var(--scale-base) * 2);\n"));
    assert!(semantic.contains("  --corner-s: var(--scale-25);\n"));
    assert!(semantic.contains("  --font-body: \"Georgia\", serif;\n"));
    let component = generated(dir.path(), Namespace::Component);
    assert!(component.contains("  --button-padding-x: var(--spacing-m);\n"));
}

#[test]
fn invariant_qualified_and_unqualified_references_agree() {
    let unq = project(&json!({
        "primitives": {},
        "semantic": {"space": {"m": {"$value": "8"}}},
        "component": {"card": {"gap": {"$value": "{space.m}"}}}
    }));
    let qual = project(&json!({
        "primitives": {},
        "semantic": {"space": {"m": {"$value": "8"}}},
        "component": {"card": {"gap": {"$value": "{semantic.space.m}"}}}
    }));
    build(unq.path()).unwrap();
    build(qual.path()).unwrap();
    assert_eq!(
        generated(unq.path(), Namespace::Component),
        generated(qual.path(), Namespace::Component)
    );
}

#[test]
fn invariant_duplicate_aborts_without_writing() {
    let dir = project(&json!({
        "primitives": {"scale": {"base": {"$value": "16"}}},
        "semantic": {"space": {"m": {"$value": "4"}}, "spacing": {"m": {"$value": "8"}}},
        "component": {}
    }));
    let err = build(dir.path()).unwrap_err();
    assert!(matches!(err, TokenError::DuplicateVariable { .. }));
    let message = err.to_string();
    assert!(message.contains("semantic.space.m => 4px"));
    assert!(message.contains("semantic.spacing.m => 8px"));

    let layout = ProjectLayout::default();
    for ns in Namespace::ALL {
        assert!(!dir.path().join(layout.generated_path(ns)).exists());
    }
}

#[test]
fn invariant_unresolved_reference_aborts() {
    let dir = project(&json!({
        "primitives": {},
        "semantic": {"space": {"m": {"$value": "{scale.missing}"}}},
        "component": {}
    }));
    let err = build(dir.path()).unwrap_err();
    assert_eq!(err.to_string(), "Unresolved reference: {scale.missing} (in semantic.space.m)");
    assert!(!dir.path().join(ProjectLayout::default().generated_path(Namespace::Primitives)).exists());
}

#[test]
fn invariant_doubled_braces_do_not_resolve() {
    let dir = project(&json!({
        "primitives": {"scale": {"base": {"$value": "16"}}},
        "semantic": {"space": {"m": {"$value": "{{scale.base}}"}}},
        "component": {}
    }));
    let err = build(dir.path()).unwrap_err();
    assert!(matches!(err, TokenError::UnresolvedReference { .. }));
    assert!(!dir.path().join(ProjectLayout::default().generated_path(Namespace::Semantic)).exists());
}

#[test]
fn invariant_failed_build_keeps_previous_outputs() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    let before = generated(dir.path(), Namespace::Primitives);

    fs::write(
        dir.path().join("tokens/tokens.json"),
        r#"{"primitives": {"a": {"$value": "1"}}, "semantic": {"x": {"$value": "{nope}"}}, "component": {}}"#,
    )
    .unwrap();
    assert!(build(dir.path()).is_err());
    assert_eq!(generated(dir.path(), Namespace::Primitives), before);
}

#[test]
fn invariant_emitter_output_has_no_fallbacks() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    for ns in Namespace::ALL {
        assert!(find_fallbacks(&generated(dir.path(), ns)).is_empty());
    }
    assert_eq!(find_fallbacks(".x { margin: var(--spacing-m, 8px); }").len(), 1);
}

fn write_legacy(dir: &Path, text: &str) {
    fs::write(dir.join(ProjectLayout::default().legacy_path()), text).unwrap();
}

const LEGACY: &str = "/* legacy */\n:root {\n  --scale-base: 16px;\n  --spacing-m: var(--scale-base);\n  --scale-25: 5px;\n  --brand-accent: #f0a;\n}\n";

#[test]
fn invariant_prune_report_only_is_non_destructive() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    write_legacy(dir.path(), LEGACY);

    let report = LegacyPruner::new(dir.path(), &ProjectLayout::default())
        .run(PrunePolicy::default())
        .unwrap();

    assert!(report.written.is_none());
    let c = &report.classification;
    assert_eq!(c.coverage("--scale-base"), Some(Coverage::Covered));
    assert_eq!(c.coverage("--spacing-m"), Some(Coverage::Covered));
    assert_eq!(c.coverage("--scale-25"), Some(Coverage::Conflict));
    assert_eq!(c.coverage("--brand-accent"), Some(Coverage::Missing));
    assert!(report.render().contains("DRY RUN only."));

    let legacy_path = dir.path().join(ProjectLayout::default().legacy_path());
    assert_eq!(fs::read_to_string(legacy_path).unwrap(), LEGACY);
    let pruned = dir.path().join("src/assets/scss/_tokens--legacy.pruned.scss");
    assert!(!pruned.exists());
}

#[test]
fn invariant_prune_new_file_keeps_conflicts() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    write_legacy(dir.path(), LEGACY);

    let report = LegacyPruner::new(dir.path(), &ProjectLayout::default())
        .run(PrunePolicy::NewFile)
        .unwrap();
    let written = report.written.unwrap();
    assert_eq!(written, Path::new("src/assets/scss/_tokens--legacy.pruned.scss"));

    let pruned = fs::read_to_string(dir.path().join(&written)).unwrap();
    assert_eq!(pruned, "/* legacy */\n:root {\n  --scale-25: 5px;\n  --brand-accent: #f0a;\n}\n");

    let legacy_path = dir.path().join(ProjectLayout::default().legacy_path());
    assert_eq!(fs::read_to_string(legacy_path).unwrap(), LEGACY);
}

#[test]
fn invariant_prune_in_place() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    write_legacy(dir.path(), LEGACY);

    let report = LegacyPruner::new(dir.path(), &ProjectLayout::default())
        .run(PrunePolicy::InPlace)
        .unwrap();
    assert_eq!(report.written.as_deref(), Some(ProjectLayout::default().legacy_path().as_path()));

    let legacy = fs::read_to_string(dir.path().join(ProjectLayout::default().legacy_path())).unwrap();
    assert!(legacy.contains("--scale-25: 5px;"));
    assert!(!legacy.contains("--scale-base"));
}

#[test]
fn invariant_prune_in_place_keeps_theme_override() {
    let dir = project(&sample_tokens());
    build(dir.path()).unwrap();
    let legacy_text = ":root {\n  --scale-base: 16px;\n}\n[data-theme=dark] {\n  --scale-base: 18px;\n}\n";
    write_legacy(dir.path(), legacy_text);

    let report = LegacyPruner::new(dir.path(), &ProjectLayout::default())
        .run(PrunePolicy::InPlace)
        .unwrap();
    assert_eq!(report.classification.coverage("--scale-base"), Some(Coverage::Conflict));

    let legacy = fs::read_to_string(dir.path().join(ProjectLayout::default().legacy_path())).unwrap();
    assert_eq!(legacy, legacy_text);
}
