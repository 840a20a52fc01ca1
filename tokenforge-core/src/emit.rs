//! Emission - collision guard and stylesheet rendering
//!
//! Variables are sorted by name (byte order, locale independent) and
//! rendered into a single `:root` block under a fixed header.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::TokenError;
use crate::tokens::Namespace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVariable {
    pub name: String,
    pub value: String,
    pub source_path: String,
}

struct Header {
    title: &'static str,
    subtitle: &'static str,
}

fn header(namespace: Namespace) -> Header {
    match namespace {
        Namespace::Primitives => Header {
            title: "Primitives (a.k.a. Base / Core / Foundations)",
            subtitle: "Raw values. No meaning. No intent.",
        },
        Namespace::Semantic => Header {
            title: "Semantic assignments (a.k.a. Alias / System)",
            subtitle: "Intent-based usage tokens.",
        },
        Namespace::Component => Header {
            title: "Component assignments",
            subtitle: "Component-specific usage tokens.",
        },
    }
}

/// Fail on the first output name that occurs twice within one namespace.
pub fn assert_unique(namespace: Namespace, vars: &[ResolvedVariable]) -> Result<(), TokenError> {
    let mut seen: HashMap<&str, &ResolvedVariable> = HashMap::new();
    for var in vars {
        if let Some(prev) = seen.insert(var.name.as_str(), var) {
            return Err(TokenError::DuplicateVariable {
                namespace,
                name: var.name.clone(),
                first_path: prev.source_path.clone(),
                first_value: prev.value.clone(),
                second_path: var.source_path.clone(),
                second_value: var.value.clone(),
            });
        }
    }
    Ok(())
}

pub fn sort_variables(vars: &mut [ResolvedVariable]) {
    vars.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.source_path.cmp(&b.source_path)));
}

/// Render one namespace file. `vars` must already be sorted and unique.
pub fn render_stylesheet(
    namespace: Namespace,
    file_label: &str,
    source_label: &str,
    vars: &[ResolvedVariable],
) -> String {
    let header = header(namespace);
    let mut lines = vec![
        "/* ----------------------------------".to_string(),
        format!(" * {file_label}"),
        format!(" * {}", header.title),
        format!(" * {}", header.subtitle),
        " *".to_string(),
        " * This file is AUTO-GENERATED from".to_string(),
        format!(" * {source_label}."),
        " * DO NOT edit this file directly.".to_string(),
        " * ----------------------------------*/".to_string(),
        String::new(),
        ":root {".to_string(),
    ];
    for var in vars {
        lines.push(format!("  {}: {};", var.name, var.value));
    }
    lines.push("}".to_string());
    lines.push(String::new());
    lines.join("\n")
}
