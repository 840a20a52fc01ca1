//! Variable Naming - token path to custom property name
//!
//! Total: every path yields a legal `--name`. Domain rules come first,
//! anything unmatched falls through to the kebab-case fallback.

use crate::tokens::Namespace;

/// Output variable name for a token at `segments` under `namespace`.
pub fn variable_name(namespace: Namespace, segments: &[&str]) -> String {
    match (namespace, segments) {
        // primitives.color.primary.10 -> --color-primary-10
        (Namespace::Primitives, ["color", hue, step]) => {
            format!("--color-{}-{}", sanitize(hue), sanitize(step))
        }
        (Namespace::Primitives, ["scale", "base"]) => "--scale-base".to_string(),
        // primitives.scale.25 -> --scale-25
        (Namespace::Primitives, ["scale", step]) => format!("--scale-{}", sanitize(step)),

        (Namespace::Semantic, ["space", size]) => format!("--spacing-{}", sanitize(size)),
        (Namespace::Semantic, ["radius", size]) => format!("--corner-{}", sanitize(size)),
        (Namespace::Semantic, ["type", "web", "paragraph", "size"]) => "--web---paragraph".to_string(),

        _ => fallback_name(segments),
    }
}

/// `--` + segments joined by `-`, camelCase split to kebab-case, runs of
/// dashes collapsed to `--`.
pub fn fallback_name(segments: &[&str]) -> String {
    let mut raw = String::from("--");
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            raw.push('-');
        }
        raw.push_str(&sanitize(segment));
    }

    let mut kebab = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        if ch.is_ascii_uppercase() {
            kebab.push('-');
            kebab.push(ch.to_ascii_lowercase());
        } else {
            kebab.push(ch);
        }
    }

    let mut out = String::with_capacity(kebab.len());
    let mut dashes = 0;
    for ch in kebab.chars() {
        if ch == '-' {
            dashes += 1;
            if dashes <= 2 {
                out.push(ch);
            }
        } else {
            dashes = 0;
            out.push(ch);
        }
    }

    if out.len() == 2 {
        out.push_str("token");
    }
    out
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
