//! Reference Resolution
//!
//! `{path}` resolves directly when `path` starts with a namespace name,
//! otherwise the namespaces are searched in priority order
//! (primitives, semantic, component) and the first leaf wins.
//!
//! A reference compiles to a lookup of the target's variable, never to the
//! target's value, so chains become chains of lookups. Cycles are rejected.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::error::TokenError;
use crate::naming::variable_name;
use crate::tokens::{qualified_path, Namespace, TokenGraph, TokenValue};

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"\{[^}]+\}").unwrap();
}

/// Every `{...}` reference in `value`, braces included
pub fn references(value: &str) -> Vec<&str> {
    REFERENCE_RE.find_iter(value).map(|m| m.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub namespace: Namespace,
    pub segments: Vec<String>,
}

impl ResolvedRef {
    pub fn qualified(&self) -> String {
        qualified_path(self.namespace, &self.segment_strs())
    }

    pub fn variable_name(&self) -> String {
        variable_name(self.namespace, &self.segment_strs())
    }

    /// `var(--name)`
    pub fn lookup(&self) -> String {
        format!("var({})", self.variable_name())
    }

    fn segment_strs(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }
}

pub struct Resolver<'g> {
    graph: &'g TokenGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g TokenGraph) -> Self {
        Self { graph }
    }

    /// Resolve one reference, with or without its braces.
    ///
    /// `context` names the token being compiled and ends up in the error.
    pub fn resolve(&self, reference: &str, context: &str) -> Result<ResolvedRef, TokenError> {
        let unresolved = || TokenError::UnresolvedReference {
            reference: reference.to_string(),
            context: context.to_string(),
        };
        let trimmed = reference.trim();
        let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
        let clean = inner.strip_suffix('}').unwrap_or(inner).trim();
        if clean.contains(['{', '}']) {
            return Err(unresolved());
        }
        let segments: Vec<&str> = clean.split('.').collect();

        let candidates: Vec<(Namespace, &[&str])> = match segments.split_first() {
            Some((first, rest)) if !rest.is_empty() => match Namespace::from_name(first) {
                Some(ns) => vec![(ns, rest)],
                None => Namespace::ALL.iter().map(|ns| (*ns, segments.as_slice())).collect(),
            },
            _ => Namespace::ALL.iter().map(|ns| (*ns, segments.as_slice())).collect(),
        };

        for (namespace, path) in candidates {
            if self.graph.leaf(namespace, path).is_some() {
                return Ok(ResolvedRef {
                    namespace,
                    segments: path.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        Err(unresolved())
    }

    /// Replace every embedded reference in `value` with its variable lookup.
    pub fn substitute(&self, value: &str, context: &str) -> Result<String, TokenError> {
        let mut out = String::with_capacity(value.len() + 16);
        let mut last = 0;
        for m in REFERENCE_RE.find_iter(value) {
            out.push_str(&value[last..m.start()]);
            out.push_str(&self.resolve(m.as_str(), context)?.lookup());
            last = m.end();
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    /// Walk the reference graph and reject any cycle, self-references included.
    pub fn check_cycles(&self) -> Result<(), TokenError> {
        let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for namespace in Namespace::ALL {
            for entry in self.graph.entries(namespace) {
                let source = entry.source_path();
                let mut targets = Vec::new();
                if let TokenValue::Text(text) = &entry.leaf.value {
                    for reference in references(text) {
                        targets.push(self.resolve(reference, &source)?.qualified());
                    }
                }
                edges.insert(source, targets);
            }
        }

        let mut state = HashMap::new();
        let mut stack = Vec::new();
        for node in edges.keys() {
            visit(node, &edges, &mut state, &mut stack)?;
        }
        Ok(())
    }
}

enum Visit {
    InProgress,
    Done,
}

fn visit<'a>(
    node: &'a str,
    edges: &'a BTreeMap<String, Vec<String>>,
    state: &mut HashMap<&'a str, Visit>,
    stack: &mut Vec<&'a str>,
) -> Result<(), TokenError> {
    match state.get(node) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = stack.iter().position(|n| *n == node).unwrap_or(0);
            let mut chain: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
            chain.push(node.to_string());
            return Err(TokenError::ReferenceCycle { chain });
        }
        None => {}
    }

    state.insert(node, Visit::InProgress);
    stack.push(node);
    if let Some(targets) = edges.get(node) {
        for target in targets {
            visit(target, edges, state, stack)?;
        }
    }
    stack.pop();
    state.insert(node, Visit::Done);
    Ok(())
}
