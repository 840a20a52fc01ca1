//! Token Graph - the parsed token document
//!
//! Three ordered namespaces, each a tree of groups and leaves. A leaf is any
//! object carrying `$value` (or an unprefixed, non-object `value`). The graph
//! lives for one invocation and is passed explicitly through resolution and
//! compilation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Primitives,
    Semantic,
    Component,
}

impl Namespace {
    /// Resolution priority for unqualified references
    pub const ALL: [Namespace; 3] = [Namespace::Primitives, Namespace::Semantic, Namespace::Component];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Primitives => "primitives",
            Namespace::Semantic => "semantic",
            Namespace::Component => "component",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw leaf value as written in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    /// String values go through reference substitution and compilation
    Text(String),
    /// Numbers and booleans, emitted verbatim
    Scalar(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLeaf {
    pub value: TokenValue,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenNode {
    Leaf(TokenLeaf),
    Group(BTreeMap<String, TokenNode>),
}

/// A leaf together with its location in the graph
#[derive(Debug, Clone)]
pub struct TokenEntry<'a> {
    pub namespace: Namespace,
    /// Segments below the namespace root
    pub segments: Vec<&'a str>,
    pub leaf: &'a TokenLeaf,
}

impl TokenEntry<'_> {
    /// Fully qualified dotted path, e.g. `primitives.scale.base`
    pub fn source_path(&self) -> String {
        qualified_path(self.namespace, &self.segments)
    }
}

pub fn qualified_path(namespace: Namespace, segments: &[&str]) -> String {
    let mut path = namespace.as_str().to_string();
    for segment in segments {
        path.push('.');
        path.push_str(segment);
    }
    path
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenGraph {
    roots: BTreeMap<Namespace, BTreeMap<String, TokenNode>>,
}

impl TokenGraph {
    pub fn from_json_str(content: &str) -> Result<Self, TokenError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    pub fn from_value(document: &Value) -> Result<Self, TokenError> {
        let top = document
            .as_object()
            .ok_or_else(|| TokenError::InvalidDocument("top level must be an object".into()))?;

        for key in top.keys() {
            if !key.starts_with('$') && Namespace::from_name(key).is_none() {
                return Err(TokenError::InvalidDocument(format!(
                    "unknown top-level key \"{key}\" (expected primitives, semantic, component)"
                )));
            }
        }

        let mut roots = BTreeMap::new();
        for namespace in Namespace::ALL {
            let node = top.get(namespace.as_str()).ok_or_else(|| {
                TokenError::InvalidDocument(format!("missing namespace \"{namespace}\""))
            })?;
            let children = match node.as_object() {
                Some(map) => parse_children(map, namespace.as_str())?,
                None => {
                    return Err(TokenError::InvalidDocument(format!(
                        "namespace \"{namespace}\" must be an object"
                    )))
                }
            };
            roots.insert(namespace, children);
        }

        Ok(Self { roots })
    }

    /// Node at `segments` below the namespace root
    pub fn get(&self, namespace: Namespace, segments: &[&str]) -> Option<&TokenNode> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.roots.get(&namespace)?.get(*first)?;
        for segment in rest {
            match node {
                TokenNode::Group(children) => node = children.get(*segment)?,
                TokenNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    pub fn leaf(&self, namespace: Namespace, segments: &[&str]) -> Option<&TokenLeaf> {
        match self.get(namespace, segments)? {
            TokenNode::Leaf(leaf) => Some(leaf),
            TokenNode::Group(_) => None,
        }
    }

    /// All leaves of one namespace, depth-first in key order
    pub fn entries(&self, namespace: Namespace) -> Vec<TokenEntry<'_>> {
        let mut out = Vec::new();
        if let Some(children) = self.roots.get(&namespace) {
            collect_entries(namespace, children, &mut Vec::new(), &mut out);
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        Namespace::ALL.iter().map(|ns| self.entries(*ns).len()).sum()
    }
}

fn parse_children(
    map: &serde_json::Map<String, Value>,
    path: &str,
) -> Result<BTreeMap<String, TokenNode>, TokenError> {
    let mut children = BTreeMap::new();
    for (key, value) in map {
        if key.starts_with('$') {
            continue;
        }
        let child_path = format!("{path}.{key}");
        if let Some(obj) = value.as_object() {
            let node = if let Some(raw) = leaf_value(obj) {
                TokenNode::Leaf(TokenLeaf {
                    value: parse_value(raw, &child_path)?,
                    kind: obj
                        .get("$type")
                        .or_else(|| obj.get("type"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            } else {
                TokenNode::Group(parse_children(obj, &child_path)?)
            };
            children.insert(key.clone(), node);
        }
    }
    Ok(children)
}

/// `$value`, or a non-object `value` for documents without the `$` prefix
fn leaf_value(obj: &serde_json::Map<String, Value>) -> Option<&Value> {
    obj.get("$value")
        .or_else(|| obj.get("value").filter(|v| !v.is_object()))
}

fn parse_value(raw: &Value, path: &str) -> Result<TokenValue, TokenError> {
    match raw {
        Value::String(s) => Ok(TokenValue::Text(s.clone())),
        Value::Number(n) => Ok(TokenValue::Scalar(n.to_string())),
        Value::Bool(b) => Ok(TokenValue::Scalar(b.to_string())),
        _ => Err(TokenError::UnsupportedValue { path: path.to_string() }),
    }
}

fn collect_entries<'a>(
    namespace: Namespace,
    children: &'a BTreeMap<String, TokenNode>,
    prefix: &mut Vec<&'a str>,
    out: &mut Vec<TokenEntry<'a>>,
) {
    for (key, node) in children {
        prefix.push(key.as_str());
        match node {
            TokenNode::Leaf(leaf) => out.push(TokenEntry {
                namespace,
                segments: prefix.clone(),
                leaf,
            }),
            TokenNode::Group(grandchildren) => collect_entries(namespace, grandchildren, prefix, out),
        }
        prefix.pop();
    }
}
