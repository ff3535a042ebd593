//! Syntax-tree input model.
//!
//! Trees arrive pre-parsed as JSON, either nested
//! (`{"type": "Call", "value": .., "children": [..]}`) or in the flat
//! py150 encoding where `children` holds indices into a node array.
//! Both are rebuilt without recursion into a [`SyntaxTree`]: a pre-order
//! node arena whose children are indices, so no operation on a tree
//! recurses however deep the input is nested.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{LexCoreError, Result};
use crate::raw::RawTree;

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The `type` label of a node. Kinds the miner reacts to are explicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Call,
    FunctionDef,
    AsyncFunctionDef,
    ClassDef,
    NameLoad,
    NameStore,
    AttributeLoad,
    Arg,
    Keyword,
    Arguments,
    Body,
    Return,
    Expr,
    Str,
    /// Any other label, kept verbatim.
    Unrecognized(String),
}

impl NodeKind {
    /// Map a raw `type` label to a kind.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Call" => Self::Call,
            "FunctionDef" => Self::FunctionDef,
            "AsyncFunctionDef" => Self::AsyncFunctionDef,
            "ClassDef" => Self::ClassDef,
            "NameLoad" => Self::NameLoad,
            "NameStore" => Self::NameStore,
            "AttributeLoad" => Self::AttributeLoad,
            "arg" => Self::Arg,
            "keyword" => Self::Keyword,
            "arguments" => Self::Arguments,
            "body" => Self::Body,
            "Return" => Self::Return,
            "Expr" => Self::Expr,
            "Str" => Self::Str,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The raw label as it appears in the input.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Call => "Call",
            Self::FunctionDef => "FunctionDef",
            Self::AsyncFunctionDef => "AsyncFunctionDef",
            Self::ClassDef => "ClassDef",
            Self::NameLoad => "NameLoad",
            Self::NameStore => "NameStore",
            Self::AttributeLoad => "AttributeLoad",
            Self::Arg => "arg",
            Self::Keyword => "keyword",
            Self::Arguments => "arguments",
            Self::Body => "body",
            Self::Return => "Return",
            Self::Expr => "Expr",
            Self::Str => "Str",
            Self::Unrecognized(label) => label,
        }
    }

    /// Function or class definition sites.
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::FunctionDef | Self::AsyncFunctionDef | Self::ClassDef)
    }

    /// Nodes that become mined examples.
    pub fn is_minable(&self) -> bool {
        matches!(self, Self::Call) || self.is_definition()
    }

    /// Name stores, name loads and parameters.
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::NameLoad | Self::NameStore | Self::Arg)
    }

    /// Direct children of a call that name its target.
    pub fn is_call_target(&self) -> bool {
        matches!(self, Self::NameLoad | Self::AttributeLoad)
    }

    /// Parts of a definition header that precede its first statement.
    pub fn is_signature(&self) -> bool {
        match self {
            Self::Arguments => true,
            Self::Unrecognized(label) => matches!(
                label.as_str(),
                "decorator_list" | "bases" | "keywords" | "returns" | "type_params"
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// Optional scalar payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// The payload when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// SyntaxTree
// ---------------------------------------------------------------------------

/// Index of a node inside its [`SyntaxTree`].
pub type NodeId = usize;

/// One node of a pre-parsed syntax tree. Never mutated by the miner.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub value: Option<Scalar>,
    pub children: Vec<NodeId>,
    /// Source JSON of a call or definition node, when raw capture is on.
    pub raw: Option<RawTree>,
}

impl SyntaxNode {
    /// The string payload, if any.
    pub fn str_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(Scalar::as_str)
    }
}

/// An owned tree stored as a pre-order arena. The root is node 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub const ROOT: NodeId = 0;

    pub fn root(&self) -> &SyntaxNode {
        &self.nodes[Self::ROOT]
    }

    /// Node `id`. Ids come from this tree's own nodes.
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    /// Direct children of `id`, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &SyntaxNode)> + '_ {
        self.nodes[id]
            .children
            .iter()
            .map(move |&child| (child, &self.nodes[child]))
    }

    /// Every node in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> + '_ {
        self.nodes.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `node` under `parent`, returning its id.
    fn push(&mut self, node: SyntaxNode, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    /// Rebuild a nested JSON object into a tree.
    ///
    /// With `keep_raw`, call and definition nodes keep a verbatim copy of
    /// their source object.
    pub fn from_json(value: &Value, keep_raw: bool) -> Result<Self> {
        if !value.is_object() {
            return Err(LexCoreError::parse("tree root must be a JSON object"));
        }

        let mut tree = Self { nodes: Vec::new() };
        let mut stack: Vec<(&Value, Option<NodeId>)> = vec![(value, None)];

        while let Some((item, parent)) = stack.pop() {
            match item {
                Value::Object(map) => {
                    let mut node = node_fields(map)?;
                    if keep_raw && node.kind.is_minable() {
                        node.raw = Some(RawTree::copy_of(item));
                    }
                    let id = tree.push(node, parent);
                    for edge in node_edges(map).into_iter().rev() {
                        stack.push((edge, Some(id)));
                    }
                }
                // Lists are transparent: their items hang off the same parent.
                Value::Array(items) => {
                    for child in items.iter().rev() {
                        stack.push((child, parent));
                    }
                }
                _ => {}
            }
        }

        Ok(tree)
    }

    /// Rebuild a flat node array (children are indices) rooted at element 0.
    ///
    /// A kept raw copy is the node's own array element, indices included.
    pub fn from_flat(nodes: &[Value], keep_raw: bool) -> Result<Self> {
        if nodes.is_empty() {
            return Err(LexCoreError::parse("flat tree has no nodes"));
        }

        let mut tree = Self { nodes: Vec::new() };
        let mut visited: HashSet<usize> = HashSet::new();
        let mut stack: Vec<(usize, Option<NodeId>)> = vec![(0, None)];

        while let Some((index, parent)) = stack.pop() {
            if !visited.insert(index) {
                return Err(LexCoreError::parse(format!(
                    "flat tree node {index} is referenced more than once"
                )));
            }
            let item = nodes
                .get(index)
                .filter(|v| v.is_object())
                .ok_or_else(|| {
                    LexCoreError::parse(format!("flat tree index {index} is not a node object"))
                })?;
            let Value::Object(map) = item else {
                continue;
            };

            let mut node = node_fields(map)?;
            if keep_raw && node.kind.is_minable() {
                node.raw = Some(RawTree::copy_of(item));
            }
            let child_indices = flat_children(map, index)?;
            let id = tree.push(node, parent);
            for child in child_indices.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Ok(tree)
    }
}

fn node_fields(map: &Map<String, Value>) -> Result<SyntaxNode> {
    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .map(NodeKind::from_label)
        .ok_or_else(|| LexCoreError::parse("node without a string \"type\" field"))?;
    Ok(SyntaxNode {
        kind,
        value: map.get("value").and_then(Scalar::from_json),
        children: Vec::new(),
        raw: None,
    })
}

/// Outgoing edges of a nested node: `children` first, then every other
/// object- or array-valued field in document order (a non-scalar `value`
/// included).
fn node_edges(map: &Map<String, Value>) -> Vec<&Value> {
    let mut edges: Vec<&Value> = Vec::new();
    if let Some(children) = map.get("children") {
        edges.push(children);
    }
    edges.extend(
        map.iter()
            .filter(|(key, field)| {
                *key != "type" && *key != "children" && (field.is_object() || field.is_array())
            })
            .map(|(_, field)| field),
    );
    edges
}

fn flat_children(map: &Map<String, Value>, index: usize) -> Result<Vec<usize>> {
    match map.get("children") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_u64().map(|i| i as usize).ok_or_else(|| {
                    LexCoreError::parse(format!("flat tree node {index} has a non-index child"))
                })
            })
            .collect(),
        Some(_) => Err(LexCoreError::parse(format!(
            "flat tree node {index} has malformed children"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One corpus document: one or more independent trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub trees: Vec<SyntaxTree>,
}

impl Document {
    /// Parse one line of a line-delimited corpus. Nesting depth is unbounded.
    pub fn parse_line(line: &str, keep_raw: bool) -> Result<Self> {
        let source = RawTree::parse(line.trim())
            .map_err(|e| LexCoreError::parse(format!("invalid JSON: {e}")))?;
        Self::from_value(source.as_value(), keep_raw)
    }

    /// Interpret a parsed JSON document.
    ///
    /// * object: a single nested tree
    /// * array of nodes with integer `children`: the flat encoding
    /// * any other array: a forest of nested trees
    pub fn from_value(value: &Value, keep_raw: bool) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(Self {
                trees: vec![SyntaxTree::from_json(value, keep_raw)?],
            }),
            Value::Array(items) if is_flat_encoding(items) => Ok(Self {
                trees: vec![SyntaxTree::from_flat(items, keep_raw)?],
            }),
            Value::Array(items) => {
                let mut trees = Vec::new();
                let mut stack: Vec<&Value> = items.iter().rev().collect();
                while let Some(item) = stack.pop() {
                    match item {
                        Value::Object(_) => trees.push(SyntaxTree::from_json(item, keep_raw)?),
                        Value::Array(nested) => stack.extend(nested.iter().rev()),
                        _ => {}
                    }
                }
                Ok(Self { trees })
            }
            _ => Err(LexCoreError::parse("document must be a JSON object or array")),
        }
    }
}

/// A flat array has at least one node whose `children` are all integers.
fn is_flat_encoding(items: &[Value]) -> bool {
    items
        .first()
        .is_some_and(|first| first.get("type").is_some())
        && items.iter().filter_map(Value::as_object).any(|node| {
            node.get("children")
                .and_then(Value::as_array)
                .is_some_and(|c| !c.is_empty() && c.iter().all(Value::is_u64))
        })
}
