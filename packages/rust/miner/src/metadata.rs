//! Structural metadata for one mined example.

use std::collections::BTreeSet;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use lexcore_shared::{NodeId, NodeKind, RawTree, SyntaxNode, SyntaxTree};

use crate::tree_miner::expr_docstring;

/// Metadata summarizing one call- or definition-rooted sub-tree.
///
/// The complexity score is always derived from the other fields; a score
/// present in persisted JSON is ignored on load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinedExample {
    pub kind: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub calls: BTreeSet<String>,
    #[serde(default)]
    pub vars: BTreeSet<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub param_count: usize,
    #[serde(default)]
    pub return_kind: String,
    pub depth: usize,
    pub node_count: usize,
    /// Verbatim source JSON of the sub-tree.
    #[serde(default)]
    pub raw_tree: Option<RawTree>,
}

impl MinedExample {
    /// `|calls| + |vars| + |keywords| + param_count + depth`.
    pub fn complexity_score(&self) -> usize {
        self.calls.len() + self.vars.len() + self.keywords.len() + self.param_count + self.depth
    }
}

impl Serialize for MinedExample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.raw_tree.is_some() { 12 } else { 11 };
        let mut s = serializer.serialize_struct("MinedExample", fields)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("doc", &self.doc)?;
        s.serialize_field("calls", &self.calls)?;
        s.serialize_field("vars", &self.vars)?;
        s.serialize_field("keywords", &self.keywords)?;
        s.serialize_field("param_count", &self.param_count)?;
        s.serialize_field("return_kind", &self.return_kind)?;
        s.serialize_field("depth", &self.depth)?;
        s.serialize_field("node_count", &self.node_count)?;
        s.serialize_field("complexity_score", &self.complexity_score())?;
        if let Some(raw) = &self.raw_tree {
            s.serialize_field("raw_tree", raw)?;
        } else {
            s.skip_field("raw_tree")?;
        }
        s.end()
    }
}

/// Walk the sub-tree rooted at `root` and summarize it.
///
/// Depth is 1 at `root` and grows by one per edge. Per node, the first
/// matching rule applies:
///
/// 1. `Call`: string values of direct name/attribute-load children are calls
/// 2. name load/store or `arg`: its string value is a variable
/// 3. `keyword`: its string value is a keyword
/// 4. `arguments`: each direct `arg` child is a parameter
/// 5. `Return`: the kind of its first child becomes the return kind
/// 6. `Expr`: its last long-enough `Str` child becomes the doc
///
/// Rules 5 and 6 overwrite on every hit, so the last one in pre-order wins.
/// With `include_raw`, the root's kept source JSON becomes `raw_tree`.
pub fn extract_metadata(tree: &SyntaxTree, root: NodeId, include_raw: bool) -> MinedExample {
    let mut calls = BTreeSet::new();
    let mut vars = BTreeSet::new();
    let mut keywords = BTreeSet::new();
    let mut doc = String::new();
    let mut param_count = 0;
    let mut return_kind = String::new();
    let mut max_depth = 0;
    let mut node_count = 0;

    let mut stack: Vec<(NodeId, usize)> = vec![(root, 1)];

    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        max_depth = max_depth.max(depth);
        node_count += 1;

        match &node.kind {
            NodeKind::Call => {
                calls.extend(
                    tree.children(id)
                        .map(|(_, child)| child)
                        .filter(|child| child.kind.is_call_target())
                        .filter_map(SyntaxNode::str_value)
                        .map(str::to_string),
                );
            }
            kind if kind.is_binding() => {
                if let Some(name) = node.str_value() {
                    vars.insert(name.to_string());
                }
            }
            NodeKind::Keyword => {
                if let Some(name) = node.str_value() {
                    keywords.insert(name.to_string());
                }
            }
            NodeKind::Arguments => {
                param_count += tree
                    .children(id)
                    .filter(|(_, child)| child.kind == NodeKind::Arg)
                    .count();
            }
            NodeKind::Return => {
                if let Some((_, first)) = tree.children(id).next() {
                    return_kind = first.kind.as_str().to_string();
                }
            }
            NodeKind::Expr => {
                if let Some(text) = expr_docstring(tree, id) {
                    doc = text;
                }
            }
            _ => {}
        }

        stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
    }

    let root_node = tree.node(root);
    MinedExample {
        kind: root_node.kind.as_str().to_string(),
        value: root_node
            .value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        doc,
        calls,
        vars,
        keywords,
        param_count,
        return_kind,
        depth: max_depth,
        node_count,
        raw_tree: if include_raw { root_node.raw.clone() } else { None },
    }
}
