//! Single-pass vocabulary, example, and docstring mining over a document.
//!
//! [`mine_document`] visits every node of a document exactly once, in the
//! pre-order its trees are stored in, and returns an immutable
//! [`MinedDocument`]. [`CorpusMining`] merges those per-document results and
//! mints the run-wide example ids.

use std::collections::{BTreeMap, BTreeSet};

use lexcore_shared::{Document, NodeId, NodeKind, SyntaxNode, SyntaxTree, normalize};

use crate::bank::ExampleBank;
use crate::metadata::{MinedExample, extract_metadata};

/// Docstrings shorter than this (after trimming) are ignored.
pub(crate) const MIN_DOC_CHARS: usize = 10;

/// Everything mined from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinedDocument {
    /// Normalized string values found anywhere in the document.
    pub terms: BTreeSet<String>,
    /// Metadata of call and definition sub-trees, in pre-order.
    pub examples: Vec<MinedExample>,
    /// `(definition name, docstring)` pairs, in pre-order.
    pub docstrings: Vec<(String, String)>,
}

/// Mine one document. `include_raw` keeps each example's source JSON.
pub fn mine_document(document: &Document, include_raw: bool) -> MinedDocument {
    let mut mined = MinedDocument::default();

    for tree in &document.trees {
        for (id, node) in tree.nodes() {
            if let Some(term) = node.str_value().and_then(normalize) {
                mined.terms.insert(term);
            }

            if node.kind.is_minable() {
                mined.examples.push(extract_metadata(tree, id, include_raw));
            }

            if node.kind.is_definition() {
                if let Some((name, doc)) = node.str_value().zip(definition_docstring(tree, id)) {
                    mined.docstrings.push((name.to_string(), doc));
                }
            }
        }
    }

    mined
}

/// Docstring of a definition site: its first statement, when that
/// statement is an `Expr` holding a long-enough string.
///
/// Signature parts (arguments, decorators, bases) are not statements. A
/// `body` wrapper is looked through.
fn definition_docstring(tree: &SyntaxTree, definition: NodeId) -> Option<String> {
    let (first_id, first) = tree
        .children(definition)
        .find(|(_, child)| !child.kind.is_signature())?;
    let statement = if first.kind == NodeKind::Body {
        tree.children(first_id).next()?
    } else {
        (first_id, first)
    };
    (statement.1.kind == NodeKind::Expr)
        .then(|| expr_docstring(tree, statement.0))
        .flatten()
}

/// Last `Str` child of an `Expr` whose trimmed text exceeds [`MIN_DOC_CHARS`].
pub(crate) fn expr_docstring(tree: &SyntaxTree, expr: NodeId) -> Option<String> {
    tree.children(expr)
        .map(|(_, child)| child)
        .filter(|child| child.kind == NodeKind::Str)
        .filter_map(SyntaxNode::str_value)
        .map(str::trim)
        .filter(|text| text.chars().count() > MIN_DOC_CHARS)
        .last()
        .map(str::to_string)
}

/// Accumulated mining results for one run.
#[derive(Debug, Clone, Default)]
pub struct CorpusMining {
    /// Sorted vocabulary.
    pub terms: BTreeSet<String>,
    /// Examples keyed by `E00001`, `E00002`, ... in mining order.
    pub examples: ExampleBank,
    /// Definition name → docstring; later documents overwrite earlier ones.
    pub docstrings: BTreeMap<String, String>,
    /// Number of documents merged.
    pub documents: usize,
}

impl CorpusMining {
    /// Merge one document's results, minting sequential example ids.
    pub fn merge(&mut self, mined: MinedDocument) {
        self.documents += 1;
        self.terms.extend(mined.terms);
        for example in mined.examples {
            let id = example_id(self.examples.len() + 1);
            self.examples.insert(id, example);
        }
        self.docstrings.extend(mined.docstrings);
    }

    /// Docstrings re-keyed by normalized definition name.
    ///
    /// When several names normalize to the same key, the one sorting last wins.
    pub fn docstrings_by_term(&self) -> BTreeMap<String, String> {
        self.docstrings
            .iter()
            .filter_map(|(name, doc)| normalize(name).map(|term| (term, doc.clone())))
            .collect()
    }
}

/// Format the n-th example id (1-based).
pub fn example_id(n: usize) -> String {
    format!("E{n:05}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(&value, false).expect("valid document")
    }

    fn sample() -> Document {
        doc(json!({
            "type": "Module",
            "children": [
                {"type": "FunctionDef", "value": "read_config", "children": [
                    {"type": "arguments", "children": [{"type": "arg", "value": "path"}]},
                    {"type": "Expr", "children": [
                        {"type": "Str", "value": "  Load the configuration file.  "}
                    ]},
                    {"type": "Return", "children": [
                        {"type": "Call", "children": [
                            {"type": "NameLoad", "value": "open"},
                            {"type": "NameLoad", "value": "path"}
                        ]}
                    ]}
                ]},
                {"type": "Num", "value": 42}
            ]
        }))
    }

    #[test]
    fn collects_normalized_terms() {
        let mined = mine_document(&sample(), false);
        let terms: Vec<&str> = mined.terms.iter().map(String::as_str).collect();
        assert_eq!(
            terms,
            ["load the configuration file", "open", "path", "read config"]
        );
    }

    #[test]
    fn collects_calls_and_definitions_in_preorder() {
        let mined = mine_document(&sample(), false);
        let kinds: Vec<&str> = mined.examples.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, ["FunctionDef", "Call"]);
        assert!(mined.examples.iter().all(|e| e.raw_tree.is_none()));
    }

    #[test]
    fn raw_trees_are_kept_on_request() {
        let document = Document::parse_line(
            r#"{"type":"Call","lineno":7,"children":[{"type":"NameLoad","value":"len"}]}"#,
            true,
        )
        .expect("parse");
        let mined = mine_document(&document, true);
        let raw = mined.examples[0].raw_tree.as_ref().expect("raw kept");
        assert_eq!(
            raw.to_json_string(),
            r#"{"type":"Call","lineno":7,"children":[{"type":"NameLoad","value":"len"}]}"#
        );
    }

    #[test]
    fn collects_trimmed_docstring() {
        let mined = mine_document(&sample(), false);
        assert_eq!(
            mined.docstrings,
            [("read_config".to_string(), "Load the configuration file.".to_string())]
        );
    }

    #[test]
    fn short_docstrings_are_ignored() {
        let d = doc(json!({"type": "FunctionDef", "value": "f", "children": [
            {"type": "Expr", "children": [{"type": "Str", "value": "  tiny doc  "}]}
        ]}));
        assert!(mine_document(&d, false).docstrings.is_empty());
    }

    #[test]
    fn only_first_expr_is_a_docstring() {
        let d = doc(json!({"type": "FunctionDef", "value": "f", "children": [
            {"type": "Expr", "children": [{"type": "Call"}]},
            {"type": "Expr", "children": [{"type": "Str", "value": "not the first statement"}]}
        ]}));
        assert!(mine_document(&d, false).docstrings.is_empty());
    }

    #[test]
    fn string_after_another_statement_is_not_a_docstring() {
        let d = doc(json!({"type": "FunctionDef", "value": "f", "children": [
            {"type": "arguments"},
            {"type": "Assign", "children": [{"type": "NameStore", "value": "x"}]},
            {"type": "Expr", "children": [
                {"type": "Str", "value": "a string that is not a docstring"}
            ]}
        ]}));
        assert!(mine_document(&d, false).docstrings.is_empty());
    }

    #[test]
    fn signature_and_body_wrapper_are_looked_through() {
        let d = doc(json!({"type": "ClassDef", "value": "Reader", "children": [
            {"type": "bases", "children": [{"type": "NameLoad", "value": "object"}]},
            {"type": "decorator_list", "children": [{"type": "NameLoad", "value": "final"}]},
            {"type": "body", "children": [
                {"type": "Expr", "children": [{"type": "Str", "value": "Reads rows lazily."}]},
                {"type": "Pass"}
            ]}
        ]}));
        assert_eq!(
            mine_document(&d, false).docstrings,
            [("Reader".to_string(), "Reads rows lazily.".to_string())]
        );
    }

    #[test]
    fn last_qualifying_string_wins() {
        let d = doc(json!({"type": "ClassDef", "value": "Reader", "children": [
            {"type": "Expr", "children": [
                {"type": "Str", "value": "first long docstring"},
                {"type": "Str", "value": "second long docstring"},
                {"type": "Str", "value": "short"}
            ]}
        ]}));
        let mined = mine_document(&d, false);
        assert_eq!(mined.docstrings[0].1, "second long docstring");
    }

    #[test]
    fn merge_mints_sequential_ids_across_documents() {
        let mut corpus = CorpusMining::default();
        corpus.merge(mine_document(&sample(), false));
        corpus.merge(mine_document(&sample(), false));

        let ids: Vec<&str> = corpus.examples.keys().map(String::as_str).collect();
        assert_eq!(ids, ["E00001", "E00002", "E00003", "E00004"]);
        assert_eq!(corpus.examples["E00004"].kind, "Call");
        assert_eq!(corpus.documents, 2);
        assert_eq!(
            corpus.docstrings_by_term().get("read config").map(String::as_str),
            Some("Load the configuration file.")
        );
    }

    #[test]
    fn deep_flat_document_is_mined_without_recursion() {
        let depth = 100_000;
        let mut nodes: Vec<serde_json::Value> = vec![json!({"type": "Call", "children": [1]})];
        nodes.extend((1..depth).map(|i| json!({"type": "Expr", "children": [i + 1]})));
        nodes.push(json!({"type": "NameLoad", "value": "leaf"}));
        let document =
            Document::from_value(&serde_json::Value::Array(nodes), true).expect("parse");

        let mined = mine_document(&document, true);
        assert_eq!(mined.examples.len(), 1);
        let example = &mined.examples[0];
        assert_eq!(example.depth, depth + 1);
        assert_eq!(example.node_count, depth + 1);
        assert!(example.raw_tree.is_some());
        assert!(mined.terms.contains("leaf"));
        drop(mined);
        drop(document);
    }

    #[test]
    fn example_id_padding() {
        assert_eq!(example_id(1), "E00001");
        assert_eq!(example_id(123_456), "E123456");
    }
}
