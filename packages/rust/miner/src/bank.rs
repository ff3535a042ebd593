//! The example bank: mined examples keyed by id, in mining order.

use std::path::Path;

use indexmap::IndexMap;
use tracing::info;

use lexcore_shared::{LexCoreError, Result, from_deep_str};

use crate::metadata::MinedExample;

/// Example id → metadata, iterated in the order examples were mined.
pub type ExampleBank = IndexMap<String, MinedExample>;

/// Load a previously exported bank. Key order is preserved and raw trees
/// may be nested to any depth.
pub fn load_example_bank(path: &Path) -> Result<ExampleBank> {
    let content = std::fs::read_to_string(path).map_err(|e| LexCoreError::io(path, e))?;
    let bank: ExampleBank = from_deep_str(&content).map_err(|e| {
        LexCoreError::parse(format!("invalid example bank {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), examples = bank.len(), "example bank loaded");
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_miner::mine_document;
    use lexcore_shared::Document;
    use serde_json::json;

    fn call(name: &str) -> MinedExample {
        let line = json!({"type": "Call", "lineno": 1, "children": [
            {"type": "NameLoad", "value": name}
        ]})
        .to_string();
        let document = Document::parse_line(&line, true).expect("valid tree");
        mine_document(&document, true).examples.remove(0)
    }

    fn bank() -> ExampleBank {
        IndexMap::from([
            ("E00002".to_string(), call("write")),
            ("E00001".to_string(), call("read")),
        ])
    }

    fn temp_bank(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "lexcore_bank_{}.json",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&path, contents).expect("write bank");
        path
    }

    #[test]
    fn reload_preserves_order_and_recomputes_score() {
        let bank = bank();
        let mut value = serde_json::to_value(&bank).expect("serialize");
        value["E00001"]["complexity_score"] = json!(-7);
        let path = temp_bank(&serde_json::to_string_pretty(&value).expect("render"));

        let loaded = load_example_bank(&path).expect("load");
        assert_eq!(loaded, bank);
        let ids: Vec<&str> = loaded.keys().map(String::as_str).collect();
        assert_eq!(ids, ["E00002", "E00001"]);
        assert_eq!(loaded["E00001"].complexity_score(), 2 + 2);
        assert_eq!(
            loaded["E00001"].raw_tree.as_ref().map(|r| r.as_value()["lineno"].clone()),
            Some(json!(1))
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn deeply_nested_raw_tree_reloads() {
        let depth = 2_000;
        let mut line = String::from(r#"{"type":"Call","children":["#);
        for _ in 0..depth {
            line.push_str(r#"{"type":"Expr","children":["#);
        }
        line.push_str(r#"{"type":"NameLoad","value":"leaf"}"#);
        for _ in 0..depth {
            line.push_str("]}");
        }
        line.push_str("]}");
        let document = Document::parse_line(&line, true).expect("parse");
        let example = mine_document(&document, true).examples.remove(0);
        let bank = ExampleBank::from([("E00001".to_string(), example)]);
        let path = temp_bank(&serde_json::to_string(&bank).expect("serialize"));

        let loaded = load_example_bank(&path).expect("load");
        assert_eq!(loaded, bank);
        assert_eq!(loaded["E00001"].depth, depth + 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_bank_is_a_parse_error() {
        let path = temp_bank("[1, 2");
        let err = load_example_bank(&path).unwrap_err();
        assert!(matches!(err, LexCoreError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }
}
