//! Syntax-tree mining for lexcore.
//!
//! Turns a line-delimited corpus of pre-parsed syntax trees into a sorted
//! vocabulary, an ordered bank of call/definition examples with structural
//! metadata, and a map of definition names to their docstrings.

pub mod bank;
pub mod corpus;
pub mod metadata;
pub mod tree_miner;

pub use bank::{ExampleBank, load_example_bank};
pub use corpus::{CorpusLine, CorpusReader, CorpusScan, MalformedInput, scan_corpus, source_label};
pub use metadata::{MinedExample, extract_metadata};
pub use tree_miner::{CorpusMining, MinedDocument, example_id, mine_document};
