//! Core pipeline orchestration and domain logic for lexcore.
//!
//! This crate ties the miner, the lexical base and storage together into
//! end-to-end runs ([`build_word_shards`], [`mine_corpus`]), and owns the
//! term-level heuristics: classification, example matching and string
//! similarity.

pub mod classifier;
pub mod context;
pub mod definitions;
pub mod export;
pub mod matcher;
pub mod pipeline;
pub mod similarity;

pub use classifier::{TermClassifier, classify, concept_code};
pub use context::RunContext;
pub use definitions::{
    ChatDefinitions, DefinitionProvider, NoDefinitions, define_cached, define_or_empty,
    prompt_hash,
};
pub use export::{ExportPaths, write_json, write_skipped};
pub use matcher::{MAX_MATCHES, SIMILARITY_THRESHOLD, match_examples};
pub use pipeline::{
    BuildConfig, MineConfig, ProgressReporter, RunSummary, SilentProgress, build_word_shards,
    mine_corpus,
};
pub use similarity::similarity_ratio;
