//! Shared types, error model, and configuration for lexcore.
//!
//! This crate is the foundation depended on by all other lexcore crates.
//! It provides:
//! - [`LexCoreError`] — the unified error type
//! - Domain records ([`CoreUnit`], [`TermClassification`], [`CodeUnit`], [`RunId`])
//! - The syntax-tree input model ([`SyntaxTree`], [`Document`]) and deep-safe
//!   JSON ([`RawTree`])
//! - The token [`normalize`]r
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod normalize;
pub mod raw;
pub mod syntax;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConceptsConfig, DefinitionsConfig, MiningConfig, PathsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{LexCoreError, Result};
pub use normalize::{normalize, normalize_value};
pub use raw::{RawTree, dismantle, from_deep_str};
pub use syntax::{Document, NodeId, NodeKind, Scalar, SyntaxNode, SyntaxTree};
pub use types::{
    CodeUnit, CoreUnit, DefinitionEntry, MAX_DEFINITIONS, MAX_RELATED, PartOfSpeech, RunId,
    SYSTEM_VERSION, TermCategory, TermClassification,
};
