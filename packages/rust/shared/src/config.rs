//! Application configuration for lexcore.
//!
//! User config lives at `~/.lexcore/lexcore.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LexCoreError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lexcore.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lexcore";

// ---------------------------------------------------------------------------
// Config structs (matching lexcore.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Syntax-tree mining settings.
    #[serde(default)]
    pub mining: MiningConfig,

    /// Concept extraction settings.
    #[serde(default)]
    pub concepts: ConceptsConfig,

    /// Optional external definition provider.
    #[serde(default)]
    pub definitions: DefinitionsConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Line-delimited syntax-tree corpus.
    #[serde(default = "default_corpus")]
    pub corpus: String,

    /// Lexical knowledge base export (JSON).
    #[serde(default = "default_lexicon")]
    pub lexicon: String,

    /// Directory holding `<letter>.json` word shards.
    #[serde(default = "default_word_dir")]
    pub word_dir: String,

    /// Directory receiving JSON exports and the skipped-term log.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// libSQL database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus: default_corpus(),
            lexicon: default_lexicon(),
            word_dir: default_word_dir(),
            output_dir: default_output_dir(),
            db_path: default_db_path(),
        }
    }
}

fn default_corpus() -> String {
    "languages/python/python100k_train.json".into()
}
fn default_lexicon() -> String {
    "lexicon/wordnet.json".into()
}
fn default_word_dir() -> String {
    "brain/lexical_cores".into()
}
fn default_output_dir() -> String {
    "var/lexcore".into()
}
fn default_db_path() -> String {
    "storage/core_units.db".into()
}

/// `[mining]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Keep each example's raw sub-tree in the exported example bank.
    #[serde(default = "default_true")]
    pub include_raw: bool,

    /// Language tag attached to code units.
    #[serde(default = "default_language")]
    pub language: String,

    /// Source tag attached to code units (the corpus name).
    #[serde(default = "default_corpus_tag")]
    pub corpus_tag: String,

    /// Load an existing `example_bank.json` instead of re-deriving metadata.
    #[serde(default)]
    pub reuse_example_bank: bool,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            include_raw: true,
            language: default_language(),
            corpus_tag: default_corpus_tag(),
            reuse_example_bank: false,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "python".into()
}
fn default_corpus_tag() -> String {
    "py150".into()
}

/// `[concepts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptsConfig {
    /// Allow two-word concepts when no priority keyword matches.
    #[serde(default = "default_true")]
    pub compound: bool,
}

impl Default for ConceptsConfig {
    fn default() -> Self {
        Self { compound: true }
    }
}

/// `[definitions]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Whether to call the external provider at all.
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DefinitionsConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse the configured endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint).map_err(|e| {
            LexCoreError::config(format!("invalid definitions endpoint '{}': {e}", self.endpoint))
        })
    }
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_api_key_env() -> String {
    "LEXCORE_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lexcore/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| LexCoreError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lexcore/lexcore.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LexCoreError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LexCoreError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LexCoreError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LexCoreError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LexCoreError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the definition provider's API key env var is set and non-empty.
///
/// Returns the key. Only meaningful when `[definitions] enabled = true`.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.definitions.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LexCoreError::config(format!(
            "definition provider API key not found. Set the {var_name} environment variable \
             or disable [definitions]."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("LEXCORE_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.mining.include_raw);
        assert!(parsed.concepts.compound);
        assert!(!parsed.definitions.enabled);
        assert_eq!(parsed.definitions.timeout_secs, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
word_dir = "/tmp/words"

[mining]
include_raw = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.word_dir, "/tmp/words");
        assert_eq!(config.paths.db_path, "storage/core_units.db");
        assert!(!config.mining.include_raw);
        assert_eq!(config.mining.language, "python");
    }

    #[test]
    fn endpoint_is_validated() {
        let mut defs = DefinitionsConfig::default();
        assert!(defs.endpoint_url().is_ok());
        defs.endpoint = "not a url".into();
        assert!(defs.endpoint_url().is_err());
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.definitions.api_key_env = "LEXCORE_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
