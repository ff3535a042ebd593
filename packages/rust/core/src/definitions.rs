//! Optional external definition provider.
//!
//! A [`DefinitionProvider`] turns a code term into a short free-text
//! definition. Providers may fail or hang; [`define_or_empty`] bounds every
//! call with a timeout and falls back to an empty string, and
//! [`define_cached`] memoizes non-empty answers in storage keyed by a
//! prompt hash so reruns never repeat a request.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use lexcore_shared::{DefinitionsConfig, LexCoreError, Result};
use lexcore_storage::Storage;

/// Instruction sent ahead of every term.
pub const SYSTEM_PROMPT: &str = "Explain this programming term briefly and clearly.";

const USER_AGENT: &str = concat!("lexcore/", env!("CARGO_PKG_VERSION"));

/// Source of short definitions for code terms.
pub trait DefinitionProvider: Send + Sync {
    /// Identifier of the backing model, part of the cache key.
    fn model_id(&self) -> &str;

    /// Whether calls can produce anything at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Define `term`. May fail; callers decide how failures degrade.
    fn define(&self, term: &str) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// No-op provider
// ---------------------------------------------------------------------------

/// Provider used when definitions are disabled: always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefinitions;

impl DefinitionProvider for NoDefinitions {
    fn model_id(&self) -> &str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn define(&self, _term: &str) -> Result<String> {
        Ok(String::new())
    }
}

// ---------------------------------------------------------------------------
// HTTP provider (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client (OpenRouter by default).
#[derive(Debug, Clone)]
pub struct ChatDefinitions {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl ChatDefinitions {
    pub fn new(config: &DefinitionsConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| LexCoreError::Definition(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url()?,
            model: config.model.clone(),
            api_key,
        })
    }
}

impl DefinitionProvider for ChatDefinitions {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn define(&self, term: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: term,
                },
            ],
            temperature: 0.2,
            max_tokens: 60,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LexCoreError::Definition(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LexCoreError::Definition(format!(
                "provider returned HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LexCoreError::Definition(format!("invalid provider response: {e}")))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Bounded and cached calls
// ---------------------------------------------------------------------------

/// Compute a prompt hash for cache keying.
pub fn prompt_hash(term: &str, model_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SYSTEM_PROMPT.as_bytes());
    hasher.update(term.as_bytes());
    hasher.update(model_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Ask `provider` for a definition, giving up after `timeout`.
///
/// Every failure degrades to an empty string.
pub async fn define_or_empty<P: DefinitionProvider>(
    provider: &P,
    term: &str,
    timeout: Duration,
) -> String {
    if !provider.is_enabled() {
        return String::new();
    }

    match tokio::time::timeout(timeout, provider.define(term)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(term, error = %e, "definition request failed");
            String::new()
        }
        Err(_) => {
            warn!(term, timeout_ms = timeout.as_millis() as u64, "definition request timed out");
            String::new()
        }
    }
}

/// [`define_or_empty`] behind the storage definition cache.
///
/// Only non-empty answers are cached. Cache write failures are logged and
/// ignored.
pub async fn define_cached<P: DefinitionProvider>(
    provider: &P,
    storage: &Storage,
    term: &str,
    timeout: Duration,
) -> Result<String> {
    if !provider.is_enabled() {
        return Ok(String::new());
    }

    let model_id = provider.model_id();
    let hash = prompt_hash(term, model_id);
    if let Some(cached) = storage.get_definition_cache(term, model_id, &hash).await? {
        debug!(term, "definition cache hit");
        return Ok(cached);
    }

    let text = define_or_empty(provider, term, timeout).await;
    if !text.is_empty() {
        if let Err(e) = storage
            .set_definition_cache(term, model_id, &hash, &text)
            .await
        {
            warn!(term, error = %e, "failed to cache definition");
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> DefinitionsConfig {
        DefinitionsConfig {
            enabled: true,
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            model: "test/model".into(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    }

    async fn temp_storage() -> Storage {
        let path = std::env::temp_dir().join(format!("lexcore_test_{}.db", Uuid::now_v7()));
        Storage::open(&path).await.expect("open storage")
    }

    /// Counts calls and answers after an optional delay.
    struct Scripted {
        calls: AtomicUsize,
        answer: Result<String>,
        delay: Duration,
    }

    impl Scripted {
        fn new(answer: Result<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                answer,
                delay: Duration::ZERO,
            }
        }
    }

    impl DefinitionProvider for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn define(&self, _term: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(LexCoreError::Definition(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn chat_provider_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("  Opens a file.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ChatDefinitions::new(&config(&server), "secret".into()).expect("provider");
        let text = provider.define("open file").await.expect("define");
        assert_eq!(text, "Opens a file.");
    }

    #[tokio::test]
    async fn http_errors_degrade_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = ChatDefinitions::new(&config(&server), "secret".into()).expect("provider");
        assert!(provider.define("open").await.is_err());
        assert_eq!(
            define_or_empty(&provider, "open", Duration::from_secs(5)).await,
            ""
        );
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut slow = Scripted::new(Ok("late".into()));
        slow.delay = Duration::from_millis(500);
        let text = define_or_empty(&slow, "open", Duration::from_millis(20)).await;
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn disabled_provider_is_never_called() {
        let storage = temp_storage().await;
        assert_eq!(define_or_empty(&NoDefinitions, "open", Duration::from_secs(1)).await, "");
        assert_eq!(
            define_cached(&NoDefinitions, &storage, "open", Duration::from_secs(1))
                .await
                .expect("define"),
            ""
        );
    }

    #[tokio::test]
    async fn answers_are_cached() {
        let storage = temp_storage().await;
        let provider = Scripted::new(Ok("Opens a file.".into()));

        for _ in 0..2 {
            let text = define_cached(&provider, &storage, "open", Duration::from_secs(1))
                .await
                .expect("define");
            assert_eq!(text, "Opens a file.");
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let storage = temp_storage().await;
        let provider = Scripted::new(Err(LexCoreError::Definition("down".into())));

        for _ in 0..2 {
            let text = define_cached(&provider, &storage, "open", Duration::from_secs(1))
                .await
                .expect("define");
            assert_eq!(text, "");
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn prompt_hash_depends_on_term_and_model() {
        assert_eq!(prompt_hash("open", "m"), prompt_hash("open", "m"));
        assert_ne!(prompt_hash("open", "m"), prompt_hash("close", "m"));
        assert_ne!(prompt_hash("open", "m"), prompt_hash("open", "n"));
        assert_eq!(prompt_hash("open", "m").len(), 64);
    }
}
