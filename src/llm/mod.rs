//! Multi-provider adapter for chat and embeddings.
//!
//! DESIGN
//! ======
//! Two concrete clients built from environment config: [`LlmClient`] for
//! pull request feedback and [`EmbedClient`] for issue and code vectors.
//! Services depend only on the [`LlmChat`] and [`Embedder`] traits so
//! tests can substitute mocks.

pub mod anthropic;
pub mod config;
pub mod ollama;
pub mod openai;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::{ChatResponse, Embedder, LlmChat, LlmError, Message};

/// Inputs per embedding request. Keeps bootstrap of large repos from
/// sending one enormous body.
const EMBED_BATCH_SIZE: usize = 32;

// =============================================================================
// CHAT CLIENT
// =============================================================================

/// Concrete chat client dispatching to the configured provider.
pub struct LlmClient {
    inner: ChatProvider,
    model: String,
}

enum ChatProvider {
    Ollama(ollama::OllamaClient),
    OpenAi(openai::OpenAiClient),
    Anthropic(anthropic::AnthropicClient),
}

impl LlmClient {
    /// Build a chat client from `LLM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::chat_from_env()?)
    }

    /// Build a chat client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Ollama => ChatProvider::Ollama(ollama::OllamaClient::new(config.base_url, config.timeouts)?),
            LlmProviderKind::OpenAi => ChatProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key.unwrap_or_default(),
                config.base_url,
                config.timeouts,
            )?),
            LlmProviderKind::Anthropic => ChatProvider::Anthropic(anthropic::AnthropicClient::new(
                config.api_key.unwrap_or_default(),
                config.base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            ChatProvider::Ollama(c) => c.chat(&self.model, max_tokens, system, messages).await,
            ChatProvider::OpenAi(c) => c.chat(&self.model, max_tokens, system, messages).await,
            ChatProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}

// =============================================================================
// EMBEDDING CLIENT
// =============================================================================

/// Concrete embedding client dispatching to the configured provider.
pub struct EmbedClient {
    inner: EmbedProvider,
    model: String,
}

enum EmbedProvider {
    Ollama(ollama::OllamaClient),
    OpenAi(openai::OpenAiClient),
}

impl EmbedClient {
    /// Build an embedding client from `EMBED_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::embed_from_env()?)
    }

    /// # Errors
    ///
    /// Returns an error for providers without embeddings or if the HTTP
    /// client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Ollama => EmbedProvider::Ollama(ollama::OllamaClient::new(config.base_url, config.timeouts)?),
            LlmProviderKind::OpenAi => EmbedProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key.unwrap_or_default(),
                config.base_url,
                config.timeouts,
            )?),
            LlmProviderKind::Anthropic => return Err(LlmError::EmbeddingsUnsupported("anthropic")),
        };
        Ok(Self { inner, model })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl Embedder for EmbedClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(EMBED_BATCH_SIZE) {
            let embedded = match &self.inner {
                EmbedProvider::Ollama(c) => c.embed(&self.model, batch).await?,
                EmbedProvider::OpenAi(c) => c.embed(&self.model, batch).await?,
            };
            vectors.extend(embedded);
        }
        Ok(vectors)
    }
}
