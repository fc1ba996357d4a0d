//! LLM and embedding configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Ollama,
    OpenAi,
    Anthropic,
}

impl LlmProviderKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => DEFAULT_OLLAMA_BASE_URL,
            Self::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Self::Anthropic => DEFAULT_ANTHROPIC_BASE_URL,
        }
    }

    fn default_chat_model(self) -> &'static str {
        match self {
            Self::Ollama => "llama3.1",
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5-20250929",
        }
    }

    fn default_embed_model(self) -> &'static str {
        match self {
            // Ollama's packaging of all-MiniLM-L6-v2.
            Self::Ollama => "all-minilm",
            Self::OpenAi | Self::Anthropic => "text-embedding-3-small",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Connection settings shared by chat and embedding clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// `None` for Ollama, which runs locally without a key.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Chat client config.
    ///
    /// - `LLM_PROVIDER`: `ollama` (default), `openai`, or `anthropic`
    /// - `LLM_API_KEY_ENV`: names the env var holding the key (hosted providers only)
    /// - `LLM_MODEL`: provider default when absent
    /// - `LLM_BASE_URL`: provider default when absent
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown provider or a missing API key.
    pub fn chat_from_env() -> Result<Self, LlmError> {
        Self::from_prefix("LLM", LlmProviderKind::default_chat_model)
    }

    /// Embedding client config, read from the same variables with the
    /// `EMBED_` prefix. Timeouts are shared with the chat client.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or unsupported provider or a missing
    /// API key.
    pub fn embed_from_env() -> Result<Self, LlmError> {
        let config = Self::from_prefix("EMBED", LlmProviderKind::default_embed_model)?;
        if config.provider == LlmProviderKind::Anthropic {
            return Err(LlmError::EmbeddingsUnsupported("anthropic"));
        }
        Ok(config)
    }

    fn from_prefix(prefix: &str, default_model: fn(LlmProviderKind) -> &'static str) -> Result<Self, LlmError> {
        let var = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        let provider = parse_provider(var("PROVIDER").as_deref())?;
        let api_key = match provider {
            LlmProviderKind::Ollama => None,
            LlmProviderKind::OpenAi | LlmProviderKind::Anthropic => {
                let key_env = format!("{prefix}_API_KEY_ENV");
                let key_var = std::env::var(&key_env).map_err(|_| LlmError::MissingApiKey { var: key_env })?;
                Some(std::env::var(&key_var).map_err(|_| LlmError::MissingApiKey { var: key_var.clone() })?)
            }
        };
        let model = var("MODEL").unwrap_or_else(|| default_model(provider).to_string());
        let base_url = var("BASE_URL")
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = LlmTimeouts {
            request_secs: env_parse_u64("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { provider, api_key, model, base_url, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_provider(raw: Option<&str>) -> Result<LlmProviderKind, LlmError> {
    match raw.unwrap_or("ollama") {
        "ollama" => Ok(LlmProviderKind::Ollama),
        "openai" => Ok(LlmProviderKind::OpenAi),
        "anthropic" => Ok(LlmProviderKind::Anthropic),
        other => Err(LlmError::ConfigParse(format!("unknown provider: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
