//! Ollama client for locally hosted models.
//!
//! Thin wrapper over `/api/chat` (non-streaming) and `/api/embed`. Pure
//! parsing in `parse_chat_response` and `parse_embed_response` for
//! testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::LlmTimeouts;
use super::types::{ChatResponse, LlmError, Message};

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let msgs = build_chat_messages(system, messages);
        let body = ChatRequest { model, messages: &msgs, stream: false, options: ChatOptions { num_predict: max_tokens } };
        let text = self.send_json("/api/chat", &body).await?;
        parse_chat_response(&text)
    }

    pub async fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = EmbedRequest { model, input: inputs };
        let text = self.send_json("/api/embed", &body).await?;
        parse_embed_response(&text, inputs.len())
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    model: String,
    message: Message,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedReply {
    embeddings: Vec<Vec<f32>>,
}

fn build_chat_messages(system: &str, messages: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if !system.trim().is_empty() {
        out.push(Message { role: "system".into(), content: system.to_string() });
    }
    out.extend_from_slice(messages);
    out
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_chat_response(json: &str) -> Result<ChatResponse, LlmError> {
    let reply: ChatReply = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    Ok(ChatResponse {
        text: reply.message.content,
        model: reply.model,
        input_tokens: reply.prompt_eval_count,
        output_tokens: reply.eval_count,
    })
}

pub(crate) fn parse_embed_response(json: &str, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
    let reply: EmbedReply = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    if reply.embeddings.len() != expected {
        return Err(LlmError::ApiParse(format!(
            "embed: expected {expected} vectors, got {}",
            reply.embeddings.len()
        )));
    }
    Ok(reply.embeddings)
}

#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;
