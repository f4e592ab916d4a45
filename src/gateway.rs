//! External AI gateway abstraction and OpenAI-compatible implementation.
//!
//! Defines the [`AiGateway`] trait, the capability seam between the pipeline
//! and the network: classification, embedding, and text generation. The
//! concrete [`OpenAiGateway`] speaks the OpenAI-compatible HTTP API.
//!
//! # Call contracts
//!
//! | Capability | Request | Response requirement |
//! |-----------|---------|----------------------|
//! | `classify` | chat completion, JSON mode, analysis system prompt | content decodes to `{sentimento, topico}` |
//! | `embed` | embeddings request `{model, input}` | one vector of exactly the configured dims |
//! | `generate` | chat completion `{model, messages, temperature}` | one text completion |
//!
//! The provider is an untrusted, latency-variable dependency: every call is
//! bounded by the configured client timeout, and timeout expiry surfaces as
//! an ordinary provider error, never a hang. Calls are single-attempt; the
//! pipeline's failure semantics record a failed call as degraded data
//! instead of retrying it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::models::Classification;

/// Capability-typed wrapper around the external AI provider.
///
/// All three calls can fail independently; callers decide whether a failure
/// is absorbed (enrichment worker, answerer) or propagated.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Derive a sentiment label and topic labels from free text.
    ///
    /// A response that does not strictly decode to the expected JSON shape
    /// is a classification failure, not a partially-filled result.
    async fn classify(&self, text: &str) -> Result<Classification>;

    /// Produce the fixed-dimension embedding vector for a text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Produce a text completion for an already-rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// The embedding dimensionality this gateway is configured for.
    fn dims(&self) -> usize;
}

/// Gateway implementation for OpenAI-compatible HTTP APIs.
///
/// Requires the `OPENAI_API_KEY` environment variable; its absence is fatal
/// at construction, before any pipeline work starts.
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    dims: usize,
    temperature: f32,
    analysis_prompt: String,
}

impl OpenAiGateway {
    pub fn new(config: &GatewayConfig, analysis_prompt: &str) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            dims: config.dims,
            temperature: config.temperature,
            analysis_prompt: analysis_prompt.to_string(),
        })
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            bail!("Gateway error {}: {}", status, body_text);
        }

        resp.json()
            .await
            .context("Failed to decode gateway response body")
    }

    async fn chat(&self, messages: serde_json::Value, json_mode: bool) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.chat_model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let json = self.post_json("/chat/completions", &body).await?;

        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/message/content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Gateway chat response missing message content"))?;

        Ok(content.to_string())
    }
}

/// Shape the classification call is instructed to emit. Both keys are
/// required; `topico` may be a single label or a list.
#[derive(Deserialize)]
struct ClassificationPayload {
    sentimento: String,
    #[serde(deserialize_with = "crate::models::string_or_list")]
    topico: Vec<String>,
}

#[async_trait]
impl AiGateway for OpenAiGateway {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let messages = serde_json::json!([
            {"role": "system", "content": self.analysis_prompt},
            {"role": "user", "content": text},
        ]);

        let content = self.chat(messages, true).await?;

        let payload: ClassificationPayload =
            serde_json::from_str(&content).context("Malformed classification response")?;

        Ok(Classification {
            sentiment: payload.sentimento,
            topics: payload.topico,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
        });

        let json = self.post_json("/embeddings", &body).await?;

        let embedding = json
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: missing data[0].embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        // A partial or truncated vector must never reach the index.
        if vec.len() != self.dims {
            bail!(
                "Embedding dimensionality mismatch: expected {}, got {}",
                self.dims,
                vec.len()
            );
        }

        Ok(vec)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = serde_json::json!([
            {"role": "user", "content": prompt},
        ]);
        self.chat(messages, false).await
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_payload_requires_both_keys() {
        assert!(serde_json::from_str::<ClassificationPayload>(r#"{"sentimento":"Positive"}"#).is_err());
        assert!(serde_json::from_str::<ClassificationPayload>(r#"{"topico":"Venue"}"#).is_err());

        let payload: ClassificationPayload =
            serde_json::from_str(r#"{"sentimento":"Negative","topico":["Sound","Delay"]}"#).unwrap();
        assert_eq!(payload.sentimento, "Negative");
        assert_eq!(payload.topico, vec!["Sound".to_string(), "Delay".to_string()]);
    }

    #[test]
    fn test_classification_payload_accepts_scalar_topic() {
        let payload: ClassificationPayload =
            serde_json::from_str(r#"{"sentimento":"Neutral","topico":"Venue"}"#).unwrap();
        assert_eq!(payload.topico, vec!["Venue".to_string()]);
    }
}
