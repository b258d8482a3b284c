//! [`ReasoningService`] backed by the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use ytintel_core::AppConfig;

use crate::error::SynthesisError;
use crate::synthesize::ReasoningService;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
/// Error bodies are cut to this many characters before they reach a log line.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct AnthropicClient {
    client: Client,
    messages_url: Url,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("messages_url", &self.messages_url.as_str())
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`SynthesisError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SynthesisError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ytintel/0.1 (channel-intelligence)")
            .build()?;

        let invalid = |reason: String| SynthesisError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason,
        };
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let messages_url = Url::parse(&normalised)
            .and_then(|base| base.join("v1/messages"))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            messages_url,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build a client from the application config, preferring a per-run key
    /// over `ANTHROPIC_API_KEY`. Returns `Ok(None)` when neither is set.
    ///
    /// # Errors
    ///
    /// Same as [`AnthropicClient::new`].
    pub fn from_app_config(
        config: &AppConfig,
        override_key: Option<&str>,
    ) -> Result<Option<Self>, SynthesisError> {
        let Some(key) = resolve_credential(override_key, config.anthropic_api_key.as_deref())
        else {
            return Ok(None);
        };
        Self::new(
            key,
            &config.anthropic_base_url,
            config.reasoning_model.clone(),
            config.reasoning_timeout_secs,
        )
        .map(Some)
    }
}

/// The per-run key wins over the configured key; blank keys count as unset.
#[must_use]
pub fn resolve_credential(override_key: Option<&str>, configured: Option<&str>) -> Option<String> {
    [override_key, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ReasoningService for AnthropicClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, SynthesisError> {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(self.messages_url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::UnexpectedStatus {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Malformed(format!("messages response: {e}")))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(SynthesisError::Malformed(
                "response contained no text".to_string(),
            ));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| body.chars().take(ERROR_BODY_LIMIT).collect(),
        |envelope| envelope.error.message,
    )
}
