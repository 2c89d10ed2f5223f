//! Shared HTTP plumbing for the Ollama API.
//!
//! Both the embedding and generation clients post JSON to the same server.
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Errors come back as plain messages; each client wraps them in its own
//! [`RagError`](crate::error::RagError) variant.

use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{RagError, Result};

/// Connection to one Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}{path}` and return the decoded JSON reply.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, ?delay, %url, "retrying Ollama request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<serde_json::Value>()
                            .await
                            .map_err(|e| format!("Invalid Ollama response: {}", e));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(%status, %url, "Ollama request failed, will retry");
                        last_err = Some(format!("Ollama API error {}: {}", status, body_text));
                        continue;
                    }

                    return Err(format!("Ollama API error {}: {}", status, body_text));
                }
                Err(e) => {
                    tracing::warn!(error = %e, %url, "Ollama connection error");
                    last_err = Some(format!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.base_url, e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "Ollama request failed after retries".to_string()))
    }
}
