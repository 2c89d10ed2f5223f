//! Generation service boundary.
//!
//! [`Generator`] maps a prompt to a completion. [`OllamaGenerator`] calls
//! `POST /api/generate` with streaming disabled and the decoding options in
//! [`GenerationOptions`], which default to near-greedy, fully deterministic
//! settings with a repetition penalty to counter looping.

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog;
use crate::config::{GenerationConfig, OllamaConfig};
use crate::error::{RagError, Result};
use crate::ollama::OllamaClient;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Catalog identifier of the generation model.
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Decoding options, serialized with Ollama's option names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Context window in tokens (prompt + output).
    pub num_ctx: u32,
    /// Maximum output tokens.
    pub num_predict: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationConfig::default().into()
    }
}

impl From<GenerationConfig> for GenerationOptions {
    fn from(c: GenerationConfig) -> Self {
        Self {
            temperature: c.temperature,
            num_ctx: c.num_ctx,
            num_predict: c.num_predict,
            top_k: c.top_k,
            top_p: c.top_p,
            repeat_penalty: c.repeat_penalty,
        }
    }
}

pub struct OllamaGenerator {
    model: &'static str,
    options: GenerationOptions,
    client: OllamaClient,
}

impl OllamaGenerator {
    /// # Errors
    ///
    /// [`RagError::UnknownModel`] if `model_identifier` is not in the catalog.
    pub fn new(
        model_identifier: &str,
        config: &OllamaConfig,
        options: GenerationOptions,
    ) -> Result<Self> {
        let descriptor = catalog::resolve(model_identifier)?;
        Ok(Self {
            model: descriptor.identifier,
            options,
            client: OllamaClient::new(config)?,
        })
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": self.options,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let json = self
            .client
            .post_json("/api/generate", &self.request_body(prompt))
            .await
            .map_err(RagError::GenerationService)?;

        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                RagError::GenerationService(
                    "Invalid Ollama response: missing response field".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_rejected() {
        let err = OllamaGenerator::new(
            "gpt-4o",
            &OllamaConfig::default(),
            GenerationOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RagError::UnknownModel { .. }));
    }

    #[test]
    fn request_carries_deterministic_options() {
        let gen = OllamaGenerator::new(
            "gemma2:27b",
            &OllamaConfig::default(),
            GenerationOptions::default(),
        )
        .unwrap();
        let body = gen.request_body("hello");
        assert_eq!(body["model"], "gemma2:27b");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        let opts = &body["options"];
        assert_eq!(opts["temperature"], 0.0);
        assert_eq!(opts["num_ctx"], 32768);
        assert_eq!(opts["num_predict"], 4096);
        assert_eq!(opts["top_k"], 1);
        assert!((opts["top_p"].as_f64().unwrap() - 0.05).abs() < 1e-6);
        assert!((opts["repeat_penalty"].as_f64().unwrap() - 1.2).abs() < 1e-6);
    }
}
