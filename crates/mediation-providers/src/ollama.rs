//! Local, credential-free adapter over an Ollama-compatible endpoint.
//!
//! Same retry loop shape as the other remote adapters (exponential backoff
//! on transport/timeout errors only), same `/api/chat`-style request
//! body, no credential required.

use std::time::Duration;

use async_trait::async_trait;
use mediation_core::{
    GenerationOptions, GenerationUsage, ModelProvider, ProviderError, ProviderInfo, ProviderKind,
};
use serde::{Deserialize, Serialize};

use crate::error::{from_reqwest, from_status, is_retryable};

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

pub struct OllamaProvider {
    name: String,
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(name: impl Into<String>, config: OllamaConfig) -> Self {
        Self {
            name: name.into(),
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn execute(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ProviderError> {
        let body = OllamaGenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.endpoint))
            .timeout(Duration::from_secs(options.timeout_secs.max(1)))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(from_status(status, &text));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<(String, GenerationUsage), ProviderError> {
        let mut backoff = self.config.initial_backoff;
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(provider = %self.name, attempt, "retrying ollama request after backoff");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.execute(prompt, options).await {
                Ok(text) => {
                    let usage = GenerationUsage {
                        estimated_prompt_tokens: self.estimate_tokens(prompt),
                        estimated_completion_tokens: self.estimate_tokens(&text),
                    };
                    return Ok((text, usage));
                }
                Err(e) if is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(ProviderError::Timeout))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            kind: ProviderKind::Local,
            model: self.config.model.clone(),
            supports_vision: false,
        }
    }
}
