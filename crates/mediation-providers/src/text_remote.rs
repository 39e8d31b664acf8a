//! Credentialed, text-only remote adapters (OpenAI, Anthropic, Cohere).
//!
//! A shared bearer-header, JSON-body, HTTP-status-error-mapping request
//! shape generalized across the three vendor APIs the bootstrap config
//! names.

use std::time::Duration;

use async_trait::async_trait;
use mediation_core::{
    GenerationOptions, GenerationUsage, ModelProvider, ProviderError, ProviderInfo, ProviderKind,
};
use serde_json::{json, Value};

use crate::error::{from_reqwest, from_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRemoteVendor {
    OpenAi,
    Anthropic,
    Cohere,
}

impl TextRemoteVendor {
    fn endpoint(&self) -> &'static str {
        match self {
            TextRemoteVendor::OpenAi => "https://api.openai.com/v1/chat/completions",
            TextRemoteVendor::Anthropic => "https://api.anthropic.com/v1/messages",
            TextRemoteVendor::Cohere => "https://api.cohere.com/v2/chat",
        }
    }
}

pub struct TextRemoteProvider {
    name: String,
    vendor: TextRemoteVendor,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl TextRemoteProvider {
    pub fn new(
        name: impl Into<String>,
        vendor: TextRemoteVendor,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor,
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> Value {
        match self.vendor {
            TextRemoteVendor::OpenAi => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": options.temperature,
                "max_tokens": options.max_tokens,
            }),
            TextRemoteVendor::Anthropic => json!({
                "model": self.model,
                "max_tokens": options.max_tokens,
                "temperature": options.temperature,
                "messages": [{"role": "user", "content": prompt}],
            }),
            TextRemoteVendor::Cohere => json!({
                "model": self.model,
                "temperature": options.temperature,
                "messages": [{"role": "user", "content": prompt}],
            }),
        }
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.vendor {
            TextRemoteVendor::OpenAi | TextRemoteVendor::Cohere => {
                builder.bearer_auth(&self.api_key)
            }
            TextRemoteVendor::Anthropic => builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
        }
    }

    fn extract_text(&self, body: &Value) -> Result<String, ProviderError> {
        let text = match self.vendor {
            TextRemoteVendor::OpenAi => body["choices"][0]["message"]["content"].as_str(),
            TextRemoteVendor::Anthropic => body["content"][0]["text"].as_str(),
            TextRemoteVendor::Cohere => body["message"]["content"][0]["text"].as_str(),
        };
        text.map(str::to_string)
            .ok_or_else(|| ProviderError::Upstream("no text field in provider response".to_string()))
    }
}

#[async_trait]
impl ModelProvider for TextRemoteProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<(String, GenerationUsage), ProviderError> {
        let body = self.request_body(prompt, options);

        let request = self
            .client
            .post(self.vendor.endpoint())
            .timeout(Duration::from_secs(options.timeout_secs.max(1)))
            .json(&body);
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(from_status(status, &text));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let text = self.extract_text(&parsed)?;

        let usage = GenerationUsage {
            estimated_prompt_tokens: self.estimate_tokens(prompt),
            estimated_completion_tokens: self.estimate_tokens(&text),
        };
        Ok((text, usage))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            kind: ProviderKind::TextRemote,
            model: self.model.clone(),
            supports_vision: false,
        }
    }
}
