//! Google Gemini multimodal provider family.
//!
//! One credential fans out to several per-model provider keys, named
//! `google-<model-with-underscores>` (e.g. `google-gemini_2_5_flash`),
//! grounded literally on `original_source/backend/app/ai/multi_llm_manager.py`'s
//! `provider_key = f"google-{model_key.replace('.', '_').replace('-', '_')}"`.
//! Every member of the family supports vision.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use mediation_core::{
    GenerationOptions, GenerationUsage, ModelProvider, ProviderError, ProviderInfo, ProviderKind,
};
use serde_json::{json, Value};

use crate::error::{from_reqwest, from_status};

/// The fixed set of Gemini models the family fans out to, as (model id,
/// display name) — mirrors the source's literal tuple list.
pub const FAMILY_MODELS: [(&str, &str); 3] = [
    ("gemini-2.5-flash", "Google Gemini 2.5 Flash"),
    ("gemini-2.5-pro", "Google Gemini 2.5 Pro"),
    ("gemini-2.0-flash", "Google Gemini 2.0 Flash"),
];

/// Derives the stable provider key for a Gemini model id, e.g.
/// `gemini-2.5-flash` -> `google-gemini_2_5_flash`.
pub fn provider_key_for_model(model_id: &str) -> String {
    format!("google-{}", model_id.replace(['.', '-'], "_"))
}

pub struct GoogleFamilyProvider {
    name: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleFamilyProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let model = model.into();
        let name = provider_key_for_model(&model);
        Self {
            name,
            model,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Construct every family member from one credential, mirroring
    /// `add_credential`'s provider-family fan-out.
    pub fn family(api_key: &str) -> Vec<GoogleFamilyProvider> {
        FAMILY_MODELS
            .iter()
            .map(|(model, _)| GoogleFamilyProvider::new(*model, api_key.to_string()))
            .collect()
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }

    fn extract_text(body: &Value) -> Result<String, ProviderError> {
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Upstream("no text field in Gemini response".to_string()))
    }
}

#[async_trait]
impl ModelProvider for GoogleFamilyProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<(String, GenerationUsage), ProviderError> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
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

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let text = Self::extract_text(&parsed)?;

        let usage = GenerationUsage {
            estimated_prompt_tokens: self.estimate_tokens(prompt),
            estimated_completion_tokens: self.estimate_tokens(&text),
        };
        Ok((text, usage))
    }

    async fn process_image(
        &self,
        image: &[u8],
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = json!({
            "contents": [{
                "parts": [
                    {"text": prompt},
                    {"inline_data": {"mime_type": "image/png", "data": encoded}},
                ]
            }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
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

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;
        Self::extract_text(&parsed)
    }

    async fn process_images(
        &self,
        images: &[Vec<u8>],
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        if images.len() > 1 {
            tracing::warn!(
                provider = %self.name,
                count = images.len(),
                "Gemini family provider currently sends a single inline image per call; \
                 processing the first image only"
            );
        }
        match images.first() {
            Some(first) => self.process_image(first, prompt, options).await,
            None => Err(ProviderError::Upstream("no images supplied".to_string())),
        }
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.clone(),
            kind: ProviderKind::MultimodalRemote,
            model: self.model.clone(),
            supports_vision: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_key_matches_source_convention() {
        assert_eq!(provider_key_for_model("gemini-2.5-flash"), "google-gemini_2_5_flash");
        assert_eq!(provider_key_for_model("gemini-2.0-flash"), "google-gemini_2_0_flash");
    }

    #[test]
    fn family_has_three_members_all_supporting_vision() {
        let family = GoogleFamilyProvider::family("k");
        assert_eq!(family.len(), 3);
        for provider in &family {
            assert!(provider.info().supports_vision);
        }
    }
}
