//! Egress collaborator interfaces the engine depends on.
//!
//! These are implemented by `mediation-store` (durable stores, encryption)
//! and `mediation-providers` (model adapters); the engine only ever sees
//! these traits, kept at the seam the same way a `LanguageModel`/`Retriever`
//! abstraction would be.

use async_trait::async_trait;

use crate::error::{OcrError, ProviderError};
use crate::provider::{ModePromptOverride, ProviderRecord};
use crate::state::ConversationState;
use crate::strategy::Mode;

#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: i32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GenerationUsage {
    pub estimated_prompt_tokens: usize,
    pub estimated_completion_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub name: String,
    pub kind: crate::provider::ProviderKind,
    pub model: String,
    pub supports_vision: bool,
}

/// Uniform interface over local and remote language/vision models (C6).
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<(String, GenerationUsage), ProviderError>;

    async fn process_image(
        &self,
        _image: &[u8],
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Upstream(
            "this provider does not support vision".to_string(),
        ))
    }

    async fn process_images(
        &self,
        images: &[Vec<u8>],
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        if images.len() > 1 {
            tracing::warn!(
                provider = %self.info().name,
                count = images.len(),
                "provider does not support multi-image calls; processing the first image only"
            );
        }
        match images.first() {
            Some(first) => self.process_image(first, prompt, options).await,
            None => Err(ProviderError::Upstream("no images supplied".to_string())),
        }
    }

    fn info(&self) -> ProviderInfo;

    /// Coarse token estimate; the source uses `len(text) // 4`.
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / 4
    }
}

#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn upsert(&self, record: ProviderRecord) -> Result<(), crate::error::Error>;
    async fn get(&self, name: &str) -> Result<Option<ProviderRecord>, crate::error::Error>;
    async fn list(&self) -> Result<Vec<ProviderRecord>, crate::error::Error>;
    async fn delete(&self, name: &str) -> Result<(), crate::error::Error>;
}

#[async_trait]
pub trait ConversationStateStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>, crate::error::Error>;
    async fn upsert(&self, state: &ConversationState) -> Result<(), crate::error::Error>;
    async fn delete(&self, session_id: &str) -> Result<(), crate::error::Error>;
}

#[async_trait]
pub trait ModePromptOverrideStore: Send + Sync {
    /// Returns the most-recent-by-`updated_at` override row for `mode`, if any.
    async fn latest_for_mode(
        &self,
        mode: Mode,
    ) -> Result<Option<ModePromptOverride>, crate::error::Error>;
}

#[async_trait]
pub trait TeacherNotificationSink: Send + Sync {
    async fn notify_inactivity(
        &self,
        session_id: &str,
        last_strategy: &str,
    ) -> Result<(), crate::error::Error>;
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Up to two configuration attempts, 30s timeout each; implementations
    /// never propagate raw failures, they return
    /// `OcrError::NoTextRecovered` so the pipeline can pick the fixed
    /// Hebrew fallback message.
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Seam the engine dispatches through to reach a live provider instance,
/// implemented by `mediation-providers`'s `ProviderRegistry`.
pub trait ProviderResolver: Send + Sync {
    /// Resolves `preferred` if registered, else the default active
    /// provider. `None` means no provider is available at all.
    fn resolve(&self, preferred: Option<&str>) -> Option<std::sync::Arc<dyn ModelProvider>>;
}

/// Symmetric credential encryption.
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8>;
    fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8>;
    /// Whether this cipher is backed by a real key, or is a logged-insecure
    /// passthrough: with no key configured, plain-text storage is
    /// permitted but must be logged as insecure.
    fn is_encrypting(&self) -> bool;
}
