//! Application state: the concrete collaborator stack wired behind the
//! generic `MediationEngine`/`ImageIngestPipeline`.

use std::sync::Arc;

use mediation_config::Settings;
use mediation_core::ProviderKind;
use mediation_engine::{ImageIngestPipeline, MediationEngine};
use mediation_providers::{ProviderRegistry, TesseractOcrService};
use mediation_store::{
    AesGcmCipher, PersistenceLayer, ScyllaClient, ScyllaConfig, ScyllaConversationStateStore,
    ScyllaModePromptOverrideStore, ScyllaNotificationSink, ScyllaProviderStore,
};

use crate::error::ServerError;

pub type Engine = MediationEngine<
    ScyllaConversationStateStore,
    ScyllaModePromptOverrideStore,
    ScyllaNotificationSink,
    ProviderRegistry<ScyllaProviderStore, AesGcmCipher>,
>;

pub type ImagePipeline = ImageIngestPipeline<
    ScyllaConversationStateStore,
    ScyllaModePromptOverrideStore,
    ScyllaNotificationSink,
    ProviderRegistry<ScyllaProviderStore, AesGcmCipher>,
    TesseractOcrService,
>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub images: Arc<ImagePipeline>,
    pub providers: Arc<ProviderRegistry<ScyllaProviderStore, AesGcmCipher>>,
    pub mode_overrides: Arc<ScyllaModePromptOverrideStore>,
}

impl AppState {
    /// Connects to ScyllaDB, ensures the schema, loads the provider
    /// registry, applies bootstrap-config precedence for every configured
    /// provider family, and wires the engine and image pipeline.
    pub async fn connect(settings: &Settings) -> Result<Self, ServerError> {
        let scylla_config = ScyllaConfig {
            hosts: settings.persistence.scylla_hosts.clone(),
            keyspace: settings.persistence.keyspace.clone(),
            replication_factor: settings.persistence.replication_factor,
        };
        let client = ScyllaClient::connect(scylla_config)
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        client
            .ensure_schema()
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;

        let persistence = PersistenceLayer {
            conversation_state: ScyllaConversationStateStore::new(client.clone()),
            providers: ScyllaProviderStore::new(client.clone()),
            mode_prompt_overrides: ScyllaModePromptOverrideStore::new(client.clone()),
            notifications: ScyllaNotificationSink::new(client),
        };

        let cipher = AesGcmCipher::new(
            settings
                .providers
                .encryption_key
                .as_deref()
                .map(str::as_bytes),
        );
        let registry = Arc::new(ProviderRegistry::new(persistence.providers.clone(), cipher));
        registry
            .startup_load()
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;

        Self::bootstrap_providers(&registry, settings).await?;

        let mode_overrides = Arc::new(persistence.mode_prompt_overrides.clone());

        let engine = Arc::new(MediationEngine::new(
            persistence.conversation_state.clone(),
            persistence.mode_prompt_overrides.clone(),
            persistence.notifications.clone(),
            Arc::clone(&registry),
        ));

        let images = Arc::new(ImageIngestPipeline::new(
            Arc::clone(&engine),
            TesseractOcrService::new(),
        ));

        Ok(Self {
            engine,
            images,
            providers: registry,
            mode_overrides,
        })
    }

    async fn bootstrap_providers(
        registry: &ProviderRegistry<ScyllaProviderStore, AesGcmCipher>,
        settings: &Settings,
    ) -> Result<(), ServerError> {
        let bootstrap = &settings.providers;

        let mut openai_key = bootstrap.openai_api_key.clone();
        registry
            .bootstrap_from_config("openai", ProviderKind::TextRemote, &mut openai_key)
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        if let Some(key) = openai_key {
            registry
                .add_credential("openai", ProviderKind::TextRemote, &key)
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        }

        let mut anthropic_key = bootstrap.anthropic_api_key.clone();
        registry
            .bootstrap_from_config("anthropic", ProviderKind::TextRemote, &mut anthropic_key)
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        if let Some(key) = anthropic_key {
            registry
                .add_credential("anthropic", ProviderKind::TextRemote, &key)
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        }

        let mut cohere_key = bootstrap.cohere_api_key.clone();
        registry
            .bootstrap_from_config("cohere", ProviderKind::TextRemote, &mut cohere_key)
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        if let Some(key) = cohere_key {
            registry
                .add_credential("cohere", ProviderKind::TextRemote, &key)
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        }

        let mut google_key = bootstrap.google_api_key.clone();
        registry
            .bootstrap_from_config("google", ProviderKind::MultimodalRemote, &mut google_key)
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        if let Some(key) = google_key {
            registry
                .add_credential("google", ProviderKind::MultimodalRemote, &key)
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        }

        if bootstrap.ollama_base_url.is_some() {
            tracing::info!(
                "Ollama is credential-free; configure its endpoint directly on the registry row"
            );
        }

        Ok(())
    }
}
