//! ScyllaDB persistence layer for the mediation engine.
//!
//! Provides durable storage for:
//! - Conversation state (C4)
//! - Provider registry rows and credentials (C5)
//! - Mode prompt overrides
//! - Teacher inactivity notifications
//!
//! Plus the AES-256-GCM credential encryption service (`encryption`).

pub mod client;
pub mod encryption;
pub mod error;
pub mod mode_prompt_store;
pub mod notification_store;
pub mod provider_store;
pub mod schema;
pub mod state_store;

pub use client::{ScyllaClient, ScyllaConfig};
pub use encryption::AesGcmCipher;
pub use error::PersistenceError;
pub use mode_prompt_store::ScyllaModePromptOverrideStore;
pub use notification_store::ScyllaNotificationSink;
pub use provider_store::ScyllaProviderStore;
pub use state_store::ScyllaConversationStateStore;

/// Bundled, ready-to-use set of durable collaborators.
#[derive(Clone)]
pub struct PersistenceLayer {
    pub conversation_state: ScyllaConversationStateStore,
    pub providers: ScyllaProviderStore,
    pub mode_prompt_overrides: ScyllaModePromptOverrideStore,
    pub notifications: ScyllaNotificationSink,
}

pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        conversation_state: ScyllaConversationStateStore::new(client.clone()),
        providers: ScyllaProviderStore::new(client.clone()),
        mode_prompt_overrides: ScyllaModePromptOverrideStore::new(client.clone()),
        notifications: ScyllaNotificationSink::new(client),
    })
}
