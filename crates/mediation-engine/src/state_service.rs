//! Per-session conversation state facade (C4).
//!
//! Thin wrapper over `ConversationStateStore` that provides the
//! `get_or_create` / `reset_session` / `drop` vocabulary the orchestrator
//! needs, as a facade over the durable conversation store.

use chrono::Utc;
use mediation_core::{ConversationState, ConversationStateStore, Error};

pub struct ConversationStateService<S: ConversationStateStore> {
    store: S,
}

impl<S: ConversationStateStore> ConversationStateService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get_or_create(&self, session_id: &str) -> Result<ConversationState, Error> {
        match self.store.get(session_id).await? {
            Some(state) => Ok(state),
            None => {
                let state = ConversationState::new(session_id);
                self.store.upsert(&state).await?;
                Ok(state)
            }
        }
    }

    pub async fn save(&self, state: &ConversationState) -> Result<(), Error> {
        self.store.upsert(state).await
    }

    pub async fn reset_session(&self, session_id: &str) -> Result<ConversationState, Error> {
        let mut state = ConversationState::new(session_id);
        state.updated_at = Utc::now();
        self.store.upsert(&state).await?;
        Ok(state)
    }

    pub async fn drop_session(&self, session_id: &str) -> Result<(), Error> {
        self.store.delete(session_id).await
    }
}
