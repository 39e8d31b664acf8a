//! ScyllaDB-backed `ConversationStateStore` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediation_core::{ComprehensionLabel, ConversationState, Error as CoreError, ConversationStateStore, Strategy};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

#[derive(Clone)]
pub struct ScyllaConversationStateStore {
    client: ScyllaClient,
}

impl ScyllaConversationStateStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_state(
        &self,
        row: scylla::frame::response::result::Row,
    ) -> Result<ConversationState, PersistenceError> {
        let (
            session_id,
            failed_strategies_json,
            comprehension_history_json,
            last_comprehension,
            current_strategy,
            current_instruction,
            attempt_count,
            created_at,
            updated_at,
        ): (
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            i32,
            i64,
            i64,
        ) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        let failed_strategies: Vec<Strategy> = failed_strategies_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?
            .unwrap_or_default();

        let comprehension_history: Vec<ComprehensionLabel> = comprehension_history_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?
            .unwrap_or_default();

        let last_comprehension = last_comprehension
            .as_deref()
            .and_then(|s| serde_json::from_str::<ComprehensionLabel>(&format!("\"{s}\"")).ok())
            .unwrap_or_default();

        let current_strategy = current_strategy
            .as_deref()
            .and_then(|s| serde_json::from_str::<Strategy>(&format!("\"{s}\"")).ok());

        Ok(ConversationState {
            session_id,
            failed_strategies,
            comprehension_history,
            last_comprehension,
            current_strategy,
            current_instruction,
            attempt_count: attempt_count.max(0) as u32,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl ConversationStateStore for ScyllaConversationStateStore {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>, CoreError> {
        let query = format!(
            "SELECT session_id, failed_strategies_json, comprehension_history_json,
                    last_comprehension, current_strategy, current_instruction,
                    attempt_count, created_at, updated_at
             FROM {}.conversation_state WHERE session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (session_id,))
            .await
            .map_err(PersistenceError::from)?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(self.row_to_state(row).map_err(CoreError::from)?));
            }
        }
        Ok(None)
    }

    async fn upsert(&self, state: &ConversationState) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO {}.conversation_state (
                session_id, failed_strategies_json, comprehension_history_json,
                last_comprehension, current_strategy, current_instruction,
                attempt_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let failed_json =
            serde_json::to_string(&state.failed_strategies).map_err(|e| CoreError::Store(e.to_string()))?;
        let history_json = serde_json::to_string(&state.comprehension_history)
            .map_err(|e| CoreError::Store(e.to_string()))?;
        let last_comprehension_str = serde_json::to_value(state.last_comprehension)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string));
        let current_strategy_str = state
            .current_strategy
            .and_then(|s| serde_json::to_value(s).ok())
            .and_then(|v| v.as_str().map(str::to_string));

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &state.session_id,
                    failed_json,
                    history_json,
                    last_comprehension_str,
                    current_strategy_str,
                    &state.current_instruction,
                    state.attempt_count as i32,
                    state.created_at.timestamp_millis(),
                    state.updated_at.timestamp_millis(),
                ),
            )
            .await
            .map_err(PersistenceError::from)?;

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), CoreError> {
        let query = format!(
            "DELETE FROM {}.conversation_state WHERE session_id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(query, (session_id,))
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(session_id = %session_id, "conversation state dropped");
        Ok(())
    }
}
