//! ScyllaDB-backed `ModePromptOverrideStore` implementation.
//!
//! Grounded on the original `LLMConfig` row lookup: rows are keyed by mode
//! and clustered `updated_at DESC`, so "most recent wins" is a `LIMIT 1`
//! query rather than an application-level sort.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediation_core::{Error as CoreError, Mode, ModePromptOverride, ModePromptOverrideStore};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

#[derive(Clone)]
pub struct ScyllaModePromptOverrideStore {
    client: ScyllaClient,
}

impl ScyllaModePromptOverrideStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn mode_str(mode: Mode) -> &'static str {
        match mode {
            Mode::Practice => "practice_mode",
            Mode::Test => "test_mode",
        }
    }

    pub async fn set_override(
        &self,
        mode: Mode,
        system_prompt: &str,
        temperature: f64,
        max_tokens: i32,
    ) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO {}.mode_prompt_overrides (mode, updated_at, system_prompt, temperature, max_tokens)
             VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    Self::mode_str(mode),
                    Utc::now().timestamp_millis(),
                    system_prompt,
                    temperature,
                    max_tokens,
                ),
            )
            .await
            .map_err(PersistenceError::from)?;

        Ok(())
    }
}

#[async_trait]
impl ModePromptOverrideStore for ScyllaModePromptOverrideStore {
    async fn latest_for_mode(&self, mode: Mode) -> Result<Option<ModePromptOverride>, CoreError> {
        let query = format!(
            "SELECT updated_at, system_prompt, temperature, max_tokens
             FROM {}.mode_prompt_overrides WHERE mode = ? LIMIT 1",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (Self::mode_str(mode),))
            .await
            .map_err(PersistenceError::from)?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (updated_at, system_prompt, temperature, max_tokens): (i64, String, f64, i32) =
                    row.into_typed()
                        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(Some(ModePromptOverride {
                    mode,
                    system_prompt,
                    temperature,
                    max_tokens,
                    updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
                }));
            }
        }
        Ok(None)
    }
}
