//! ScyllaDB-backed `ProviderStore` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediation_core::{Error as CoreError, ProviderKind, ProviderRecord, ProviderStore};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

#[derive(Clone)]
pub struct ScyllaProviderStore {
    client: ScyllaClient,
}

impl ScyllaProviderStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_record(
        &self,
        row: scylla::frame::response::result::Row,
    ) -> Result<ProviderRecord, PersistenceError> {
        let (
            name,
            kind,
            encrypted_credential,
            active,
            deactivated,
            config_json,
            created_at,
            updated_at,
        ): (
            String,
            String,
            Option<Vec<u8>>,
            bool,
            bool,
            Option<String>,
            i64,
            i64,
        ) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        let kind = match kind.as_str() {
            "local" => ProviderKind::Local,
            "text_remote" => ProviderKind::TextRemote,
            "multimodal_remote" => ProviderKind::MultimodalRemote,
            other => return Err(PersistenceError::InvalidData(format!("unknown provider kind: {other}"))),
        };

        let config = config_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?
            .unwrap_or(serde_json::Value::Null);

        Ok(ProviderRecord {
            name,
            kind,
            encrypted_credential,
            active,
            deactivated,
            config,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
        })
    }

    fn kind_str(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Local => "local",
            ProviderKind::TextRemote => "text_remote",
            ProviderKind::MultimodalRemote => "multimodal_remote",
        }
    }
}

#[async_trait]
impl ProviderStore for ScyllaProviderStore {
    async fn upsert(&self, record: ProviderRecord) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO {}.providers (
                name, kind, encrypted_credential, active, deactivated,
                config_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let config_json = serde_json::to_string(&record.config)
            .map_err(|e| CoreError::Store(e.to_string()))?;

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &record.name,
                    Self::kind_str(record.kind),
                    &record.encrypted_credential,
                    record.active,
                    record.deactivated,
                    config_json,
                    record.created_at.timestamp_millis(),
                    record.updated_at.timestamp_millis(),
                ),
            )
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(provider = %record.name, active = record.active, deactivated = record.deactivated, "provider record upserted");

        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<ProviderRecord>, CoreError> {
        let query = format!(
            "SELECT name, kind, encrypted_credential, active, deactivated, config_json, created_at, updated_at
             FROM {}.providers WHERE name = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (name,))
            .await
            .map_err(PersistenceError::from)?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(self.row_to_record(row).map_err(CoreError::from)?));
            }
        }
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<ProviderRecord>, CoreError> {
        let query = format!(
            "SELECT name, kind, encrypted_credential, active, deactivated, config_json, created_at, updated_at
             FROM {}.providers",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, &[])
            .await
            .map_err(PersistenceError::from)?;

        let mut records = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                records.push(self.row_to_record(row).map_err(CoreError::from)?);
            }
        }
        Ok(records)
    }

    /// Clears the credential and tombstones the row rather than deleting
    /// it, so `bootstrap_from_config` precedence keeps working across
    /// restarts.
    async fn delete(&self, name: &str) -> Result<(), CoreError> {
        let query = format!(
            "UPDATE {}.providers SET encrypted_credential = NULL, active = false, deactivated = true, updated_at = ?
             WHERE name = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (Utc::now().timestamp_millis(), name))
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(provider = %name, "provider credential removed, row tombstoned");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            ProviderKind::Local,
            ProviderKind::TextRemote,
            ProviderKind::MultimodalRemote,
        ] {
            let s = ScyllaProviderStore::kind_str(kind);
            let parsed = match s {
                "local" => ProviderKind::Local,
                "text_remote" => ProviderKind::TextRemote,
                "multimodal_remote" => ProviderKind::MultimodalRemote,
                _ => unreachable!(),
            };
            assert_eq!(parsed, kind);
        }
    }
}
