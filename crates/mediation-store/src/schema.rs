//! ScyllaDB schema creation.

use scylla::Session;

use crate::error::PersistenceError;

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("failed to create keyspace: {}", e)))?;

    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let conversation_state_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.conversation_state (
            session_id TEXT PRIMARY KEY,
            failed_strategies_json TEXT,
            comprehension_history_json TEXT,
            last_comprehension TEXT,
            current_strategy TEXT,
            current_instruction TEXT,
            attempt_count INT,
            created_at BIGINT,
            updated_at BIGINT
        )
    "#,
        keyspace
    );
    session
        .query_unpaged(conversation_state_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("failed to create conversation_state table: {}", e))
        })?;

    let providers_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.providers (
            name TEXT PRIMARY KEY,
            kind TEXT,
            encrypted_credential BLOB,
            active BOOLEAN,
            deactivated BOOLEAN,
            config_json TEXT,
            created_at BIGINT,
            updated_at BIGINT
        )
    "#,
        keyspace
    );
    session
        .query_unpaged(providers_table, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("failed to create providers table: {}", e)))?;

    let mode_prompt_overrides_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.mode_prompt_overrides (
            mode TEXT,
            updated_at BIGINT,
            system_prompt TEXT,
            temperature DOUBLE,
            max_tokens INT,
            PRIMARY KEY ((mode), updated_at)
        ) WITH CLUSTERING ORDER BY (updated_at DESC)
    "#,
        keyspace
    );
    session
        .query_unpaged(mode_prompt_overrides_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!(
                "failed to create mode_prompt_overrides table: {}",
                e
            ))
        })?;

    let teacher_notifications_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.teacher_notifications (
            session_id TEXT,
            fired_at BIGINT,
            last_strategy TEXT,
            PRIMARY KEY ((session_id), fired_at)
        ) WITH CLUSTERING ORDER BY (fired_at DESC)
    "#,
        keyspace
    );
    session
        .query_unpaged(teacher_notifications_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!(
                "failed to create teacher_notifications table: {}",
                e
            ))
        })?;

    Ok(())
}
