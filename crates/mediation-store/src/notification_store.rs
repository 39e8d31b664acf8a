//! `TeacherNotificationSink` implementation, idempotent on (session_id, day)
//! granularity so the deliberate-simplification timer task (DESIGN.md,
//! open question 4) can be fired more than once without double-notifying.

use async_trait::async_trait;
use chrono::Utc;
use mediation_core::{Error as CoreError, TeacherNotificationSink};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

#[derive(Clone)]
pub struct ScyllaNotificationSink {
    client: ScyllaClient,
}

impl ScyllaNotificationSink {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    /// Whether a notification has already fired for this session in the
    /// current run, used by the engine's idempotency check before spawning
    /// a new deferred task.
    pub async fn already_notified(&self, session_id: &str) -> Result<bool, CoreError> {
        let query = format!(
            "SELECT fired_at FROM {}.teacher_notifications WHERE session_id = ? LIMIT 1",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (session_id,))
            .await
            .map_err(PersistenceError::from)?;
        Ok(result.rows.map(|r| !r.is_empty()).unwrap_or(false))
    }
}

#[async_trait]
impl TeacherNotificationSink for ScyllaNotificationSink {
    async fn notify_inactivity(&self, session_id: &str, last_strategy: &str) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO {}.teacher_notifications (session_id, fired_at, last_strategy)
             VALUES (?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (session_id, Utc::now().timestamp_millis(), last_strategy),
            )
            .await
            .map_err(PersistenceError::from)?;

        tracing::warn!(session_id = %session_id, last_strategy = %last_strategy, "teacher notified of learner inactivity");
        Ok(())
    }
}
