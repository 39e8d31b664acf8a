//! Provider registry data model (C5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of back-end a provider adapter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Local,
    TextRemote,
    MultimodalRemote,
}

/// Durable record of a registered provider credential/configuration.
///
/// `active` and `deactivated` are deliberately independent flags
/// (DESIGN.md decision 2): `deactivated` is an administrator tombstone
/// that always wins, `active` is a plain usability cache refreshed on
/// `startup_load`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub kind: ProviderKind,
    pub encrypted_credential: Option<Vec<u8>>,
    pub active: bool,
    pub deactivated: bool,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderRecord {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            kind,
            encrypted_credential: None,
            active: false,
            deactivated: false,
            config: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// A provider is dispatchable only when not administratively deactivated
    /// and it has a usable credential (or is a local/no-credential kind).
    pub fn is_usable(&self) -> bool {
        !self.deactivated
            && self.active
            && (self.kind == ProviderKind::Local || self.encrypted_credential.is_some())
    }
}

/// Read-only view returned by `ProviderRegistry::list`/`list_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderView {
    pub name: String,
    pub kind: ProviderKind,
    pub model: Option<String>,
    pub active: bool,
    pub is_default: bool,
    pub supports_vision: bool,
}

/// A per-mode system-prompt / generation-parameter override, selected by
/// most-recent `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModePromptOverride {
    pub mode: crate::strategy::Mode,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: i32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivated_record_is_never_usable_even_with_credential() {
        let mut record = ProviderRecord::new("openai", ProviderKind::TextRemote);
        record.encrypted_credential = Some(vec![1, 2, 3]);
        record.active = true;
        record.deactivated = true;
        assert!(!record.is_usable());
    }

    #[test]
    fn local_provider_needs_no_credential() {
        let mut record = ProviderRecord::new("ollama-llama3", ProviderKind::Local);
        record.active = true;
        assert!(record.is_usable());
    }

    #[test]
    fn remote_provider_without_credential_is_unusable() {
        let mut record = ProviderRecord::new("anthropic", ProviderKind::TextRemote);
        record.active = true;
        assert!(!record.is_usable());
    }
}
