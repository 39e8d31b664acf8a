//! Provider registry: credential lifecycle and bootstrap precedence (C5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mediation_core::{
    CredentialCipher, Error as CoreError, ModelProvider, ProviderKind, ProviderRecord,
    ProviderResolver, ProviderStore, ProviderView,
};
use parking_lot::RwLock;
use serde_json::Value;

use crate::google::GoogleFamilyProvider;
use crate::ollama::{OllamaConfig, OllamaProvider};
use crate::text_remote::{TextRemoteProvider, TextRemoteVendor};

struct RegistryInner {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
    default_provider: Option<String>,
}

/// Owns the truth about which providers exist and are usable. Every
/// mutating operation commits to the durable store before the in-memory
/// map is updated.
pub struct ProviderRegistry<S: ProviderStore, C: CredentialCipher> {
    store: S,
    cipher: C,
    inner: RwLock<RegistryInner>,
}

impl<S: ProviderStore, C: CredentialCipher> ProviderRegistry<S, C> {
    pub fn new(store: S, cipher: C) -> Self {
        Self {
            store,
            cipher,
            inner: RwLock::new(RegistryInner {
                providers: HashMap::new(),
                default_provider: None,
            }),
        }
    }

    /// Loads every registry record, decrypts usable credentials, and
    /// constructs live adapters. Deactivated or credential-less records are
    /// skipped. Decrypt failures are logged and skipped, not fatal.
    pub async fn startup_load(&self) -> Result<(), CoreError> {
        let records = self.store.list().await?;
        let mut providers: HashMap<String, Arc<dyn ModelProvider>> = HashMap::new();

        for record in records {
            if record.deactivated {
                continue;
            }
            match self.build_provider(&record) {
                Some(provider) => {
                    providers.insert(record.name.clone(), provider);
                }
                None => {
                    tracing::warn!(provider = %record.name, "skipping provider with no usable credential at startup");
                }
            }
        }

        let mut inner = self.inner.write();
        if inner.default_provider.is_none() {
            inner.default_provider = providers.keys().next().cloned();
        }
        inner.providers = providers;

        tracing::info!(count = inner.providers.len(), "provider registry loaded from durable store");
        Ok(())
    }

    fn build_provider(&self, record: &ProviderRecord) -> Option<Arc<dyn ModelProvider>> {
        let credential = record.encrypted_credential.as_ref().and_then(|bytes| {
            let decrypted = self.cipher.decrypt(bytes);
            if decrypted.is_empty() {
                tracing::warn!(provider = %record.name, "credential decryption failed, skipping provider");
                None
            } else {
                Some(String::from_utf8_lossy(&decrypted).to_string())
            }
        });

        match record.kind {
            ProviderKind::Local => {
                let endpoint = record
                    .config
                    .get("endpoint")
                    .and_then(Value::as_str)
                    .unwrap_or("http://localhost:11434")
                    .to_string();
                let model = record
                    .config
                    .get("model")
                    .and_then(Value::as_str)
                    .unwrap_or("llama3.1:8b")
                    .to_string();
                Some(Arc::new(OllamaProvider::new(
                    record.name.clone(),
                    OllamaConfig {
                        endpoint,
                        model,
                        ..Default::default()
                    },
                )))
            }
            ProviderKind::TextRemote => {
                let credential = credential?;
                let vendor = match record.config.get("vendor").and_then(Value::as_str) {
                    Some("anthropic") => TextRemoteVendor::Anthropic,
                    Some("cohere") => TextRemoteVendor::Cohere,
                    _ => TextRemoteVendor::OpenAi,
                };
                let model = record
                    .config
                    .get("model")
                    .and_then(Value::as_str)
                    .unwrap_or("gpt-4o-mini")
                    .to_string();
                Some(Arc::new(TextRemoteProvider::new(
                    record.name.clone(),
                    vendor,
                    model,
                    credential,
                )))
            }
            ProviderKind::MultimodalRemote => {
                let credential = credential?;
                let model = record
                    .config
                    .get("model")
                    .and_then(Value::as_str)
                    .unwrap_or("gemini-2.5-flash")
                    .to_string();
                Some(Arc::new(GoogleFamilyProvider::new(model, credential)))
            }
        }
    }

    /// Finds a representative row for the Google family (rows named
    /// `google-<model>`), preferring a usable one so a single rotated or
    /// still-active member is enough to mark the family authoritative. If
    /// every family row is deactivated or credential-less, returns one of
    /// those so the caller clears the bootstrap key rather than re-fanning
    /// it out over a tombstoned family.
    async fn find_google_family_row(&self) -> Result<Option<ProviderRecord>, CoreError> {
        let mut family: Vec<ProviderRecord> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|record| record.name.starts_with("google-"))
            .collect();

        if let Some(index) = family
            .iter()
            .position(|record| !record.deactivated && record.encrypted_credential.is_some())
        {
            return Ok(Some(family.swap_remove(index)));
        }

        Ok(family.into_iter().next())
    }

    /// Applies bootstrap-config precedence by deciding whether
    /// `plaintext_key` survives; it does not persist anything itself. A
    /// survived key means "no registry row yet, initialize from config" —
    /// the caller is expected to follow with `add_credential` (which knows
    /// how to fan a Google credential out to its per-model family, unlike a
    /// bare single-row write this method would otherwise have to do).
    /// - no registry row -> key survives, config wins.
    /// - row present with a usable credential -> key is cleared, config ignored.
    /// - row present but deactivated/credential-less -> key is cleared too,
    ///   so it cannot leak via another path.
    ///
    /// Google is a provider family stored under per-model keys
    /// (`google-<model>`), not under the literal name `"google"`, so its
    /// existence check scans the store for any `google-`-prefixed row
    /// instead of looking up `provider_name` directly.
    pub async fn bootstrap_from_config(
        &self,
        provider_name: &str,
        _kind: ProviderKind,
        plaintext_key: &mut Option<String>,
    ) -> Result<(), CoreError> {
        let existing = if provider_name == "google" {
            self.find_google_family_row().await?
        } else {
            self.store.get(provider_name).await?
        };

        match existing {
            None => {}
            Some(record) if record.deactivated || record.encrypted_credential.is_none() => {
                tracing::info!(
                    provider = %provider_name,
                    "registry row is deactivated or has no credential; ignoring bootstrap config"
                );
                *plaintext_key = None;
            }
            Some(_) => {
                tracing::debug!(provider = %provider_name, "registry already authoritative; ignoring bootstrap config");
                *plaintext_key = None;
            }
        }

        Ok(())
    }

    async fn add_credential_inner(
        &self,
        name: &str,
        kind: ProviderKind,
        plaintext: &str,
    ) -> Result<(), CoreError> {
        if !self.cipher.is_encrypting() {
            tracing::warn!(provider = %name, "storing provider credential in plain text: no encryption key configured");
        }

        let mut record = self
            .store
            .get(name)
            .await?
            .unwrap_or_else(|| ProviderRecord::new(name, kind));
        record.encrypted_credential = Some(self.cipher.encrypt(plaintext.as_bytes()));
        record.active = true;
        record.deactivated = false;
        record.updated_at = Utc::now();

        self.store.upsert(record.clone()).await?;

        if let Some(provider) = self.build_provider(&record) {
            let mut inner = self.inner.write();
            if inner.default_provider.is_none() {
                inner.default_provider = Some(name.to_string());
            }
            inner.providers.insert(name.to_string(), provider);
        }

        Ok(())
    }

    /// Adds a credential. Google is a provider family: a single credential
    /// fans out to every family member's provider key.
    pub async fn add_credential(&self, name: &str, kind: ProviderKind, plaintext: &str) -> Result<(), CoreError> {
        if kind == ProviderKind::MultimodalRemote && name == "google" {
            for provider in GoogleFamilyProvider::family(plaintext) {
                let info = provider.info();
                self.add_credential_inner(&info.name, kind, plaintext).await?;
            }
            return Ok(());
        }
        self.add_credential_inner(name, kind, plaintext).await
    }

    /// Clears the credential, tombstones the row, drops the in-memory
    /// instance, and re-elects a default if needed.
    pub async fn remove_credential(&self, name: &str) -> Result<(), CoreError> {
        self.store.delete(name).await?;

        let mut inner = self.inner.write();
        inner.providers.remove(name);
        if inner.default_provider.as_deref() == Some(name) {
            inner.default_provider = inner.providers.keys().next().cloned();
        }

        tracing::info!(provider = %name, "provider credential removed");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        self.inner.read().providers.get(name).cloned()
    }

    pub fn default_provider(&self) -> Option<Arc<dyn ModelProvider>> {
        let inner = self.inner.read();
        inner
            .default_provider
            .as_ref()
            .and_then(|name| inner.providers.get(name))
            .cloned()
    }

    /// Resolves a preferred provider if present and registered; otherwise
    /// falls back to the default active provider.
    pub fn resolve(&self, preferred: Option<&str>) -> Option<Arc<dyn ModelProvider>> {
        if let Some(name) = preferred {
            if let Some(provider) = self.get(name) {
                return Some(provider);
            }
            tracing::warn!(provider = %name, "preferred provider unavailable, falling back to default");
        }
        self.default_provider()
    }

    /// All live (non-deactivated) provider instances.
    pub fn list_active(&self) -> Vec<ProviderView> {
        let inner = self.inner.read();
        inner
            .providers
            .iter()
            .map(|(name, provider)| {
                let info = provider.info();
                ProviderView {
                    name: name.clone(),
                    kind: info.kind,
                    model: Some(info.model),
                    active: true,
                    is_default: inner.default_provider.as_deref() == Some(name.as_str()),
                    supports_vision: info.supports_vision,
                }
            })
            .collect()
    }

    /// Alias for `list_active`, matching the short accessor name surfaced
    /// by the Admin API's `list_providers` endpoint.
    pub fn list(&self) -> Vec<ProviderView> {
        self.list_active()
    }

    /// Every registry row, including deactivated ones, so an administrator
    /// can see what is available to reactivate. Unlike `list`, this reads
    /// through to the durable store rather than the in-memory map.
    pub async fn list_all(&self) -> Result<Vec<ProviderView>, CoreError> {
        let inner = self.inner.read();
        let records = self.store.list().await?;
        Ok(records
            .into_iter()
            .map(|record| ProviderView {
                model: record.config.get("model").and_then(Value::as_str).map(str::to_string),
                is_default: inner.default_provider.as_deref() == Some(record.name.as_str()),
                active: !record.deactivated && inner.providers.contains_key(&record.name),
                name: record.name,
                kind: record.kind,
                supports_vision: matches!(record.kind, ProviderKind::MultimodalRemote),
            })
            .collect())
    }

    /// Toggles the administrator tombstone without touching the stored
    /// credential: setting `flag=true` drops the live instance immediately;
    /// `flag=false` rebuilds it from the still-encrypted credential if one
    /// is present.
    pub async fn set_deactivated(&self, name: &str, flag: bool) -> Result<(), CoreError> {
        let mut record = self
            .store
            .get(name)
            .await?
            .ok_or_else(|| CoreError::Store(format!("unknown provider: {name}")))?;

        record.deactivated = flag;
        record.updated_at = Utc::now();
        self.store.upsert(record.clone()).await?;

        let mut inner = self.inner.write();
        if flag {
            inner.providers.remove(name);
            if inner.default_provider.as_deref() == Some(name) {
                inner.default_provider = inner.providers.keys().next().cloned();
            }
        } else if let Some(provider) = self.build_provider(&record) {
            inner.providers.insert(name.to_string(), provider);
            if inner.default_provider.is_none() {
                inner.default_provider = Some(name.to_string());
            }
        }

        tracing::info!(provider = %name, deactivated = flag, "provider deactivation flag updated");
        Ok(())
    }
}

impl<S: ProviderStore, C: CredentialCipher> ProviderResolver for ProviderRegistry<S, C> {
    fn resolve(&self, preferred: Option<&str>) -> Option<Arc<dyn ModelProvider>> {
        ProviderRegistry::resolve(self, preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;

    #[derive(Default)]
    struct MockProviderStore {
        rows: SyncMutex<HashMap<String, ProviderRecord>>,
    }

    #[async_trait]
    impl ProviderStore for MockProviderStore {
        async fn upsert(&self, record: ProviderRecord) -> Result<(), CoreError> {
            self.rows.lock().insert(record.name.clone(), record);
            Ok(())
        }
        async fn get(&self, name: &str) -> Result<Option<ProviderRecord>, CoreError> {
            Ok(self.rows.lock().get(name).cloned())
        }
        async fn list(&self) -> Result<Vec<ProviderRecord>, CoreError> {
            Ok(self.rows.lock().values().cloned().collect())
        }
        async fn delete(&self, name: &str) -> Result<(), CoreError> {
            if let Some(row) = self.rows.lock().get_mut(name) {
                row.encrypted_credential = None;
                row.active = false;
                row.deactivated = true;
            }
            Ok(())
        }
    }

    struct PassthroughCipher;
    impl CredentialCipher for PassthroughCipher {
        fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
            plaintext.to_vec()
        }
        fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
            ciphertext.to_vec()
        }
        fn is_encrypting(&self) -> bool {
            false
        }
    }

    /// Mimics `AesGcmCipher::decrypt` returning an empty `Vec` on failure.
    struct FailingCipher;
    impl CredentialCipher for FailingCipher {
        fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
            plaintext.to_vec()
        }
        fn decrypt(&self, _ciphertext: &[u8]) -> Vec<u8> {
            Vec::new()
        }
        fn is_encrypting(&self) -> bool {
            true
        }
    }

    fn registry() -> ProviderRegistry<MockProviderStore, PassthroughCipher> {
        ProviderRegistry::new(MockProviderStore::default(), PassthroughCipher)
    }

    #[tokio::test]
    async fn bootstrap_key_survives_when_no_row_exists() {
        let reg = registry();
        let mut key = Some("sk-test".to_string());
        reg.bootstrap_from_config("openai", ProviderKind::TextRemote, &mut key)
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn bootstrap_key_cleared_when_row_already_usable() {
        let reg = registry();
        reg.add_credential("openai", ProviderKind::TextRemote, "sk-live")
            .await
            .unwrap();

        let mut key = Some("sk-config".to_string());
        reg.bootstrap_from_config("openai", ProviderKind::TextRemote, &mut key)
            .await
            .unwrap();
        assert!(key.is_none());
    }

    #[tokio::test]
    async fn bootstrap_key_cleared_when_row_deactivated() {
        let reg = registry();
        reg.add_credential("openai", ProviderKind::TextRemote, "sk-live")
            .await
            .unwrap();
        reg.remove_credential("openai").await.unwrap();

        let mut key = Some("sk-config".to_string());
        reg.bootstrap_from_config("openai", ProviderKind::TextRemote, &mut key)
            .await
            .unwrap();
        assert!(key.is_none());
    }

    #[tokio::test]
    async fn google_credential_fans_out_to_family() {
        let reg = registry();
        reg.add_credential("google", ProviderKind::MultimodalRemote, "api-key")
            .await
            .unwrap();

        for member in GoogleFamilyProvider::family("api-key") {
            assert!(reg.get(&member.info().name).is_some());
        }
    }

    #[tokio::test]
    async fn bootstrap_google_key_survives_when_no_family_row_exists() {
        let reg = registry();
        let mut key = Some("api-key".to_string());
        reg.bootstrap_from_config("google", ProviderKind::MultimodalRemote, &mut key)
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("api-key"));
    }

    #[tokio::test]
    async fn bootstrap_google_key_cleared_when_family_already_usable() {
        let reg = registry();
        reg.add_credential("google", ProviderKind::MultimodalRemote, "api-key-live")
            .await
            .unwrap();

        let mut key = Some("api-key-config".to_string());
        reg.bootstrap_from_config("google", ProviderKind::MultimodalRemote, &mut key)
            .await
            .unwrap();
        assert!(key.is_none());
    }

    #[tokio::test]
    async fn bootstrap_google_key_not_refanned_out_over_tombstoned_family() {
        let reg = registry();
        reg.add_credential("google", ProviderKind::MultimodalRemote, "api-key-live")
            .await
            .unwrap();

        for member in GoogleFamilyProvider::family("api-key-live") {
            reg.remove_credential(&member.info().name).await.unwrap();
        }

        let mut key = Some("api-key-config".to_string());
        reg.bootstrap_from_config("google", ProviderKind::MultimodalRemote, &mut key)
            .await
            .unwrap();
        assert!(key.is_none());

        // a tombstoned family must stay tombstoned, not get re-fanned out
        for member in GoogleFamilyProvider::family("api-key-live") {
            assert!(reg.get(&member.info().name).is_none());
        }
    }

    #[tokio::test]
    async fn set_deactivated_drops_and_restores_live_instance() {
        let reg = registry();
        reg.add_credential("openai", ProviderKind::TextRemote, "sk-live")
            .await
            .unwrap();
        assert!(reg.get("openai").is_some());

        reg.set_deactivated("openai", true).await.unwrap();
        assert!(reg.get("openai").is_none());

        reg.set_deactivated("openai", false).await.unwrap();
        assert!(reg.get("openai").is_some());
    }

    #[tokio::test]
    async fn startup_load_skips_provider_with_failed_decrypt() {
        let store = MockProviderStore::default();
        let mut record = ProviderRecord::new("openai", ProviderKind::TextRemote);
        record.encrypted_credential = Some(vec![1, 2, 3]);
        record.active = true;
        store.upsert(record).await.unwrap();

        let reg = ProviderRegistry::new(store, FailingCipher);
        reg.startup_load().await.unwrap();

        assert!(reg.get("openai").is_none());
    }

    #[tokio::test]
    async fn remove_credential_elects_new_default() {
        let reg = registry();
        reg.add_credential("openai", ProviderKind::TextRemote, "sk-1")
            .await
            .unwrap();
        reg.add_credential("anthropic", ProviderKind::TextRemote, "sk-2")
            .await
            .unwrap();

        reg.remove_credential("openai").await.unwrap();
        assert!(reg.default_provider().is_some());
        assert!(reg.get("openai").is_none());
    }
}
