//! Per-turn orchestration (C7).
//!
//! A keyed-mutex pool serializes per-session state transitions while
//! distinct sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediation_core::{
    ComprehensionLabel, ConversationStateStore, Error, GenerationOptions, MessageTurnRequest,
    ModePromptOverrideStore, ProviderResolver, Strategy, StrategyOutcome, TeacherNotificationSink,
    TurnResult,
};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use crate::classifier::ComprehensionClassifier;
use crate::prompt_catalog::{PromptCatalog, TemplateVariables};
use crate::router::StrategyRouter;
use crate::state_service::ConversationStateService;

const GENERATION_DEADLINE_SECS: u64 = 180;
const LOCK_TIMEOUT_SECS: u64 = 30;
const INACTIVITY_WINDOW_SECS: u64 = 300;

/// Bounded pool of per-session locks. Sessions
/// are never removed proactively; the pool grows with distinct sessions but
/// each entry is a cheap `Arc<Mutex<()>>`.
#[derive(Default)]
struct SessionLocks {
    locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    fn handle(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

pub struct MediationEngine<CS, MP, NS, R>
where
    CS: ConversationStateStore,
    MP: ModePromptOverrideStore,
    NS: TeacherNotificationSink + 'static,
    R: ProviderResolver,
{
    state: ConversationStateService<CS>,
    mode_overrides: MP,
    notifications: Arc<NS>,
    providers: Arc<R>,
    classifier: ComprehensionClassifier,
    router: StrategyRouter,
    catalog: PromptCatalog,
    locks: SessionLocks,
}

impl<CS, MP, NS, R> MediationEngine<CS, MP, NS, R>
where
    CS: ConversationStateStore,
    MP: ModePromptOverrideStore,
    NS: TeacherNotificationSink + 'static,
    R: ProviderResolver + 'static,
{
    /// `providers` is taken as a pre-shared `Arc` so a caller (the server's
    /// `AppState`) can keep its own handle to the same registry for admin
    /// operations (credential add/remove, deactivate, list) alongside the
    /// one the engine dispatches turns through.
    pub fn new(state_store: CS, mode_overrides: MP, notifications: NS, providers: Arc<R>) -> Self {
        Self {
            state: ConversationStateService::new(state_store),
            mode_overrides,
            notifications: Arc::new(notifications),
            providers,
            classifier: ComprehensionClassifier::new(),
            router: StrategyRouter::new(),
            catalog: PromptCatalog::new(),
            locks: SessionLocks::default(),
        }
    }

    /// Runs the eleven-step per-turn procedure. Never returns an error for
    /// provider or OCR failure — only for durable-store failure or invalid
    /// input.
    pub async fn message_turn(&self, request: MessageTurnRequest) -> Result<TurnResult, Error> {
        if request.session_id.is_empty() {
            return Err(Error::InvalidInput("session_id must not be empty".to_string()));
        }

        let lock = self.locks.handle(&request.session_id);
        let _guard = timeout(Duration::from_secs(LOCK_TIMEOUT_SECS), lock.lock())
            .await
            .map_err(|_| Error::Store(format!("lock timeout for session {}", request.session_id)))?;

        self.run_turn(request).await
    }

    async fn run_turn(&self, request: MessageTurnRequest) -> Result<TurnResult, Error> {
        let now = Utc::now();

        // Step 1: load/create state, apply begin_turn reset rule.
        let mut state = self.state.get_or_create(&request.session_id).await?;
        state.begin_turn(&request.instruction, now);

        // Step 2: classify.
        let comprehension = self.classifier.classify(&request.utterance);

        // Step 3: greeting shortcut — no model call, no recorded attempt.
        // `classify` returns `Initial` exactly for an empty or pure-greeting
        // utterance, so that alone is the condition.
        if comprehension == ComprehensionLabel::Initial {
            self.state.save(&state).await?;
            return Ok(TurnResult {
                response_text: self.catalog.greeting().to_string(),
                strategy_used: StrategyOutcome::InitialGreeting,
                comprehension_level: comprehension,
                attempt_count: state.attempt_count,
            });
        }

        // Step 4: route.
        let failed = state.failed_set();
        let strategy = self
            .router
            .route(comprehension, &failed, request.mode, request.assistance_type);

        // Step 5: terminal escalation — no model call.
        if strategy == Strategy::TeacherEscalation {
            state.record(StrategyOutcome::Strategy(strategy), comprehension, now);
            self.state.save(&state).await?;
            self.schedule_inactivity_check(&request.session_id, strategy.as_str());
            return Ok(TurnResult {
                response_text: self.catalog.escalation().to_string(),
                strategy_used: StrategyOutcome::Strategy(strategy),
                comprehension_level: comprehension,
                attempt_count: state.attempt_count,
            });
        }

        // Step 6: emotional fast path.
        if strategy == Strategy::EmotionalSupport {
            if let Some(direct) = self.catalog.direct_emotional_response(&request.utterance) {
                state.record(StrategyOutcome::Strategy(strategy), comprehension, now);
                self.state.save(&state).await?;
                return Ok(TurnResult {
                    response_text: direct.to_string(),
                    strategy_used: StrategyOutcome::Strategy(strategy),
                    comprehension_level: comprehension,
                    attempt_count: state.attempt_count,
                });
            }
        }

        // Step 7: resolve provider, render template.
        let provider = self.providers.resolve(request.preferred_provider.as_deref());

        let mut variables = TemplateVariables {
            instruction: request.instruction.clone(),
            concept: None,
        };
        if strategy == Strategy::ProvideExample {
            variables.concept = Some(self.catalog.concept_for(&request.instruction).to_string());
        }

        // Step 8: per-mode generation overrides.
        let override_row = self.mode_overrides.latest_for_mode(request.mode).await?;
        let (system_prefix, options) = match &override_row {
            Some(o) => (
                Some(o.system_prompt.as_str()),
                GenerationOptions {
                    temperature: o.temperature,
                    max_tokens: o.max_tokens,
                    timeout_secs: GENERATION_DEADLINE_SECS,
                },
            ),
            None => (
                None,
                GenerationOptions {
                    temperature: 0.7,
                    max_tokens: 2048,
                    timeout_secs: GENERATION_DEADLINE_SECS,
                },
            ),
        };

        // Step 9: generate, falling back to the strategy's fixed text on any
        // adapter error or missing provider. `used_fallback` tracks whether
        // the fixed text was substituted, independent of which strategy was
        // actually routed and recorded into session state.
        let mut used_fallback = false;
        let response_text = match (provider, self.catalog.render(strategy, &variables, system_prefix)) {
            (Some(provider), Ok(prompt)) => {
                match timeout(
                    Duration::from_secs(GENERATION_DEADLINE_SECS),
                    provider.generate_text(&prompt, &options),
                )
                .await
                {
                    Ok(Ok((text, _usage))) => text,
                    Ok(Err(err)) => {
                        tracing::warn!(session_id = %request.session_id, strategy = strategy.as_str(), error = %err, "provider call failed, substituting fallback text");
                        used_fallback = true;
                        self.catalog.fallback_for(strategy).to_string()
                    }
                    Err(_) => {
                        tracing::warn!(session_id = %request.session_id, strategy = strategy.as_str(), "provider call exceeded deadline, substituting fallback text");
                        used_fallback = true;
                        self.catalog.fallback_for(strategy).to_string()
                    }
                }
            }
            (None, _) => {
                tracing::warn!(session_id = %request.session_id, "no active provider available, substituting fallback text");
                used_fallback = true;
                self.catalog.fallback_for(strategy).to_string()
            }
            (Some(_), Err(err)) => {
                tracing::warn!(session_id = %request.session_id, strategy = strategy.as_str(), error = %err, "template rendering failed, substituting fallback text");
                used_fallback = true;
                self.catalog.fallback_for(strategy).to_string()
            }
        };

        // Step 10: record the real routed strategy (runs regardless of
        // success/fallback) — independent of what is reported below.
        state.record(StrategyOutcome::Strategy(strategy), comprehension, now);
        self.state.save(&state).await?;

        let strategy_used = if used_fallback {
            StrategyOutcome::ErrorFallback
        } else {
            StrategyOutcome::Strategy(strategy)
        };

        Ok(TurnResult {
            response_text,
            strategy_used,
            comprehension_level: comprehension,
            attempt_count: state.attempt_count,
        })
    }

    pub async fn end_session(&self, session_id: &str) -> Result<(), Error> {
        self.state.drop_session(session_id).await
    }

    /// Exposes the provider resolver for collaborators that need to dispatch
    /// directly, such as `ImageIngestPipeline`'s vision call.
    pub fn providers(&self) -> &R {
        self.providers.as_ref()
    }

    /// Schedules the deferred background inactivity check. Fires once
    /// after the fixed window; the
    /// notification sink's own idempotency check protects against duplicate
    /// notifications if the process is restarted in between.
    fn schedule_inactivity_check(&self, session_id: &str, last_strategy: &str) {
        let sink = Arc::clone(&self.notifications);
        let session_id = session_id.to_string();
        let last_strategy = last_strategy.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(INACTIVITY_WINDOW_SECS)).await;
            if let Err(err) = sink.notify_inactivity(&session_id, &last_strategy).await {
                tracing::warn!(session_id = %session_id, error = %err, "failed to emit teacher inactivity notification");
            }
        });
    }
}
