//! Core traits and types for the mediation engine.
//!
//! This crate provides the foundational domain vocabulary shared across
//! `mediation-store`, `mediation-providers`, `mediation-engine` and
//! `mediation-server`:
//! - The fixed strategy/comprehension/mode vocabulary (C3's data model).
//! - Per-session conversation state and its transition rules (C4).
//! - The provider registry's durable record shape (C5).
//! - The egress trait surface every collaborator implements (C6, stores,
//!   encryption, OCR).
//! - The error taxonomy and turn request/response shapes.

pub mod error;
pub mod provider;
pub mod state;
pub mod strategy;
pub mod traits;
pub mod turn;

pub use error::{Error, OcrError, ProviderError, Result, TemplateError};
pub use provider::{ModePromptOverride, ProviderKind, ProviderRecord, ProviderView};
pub use state::ConversationState;
pub use strategy::{AssistanceType, ComprehensionLabel, Mode, Strategy, StrategyOutcome};
pub use traits::{
    ConversationStateStore, CredentialCipher, GenerationOptions, GenerationUsage, ModelProvider,
    ModePromptOverrideStore, OcrService, ProviderInfo, ProviderResolver, ProviderStore,
    TeacherNotificationSink,
};
pub use turn::{
    ImageIngestMethod, ImageTurnRequest, ImageTurnResult, MessageTurnRequest, TurnResult,
};
