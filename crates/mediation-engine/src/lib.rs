//! Pedagogical mediation logic: comprehension classification, strategy
//! routing, prompt rendering, per-turn orchestration and the
//! vision/OCR image pipeline.
//!
//! This crate owns everything pure (C1-C3) plus the stateful orchestrator
//! (C4, C7, C8) that ties them to the egress traits defined in
//! `mediation-core`. It never talks to a concrete store or provider
//! implementation directly — those are supplied by the caller as generic
//! parameters, keeping orchestration logic separate from its collaborators.

pub mod classifier;
pub mod engine;
pub mod error;
pub mod image_pipeline;
pub mod prompt_catalog;
pub mod router;
pub mod state_service;

pub use classifier::ComprehensionClassifier;
pub use engine::MediationEngine;
pub use error::{ClassifierError, EngineError, RouterError};
pub use image_pipeline::ImageIngestPipeline;
pub use prompt_catalog::{fallback_table, PromptCatalog, TemplateVariables};
pub use router::StrategyRouter;
pub use state_service::ConversationStateService;
