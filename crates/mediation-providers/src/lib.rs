//! Model provider adapters and the provider registry (C5, C6).
//!
//! `mediation-core` defines the `ModelProvider` seam; this crate supplies
//! the concrete adapters (`OllamaProvider` for a local credential-free
//! backend, `TextRemoteProvider` for OpenAI/Anthropic/Cohere, and
//! `GoogleFamilyProvider` for Gemini's multimodal family) plus the
//! `ProviderRegistry` that owns their lifecycle and startup/bootstrap
//! precedence.

pub mod error;
pub mod google;
pub mod ocr;
pub mod ollama;
pub mod registry;
pub mod text_remote;

pub use google::{provider_key_for_model, GoogleFamilyProvider, FAMILY_MODELS};
pub use ocr::TesseractOcrService;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use registry::ProviderRegistry;
pub use text_remote::{TextRemoteProvider, TextRemoteVendor};
