//! Core error taxonomy.
//!
//! Turn operations never propagate `ProviderError`/`OcrFailure` to the
//! caller — the engine degrades to fallback text instead. Those variants
//! exist so adapters and the pipeline have a typed vocabulary to report
//! through, not because callers of `message_turn`/`image_turn` ever see
//! them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider authentication failed")]
    AuthFailed,
    #[error("provider rate limited the request")]
    RateLimited,
    #[error("provider upstream error: {0}")]
    Upstream(String),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("missing template variable: {0}")]
    MissingVariable(String),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR could not recover any text from the image")]
    NoTextRecovered,
    #[error("OCR backend unavailable")]
    BackendUnavailable,
}

/// Aggregate error type surfaced by public engine operations. Only
/// `Store` and `InvalidInput` are ever returned by `message_turn`/
/// `image_turn` — everything else is absorbed internally into a fallback
/// `TurnResult`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("state store error: {0}")]
    Store(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("no active provider is available")]
    ProviderUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
