//! Thin ingress crate: an axum router exposing the Turn API and the
//! provider Admin API over the mediation engine.

pub mod error;
pub mod http;
pub mod state;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;
