//! Thin ingress error taxonomy, mapped to `axum::http::StatusCode`.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("core engine error: {0}")]
    Engine(#[from] mediation_core::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status: StatusCode = (&self).into();
        let body = axum::Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::Engine(mediation_core::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServerError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        }
    }
}
