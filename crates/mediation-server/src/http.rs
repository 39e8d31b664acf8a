//! Turn API and Admin API endpoints.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use base64::Engine;
use mediation_core::{
    AssistanceType, ImageTurnRequest, ImageTurnResult, MessageTurnRequest, Mode, ProviderKind,
    ProviderView, TurnResult,
};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/turns/message", post(message_turn))
        .route("/api/turns/image", post(image_turn))
        .route("/api/sessions/:session_id", delete(end_session))
        .route("/admin/providers", get(list_providers))
        .route("/admin/providers/:name/credential", post(add_provider_credential))
        .route("/admin/providers/:name/credential", delete(remove_provider_credential))
        .route("/admin/providers/:name/deactivate", post(deactivate_provider))
        .route("/admin/mode-overrides/:mode", post(set_mode_prompt_override))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct MessageTurnBody {
    session_id: String,
    instruction: String,
    utterance: String,
    mode: Mode,
    assistance_type: Option<AssistanceType>,
    preferred_provider: Option<String>,
}

async fn message_turn(
    State(state): State<AppState>,
    Json(body): Json<MessageTurnBody>,
) -> Result<Json<TurnResult>, ServerError> {
    let request = MessageTurnRequest {
        session_id: body.session_id,
        instruction: body.instruction,
        utterance: body.utterance,
        mode: body.mode,
        assistance_type: body.assistance_type,
        preferred_provider: body.preferred_provider,
    };
    let result = state.engine.message_turn(request).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct ImageTurnBody {
    session_id: String,
    /// Base64-encoded image bytes (base64-in-JSON keeps the request body
    /// a single JSON document for binary payloads).
    images: Vec<String>,
    caption: Option<String>,
    mode: Mode,
    preferred_provider: Option<String>,
}

async fn image_turn(
    State(state): State<AppState>,
    Json(body): Json<ImageTurnBody>,
) -> Result<Json<ImageTurnResult>, ServerError> {
    let images = body
        .images
        .iter()
        .map(|encoded| {
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| ServerError::InvalidRequest(format!("invalid base64 image: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let request = ImageTurnRequest {
        session_id: body.session_id,
        images,
        caption: body.caption,
        mode: body.mode,
        preferred_provider: body.preferred_provider,
    };
    let result = state.images.image_turn(request).await?;
    Ok(Json(result))
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.end_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProviderView>>, ServerError> {
    let views = state
        .providers
        .list_all()
        .await
        .map_err(ServerError::Engine)?;
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
struct AddCredentialBody {
    plaintext: String,
    kind: ProviderKind,
}

async fn add_provider_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<AddCredentialBody>,
) -> Result<StatusCode, ServerError> {
    state
        .providers
        .add_credential(&name, body.kind, &body.plaintext)
        .await
        .map_err(ServerError::Engine)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_provider_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .providers
        .remove_credential(&name)
        .await
        .map_err(ServerError::Engine)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct DeactivateBody {
    flag: bool,
}

async fn deactivate_provider(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<DeactivateBody>,
) -> Result<StatusCode, ServerError> {
    state
        .providers
        .set_deactivated(&name, body.flag)
        .await
        .map_err(ServerError::Engine)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ModeOverrideBody {
    system_prompt: String,
    temperature: f64,
    max_tokens: i32,
}

async fn set_mode_prompt_override(
    State(state): State<AppState>,
    Path(mode): Path<Mode>,
    Json(body): Json<ModeOverrideBody>,
) -> Result<StatusCode, ServerError> {
    state
        .mode_overrides
        .set_override(mode, &body.system_prompt, body.temperature, body.max_tokens)
        .await
        .map_err(ServerError::Engine)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_turn_body_deserializes_base64_list() {
        let json = r#"{"session_id":"s1","images":["aGVsbG8="],"mode":"practice"}"#;
        let body: ImageTurnBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.images.len(), 1);
    }
}
