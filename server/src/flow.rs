//! POST /flow – verschluesselte Flow-Requests
//!
//! Entschluesselungsfehler werden mit 421 beantwortet. Die Plattform laedt
//! daraufhin den oeffentlichen Schluessel neu und wiederholt den Request.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use thiserror::Error;
use wabridge_crypto::{DecryptedRequest, FlowEnvelope};

use crate::AppState;

/// Fehler eines Flow-Handlers
#[derive(Debug, Error)]
pub enum FlowHandlerError {
    #[error("unbekannte Aktion: {0}")]
    UnbekannteAktion(String),

    #[error("ungueltige Anfrage: {0}")]
    UngueltigeAnfrage(String),

    #[error("interner Fehler: {0}")]
    Intern(String),
}

/// Anwendungslogik fuer entschluesselte Flow-Requests
#[async_trait]
pub trait FlowHandler: Send + Sync {
    /// Liefert die (noch unverschluesselte) Antwort auf den Request
    async fn behandeln(&self, anfrage: &DecryptedRequest) -> Result<Value, FlowHandlerError>;
}

/// Beantwortet Health-Checks und Fehler-Benachrichtigungen der Plattform
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFlowHandler;

#[async_trait]
impl FlowHandler for StandardFlowHandler {
    async fn behandeln(&self, anfrage: &DecryptedRequest) -> Result<Value, FlowHandlerError> {
        let payload = &anfrage.payload;
        let aktion = payload.get("action").and_then(Value::as_str);

        if aktion == Some("ping") {
            return Ok(json!({ "data": { "status": "active" } }));
        }

        if let Some(fehler) = payload.get("data").and_then(|d| d.get("error")) {
            tracing::warn!(fehler = %fehler, "Fehler-Benachrichtigung der Plattform");
            return Ok(json!({ "data": { "acknowledged": true } }));
        }

        match aktion {
            Some(a) => Err(FlowHandlerError::UnbekannteAktion(a.to_string())),
            None => Err(FlowHandlerError::UngueltigeAnfrage("Feld 'action' fehlt".into())),
        }
    }
}

/// POST /flow
pub async fn post_flow(
    State(state): State<AppState>,
    Json(envelope): Json<FlowEnvelope>,
) -> Response {
    let anfrage = match state.cipher.decrypt_envelope(&envelope) {
        Ok(a) => a,
        Err(e) if e.ist_entschluesselungsfehler() => {
            tracing::warn!(fehler = %e, "Flow-Request nicht entschluesselbar");
            return StatusCode::MISDIRECTED_REQUEST.into_response();
        }
        Err(e) => {
            tracing::warn!(fehler = %e, "Flow-Request ungueltig");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid flow payload" })),
            )
                .into_response();
        }
    };

    let antwort = match state.flow_handler.behandeln(&anfrage).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(fehler = %e, "Flow-Handler fehlgeschlagen");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.cipher.encrypt_response(&antwort, &anfrage.session) {
        Ok(b64) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            b64,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(fehler = %e, "Flow-Antwort nicht verschluesselbar");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
