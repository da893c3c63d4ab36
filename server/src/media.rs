//! POST /media – Medien herunterladen, verifizieren und speichern

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use wabridge_media::{MediaDescriptor, MediaError, MediaPipeline, PipelineResult};

use crate::AppState;

fn fehler_antwort(e: &MediaError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": e.reason() })),
    )
        .into_response()
}

/// POST /media
pub async fn post_media(
    State(state): State<AppState>,
    Json(descriptor): Json<MediaDescriptor>,
) -> Response {
    let pipeline = match MediaPipeline::new(
        descriptor,
        state.transport.clone(),
        state.artifacts.as_ref().clone(),
    ) {
        Ok(p) => p,
        Err(e) => return fehler_antwort(&e),
    };

    // Ziel: <ausgabe_verzeichnis>/<bereinigter file_name>
    match pipeline.save(None).await {
        PipelineResult::Success(pfad) => (
            StatusCode::OK,
            Json(json!({ "pfad": pfad.display().to_string() })),
        )
            .into_response(),
        PipelineResult::Failure(e) => fehler_antwort(&e),
    }
}
