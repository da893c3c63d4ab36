//! wabridge-server – Bibliotheks-Root
//!
//! Stellt den Router fuer `/flow` und `/media` sowie den Server-Einstiegspunkt
//! bereit. Der Router ist ohne Netzwerk testbar.

pub mod config;
pub mod flow;
pub mod logging;
pub mod media;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;
use wabridge_crypto::FlowCipher;
use wabridge_media::{ArtifactOptions, HttpTransport, MediaTransport};

use config::AppConfig;
use flow::{FlowHandler, StandardFlowHandler};

/// Axum-State fuer alle Endpunkte
#[derive(Clone)]
pub struct AppState {
    pub cipher: FlowCipher,
    pub flow_handler: Arc<dyn FlowHandler>,
    pub transport: Arc<dyn MediaTransport>,
    pub artifacts: Arc<ArtifactOptions>,
}

impl AppState {
    pub fn neu(
        cipher: FlowCipher,
        flow_handler: Arc<dyn FlowHandler>,
        transport: Arc<dyn MediaTransport>,
        artifacts: ArtifactOptions,
    ) -> Self {
        Self {
            cipher,
            flow_handler,
            transport,
            artifacts: Arc::new(artifacts),
        }
    }
}

/// Jeder Request laeuft in einem eigenen Span mit frischer Request-ID
async fn anfrage_span(req: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "anfrage",
        request_id = %Uuid::new_v4(),
        methode = %req.method(),
        pfad = %req.uri().path(),
    );
    next.run(req).instrument(span).await
}

/// Erstellt den vollstaendigen Router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/flow", post(flow::post_flow))
        .route("/media", post(media::post_media))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(anfrage_span))
        .with_state(state)
}

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: AppConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: AppConfig) -> Self {
        Self { config }
    }

    /// Laedt den Schluessel, baut den Router und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let passphrase = self.config.passphrase();
        let cipher = FlowCipher::from_pem_file(
            &self.config.flow.private_key_pfad,
            passphrase.as_deref(),
        )
        .with_context(|| {
            format!(
                "Privater Schluessel '{}' nicht ladbar",
                self.config.flow.private_key_pfad.display()
            )
        })?;

        let transport = HttpTransport::neu(self.config.download_timeout())
            .context("HTTP-Transport nicht erstellbar")?;

        let artifacts = self.config.artifact_optionen();
        tokio::fs::create_dir_all(&artifacts.verzeichnis)
            .await
            .with_context(|| {
                format!(
                    "Ausgabeverzeichnis '{}' nicht anlegbar",
                    artifacts.verzeichnis.display()
                )
            })?;

        let state = AppState::neu(
            cipher,
            Arc::new(StandardFlowHandler),
            Arc::new(transport),
            artifacts,
        );
        let app = router(state);

        let adresse = self.config.bind_adresse();
        let listener = tokio::net::TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Bind auf {adresse} fehlgeschlagen"))?;

        tracing::info!(
            adresse = %adresse,
            ausgabe = %self.config.media.ausgabe_verzeichnis.display(),
            debug_mode = self.config.media.debug_mode,
            "Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)..."
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            })
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
