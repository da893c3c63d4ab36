//! Unsichere Diagnose-Operationen
//!
//! Nur ueber [`MediaPipeline::dangerous`] erreichbar. Ergebnisse dieser
//! Operationen sind weder integritaetsgeprueft noch authentifiziert und
//! duerfen nicht wie verifizierter Inhalt behandelt werden.

use std::path::{Path, PathBuf};

use crate::artifacts::{ArtifactKind, ArtifactScope};
use crate::error::MediaResult;
use crate::pipeline::{
    ausgabe_schreiben, blob_aufteilen, cbc_entschluesseln, MediaPipeline, PipelineResult,
};

/// Zugriff auf die Pipeline ohne Hash- und HMAC-Pruefungen
#[derive(Debug)]
pub struct DangerousMediaPipeline<'a> {
    pipeline: &'a MediaPipeline,
}

impl<'a> DangerousMediaPipeline<'a> {
    pub(crate) fn neu(pipeline: &'a MediaPipeline) -> Self {
        Self { pipeline }
    }

    /// Download -> letzte 10 Bytes abschneiden -> entschluesseln -> schreiben
    ///
    /// Ueberspringt beide Hash-Pruefungen und die HMAC-Pruefung.
    #[tracing::instrument(
        name = "media_bypass",
        skip_all,
        fields(media_id = %self.pipeline.descriptor().media_id)
    )]
    pub async fn bypass_verifications(&self, ausgabe: Option<&Path>) -> PipelineResult<PathBuf> {
        tracing::warn!("Verifikation wird umgangen: Inhalt ist NICHT authentifiziert");

        let ziel = match self.pipeline.ausgabe_pfad(ausgabe) {
            Ok(ziel) => ziel,
            Err(e) => return PipelineResult::Failure(e),
        };
        let mut scope = match self.pipeline.scope_oeffnen() {
            Ok(scope) => scope,
            Err(e) => return PipelineResult::Failure(e),
        };

        match self.ungeprueft_schreiben(&mut scope, &ziel).await {
            Ok(()) => {
                scope.erfolg();
                tracing::warn!(pfad = %ziel.display(), "Ungeprueftes Medium gespeichert");
                PipelineResult::Success(ziel)
            }
            Err(e) => {
                tracing::warn!(grund = e.reason(), fehler = %e, "Ungepruefter Lauf fehlgeschlagen");
                PipelineResult::Failure(e)
            }
        }
    }

    async fn ungeprueft_schreiben(
        &self,
        scope: &mut ArtifactScope<'_>,
        ziel: &Path,
    ) -> MediaResult<()> {
        let blob = self.pipeline.herunterladen().await?;
        scope.schreiben(ArtifactKind::Roh, &blob).await?;
        let (ciphertext, _tag) = blob_aufteilen(&blob)?;
        let klartext = cbc_entschluesseln(self.pipeline.keys(), ciphertext)?;
        ausgabe_schreiben(ziel, &klartext).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
