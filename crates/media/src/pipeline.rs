//! Verifizierte Medien-Pipeline
//!
//! ## Ablauf
//! 1. Download vom CDN
//! 2. SHA-256 des rohen Blobs gegen `encrypted_hash`
//! 3. Blob aufteilen: `[ciphertext][hmac10]`
//! 4. HMAC-SHA256(hmac_key, iv || ciphertext)[..10] gegen `hmac10` (konstante Zeit)
//! 5. AES-CBC entschluesseln, PKCS#7-Padding entfernen
//! 6. SHA-256 des Klartexts gegen `plaintext_hash`
//!
//! Jede Stufe startet erst, wenn die vorherige bestanden ist. Der erste
//! Fehler beendet den Lauf. Ciphertext wird nie vor der HMAC-Pruefung
//! entschluesselt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::artifacts::{ArtifactKind, ArtifactOptions, ArtifactScope};
use crate::dangerous::DangerousMediaPipeline;
use crate::descriptor::{MediaDescriptor, MediaKeys, CBC_IV_LAENGE};
use crate::digest::{match_digest, DigestMatch};
use crate::error::{HashStufe, MediaError, MediaResult};
use crate::transport::MediaTransport;

/// Laenge des abgeschnittenen HMAC-Tags am Blob-Ende
pub const HMAC_TAG_LAENGE: usize = 10;

const AES_BLOCK: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// Endergebnis eines Pipeline-Laufs
///
/// Entweder vollstaendiger Erfolg oder ein Fehler, nie ein Teilergebnis.
#[derive(Debug)]
#[must_use]
pub enum PipelineResult<T> {
    Success(T),
    Failure(MediaError),
}

impl<T> PipelineResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Grund des Fehlschlags, `None` bei Erfolg
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e.reason()),
        }
    }

    pub fn into_result(self) -> MediaResult<T> {
        match self {
            Self::Success(wert) => Ok(wert),
            Self::Failure(e) => Err(e),
        }
    }
}

impl<T> From<MediaResult<T>> for PipelineResult<T> {
    fn from(result: MediaResult<T>) -> Self {
        match result {
            Ok(wert) => Self::Success(wert),
            Err(e) => Self::Failure(e),
        }
    }
}

/// Pipeline fuer genau ein Medien-Objekt
pub struct MediaPipeline {
    descriptor: MediaDescriptor,
    keys: MediaKeys,
    transport: Arc<dyn MediaTransport>,
    artifacts: ArtifactOptions,
}

impl std::fmt::Debug for MediaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPipeline")
            .field("descriptor", &self.descriptor)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl MediaPipeline {
    /// Erstellt die Pipeline und dekodiert die Schluessel vorab
    pub fn new(
        descriptor: MediaDescriptor,
        transport: Arc<dyn MediaTransport>,
        artifacts: ArtifactOptions,
    ) -> MediaResult<Self> {
        let keys = descriptor.keys()?;
        Ok(Self {
            descriptor,
            keys,
            transport,
            artifacts,
        })
    }

    pub fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    /// Laedt, prueft und entschluesselt das Medium
    #[tracing::instrument(name = "media_process", skip_all, fields(media_id = %self.descriptor.media_id))]
    pub async fn process(&self) -> PipelineResult<Vec<u8>> {
        let mut scope = match self.scope_oeffnen() {
            Ok(scope) => scope,
            Err(e) => return fehlschlag(e),
        };

        match self.verarbeiten(&mut scope).await {
            Ok(klartext) => {
                scope.erfolg();
                tracing::info!(bytes = klartext.len(), "Medium entschluesselt und verifiziert");
                PipelineResult::Success(klartext)
            }
            Err(e) => fehlschlag(e),
        }
    }

    /// Fuehrt die verifizierte Pipeline aus und schreibt das Ergebnis
    ///
    /// Standard-Ziel ist der (bereinigte) Dateiname aus dem Deskriptor im
    /// konfigurierten Verzeichnis. Bei einem Fehlschlag wird nichts geschrieben.
    #[tracing::instrument(name = "media_save", skip_all, fields(media_id = %self.descriptor.media_id))]
    pub async fn save(&self, ausgabe: Option<&Path>) -> PipelineResult<PathBuf> {
        let ziel = match self.ausgabe_pfad(ausgabe) {
            Ok(ziel) => ziel,
            Err(e) => return fehlschlag(e),
        };
        let mut scope = match self.scope_oeffnen() {
            Ok(scope) => scope,
            Err(e) => return fehlschlag(e),
        };

        let ergebnis = match self.verarbeiten(&mut scope).await {
            Ok(klartext) => ausgabe_schreiben(&ziel, &klartext).await,
            Err(e) => Err(e),
        };

        match ergebnis {
            Ok(()) => {
                scope.erfolg();
                tracing::info!(pfad = %ziel.display(), "Medium gespeichert");
                PipelineResult::Success(ziel)
            }
            Err(e) => fehlschlag(e),
        }
    }

    /// Zugang zu den unsicheren Diagnose-Operationen
    ///
    /// Alles hinter diesem Aufruf liefert **nicht authentifizierten**
    /// Klartext.
    pub fn dangerous(&self) -> DangerousMediaPipeline<'_> {
        DangerousMediaPipeline::neu(self)
    }

    async fn verarbeiten(&self, scope: &mut ArtifactScope<'_>) -> MediaResult<Vec<u8>> {
        let meta = &self.descriptor.encryption_metadata;

        let blob = self.herunterladen().await?;
        scope.schreiben(ArtifactKind::Roh, &blob).await?;

        hash_pruefen(&blob, &meta.encrypted_hash, HashStufe::Verschluesselt)?;

        let (ciphertext, tag) = blob_aufteilen(&blob)?;

        hmac_pruefen(&self.keys, ciphertext, tag)?;
        tracing::debug!("HMAC gueltig");

        let klartext = cbc_entschluesseln(&self.keys, ciphertext)?;
        scope.schreiben(ArtifactKind::Entschluesselt, &klartext).await?;

        hash_pruefen(&klartext, &meta.plaintext_hash, HashStufe::Klartext)?;
        Ok(klartext)
    }

    /// Der Dateiname wird nur geprueft, wenn Artefakte geschrieben werden
    pub(crate) fn scope_oeffnen(&self) -> MediaResult<ArtifactScope<'_>> {
        let basis_name = if self.artifacts.debug_mode {
            Some(self.descriptor.safe_file_name()?)
        } else {
            None
        };
        Ok(ArtifactScope::neu(&self.artifacts, basis_name))
    }

    /// Explizites Ziel oder `<verzeichnis>/<file_name>`
    pub(crate) fn ausgabe_pfad(&self, ausgabe: Option<&Path>) -> MediaResult<PathBuf> {
        match ausgabe {
            Some(pfad) => Ok(pfad.to_path_buf()),
            None => Ok(self
                .artifacts
                .verzeichnis
                .join(self.descriptor.safe_file_name()?)),
        }
    }

    pub(crate) async fn herunterladen(&self) -> MediaResult<bytes::Bytes> {
        let blob = self.transport.download(&self.descriptor.cdn_url).await?;
        tracing::debug!(bytes = blob.len(), "Blob heruntergeladen");
        Ok(blob)
    }

    pub(crate) fn keys(&self) -> &MediaKeys {
        &self.keys
    }
}

fn fehlschlag<T>(e: MediaError) -> PipelineResult<T> {
    tracing::warn!(grund = e.reason(), fehler = %e, "Medien-Pipeline fehlgeschlagen");
    PipelineResult::Failure(e)
}

/// Schreibt die Ausgabedatei; eine halb geschriebene Datei wird entfernt
pub(crate) async fn ausgabe_schreiben(ziel: &Path, inhalt: &[u8]) -> MediaResult<()> {
    if let Err(e) = tokio::fs::write(ziel, inhalt).await {
        let _ = tokio::fs::remove_file(ziel).await;
        return Err(e.into());
    }
    Ok(())
}

fn hash_pruefen(data: &[u8], erwartet: &str, stufe: HashStufe) -> MediaResult<()> {
    match match_digest(data, erwartet) {
        DigestMatch::Hex | DigestMatch::Base64 => {
            tracing::debug!(?stufe, "Hash gueltig");
            Ok(())
        }
        DigestMatch::Mismatch(ausgang) => {
            tracing::debug!(?stufe, ?ausgang, "Hash abweichend");
            Err(MediaError::Integritaet { stufe })
        }
    }
}

/// Trennt `[ciphertext][hmac10]`
pub(crate) fn blob_aufteilen(blob: &[u8]) -> MediaResult<(&[u8], &[u8])> {
    if blob.len() <= HMAC_TAG_LAENGE {
        return Err(MediaError::BlobZuKurz { laenge: blob.len() });
    }
    Ok(blob.split_at(blob.len() - HMAC_TAG_LAENGE))
}

/// Vergleicht die ersten 10 Bytes von HMAC-SHA256(iv || ciphertext) in konstanter Zeit
fn hmac_pruefen(keys: &MediaKeys, ciphertext: &[u8], tag: &[u8]) -> MediaResult<()> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(keys.hmac_key.as_bytes())
        .map_err(|_| MediaError::HmacUngueltig)?;
    mac.update(&keys.iv);
    mac.update(ciphertext);
    mac.verify_truncated_left(tag)
        .map_err(|_| MediaError::HmacUngueltig)
}

/// AES-CBC + PKCS#7; Fehler ohne Details
pub(crate) fn cbc_entschluesseln(keys: &MediaKeys, ciphertext: &[u8]) -> MediaResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK != 0 {
        return Err(MediaError::Entschluesselung);
    }

    let key = keys.encryption_key.as_bytes();
    let iv: &[u8; CBC_IV_LAENGE] = &keys.iv;

    let ergebnis = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| MediaError::Entschluesselung)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| MediaError::Entschluesselung)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| MediaError::Entschluesselung)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        n => {
            return Err(MediaError::Dekodierung(format!(
                "encryption_key: {n} Bytes (erlaubt: 16, 24, 32)"
            )))
        }
    };

    ergebnis.map_err(|_| MediaError::Entschluesselung)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
