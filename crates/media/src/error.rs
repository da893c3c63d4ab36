//! Fehlertypen fuer die Medien-Pipeline
//!
//! Die Reason-Strings (`reason()`) sind Teil der oeffentlichen API und
//! bleiben stabil. Entschluesselungsfehler tragen keine Details
//! (kein Padding-Orakel).

use thiserror::Error;

/// Welche Hash-Pruefung fehlgeschlagen ist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStufe {
    /// SHA-256 ueber den rohen CDN-Blob (vor der Entschluesselung)
    Verschluesselt,
    /// SHA-256 ueber den entschluesselten Inhalt
    Klartext,
}

impl std::fmt::Display for HashStufe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verschluesselt => f.write_str("encrypted"),
            Self::Klartext => f.write_str("plaintext"),
        }
    }
}

/// Fehler der Medien-Pipeline
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download error: {0}")]
    Download(String),

    #[error("{stufe} hash verification failed")]
    Integritaet { stufe: HashStufe },

    #[error("media blob too short: {laenge} bytes")]
    BlobZuKurz { laenge: usize },

    #[error("HMAC validation failed")]
    HmacUngueltig,

    #[error("decryption error")]
    Entschluesselung,

    #[error("invalid encryption metadata: {0}")]
    Dekodierung(String),

    #[error("invalid file name: {0:?}")]
    UngueltigerDateiname(String),

    #[error("persistence error: {0}")]
    Persistenz(#[from] std::io::Error),
}

impl MediaError {
    /// Stabiler, detailfreier Grund fuer `PipelineResult::Failure`
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Download(_) => "download error",
            Self::Integritaet {
                stufe: HashStufe::Verschluesselt,
            } => "encrypted hash verification failed",
            Self::Integritaet {
                stufe: HashStufe::Klartext,
            } => "plaintext hash verification failed",
            Self::BlobZuKurz { .. } => "media blob too short",
            Self::HmacUngueltig => "HMAC validation failed",
            Self::Entschluesselung => "decryption error",
            Self::Dekodierung(_) => "invalid encryption metadata",
            Self::UngueltigerDateiname(_) => "invalid file name",
            Self::Persistenz(_) => "persistence error",
        }
    }
}

pub type MediaResult<T> = Result<T, MediaError>;
