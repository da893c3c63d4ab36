//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Flow-Kryptografie-Subsystem
///
/// Keine Variante traegt Klartext oder Schluesselmaterial.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Dekodierung(#[from] base64::DecodeError),

    #[error("Ungueltige IV-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Schluessel-Laenge: erhalten {erhalten} Bytes (erlaubt: 16, 24, 32)")]
    UngueltigeSchluesselLaenge { erhalten: usize },

    #[error("AES-Schluessel konnte nicht entpackt werden")]
    KeyUnwrap,

    #[error("Authentifizierung des Flow-Payloads fehlgeschlagen")]
    Authentifizierung,

    #[error("Payload ist kein gueltiges JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Privater Schluessel konnte nicht geladen werden: {0}")]
    SchluesselLaden(String),
}

impl CryptoError {
    /// `true` fuer alle Fehler, die beim Entschluesseln einer Anfrage
    /// entstehen und auf einen veralteten oder falschen Schluessel hindeuten
    /// koennen (Dekodierung, Key-Unwrap, Auth-Tag).
    pub fn ist_entschluesselungsfehler(&self) -> bool {
        matches!(
            self,
            Self::Dekodierung(_)
                | Self::UngueltigeNonce { .. }
                | Self::UngueltigeSchluesselLaenge { .. }
                | Self::KeyUnwrap
                | Self::Authentifizierung
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
