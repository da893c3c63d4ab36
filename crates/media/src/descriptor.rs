//! Medien-Deskriptor, wie ihn die Plattform im Webhook liefert
//!
//! ```json
//! {
//!   "file_name": "foto.jpg",
//!   "media_id": "1234",
//!   "cdn_url": "https://...",
//!   "encryption_metadata": {
//!     "encryption_key": "<b64>", "hmac_key": "<b64>", "iv": "<b64>",
//!     "plaintext_hash": "<hex|b64>", "encrypted_hash": "<hex|b64>"
//!   }
//! }
//! ```

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use wabridge_crypto::SecretBytes;

use crate::error::{MediaError, MediaResult};

/// IV-Laenge fuer AES-CBC
pub const CBC_IV_LAENGE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub file_name: String,
    pub media_id: String,
    pub cdn_url: String,
    pub encryption_metadata: EncryptionMetadata,
}

/// Verschluesselungs-Metadaten (Schluessel Base64, Hashes hex oder Base64)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub encryption_key: String,
    pub hmac_key: String,
    pub iv: String,
    pub plaintext_hash: String,
    pub encrypted_hash: String,
}

impl std::fmt::Debug for EncryptionMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionMetadata")
            .field("encryption_key", &"[REDACTED]")
            .field("hmac_key", &"[REDACTED]")
            .field("iv", &self.iv)
            .field("plaintext_hash", &self.plaintext_hash)
            .field("encrypted_hash", &self.encrypted_hash)
            .finish()
    }
}

/// Dekodierte Schluessel eines Medien-Objekts
#[derive(Debug)]
pub struct MediaKeys {
    pub encryption_key: SecretBytes,
    pub hmac_key: SecretBytes,
    pub iv: [u8; CBC_IV_LAENGE],
}

impl MediaDescriptor {
    /// Dekodiert die Base64-Schluessel
    pub fn keys(&self) -> MediaResult<MediaKeys> {
        let meta = &self.encryption_metadata;

        let encryption_key = decode_feld("encryption_key", &meta.encryption_key)?;
        let hmac_key = decode_feld("hmac_key", &meta.hmac_key)?;
        let iv_bytes = decode_feld("iv", &meta.iv)?;

        let iv: [u8; CBC_IV_LAENGE] = iv_bytes.as_slice().try_into().map_err(|_| {
            MediaError::Dekodierung(format!(
                "iv: erwartet {CBC_IV_LAENGE} Bytes, erhalten {}",
                iv_bytes.len()
            ))
        })?;

        Ok(MediaKeys {
            encryption_key: SecretBytes::new(encryption_key),
            hmac_key: SecretBytes::new(hmac_key),
            iv,
        })
    }

    /// Letzte Pfadkomponente von `file_name`
    ///
    /// Verhindert, dass ein Deskriptor ausserhalb des Zielverzeichnisses
    /// schreibt (`../../etc/passwd` -> `passwd`).
    pub fn safe_file_name(&self) -> MediaResult<&str> {
        Path::new(&self.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MediaError::UngueltigerDateiname(self.file_name.clone()))
    }
}

fn decode_feld(feld: &str, wert: &str) -> MediaResult<Vec<u8>> {
    BASE64
        .decode(wert)
        .map_err(|e| MediaError::Dekodierung(format!("{feld}: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
