//! Privater RSA-Schluessel des Flow-Endpunkts
//!
//! Wird einmalig beim Start aus einer PEM-Datei geladen und danach nur
//! noch gelesen. Unterstuetzte Formate:
//! - PKCS#8 (`BEGIN PRIVATE KEY`)
//! - PKCS#1 (`BEGIN RSA PRIVATE KEY`)
//! - verschluesseltes PKCS#8 (`BEGIN ENCRYPTED PRIVATE KEY`), nur mit Passphrase

use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// Asymmetrischer Schluessel zum Entpacken der Sitzungsschluessel
pub struct PrivateKeyMaterial {
    key: RsaPrivateKey,
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKeyMaterial([REDACTED])")
    }
}

impl From<RsaPrivateKey> for PrivateKeyMaterial {
    fn from(key: RsaPrivateKey) -> Self {
        Self { key }
    }
}

impl PrivateKeyMaterial {
    /// Parst einen PEM-kodierten Schluessel
    pub fn from_pem(pem: &str, passphrase: Option<&str>) -> CryptoResult<Self> {
        let pem = pem.trim();

        let key = if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
            let passphrase = passphrase.ok_or_else(|| {
                CryptoError::SchluesselLaden(
                    "Schluessel ist verschluesselt, aber keine Passphrase angegeben".to_string(),
                )
            })?;
            RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.as_bytes())
                .map_err(|e| CryptoError::SchluesselLaden(e.to_string()))?
        } else if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| CryptoError::SchluesselLaden(e.to_string()))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| CryptoError::SchluesselLaden(e.to_string()))?
        };

        Ok(Self { key })
    }

    /// Laedt den Schluessel aus einer Datei
    pub fn from_pem_file(pfad: impl AsRef<Path>, passphrase: Option<&str>) -> CryptoResult<Self> {
        let pfad = pfad.as_ref();
        let inhalt = std::fs::read_to_string(pfad).map_err(|e| {
            CryptoError::SchluesselLaden(format!("'{}' nicht lesbar: {e}", pfad.display()))
        })?;

        let material = Self::from_pem(&inhalt, passphrase)?;
        tracing::info!(pfad = %pfad.display(), bits = material.bits(), "Privater Schluessel geladen");
        Ok(material)
    }

    /// Modulus-Laenge in Bit
    pub fn bits(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.key.size() * 8
    }

    /// Entpackt einen RSA-OAEP-SHA256 verpackten Sitzungsschluessel
    ///
    /// MGF1 nutzt ebenfalls SHA-256, kein Label.
    pub(crate) fn unwrap_session_key(&self, wrapped: &[u8]) -> CryptoResult<SecretBytes> {
        self.key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map(SecretBytes::new)
            .map_err(|_| CryptoError::KeyUnwrap)
    }

    /// Oeffentlicher Teil (fuer Tests und Schluessel-Registrierung)
    pub fn public_key(&self) -> rsa::RsaPublicKey {
        self.key.to_public_key()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
