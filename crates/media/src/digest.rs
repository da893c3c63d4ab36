//! SHA-256 Pruefsummen mit doppelter Kodierungs-Akzeptanz
//!
//! Der erwartete Hash kommt entweder als Hex-String (lowercase) oder als
//! Base64 der rohen Digest-Bytes. Beide Formen werden akzeptiert, weitere
//! Kodierungen nicht.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Ergebnis eines Hash-Vergleichs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMatch {
    /// Direkter Treffer gegen den Hex-String
    Hex,
    /// Treffer nach Base64-Dekodierung
    Base64,
    /// Kein Treffer
    Mismatch(DecodeOutcome),
}

/// Ausgang des Base64-Versuchs bei einem Mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Erwarteter Wert ist kein gueltiges Base64
    KeinBase64,
    /// Base64 gueltig, Digest verschieden
    Abweichend,
}

impl DigestMatch {
    pub fn ist_treffer(&self) -> bool {
        !matches!(self, Self::Mismatch(_))
    }
}

/// Lowercase-Hex SHA-256 von `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Vergleicht den SHA-256 von `data` mit `expected`
pub fn match_digest(data: &[u8], expected: &str) -> DigestMatch {
    let berechnet = sha256_hex(data);

    if berechnet == expected {
        return DigestMatch::Hex;
    }

    match BASE64.decode(expected) {
        Ok(dekodiert) if hex::encode(&dekodiert) == berechnet => DigestMatch::Base64,
        Ok(_) => DigestMatch::Mismatch(DecodeOutcome::Abweichend),
        Err(_) => DigestMatch::Mismatch(DecodeOutcome::KeinBase64),
    }
}
