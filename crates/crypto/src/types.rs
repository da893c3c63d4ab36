//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

/// Laenge des Flow-IV (AES-GCM mit 128-Bit-Nonce)
pub const IV_LAENGE: usize = 16;

/// Laenge des GCM-Auth-Tags
pub const TAG_LAENGE: usize = 16;

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sitzungsschluessel eines einzelnen Flow-Austauschs
///
/// Entsteht in [`crate::FlowCipher::decrypt_request`] und wird vom Aufrufer
/// an genau ein passendes [`crate::FlowCipher::encrypt_response`]
/// weitergereicht. Ein Bundle darf nicht fuer einen anderen Austausch
/// wiederverwendet werden: die Antwort-Nonce ist deterministisch aus dem
/// IV abgeleitet, eine Wiederverwendung wuerde sie unter demselben
/// Schluessel doppelt verbrauchen.
#[derive(Debug)]
pub struct SessionKeyBundle {
    aes_key: SecretBytes,
    iv: [u8; IV_LAENGE],
}

impl SessionKeyBundle {
    pub fn new(aes_key: SecretBytes, iv: [u8; IV_LAENGE]) -> Self {
        Self { aes_key, iv }
    }

    pub fn aes_key(&self) -> &SecretBytes {
        &self.aes_key
    }

    pub fn iv(&self) -> &[u8; IV_LAENGE] {
        &self.iv
    }

    /// IV der Antwort (bitweises Komplement des Anfrage-IV)
    pub fn antwort_iv(&self) -> [u8; IV_LAENGE] {
        flip_iv(&self.iv)
    }
}

/// Invertiert jedes Bit des IV (XOR 0xFF)
///
/// Selbstinvers: `flip_iv(&flip_iv(&iv)) == iv`.
pub fn flip_iv(iv: &[u8; IV_LAENGE]) -> [u8; IV_LAENGE] {
    let mut out = [0u8; IV_LAENGE];
    for (o, b) in out.iter_mut().zip(iv) {
        *o = b ^ 0xFF;
    }
    out
}

/// Eingehender Flow-Request wie ihn die Plattform per HTTP sendet
///
/// Alle Felder Base64-kodiert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEnvelope {
    /// AES-GCM Ciphertext + 16 Bytes Auth-Tag
    pub encrypted_flow_data: String,
    /// RSA-OAEP-SHA256 verpackter AES-Schluessel
    pub encrypted_aes_key: String,
    /// 16-Byte GCM-Nonce
    pub initial_vector: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_iv_ist_selbstinvers() {
        let iv: [u8; 16] = core::array::from_fn(|i| (i as u8).wrapping_mul(37));
        assert_eq!(flip_iv(&flip_iv(&iv)), iv);
    }

    #[test]
    fn flip_iv_aendert_jedes_byte() {
        for seed in [0u8, 0x0F, 0x7F, 0xAA, 0xFF] {
            let iv = [seed; 16];
            let flipped = flip_iv(&iv);
            for (a, b) in iv.iter().zip(flipped.iter()) {
                assert_ne!(a, b);
                assert_eq!(a ^ b, 0xFF);
            }
        }
    }

    #[test]
    fn antwort_iv_ist_komplement() {
        let bundle = SessionKeyBundle::new(SecretBytes::new(vec![1; 16]), [0u8; 16]);
        assert_eq!(bundle.antwort_iv(), [0xFF; 16]);
    }

    #[test]
    fn secret_bytes_debug_ist_redacted() {
        let secret = SecretBytes::new(vec![0x41; 32]);
        let text = format!("{secret:?}");
        assert!(text.contains("REDACTED"));
        assert!(text.contains("32"));
        assert!(!text.contains("65"));
    }

    #[test]
    fn envelope_deserialisierung() {
        let json = r#"{
            "encrypted_flow_data": "Zmxvdw==",
            "encrypted_aes_key": "a2V5",
            "initial_vector": "aXY="
        }"#;
        let envelope: FlowEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.encrypted_flow_data, "Zmxvdw==");
        assert_eq!(envelope.encrypted_aes_key, "a2V5");
        assert_eq!(envelope.initial_vector, "aXY=");
    }
}
