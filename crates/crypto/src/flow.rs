//! Flow-Verschluesselung (Request entschluesseln, Response verschluesseln)
//!
//! ## Request
//! ```text
//! encrypted_aes_key   = RSA-OAEP-SHA256(aes_key)
//! encrypted_flow_data = AES-GCM(aes_key, iv, json) || tag(16)
//! initial_vector      = iv(16)
//! ```
//!
//! ## Response
//! ```text
//! base64( AES-GCM(aes_key, !iv, json) || tag(16) )
//! ```
//!
//! Die Antwort nutzt denselben Schluessel mit dem bitweise invertierten IV.
//! Damit unterscheidet sich die Antwort-Nonce immer von der Anfrage-Nonce,
//! ohne dass eine neue Zufalls-Nonce uebertragen werden muss.

use std::path::Path;
use std::sync::Arc;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, AeadInPlace, KeyInit, Nonce, Tag};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::PrivateKeyMaterial;
use crate::types::{FlowEnvelope, SessionKeyBundle, IV_LAENGE, TAG_LAENGE};

type Aes128Gcm16 = AesGcm<Aes128, U16>;
type Aes192Gcm16 = AesGcm<Aes192, U16>;
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Ergebnis einer erfolgreich entschluesselten Anfrage
#[derive(Debug)]
pub struct DecryptedRequest {
    /// Entschluesselter JSON-Payload
    pub payload: serde_json::Value,
    /// Schluessel + IV fuer die zugehoerige Antwort
    pub session: SessionKeyBundle,
}

impl DecryptedRequest {
    /// Deserialisiert den Payload in einen konkreten Typ
    pub fn parse<T: DeserializeOwned>(&self) -> CryptoResult<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Hybride Flow-Verschluesselung
///
/// Haelt nur den privaten Schluessel. Sitzungszustand (AES-Key, IV) wird
/// nicht gespeichert, sondern explizit zwischen `decrypt_request` und
/// `encrypt_response` durchgereicht. Klone teilen sich denselben Schluessel.
#[derive(Debug, Clone)]
pub struct FlowCipher {
    private_key: Arc<PrivateKeyMaterial>,
}

impl FlowCipher {
    pub fn new(private_key: PrivateKeyMaterial) -> Self {
        Self {
            private_key: Arc::new(private_key),
        }
    }

    /// Laedt den privaten Schluessel aus einer PEM-Datei
    pub fn from_pem_file(pfad: impl AsRef<Path>, passphrase: Option<&str>) -> CryptoResult<Self> {
        Ok(Self::new(PrivateKeyMaterial::from_pem_file(pfad, passphrase)?))
    }

    pub fn private_key(&self) -> &PrivateKeyMaterial {
        &self.private_key
    }

    /// Entschluesselt einen eingehenden Flow-Request
    ///
    /// Reihenfolge: Base64 -> RSA-Unwrap -> Tag abtrennen -> AES-GCM -> JSON.
    /// Schlaegt die Tag-Pruefung fehl, verlaesst kein Klartext die Funktion.
    pub fn decrypt_request(
        &self,
        encrypted_flow_data_b64: &str,
        encrypted_aes_key_b64: &str,
        initial_vector_b64: &str,
    ) -> CryptoResult<DecryptedRequest> {
        let flow_data = BASE64.decode(encrypted_flow_data_b64)?;
        let encrypted_aes_key = BASE64.decode(encrypted_aes_key_b64)?;
        let iv_bytes = BASE64.decode(initial_vector_b64)?;

        let iv: [u8; IV_LAENGE] =
            iv_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::UngueltigeNonce {
                    erwartet: IV_LAENGE,
                    erhalten: iv_bytes.len(),
                })?;

        let aes_key = self.private_key.unwrap_session_key(&encrypted_aes_key)?;

        if flow_data.len() < TAG_LAENGE {
            tracing::debug!(laenge = flow_data.len(), "Flow-Daten kuerzer als Auth-Tag");
            return Err(CryptoError::Authentifizierung);
        }
        let (body, tag) = flow_data.split_at(flow_data.len() - TAG_LAENGE);

        let mut klartext = body.to_vec();
        open_in_place(aes_key.as_bytes(), &iv, &mut klartext, tag)?;

        let payload: serde_json::Value = serde_json::from_slice(&klartext)?;
        tracing::debug!(bytes = klartext.len(), "Flow-Request entschluesselt");

        Ok(DecryptedRequest {
            payload,
            session: SessionKeyBundle::new(aes_key, iv),
        })
    }

    /// Wie [`Self::decrypt_request`], direkt aus dem HTTP-Body
    pub fn decrypt_envelope(&self, envelope: &FlowEnvelope) -> CryptoResult<DecryptedRequest> {
        self.decrypt_request(
            &envelope.encrypted_flow_data,
            &envelope.encrypted_aes_key,
            &envelope.initial_vector,
        )
    }

    /// Verschluesselt die Antwort auf einen Flow-Request
    ///
    /// `session` muss aus dem unmittelbar vorangegangenen `decrypt_request`
    /// desselben Austauschs stammen.
    pub fn encrypt_response<T: Serialize + ?Sized>(
        &self,
        response: &T,
        session: &SessionKeyBundle,
    ) -> CryptoResult<String> {
        encrypt_response(response, session)
    }
}

/// Verschluesselt eine Antwort ohne Zugriff auf den privaten Schluessel
///
/// Ausgabe: `base64(ciphertext || tag)` unter dem invertierten IV.
pub fn encrypt_response<T: Serialize + ?Sized>(
    response: &T,
    session: &SessionKeyBundle,
) -> CryptoResult<String> {
    let klartext = serde_json::to_vec(response)?;
    let antwort_iv = session.antwort_iv();

    let sealed = seal(session.aes_key().as_bytes(), &antwort_iv, &klartext)?;
    Ok(BASE64.encode(sealed))
}

/// AES-GCM (16-Byte-Nonce) entschluesseln, Tag separat
pub(crate) fn open_in_place(
    key: &[u8],
    iv: &[u8; IV_LAENGE],
    buffer: &mut [u8],
    tag: &[u8],
) -> CryptoResult<()> {
    match key.len() {
        16 => open_with::<Aes128Gcm16>(key, iv, buffer, tag),
        24 => open_with::<Aes192Gcm16>(key, iv, buffer, tag),
        32 => open_with::<Aes256Gcm16>(key, iv, buffer, tag),
        n => Err(CryptoError::UngueltigeSchluesselLaenge { erhalten: n }),
    }
}

/// AES-GCM (16-Byte-Nonce) verschluesseln, Ausgabe `ciphertext || tag`
pub(crate) fn seal(key: &[u8], iv: &[u8; IV_LAENGE], klartext: &[u8]) -> CryptoResult<Vec<u8>> {
    match key.len() {
        16 => seal_with::<Aes128Gcm16>(key, iv, klartext),
        24 => seal_with::<Aes192Gcm16>(key, iv, klartext),
        32 => seal_with::<Aes256Gcm16>(key, iv, klartext),
        n => Err(CryptoError::UngueltigeSchluesselLaenge { erhalten: n }),
    }
}

fn open_with<C: KeyInit + AeadInPlace>(
    key: &[u8],
    iv: &[u8; IV_LAENGE],
    buffer: &mut [u8],
    tag: &[u8],
) -> CryptoResult<()> {
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::UngueltigeSchluesselLaenge { erhalten: key.len() })?;

    cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(iv),
            &[],
            buffer,
            Tag::<C>::from_slice(tag),
        )
        .map_err(|_| {
            buffer.iter_mut().for_each(|b| *b = 0);
            CryptoError::Authentifizierung
        })
}

fn seal_with<C: KeyInit + Aead>(
    key: &[u8],
    iv: &[u8; IV_LAENGE],
    klartext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::UngueltigeSchluesselLaenge { erhalten: key.len() })?;

    cipher
        .encrypt(Nonce::<C>::from_slice(iv), klartext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

/// Hilfsfunktion fuer Tests und Gegenstellen-Simulation: oeffnet eine
/// Antwort mit dem invertierten IV.
pub fn decrypt_response(response_b64: &str, session: &SessionKeyBundle) -> CryptoResult<Vec<u8>> {
    let data = BASE64.decode(response_b64)?;
    if data.len() < TAG_LAENGE {
        return Err(CryptoError::Authentifizierung);
    }
    let (body, tag) = data.split_at(data.len() - TAG_LAENGE);
    let mut klartext = body.to_vec();
    open_in_place(session.aes_key().as_bytes(), &session.antwort_iv(), &mut klartext, tag)?;
    Ok(klartext)
}

/// Baut einen Flow-Request wie die Plattform ihn senden wuerde
///
/// Gegenstueck zu [`FlowCipher::decrypt_request`], fuer Tests und lokale
/// Simulation.
pub fn encrypt_request<T: Serialize + ?Sized>(
    public_key: &rsa::RsaPublicKey,
    aes_key: &[u8],
    iv: &[u8; IV_LAENGE],
    request: &T,
) -> CryptoResult<FlowEnvelope> {
    use rsa::rand_core::OsRng;
    use rsa::Oaep;
    use sha2::Sha256;

    let klartext = serde_json::to_vec(request)?;
    let sealed = seal(aes_key, iv, &klartext)?;
    let wrapped = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), aes_key)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(FlowEnvelope {
        encrypted_flow_data: BASE64.encode(sealed),
        encrypted_aes_key: BASE64.encode(wrapped),
        initial_vector: BASE64.encode(iv),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
