//! Hilfen zum Simulieren der Plattform-Seite
//!
//! Erzeugt verschluesselte Medien im Format des CDN und stellt einen
//! Transport ohne Netzwerk bereit. Gedacht fuer Tests und lokale
//! Diagnose, nicht fuer den Produktivpfad.

use aes::Aes256;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::descriptor::{EncryptionMetadata, MediaDescriptor, CBC_IV_LAENGE};
use crate::digest::sha256_hex;
use crate::error::{MediaError, MediaResult};
use crate::pipeline::HMAC_TAG_LAENGE;
use crate::transport::MediaTransport;

/// Fester AES-256-Schluessel der simulierten Medien
pub const TEST_ENCRYPTION_KEY: [u8; 32] = [0x01; 32];
/// Fester HMAC-Schluessel der simulierten Medien
pub const TEST_HMAC_KEY: [u8; 32] = [0x02; 32];
/// Fester CBC-IV der simulierten Medien
pub const TEST_IV: [u8; CBC_IV_LAENGE] = [0x00; CBC_IV_LAENGE];

/// Transport mit fest vorgegebener Antwort
#[derive(Debug, Clone)]
pub enum StaticTransport {
    Blob(Bytes),
    Fehler(String),
}

impl StaticTransport {
    pub fn ok(blob: Vec<u8>) -> Self {
        Self::Blob(Bytes::from(blob))
    }

    pub fn fehler(meldung: &str) -> Self {
        Self::Fehler(meldung.to_string())
    }
}

#[async_trait]
impl MediaTransport for StaticTransport {
    async fn download(&self, _url: &str) -> MediaResult<Bytes> {
        match self {
            Self::Blob(blob) => Ok(blob.clone()),
            Self::Fehler(meldung) => Err(MediaError::Download(meldung.clone())),
        }
    }
}

/// Verschluesselt `klartext` wie die Plattform und baut den passenden Deskriptor
///
/// Liefert `(deskriptor, blob)` mit `blob = ciphertext || hmac10`. Beide
/// Hashes sind als Hex kodiert.
pub fn medium_bauen(klartext: &[u8], file_name: &str) -> (MediaDescriptor, Vec<u8>) {
    let ciphertext = cbc::Encryptor::<Aes256>::new(&TEST_ENCRYPTION_KEY.into(), &TEST_IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(klartext);
    let blob = blob_versiegeln(&ciphertext);

    let descriptor = MediaDescriptor {
        file_name: file_name.to_string(),
        media_id: format!("test-{}", &sha256_hex(file_name.as_bytes())[..8]),
        cdn_url: format!("https://cdn.invalid/{file_name}"),
        encryption_metadata: EncryptionMetadata {
            encryption_key: BASE64.encode(TEST_ENCRYPTION_KEY),
            hmac_key: BASE64.encode(TEST_HMAC_KEY),
            iv: BASE64.encode(TEST_IV),
            plaintext_hash: sha256_hex(klartext),
            encrypted_hash: sha256_hex(&blob),
        },
    };
    (descriptor, blob)
}

/// Haengt den 10-Byte-HMAC-Tag ueber `iv || ciphertext` an
pub fn blob_versiegeln(ciphertext: &[u8]) -> Vec<u8> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&TEST_HMAC_KEY)
        .expect("HMAC akzeptiert jede Schluessellaenge");
    mac.update(&TEST_IV);
    mac.update(ciphertext);
    let tag = mac.finalize().into_bytes();

    let mut blob = ciphertext.to_vec();
    blob.extend_from_slice(&tag[..HMAC_TAG_LAENGE]);
    blob
}

/// AES-256-CBC ohne Padding; `bloecke` muss ein Vielfaches von 16 Bytes sein
///
/// Damit lassen sich Ciphertexte mit ungueltigem PKCS#7-Padding erzeugen.
pub fn ohne_padding_verschluesseln(bloecke: &[u8]) -> Vec<u8> {
    cbc::Encryptor::<Aes256>::new(&TEST_ENCRYPTION_KEY.into(), &TEST_IV.into())
        .encrypt_padded_vec_mut::<NoPadding>(bloecke)
}
