//! Integration-Tests: vollstaendiger Flow-Austausch (Plattform <-> Endpunkt)

use std::io::Write;
use std::sync::OnceLock;

use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use serde_json::json;
use wabridge_crypto::{
    decrypt_response, encrypt_request, flip_iv, CryptoError, FlowCipher, SecretBytes,
    SessionKeyBundle,
};

fn rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).unwrap())
}

fn cipher_aus_pem_datei() -> (FlowCipher, tempfile::NamedTempFile) {
    let pem = rsa_key().to_pkcs8_pem(LineEnding::LF).unwrap();
    let mut datei = tempfile::NamedTempFile::new().unwrap();
    datei.write_all(pem.as_bytes()).unwrap();
    let cipher = FlowCipher::from_pem_file(datei.path(), None).unwrap();
    (cipher, datei)
}

#[test]
fn vollstaendiger_austausch() {
    let (cipher, _datei) = cipher_aus_pem_datei();
    let public = rsa_key().to_public_key();

    let aes_key = [0x5Au8; 16];
    let iv = [0xC3u8; 16];
    let request = json!({
        "version": "3.0",
        "action": "data_exchange",
        "screen": "APPOINTMENT",
        "data": { "department": "shopping" },
        "flow_token": "abc-123"
    });

    // Plattform-Seite
    let envelope = encrypt_request(&public, &aes_key, &iv, &request).unwrap();

    // Endpunkt-Seite
    let decrypted = cipher.decrypt_envelope(&envelope).unwrap();
    assert_eq!(decrypted.payload, request);

    let response = json!({ "screen": "SUCCESS", "data": { "ok": true } });
    let antwort = cipher.encrypt_response(&response, &decrypted.session).unwrap();

    // Plattform-Seite: Antwort mit !iv oeffnen
    let klartext = decrypt_response(&antwort, &decrypted.session).unwrap();
    let zurueck: serde_json::Value = serde_json::from_slice(&klartext).unwrap();
    assert_eq!(zurueck, response);
}

#[test]
fn roundtrip_fuer_verschiedene_schluessel_und_ivs() {
    let objekte = [
        json!({}),
        json!({ "a": 1 }),
        json!({ "liste": [1, 2, 3], "verschachtelt": { "x": null, "y": "ü" } }),
        json!({ "text": "x".repeat(1000) }),
    ];

    for (i, objekt) in objekte.iter().enumerate() {
        for key_len in [16usize, 24, 32] {
            let key: Vec<u8> = (0..key_len).map(|b| (b * 7 + i) as u8).collect();
            let iv: [u8; 16] = core::array::from_fn(|b| (b * 13 + i * 3) as u8);
            let session = SessionKeyBundle::new(SecretBytes::new(key), iv);

            let antwort = wabridge_crypto::encrypt_response(objekt, &session).unwrap();
            let klartext = decrypt_response(&antwort, &session).unwrap();
            let zurueck: serde_json::Value = serde_json::from_slice(&klartext).unwrap();
            assert_eq!(&zurueck, objekt);
        }
    }
}

#[test]
fn antwort_iv_ist_komplement_des_anfrage_ivs() {
    let iv = [0x00u8; 16];
    let session = SessionKeyBundle::new(SecretBytes::new(vec![9; 16]), iv);
    assert_eq!(session.antwort_iv(), flip_iv(&iv));
    assert_eq!(flip_iv(&session.antwort_iv()), iv);
}

#[test]
fn jedes_manipulierte_tag_bit_wird_erkannt() {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let (cipher, _datei) = cipher_aus_pem_datei();
    let public = rsa_key().to_public_key();
    let envelope =
        encrypt_request(&public, &[1u8; 16], &[2u8; 16], &json!({ "geheim": true })).unwrap();
    let original = BASE64.decode(&envelope.encrypted_flow_data).unwrap();
    let tag_start = original.len() - 16;

    for byte in tag_start..original.len() {
        for bit in 0..8 {
            let mut data = original.clone();
            data[byte] ^= 1 << bit;
            let result = cipher.decrypt_request(
                &BASE64.encode(&data),
                &envelope.encrypted_aes_key,
                &envelope.initial_vector,
            );
            assert!(matches!(result, Err(CryptoError::Authentifizierung)));
        }
    }
}

#[test]
fn entschluesselungsfehler_werden_klassifiziert() {
    let (cipher, _datei) = cipher_aus_pem_datei();
    let err = cipher.decrypt_request("!!", "!!", "!!").unwrap_err();
    assert!(err.ist_entschluesselungsfehler());

    let format_err: CryptoError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(!format_err.ist_entschluesselungsfehler());
}
