//! End-to-End Szenarien: jede Pruefstufe, Ausgabe, Artefakte, Bypass

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::testing::{blob_versiegeln, medium_bauen, ohne_padding_verschluesseln, StaticTransport};
use crate::{
    sha256_hex, ArtifactOptions, MediaDescriptor, MediaError, MediaPipeline, PipelineResult,
};

fn pipeline_mit(descriptor: MediaDescriptor, blob: Vec<u8>, opts: ArtifactOptions) -> MediaPipeline {
    MediaPipeline::new(descriptor, Arc::new(StaticTransport::ok(blob)), opts).unwrap()
}

fn pipeline(descriptor: MediaDescriptor, blob: Vec<u8>) -> MediaPipeline {
    pipeline_mit(descriptor, blob, ArtifactOptions::default())
}

fn artefakt_optionen(dir: &Path, keep: bool) -> ArtifactOptions {
    ArtifactOptions {
        debug_mode: true,
        keep_artifacts: keep,
        verzeichnis: dir.to_path_buf(),
    }
}

#[tokio::test]
async fn hello_world_wird_entschluesselt() {
    let (descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    assert_eq!(
        descriptor.encryption_metadata.plaintext_hash,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    // 11 Bytes -> ein CBC-Block + 10 Byte Tag
    assert_eq!(blob.len(), 26);

    let klartext = pipeline(descriptor, blob).process().await.into_result().unwrap();
    assert_eq!(klartext, b"hello world");
}

#[tokio::test]
async fn mehrblock_inhalt() {
    let inhalt: Vec<u8> = (0..=255u8).cycle().take(4096 + 7).collect();
    let (descriptor, blob) = medium_bauen(&inhalt, "gross.bin");
    let klartext = pipeline(descriptor, blob).process().await.into_result().unwrap();
    assert_eq!(klartext, inhalt);
}

#[tokio::test]
async fn falscher_verschluesselter_hash() {
    let (mut descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    descriptor.encryption_metadata.encrypted_hash = sha256_hex(b"etwas anderes");

    let result = pipeline(descriptor, blob).process().await;
    assert_eq!(result.reason(), Some("encrypted hash verification failed"));
}

#[tokio::test]
async fn manipulierter_tag_scheitert_an_hmac() {
    let (mut descriptor, mut blob) = medium_bauen(b"hello world", "hello.txt");
    let letzte = blob.len() - 1;
    blob[letzte] ^= 0x01;
    // Hash passend zum manipulierten Blob, damit die HMAC-Stufe erreicht wird
    descriptor.encryption_metadata.encrypted_hash = sha256_hex(&blob);

    let result = pipeline(descriptor, blob).process().await;
    assert!(matches!(result, PipelineResult::Failure(MediaError::HmacUngueltig)));
}

#[tokio::test]
async fn manipulierter_ciphertext_scheitert_an_hmac() {
    let (mut descriptor, mut blob) = medium_bauen(b"hello world", "hello.txt");
    blob[0] ^= 0x80;
    descriptor.encryption_metadata.encrypted_hash = sha256_hex(&blob);

    let result = pipeline(descriptor, blob).process().await;
    assert_eq!(result.reason(), Some("HMAC validation failed"));
}

#[tokio::test]
async fn falscher_hmac_schluessel() {
    let (mut descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    descriptor.encryption_metadata.hmac_key = BASE64.encode([0x03u8; 32]);

    let result = pipeline(descriptor, blob).process().await;
    assert_eq!(result.reason(), Some("HMAC validation failed"));
}

#[tokio::test]
async fn ungueltiges_padding_mit_gueltigem_hmac() {
    let (mut descriptor, _) = medium_bauen(b"egal", "pad.bin");
    let blob = blob_versiegeln(&ohne_padding_verschluesseln(&[0x41u8; 32]));
    descriptor.encryption_metadata.encrypted_hash = sha256_hex(&blob);

    let result = pipeline(descriptor, blob).process().await;
    assert_eq!(result.reason(), Some("decryption error"));
}

#[tokio::test]
async fn falscher_klartext_hash() {
    let (mut descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    descriptor.encryption_metadata.plaintext_hash = sha256_hex(b"hello world!");

    let result = pipeline(descriptor, blob).process().await;
    assert_eq!(result.reason(), Some("plaintext hash verification failed"));
}

#[tokio::test]
async fn gemischte_hash_kodierungen() {
    let (mut descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    let meta = &mut descriptor.encryption_metadata;
    meta.plaintext_hash = BASE64.encode(hex::decode(&meta.plaintext_hash).unwrap());

    assert!(pipeline(descriptor, blob).process().await.is_success());
}

#[tokio::test]
async fn save_schreibt_datei() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    let ziel = dir.path().join("ausgabe.txt");

    let pfad = pipeline(descriptor, blob)
        .save(Some(&ziel))
        .await
        .into_result()
        .unwrap();
    assert_eq!(pfad, ziel);
    assert_eq!(std::fs::read(&ziel).unwrap(), b"hello world");
}

#[tokio::test]
async fn save_ohne_ziel_nutzt_dateinamen_im_verzeichnis() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), false));

    let pfad = p.save(None).await.into_result().unwrap();
    assert_eq!(pfad, dir.path().join("hello.txt"));
    assert_eq!(std::fs::read(&pfad).unwrap(), b"hello world");
    assert!(!dir.path().join("hello.txt.raw").exists());
    assert!(!dir.path().join("hello.txt.decrypted").exists());
}

#[tokio::test]
async fn save_ohne_ziel_bereinigt_dateinamen() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "../../ausbruch.txt");
    let p = pipeline_mit(
        descriptor,
        blob,
        ArtifactOptions {
            verzeichnis: dir.path().to_path_buf(),
            ..ArtifactOptions::default()
        },
    );

    let pfad = p.save(None).await.into_result().unwrap();
    assert_eq!(pfad, dir.path().join("ausbruch.txt"));
}

#[tokio::test]
async fn process_ohne_dateinamen() {
    let (descriptor, blob) = medium_bauen(b"hello world", "");
    let klartext = pipeline(descriptor, blob).process().await.into_result().unwrap();
    assert_eq!(klartext, b"hello world");
}

#[tokio::test]
async fn save_schreibt_bei_fehlschlag_nichts() {
    let dir = tempfile::tempdir().unwrap();
    let (mut descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    descriptor.encryption_metadata.plaintext_hash = sha256_hex(b"falsch");
    let ziel = dir.path().join("ausgabe.txt");

    let result = pipeline(descriptor, blob).save(Some(&ziel)).await;
    assert!(!result.is_success());
    assert!(!ziel.exists());
}

#[tokio::test]
async fn save_in_fehlendes_verzeichnis_ist_persistenzfehler() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "hello.txt");
    let ziel = dir.path().join("fehlt").join("ausgabe.txt");

    let result = pipeline(descriptor, blob).save(Some(&ziel)).await;
    assert_eq!(result.reason(), Some("persistence error"));
}

#[tokio::test]
async fn artefakte_bleiben_nur_bei_erfolg() {
    let dir = tempfile::tempdir().unwrap();

    let (descriptor, blob) = medium_bauen(b"hello world", "ok.txt");
    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), true));
    assert!(p.process().await.is_success());
    assert_eq!(std::fs::read(dir.path().join("ok.txt.decrypted")).unwrap(), b"hello world");
    assert!(dir.path().join("ok.txt.raw").exists());

    let (mut descriptor, blob) = medium_bauen(b"hello world", "kaputt.txt");
    descriptor.encryption_metadata.plaintext_hash = sha256_hex(b"falsch");
    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), true));
    assert!(!p.process().await.is_success());
    assert!(!dir.path().join("kaputt.txt.raw").exists());
    assert!(!dir.path().join("kaputt.txt.decrypted").exists());
}

#[tokio::test]
async fn artefakte_ohne_keep_werden_entfernt() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "weg.txt");
    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), false));

    assert!(p.process().await.is_success());
    assert!(!dir.path().join("weg.txt.raw").exists());
    assert!(!dir.path().join("weg.txt.decrypted").exists());
}

#[tokio::test]
async fn dateiname_mit_pfadanteilen_wird_bereinigt() {
    let dir = tempfile::tempdir().unwrap();
    let (descriptor, blob) = medium_bauen(b"hello world", "../../etc/passwd");
    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), true));

    assert!(p.process().await.is_success());
    assert!(dir.path().join("passwd.raw").exists());
}

#[tokio::test]
async fn bypass_liefert_unverifizierten_klartext() {
    let dir = tempfile::tempdir().unwrap();
    let (mut descriptor, mut blob) = medium_bauen(b"hello world", "hello.txt");
    descriptor.encryption_metadata.encrypted_hash = sha256_hex(b"falsch");
    descriptor.encryption_metadata.plaintext_hash = sha256_hex(b"falsch");
    let letzte = blob.len() - 1;
    blob[letzte] ^= 0xFF;

    let p = pipeline_mit(descriptor, blob, artefakt_optionen(dir.path(), true));
    let ziel = dir.path().join("unverifiziert.txt");
    let pfad = p
        .dangerous()
        .bypass_verifications(Some(&ziel))
        .await
        .into_result()
        .unwrap();

    assert_eq!(std::fs::read(pfad).unwrap(), b"hello world");
    assert!(dir.path().join("hello.txt.raw").exists());
}

#[tokio::test]
async fn bypass_lehnt_zu_kurzen_blob_ab() {
    let (descriptor, _) = medium_bauen(b"hello world", "hello.txt");
    let p = pipeline(descriptor, vec![0u8; 10]);

    let result = p.dangerous().bypass_verifications(None).await;
    assert_eq!(result.reason(), Some("media blob too short"));
}
