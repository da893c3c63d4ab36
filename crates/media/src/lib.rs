//! # wabridge-media
//!
//! Verifizierter Empfang verschluesselter CDN-Medien.
//!
//! ## Module
//! - `pipeline` - Download, Hash- und HMAC-Pruefung, AES-CBC Entschluesselung
//! - `dangerous` - Diagnosepfad ohne Verifikation (nur ueber `MediaPipeline::dangerous`)
//! - `descriptor` - Medien-Deskriptor und Schluessel-Dekodierung
//! - `digest` - SHA-256 Vergleich (Hex oder Base64)
//! - `transport` - Download-Trait und HTTP-Implementierung
//! - `artifacts` - Diagnose-Artefakte mit automatischer Bereinigung
//! - `testing` - Simulierte Plattform-Medien (Feature `testing`)
//! - `error` - Fehlertypen

pub mod artifacts;
pub mod dangerous;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod pipeline;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

#[cfg(test)]
mod tests;

pub use artifacts::{ArtifactKind, ArtifactOptions, ArtifactScope};
pub use dangerous::DangerousMediaPipeline;
pub use descriptor::{EncryptionMetadata, MediaDescriptor, MediaKeys, CBC_IV_LAENGE};
pub use digest::{match_digest, sha256_hex, DecodeOutcome, DigestMatch};
pub use error::{HashStufe, MediaError, MediaResult};
pub use pipeline::{MediaPipeline, PipelineResult, HMAC_TAG_LAENGE};
pub use transport::{HttpTransport, MediaTransport};
