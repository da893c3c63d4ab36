//! # wabridge-crypto
//!
//! Ende-zu-Ende Verschluesselung fuer interaktive Flows der Business-API.
//!
//! ## Module
//! - `flow` - Request entschluesseln (RSA-OAEP + AES-GCM), Response verschluesseln
//! - `keys` - Privater RSA-Schluessel (PEM-Loader)
//! - `types` - Gemeinsame Typen (SecretBytes, SessionKeyBundle, FlowEnvelope)
//! - `error` - Fehlertypen

pub mod error;
pub mod flow;
pub mod keys;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use flow::{decrypt_response, encrypt_request, encrypt_response, DecryptedRequest, FlowCipher};
pub use keys::PrivateKeyMaterial;
pub use types::{flip_iv, FlowEnvelope, SecretBytes, SessionKeyBundle, IV_LAENGE, TAG_LAENGE};
