//! Byte-Download vom CDN
//!
//! Die Pipeline kennt nur den Trait. Timeouts gehoeren dem Transport,
//! Retries dem Aufrufer.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{MediaError, MediaResult};

/// Laedt den rohen Inhalt einer URL
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn download(&self, url: &str) -> MediaResult<Bytes>;
}

/// HTTP-Transport auf Basis von reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Erstellt einen Transport mit optionalem Request-Timeout
    pub fn neu(timeout: Option<Duration>) -> MediaResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| MediaError::Download(format!("HTTP-Client: {e}")))?;
        Ok(Self { client })
    }

    /// Nutzt einen bestehenden Client (z. B. mit eigenem Connection-Pool)
    pub fn mit_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaTransport for HttpTransport {
    async fn download(&self, url: &str) -> MediaResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Download(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MediaError::Download(e.to_string()))?;

        tracing::debug!(bytes = body.len(), status = %status, "CDN-Download abgeschlossen");
        Ok(body)
    }
}
