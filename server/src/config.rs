//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, sodass der Server ohne Konfigurationsdatei startet.
//! Nur der private Schluessel muss vorhanden sein.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wabridge_media::ArtifactOptions;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP-Listener
    pub server: ServerEinstellungen,
    /// Flow-Entschluesselung
    pub flow: FlowEinstellungen,
    /// Medien-Pipeline
    pub media: MediaEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// HTTP-Listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    pub bind_adresse: String,
    pub port: u16,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "127.0.0.1".into(),
            port: 8443,
        }
    }
}

/// Flow-Entschluesselung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowEinstellungen {
    /// PEM-Datei mit dem privaten RSA-Schluessel (PKCS#8 oder PKCS#1)
    pub private_key_pfad: PathBuf,
    /// Name der Umgebungsvariable mit der Passphrase (nur fuer verschluesselte PEMs)
    pub passphrase_env: Option<String>,
}

impl Default for FlowEinstellungen {
    fn default() -> Self {
        Self {
            private_key_pfad: PathBuf::from("private.pem"),
            passphrase_env: None,
        }
    }
}

/// Medien-Pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaEinstellungen {
    /// Zielverzeichnis fuer entschluesselte Medien und Artefakte
    pub ausgabe_verzeichnis: PathBuf,
    pub debug_mode: bool,
    pub keep_artifacts: bool,
    /// Timeout fuer CDN-Downloads in Sekunden (0 = kein Timeout)
    pub download_timeout_secs: u64,
}

impl Default for MediaEinstellungen {
    fn default() -> Self {
        Self {
            ausgabe_verzeichnis: PathBuf::from("media"),
            debug_mode: false,
            keep_artifacts: false,
            download_timeout_secs: 30,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl AppConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Vollstaendige Bind-Adresse des HTTP-Listeners
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.server.bind_adresse, self.server.port)
    }

    /// Passphrase aus der konfigurierten Umgebungsvariable
    pub fn passphrase(&self) -> Option<String> {
        self.flow
            .passphrase_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
    }

    /// Download-Timeout, `None` bei 0
    pub fn download_timeout(&self) -> Option<Duration> {
        match self.media.download_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Artefakt-Optionen fuer die Medien-Pipeline
    pub fn artifact_optionen(&self) -> ArtifactOptions {
        ArtifactOptions {
            debug_mode: self.media.debug_mode,
            keep_artifacts: self.media.keep_artifacts,
            verzeichnis: self.media.ausgabe_verzeichnis.clone(),
        }
    }
}
