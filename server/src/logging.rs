//! Structured Logging Setup via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei:
//! - `WB_LOG_LEVEL`: Log-Level oder Filter-Direktiven, Standard: info
//! - `WB_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Request-IDs werden als Tracing-Span-Felder propagiert.

use tracing_subscriber::{fmt, EnvFilter};

const LEVEL_ENV: &str = "WB_LOG_LEVEL";
const FORMAT_ENV: &str = "WB_LOG_FORMAT";

/// Tatsaechlich verwendete Logging-Einstellungen nach Env-Vorrang
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffektivesLogging {
    pub level: String,
    pub format: String,
}

impl EffektivesLogging {
    /// `WB_LOG_LEVEL` / `WB_LOG_FORMAT` ueberschreiben die Werte aus der Konfiguration
    pub fn aufloesen(level: &str, format: &str) -> Self {
        Self {
            level: std::env::var(LEVEL_ENV).unwrap_or_else(|_| level.to_string()),
            format: std::env::var(FORMAT_ENV).unwrap_or_else(|_| format.to_string()),
        }
    }
}

/// Initialisiert das Logging-System mit den aufgeloesten Einstellungen.
///
/// Faellt auf `info` zurueck, wenn `level` kein gueltiger Filter ist, und
/// auf Text-Ausgabe bei unbekanntem Format.
pub fn logging_initialisieren(einstellungen: &EffektivesLogging) {
    let filter =
        EnvFilter::try_new(&einstellungen.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match einstellungen.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
