//! wabridge Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use wabridge_server::config::AppConfig;
use wabridge_server::logging::{
    log_format_gueltig, log_level_gueltig, logging_initialisieren, EffektivesLogging,
};
use wabridge_server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("WABRIDGE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = AppConfig::laden(&config_pfad)?;

    let logging = EffektivesLogging::aufloesen(&config.logging.level, &config.logging.format);
    logging_initialisieren(&logging);

    if !log_level_gueltig(&logging.level) {
        tracing::warn!(level = %logging.level, "Kein einfacher Log-Level, wird als Filter-Direktive gelesen");
    }
    if !log_format_gueltig(&logging.format) {
        tracing::warn!(format = %logging.format, "Unbekanntes Log-Format, verwende text");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "wabridge Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
