//! Diagnose-Artefakte (roher Download, entschluesselter Inhalt)
//!
//! Nur bei `debug_mode` werden Artefakte geschrieben. Der [`ArtifactScope`]
//! entfernt sie beim Drop wieder, ausser der Lauf war erfolgreich und
//! `keep_artifacts` ist gesetzt. Das gilt fuer jeden Ausstieg, auch bei
//! unerwarteten Fehlern mitten in der Pipeline.

use std::path::{Path, PathBuf};

use crate::error::MediaResult;

/// Konfiguration der Diagnose-Artefakte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    /// Zwischenstaende als `<datei>.raw` / `<datei>.decrypted` schreiben
    pub debug_mode: bool,
    /// Artefakte nach erfolgreichem Lauf nicht entfernen
    pub keep_artifacts: bool,
    /// Zielverzeichnis fuer Artefakte und die Standard-Ausgabe von `save`
    pub verzeichnis: PathBuf,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            keep_artifacts: false,
            verzeichnis: PathBuf::from("."),
        }
    }
}

/// Welcher Zwischenstand geschrieben wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Roh,
    Entschluesselt,
}

impl ArtifactKind {
    fn endung(self) -> &'static str {
        match self {
            Self::Roh => "raw",
            Self::Entschluesselt => "decrypted",
        }
    }
}

/// Sammelt geschriebene Artefakte eines Laufs und raeumt sie beim Drop auf
#[derive(Debug)]
pub struct ArtifactScope<'a> {
    options: &'a ArtifactOptions,
    basis_name: Option<&'a str>,
    geschrieben: Vec<PathBuf>,
    behalten: bool,
}

impl<'a> ArtifactScope<'a> {
    /// `basis_name` ist nur bei aktivem `debug_mode` noetig
    pub fn neu(options: &'a ArtifactOptions, basis_name: Option<&'a str>) -> Self {
        Self {
            options,
            basis_name,
            geschrieben: Vec::new(),
            behalten: false,
        }
    }

    pub fn pfad(&self, kind: ArtifactKind) -> Option<PathBuf> {
        self.basis_name.map(|name| {
            self.options
                .verzeichnis
                .join(format!("{name}.{}", kind.endung()))
        })
    }

    /// Schreibt ein Artefakt, falls `debug_mode` aktiv ist
    pub async fn schreiben(&mut self, kind: ArtifactKind, inhalt: &[u8]) -> MediaResult<()> {
        if !self.options.debug_mode {
            return Ok(());
        }
        let Some(pfad) = self.pfad(kind) else {
            tracing::debug!(?kind, "Kein Dateiname, Artefakt wird nicht geschrieben");
            return Ok(());
        };

        // Vor dem Schreiben registrieren, damit auch halb geschriebene Dateien entfernt werden
        self.geschrieben.push(pfad.clone());
        tokio::fs::write(&pfad, inhalt).await?;
        tracing::debug!(pfad = %pfad.display(), bytes = inhalt.len(), "Artefakt geschrieben");
        Ok(())
    }

    /// Markiert den Lauf als erfolgreich; Artefakte bleiben nur mit `keep_artifacts`
    pub fn erfolg(mut self) {
        self.behalten = self.options.keep_artifacts;
    }

    pub fn geschriebene(&self) -> &[PathBuf] {
        &self.geschrieben
    }
}

impl Drop for ArtifactScope<'_> {
    fn drop(&mut self) {
        if self.behalten {
            return;
        }
        for pfad in &self.geschrieben {
            entfernen(pfad);
        }
    }
}

fn entfernen(pfad: &Path) {
    match std::fs::remove_file(pfad) {
        Ok(()) => tracing::debug!(pfad = %pfad.display(), "Artefakt entfernt"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(pfad = %pfad.display(), fehler = %e, "Artefakt konnte nicht entfernt werden"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
