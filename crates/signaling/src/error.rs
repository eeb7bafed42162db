//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
///
/// Kein Fehler dieses Typs erreicht je einen Client auf der Leitung –
/// das Protokoll kennt keine Fehlerantworten, alles degradiert zu Logs.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Eingehender Frame war kein gueltiges JSON
    #[error("Dekodierfehler: {0}")]
    Dekodierung(#[from] serde_json::Error),

    /// Nachrichtentyp unbekannt oder Pflichtfelder fehlen
    #[error("Unbekannte Nachricht: {0}")]
    UnbekannteNachricht(String),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
