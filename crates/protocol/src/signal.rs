//! Signalisierungs-Nachrichten (WebSocket/JSON)
//!
//! Definiert die Nachrichten die zwischen Client und Relay ausgetauscht
//! werden.
//!
//! ## Design
//! - Tagged Enums: das `type`-Feld bestimmt die Variante (kebab-case)
//! - Relay-Nachrichten (Offer, Answer, ICE, Screen-Share) tragen neben
//!   `roomId` eine beliebige Verhandlungs-Payload, die das Relay nicht
//!   interpretiert – beim Weiterleiten geht der Original-Text raus,
//!   unbekannte Felder bleiben damit woertlich erhalten

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Relay-Payload
// ---------------------------------------------------------------------------

/// Verhandlungs-Nachricht mit Raum-Schluessel und opaker Payload
///
/// Die Payload (SDP, ICE-Kandidaten, Screen-Share-Details) wird nur zur
/// Formpruefung eingelesen, nie veraendert oder neu serialisiert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayNachricht {
    /// Ziel-Raum der Nachricht
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// Beliebige zusaetzliche Felder – werden nicht interpretiert
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Vom Client eingehende Nachrichten
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EingehendeNachricht {
    /// Einem Raum beitreten
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// WebRTC-Offer an die uebrigen Raum-Mitglieder
    Offer(RelayNachricht),
    /// WebRTC-Answer an die uebrigen Raum-Mitglieder
    Answer(RelayNachricht),
    /// ICE-Kandidat an die uebrigen Raum-Mitglieder
    IceCandidate(RelayNachricht),
    /// Bildschirmfreigabe gestartet
    ScreenShareStarted(RelayNachricht),
    /// Bildschirmfreigabe beendet
    ScreenShareEnded(RelayNachricht),
}

impl EingehendeNachricht {
    /// Raum-Schluessel der Nachricht
    pub fn room_id(&self) -> &str {
        match self {
            Self::Join { room_id, .. } => room_id,
            Self::Offer(n)
            | Self::Answer(n)
            | Self::IceCandidate(n)
            | Self::ScreenShareStarted(n)
            | Self::ScreenShareEnded(n) => &n.room_id,
        }
    }

    /// Wire-Name des Nachrichtentyps (fuer Logging)
    pub fn typ_name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::ScreenShareStarted(_) => "screen-share-started",
            Self::ScreenShareEnded(_) => "screen-share-ended",
        }
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Vom Relay erzeugte, nur ausgehende Nachrichten
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AusgehendeNachricht {
    /// Bestaetigung des Raum-Beitritts (nur an den Beitretenden)
    Joined {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Aktuelle Teilnehmerliste in Beitritts-Reihenfolge (an alle im Raum)
    UserList { users: Vec<String> },
    /// Ein Mitglied hat den Raum verlassen (an die Verbleibenden)
    UserLeft {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

impl AusgehendeNachricht {
    /// Serialisiert die Nachricht als JSON-Text
    pub fn als_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
