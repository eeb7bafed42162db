//! Identifikationstypen fuer Funkhaus
//!
//! Die ConnectionId verwendet das Newtype-Pattern um Verwechslungen mit
//! anderen String/UUID-Werten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stabiles, eindeutiges Token einer Client-Verbindung
///
/// Wird beim Verbindungsaufbau vergeben und aendert sich ueber die
/// Lebensdauer der Verbindung nicht. Die Registry ersetzt darueber
/// Mitglieder beim Re-Join und findet sie beim Trennen wieder –
/// unabhaengig davon wie oft der Client `join` schickt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn connection_id_ist_serde_kompatibel() {
        let id = ConnectionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let id2: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, id2);
    }
}
