//! funkhaus-signaling – WebSocket Signaling-Relay
//!
//! Dieser Crate implementiert den Kern des Relays: Verbindungen werden
//! in benannte Raeume gruppiert und reichen darueber WebRTC-
//! Verhandlungsnachrichten (Offer, Answer, ICE-Kandidaten, Screen-Share-
//! Events) an die uebrigen Raum-Mitglieder weiter. Medien werden nie
//! interpretiert oder gespeichert.
//!
//! ## Architektur
//!
//! ```text
//! HTTP/WebSocket-Listener (axum, ws.rs)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  State Machine: Verbunden -> ImRaum -> Beendet
//!     |
//!     v
//! MessageRouter – dekodiert, validiert, verteilt
//!     |
//!     v
//! RoomRegistry  – Raum-Mitgliedschaft + Nachrichten-Fan-Out
//! ```

pub mod connection;
pub mod error;
pub mod registry;
pub mod router;
pub mod ws;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use error::{SignalingError, SignalingResult};
pub use registry::{ClientSender, RoomRegistry};
pub use router::{MessageRouter, VerbindungsKontext, VerbindungsZustand};
pub use ws::{http_router, AppState};
