//! Client-Verbindung – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task: ein Writer-Task leert die Send-Queue auf den Socket, die
//! Leseschleife reicht eingehende Text-Frames an den `MessageRouter`
//! weiter.
//!
//! ## State Machine
//! ```text
//! Verbunden -> (join) -> ImRaum -> (Trennung) -> Beendet
//! ```

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::registry::ClientSender;
use crate::router::{MessageRouter, VerbindungsKontext};

/// Verarbeitet eine einzelne WebSocket-Verbindung
///
/// Liest Text-Frames, dispatcht an den `MessageRouter` und schreibt
/// ausgehende Nachrichten aus der Send-Queue zurueck. Laeuft in einem
/// eigenen tokio-Task.
pub struct ClientConnection {
    router: MessageRouter,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(router: MessageRouter) -> Self {
        Self { router }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client schliesst oder ein Transportfehler
    /// auftritt; danach werden die Raum-Ressourcen bereinigt.
    pub async fn verarbeiten(self, socket: WebSocket) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (sender, mut sende_rx) = ClientSender::neu();
        let verbindung = sender.id;
        let mut ctx = VerbindungsKontext::neu();

        tracing::info!(verbindung = %verbindung, "Neue Verbindung");

        // Writer-Task: Send-Queue -> Socket
        let writer = tokio::spawn(async move {
            while let Some(text) = sende_rx.recv().await {
                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        // Leseschleife
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    self.router.eingehend(&text, &sender, &mut ctx);
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        verbindung = %verbindung,
                        "Binaer-Frame verworfen (Protokoll ist Text/JSON)"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Keepalive beantwortet die WebSocket-Schicht selbst
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(verbindung = %verbindung, "Close-Frame empfangen");
                    break;
                }
                Err(e) => {
                    tracing::warn!(verbindung = %verbindung, fehler = %e, "Transportfehler");
                    break;
                }
            }
        }

        // Cleanup: erst die Registry, damit keine neuen Sendungen mehr
        // eingereiht werden; in-flight Sendungen werden verworfen statt
        // den Cleanup-Pfad zu blockieren
        self.router.verbindung_getrennt(&verbindung, &mut ctx);
        writer.abort();

        tracing::info!(verbindung = %verbindung, "Verbindungs-Task beendet");
    }
}
