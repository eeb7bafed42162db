//! Message-Router – Dekodiert eingehende Frames und verteilt sie
//!
//! Der Router selbst ist zustandslos; der gesamte veraenderliche Zustand
//! lebt in der `RoomRegistry`. Fehlertoleranz nach Design: eine
//! unlesbare oder unbekannte Nachricht beendet niemals die Verbindung,
//! und es geht nie eine Fehlerantwort auf die Leitung.
//!
//! ## Zustandspruefung
//! Relay-Nachrichten vor dem ersten `join` sind kein Fehler – der
//! Raum-Lookup schlaegt fehl und die Weiterleitung ist ein No-op.

use funkhaus_core::types::ConnectionId;
use funkhaus_protocol::signal::EingehendeNachricht;

use crate::error::{SignalingError, SignalingResult};
use crate::registry::{ClientSender, RoomRegistry};

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Zustand einer Verbindung aus Sicht des Routers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Verbunden, noch keinem Raum beigetreten
    Verbunden,
    /// Mitglied eines Raums
    ImRaum,
    /// Verbindung beendet, Ressourcen bereinigt
    Beendet,
}

/// Kontext einer einzelnen Verbindung
pub struct VerbindungsKontext {
    /// Aktueller Zustand der State Machine
    pub zustand: VerbindungsZustand,
}

impl VerbindungsKontext {
    /// Erstellt einen frischen Kontext im Zustand `Verbunden`
    pub fn neu() -> Self {
        Self {
            zustand: VerbindungsZustand::Verbunden,
        }
    }
}

impl Default for VerbindungsKontext {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// MessageRouter
// ---------------------------------------------------------------------------

/// Zentraler Message-Router
///
/// Dekodiert eingehende Text-Frames, validiert die Form und stoesst die
/// passende Registry-Operation an. Clone teilt die Registry.
#[derive(Clone)]
pub struct MessageRouter {
    registry: RoomRegistry,
}

impl MessageRouter {
    /// Erstellt einen neuen Router ueber der gegebenen Registry
    pub fn neu(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    /// Zugriff auf die Registry (fuer Health-Abfragen und Tests)
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Verarbeitet einen eingehenden Text-Frame
    ///
    /// Dekodierfehler werden geloggt, unbekannte Nachrichtentypen still
    /// verworfen – beides laesst die Verbindung offen.
    pub fn eingehend(&self, text: &str, sender: &ClientSender, ctx: &mut VerbindungsKontext) {
        if let Err(fehler) = self.frame_verarbeiten(text, sender, ctx) {
            match fehler {
                SignalingError::Dekodierung(e) => {
                    tracing::warn!(
                        verbindung = %sender.id,
                        fehler = %e,
                        "Unlesbare Nachricht verworfen"
                    );
                }
                SignalingError::UnbekannteNachricht(e) => {
                    tracing::debug!(
                        verbindung = %sender.id,
                        fehler = %e,
                        "Unbekannte Nachricht verworfen"
                    );
                }
            }
        }
    }

    fn frame_verarbeiten(
        &self,
        text: &str,
        sender: &ClientSender,
        ctx: &mut VerbindungsKontext,
    ) -> SignalingResult<()> {
        // Erst generisch parsen um Dekodierfehler (kaputtes JSON) von
        // unbekannten Nachrichtentypen zu unterscheiden
        let wert: serde_json::Value = serde_json::from_str(text)?;

        let nachricht: EingehendeNachricht = serde_json::from_value(wert)
            .map_err(|e| SignalingError::UnbekannteNachricht(e.to_string()))?;

        match nachricht {
            EingehendeNachricht::Join { room_id, user_id } => {
                self.registry.raum_beitreten(&room_id, sender, &user_id);
                ctx.zustand = VerbindungsZustand::ImRaum;
            }
            relay => {
                // Verhandlungs-Payloads gehen woertlich raus: der
                // Original-Text wird weitergereicht, nie eine
                // Re-Serialisierung
                let empfaenger =
                    self.registry
                        .an_raum_senden(relay.room_id(), Some(&sender.id), text);
                tracing::trace!(
                    typ = relay.typ_name(),
                    raum = relay.room_id(),
                    empfaenger,
                    "Relay-Nachricht weitergeleitet"
                );
            }
        }

        Ok(())
    }

    /// Bereinigt eine getrennte Verbindung
    ///
    /// Die Registry entfernt die Mitgliedschaft und benachrichtigt die
    /// verbleibenden Raum-Mitglieder; eine Trennung ohne vorherigen
    /// Beitritt ist ein No-op.
    pub fn verbindung_getrennt(&self, verbindung: &ConnectionId, ctx: &mut VerbindungsKontext) {
        match self.registry.verbindung_getrennt(verbindung) {
            Some((raum, user_id)) => {
                tracing::info!(
                    raum = %raum,
                    user = %user_id,
                    verbindung = %verbindung,
                    "Verbindung getrennt"
                );
            }
            None => {
                tracing::debug!(
                    verbindung = %verbindung,
                    "Verbindung ohne Raum-Mitgliedschaft getrennt"
                );
            }
        }
        ctx.zustand = VerbindungsZustand::Beendet;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::sync::mpsc;

    fn aufbau() -> MessageRouter {
        MessageRouter::neu(RoomRegistry::neu())
    }

    fn empfangen(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
        let mut nachrichten = Vec::new();
        while let Ok(text) = rx.try_recv() {
            nachrichten.push(serde_json::from_str(&text).expect("gueltiges JSON"));
        }
        nachrichten
    }

    #[tokio::test]
    async fn join_szenario_alice_und_bob() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let (b, mut rx_b) = ClientSender::neu();
        let mut ctx_a = VerbindungsKontext::neu();
        let mut ctx_b = VerbindungsKontext::neu();

        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"alice"}"#,
            &a,
            &mut ctx_a,
        );
        assert_eq!(ctx_a.zustand, VerbindungsZustand::ImRaum);

        let msgs_a = empfangen(&mut rx_a);
        assert_eq!(msgs_a[0]["type"], "joined");
        assert_eq!(msgs_a[0]["roomId"], "r1");
        assert_eq!(msgs_a[0]["userId"], "alice");
        assert_eq!(msgs_a[1]["type"], "user-list");
        assert_eq!(msgs_a[1]["users"], serde_json::json!(["alice"]));

        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"bob"}"#,
            &b,
            &mut ctx_b,
        );

        let msgs_b = empfangen(&mut rx_b);
        assert_eq!(msgs_b[0]["type"], "joined");
        assert_eq!(msgs_b[1]["users"], serde_json::json!(["alice", "bob"]));

        let msgs_a = empfangen(&mut rx_a);
        assert_eq!(msgs_a.len(), 1);
        assert_eq!(msgs_a[0]["users"], serde_json::json!(["alice", "bob"]));
    }

    #[tokio::test]
    async fn offer_wird_woertlich_weitergeleitet() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let (b, mut rx_b) = ClientSender::neu();
        let mut ctx_a = VerbindungsKontext::neu();
        let mut ctx_b = VerbindungsKontext::neu();

        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"alice"}"#,
            &a,
            &mut ctx_a,
        );
        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"bob"}"#,
            &b,
            &mut ctx_b,
        );
        empfangen(&mut rx_a);
        empfangen(&mut rx_b);

        // Unbekannte Zusatzfelder muessen unveraendert ankommen
        let offer = r#"{"type":"offer","roomId":"r1","sdp":"v=0...","eigenes":true}"#;
        router.eingehend(offer, &a, &mut ctx_a);

        let mut roh = Vec::new();
        while let Ok(text) = rx_b.try_recv() {
            roh.push(text);
        }
        assert_eq!(roh, [offer], "Original-Text, keine Re-Serialisierung");
        assert!(empfangen(&mut rx_a).is_empty(), "Absender bekommt nichts");
    }

    #[tokio::test]
    async fn dekodierfehler_beendet_session_nicht() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let mut ctx = VerbindungsKontext::neu();

        router.eingehend("{kaputt", &a, &mut ctx);
        assert_eq!(ctx.zustand, VerbindungsZustand::Verbunden);

        // Ein anschliessender korrekter Join funktioniert weiterhin
        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"alice"}"#,
            &a,
            &mut ctx,
        );
        assert_eq!(ctx.zustand, VerbindungsZustand::ImRaum);
        assert_eq!(empfangen(&mut rx_a).len(), 2);
    }

    #[tokio::test]
    async fn unbekannter_typ_wird_still_verworfen() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let mut ctx = VerbindungsKontext::neu();

        router.eingehend(r#"{"type":"kaffee","roomId":"r1"}"#, &a, &mut ctx);

        assert!(empfangen(&mut rx_a).is_empty(), "Keine Antwort an den Absender");
        assert_eq!(router.registry().raum_anzahl(), 0);
    }

    #[tokio::test]
    async fn relay_vor_join_ist_noop() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let mut ctx = VerbindungsKontext::neu();

        router.eingehend(
            r#"{"type":"ice-candidate","roomId":"r1","candidate":"c"}"#,
            &a,
            &mut ctx,
        );

        assert_eq!(ctx.zustand, VerbindungsZustand::Verbunden);
        assert!(empfangen(&mut rx_a).is_empty());
        assert_eq!(router.registry().raum_anzahl(), 0);
    }

    #[tokio::test]
    async fn trennung_benachrichtigt_und_loescht_leeren_raum() {
        let router = aufbau();
        let (a, mut rx_a) = ClientSender::neu();
        let (b, mut rx_b) = ClientSender::neu();
        let mut ctx_a = VerbindungsKontext::neu();
        let mut ctx_b = VerbindungsKontext::neu();

        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"alice"}"#,
            &a,
            &mut ctx_a,
        );
        router.eingehend(
            r#"{"type":"join","roomId":"r1","userId":"bob"}"#,
            &b,
            &mut ctx_b,
        );
        empfangen(&mut rx_a);
        empfangen(&mut rx_b);

        // Bob trennt abrupt
        router.verbindung_getrennt(&b.id, &mut ctx_b);
        assert_eq!(ctx_b.zustand, VerbindungsZustand::Beendet);

        let msgs = empfangen(&mut rx_a);
        assert_eq!(msgs[0]["type"], "user-left");
        assert_eq!(msgs[0]["userId"], "bob");
        assert_eq!(msgs[1]["type"], "user-list");
        assert_eq!(msgs[1]["users"], serde_json::json!(["alice"]));
        assert!(!router.registry().ist_leer("r1"));

        // Alice geht auch – der Raum verschwindet
        router.verbindung_getrennt(&a.id, &mut ctx_a);
        assert_eq!(router.registry().raum_anzahl(), 0);
    }

    #[tokio::test]
    async fn trennung_ohne_join_ist_noop() {
        let router = aufbau();
        let (a, _rx_a) = ClientSender::neu();
        let mut ctx = VerbindungsKontext::neu();

        router.verbindung_getrennt(&a.id, &mut ctx);
        assert_eq!(ctx.zustand, VerbindungsZustand::Beendet);
    }
}
