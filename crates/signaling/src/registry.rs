//! Room-Registry – Raum-Mitgliedschaft und Nachrichten-Fan-Out
//!
//! Die Registry ist der einzige geteilte, veraenderliche Zustand des
//! Relays. Sie gruppiert Verbindungen in Raeume, haelt die Mitglieder-
//! listen auch bei abrupten Trennungen konsistent und verteilt
//! Nachrichten an die richtige Teilmenge der Verbindungen.
//!
//! ## Konsistenz-Modell
//! Alle Operationen auf einem Raum laufen unter dem Entry-Lock der
//! DashMap; Mutation und die zugehoerige Roster-Benachrichtigung sind
//! damit pro Raum atomar. Unter dem Lock wird ausschliesslich
//! nicht-blockierend in Send-Queues eingereiht (`try_send`); Socket-I/O
//! passiert in den Writer-Tasks der Verbindungen. Ein langsamer Client
//! blockiert damit nie die Operationen eines Raums – seine Queue laeuft
//! voll und nur Nachrichten an IHN gehen verloren.

use dashmap::DashMap;
use funkhaus_core::types::ConnectionId;
use funkhaus_protocol::signal::AusgehendeNachricht;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Client-Verbindung
///
/// Die Registry referenziert das Handle nur um ausgehende Nachrichten zu
/// adressieren und die Verbindung beim Trennen wiederzufinden – ueber die
/// Lebensdauer der Verbindung entscheidet allein der Transport-Task.
#[derive(Clone, Debug)]
pub struct ClientSender {
    /// Stabiles Verbindungs-Token
    pub id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl ClientSender {
    /// Erstellt ein neues Sender-Handle samt Empfangs-Queue
    ///
    /// Der Verbindungs-Task liest aus der Queue und schreibt auf den
    /// Socket.
    pub fn neu() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        (
            Self {
                id: ConnectionId::new(),
                tx,
            },
            rx,
        )
    }

    /// Reiht eine Nachricht nicht-blockierend in die Send-Queue ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, text: String) -> bool {
        match self.tx.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

/// Mitgliedschafts-Eintrag einer Verbindung in einem Raum
#[derive(Clone, Debug)]
struct Mitglied {
    sender: ClientSender,
    user_id: String,
}

/// Prozessweite Registry aller Raeume
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Raeume entstehen implizit beim ersten Beitritt und werden geloescht
/// sobald das letzte Mitglied geht – ein leerer Raum existiert nie.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RoomRegistryInner>,
}

struct RoomRegistryInner {
    /// Raum-Schluessel -> Mitglieder in Beitritts-Reihenfolge
    raeume: DashMap<String, Vec<Mitglied>>,
}

impl RoomRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RoomRegistryInner {
                raeume: DashMap::new(),
            }),
        }
    }

    /// Fuegt eine Verbindung einem Raum hinzu (Replace-Semantik)
    ///
    /// Ein frueherer Eintrag derselben Verbindung im Raum wird vorher
    /// entfernt, damit ein wiederholtes `join` keine doppelten
    /// Roster-Eintraege erzeugt. Unter dem Entry-Lock werden `joined` an
    /// den Beitretenden und die aktualisierte `user-list` an alle
    /// Mitglieder (einschliesslich des neuen) eingereiht.
    pub fn raum_beitreten(&self, raum_id: &str, sender: &ClientSender, user_id: &str) {
        let mut mitglieder = self.inner.raeume.entry(raum_id.to_string()).or_default();

        // Replace-Semantik: alter Eintrag derselben Verbindung fliegt raus
        mitglieder.retain(|m| m.sender.id != sender.id);
        mitglieder.push(Mitglied {
            sender: sender.clone(),
            user_id: user_id.to_string(),
        });

        let joined = AusgehendeNachricht::Joined {
            room_id: raum_id.to_string(),
            user_id: user_id.to_string(),
        };
        sender.senden(joined.als_text());
        Self::user_list_einreihen(&mitglieder);

        tracing::info!(
            raum = raum_id,
            user = user_id,
            verbindung = %sender.id,
            mitglieder = mitglieder.len(),
            "Raum beigetreten"
        );
    }

    /// Entfernt eine getrennte Verbindung aus allen Raeumen
    ///
    /// Erwartet wird hoechstens ein Raum pro Verbindung; taucht sie
    /// dennoch mehrfach auf, wird sie ueberall entfernt und der erste
    /// Treffer zurueckgegeben. Verbleibende Mitglieder erhalten
    /// `user-left` gefolgt von der aktualisierten `user-list`; leer
    /// gewordene Raeume werden sofort aus der Registry geloescht.
    /// `None` wenn die Verbindung nirgends Mitglied war.
    pub fn verbindung_getrennt(&self, verbindung: &ConnectionId) -> Option<(String, String)> {
        let mut erster_treffer: Option<(String, String)> = None;
        let mut leere_raeume: Vec<String> = Vec::new();

        for mut eintrag in self.inner.raeume.iter_mut() {
            let user_id = match eintrag.iter().find(|m| m.sender.id == *verbindung) {
                Some(m) => m.user_id.clone(),
                None => continue,
            };
            eintrag.retain(|m| m.sender.id != *verbindung);

            if eintrag.is_empty() {
                leere_raeume.push(eintrag.key().clone());
            } else {
                let weg = AusgehendeNachricht::UserLeft {
                    user_id: user_id.clone(),
                }
                .als_text();
                for m in eintrag.iter() {
                    m.sender.senden(weg.clone());
                }
                Self::user_list_einreihen(&eintrag);
            }

            if erster_treffer.is_none() {
                erster_treffer = Some((eintrag.key().clone(), user_id));
            }
        }

        for raum_id in leere_raeume {
            // remove_if: nur loeschen wenn zwischenzeitlich niemand
            // beigetreten ist
            self.inner
                .raeume
                .remove_if(&raum_id, |_, mitglieder| mitglieder.is_empty());
            tracing::debug!(raum = %raum_id, "Leeren Raum entfernt");
        }

        erster_treffer
    }

    /// Leitet einen Text an alle Mitglieder eines Raums weiter
    ///
    /// `ausser` schliesst eine Verbindung aus (typisch: der Absender);
    /// `None` schliesst niemanden aus. No-op wenn der Raum nicht
    /// existiert. Ein fehlgeschlagenes Einreihen bei einem Empfaenger
    /// verhindert die Zustellung an die uebrigen nicht. Gibt die Anzahl
    /// der erfolgreich eingereihten Sendungen zurueck.
    pub fn an_raum_senden(
        &self,
        raum_id: &str,
        ausser: Option<&ConnectionId>,
        text: &str,
    ) -> usize {
        let mitglieder = match self.inner.raeume.get(raum_id) {
            Some(m) => m,
            None => return 0,
        };

        let mut gesendet = 0;
        for m in mitglieder.iter() {
            if ausser == Some(&m.sender.id) {
                continue;
            }
            if m.sender.senden(text.to_string()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Gibt die User-IDs eines Raums in Beitritts-Reihenfolge zurueck
    ///
    /// Leer wenn der Raum nicht existiert – "nie existiert" und "gerade
    /// geleert" sind fuer Aufrufer nicht unterscheidbar.
    pub fn teilnehmerliste(&self, raum_id: &str) -> Vec<String> {
        self.inner
            .raeume
            .get(raum_id)
            .map(|mitglieder| mitglieder.iter().map(|m| m.user_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Prueft ob ein Raum leer bzw. nicht vorhanden ist
    pub fn ist_leer(&self, raum_id: &str) -> bool {
        self.inner
            .raeume
            .get(raum_id)
            .map(|m| m.is_empty())
            .unwrap_or(true)
    }

    /// Anzahl der aktiven Raeume
    pub fn raum_anzahl(&self) -> usize {
        self.inner.raeume.len()
    }

    /// Gesamtzahl der Mitgliedschaften ueber alle Raeume
    pub fn mitglieder_anzahl(&self) -> usize {
        self.inner.raeume.iter().map(|e| e.len()).sum()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    /// Reiht die aktuelle Teilnehmerliste bei allen Mitgliedern ein
    fn user_list_einreihen(mitglieder: &[Mitglied]) {
        let users: Vec<String> = mitglieder.iter().map(|m| m.user_id.clone()).collect();
        let text = AusgehendeNachricht::UserList { users }.als_text();
        for m in mitglieder {
            m.sender.senden(text.clone());
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
