//! HTTP/WebSocket-Listener – Routen und Upgrade-Handshake
//!
//! Stellt den axum-Router bereit: `/ws` fuer den WebSocket-Upgrade,
//! `/health` fuer Zustandsabfragen und statische Dateien fuer den
//! mitgelieferten Demo-Client. Der eigentliche Relay-Kern haengt nur
//! ueber den `MessageRouter` an dieser Schicht.

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::connection::ClientConnection;
use crate::router::MessageRouter;

/// Geteilter Zustand der HTTP-Schicht
pub struct AppState {
    /// Router ueber der Room-Registry
    pub router: MessageRouter,
    /// Verbindungs-Obergrenze (beim Upgrade geprueft)
    pub max_clients: u32,
    /// Aktuell offene WebSocket-Verbindungen
    aktive_verbindungen: AtomicUsize,
}

impl AppState {
    /// Erstellt einen neuen AppState
    pub fn neu(router: MessageRouter, max_clients: u32) -> Self {
        Self {
            router,
            max_clients,
            aktive_verbindungen: AtomicUsize::new(0),
        }
    }

    /// Anzahl der aktuell offenen Verbindungen
    pub fn verbindungs_anzahl(&self) -> usize {
        self.aktive_verbindungen.load(Ordering::Relaxed)
    }
}

/// Baut den axum-Router mit WebSocket-, Health- und Statik-Routen
pub fn http_router(state: Arc<AppState>, statisches_verzeichnis: &str) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(statisches_verzeichnis))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Health-Check: Zaehler fuer Verbindungen, Raeume und Mitgliedschaften
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.router.registry();
    Json(json!({
        "status": "ok",
        "verbindungen": state.verbindungs_anzahl(),
        "raeume": registry.raum_anzahl(),
        "mitglieder": registry.mitglieder_anzahl(),
    }))
}

/// WebSocket-Upgrade-Handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| verbindung_behandeln(socket, state))
}

/// Startet die ClientConnection und pflegt den Verbindungszaehler
async fn verbindung_behandeln(socket: WebSocket, state: Arc<AppState>) {
    let bisher = state.aktive_verbindungen.fetch_add(1, Ordering::SeqCst);
    if bisher >= state.max_clients as usize {
        tracing::warn!(max = state.max_clients, "Server voll – Verbindung abgelehnt");
        state.aktive_verbindungen.fetch_sub(1, Ordering::SeqCst);
        drop(socket);
        return;
    }

    ClientConnection::neu(state.router.clone())
        .verarbeiten(socket)
        .await;

    state.aktive_verbindungen.fetch_sub(1, Ordering::SeqCst);
}
