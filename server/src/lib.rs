//! funkhaus-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use funkhaus_signaling::{http_router, AppState, MessageRouter, RoomRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet das Relay und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. RoomRegistry und MessageRouter aufbauen
    /// 2. HTTP/WebSocket-Listener binden
    /// 3. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        let registry = RoomRegistry::neu();
        let router = MessageRouter::neu(registry);
        let state = Arc::new(AppState::neu(router, self.config.server.max_clients));
        let app = http_router(state, &self.config.netzwerk.statisches_verzeichnis);

        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse).await?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            statik = %self.config.netzwerk.statisches_verzeichnis,
            max_clients = self.config.server.max_clients,
            "Relay-Server gestartet"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Wartet auf Ctrl-C (bzw. SIGTERM unter Unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(fehler = %e, "SIGTERM-Handler konnte nicht installiert werden");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-C empfangen, Server wird beendet"),
        _ = terminate => tracing::info!("SIGTERM empfangen, Server wird beendet"),
    }
}
