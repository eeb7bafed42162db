//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass das Relay ohne Konfigurationsdatei
//! lauffaehig ist. Der Listen-Port kann zusaetzlich ueber die
//! Umgebungsvariable `PORT` ueberschrieben werden (Standard: 3000).

use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Relays
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Funkhaus Relay".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den HTTP/WebSocket-Listener
    pub bind_adresse: String,
    /// Listen-Port (Umgebungsvariable `PORT` hat Vorrang)
    pub port: u16,
    /// Verzeichnis mit dem statisch ausgelieferten Demo-Client
    pub statisches_verzeichnis: String,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
            statisches_verzeichnis: "web".into(),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht
    /// existiert; die `PORT`-Umgebungsvariable wird danach angewendet.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.port_aus_umgebung();
        Ok(config)
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Wendet die `PORT`-Umgebungsvariable an falls gesetzt
    fn port_aus_umgebung(&mut self) {
        if let Ok(wert) = std::env::var("PORT") {
            match wert.parse::<u16>() {
                Ok(port) => self.netzwerk.port = port,
                Err(_) => {
                    tracing::warn!(wert = %wert, "PORT ist keine gueltige Portnummer – ignoriert");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_clients, 512);
        assert_eq!(cfg.netzwerk.port, 3000);
        assert_eq!(cfg.netzwerk.statisches_verzeichnis, "web");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:3000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Mein Relay"
            max_clients = 100

            [netzwerk]
            port = 10000
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Mein Relay");
        assert_eq!(cfg.server.max_clients, 100);
        assert_eq!(cfg.netzwerk.port, 10000);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.logging.format, "text");
    }
}
