//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use backtalk_game::RegistryConfig;
use backtalk_signaling::SignalingConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Spiel-Einstellungen
    pub spiel: SpielEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Spieler-Verbindungen
    pub max_verbindungen: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Backtalk Server".into(),
            max_verbindungen: 256,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer die TCP-Verbindung (Spiel-Protokoll)
    pub bind_adresse: String,
    /// Port fuer die TCP-Verbindung
    pub tcp_port: u16,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 9900,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Spiel-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpielEinstellungen {
    /// Standard-Obergrenze an Spielern pro Raum
    pub max_spieler_standard: u32,
    /// Hartes Limit fuer die vom Host gewuenschte Obergrenze
    pub max_spieler_limit: u32,
    /// Runden-Timeout in Sekunden; nicht gesetzt = kein Timeout.
    /// "Kein Timeout" ist hier ein bewusster Konfigurationswert: die
    /// Runde wartet dann unbegrenzt auf den langsamsten Spieler.
    pub runden_timeout_sek: Option<u64>,
    /// Wie lange ein leerer Raum stehen bleibt bevor er abgebaut wird
    pub raum_leerlauf_sek: u64,
    /// Intervall des Wartungslaufs in Sekunden
    pub aufraeum_intervall_sek: u64,
}

impl Default for SpielEinstellungen {
    fn default() -> Self {
        Self {
            max_spieler_standard: 8,
            max_spieler_limit: 16,
            runden_timeout_sek: None,
            raum_leerlauf_sek: 300,
            aufraeum_intervall_sek: 30,
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
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Baut die Registry-Konfiguration fuer den Spielkern
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_spieler_standard: self.spiel.max_spieler_standard,
            max_spieler_limit: self.spiel.max_spieler_limit,
            leerlauf_frist: Duration::from_secs(self.spiel.raum_leerlauf_sek),
            runden_timeout: self.spiel.runden_timeout_sek.map(Duration::from_secs),
        }
    }

    /// Baut die Signaling-Konfiguration
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            max_verbindungen: self.server.max_verbindungen,
            keepalive_sek: self.netzwerk.keepalive_sek,
            verbindungs_timeout_sek: self.netzwerk.verbindungs_timeout_sek,
            aufraeum_intervall_sek: self.spiel.aufraeum_intervall_sek,
            ..SignalingConfig::default()
        }
    }
}
