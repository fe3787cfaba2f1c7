//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registry, Broadcaster und den Audio-Umkehrer als geteilte
//! Referenzen, die sicher zwischen tokio-Tasks geteilt werden koennen.
//! Generisch ueber den [`ReverseTransform`]-Kollaborateur, damit Tests
//! und Deployments unterschiedliche Umkehrer einhaengen.

use std::sync::Arc;
use std::time::Instant;

use backtalk_game::{RegistryConfig, ReverseTransform, SessionRegistry};
use backtalk_protocol::wire::DEFAULT_MAX_FRAME_SIZE;

use crate::broadcast::EventBroadcaster;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitig registrierte Spieler
    pub max_verbindungen: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale Frame-Groesse in Bytes (Audio-Frames sind gross)
    pub max_frame_groesse: usize,
    /// Intervall des Wartungslaufs in Sekunden
    pub aufraeum_intervall_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Backtalk Server".to_string(),
            max_verbindungen: 256,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            aufraeum_intervall_sek: 30,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState<T: ReverseTransform + 'static> {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Raum-Registry (Code-Vergabe, Lebenszyklus)
    pub registry: SessionRegistry,
    /// Event-Broadcaster (Nachrichten an Spieler senden)
    pub broadcaster: EventBroadcaster,
    /// Externer Audio-Umkehrer
    pub transform: Arc<T>,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl<T: ReverseTransform + 'static> SignalingState<T> {
    /// Erstellt einen neuen SignalingState
    pub fn neu(
        config: SignalingConfig,
        registry_config: RegistryConfig,
        transform: Arc<T>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: SessionRegistry::neu(registry_config),
            broadcaster: EventBroadcaster::neu(),
            transform,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
