//! backtalk-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und verdrahtet die Subsysteme:
//! Registry + Broadcaster + TCP-Listener + Wartungslauf.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};

use backtalk_game::ByteUmkehrer;
use backtalk_signaling::{wartung, GameServer, SignalingState};
use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Geteilten Zustand aufbauen (Registry, Broadcaster, Umkehrer)
    /// 2. Wartungslauf starten (Raum-Abbau, Runden-Fristen)
    /// 3. TCP-Listener starten (Spiel-Protokoll)
    /// 4. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        let bind_adresse = self.config.tcp_bind_adresse();

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %bind_adresse,
            runden_timeout = ?self.config.spiel.runden_timeout_sek,
            "Server startet"
        );

        // Der Byte-Umkehrer ist der Platzhalter fuer den echten
        // Codec-bewussten Audio-Umkehrer (externer Kollaborateur)
        let state = SignalingState::neu(
            self.config.signaling_config(),
            self.config.registry_config(),
            Arc::new(ByteUmkehrer),
        );

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        // Wartungslauf
        let wartungs_task = tokio::spawn(wartung::aufraeum_schleife(
            Arc::clone(&state),
            shutdown_rx.clone(),
        ));

        // TCP-Listener
        let addr: std::net::SocketAddr = bind_adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse: {bind_adresse}"))?;
        let game_server = GameServer::neu(Arc::clone(&state), addr);
        let server_task = tokio::spawn(game_server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c()
            .await
            .context("Warten auf Ctrl-C fehlgeschlagen")?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);

        server_task
            .await
            .context("Server-Task abgebrochen")?
            .context("Server-Task fehlgeschlagen")?;
        wartungs_task.await.context("Wartungs-Task abgebrochen")?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
