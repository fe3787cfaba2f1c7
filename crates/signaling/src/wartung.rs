//! Wartungslauf – Raum-Abbau und Runden-Fristen
//!
//! Ein periodischer Task der die Registry aufraeumt: Raeume die laenger
//! als die Leerlauf-Frist leer stehen werden abgebaut, und in Raeumen
//! mit konfiguriertem Runden-Timeout wird eine abgelaufene Runde
//! erzwungen weitergeschaltet (Nicht-Einreicher gelten als abwesend).
//!
//! Ohne konfigurierten Runden-Timeout schaltet der Lauf nie etwas weiter
//! – das ist das beobachtete Referenzverhalten als explizite
//! Konfiguration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use backtalk_game::ReverseTransform;

use crate::handlers::events_verteilen;
use crate::server_state::SignalingState;

/// Laeuft periodisch bis das Shutdown-Signal eingeht
pub async fn aufraeum_schleife<T: ReverseTransform + 'static>(
    state: Arc<SignalingState<T>>,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) {
    let intervall = Duration::from_secs(state.config.aufraeum_intervall_sek.max(1));
    let mut ticker = tokio::time::interval(intervall);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Der erste Tick feuert sofort und waere ein Leerlauf
    ticker.tick().await;

    tracing::debug!(intervall_sek = intervall.as_secs(), "Wartungslauf gestartet");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ergebnis = state.registry.aufraeumen(Instant::now());

                for code in &ergebnis.entfernt {
                    state.broadcaster.raum_aufloesen(code);
                }

                for (code, events) in &ergebnis.weitergeschaltet {
                    events_verteilen(&state.broadcaster, code, events);
                }

                if !ergebnis.entfernt.is_empty() || !ergebnis.weitergeschaltet.is_empty() {
                    tracing::info!(
                        abgebaut = ergebnis.entfernt.len(),
                        weitergeschaltet = ergebnis.weitergeschaltet.len(),
                        "Wartungslauf abgeschlossen"
                    );
                }
            }

            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::debug!("Wartungslauf: Shutdown-Signal empfangen");
                    break;
                }
            }
        }
    }
}
