//! Event-Broadcaster – Sendet Nachrichten an Raum-Mitglieder
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Spieler und die Raum-Mitgliedschaft fuer selektives Broadcasting.
//!
//! ## Selektives Senden
//! - An einen Spieler: `an_spieler_senden` (personalisierte Runden-Payloads)
//! - An einen Raum: `an_raum_senden`
//! - An einen Raum ausser einem Spieler: `an_raum_ausser_senden`

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use backtalk_core::{PlayerId, RoomCode};
use backtalk_protocol::control::GameMessage;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Spieler
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Spielers
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub spieler: PlayerId,
    pub tx: mpsc::Sender<GameMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Spieler
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: GameMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(spieler = %self.spieler, "Send-Queue voll, Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(spieler = %self.spieler, "Send-Queue geschlossen (Spieler getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Spieler
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Send-Queues, indiziert nach PlayerId
    clients: DashMap<PlayerId, ClientSender>,
    /// Raum-Mitgliedschaft: RoomCode -> Spieler in Beitrittsreihenfolge
    raum_mitglieder: DashMap<RoomCode, Vec<PlayerId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert einen Spieler und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    /// Eine erneute Registrierung derselben PlayerId (Reconnect) ersetzt
    /// die alte Queue; der alte Socket bekommt nichts mehr.
    pub fn spieler_registrieren(&self, spieler: PlayerId) -> mpsc::Receiver<GameMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { spieler, tx };
        if self.inner.clients.insert(spieler, sender).is_some() {
            tracing::debug!(spieler = %spieler, "Alte Send-Queue durch Reconnect ersetzt");
        }
        tracing::debug!(spieler = %spieler, "Spieler im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Spieler aus dem Broadcaster und allen Raeumen
    pub fn spieler_entfernen(&self, spieler: &PlayerId) {
        self.inner.clients.remove(spieler);
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|p| p != spieler);
        });
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
        tracing::debug!(spieler = %spieler, "Spieler aus Broadcaster entfernt");
    }

    /// Traegt einen Spieler als Raum-Mitglied ein
    ///
    /// Ein Spieler ist in hoechstens einem Raum; ein vorheriger Eintrag
    /// wird entfernt. Doppelte Eintraege im selben Raum (Reconnect)
    /// entstehen nicht.
    pub fn raum_beitreten(&self, spieler: PlayerId, code: RoomCode) {
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|p| p != &spieler);
        });

        self.inner
            .raum_mitglieder
            .entry(code)
            .or_default()
            .push(spieler);
    }

    /// Entfernt einen Spieler aus seinem Raum
    pub fn raum_verlassen(&self, spieler: &PlayerId) {
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|p| p != spieler);
        });
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
    }

    /// Loest die Mitgliederliste eines Raums komplett auf (Raum-Abbau)
    pub fn raum_aufloesen(&self, code: &RoomCode) {
        self.inner.raum_mitglieder.remove(code);
    }

    /// Sendet eine Nachricht an einen einzelnen Spieler
    ///
    /// Gibt `true` zurueck wenn der Spieler verbunden ist und die
    /// Nachricht eingereiht wurde.
    pub fn an_spieler_senden(&self, spieler: &PlayerId, nachricht: GameMessage) -> bool {
        match self.inner.clients.get(spieler) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(spieler = %spieler, "Senden an nicht verbundenen Spieler");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Mitglieder eines Raums
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_raum_senden(&self, code: &RoomCode, nachricht: GameMessage) -> usize {
        let mitglieder = match self.inner.raum_mitglieder.get(code) {
            Some(m) => m.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for spieler in &mitglieder {
            if let Some(sender) = self.inner.clients.get(spieler) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet eine Nachricht an alle Raum-Mitglieder ausser einem
    ///
    /// Nuetzlich fuer Join/Leave-Broadcasts ohne den Ausloeser.
    pub fn an_raum_ausser_senden(
        &self,
        code: &RoomCode,
        ausgeschlossen: &PlayerId,
        nachricht: GameMessage,
    ) -> usize {
        let mitglieder = match self.inner.raum_mitglieder.get(code) {
            Some(m) => m.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for spieler in &mitglieder {
            if spieler == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.clients.get(spieler) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Gibt die Anzahl der registrierten Spieler zurueck
    pub fn spieler_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob ein Spieler registriert ist
    pub fn ist_registriert(&self, spieler: &PlayerId) -> bool {
        self.inner.clients.contains_key(spieler)
    }

    /// Gibt alle Mitglieder eines Raums zurueck
    pub fn spieler_in_raum(&self, code: &RoomCode) -> Vec<PlayerId> {
        self.inner
            .raum_mitglieder
            .get(code)
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nachricht(id: u32) -> GameMessage {
        GameMessage::ping(id, 12345)
    }

    fn test_code(s: &str) -> RoomCode {
        RoomCode::neu(s).unwrap()
    }

    #[tokio::test]
    async fn registrieren_und_senden() {
        let broadcaster = EventBroadcaster::neu();
        let spieler = PlayerId::new();

        let mut rx = broadcaster.spieler_registrieren(spieler);
        assert!(broadcaster.ist_registriert(&spieler));

        assert!(broadcaster.an_spieler_senden(&spieler, test_nachricht(1)));

        let empfangen = rx.try_recv().expect("Nachricht muss vorhanden sein");
        assert_eq!(empfangen.request_id, 1);
    }

    #[tokio::test]
    async fn an_raum_senden_erreicht_nur_mitglieder() {
        let broadcaster = EventBroadcaster::neu();
        let raum = test_code("ABCD");

        let a = PlayerId::new();
        let b = PlayerId::new();
        let c = PlayerId::new(); // kein Raum-Mitglied

        let mut rx_a = broadcaster.spieler_registrieren(a);
        let mut rx_b = broadcaster.spieler_registrieren(b);
        let mut rx_c = broadcaster.spieler_registrieren(c);

        broadcaster.raum_beitreten(a, raum.clone());
        broadcaster.raum_beitreten(b, raum.clone());

        let gesendet = broadcaster.an_raum_senden(&raum, test_nachricht(10));
        assert_eq!(gesendet, 2);

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err(), "c darf nichts empfangen");
    }

    #[tokio::test]
    async fn an_raum_ausser_senden() {
        let broadcaster = EventBroadcaster::neu();
        let raum = test_code("WXYZ");

        let a = PlayerId::new();
        let b = PlayerId::new();

        let mut rx_a = broadcaster.spieler_registrieren(a);
        let mut rx_b = broadcaster.spieler_registrieren(b);

        broadcaster.raum_beitreten(a, raum.clone());
        broadcaster.raum_beitreten(b, raum.clone());

        // a ist der Ausloeser und bekommt keine Nachricht
        broadcaster.an_raum_ausser_senden(&raum, &a, test_nachricht(20));

        assert!(rx_a.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn reconnect_ersetzt_die_queue() {
        let broadcaster = EventBroadcaster::neu();
        let spieler = PlayerId::new();

        let mut rx_alt = broadcaster.spieler_registrieren(spieler);
        let mut rx_neu = broadcaster.spieler_registrieren(spieler);

        broadcaster.an_spieler_senden(&spieler, test_nachricht(7));

        // Nur der neue Socket empfaengt
        assert!(rx_alt.try_recv().is_err());
        assert_eq!(rx_neu.try_recv().unwrap().request_id, 7);
        assert_eq!(broadcaster.spieler_anzahl(), 1);
    }

    #[test]
    fn entfernen_bereinigt_raum_mitgliedschaft() {
        let broadcaster = EventBroadcaster::neu();
        let raum = test_code("MNOP");
        let spieler = PlayerId::new();

        let _rx = broadcaster.spieler_registrieren(spieler);
        broadcaster.raum_beitreten(spieler, raum.clone());
        assert_eq!(broadcaster.spieler_in_raum(&raum).len(), 1);

        broadcaster.spieler_entfernen(&spieler);
        assert!(!broadcaster.ist_registriert(&spieler));
        assert_eq!(broadcaster.spieler_in_raum(&raum).len(), 0);
    }

    #[test]
    fn raum_aufloesen_entfernt_alle_mitglieder() {
        let broadcaster = EventBroadcaster::neu();
        let raum = test_code("QRST");

        for _ in 0..3 {
            let spieler = PlayerId::new();
            let _rx = broadcaster.spieler_registrieren(spieler);
            broadcaster.raum_beitreten(spieler, raum.clone());
        }
        assert_eq!(broadcaster.spieler_in_raum(&raum).len(), 3);

        broadcaster.raum_aufloesen(&raum);
        assert!(broadcaster.spieler_in_raum(&raum).is_empty());
    }

    #[test]
    fn doppelter_beitritt_erzeugt_keinen_doppel_eintrag() {
        let broadcaster = EventBroadcaster::neu();
        let raum = test_code("UVWX");
        let spieler = PlayerId::new();

        broadcaster.raum_beitreten(spieler, raum.clone());
        broadcaster.raum_beitreten(spieler, raum.clone());

        assert_eq!(broadcaster.spieler_in_raum(&raum).len(), 1);
    }
}
