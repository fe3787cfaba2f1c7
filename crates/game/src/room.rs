//! Room – Roster, Host und Spielablauf eines einzelnen Raums
//!
//! Der Raum uebersetzt externe Join/Leave/Start/Submit-Anfragen in
//! Scheduler-Uebergaenge und besitzt den AudioRelayStore. Alle
//! Operationen liefern [`RaumEvent`]-Werte zurueck, die die
//! Signaling-Schicht in Protokoll-Nachrichten uebersetzt – der Raum
//! selbst kennt keine Verbindungen.
//!
//! ## Sitzordnung
//! Die Reihenfolge von `spieler` ist die kanonische Sitzordnung fuer die
//! Relay-Rotation. Beim Start wird sie im Scheduler eingefroren; Joins in
//! einen aktiven Raum werden abgelehnt, Leaves entfernen den Sitz nur in
//! der Lobby. Ein getrennter Spieler behaelt seinen Sitz und kann sich
//! mit derselben PlayerId wieder verbinden.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use bytes::Bytes;

use backtalk_core::{PlayerId, RoomCode};

use crate::error::{GameError, GameResult};
use crate::relay;
use crate::results::{progressionen_erstellen, Progression};
use crate::scheduler::{RoundScheduler, RundenPhase, Weiterschaltung};
use crate::store::AudioRelayStore;

// ---------------------------------------------------------------------------
// Typen
// ---------------------------------------------------------------------------

/// Ein Sitz im Raum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spieler {
    pub id: PlayerId,
    pub name: String,
}

/// Status eines Raums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaumStatus {
    Lobby,
    Aktiv,
    Beendet,
}

/// Der Clip den ein Empfaenger in dieser Runde anhoeren muss
#[derive(Debug, Clone, PartialEq)]
pub struct ClipQuelle {
    /// Sitz dessen Einreichung gehoert wird
    pub spieler: PlayerId,
    /// true = umgekehrte Fassung
    pub umgekehrt: bool,
    pub daten: Bytes,
}

/// Personalisierter Runden-Payload fuer einen Empfaenger
#[derive(Debug, Clone, PartialEq)]
pub struct HoerClip {
    pub empfaenger: PlayerId,
    /// `None` in Runde 1 oder wenn die Quelle fehlt (erzwungene Vorrunde)
    pub quelle: Option<ClipQuelle>,
}

/// Zustandsaenderungen die nach aussen kommuniziert werden muessen
#[derive(Debug, Clone, PartialEq)]
pub enum RaumEvent {
    /// Neue Runde: pro Sitz ein personalisierter Payload
    RundenStart { runde: u32, clips: Vec<HoerClip> },
    /// Terminale Runde abgeschlossen: vollstaendiger Relay-Graph
    SpielBeendet { progressionen: Vec<Progression> },
}

/// Ergebnis eines Beitritts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beitritt {
    /// Neuer Sitz am Ende der Sitzordnung
    NeuerSitz,
    /// Spieler war bereits gesetzt (Reconnect)
    Wiederverbunden,
}

/// Ergebnis eines Verlassens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerlassenErgebnis {
    /// true wenn der Sitz entfernt wurde (nur in der Lobby)
    pub sitz_entfernt: bool,
    /// Gesetzt wenn der Host gegangen ist und ein Nachfolger befoerdert wurde
    pub neuer_host: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Ein isolierter Spiel-Raum
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host_id: PlayerId,
    spieler: Vec<Spieler>,
    max_spieler: u32,
    /// Aktuell verbundene Spieler (Teilmenge der Sitze)
    anwesend: HashSet<PlayerId>,
    scheduler: RoundScheduler,
    store: AudioRelayStore,
    /// Konfigurierter Runden-Timeout; `None` = die Runde wartet unbegrenzt
    runden_timeout: Option<Duration>,
    /// Frist der laufenden Runde, falls ein Timeout konfiguriert ist
    runden_frist: Option<Instant>,
    /// Zeitpunkt seit dem der Raum leer ist (fuer den Abbau)
    geleert_um: Option<Instant>,
}

impl Room {
    /// Erstellt einen neuen Raum mit dem Ersteller als Host auf Sitz 0
    pub fn neu(
        code: RoomCode,
        host_id: PlayerId,
        host_name: impl Into<String>,
        max_spieler: u32,
        runden_timeout: Option<Duration>,
    ) -> Self {
        let host = Spieler {
            id: host_id,
            name: host_name.into(),
        };
        Self {
            code,
            host_id,
            spieler: vec![host],
            max_spieler,
            anwesend: HashSet::from([host_id]),
            scheduler: RoundScheduler::neu(),
            store: AudioRelayStore::neu(),
            runden_timeout,
            runden_frist: None,
            geleert_um: None,
        }
    }

    // -----------------------------------------------------------------------
    // Zugriff
    // -----------------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn max_spieler(&self) -> u32 {
        self.max_spieler
    }

    /// Sitzordnung (Beitrittsreihenfolge)
    pub fn spieler(&self) -> &[Spieler] {
        &self.spieler
    }

    /// Abgeleiteter Raum-Status aus der Scheduler-Phase
    pub fn status(&self) -> RaumStatus {
        match self.scheduler.phase() {
            RundenPhase::Lobby => RaumStatus::Lobby,
            RundenPhase::Sammeln(_) => RaumStatus::Aktiv,
            RundenPhase::Beendet => RaumStatus::Beendet,
        }
    }

    /// Aktuelle Runde, `None` ausserhalb eines laufenden Spiels
    pub fn aktuelle_runde(&self) -> Option<u32> {
        self.scheduler.aktuelle_runde()
    }

    /// Prueft ob ein Spieler einen Sitz hat
    pub fn ist_gesetzt(&self, spieler: &PlayerId) -> bool {
        self.spieler.iter().any(|s| &s.id == spieler)
    }

    /// true wenn kein Spieler mehr verbunden ist
    pub fn ist_leer(&self) -> bool {
        self.anwesend.is_empty()
    }

    /// Wie lange der Raum schon leer ist, `None` wenn jemand verbunden ist
    pub fn leer_seit(&self, jetzt: Instant) -> Option<Duration> {
        self.geleert_um
            .map(|seit| jetzt.saturating_duration_since(seit))
    }

    /// true wenn die Runden-Frist ueberschritten ist
    pub fn frist_abgelaufen(&self, jetzt: Instant) -> bool {
        matches!(self.runden_frist, Some(frist) if jetzt >= frist)
    }

    // -----------------------------------------------------------------------
    // Roster-Operationen
    // -----------------------------------------------------------------------

    /// Fuegt einen Spieler hinzu oder verbindet einen gesetzten neu
    ///
    /// Idempotent fuer bereits gesetzte Spieler (Reconnect, auch waehrend
    /// eines laufenden Spiels). Neue Sitze nur in der Lobby und unter der
    /// Obergrenze.
    pub fn beitreten(&mut self, id: PlayerId, name: &str) -> GameResult<Beitritt> {
        if self.ist_gesetzt(&id) {
            self.anwesend.insert(id);
            self.geleert_um = None;
            tracing::debug!(raum = %self.code, spieler = %id, "Spieler wiederverbunden");
            return Ok(Beitritt::Wiederverbunden);
        }

        if self.status() != RaumStatus::Lobby {
            return Err(GameError::RaumNichtBeitretbar);
        }
        if self.spieler.len() as u32 >= self.max_spieler {
            return Err(GameError::RaumVoll {
                max: self.max_spieler,
            });
        }

        self.spieler.push(Spieler {
            id,
            name: name.to_string(),
        });
        self.anwesend.insert(id);
        self.geleert_um = None;

        tracing::info!(
            raum = %self.code,
            spieler = %id,
            name = %name,
            sitze = self.spieler.len(),
            "Spieler beigetreten"
        );
        Ok(Beitritt::NeuerSitz)
    }

    /// Entfernt einen Spieler aus dem Raum
    ///
    /// In der Lobby schrumpft die Sitzordnung; geht der Host, wird der
    /// naechste Sitz befoerdert. Waehrend eines laufenden Spiels bleibt
    /// der Sitz erhalten (eingefrorenes Roster), nur die Verbindung gilt
    /// als weg. No-op fuer unbekannte Spieler.
    pub fn verlassen(&mut self, id: &PlayerId) -> VerlassenErgebnis {
        self.anwesend.remove(id);

        let mut ergebnis = VerlassenErgebnis {
            sitz_entfernt: false,
            neuer_host: None,
        };

        if self.status() == RaumStatus::Lobby && self.ist_gesetzt(id) {
            self.spieler.retain(|s| &s.id != id);
            ergebnis.sitz_entfernt = true;

            if &self.host_id == id {
                if let Some(nachfolger) = self.spieler.first() {
                    self.host_id = nachfolger.id;
                    ergebnis.neuer_host = Some(nachfolger.id);
                    tracing::info!(
                        raum = %self.code,
                        neuer_host = %nachfolger.id,
                        "Host gegangen, naechster Sitz befoerdert"
                    );
                }
            }

            tracing::info!(raum = %self.code, spieler = %id, "Spieler hat den Raum verlassen");
        } else {
            tracing::debug!(raum = %self.code, spieler = %id, "Spieler getrennt, Sitz bleibt");
        }

        if self.anwesend.is_empty() && self.geleert_um.is_none() {
            self.geleert_um = Some(Instant::now());
        }

        ergebnis
    }

    // -----------------------------------------------------------------------
    // Spiel-Operationen
    // -----------------------------------------------------------------------

    /// Startet das Spiel (nur Host, nur Lobby, >= 2 Spieler)
    ///
    /// Friert die Sitzordnung ein und liefert den Runde-1-Payload
    /// (ohne Hoer-Audio).
    pub fn starten(&mut self, anfragender: PlayerId) -> GameResult<RaumEvent> {
        if anfragender != self.host_id {
            return Err(GameError::NichtHost);
        }

        let roster: Vec<PlayerId> = self.spieler.iter().map(|s| s.id).collect();
        let total = self.scheduler.starten(roster)?;
        self.frist_neu_setzen();

        tracing::info!(
            raum = %self.code,
            spieler = total,
            runden = total,
            "Spiel gestartet"
        );
        Ok(self.runden_event(1))
    }

    /// Prueft ob eine Einreichung angenommen wuerde, ohne Seiteneffekt
    ///
    /// Damit kann die Signaling-Schicht offensichtlich ungueltige Uploads
    /// ablehnen bevor sie die Audio-Transformation bezahlt.
    pub fn pruefe_einreichung(&self, spieler: &PlayerId, runde: u32) -> GameResult<()> {
        self.scheduler.pruefen(spieler, runde)
    }

    /// Verbucht eine Einreichung (Original + umgekehrte Fassung)
    ///
    /// Schliesst die Einreichung die Barriere, schaltet der Raum sofort
    /// weiter und die zurueckgegebenen Events enthalten den naechsten
    /// Runden-Payload bzw. den Relay-Graphen. Eine leere Event-Liste
    /// heisst: angenommen, Barriere noch offen.
    pub fn einreichen(
        &mut self,
        spieler: PlayerId,
        runde: u32,
        original: Bytes,
        umgekehrt: Bytes,
    ) -> GameResult<Vec<RaumEvent>> {
        let geschlossen = self.scheduler.einreichen(spieler, runde)?;
        self.store.einfuegen(runde, spieler, original, umgekehrt);

        tracing::debug!(
            raum = %self.code,
            spieler = %spieler,
            runde,
            ausstehend = self.scheduler.ausstehend().len(),
            "Einreichung verbucht"
        );

        if !geschlossen {
            return Ok(Vec::new());
        }
        let weiter = self.scheduler.weiterschalten()?;
        Ok(vec![self.nach_weiterschaltung(weiter)])
    }

    /// Erzwungenes Weiterschalten nach abgelaufener Runden-Frist
    ///
    /// Nicht-Einreicher gelten fuer diese Runde als abwesend; ihre
    /// Progression-Glieder bleiben leer.
    pub fn erzwinge_weiterschalten(&mut self) -> GameResult<Vec<RaumEvent>> {
        let weiter = self.scheduler.erzwinge_weiterschalten()?;
        Ok(vec![self.nach_weiterschaltung(weiter)])
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn nach_weiterschaltung(&mut self, weiter: Weiterschaltung) -> RaumEvent {
        match weiter {
            Weiterschaltung::NaechsteRunde(runde) => {
                self.frist_neu_setzen();
                self.runden_event(runde)
            }
            Weiterschaltung::Beendet => {
                self.runden_frist = None;
                let progressionen =
                    progressionen_erstellen(self.scheduler.roster(), &self.store);
                tracing::info!(
                    raum = %self.code,
                    progressionen = progressionen.len(),
                    "Spiel beendet, Relay-Graph wird verteilt"
                );
                RaumEvent::SpielBeendet { progressionen }
            }
        }
    }

    fn frist_neu_setzen(&mut self) {
        self.runden_frist = self.runden_timeout.map(|t| Instant::now() + t);
    }

    /// Baut den personalisierten Runden-Payload fuer jeden Sitz
    ///
    /// Die Quelle fehlt in Runde 1 immer; spaeter auch dann, wenn der
    /// Quell-Sitz in der Vorrunde nichts eingereicht hat (erzwungenes
    /// Weiterschalten).
    fn runden_event(&self, runde: u32) -> RaumEvent {
        let roster = self.scheduler.roster();
        let anzahl = roster.len();

        let clips = roster
            .iter()
            .enumerate()
            .map(|(sitz, empfaenger)| {
                let quelle = relay::zuteilung(sitz, runde, anzahl).and_then(|z| {
                    let quell_spieler = roster[z.quell_sitz];
                    self.store
                        .holen(z.quell_runde, &quell_spieler)
                        .map(|eintrag| ClipQuelle {
                            spieler: quell_spieler,
                            umgekehrt: z.umgekehrt,
                            daten: if z.umgekehrt {
                                eintrag.umgekehrt.clone()
                            } else {
                                eintrag.original.clone()
                            },
                        })
                });
                HoerClip {
                    empfaenger: *empfaenger,
                    quelle,
                }
            })
            .collect();

        RaumEvent::RundenStart { runde, clips }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
