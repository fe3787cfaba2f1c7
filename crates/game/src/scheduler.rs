//! RoundScheduler – Rundenzaehler und Einreichungs-Barriere
//!
//! Treibt die Phasen eines Raums: `Lobby -> Sammeln(r) -> Beendet`.
//! Es gibt serverseitig keinen eigenen "Hoer"-Zustand – das Anhoeren ist
//! eine client-lokale Darstellung, der Server verfolgt nur das Einsammeln
//! der Einreichungen.
//!
//! ## Barriere
//! Eine Runde schaltet genau dann weiter, wenn jeder Sitz des beim Start
//! eingefrorenen Rosters eingereicht hat (`eingereicht == roster`).
//! Die Mitgliedschaft in der Barriere ist idempotent: eine erneute
//! Einreichung vor dem Schliessen zaehlt nicht doppelt. Das erzwungene
//! Weiterschalten (Runden-Timeout) ist ein separater, expliziter Pfad –
//! der normale Pfad kann nie mit weniger Einreichungen weiterschalten.

use std::collections::HashSet;

use backtalk_core::PlayerId;

use crate::error::{GameError, GameResult};

/// Phase des Schedulers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RundenPhase {
    /// Noch nicht gestartet
    Lobby,
    /// Runde laeuft, Einreichungen werden gesammelt
    Sammeln(u32),
    /// Terminale Runde abgeschlossen
    Beendet,
}

/// Ergebnis eines Weiterschaltens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weiterschaltung {
    /// Naechste Runde beginnt
    NaechsteRunde(u32),
    /// Terminale Runde war abgeschlossen, Spiel ist vorbei
    Beendet,
}

/// Rundenzaehler + Barriere fuer genau einen Raum
#[derive(Debug)]
pub struct RoundScheduler {
    phase: RundenPhase,
    /// Beim Start eingefrorene Sitzordnung
    roster: Vec<PlayerId>,
    total_runden: u32,
    /// Barriere der aktuellen Runde; Teilmenge des Rosters
    eingereicht: HashSet<PlayerId>,
}

impl RoundScheduler {
    /// Erstellt einen Scheduler im Lobby-Zustand
    pub fn neu() -> Self {
        Self {
            phase: RundenPhase::Lobby,
            roster: Vec::new(),
            total_runden: 0,
            eingereicht: HashSet::new(),
        }
    }

    /// Aktuelle Phase
    pub fn phase(&self) -> RundenPhase {
        self.phase
    }

    /// Aktuelle Runde, `None` ausserhalb der Sammel-Phase
    pub fn aktuelle_runde(&self) -> Option<u32> {
        match self.phase {
            RundenPhase::Sammeln(r) => Some(r),
            _ => None,
        }
    }

    /// Gesamtzahl der Runden (= Spieleranzahl beim Start)
    pub fn total_runden(&self) -> u32 {
        self.total_runden
    }

    /// Beim Start eingefrorenes Roster in Sitzreihenfolge
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// Sitze die in der aktuellen Runde noch nicht eingereicht haben
    pub fn ausstehend(&self) -> Vec<PlayerId> {
        self.roster
            .iter()
            .filter(|p| !self.eingereicht.contains(p))
            .copied()
            .collect()
    }

    /// Startet das Spiel: friert das Roster ein und beginnt Runde 1
    ///
    /// `total_runden` wird auf die Spieleranzahl gesetzt. Nur aus der
    /// Lobby heraus gueltig, erfordert mindestens zwei Spieler.
    pub fn starten(&mut self, roster: Vec<PlayerId>) -> GameResult<u32> {
        if self.phase != RundenPhase::Lobby {
            return Err(GameError::abgelehnt("Spiel laeuft bereits"));
        }
        if roster.len() < 2 {
            return Err(GameError::ZuWenigSpieler {
                anzahl: roster.len(),
            });
        }

        self.total_runden = roster.len() as u32;
        self.roster = roster;
        self.eingereicht.clear();
        self.phase = RundenPhase::Sammeln(1);

        Ok(self.total_runden)
    }

    /// Prueft ob eine Einreichung angenommen wuerde, ohne Seiteneffekt
    ///
    /// Die Signaling-Schicht ruft das vor der teuren Audio-Transformation
    /// auf, damit offensichtlich ungueltige Uploads frueh scheitern.
    pub fn pruefen(&self, spieler: &PlayerId, runde: u32) -> GameResult<()> {
        let aktuelle = match self.phase {
            RundenPhase::Sammeln(r) => r,
            RundenPhase::Lobby => {
                return Err(GameError::abgelehnt("Spiel wurde noch nicht gestartet"))
            }
            RundenPhase::Beendet => return Err(GameError::abgelehnt("Spiel ist bereits beendet")),
        };

        if runde != aktuelle {
            return Err(GameError::abgelehnt(format!(
                "Einreichung fuer Runde {runde}, aktuell ist Runde {aktuelle}"
            )));
        }
        if !self.roster.contains(spieler) {
            return Err(GameError::abgelehnt("Spieler sitzt nicht in diesem Raum"));
        }
        Ok(())
    }

    /// Verbucht eine Einreichung in der Barriere
    ///
    /// Gibt `true` zurueck wenn die Barriere damit geschlossen ist
    /// (jeder Sitz hat eingereicht). Abgelehnte Einreichungen haben
    /// keinerlei Seiteneffekt.
    pub fn einreichen(&mut self, spieler: PlayerId, runde: u32) -> GameResult<bool> {
        self.pruefen(&spieler, runde)?;

        // Idempotent: doppelte Einreichung zaehlt nicht doppelt
        self.eingereicht.insert(spieler);

        Ok(self.eingereicht.len() == self.roster.len())
    }

    /// Schaltet nach geschlossener Barriere weiter
    ///
    /// Nur gueltig wenn wirklich jeder Sitz eingereicht hat – alles
    /// andere ist ein Programmierfehler des Aufrufers.
    pub fn weiterschalten(&mut self) -> GameResult<Weiterschaltung> {
        let runde = self
            .aktuelle_runde()
            .ok_or_else(|| GameError::intern("Weiterschalten ausserhalb der Sammel-Phase"))?;

        if self.eingereicht.len() != self.roster.len() {
            return Err(GameError::intern(format!(
                "Weiterschalten mit offener Barriere: {}/{}",
                self.eingereicht.len(),
                self.roster.len()
            )));
        }

        Ok(self.naechste_phase(runde))
    }

    /// Erzwungenes Weiterschalten (Runden-Timeout)
    ///
    /// Ignoriert die Barriere; Sitze ohne Einreichung gelten fuer diese
    /// Runde als abwesend. Explizit getrennt vom normalen Pfad.
    pub fn erzwinge_weiterschalten(&mut self) -> GameResult<Weiterschaltung> {
        let runde = self
            .aktuelle_runde()
            .ok_or_else(|| GameError::abgelehnt("Kein laufendes Spiel"))?;

        tracing::warn!(
            runde,
            ausstehend = self.roster.len() - self.eingereicht.len(),
            "Runde wird per Timeout erzwungen weitergeschaltet"
        );

        Ok(self.naechste_phase(runde))
    }

    fn naechste_phase(&mut self, runde: u32) -> Weiterschaltung {
        self.eingereicht.clear();
        if runde >= self.total_runden {
            self.phase = RundenPhase::Beendet;
            Weiterschaltung::Beendet
        } else {
            self.phase = RundenPhase::Sammeln(runde + 1);
            Weiterschaltung::NaechsteRunde(runde + 1)
        }
    }
}

impl Default for RoundScheduler {
    fn default() -> Self {
        Self::neu()
    }
}
