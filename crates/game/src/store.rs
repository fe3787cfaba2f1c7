//! AudioRelayStore – Einreichungen pro (Runde, Spieler)
//!
//! Reiner Datenhalter ohne Verhalten: Einfuegen (mit Ueberschreiben)
//! und Nachschlagen. Die Eintraege leben genau so lange wie der
//! besitzende Raum; Persistenz ueber Neustarts ist bewusst kein Ziel.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use backtalk_core::PlayerId;

/// Eine verbuchte Einreichung: Original- und umgekehrte Fassung
#[derive(Debug, Clone)]
pub struct ClipEintrag {
    pub original: Bytes,
    pub umgekehrt: Bytes,
    pub eingereicht_um: DateTime<Utc>,
}

/// Append-only Store der Einreichungen, indiziert nach (Runde, Spieler)
///
/// Eine erneute Einreichung fuer denselben Schluessel ueberschreibt den
/// vorherigen Eintrag (die juengste Aufnahme gewinnt).
#[derive(Debug, Default)]
pub struct AudioRelayStore {
    eintraege: HashMap<(u32, PlayerId), ClipEintrag>,
}

impl AudioRelayStore {
    /// Erstellt einen leeren Store
    pub fn neu() -> Self {
        Self::default()
    }

    /// Verbucht eine Einreichung, ueberschreibt einen bestehenden Eintrag
    pub fn einfuegen(&mut self, runde: u32, spieler: PlayerId, original: Bytes, umgekehrt: Bytes) {
        self.eintraege.insert(
            (runde, spieler),
            ClipEintrag {
                original,
                umgekehrt,
                eingereicht_um: Utc::now(),
            },
        );
    }

    /// Schlaegt die Einreichung eines Spielers fuer eine Runde nach
    pub fn holen(&self, runde: u32, spieler: &PlayerId) -> Option<&ClipEintrag> {
        self.eintraege.get(&(runde, *spieler))
    }

    /// Prueft ob eine Einreichung fuer (Runde, Spieler) existiert
    pub fn enthaelt(&self, runde: u32, spieler: &PlayerId) -> bool {
        self.eintraege.contains_key(&(runde, *spieler))
    }

    /// Anzahl der verbuchten Einreichungen
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}
