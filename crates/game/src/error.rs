//! Fehlertypen fuer den Spielkern

use backtalk_core::RoomCode;
use thiserror::Error;

/// Fehlertyp fuer alle Raum- und Spiel-Operationen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Kein aktiver Raum unter diesem Code
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(RoomCode),

    /// Raum hat die maximale Spielerzahl erreicht
    #[error("Raum ist voll ({max} Plaetze)")]
    RaumVoll { max: u32 },

    /// Beitritt nur in der Lobby moeglich (Sitzordnung ist eingefroren)
    #[error("Raum nimmt keine Spieler mehr auf")]
    RaumNichtBeitretbar,

    /// Nur der Host darf das Spiel starten
    #[error("Nur der Host darf das Spiel starten")]
    NichtHost,

    /// Start erfordert mindestens zwei Spieler
    #[error("Zu wenig Spieler zum Starten: {anzahl} (Minimum: 2)")]
    ZuWenigSpieler { anzahl: usize },

    /// Einreichung passt nicht zum aktuellen Zustand (falsche Runde,
    /// fremder Spieler, Spiel nicht aktiv) – keinerlei Seiteneffekt
    #[error("Einreichung abgelehnt: {0}")]
    EinreichungAbgelehnt(String),

    /// Die externe Audio-Transformation ist fehlgeschlagen; die
    /// Einreichung wurde nicht verbucht
    #[error("Audio-Transformation fehlgeschlagen: {0}")]
    Transform(String),

    /// Interner Fehler (Zustaende die das Design ausschliesst)
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl GameError {
    /// Erstellt eine Einreichungs-Ablehnung
    pub fn abgelehnt(msg: impl Into<String>) -> Self {
        Self::EinreichungAbgelehnt(msg.into())
    }

    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Typ fuer den Spielkern
pub type GameResult<T> = Result<T, GameError>;
