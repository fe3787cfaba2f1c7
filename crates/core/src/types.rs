//! Gemeinsame Identifikationstypen fuer Backtalk
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Spieler-ID
///
/// Wird serverseitig pro Verbindung vergeben, sofern der Client nicht
/// eine bereits bekannte ID mitbringt (Reconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Erstellt eine neue zufaellige PlayerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Laenge eines Raum-Codes in Zeichen
pub const ROOM_CODE_LAENGE: usize = 4;

/// Fehler beim Parsen eines Raum-Codes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomCodeFehler {
    #[error("Raum-Code muss genau {ROOM_CODE_LAENGE} Zeichen lang sein, erhalten: {0}")]
    FalscheLaenge(usize),

    #[error("Raum-Code darf nur Grossbuchstaben A-Z enthalten: {0:?}")]
    UngueltigesZeichen(char),
}

/// Kurzer, teilbarer Raum-Code (genau 4 Zeichen A-Z)
///
/// Das Format entspricht dem was Spieler sich am Telefon zurufen koennen.
/// Eindeutigkeit unter den aktiven Raeumen garantiert die SessionRegistry,
/// nicht der Typ selbst.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validiert und erstellt einen Raum-Code aus einem String
    pub fn neu(code: impl Into<String>) -> Result<Self, RoomCodeFehler> {
        let code = code.into();
        if code.len() != ROOM_CODE_LAENGE {
            return Err(RoomCodeFehler::FalscheLaenge(code.len()));
        }
        if let Some(zeichen) = code.chars().find(|c| !c.is_ascii_uppercase()) {
            return Err(RoomCodeFehler::UngueltigesZeichen(zeichen));
        }
        Ok(Self(code))
    }

    /// Erstellt einen zufaelligen Raum-Code (A-Z, 4 Zeichen)
    ///
    /// Kollisionen mit bestehenden Raeumen prueft der Aufrufer.
    pub fn zufaellig() -> Self {
        let mut rng = rand::rng();
        let code: String = (0..ROOM_CODE_LAENGE)
            .map(|_| (b'A' + rng.random_range(0..26u8)) as char)
            .collect();
        Self(code)
    }

    /// Gibt den Code als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeFehler;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::neu(value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_eindeutig() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        assert_ne!(a, b, "Zwei neue PlayerIds muessen verschieden sein");
    }

    #[test]
    fn player_id_display() {
        let id = PlayerId(Uuid::nil());
        assert!(id.to_string().starts_with("player:"));
    }

    #[test]
    fn player_id_serde_kompatibel() {
        let id = PlayerId::new();
        let json = serde_json::to_string(&id).unwrap();
        let id2: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, id2);
    }

    #[test]
    fn room_code_gueltig() {
        let code = RoomCode::neu("ABCD").unwrap();
        assert_eq!(code.as_str(), "ABCD");
        assert_eq!(code.to_string(), "ABCD");
    }

    #[test]
    fn room_code_falsche_laenge() {
        assert_eq!(
            RoomCode::neu("ABC"),
            Err(RoomCodeFehler::FalscheLaenge(3))
        );
        assert_eq!(
            RoomCode::neu("ABCDE"),
            Err(RoomCodeFehler::FalscheLaenge(5))
        );
    }

    #[test]
    fn room_code_ungueltige_zeichen() {
        assert_eq!(
            RoomCode::neu("abcd"),
            Err(RoomCodeFehler::UngueltigesZeichen('a'))
        );
        assert_eq!(
            RoomCode::neu("AB1D"),
            Err(RoomCodeFehler::UngueltigesZeichen('1'))
        );
    }

    #[test]
    fn room_code_zufaellig_format() {
        for _ in 0..50 {
            let code = RoomCode::zufaellig();
            assert_eq!(code.as_str().len(), ROOM_CODE_LAENGE);
            assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn room_code_serde_als_string() {
        let code = RoomCode::neu("WXYZ").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"WXYZ\"");
        let zurueck: RoomCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, zurueck);
    }

    #[test]
    fn room_code_serde_lehnt_ungueltiges_ab() {
        let result: Result<RoomCode, _> = serde_json::from_str("\"abcd\"");
        assert!(result.is_err());
    }
}
