//! Control-Protokoll (TCP)
//!
//! Definiert alle Steuerungsnachrichten die zwischen Client und Server
//! ausgetauscht werden: Raum-Verwaltung, Runden-Ablauf, Audio-Uploads
//! und die Ergebnis-Auslieferung.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht traegt eine `requestId: u32`
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen (`type`-Feld,
//!   snake_case), Payload-Felder in camelCase
//! - Audio-Daten reisen als Base64-Strings (`fileData`), wie sie der
//!   Browser-Client aufnimmt

use serde::{Deserialize, Serialize};

use backtalk_core::{PlayerId, RoomCode};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    // Raum-Lebenszyklus
    RoomNotFound,
    RoomFull,
    RoomNotJoinable,
    // Spiel
    SubmissionRejected,
    NotHost,
}

// ---------------------------------------------------------------------------
// Raum-Schnappschuss
// ---------------------------------------------------------------------------

/// Status eines Raums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Wartet auf Spieler, Beitritt moeglich
    Lobby,
    /// Spiel laeuft, Sitzordnung eingefroren
    Active,
    /// Spiel beendet, Ergebnisse verteilt
    Finished,
}

/// Ein Spieler im Raum-Schnappschuss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
}

/// Vollstaendiger Blick auf einen Raum, wie ihn Clients sehen
///
/// Die Reihenfolge von `players` ist die kanonische Sitzordnung
/// (Beitrittsreihenfolge) auf der die Relay-Rotation basiert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub players: Vec<PlayerInfo>,
    pub max_players: u32,
    pub status: RoomStatus,
}

// ---------------------------------------------------------------------------
// Raum-Nachrichten
// ---------------------------------------------------------------------------

/// Raum erstellen (der Anfragende wird Host)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Anzeigename des Hosts
    pub player_name: String,
    /// Bereits bekannte Spieler-ID (Reconnect), sonst vergibt der Server eine
    pub player_id: Option<PlayerId>,
    /// Gewuenschte Obergrenze an Spielern (wird auf 2..=16 begrenzt)
    pub max_players: Option<u32>,
}

/// Bestaetigung der Raum-Erstellung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedResponse {
    pub room: RoomSnapshot,
}

/// Bestehendem Raum beitreten
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_code: RoomCode,
    pub player_name: String,
    /// Bereits bekannte Spieler-ID (Reconnect), sonst vergibt der Server eine
    pub player_id: Option<PlayerId>,
}

/// Bestaetigung des Raum-Beitritts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinedResponse {
    pub room: RoomSnapshot,
}

/// Broadcast an alle Raum-Mitglieder bei jeder Roster-Aenderung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomUpdatedNotification {
    pub room: RoomSnapshot,
}

// ---------------------------------------------------------------------------
// Spiel-Nachrichten
// ---------------------------------------------------------------------------

/// Der Clip den ein Spieler in dieser Runde anhoeren muss
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenAudio {
    /// Sitz dessen Einreichung der Empfaenger hoert
    pub source_player: PlayerId,
    /// true = umgekehrte Fassung, false = Original
    pub reversed: bool,
    /// Base64-kodierte Audio-Daten
    pub file_data: String,
}

/// Runden-Payload, pro Empfaenger personalisiert
///
/// Runde 1 traegt kein Hoer-Audio (`listenAudio: null`) – es gibt noch
/// nichts anzuhoeren.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRoundPayload {
    pub round_number: u32,
    pub listen_audio: Option<ListenAudio>,
}

/// Audio-Einreichung fuer die laufende Runde
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    pub round_number: u32,
    /// Base64-kodierte Audio-Daten (Original-Aufnahme)
    pub file_data: String,
}

/// Bestaetigung einer angenommenen Einreichung
///
/// Damit kann ein Client "wartet auf die Barriere" von "verloren
/// gegangen" unterscheiden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAcceptedResponse {
    pub round_number: u32,
}

/// Ein Glied einer Progression
///
/// `original`/`reversed` sind `None` wenn der Beitrag fehlt (Runde per
/// Timeout erzwungen weitergeschaltet).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionClip {
    pub round_number: u32,
    pub player_id: PlayerId,
    pub original: Option<String>,
    pub reversed: Option<String>,
}

/// Die Kette die von der Runde-1-Aufnahme eines Sitzes abstammt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    /// Sitz dessen Original-Aufnahme die Kette begruendet
    pub origin_player: PlayerId,
    /// Genau ein Clip pro Runde, in Rundenreihenfolge
    pub clips: Vec<ProgressionClip>,
}

/// Terminaler Broadcast: der vollstaendige Relay-Graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummaryPayload {
    pub progressions: Vec<Progression>,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: GamePayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamePayload {
    // Raum
    CreateRoom(CreateRoomRequest),
    RoomCreated(RoomCreatedResponse),
    JoinRoom(JoinRoomRequest),
    RoomJoined(RoomJoinedResponse),
    LeaveRoom,
    RoomUpdated(RoomUpdatedNotification),

    // Spiel
    StartGame,
    GameRound(GameRoundPayload),
    UploadFile(UploadFileRequest),
    UploadAccepted(UploadAcceptedResponse),
    GameSummary(GameSummaryPayload),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Nachrichten-Umschlag
// ---------------------------------------------------------------------------

/// Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `requestId` die der Client vergibt. Der
/// Server kopiert die ID in die Antwort damit der Client Request und
/// Response zuordnen kann; Broadcasts tragen `requestId: 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    /// Eindeutige Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: GamePayload,
}

/// Request-ID fuer server-initiierte Broadcasts
pub const BROADCAST_REQUEST_ID: u32 = 0;

impl GameMessage {
    /// Erstellt eine neue Nachricht
    pub fn new(request_id: u32, payload: GamePayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt einen server-initiierten Broadcast (requestId 0)
    pub fn broadcast(payload: GamePayload) -> Self {
        Self::new(BROADCAST_REQUEST_ID, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(request_id, GamePayload::Ping(PingMessage { timestamp_ms }))
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            GamePayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            GamePayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_snapshot() -> RoomSnapshot {
        let host = PlayerId::new();
        RoomSnapshot {
            code: RoomCode::neu("ABCD").unwrap(),
            host_id: host,
            players: vec![PlayerInfo {
                id: host,
                name: "Anna".to_string(),
            }],
            max_players: 8,
            status: RoomStatus::Lobby,
        }
    }

    #[test]
    fn create_room_serialisierung() {
        let msg = GameMessage::new(
            1,
            GamePayload::CreateRoom(CreateRoomRequest {
                player_name: "Anna".to_string(),
                player_id: None,
                max_players: Some(6),
            }),
        );
        let json = msg.to_json().unwrap();
        // Wire-Namen sind Teil des Vertrags
        assert!(json.contains("\"type\":\"create_room\""));
        assert!(json.contains("\"playerName\":\"Anna\""));
        assert!(json.contains("\"maxPlayers\":6"));
        assert!(json.contains("\"requestId\":1"));

        let decoded = GameMessage::from_json(&json).unwrap();
        assert_eq!(decoded.request_id, 1);
        if let GamePayload::CreateRoom(r) = decoded.payload {
            assert_eq!(r.player_name, "Anna");
            assert_eq!(r.max_players, Some(6));
        } else {
            panic!("Erwartet CreateRoom-Payload");
        }
    }

    #[test]
    fn join_room_serialisierung() {
        let msg = GameMessage::new(
            2,
            GamePayload::JoinRoom(JoinRoomRequest {
                room_code: RoomCode::neu("WXYZ").unwrap(),
                player_name: "Ben".to_string(),
                player_id: None,
            }),
        );
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"join_room\""));
        assert!(json.contains("\"roomCode\":\"WXYZ\""));

        let decoded = GameMessage::from_json(&json).unwrap();
        if let GamePayload::JoinRoom(r) = decoded.payload {
            assert_eq!(r.room_code.as_str(), "WXYZ");
            assert_eq!(r.player_name, "Ben");
        } else {
            panic!("Erwartet JoinRoom-Payload");
        }
    }

    #[test]
    fn room_snapshot_wire_felder() {
        let msg = GameMessage::broadcast(GamePayload::RoomUpdated(RoomUpdatedNotification {
            room: test_snapshot(),
        }));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"room_updated\""));
        assert!(json.contains("\"hostId\""));
        assert!(json.contains("\"maxPlayers\":8"));
        assert!(json.contains("\"status\":\"lobby\""));
    }

    #[test]
    fn game_round_erste_runde_ohne_audio() {
        let msg = GameMessage::broadcast(GamePayload::GameRound(GameRoundPayload {
            round_number: 1,
            listen_audio: None,
        }));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"game_round\""));
        assert!(json.contains("\"roundNumber\":1"));
        // Runde 1: explizit null, nicht weggelassen
        assert!(json.contains("\"listenAudio\":null"));
    }

    #[test]
    fn game_round_mit_hoer_audio() {
        let quelle = PlayerId::new();
        let msg = GameMessage::broadcast(GamePayload::GameRound(GameRoundPayload {
            round_number: 2,
            listen_audio: Some(ListenAudio {
                source_player: quelle,
                reversed: true,
                file_data: "QUJD".to_string(),
            }),
        }));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"sourcePlayer\""));
        assert!(json.contains("\"reversed\":true"));
        assert!(json.contains("\"fileData\":\"QUJD\""));

        let decoded = GameMessage::from_json(&json).unwrap();
        if let GamePayload::GameRound(r) = decoded.payload {
            let audio = r.listen_audio.expect("Hoer-Audio erwartet");
            assert_eq!(audio.source_player, quelle);
            assert!(audio.reversed);
        } else {
            panic!("Erwartet GameRound-Payload");
        }
    }

    #[test]
    fn upload_file_serialisierung() {
        let msg = GameMessage::new(
            7,
            GamePayload::UploadFile(UploadFileRequest {
                round_number: 3,
                file_data: "AAAA".to_string(),
            }),
        );
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"upload_file\""));
        assert!(json.contains("\"roundNumber\":3"));
        assert!(json.contains("\"fileData\":\"AAAA\""));
    }

    #[test]
    fn game_summary_serialisierung() {
        let ursprung = PlayerId::new();
        let beitragender = PlayerId::new();
        let msg = GameMessage::broadcast(GamePayload::GameSummary(GameSummaryPayload {
            progressions: vec![Progression {
                origin_player: ursprung,
                clips: vec![ProgressionClip {
                    round_number: 1,
                    player_id: beitragender,
                    original: Some("QQ==".to_string()),
                    reversed: None,
                }],
            }],
        }));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"game_summary\""));
        assert!(json.contains("\"progressions\""));
        assert!(json.contains("\"originPlayer\""));

        let decoded = GameMessage::from_json(&json).unwrap();
        if let GamePayload::GameSummary(s) = decoded.payload {
            assert_eq!(s.progressions.len(), 1);
            assert_eq!(s.progressions[0].clips[0].round_number, 1);
            assert!(s.progressions[0].clips[0].reversed.is_none());
        } else {
            panic!("Erwartet GameSummary-Payload");
        }
    }

    #[test]
    fn fieldless_varianten() {
        let start = GameMessage::new(4, GamePayload::StartGame);
        let json = start.to_json().unwrap();
        assert!(json.contains("\"type\":\"start_game\""));
        assert!(matches!(
            GameMessage::from_json(&json).unwrap().payload,
            GamePayload::StartGame
        ));

        let leave = GameMessage::new(5, GamePayload::LeaveRoom);
        let json = leave.to_json().unwrap();
        assert!(json.contains("\"type\":\"leave_room\""));
    }

    #[test]
    fn error_response_serialisierung() {
        let msg = GameMessage::error(42, ErrorCode::RoomNotFound, "Raum existiert nicht");
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"code\":\"ROOM_NOT_FOUND\""));

        let decoded = GameMessage::from_json(&json).unwrap();
        assert_eq!(decoded.request_id, 42);
        if let GamePayload::Error(e) = decoded.payload {
            assert_eq!(e.code, ErrorCode::RoomNotFound);
            assert_eq!(e.message, "Raum existiert nicht");
        } else {
            panic!("Erwartet Error-Payload");
        }
    }

    #[test]
    fn error_codes_serialisierbar() {
        let codes = [
            ErrorCode::InternalError,
            ErrorCode::InvalidRequest,
            ErrorCode::RoomNotFound,
            ErrorCode::RoomFull,
            ErrorCode::RoomNotJoinable,
            ErrorCode::SubmissionRejected,
            ErrorCode::NotHost,
        ];
        for code in &codes {
            let json = serde_json::to_string(code).unwrap();
            let decoded: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(*code, decoded);
        }
    }

    #[test]
    fn ping_pong_serialisierung() {
        let ping = GameMessage::ping(1, 1234567890);
        let json = ping.to_json().unwrap();
        let decoded = GameMessage::from_json(&json).unwrap();
        assert_eq!(decoded.request_id, 1);
        if let GamePayload::Ping(p) = decoded.payload {
            assert_eq!(p.timestamp_ms, 1234567890);
        } else {
            panic!("Erwartet Ping-Payload");
        }
    }
}
