//! Handler fuer eingehende Nachrichten
//!
//! Gemeinsame Hilfsfunktionen: Raum-Schnappschuesse, Fehler-Abbildung
//! auf Protokoll-Codes, Base64 und die Event-Verteilung.

pub mod raum_handler;
pub mod spiel_handler;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use backtalk_core::RoomCode;
use backtalk_game::room::{RaumEvent, RaumStatus, Room};
use backtalk_game::GameError;
use backtalk_protocol::control::{
    ErrorCode, GameMessage, GamePayload, GameRoundPayload, GameSummaryPayload, ListenAudio,
    PlayerInfo, Progression as ProgressionPayload, ProgressionClip, RoomSnapshot, RoomStatus,
};

use crate::broadcast::EventBroadcaster;

/// Baut den Protokoll-Schnappschuss eines Raums
pub(crate) fn schnappschuss(raum: &Room) -> RoomSnapshot {
    RoomSnapshot {
        code: raum.code().clone(),
        host_id: raum.host_id(),
        players: raum
            .spieler()
            .iter()
            .map(|s| PlayerInfo {
                id: s.id,
                name: s.name.clone(),
            })
            .collect(),
        max_players: raum.max_spieler(),
        status: match raum.status() {
            RaumStatus::Lobby => RoomStatus::Lobby,
            RaumStatus::Aktiv => RoomStatus::Active,
            RaumStatus::Beendet => RoomStatus::Finished,
        },
    }
}

/// Bildet einen Spielkern-Fehler auf den Protokoll-Code ab
pub(crate) fn fehler_code(fehler: &GameError) -> ErrorCode {
    match fehler {
        GameError::RaumNichtGefunden(_) => ErrorCode::RoomNotFound,
        GameError::RaumVoll { .. } => ErrorCode::RoomFull,
        GameError::RaumNichtBeitretbar => ErrorCode::RoomNotJoinable,
        GameError::NichtHost => ErrorCode::NotHost,
        GameError::ZuWenigSpieler { .. }
        | GameError::EinreichungAbgelehnt(_)
        | GameError::Transform(_) => ErrorCode::SubmissionRejected,
        GameError::Intern(_) => ErrorCode::InternalError,
    }
}

/// Erstellt die Fehler-Antwort fuer den Anfragenden
pub(crate) fn fehler_nachricht(request_id: u32, fehler: &GameError) -> GameMessage {
    GameMessage::error(request_id, fehler_code(fehler), fehler.to_string())
}

/// Kodiert Audio-Daten fuer den Draht
pub(crate) fn b64_kodieren(daten: &[u8]) -> String {
    BASE64.encode(daten)
}

/// Dekodiert Audio-Daten vom Draht
pub(crate) fn b64_dekodieren(daten: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(daten)
}

/// Verteilt Raum-Events als Protokoll-Nachrichten
///
/// Runden-Payloads sind pro Empfaenger personalisiert (jeder hoert einen
/// anderen Clip), der Relay-Graph geht an alle Raum-Mitglieder.
pub(crate) fn events_verteilen(
    broadcaster: &EventBroadcaster,
    code: &RoomCode,
    events: &[RaumEvent],
) {
    for event in events {
        match event {
            RaumEvent::RundenStart { runde, clips } => {
                for clip in clips {
                    let payload = GameRoundPayload {
                        round_number: *runde,
                        listen_audio: clip.quelle.as_ref().map(|q| ListenAudio {
                            source_player: q.spieler,
                            reversed: q.umgekehrt,
                            file_data: b64_kodieren(&q.daten),
                        }),
                    };
                    broadcaster.an_spieler_senden(
                        &clip.empfaenger,
                        GameMessage::broadcast(GamePayload::GameRound(payload)),
                    );
                }
                tracing::debug!(raum = %code, runde, "Runden-Payloads verteilt");
            }
            RaumEvent::SpielBeendet { progressionen } => {
                let payload = GameSummaryPayload {
                    progressions: progressionen
                        .iter()
                        .map(|p| ProgressionPayload {
                            origin_player: p.ursprung,
                            clips: p
                                .eintraege
                                .iter()
                                .map(|e| ProgressionClip {
                                    round_number: e.runde,
                                    player_id: e.spieler,
                                    original: e.original.as_deref().map(b64_kodieren),
                                    reversed: e.umgekehrt.as_deref().map(b64_kodieren),
                                })
                                .collect(),
                        })
                        .collect(),
                };
                let empfaenger = broadcaster.an_raum_senden(
                    code,
                    GameMessage::broadcast(GamePayload::GameSummary(payload)),
                );
                tracing::info!(raum = %code, empfaenger, "Relay-Graph verteilt");
            }
        }
    }
}
