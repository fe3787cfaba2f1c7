//! Spiel-Handler – StartGame, UploadFile
//!
//! `start_game` friert das Roster ein und verteilt die Runde-1-Payloads.
//! `upload_file` verbucht eine Einreichung: Base64 dekodieren, billig
//! vorpruefen, die Audio-Umkehrung AUSSERHALB des Raum-Locks rechnen
//! (spawn_blocking), dann unter dem Lock verbuchen – eine langsame
//! Umkehrung blockiert so weder Joins noch andere Einreichungen.

use std::sync::Arc;

use bytes::Bytes;

use backtalk_core::{PlayerId, RoomCode};
use backtalk_game::{GameError, ReverseTransform};
use backtalk_protocol::control::{
    ErrorCode, GameMessage, GamePayload, RoomUpdatedNotification, UploadAcceptedResponse,
    UploadFileRequest,
};

use crate::handlers::{b64_dekodieren, events_verteilen, fehler_nachricht, schnappschuss};
use crate::server_state::SignalingState;

/// Verarbeitet den Spielstart (nur Host)
///
/// Bei Erfolg gibt es keine direkte Antwort: der Anfragende bekommt wie
/// alle anderen den `room_updated`-Broadcast und seinen personalisierten
/// `game_round`-Payload.
pub fn handle_start_game<T: ReverseTransform>(
    request_id: u32,
    spieler: PlayerId,
    code: &RoomCode,
    state: &SignalingState<T>,
) -> Option<GameMessage> {
    let raum = match state.registry.raum_holen(code) {
        Ok(raum) => raum,
        Err(fehler) => return Some(fehler_nachricht(request_id, &fehler)),
    };

    let (event, room) = {
        let mut raum = raum.lock();
        match raum.starten(spieler) {
            Ok(event) => (event, schnappschuss(&raum)),
            Err(fehler) => return Some(fehler_nachricht(request_id, &fehler)),
        }
    };

    // Erst der neue Raum-Status, dann die personalisierten Payloads
    state.broadcaster.an_raum_senden(
        code,
        GameMessage::broadcast(GamePayload::RoomUpdated(RoomUpdatedNotification { room })),
    );
    events_verteilen(&state.broadcaster, code, &[event]);

    None
}

/// Verarbeitet eine Audio-Einreichung
///
/// Schliesst die Einreichung die Barriere, werden direkt im Anschluss
/// die naechsten Runden-Payloads bzw. der Relay-Graph verteilt. Eine
/// fehlgeschlagene Transformation verbucht nichts – der Spieler muss
/// erneut senden.
pub async fn handle_upload_file<T: ReverseTransform + 'static>(
    request: UploadFileRequest,
    request_id: u32,
    spieler: PlayerId,
    code: &RoomCode,
    state: &Arc<SignalingState<T>>,
) -> GameMessage {
    let runde = request.round_number;

    let original = match b64_dekodieren(&request.file_data) {
        Ok(daten) => daten,
        Err(fehler) => {
            return GameMessage::error(
                request_id,
                ErrorCode::SubmissionRejected,
                format!("Ungueltige Base64-Daten: {fehler}"),
            );
        }
    };

    let raum = match state.registry.raum_holen(code) {
        Ok(raum) => raum,
        Err(fehler) => return fehler_nachricht(request_id, &fehler),
    };

    // Billige Vorpruefung, bevor die Transformation bezahlt wird
    if let Err(fehler) = raum.lock().pruefe_einreichung(&spieler, runde) {
        return fehler_nachricht(request_id, &fehler);
    }

    // Umkehrung ausserhalb des Raum-Locks
    let transform = Arc::clone(&state.transform);
    let eingabe = original.clone();
    let umgekehrt =
        match tokio::task::spawn_blocking(move || transform.umkehren(&eingabe)).await {
            Ok(Ok(daten)) => daten,
            Ok(Err(fehler)) => {
                tracing::warn!(
                    raum = %code,
                    spieler = %spieler,
                    runde,
                    fehler = %fehler,
                    "Audio-Transformation fehlgeschlagen, Einreichung nicht verbucht"
                );
                return fehler_nachricht(
                    request_id,
                    &GameError::Transform(format!("{} (bitte erneut senden)", fehler.0)),
                );
            }
            Err(fehler) => {
                return fehler_nachricht(
                    request_id,
                    &GameError::intern(format!("Transformations-Task abgebrochen: {fehler}")),
                );
            }
        };

    // Verbuchen unter dem Lock; die Runde kann inzwischen weiter sein,
    // einreichen() validiert erneut
    let events = match raum.lock().einreichen(
        spieler,
        runde,
        Bytes::from(original),
        Bytes::from(umgekehrt),
    ) {
        Ok(events) => events,
        Err(fehler) => return fehler_nachricht(request_id, &fehler),
    };

    events_verteilen(&state.broadcaster, code, &events);

    GameMessage::new(
        request_id,
        GamePayload::UploadAccepted(UploadAcceptedResponse {
            round_number: runde,
        }),
    )
}
