//! Raum-Handler – CreateRoom, JoinRoom, LeaveRoom
//!
//! Uebersetzt Raum-Anfragen in Registry-Operationen und verteilt
//! `room_updated`-Broadcasts an die Mitbewohner. Kapazitaets- und
//! Lebenszyklus-Fehler gehen nur an den Anfragenden.

use backtalk_core::{PlayerId, RoomCode};
use backtalk_game::ReverseTransform;
use backtalk_protocol::control::{
    CreateRoomRequest, GameMessage, GamePayload, JoinRoomRequest, RoomCreatedResponse,
    RoomJoinedResponse, RoomUpdatedNotification,
};

use crate::dispatcher::DispatcherContext;
use crate::handlers::{fehler_nachricht, schnappschuss};
use crate::server_state::SignalingState;

/// Verarbeitet eine Raum-Erstellung
///
/// Der Anfragende wird Host auf Sitz 0. Bringt der Client eine eigene
/// PlayerId mit (Reconnect-Identitaet), wird sie uebernommen.
pub fn handle_create_room<T: ReverseTransform>(
    request: CreateRoomRequest,
    request_id: u32,
    ctx: &mut DispatcherContext,
    state: &SignalingState<T>,
) -> GameMessage {
    // Identitaet der Verbindung bleibt stabil: einmal gebunden gilt die
    // PlayerId auch fuer spaetere Raeume derselben Verbindung; die vom
    // Client mitgebrachte ID zaehlt nur fuer die erste Bindung (Reconnect)
    let spieler = ctx
        .spieler_id
        .or(request.player_id)
        .unwrap_or_else(PlayerId::new);

    match state
        .registry
        .raum_erstellen(spieler, &request.player_name, request.max_players)
    {
        Ok((code, raum)) => {
            ctx.spieler_id = Some(spieler);
            ctx.raum_code = Some(code.clone());
            state.broadcaster.raum_beitreten(spieler, code);

            let room = schnappschuss(&raum.lock());
            GameMessage::new(
                request_id,
                GamePayload::RoomCreated(RoomCreatedResponse { room }),
            )
        }
        Err(fehler) => fehler_nachricht(request_id, &fehler),
    }
}

/// Verarbeitet einen Raum-Beitritt
///
/// Idempotent fuer bereits gesetzte Spieler (Reconnect). Die uebrigen
/// Mitglieder bekommen den neuen Roster-Stand als Broadcast.
pub fn handle_join_room<T: ReverseTransform>(
    request: JoinRoomRequest,
    request_id: u32,
    ctx: &mut DispatcherContext,
    state: &SignalingState<T>,
) -> GameMessage {
    let spieler = ctx
        .spieler_id
        .or(request.player_id)
        .unwrap_or_else(PlayerId::new);

    match state
        .registry
        .raum_beitreten(&request.room_code, spieler, &request.player_name)
    {
        Ok(raum) => {
            ctx.spieler_id = Some(spieler);
            ctx.raum_code = Some(request.room_code.clone());
            state
                .broadcaster
                .raum_beitreten(spieler, request.room_code.clone());

            let room = schnappschuss(&raum.lock());
            state.broadcaster.an_raum_ausser_senden(
                &request.room_code,
                &spieler,
                GameMessage::broadcast(GamePayload::RoomUpdated(RoomUpdatedNotification {
                    room: room.clone(),
                })),
            );

            GameMessage::new(
                request_id,
                GamePayload::RoomJoined(RoomJoinedResponse { room }),
            )
        }
        Err(fehler) => fehler_nachricht(request_id, &fehler),
    }
}

/// Verarbeitet ein explizites Verlassen
///
/// In der Lobby schrumpft das Roster (ggf. mit Host-Befoerderung),
/// waehrend eines Spiels bleibt der Sitz erhalten. Der Anfragende
/// bekommt den Endstand, die Verbleibenden einen Broadcast.
pub fn handle_leave_room<T: ReverseTransform>(
    request_id: u32,
    spieler: PlayerId,
    code: &RoomCode,
    ctx: &mut DispatcherContext,
    state: &SignalingState<T>,
) -> GameMessage {
    let raum = match state.registry.raum_holen(code) {
        Ok(raum) => raum,
        Err(fehler) => {
            // Raum bereits abgebaut: Verlassen ist ein No-op
            ctx.raum_code = None;
            state.broadcaster.raum_verlassen(&spieler);
            return fehler_nachricht(request_id, &fehler);
        }
    };

    let (ergebnis, room) = {
        let mut raum = raum.lock();
        let ergebnis = raum.verlassen(&spieler);
        (ergebnis, schnappschuss(&raum))
    };

    ctx.raum_code = None;
    state.broadcaster.raum_verlassen(&spieler);

    if ergebnis.sitz_entfernt {
        state.broadcaster.an_raum_senden(
            code,
            GameMessage::broadcast(GamePayload::RoomUpdated(RoomUpdatedNotification {
                room: room.clone(),
            })),
        );
    }

    GameMessage::new(
        request_id,
        GamePayload::RoomUpdated(RoomUpdatedNotification { room }),
    )
}
