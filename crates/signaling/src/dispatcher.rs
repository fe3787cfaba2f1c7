//! Message-Dispatcher – Routet GameMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt Nachrichten von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt die Antwort zurueck.
//!
//! ## Zustandspruefung
//! - `create_room`/`join_room` nur solange die Verbindung noch keinem
//!   Raum zugeordnet ist
//! - alle anderen Nachrichten erfordern eine Raum-Zuordnung
//! - Server->Client-Nachrichten vom Client sind immer ungueltig

use std::net::SocketAddr;
use std::sync::Arc;

use backtalk_core::{PlayerId, RoomCode};
use backtalk_game::ReverseTransform;
use backtalk_protocol::control::{
    ErrorCode, GameMessage, GamePayload, RoomUpdatedNotification,
};

use crate::handlers::{self, raum_handler, spiel_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Zustand der aktuellen Verbindung
pub struct DispatcherContext {
    /// Peer-Adresse fuer Logs
    pub peer_addr: SocketAddr,
    /// Spieler-ID sobald die Verbindung einem Spieler gehoert
    pub spieler_id: Option<PlayerId>,
    /// Raum dem die Verbindung zugeordnet ist
    pub raum_code: Option<RoomCode>,
}

impl DispatcherContext {
    /// Erstellt einen frischen Kontext fuer eine neue Verbindung
    pub fn neu(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            spieler_id: None,
            raum_code: None,
        }
    }
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende Nachrichten an die entsprechenden Handler und gibt
/// die Antwort-Nachricht zurueck.
pub struct MessageDispatcher<T: ReverseTransform + 'static> {
    state: Arc<SignalingState<T>>,
}

impl<T: ReverseTransform + 'static> MessageDispatcher<T> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<T>>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende Nachricht und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort gesendet werden
    /// soll (Pong-Eingaenge, erfolgreicher Spielstart – dort antwortet
    /// der Broadcast).
    pub async fn dispatch(
        &self,
        message: GameMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<GameMessage> {
        let request_id = message.request_id;

        match message.payload {
            // ---------------------------------------------------------------
            // Raum-Zuordnung (nur ohne bestehende Zuordnung)
            // ---------------------------------------------------------------
            GamePayload::CreateRoom(req) => {
                if ctx.raum_code.is_some() {
                    return Some(GameMessage::error(
                        request_id,
                        ErrorCode::InvalidRequest,
                        "Bereits einem Raum zugeordnet",
                    ));
                }
                let antwort = raum_handler::handle_create_room(req, request_id, ctx, &self.state);
                if let Some(spieler) = ctx.spieler_id {
                    tracing::debug!(
                        peer = %ctx.peer_addr,
                        spieler = %spieler,
                        "Verbindung einem Spieler zugeordnet"
                    );
                }
                Some(antwort)
            }

            GamePayload::JoinRoom(req) => {
                if ctx.raum_code.is_some() {
                    return Some(GameMessage::error(
                        request_id,
                        ErrorCode::InvalidRequest,
                        "Bereits einem Raum zugeordnet",
                    ));
                }
                Some(raum_handler::handle_join_room(req, request_id, ctx, &self.state))
            }

            // ---------------------------------------------------------------
            // Keepalive
            // ---------------------------------------------------------------
            GamePayload::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(GameMessage::pong(request_id, ping.timestamp_ms, server_ts))
            }

            GamePayload::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen");
                None
            }

            // ---------------------------------------------------------------
            // Raum-gebundene Nachrichten
            // ---------------------------------------------------------------
            payload => {
                let (spieler, code) = match (ctx.spieler_id, ctx.raum_code.clone()) {
                    (Some(spieler), Some(code)) => (spieler, code),
                    _ => {
                        return Some(GameMessage::error(
                            request_id,
                            ErrorCode::InvalidRequest,
                            "Noch keinem Raum beigetreten",
                        ));
                    }
                };

                self.dispatch_im_raum(payload, request_id, spieler, code, ctx)
                    .await
            }
        }
    }

    /// Routet Nachrichten die eine Raum-Zuordnung erfordern
    async fn dispatch_im_raum(
        &self,
        payload: GamePayload,
        request_id: u32,
        spieler: PlayerId,
        code: RoomCode,
        ctx: &mut DispatcherContext,
    ) -> Option<GameMessage> {
        match payload {
            GamePayload::LeaveRoom => Some(raum_handler::handle_leave_room(
                request_id,
                spieler,
                &code,
                ctx,
                &self.state,
            )),

            GamePayload::StartGame => {
                spiel_handler::handle_start_game(request_id, spieler, &code, &self.state)
            }

            GamePayload::UploadFile(req) => Some(
                spiel_handler::handle_upload_file(req, request_id, spieler, &code, &self.state)
                    .await,
            ),

            // ---------------------------------------------------------------
            // Unerwartete Nachrichten
            // ---------------------------------------------------------------
            GamePayload::RoomCreated(_)
            | GamePayload::RoomJoined(_)
            | GamePayload::RoomUpdated(_)
            | GamePayload::GameRound(_)
            | GamePayload::UploadAccepted(_)
            | GamePayload::GameSummary(_)
            | GamePayload::Error(_) => {
                tracing::warn!(
                    peer = %ctx.peer_addr,
                    request_id,
                    "Unerwartete Server->Client Nachricht vom Client empfangen"
                );
                Some(GameMessage::error(
                    request_id,
                    ErrorCode::InvalidRequest,
                    "Unerwartete Nachricht",
                ))
            }

            // Zuordnung besteht bereits
            GamePayload::CreateRoom(_) | GamePayload::JoinRoom(_) => Some(GameMessage::error(
                request_id,
                ErrorCode::InvalidRequest,
                "Bereits einem Raum zugeordnet",
            )),

            // Ping/Pong werden oben bereits behandelt
            GamePayload::Ping(_) | GamePayload::Pong(_) => None,
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    ///
    /// Die Send-Queue wird abgemeldet. Der Sitz bleibt bestehen: in der
    /// Lobby schrumpft das Roster, waehrend eines Spiels gilt der Spieler
    /// nur als getrennt und kann mit derselben PlayerId zurueckkehren.
    pub fn client_cleanup(&self, ctx: &DispatcherContext) {
        let Some(spieler) = ctx.spieler_id else {
            return;
        };

        self.state.broadcaster.spieler_entfernen(&spieler);

        if let Some(code) = &ctx.raum_code {
            let ergebnis = self.state.registry.raum_verlassen(code, &spieler);

            if ergebnis.is_some_and(|e| e.sitz_entfernt) {
                if let Ok(raum) = self.state.registry.raum_holen(code) {
                    let room = handlers::schnappschuss(&raum.lock());
                    self.state.broadcaster.an_raum_senden(
                        code,
                        GameMessage::broadcast(GamePayload::RoomUpdated(
                            RoomUpdatedNotification { room },
                        )),
                    );
                }
            }
        }

        tracing::debug!(spieler = %spieler, "Client-Ressourcen bereinigt");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
