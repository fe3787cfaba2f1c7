//! backtalk-signaling – TCP Control Layer
//!
//! Dieser Crate implementiert die Verbindungs-Schicht des Backtalk-Servers.
//! Er verwaltet TCP-Verbindungen, uebersetzt eingehende Nachrichten in
//! Raum-Operationen und faechert Zustandsaenderungen als Broadcasts auf.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (GameServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- raum_handler   (CreateRoom, JoinRoom, LeaveRoom)
//!     +-- spiel_handler  (StartGame, UploadFile)
//!
//! SessionRegistry  – Code -> Raum (backtalk-game)
//! EventBroadcaster – Nachrichten an Raum-Mitglieder senden
//! wartung          – leere Raeume abbauen, Runden-Fristen durchsetzen
//! ```
//!
//! Es gibt bewusst keinen prozessweiten Dispatch-Hub: jede Verbindung
//! haelt ihren eigenen Kontext, der Broadcaster haelt pro Spieler eine
//! explizit registrierte Send-Queue.

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod server_state;
pub mod tcp;
pub mod wartung;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::GameServer;
