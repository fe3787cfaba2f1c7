//! backtalk-protocol – Protokoll-Definitionen fuer das Backtalk-Netzwerkprotokoll
//!
//! Zwei Schichten:
//! - [`control`]: Nachrichten-Definitionen (Umschlag + getaggte Payloads,
//!   Raum-Schnappschuesse, Fehler-Codes)
//! - [`wire`]: Frame-Format fuer TCP (Laengenpraefix + JSON)
//!
//! Das Protokoll ist absichtlich transportarm gehalten: der Kern konsumiert
//! Verbindungen nur als adressierbare Endpunkte und tauscht ausschliesslich
//! strukturierte Nachrichten aus.

pub mod control;
pub mod wire;

// Bequeme Re-Exporte
pub use control::{ErrorCode, GameMessage, GamePayload, RoomSnapshot, RoomStatus};
pub use wire::FrameCodec;
