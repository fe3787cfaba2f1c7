//! backtalk-game – Spielkern fuer Backtalk
//!
//! Dieser Crate implementiert den Session-Orchestrator des Spiels:
//! N unabhaengig verbundene Spieler werden im Gleichschritt durch eine
//! feste Rundenfolge gefuehrt, jede Einreichung wird deterministisch an
//! genau einen Nachfolger geroutet, und am Ende wird die vollstaendige
//! Relay-Kette als Ergebnis ausgeliefert.
//!
//! ## Architektur
//!
//! ```text
//! SessionRegistry (Code -> Raum, Code-Vergabe, Lebenszyklus)
//!     |
//!     v
//! Room (Roster, Host, Status)
//!     |
//!     +-- RoundScheduler   (Rundenzaehler + Einreichungs-Barriere)
//!     +-- AudioRelayStore  ((Runde, Spieler) -> Clip-Paar)
//!     +-- relay            (pure Rotations-Arithmetik)
//!     +-- results          (Progressionen aus Store + Sitzordnung)
//!
//! ReverseTransform – externer Kollaborateur (Audio-Umkehrung)
//! ```
//!
//! Der Crate kennt keine Transport-Typen: Raum-Operationen liefern
//! [`room::RaumEvent`]-Werte, die die Signaling-Schicht in
//! Protokoll-Nachrichten uebersetzt.

pub mod error;
pub mod registry;
pub mod relay;
pub mod results;
pub mod reverse;
pub mod room;
pub mod scheduler;
pub mod store;

// Bequeme Re-Exporte
pub use error::{GameError, GameResult};
pub use registry::{RegistryConfig, SessionRegistry};
pub use reverse::{ByteUmkehrer, ReverseTransform, TransformFehler};
pub use room::{RaumEvent, RaumStatus, Room};
pub use scheduler::{RoundScheduler, RundenPhase};
pub use store::AudioRelayStore;
