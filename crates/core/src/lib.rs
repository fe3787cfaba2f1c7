//! backtalk-core – Gemeinsame Typen fuer Backtalk
//!
//! Haelt die Identifikationstypen die von allen anderen Crates geteilt
//! werden. Bewusst klein gehalten: keine Logik, keine Abhaengigkeiten
//! zwischen den Schichten.

pub mod types;

// Bequeme Re-Exporte
pub use types::{PlayerId, RoomCode, RoomCodeFehler, ROOM_CODE_LAENGE};
