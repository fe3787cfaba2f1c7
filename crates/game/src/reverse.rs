//! ReverseTransform – Schnittstelle zum externen Audio-Umkehrer
//!
//! Die eigentliche Audio-Umkehrung (Codec-Dekodierung, Sample-Umkehr,
//! Re-Encoding) ist ein externer Kollaborateur und nicht Teil des
//! Orchestrators. Der Kern konsumiert sie nur als opake, deterministische
//! Funktion `Bytes -> Bytes` mit begrenzter Laufzeit.
//!
//! Weil die Transformation langsam sein kann, ruft die Signaling-Schicht
//! sie ausserhalb des Raum-Mutex auf (`spawn_blocking`) und verbucht das
//! Ergebnis als separates Ereignis – eine langsame Umkehrung friert den
//! Raum nicht ein.

use thiserror::Error;

/// Fehler der Audio-Transformation
///
/// Eine fehlgeschlagene Transformation zaehlt als fehlgeschlagene
/// Einreichung: nichts wird verbucht, die Barriere schliesst nicht, der
/// Spieler wird zum erneuten Versuch aufgefordert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Audio-Transformation fehlgeschlagen: {0}")]
pub struct TransformFehler(pub String);

/// Opake Audio-Umkehrung
pub trait ReverseTransform: Send + Sync {
    /// Kehrt einen Audio-Clip um
    ///
    /// Muss deterministisch sein und darf den Clip nicht verlaengern.
    fn umkehren(&self, daten: &[u8]) -> Result<Vec<u8>, TransformFehler>;
}

/// Trivialer Platzhalter: kehrt die Byte-Reihenfolge um
///
/// Deterministisch und laengenerhaltend, damit Tests und lokale
/// Entwicklung ohne den echten Codec-Umkehrer auskommen. Ein echtes
/// Deployment haengt hier die containerformat-bewusste Implementierung
/// ein.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteUmkehrer;

impl ReverseTransform for ByteUmkehrer {
    fn umkehren(&self, daten: &[u8]) -> Result<Vec<u8>, TransformFehler> {
        let mut umgekehrt = daten.to_vec();
        umgekehrt.reverse();
        Ok(umgekehrt)
    }
}
