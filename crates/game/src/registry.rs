//! SessionRegistry – Code-Vergabe und Raum-Lebenszyklus
//!
//! Besitzt die Abbildung `RoomCode -> Room` und garantiert die
//! Eindeutigkeit der Codes unter den aktiven Raeumen. Jeder Raum haengt
//! hinter seinem eigenen Mutex: Operationen auf verschiedenen Raeumen
//! laufen ohne Kontention, Operationen innerhalb eines Raums sind
//! serialisiert (die Barriere-Pruefung ist compare-and-act und darf
//! nicht verschraenkt laufen).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use backtalk_core::{PlayerId, RoomCode};

use crate::error::{GameError, GameResult};
use crate::room::{RaumEvent, RaumStatus, Room, VerlassenErgebnis};

/// Obergrenze fuer Code-Generierungsversuche bevor aufgegeben wird
///
/// Bei 26^4 moeglichen Codes wird das praktisch nie erreicht; die
/// Schranke verhindert eine Endlosschleife wenn der Code-Raum voll ist.
const MAX_CODE_VERSUCHE: usize = 1000;

/// Konfiguration der Registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Standard-Obergrenze an Spielern wenn der Host nichts angibt
    pub max_spieler_standard: u32,
    /// Hartes Limit fuer die vom Host gewuenschte Obergrenze
    pub max_spieler_limit: u32,
    /// Wie lange ein leerer Raum stehen bleibt bevor er abgebaut wird
    pub leerlauf_frist: Duration,
    /// Runden-Timeout; `None` = kein Timeout (explizite Konfiguration)
    pub runden_timeout: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_spieler_standard: 8,
            max_spieler_limit: 16,
            leerlauf_frist: Duration::from_secs(300),
            runden_timeout: None,
        }
    }
}

/// Ergebnis eines Wartungslaufs
#[derive(Debug, Default)]
pub struct AufraeumErgebnis {
    /// Abgebaute Raeume (laenger leer als die Leerlauf-Frist)
    pub entfernt: Vec<RoomCode>,
    /// Per Runden-Timeout weitergeschaltete Raeume samt ihrer Events
    pub weitergeschaltet: Vec<(RoomCode, Vec<RaumEvent>)>,
}

/// Abbildung `RoomCode -> Room` mit Code-Vergabe und Abbau
pub struct SessionRegistry {
    raeume: DashMap<RoomCode, Arc<Mutex<Room>>>,
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu(config: RegistryConfig) -> Self {
        Self {
            raeume: DashMap::new(),
            config,
        }
    }

    /// Anzahl der aktiven Raeume
    pub fn raum_anzahl(&self) -> usize {
        self.raeume.len()
    }

    /// Erstellt einen neuen Raum mit dem Anfragenden als Host
    ///
    /// Der Code wird zufaellig erzeugt und gegen die lebenden Raeume
    /// kollisionsgeprueft; bei einer Kollision wird neu gewuerfelt.
    /// Die Einfuegung laeuft ueber die Entry-API, damit die
    /// Eindeutigkeit auch unter gleichzeitigen Erstellungen haelt.
    pub fn raum_erstellen(
        &self,
        host_id: PlayerId,
        host_name: &str,
        gewuenschte_max: Option<u32>,
    ) -> GameResult<(RoomCode, Arc<Mutex<Room>>)> {
        let max_spieler = gewuenschte_max
            .unwrap_or(self.config.max_spieler_standard)
            .clamp(2, self.config.max_spieler_limit);

        for _ in 0..MAX_CODE_VERSUCHE {
            let code = RoomCode::zufaellig();
            match self.raeume.entry(code.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(code = %code, "Code-Kollision, neuer Versuch");
                    continue;
                }
                Entry::Vacant(eintrag) => {
                    let raum = Arc::new(Mutex::new(Room::neu(
                        code.clone(),
                        host_id,
                        host_name,
                        max_spieler,
                        self.config.runden_timeout,
                    )));
                    eintrag.insert(Arc::clone(&raum));
                    tracing::info!(
                        code = %code,
                        host = %host_id,
                        max_spieler,
                        "Raum erstellt"
                    );
                    return Ok((code, raum));
                }
            }
        }

        Err(GameError::intern(
            "Kein freier Raum-Code nach wiederholten Versuchen",
        ))
    }

    /// Schlaegt einen Raum nach
    pub fn raum_holen(&self, code: &RoomCode) -> GameResult<Arc<Mutex<Room>>> {
        self.raeume
            .get(code)
            .map(|eintrag| Arc::clone(eintrag.value()))
            .ok_or_else(|| GameError::RaumNichtGefunden(code.clone()))
    }

    /// Fuegt einen Spieler einem Raum hinzu
    ///
    /// Idempotent fuer bereits gesetzte Spieler (Reconnect).
    pub fn raum_beitreten(
        &self,
        code: &RoomCode,
        spieler: PlayerId,
        name: &str,
    ) -> GameResult<Arc<Mutex<Room>>> {
        let raum = self.raum_holen(code)?;
        raum.lock().beitreten(spieler, name)?;
        Ok(raum)
    }

    /// Entfernt einen Spieler aus einem Raum
    ///
    /// No-op (Ok mit `None`) wenn der Raum nicht existiert.
    pub fn raum_verlassen(
        &self,
        code: &RoomCode,
        spieler: &PlayerId,
    ) -> Option<VerlassenErgebnis> {
        let raum = self.raeume.get(code)?;
        let ergebnis = raum.value().lock().verlassen(spieler);
        Some(ergebnis)
    }

    /// Entfernt einen Raum sofort
    pub fn raum_entfernen(&self, code: &RoomCode) {
        if self.raeume.remove(code).is_some() {
            tracing::info!(code = %code, "Raum entfernt");
        }
    }

    /// Wartungslauf: leere Raeume abbauen, Runden-Fristen durchsetzen
    ///
    /// `jetzt` kommt vom Aufrufer, damit der Lauf testbar bleibt.
    pub fn aufraeumen(&self, jetzt: Instant) -> AufraeumErgebnis {
        let mut ergebnis = AufraeumErgebnis::default();

        // Kandidaten einsammeln ohne die Map waehrend der Iteration zu
        // veraendern
        for eintrag in self.raeume.iter() {
            let mut raum = eintrag.value().lock();

            if raum
                .leer_seit(jetzt)
                .is_some_and(|dauer| dauer >= self.config.leerlauf_frist)
            {
                ergebnis.entfernt.push(eintrag.key().clone());
                continue;
            }

            if raum.status() == RaumStatus::Aktiv && raum.frist_abgelaufen(jetzt) {
                match raum.erzwinge_weiterschalten() {
                    Ok(events) => ergebnis
                        .weitergeschaltet
                        .push((eintrag.key().clone(), events)),
                    Err(fehler) => {
                        tracing::error!(
                            code = %eintrag.key(),
                            fehler = %fehler,
                            "Erzwungenes Weiterschalten fehlgeschlagen"
                        );
                    }
                }
            }
        }

        for code in &ergebnis.entfernt {
            self.raeume.remove(code);
            tracing::info!(code = %code, "Leerer Raum abgebaut");
        }

        ergebnis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashSet;

    fn registry() -> SessionRegistry {
        SessionRegistry::neu(RegistryConfig::default())
    }

    #[test]
    fn erstellen_vergibt_eindeutige_codes() {
        let reg = registry();
        let mut codes = HashSet::new();

        for _ in 0..64 {
            let (code, _) = reg
                .raum_erstellen(PlayerId::new(), "Host", None)
                .unwrap();
            assert!(codes.insert(code), "Code doppelt vergeben");
        }
        assert_eq!(reg.raum_anzahl(), 64);
    }

    #[test]
    fn max_spieler_wird_begrenzt() {
        let reg = registry();

        let (_, raum) = reg
            .raum_erstellen(PlayerId::new(), "Host", Some(99))
            .unwrap();
        assert_eq!(raum.lock().max_spieler(), 16);

        let (_, raum) = reg
            .raum_erstellen(PlayerId::new(), "Host", Some(1))
            .unwrap();
        assert_eq!(raum.lock().max_spieler(), 2);

        let (_, raum) = reg.raum_erstellen(PlayerId::new(), "Host", None).unwrap();
        assert_eq!(raum.lock().max_spieler(), 8);
    }

    #[test]
    fn unbekannter_code_ist_nicht_gefunden() {
        let reg = registry();
        let code = RoomCode::neu("QQQQ").unwrap();

        assert!(matches!(
            reg.raum_holen(&code),
            Err(GameError::RaumNichtGefunden(_))
        ));
        assert!(matches!(
            reg.raum_beitreten(&code, PlayerId::new(), "Ben"),
            Err(GameError::RaumNichtGefunden(_))
        ));
        assert!(reg.raum_verlassen(&code, &PlayerId::new()).is_none());
    }

    #[test]
    fn beitreten_und_verlassen_ueber_die_registry() {
        let reg = registry();
        let host = PlayerId::new();
        let (code, _) = reg.raum_erstellen(host, "Anna", None).unwrap();

        let b = PlayerId::new();
        let raum = reg.raum_beitreten(&code, b, "Ben").unwrap();
        assert_eq!(raum.lock().spieler().len(), 2);

        let ergebnis = reg.raum_verlassen(&code, &b).unwrap();
        assert!(ergebnis.sitz_entfernt);
        assert_eq!(raum.lock().spieler().len(), 1);
    }

    #[test]
    fn explizites_entfernen() {
        let reg = registry();
        let (code, _) = reg.raum_erstellen(PlayerId::new(), "Anna", None).unwrap();
        assert_eq!(reg.raum_anzahl(), 1);

        reg.raum_entfernen(&code);
        assert_eq!(reg.raum_anzahl(), 0);
        assert!(reg.raum_holen(&code).is_err());

        // Entfernen eines unbekannten Codes ist ein No-op
        reg.raum_entfernen(&code);
    }

    #[test]
    fn aufraeumen_entfernt_nur_lange_leere_raeume() {
        let reg = registry();
        let host = PlayerId::new();
        let (code, _) = reg.raum_erstellen(host, "Anna", None).unwrap();
        reg.raum_verlassen(&code, &host);

        // Direkt danach: Frist noch nicht abgelaufen
        let ergebnis = reg.aufraeumen(Instant::now());
        assert!(ergebnis.entfernt.is_empty());
        assert_eq!(reg.raum_anzahl(), 1);

        // Nach der Leerlauf-Frist: Raum wird abgebaut
        let spaeter = Instant::now() + Duration::from_secs(301);
        let ergebnis = reg.aufraeumen(spaeter);
        assert_eq!(ergebnis.entfernt, vec![code.clone()]);
        assert_eq!(reg.raum_anzahl(), 0);
        assert!(reg.raum_holen(&code).is_err());
    }

    #[test]
    fn aufraeumen_laesst_besetzte_raeume_stehen() {
        let reg = registry();
        let (_, _) = reg.raum_erstellen(PlayerId::new(), "Anna", None).unwrap();

        let spaeter = Instant::now() + Duration::from_secs(3600);
        let ergebnis = reg.aufraeumen(spaeter);
        assert!(ergebnis.entfernt.is_empty());
        assert_eq!(reg.raum_anzahl(), 1);
    }

    #[test]
    fn aufraeumen_erzwingt_abgelaufene_runden() {
        let reg = SessionRegistry::neu(RegistryConfig {
            runden_timeout: Some(Duration::from_secs(30)),
            ..RegistryConfig::default()
        });
        let host = PlayerId::new();
        let (code, raum) = reg.raum_erstellen(host, "Anna", None).unwrap();
        let b = PlayerId::new();
        reg.raum_beitreten(&code, b, "Ben").unwrap();
        raum.lock().starten(host).unwrap();

        // Nur der Host reicht ein
        raum.lock()
            .einreichen(host, 1, Bytes::from_static(b"x"), Bytes::from_static(b"x"))
            .unwrap();

        // Vor der Frist passiert nichts
        let ergebnis = reg.aufraeumen(Instant::now());
        assert!(ergebnis.weitergeschaltet.is_empty());

        // Nach der Frist wird weitergeschaltet
        let spaeter = Instant::now() + Duration::from_secs(31);
        let ergebnis = reg.aufraeumen(spaeter);
        assert_eq!(ergebnis.weitergeschaltet.len(), 1);
        assert_eq!(ergebnis.weitergeschaltet[0].0, code);
        assert_eq!(raum.lock().aktuelle_runde(), Some(2));
    }

    #[test]
    fn ohne_timeout_wird_nie_erzwungen() {
        let reg = registry();
        let host = PlayerId::new();
        let (code, raum) = reg.raum_erstellen(host, "Anna", None).unwrap();
        reg.raum_beitreten(&code, PlayerId::new(), "Ben").unwrap();
        raum.lock().starten(host).unwrap();

        let viel_spaeter = Instant::now() + Duration::from_secs(7 * 24 * 3600);
        let ergebnis = reg.aufraeumen(viel_spaeter);
        assert!(ergebnis.weitergeschaltet.is_empty());
        assert_eq!(raum.lock().aktuelle_runde(), Some(1));
    }
}
