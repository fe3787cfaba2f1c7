//! Ergebnis-Aggregation – Progressionen aus Store + Sitzordnung
//!
//! Rekonstruiert fuer jeden Ursprungs-Sitz die Kette die von seiner
//! Runde-1-Aufnahme abstammt. Rein ableitbar aus dem AudioRelayStore
//! und der eingefrorenen Sitzordnung; haelt keinerlei eigenen Zustand.

use bytes::Bytes;

use backtalk_core::PlayerId;

use crate::relay;
use crate::store::AudioRelayStore;

/// Ein Glied einer Progression
///
/// `original`/`umgekehrt` sind `None` wenn der Beitrag fehlt (die Runde
/// wurde per Timeout erzwungen weitergeschaltet).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionEintrag {
    pub runde: u32,
    pub spieler: PlayerId,
    pub original: Option<Bytes>,
    pub umgekehrt: Option<Bytes>,
}

/// Die vollstaendige Kette eines Ursprungs-Sitzes, in Rundenreihenfolge
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub ursprung: PlayerId,
    pub eintraege: Vec<ProgressionEintrag>,
}

/// Baut alle Progressionen auf
///
/// Fuer Ursprungs-Sitz `s` traegt in Runde `r` der Sitz
/// `(s + r - 1) mod N` bei; Runde 1 ist die eigene Original-Aufnahme.
pub fn progressionen_erstellen(
    roster: &[PlayerId],
    store: &AudioRelayStore,
) -> Vec<Progression> {
    let anzahl = roster.len();

    (0..anzahl)
        .map(|ursprungs_sitz| {
            let eintraege = (1..=(anzahl as u32))
                .map(|runde| {
                    let sitz = relay::beitrags_sitz(ursprungs_sitz, runde, anzahl);
                    let spieler = roster[sitz];
                    match store.holen(runde, &spieler) {
                        Some(eintrag) => ProgressionEintrag {
                            runde,
                            spieler,
                            original: Some(eintrag.original.clone()),
                            umgekehrt: Some(eintrag.umgekehrt.clone()),
                        },
                        None => ProgressionEintrag {
                            runde,
                            spieler,
                            original: None,
                            umgekehrt: None,
                        },
                    }
                })
                .collect();

            Progression {
                ursprung: roster[ursprungs_sitz],
                eintraege,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn befuellter_store(roster: &[PlayerId], runden: u32) -> AudioRelayStore {
        let mut store = AudioRelayStore::neu();
        for runde in 1..=runden {
            for (sitz, spieler) in roster.iter().enumerate() {
                let daten = format!("r{runde}s{sitz}");
                store.einfuegen(
                    runde,
                    *spieler,
                    Bytes::from(daten.clone().into_bytes()),
                    Bytes::from(daten.chars().rev().collect::<String>().into_bytes()),
                );
            }
        }
        store
    }

    #[test]
    fn drei_spieler_drei_progressionen_je_drei_glieder() {
        let roster: Vec<PlayerId> = (0..3).map(|_| PlayerId::new()).collect();
        let store = befuellter_store(&roster, 3);

        let progressionen = progressionen_erstellen(&roster, &store);
        assert_eq!(progressionen.len(), 3);
        for p in &progressionen {
            assert_eq!(p.eintraege.len(), 3);
            assert_eq!(
                p.eintraege.iter().map(|e| e.runde).collect::<Vec<_>>(),
                vec![1, 2, 3]
            );
        }
    }

    #[test]
    fn runde_eins_ist_eigene_aufnahme() {
        let roster: Vec<PlayerId> = (0..4).map(|_| PlayerId::new()).collect();
        let store = befuellter_store(&roster, 4);

        for (sitz, progression) in progressionen_erstellen(&roster, &store).iter().enumerate() {
            assert_eq!(progression.ursprung, roster[sitz]);
            assert_eq!(progression.eintraege[0].spieler, roster[sitz]);
        }
    }

    #[test]
    fn kein_beitragender_doppelt() {
        // Abdeckung: ueber die Runden 2..N kein Beitragender zweimal
        for n in 2..=6usize {
            let roster: Vec<PlayerId> = (0..n).map(|_| PlayerId::new()).collect();
            let store = befuellter_store(&roster, n as u32);

            for progression in progressionen_erstellen(&roster, &store) {
                let beitragende: HashSet<PlayerId> = progression
                    .eintraege
                    .iter()
                    .map(|e| e.spieler)
                    .collect();
                assert_eq!(beitragende.len(), n);
            }
        }
    }

    #[test]
    fn beitragender_formel() {
        // Beitragender in Runde r fuer Ursprung s ist roster[(s + r - 1) % N]
        let roster: Vec<PlayerId> = (0..3).map(|_| PlayerId::new()).collect();
        let store = befuellter_store(&roster, 3);

        let progressionen = progressionen_erstellen(&roster, &store);
        // Ursprung Sitz 0: Runde 2 -> Sitz 1, Runde 3 -> Sitz 2
        assert_eq!(progressionen[0].eintraege[1].spieler, roster[1]);
        assert_eq!(progressionen[0].eintraege[2].spieler, roster[2]);
        // Ursprung Sitz 2: Runde 2 -> Sitz 0
        assert_eq!(progressionen[2].eintraege[1].spieler, roster[0]);
    }

    #[test]
    fn fehlende_einreichung_ergibt_leere_glieder() {
        let roster: Vec<PlayerId> = (0..2).map(|_| PlayerId::new()).collect();
        let mut store = AudioRelayStore::neu();
        // Nur Spieler 0 hat in Runde 1 eingereicht
        store.einfuegen(
            1,
            roster[0],
            Bytes::from_static(b"a"),
            Bytes::from_static(b"a"),
        );

        let progressionen = progressionen_erstellen(&roster, &store);
        assert!(progressionen[0].eintraege[0].original.is_some());
        // Sitz 1 fehlt: Glied vorhanden, aber ohne Daten
        assert_eq!(progressionen[1].eintraege[0].spieler, roster[1]);
        assert!(progressionen[1].eintraege[0].original.is_none());
        assert!(progressionen[1].eintraege[0].umgekehrt.is_none());
    }
}
