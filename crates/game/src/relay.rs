//! Relay-Zuteilung – pure Rotations-Arithmetik
//!
//! Bestimmt fuer jeden Hoerer und jede Runde, wessen vorherige
//! Einreichung er in welcher Orientierung (Original oder umgekehrt)
//! anhoeren muss. Alles hier ist eine pure Funktion von
//! `(Sitz, Runde, Spieleranzahl)` – kein Zustand, keine IO.
//!
//! ## Abdeckungs-Invariante
//! Bei `N` Sitzen und `N` Runden durchlaeuft der Quell-Offset relativ zu
//! jedem festen Hoerer ueber die Runden 2..N die Werte 1, 2, ..., N-1
//! (mod N), jeder genau einmal. Damit hoert jeder Hoerer jeden anderen
//! Sitz genau einmal und nie sich selbst.

/// Orientierung des Hoer-Clips: umgekehrt in geraden Runden,
/// Original in ungeraden Runden (Runde 1 hat kein Hoer-Audio)
pub fn ist_umgekehrt(runde: u32) -> bool {
    runde > 1 && runde % 2 == 0
}

/// Quell-Sitz fuer einen Hoerer in Runde `runde` (>= 2)
///
/// Der Hoerer auf Sitz `hoerer_sitz` hoert die Einreichung des Sitzes
/// `(hoerer_sitz - (runde - 1)) mod anzahl` aus der Vorrunde.
pub fn quell_sitz(hoerer_sitz: usize, runde: u32, anzahl: usize) -> usize {
    debug_assert!(runde >= 2, "Runde 1 hat keinen Quell-Sitz");
    debug_assert!(hoerer_sitz < anzahl);
    let offset = (runde as usize - 1) % anzahl;
    (hoerer_sitz + anzahl - offset) % anzahl
}

/// Sitz dessen Einreichung in Runde `runde` zur Progression des
/// Ursprungs-Sitzes `ursprungs_sitz` beitraegt
///
/// Runde 1 ist die eigene Original-Aufnahme des Ursprungs-Sitzes.
pub fn beitrags_sitz(ursprungs_sitz: usize, runde: u32, anzahl: usize) -> usize {
    debug_assert!(runde >= 1);
    debug_assert!(ursprungs_sitz < anzahl);
    (ursprungs_sitz + runde as usize - 1) % anzahl
}

/// Vollstaendige Hoer-Zuteilung fuer einen Sitz in einer Runde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoerZuteilung {
    /// Sitz dessen Einreichung gehoert wird
    pub quell_sitz: usize,
    /// Runde aus der die Einreichung stammt (immer `runde - 1`)
    pub quell_runde: u32,
    /// true = umgekehrte Fassung, false = Original
    pub umgekehrt: bool,
}

/// Berechnet die Hoer-Zuteilung; `None` in Runde 1 (nichts anzuhoeren)
pub fn zuteilung(hoerer_sitz: usize, runde: u32, anzahl: usize) -> Option<HoerZuteilung> {
    if runde < 2 {
        return None;
    }
    Some(HoerZuteilung {
        quell_sitz: quell_sitz(hoerer_sitz, runde, anzahl),
        quell_runde: runde - 1,
        umgekehrt: ist_umgekehrt(runde),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn runde_eins_hat_keine_zuteilung() {
        for n in 2..=6 {
            for sitz in 0..n {
                assert_eq!(zuteilung(sitz, 1, n), None);
            }
        }
    }

    #[test]
    fn orientierung_wechselt_pro_runde() {
        assert!(!ist_umgekehrt(1));
        assert!(ist_umgekehrt(2));
        assert!(!ist_umgekehrt(3));
        assert!(ist_umgekehrt(4));
        assert!(!ist_umgekehrt(5));
    }

    #[test]
    fn kein_selbst_hoeren() {
        // Fuer alle N >= 2 und alle Runden > 1: Quell-Sitz != Hoerer-Sitz
        for n in 2..=8usize {
            for runde in 2..=(n as u32) {
                for sitz in 0..n {
                    assert_ne!(
                        quell_sitz(sitz, runde, n),
                        sitz,
                        "Selbst-Hoeren bei N={n}, Runde={runde}, Sitz={sitz}"
                    );
                }
            }
        }
    }

    #[test]
    fn abdeckungs_invariante() {
        // Ueber die Runden 2..=N hoert jeder Sitz jeden anderen Sitz
        // genau einmal
        for n in 2..=8usize {
            for sitz in 0..n {
                let quellen: HashSet<usize> = (2..=(n as u32))
                    .map(|runde| quell_sitz(sitz, runde, n))
                    .collect();
                assert_eq!(quellen.len(), n - 1, "Doppelte Quelle bei N={n}");
                assert!(!quellen.contains(&sitz));
            }
        }
    }

    #[test]
    fn szenario_drei_spieler() {
        // A=0, B=1, C=2 in Beitrittsreihenfolge.
        // Runde 2 (gerade -> umgekehrt): A hoert C, B hoert A, C hoert B
        let z = zuteilung(0, 2, 3).unwrap();
        assert_eq!(z.quell_sitz, 2);
        assert_eq!(z.quell_runde, 1);
        assert!(z.umgekehrt);

        let z = zuteilung(1, 2, 3).unwrap();
        assert_eq!(z.quell_sitz, 0);
        assert!(z.umgekehrt);

        let z = zuteilung(2, 2, 3).unwrap();
        assert_eq!(z.quell_sitz, 1);

        // Runde 3 (ungerade -> Original): A hoert B (dessen Runde-2-Clip)
        let z = zuteilung(0, 3, 3).unwrap();
        assert_eq!(z.quell_sitz, 1);
        assert_eq!(z.quell_runde, 2);
        assert!(!z.umgekehrt);
    }

    #[test]
    fn beitrags_sitz_runde_eins_ist_eigener_sitz() {
        for n in 2..=6usize {
            for sitz in 0..n {
                assert_eq!(beitrags_sitz(sitz, 1, n), sitz);
            }
        }
    }

    #[test]
    fn beitrags_kette_ist_konsistent() {
        // Der Sitz der in Runde r zur Progression von s beitraegt, muss
        // in Runde r genau die Kette von s gehoert haben: sein Quell-Sitz
        // ist der Beitragende der Vorrunde.
        for n in 2..=8usize {
            for s in 0..n {
                for runde in 2..=(n as u32) {
                    let beitragender = beitrags_sitz(s, runde, n);
                    let gehoert = quell_sitz(beitragender, runde, n);
                    assert_eq!(
                        gehoert,
                        beitrags_sitz(s, runde - 1, n),
                        "Ketten-Bruch bei N={n}, Ursprung={s}, Runde={runde}"
                    );
                }
            }
        }
    }

    #[test]
    fn beitraege_decken_alle_sitze_ab() {
        // Jede Progression enthaelt jeden Sitz genau einmal
        for n in 2..=8usize {
            for s in 0..n {
                let beitragende: HashSet<usize> = (1..=(n as u32))
                    .map(|runde| beitrags_sitz(s, runde, n))
                    .collect();
                assert_eq!(beitragende.len(), n);
            }
        }
    }
}
