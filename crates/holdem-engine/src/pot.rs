use holdem_domain::{Chips, PlayerId, SidePot};

/// One player's whole-hand money picture, the only input pot building needs.
#[derive(Debug, Clone)]
pub struct PotContribution {
    pub player_id: PlayerId,
    pub total: Chips,
    pub folded: bool,
    pub all_in: bool,
}

/// Splits the hand's contributions into pots along all-in thresholds.
///
/// Each distinct all-in contribution level, ascending, closes one pot: the
/// pot collects every contributor's chips between the previous level and this
/// one, and is contestable by every non-folded player who reached the level.
/// Whatever remains above the top level forms the final pot for the
/// non-folded, non-all-in players still behind it; with no all-ins at all
/// that is simply the single main pot.
///
/// Folded chips count into every level they reach, but folded players are
/// never eligible. Pot amounts always sum to the total contributed.
pub fn build_side_pots(contributions: &[PotContribution]) -> Vec<SidePot> {
    let mut levels: Vec<Chips> = contributions
        .iter()
        .filter(|c| c.all_in && !c.total.is_zero())
        .map(|c| c.total)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots = Vec::new();
    let mut prev = Chips::ZERO;

    for &level in &levels {
        let amount: Chips = contributions
            .iter()
            .map(|c| c.total.min(level).saturating_sub(prev))
            .sum();
        let eligible: Vec<PlayerId> = contributions
            .iter()
            .filter(|c| !c.folded && c.total >= level)
            .map(|c| c.player_id.clone())
            .collect();
        if !amount.is_zero() && !eligible.is_empty() {
            pots.push(SidePot {
                amount,
                eligible_players: eligible,
            });
        }
        prev = level;
    }

    let remainder: Chips = contributions
        .iter()
        .map(|c| c.total.saturating_sub(prev))
        .sum();
    if !remainder.is_zero() {
        let eligible: Vec<PlayerId> = contributions
            .iter()
            .filter(|c| !c.folded && !c.all_in && c.total > prev)
            .map(|c| c.player_id.clone())
            .collect();
        if eligible.is_empty() {
            // Unreachable in legal betting (chips above the top all-in level
            // always belong to a live player), but conservation must hold
            // even on malformed input.
            if let Some(last) = pots.last_mut() {
                last.amount += remainder;
            }
        } else {
            pots.push(SidePot {
                amount: remainder,
                eligible_players: eligible,
            });
        }
    }

    pots
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn contrib(id: &str, total: u64, folded: bool, all_in: bool) -> PotContribution {
        PotContribution {
            player_id: PlayerId::from(id),
            total: Chips(total),
            folded,
            all_in,
        }
    }

    fn ids(pot: &SidePot) -> Vec<&str> {
        pot.eligible_players.iter().map(PlayerId::as_str).collect()
    }

    #[test]
    fn no_all_ins_yields_one_main_pot() {
        let pots = build_side_pots(&[
            contrib("a", 20, false, false),
            contrib("b", 20, false, false),
            contrib("c", 1, true, false),
        ]);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, Chips(41));
        assert_eq!(ids(&pots[0]), vec!["a", "b"]);
    }

    #[test]
    fn called_all_in_forms_a_single_pot() {
        // A is all-in for 10, both others flat-called.
        let pots = build_side_pots(&[
            contrib("a", 10, false, true),
            contrib("b", 10, false, false),
            contrib("c", 10, false, false),
        ]);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, Chips(30));
        assert_eq!(ids(&pots[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn two_all_ins_split_into_two_pots() {
        let pots = build_side_pots(&[
            contrib("a", 10, false, true),
            contrib("b", 50, false, true),
            contrib("c", 50, false, false),
        ]);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, Chips(30));
        assert_eq!(ids(&pots[0]), vec!["a", "b", "c"]);
        assert_eq!(pots[1].amount, Chips(80));
        assert_eq!(ids(&pots[1]), vec!["b", "c"]);
    }

    #[test]
    fn deep_stack_overage_goes_to_its_sole_owner() {
        // C raised past B's all-in and no one called: C's overage sits in a
        // pot only C can win.
        let pots = build_side_pots(&[
            contrib("a", 10, false, true),
            contrib("b", 40, false, true),
            contrib("c", 60, false, false),
        ]);
        assert_eq!(pots.len(), 3);
        assert_eq!(pots[0].amount, Chips(30));
        assert_eq!(pots[1].amount, Chips(60));
        assert_eq!(ids(&pots[1]), vec!["b", "c"]);
        assert_eq!(pots[2].amount, Chips(20));
        assert_eq!(ids(&pots[2]), vec!["c"]);
    }

    #[test]
    fn folded_chips_feed_pots_without_eligibility() {
        // B raised to 50 then folded to C's shove over A's short all-in.
        let pots = build_side_pots(&[
            contrib("a", 10, false, true),
            contrib("b", 50, true, false),
            contrib("c", 100, false, true),
        ]);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, Chips(30));
        assert_eq!(ids(&pots[0]), vec!["a", "c"]);
        assert_eq!(pots[1].amount, Chips(130));
        assert_eq!(ids(&pots[1]), vec!["c"]);
    }

    #[test]
    fn equal_all_in_levels_collapse() {
        let pots = build_side_pots(&[
            contrib("a", 25, false, true),
            contrib("b", 25, false, true),
            contrib("c", 25, false, false),
        ]);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, Chips(75));
    }

    #[test]
    fn conservation_and_monotonic_eligibility_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(31337);
        for _ in 0..500 {
            let n = rng.gen_range(2..=6);
            let contributions: Vec<PotContribution> = (0..n)
                .map(|i| {
                    let total = rng.gen_range(0..200u64);
                    let folded = rng.gen_bool(0.3);
                    let all_in = !folded && rng.gen_bool(0.4);
                    PotContribution {
                        player_id: PlayerId::new(format!("p{i}")),
                        total: Chips(total),
                        folded,
                        all_in,
                    }
                })
                .collect();
            // Keep one live contributor behind the money, as any real hand has.
            let contributions = {
                let mut c = contributions;
                c[0].folded = false;
                c[0].all_in = false;
                c[0].total = Chips(c[0].total.as_u64().max(1));
                c
            };

            let pots = build_side_pots(&contributions);

            let contributed: Chips = contributions.iter().map(|c| c.total).sum();
            let potted: Chips = pots.iter().map(|p| p.amount).sum();
            assert_eq!(contributed, potted);

            for pot in &pots {
                assert!(!pot.amount.is_zero());
                assert!(!pot.eligible_players.is_empty());
            }
            // Eligibility only ever narrows along the pot list.
            for pair in pots.windows(2) {
                for id in &pair[1].eligible_players {
                    assert!(pair[0].eligible_players.contains(id));
                }
            }
        }
    }
}
