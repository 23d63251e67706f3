use holdem_domain::{Card, EvaluatedHand, HandCategory};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("hand evaluation needs at least five cards, got {0}")]
    InsufficientCards(usize),
}

/// Picks the strongest five-card hand from `cards` by scoring every
/// C(n, 5) subset. Normal play hands over at most seven cards, so the
/// enumeration tops out at 21 subsets.
pub fn evaluate_best(cards: &[Card]) -> Result<EvaluatedHand, EvalError> {
    let n = cards.len();
    if n < 5 {
        return Err(EvalError::InsufficientCards(n));
    }

    let mut best: Option<EvaluatedHand> = None;
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let hand =
                            classify_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.as_ref().is_none_or(|current| hand > *current) {
                            best = Some(hand);
                        }
                    }
                }
            }
        }
    }
    best.ok_or(EvalError::InsufficientCards(n))
}

/// Classifies exactly five cards into category + tiebreak vector.
fn classify_five(cards: [Card; 5]) -> EvaluatedHand {
    let mut sorted = cards;
    sorted.sort_by(|a, b| b.rank.value().cmp(&a.rank.value()));
    let values = [
        sorted[0].rank.value(),
        sorted[1].rank.value(),
        sorted[2].rank.value(),
        sorted[3].rank.value(),
        sorted[4].rank.value(),
    ];

    let is_flush = sorted.iter().all(|c| c.suit == sorted[0].suit);
    let straight_top = straight_top(values);
    let is_wheel = values == [14, 5, 4, 3, 2];
    if is_wheel {
        // Present the wheel low-to-high-card order: 5 4 3 2 A.
        sorted.rotate_left(1);
    }

    if let Some(top) = straight_top {
        if is_flush {
            let category = if top == 14 {
                HandCategory::RoyalFlush
            } else {
                HandCategory::StraightFlush
            };
            return EvaluatedHand {
                category,
                tiebreaks: vec![top],
                cards: sorted,
            };
        }
        // A straight cannot also pair, so the histogram checks below are
        // unreachable for it; resolve flush-less straights here.
        return EvaluatedHand {
            category: HandCategory::Straight,
            tiebreaks: vec![top],
            cards: sorted,
        };
    }

    // (count, value) groups, largest group first, then highest value.
    let mut groups: Vec<(u8, u8)> = Vec::with_capacity(5);
    for &value in &values {
        match groups.iter_mut().find(|(_, v)| *v == value) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, value)),
        }
    }
    groups.sort_by(|a, b| b.cmp(a));

    let (category, tiebreaks) = match groups.as_slice() {
        [(4, quad), (1, kicker)] => (HandCategory::FourOfAKind, vec![*quad, *kicker]),
        [(3, trips), (2, pair)] => (HandCategory::FullHouse, vec![*trips, *pair]),
        [(3, trips), (1, k1), (1, k2)] => (HandCategory::ThreeOfAKind, vec![*trips, *k1, *k2]),
        [(2, high), (2, low), (1, kicker)] => (HandCategory::TwoPair, vec![*high, *low, *kicker]),
        [(2, pair), (1, k1), (1, k2), (1, k3)] => {
            (HandCategory::OnePair, vec![*pair, *k1, *k2, *k3])
        }
        _ if is_flush => (HandCategory::Flush, values.to_vec()),
        _ => (HandCategory::HighCard, values.to_vec()),
    };

    EvaluatedHand {
        category,
        tiebreaks,
        cards: sorted,
    }
}

/// Top value of a five-card straight, with the wheel ranking as 5-high.
fn straight_top(values: [u8; 5]) -> Option<u8> {
    if values == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    if (1..5).all(|i| values[i] == values[0] - i as u8) {
        return Some(values[0]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use std::cmp::Ordering;

    fn cards(codes: &[&str]) -> Vec<Card> {
        codes.iter().map(|c| c.parse().expect("card code")).collect()
    }

    fn best(codes: &[&str]) -> EvaluatedHand {
        evaluate_best(&cards(codes)).expect("enough cards")
    }

    #[test]
    fn rejects_fewer_than_five_cards() {
        let result = evaluate_best(&cards(&["Ah", "Kh", "Qh", "Jh"]));
        assert_eq!(result, Err(EvalError::InsufficientCards(4)));
    }

    #[test]
    fn classifies_every_category() {
        assert_eq!(best(&["Ah", "Kh", "Qh", "Jh", "Th"]).category, HandCategory::RoyalFlush);
        assert_eq!(best(&["9s", "8s", "7s", "6s", "5s"]).category, HandCategory::StraightFlush);
        assert_eq!(best(&["Qc", "Qd", "Qh", "Qs", "3c"]).category, HandCategory::FourOfAKind);
        assert_eq!(best(&["Jc", "Jd", "Jh", "8s", "8c"]).category, HandCategory::FullHouse);
        assert_eq!(best(&["Kd", "Td", "8d", "4d", "2d"]).category, HandCategory::Flush);
        assert_eq!(best(&["9c", "8d", "7h", "6s", "5c"]).category, HandCategory::Straight);
        assert_eq!(best(&["7c", "7d", "7h", "Ks", "2c"]).category, HandCategory::ThreeOfAKind);
        assert_eq!(best(&["Tc", "Td", "5h", "5s", "Ac"]).category, HandCategory::TwoPair);
        assert_eq!(best(&["6c", "6d", "Ah", "9s", "3c"]).category, HandCategory::OnePair);
        assert_eq!(best(&["Ac", "Jd", "9h", "6s", "3c"]).category, HandCategory::HighCard);
    }

    #[test]
    fn wheel_ranks_as_five_high() {
        let wheel = best(&["Ac", "2d", "3h", "4s", "5c"]);
        assert_eq!(wheel.category, HandCategory::Straight);
        assert_eq!(wheel.tiebreaks, vec![5]);

        let six_high = best(&["2c", "3d", "4h", "5s", "6c"]);
        assert!(six_high > wheel);
    }

    #[test]
    fn wheel_straight_flush_is_not_royal() {
        let steel_wheel = best(&["As", "2s", "3s", "4s", "5s"]);
        assert_eq!(steel_wheel.category, HandCategory::StraightFlush);
        assert_eq!(steel_wheel.tiebreaks, vec![5]);

        let king_high = best(&["Kd", "Qd", "Jd", "Td", "9d"]);
        let royal = best(&["Ad", "Kd", "Qd", "Jd", "Td"]);
        assert!(royal > king_high);
        assert!(king_high > steel_wheel);
    }

    #[test]
    fn straight_over_pair_scenario() {
        // Hero A♠2♠ vs villain K♠K♦ on 3♦4♥5♣9♣J♥.
        let board = ["3d", "4h", "5c", "9c", "Jh"];
        let hero = best(&[&["As", "2s"], &board[..]].concat());
        let villain = best(&[&["Ks", "Kd"], &board[..]].concat());

        assert_eq!(hero.category, HandCategory::Straight);
        assert_eq!(hero.tiebreaks, vec![5]);
        assert_eq!(villain.category, HandCategory::OnePair);
        assert!(hero > villain);
    }

    #[test]
    fn picks_best_subset_of_seven() {
        // Flush available alongside two pair; the flush must win out.
        let hand = best(&["Ah", "Ad", "Kh", "Kd", "9h", "4h", "2h"]);
        assert_eq!(hand.category, HandCategory::Flush);
        assert_eq!(hand.tiebreaks, vec![14, 13, 9, 4, 2]);
        assert!(hand.cards.iter().all(|c| c.suit == hand.cards[0].suit));
    }

    #[test]
    fn kickers_break_pair_ties() {
        let ace_kicker = best(&["8c", "8d", "Ah", "7s", "3c"]);
        let king_kicker = best(&["8h", "8s", "Kh", "7d", "3d"]);
        assert!(ace_kicker > king_kicker);
    }

    #[test]
    fn board_playing_hands_compare_equal() {
        let board = ["As", "Ad", "Ks", "Kd", "Qh"];
        let a = best(&[&["2h", "3c"], &board[..]].concat());
        let b = best(&[&["4d", "5s"], &board[..]].concat());
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn comparison_is_antisymmetric_and_transitive_on_random_hands() {
        let mut rng = StdRng::seed_from_u64(9001);
        let universe: Vec<Card> = Card::universe().collect();

        for _ in 0..200 {
            let mut shuffled = universe.clone();
            shuffled.shuffle(&mut rng);
            let a = evaluate_best(&shuffled[0..7]).expect("seven cards");
            let b = evaluate_best(&shuffled[7..14]).expect("seven cards");
            let c = evaluate_best(&shuffled[14..21]).expect("seven cards");

            assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            if a <= b && b <= c {
                assert!(a <= c);
            }
            // Hand order never contradicts category order.
            if a.category > b.category {
                assert!(a > b);
            }
        }
    }
}
