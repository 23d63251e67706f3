use holdem_domain::Card;
use rand::RngCore;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck exhausted")]
    Exhausted,
}

/// A shuffled 52-card sequence with a read cursor. Dealt cards are never
/// reinserted, so no card can appear twice over the life of one deck.
///
/// Legal play consumes at most 19 cards (two per seat at six seats, three
/// burns, five board cards), so `Exhausted` indicates a driver bug.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    /// Fisher–Yates shuffle over the full universe. The caller picks the
    /// randomness source; production play uses [`Deck::shuffled_os`], tests
    /// inject a seeded rng.
    pub fn shuffled(rng: &mut impl RngCore) -> Self {
        let mut cards: Vec<Card> = Card::universe().collect();
        cards.shuffle(rng);
        Self { cards, cursor: 0 }
    }

    /// Shuffle from the operating system CSPRNG. rand's uniform index
    /// sampling is rejection-based, so the permutation carries no modulo
    /// bias.
    #[must_use]
    pub fn shuffled_os() -> Self {
        Self::shuffled(&mut OsRng)
    }

    /// A deck dealing exactly the given sequence, for replay and rigged
    /// tests.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, cursor: 0 }
    }

    pub fn deal(&mut self) -> Result<Card, DeckError> {
        let card = self.cards.get(self.cursor).ok_or(DeckError::Exhausted)?;
        self.cursor += 1;
        Ok(*card)
    }

    pub fn deal_n(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        let mut cards = Vec::with_capacity(n);
        for _ in 0..n {
            cards.push(self.deal()?);
        }
        Ok(cards)
    }

    /// Advances past one card without exposing it.
    pub fn burn(&mut self) -> Result<(), DeckError> {
        self.deal().map(|_| ())
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn deals_52_distinct_cards_then_exhausts() {
        let mut deck = Deck::shuffled_os();
        let mut seen = HashSet::new();
        for _ in 0..52 {
            assert!(seen.insert(deck.deal().expect("card available")));
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(deck.remaining(), 0);
        assert_eq!(deck.deal(), Err(DeckError::Exhausted));
    }

    #[test]
    fn deal_n_matches_sequential_deals() {
        let mut a = Deck::shuffled(&mut StdRng::seed_from_u64(7));
        let mut b = Deck::shuffled(&mut StdRng::seed_from_u64(7));

        let batch = a.deal_n(5).expect("five cards");
        let singles: Vec<_> = (0..5).map(|_| b.deal().expect("card")).collect();
        assert_eq!(batch, singles);
    }

    #[test]
    fn burn_advances_the_cursor() {
        let mut a = Deck::shuffled(&mut StdRng::seed_from_u64(11));
        let mut b = Deck::shuffled(&mut StdRng::seed_from_u64(11));

        b.deal().expect("card");
        a.burn().expect("burn");
        assert_eq!(a.remaining(), 51);
        assert_eq!(a.deal().expect("card"), b.deal().expect("card"));
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = Deck::shuffled(&mut StdRng::seed_from_u64(42));
        let mut b = Deck::shuffled(&mut StdRng::seed_from_u64(42));
        for _ in 0..52 {
            assert_eq!(a.deal(), b.deal());
        }
    }

    #[test]
    fn deal_n_past_the_end_fails() {
        let mut deck = Deck::shuffled_os();
        deck.deal_n(50).expect("fifty cards");
        assert!(deck.deal_n(3).is_err());
    }
}
