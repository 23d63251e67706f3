use holdem_domain::{ActionType, Card, Chips, PlayerId, PlayerPublic, SeatIndex};

/// One seated player. Owned by the engine; the outside world addresses
/// players by id and observes them through [`PlayerPublic`].
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub seat: SeatIndex,
    pub chips: Chips,
    pub hole_cards: Vec<Card>,
    /// Chips committed in the current betting round.
    pub current_bet: Chips,
    /// Chips committed over the whole hand; pot building works from this.
    pub contributed: Chips,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub is_sitting_out: bool,
    pub is_connected: bool,
    pub dealt_in: bool,
    pub last_action: Option<ActionType>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: String, seat: SeatIndex, chips: Chips) -> Self {
        Self {
            id,
            name,
            seat,
            chips,
            hole_cards: Vec::new(),
            current_bet: Chips::ZERO,
            contributed: Chips::ZERO,
            has_folded: false,
            is_all_in: false,
            is_sitting_out: false,
            is_connected: true,
            dealt_in: false,
            last_action: None,
        }
    }

    /// Eligibility for the NEXT hand. Distinct from [`Player::in_hand`]:
    /// a player who went broke mid-hand is still in this hand (all-in),
    /// but not in the next one.
    #[must_use]
    pub fn eligible_for_next_hand(&self) -> bool {
        self.is_connected && !self.chips.is_zero() && !self.is_sitting_out
    }

    /// Still contesting the current hand.
    #[must_use]
    pub fn in_hand(&self) -> bool {
        self.dealt_in && !self.has_folded
    }

    /// May still be asked to act this hand.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.in_hand() && !self.is_all_in
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.current_bet = Chips::ZERO;
        self.contributed = Chips::ZERO;
        self.has_folded = false;
        self.is_all_in = false;
        self.dealt_in = false;
        self.last_action = None;
    }

    /// Moves up to `amount` from the stack into the current bet, returning
    /// what was actually committed. Going broke marks the player all-in.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let real = amount.min(self.chips);
        self.chips -= real;
        self.current_bet += real;
        self.contributed += real;
        if self.chips.is_zero() && self.dealt_in {
            self.is_all_in = true;
        }
        real
    }

    pub fn fold(&mut self) {
        self.has_folded = true;
        self.last_action = Some(ActionType::Fold);
    }

    #[must_use]
    pub fn public(&self) -> PlayerPublic {
        PlayerPublic {
            id: self.id.clone(),
            name: self.name.clone(),
            seat: self.seat,
            chips: self.chips,
            current_bet: self.current_bet,
            has_folded: self.has_folded,
            is_all_in: self.is_all_in,
            last_action: self.last_action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(chips: u64) -> Player {
        let mut p = Player::new(PlayerId::from("p"), "P".to_string(), 0, Chips(chips));
        p.dealt_in = true;
        p
    }

    #[test]
    fn commit_caps_at_stack_and_marks_all_in() {
        let mut p = player(10);
        assert_eq!(p.commit(Chips(25)), Chips(10));
        assert_eq!(p.chips, Chips::ZERO);
        assert_eq!(p.current_bet, Chips(10));
        assert_eq!(p.contributed, Chips(10));
        assert!(p.is_all_in);
    }

    #[test]
    fn partial_commit_keeps_player_live() {
        let mut p = player(100);
        assert_eq!(p.commit(Chips(30)), Chips(30));
        assert!(!p.is_all_in);
        assert!(p.can_act());
    }

    #[test]
    fn eligibility_predicates_disagree_for_broke_all_in() {
        let mut p = player(10);
        p.commit(Chips(10));
        assert!(p.in_hand());
        assert!(!p.can_act());
        assert!(!p.eligible_for_next_hand());
    }

    #[test]
    fn folding_is_sticky_for_the_hand() {
        let mut p = player(50);
        p.fold();
        assert!(!p.in_hand());
        assert!(!p.can_act());
        assert_eq!(p.last_action, Some(ActionType::Fold));
    }
}
