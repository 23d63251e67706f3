use holdem_domain::{ActionType, Chips, DomainError, LegalAction, SeatIndex};
use tracing::debug;

use crate::player::Player;

/// What an accepted action did, for event construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedAction {
    pub action: ActionType,
    /// Chips actually moved from the stack this action.
    pub committed: Chips,
    /// The player's round bet afterwards.
    pub new_bet: Chips,
    /// True when the action lifted the round's current bet.
    pub raised: bool,
}

/// One betting round of a hand. The players themselves live in the engine's
/// seat-ordered roster; this tracks the round-wide bet state and implements
/// the legality rules over that roster.
#[derive(Debug, Clone)]
pub struct BettingRound {
    pub current_bet: Chips,
    /// Minimum raise increment. Starts at the big blind and grows only on a
    /// full legal raise; a short all-in never resets it.
    pub min_raise: Chips,
    pub last_raise: Option<Chips>,
    big_blind: Chips,
}

impl BettingRound {
    #[must_use]
    pub fn new(big_blind: Chips) -> Self {
        Self {
            current_bet: Chips::ZERO,
            min_raise: big_blind,
            last_raise: None,
            big_blind,
        }
    }

    /// Resets per-player round state and the round-wide bet for a new
    /// street. Not used at showdown, where bets must stay visible.
    pub fn begin_street(&mut self, players: &mut [Player]) {
        for player in players.iter_mut() {
            player.current_bet = Chips::ZERO;
            player.last_action = None;
        }
        self.current_bet = Chips::ZERO;
        self.min_raise = self.big_blind;
        self.last_raise = None;
    }

    /// The legal action set for `player`, assumed to be on action.
    #[must_use]
    pub fn legal_actions(&self, player: &Player) -> Vec<LegalAction> {
        let to_call = self.current_bet.saturating_sub(player.current_bet);
        let mut actions = vec![LegalAction::simple(ActionType::Fold)];

        if to_call.is_zero() {
            actions.push(LegalAction::simple(ActionType::Check));
        } else {
            let call = to_call.min(player.chips);
            actions.push(LegalAction::bounded(ActionType::Call, call, call));
        }

        if player.chips > to_call {
            let min_raise_total = self.current_bet + self.min_raise;
            let min_add = (min_raise_total - player.current_bet).min(player.chips);
            actions.push(LegalAction::bounded(ActionType::Raise, min_add, player.chips));
        }
        if !player.chips.is_zero() {
            actions.push(LegalAction::bounded(
                ActionType::AllIn,
                player.chips,
                player.chips,
            ));
        }

        actions
    }

    /// Applies one action for `player`. Rejections leave both the player and
    /// the round untouched.
    pub fn apply(
        &mut self,
        player: &mut Player,
        action: ActionType,
        amount: Option<Chips>,
    ) -> Result<AppliedAction, DomainError> {
        let to_call = self.current_bet.saturating_sub(player.current_bet);

        match action {
            ActionType::Fold => {
                player.fold();
                Ok(AppliedAction {
                    action,
                    committed: Chips::ZERO,
                    new_bet: player.current_bet,
                    raised: false,
                })
            }
            ActionType::Check => {
                if !to_call.is_zero() {
                    return Err(DomainError::ActionIllegal);
                }
                player.last_action = Some(ActionType::Check);
                Ok(AppliedAction {
                    action,
                    committed: Chips::ZERO,
                    new_bet: player.current_bet,
                    raised: false,
                })
            }
            ActionType::Call => {
                if to_call.is_zero() {
                    return Err(DomainError::ActionIllegal);
                }
                let committed = player.commit(to_call);
                player.last_action = Some(ActionType::Call);
                Ok(AppliedAction {
                    action,
                    committed,
                    new_bet: player.current_bet,
                    raised: false,
                })
            }
            ActionType::Raise | ActionType::AllIn => {
                let add = match action {
                    ActionType::AllIn => player.chips,
                    _ => amount.ok_or(DomainError::ActionIllegal)?,
                };
                if add.is_zero() || add > player.chips {
                    return Err(DomainError::ActionIllegal);
                }
                let is_all_in = add == player.chips;
                let new_bet = player.current_bet + add;
                let raise_over = new_bet.saturating_sub(self.current_bet);

                // A raise below the minimum is only acceptable as an all-in;
                // such a short all-in is a dead raise and leaves min_raise
                // alone.
                if raise_over < self.min_raise && !is_all_in {
                    return Err(DomainError::ActionIllegal);
                }

                let committed = player.commit(add);
                player.last_action = Some(action);

                let raised = new_bet > self.current_bet;
                if raised {
                    self.current_bet = new_bet;
                    if raise_over >= self.min_raise {
                        self.min_raise = raise_over;
                        self.last_raise = Some(raise_over);
                    } else {
                        debug!(
                            seat = player.seat,
                            raise_over = %raise_over,
                            min_raise = %self.min_raise,
                            "short all-in raise accepted without reopening the minimum"
                        );
                    }
                }

                Ok(AppliedAction {
                    action,
                    committed,
                    new_bet,
                    raised,
                })
            }
        }
    }

    /// The next player owing action after `from_seat`, in seat order: still
    /// able to act, and either short of the current bet or yet to act this
    /// round (which preflop is exactly the big-blind option).
    #[must_use]
    pub fn find_next_actor(&self, players: &[Player], from_seat: SeatIndex) -> Option<SeatIndex> {
        let mut ordered: Vec<&Player> = players.iter().collect();
        ordered.sort_by_key(|p| p.seat);
        let pivot = ordered.partition_point(|p| p.seat <= from_seat);
        ordered.rotate_left(pivot);
        ordered
            .into_iter()
            .filter(|p| p.seat != from_seat)
            .find(|p| {
                p.can_act() && (p.current_bet < self.current_bet || p.last_action.is_none())
            })
            .map(|p| p.seat)
    }
}
