use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::card::Card;
use crate::hand::EvaluatedHand;
use crate::ids::PlayerId;
use crate::money::Chips;

pub type SeatIndex = u8;

/// Hard seat ceiling. A table's roster never exceeds this; it is a system
/// constant, not a per-table setting.
pub const MAX_SEATS: SeatIndex = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub buy_in: Chips,
    pub action_timeout: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            small_blind: Chips(1),
            big_blind: Chips(2),
            buy_in: Chips(200),
            action_timeout: Duration::from_secs(30),
        }
    }
}

/// Broadcastable view of one seated player. Hole cards are deliberately not
/// representable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub name: String,
    pub seat: SeatIndex,
    pub chips: Chips,
    pub current_bet: Chips,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub last_action: Option<ActionType>,
}

/// One pot slice. The list a hand produces is ordered from the lowest all-in
/// level up, with the unmatched remainder (the main pot) last; amounts sum to
/// the hand's total pot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible_players: Vec<PlayerId>,
}

/// Per-player line of the showdown event. `hole_cards` is empty and `hand`
/// absent for an uncontested winner, whose cards stay hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownEntry {
    pub player_id: PlayerId,
    pub hole_cards: Vec<Card>,
    pub hand: Option<EvaluatedHand>,
    pub win_amount: Chips,
}
