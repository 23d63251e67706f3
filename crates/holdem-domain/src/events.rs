use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{ActionType, LegalAction};
use crate::card::Card;
use crate::hand::Street;
use crate::ids::{HandId, PlayerId, TableId};
use crate::money::Chips;
use crate::table::{PlayerPublic, SeatIndex, ShowdownEntry, SidePot};

/// Everything observable about one hand, as a tagged stream. Consumers
/// pattern-match on `kind`; all payloads are owned values, never references
/// into engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandEventKind {
    HandStart {
        dealer_seat: SeatIndex,
        hand_no: u64,
        players: Vec<PlayerPublic>,
    },
    /// Delivered by the operator only to the named player.
    HoleCards {
        player_id: PlayerId,
        cards: [Card; 2],
    },
    /// Cumulative board after each deal.
    Community {
        cards: Vec<Card>,
        street: Street,
    },
    ActionOn {
        player_id: PlayerId,
        legal_actions: Vec<LegalAction>,
        pot: Chips,
        current_bet: Chips,
        deadline: DateTime<Utc>,
    },
    PlayerActed {
        player_id: PlayerId,
        action: ActionType,
        /// The player's round bet after the action.
        amount: Chips,
        pot: Chips,
        chips: Chips,
    },
    PotUpdate {
        pot: Chips,
        side_pots: Vec<SidePot>,
    },
    Showdown {
        results: Vec<ShowdownEntry>,
    },
    HandEnd {
        players: Vec<PlayerPublic>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandEvent {
    pub table_id: TableId,
    pub hand_id: HandId,
    pub hand_no: u64,
    pub event_seq: u32,
    pub occurred_at: DateTime<Utc>,
    pub kind: HandEventKind,
}
