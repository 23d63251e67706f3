use thiserror::Error;

use crate::table::SeatIndex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("seat {0} is outside the table")]
    InvalidSeat(SeatIndex),
    #[error("seat {0} is already taken")]
    SeatTaken(SeatIndex),
    #[error("table roster is full")]
    RosterFull,
    #[error("player id is already seated")]
    DuplicateId,
    #[error("player is not seated at this table")]
    UnknownPlayer,
    #[error("it is not this player's turn")]
    NotActivePlayer,
    #[error("action is not legal")]
    ActionIllegal,
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("no hand is in progress")]
    NoActiveHand,
    #[error("not enough players to start a hand")]
    NotEnoughPlayers,
}
