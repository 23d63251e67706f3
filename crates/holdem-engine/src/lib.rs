pub mod betting;
pub mod deck;
pub mod engine;
pub mod eval;
pub mod events;
pub mod player;
pub mod pot;

pub use betting::{AppliedAction, BettingRound};
pub use deck::{Deck, DeckError};
pub use engine::TableEngine;
pub use eval::{EvalError, evaluate_best};
pub use events::{EventSink, NullSink};
pub use player::Player;
pub use pot::{PotContribution, build_side_pots};
