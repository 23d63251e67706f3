use serde::{Deserialize, Serialize};

use crate::money::Chips;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

/// One legal move for the player on action. `min_amount`/`max_amount` bound
/// the chips the action adds on top of the player's current round bet; both
/// are absent for fold and check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalAction {
    pub action_type: ActionType,
    pub min_amount: Option<Chips>,
    pub max_amount: Option<Chips>,
}

impl LegalAction {
    #[must_use]
    pub fn simple(action_type: ActionType) -> Self {
        Self {
            action_type,
            min_amount: None,
            max_amount: None,
        }
    }

    #[must_use]
    pub fn bounded(action_type: ActionType, min: Chips, max: Chips) -> Self {
        Self {
            action_type,
            min_amount: Some(min),
            max_amount: Some(max),
        }
    }
}
