//! Player action types for the unified action queue.
//!
//! The UI queues `PlayerAction`s on the game state; `PlayerActionSystem`
//! drains them each week and leaves an `ActionResult` per action.

use serde::Serialize;

#[derive(Debug, Clone)]
pub enum PlayerAction {
    TakeLoan {
        lender_id: u64,
        principal: f64,
        seasons: u32,
    },
    MakeExtraPayment {
        loan_id: u64,
        amount: f64,
    },
    AcknowledgeWarning {
        loan_id: u64,
    },
    AcceptRestructure {
        offer_id: u64,
    },
    DeclineRestructure {
        offer_id: u64,
    },
}

impl PlayerAction {
    /// Short name used in results and logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::TakeLoan { .. } => "take_loan",
            PlayerAction::MakeExtraPayment { .. } => "make_extra_payment",
            PlayerAction::AcknowledgeWarning { .. } => "acknowledge_warning",
            PlayerAction::AcceptRestructure { .. } => "accept_restructure",
            PlayerAction::DeclineRestructure { .. } => "decline_restructure",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub action: String,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ActionOutcome {
    /// `record_id` points at what the action created: a loan, a payment
    /// transaction, or a notice.
    Completed { record_id: u64 },
    Failed { reason: String },
}
