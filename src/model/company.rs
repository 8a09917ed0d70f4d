use serde::{Deserialize, Serialize};

/// Starting credit rating for a new company.
pub const DEFAULT_CREDIT_RATING: f64 = 0.5;

/// The player's winery. One per game state.
///
/// `cash` is only ever mutated through `GameState::record_transaction`, so the
/// ledger replays to the live balance: `opening_cash + Σ transaction amounts
/// == cash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub cash: f64,
    /// Cash at game start, before any transaction was recorded.
    pub opening_cash: f64,
    /// Baseline reputation before prestige events are applied.
    pub base_prestige: f64,
    /// 0 = untouchable, 1 = spotless. Feeds lender origination fees.
    pub credit_rating: f64,
    /// Backlog of ledger-correction work queued by payment penalties.
    /// A staff scheduling system outside this crate drains it.
    pub bookkeeping_hours: f64,
}

impl Company {
    pub fn new(name: &str, opening_cash: f64) -> Self {
        Self {
            name: name.to_string(),
            cash: opening_cash,
            opening_cash,
            base_prestige: 0.0,
            credit_rating: DEFAULT_CREDIT_RATING,
            bookkeeping_hours: 0.0,
        }
    }

    /// Shift the credit rating by `delta`, clamped to `[0, 1]`.
    pub fn adjust_credit_rating(&mut self, delta: f64) {
        self.credit_rating = (self.credit_rating + delta).clamp(0.0, 1.0);
    }
}
