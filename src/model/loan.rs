use serde::{Deserialize, Serialize};

use super::date::{GameDate, SEASONS_PER_YEAR};

/// Balances at or below this snap to zero (half a cent of drift).
pub const BALANCE_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LoanStatus {
    Active,
    PaidOff,
    Defaulted,
}

string_enum!(LoanStatus {
    Active => "active",
    PaidOff => "paid_off",
    Defaulted => "defaulted",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LoanCategory {
    /// Taken voluntarily through a lender's normal application.
    Standard,
    /// Injected by the emergency system to cover a cash deficit.
    Emergency,
    /// Consolidation loan created by an executed restructure offer.
    Restructured,
}

string_enum!(LoanCategory {
    Standard => "standard",
    Emergency => "emergency",
    Restructured => "restructured",
});

/// Fixed installment that amortizes `principal` over `seasons` periods at
/// `seasonal_rate` interest per period.
///
/// # Panics
/// Panics if `seasons` is zero.
pub fn amortized_payment(principal: f64, seasonal_rate: f64, seasons: u32) -> f64 {
    assert!(seasons > 0, "amortized_payment: zero-length term");
    if seasonal_rate > 0.0 {
        principal * seasonal_rate / (1.0 - (1.0 + seasonal_rate).powi(-(seasons as i32)))
    } else {
        principal / seasons as f64
    }
}

/// One loan on the company's books.
///
/// `remaining_balance` is outstanding principal. Interest accrues per season
/// on the balance inside `apply_installment`; penalties (late fees,
/// surcharges) add to the balance directly, which can stretch a loan past its
/// nominal term — `seasons_remaining` floors at 0 while the loan keeps
/// billing until the balance clears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: u64,
    pub lender_id: u64,
    pub principal: f64,
    /// Rate offered at origination.
    pub base_rate: f64,
    /// Current rate after any penalty hikes.
    pub effective_rate: f64,
    pub origination_fee: f64,
    pub remaining_balance: f64,
    pub seasonal_payment: f64,
    pub seasons_total: u32,
    pub seasons_remaining: u32,
    pub start: GameDate,
    pub next_payment_due: GameDate,
    /// Net miss count: +1 per missed or partial season, -1 (floor 0) per
    /// fully paid season. Drives the escalation ladder.
    pub missed_payments: u32,
    pub status: LoanStatus,
    /// Originated by the engine rather than the player; forced loans are the
    /// ones a restructure offer consolidates.
    pub is_forced: bool,
    pub category: LoanCategory,
}

impl Loan {
    /// Create an active loan starting at `start`. The first installment falls
    /// due at the start of the following season.
    ///
    /// # Panics
    /// Panics if `principal` is not positive or `seasons` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        lender_id: u64,
        principal: f64,
        annual_rate: f64,
        origination_fee: f64,
        seasons: u32,
        start: GameDate,
        category: LoanCategory,
        is_forced: bool,
    ) -> Self {
        assert!(principal > 0.0, "Loan::new: principal must be positive");
        assert!(seasons > 0, "Loan::new: term must be at least one season");
        let seasonal_rate = annual_rate / SEASONS_PER_YEAR as f64;
        Self {
            id,
            lender_id,
            principal,
            base_rate: annual_rate,
            effective_rate: annual_rate,
            origination_fee,
            remaining_balance: principal,
            seasonal_payment: amortized_payment(principal, seasonal_rate, seasons),
            seasons_total: seasons,
            seasons_remaining: seasons,
            start,
            next_payment_due: start.season_start().plus_seasons(1),
            missed_payments: 0,
            status: LoanStatus::Active,
            is_forced,
            category,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn seasonal_rate(&self) -> f64 {
        self.effective_rate / SEASONS_PER_YEAR as f64
    }

    /// Balance plus one season of interest — what it takes to close the loan
    /// at the next installment.
    pub fn payoff_amount(&self) -> f64 {
        self.remaining_balance * (1.0 + self.seasonal_rate())
    }

    /// Amount due this season: the fixed installment, capped at the payoff.
    pub fn seasonal_due(&self) -> f64 {
        self.seasonal_payment.min(self.payoff_amount())
    }

    /// Apply one full seasonal installment: interest accrues on the balance,
    /// the remainder retires principal. Returns true if the loan paid off.
    pub fn apply_installment(&mut self) -> bool {
        let interest = self.remaining_balance * self.seasonal_rate();
        let principal_part = (self.seasonal_due() - interest).max(0.0);
        self.remaining_balance -= principal_part;
        self.seasons_remaining = self.seasons_remaining.saturating_sub(1);
        self.settle_if_cleared()
    }

    /// Apply a payment directly against the balance (partial seasonal
    /// payments, extra payments, liquidation proceeds). Does not advance the
    /// term. Returns true if the loan paid off.
    pub fn apply_toward_balance(&mut self, amount: f64) -> bool {
        assert!(
            amount >= 0.0,
            "apply_toward_balance: negative payment {amount}"
        );
        self.remaining_balance = (self.remaining_balance - amount).max(0.0);
        self.settle_if_cleared()
    }

    /// Recompute the installment over the remaining term, after a penalty
    /// changed the rate or the balance.
    pub fn reprice(&mut self) {
        self.seasonal_payment = amortized_payment(
            self.remaining_balance,
            self.seasonal_rate(),
            self.seasons_remaining.max(1),
        );
    }

    fn settle_if_cleared(&mut self) -> bool {
        if self.remaining_balance <= BALANCE_EPSILON {
            self.remaining_balance = 0.0;
            self.status = LoanStatus::PaidOff;
            true
        } else {
            false
        }
    }
}
