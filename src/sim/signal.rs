use serde::{Deserialize, Serialize};

use crate::model::GameDate;

/// A signal emitted by one system and consumed by others.
///
/// Carries the tick date so reacting systems do not have to re-derive it
/// when they post follow-up notices or prestige events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub date: GameDate,
    /// What happened.
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A full seasonal installment was paid.
    PaymentMade { loan_id: u64, amount: f64 },

    /// A seasonal installment was missed or only partially covered.
    PaymentMissed {
        loan_id: u64,
        missed_payments: u32,
        partial: bool,
    },

    /// A loan's balance reached zero.
    LoanPaidOff { loan_id: u64 },

    /// A loan crossed the default threshold.
    LoanDefaulted { loan_id: u64, lender_id: u64 },

    /// A lender stopped accepting applications from the company.
    LenderBlacklisted { lender_id: u64 },

    /// The emergency injector covered a cash deficit with a quick loan.
    EmergencyLoanOriginated { loan_id: u64, principal: f64 },

    /// Cellar stock or vineyards were force-sold against a loan.
    AssetsLiquidated { loan_id: u64, recovered_value: f64 },

    /// A restructure offer was placed before the player.
    RestructureOffered { offer_id: u64 },

    /// The player accepted a restructure offer and it was executed.
    RestructureExecuted {
        offer_id: u64,
        new_loan_id: Option<u64>,
    },

    /// The player declined a restructure offer.
    RestructureDeclined { offer_id: u64 },

    /// Extensible: any system can emit a custom signal.
    Custom {
        name: String,
        data: serde_json::Value,
    },
}
