use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LenderKind {
    Bank,
    InvestmentFund,
    QuickLoan,
    PrivateLender,
}

string_enum!(LenderKind {
    Bank => "bank",
    InvestmentFund => "investment_fund",
    QuickLoan => "quick_loan",
    PrivateLender => "private_lender",
});

/// Origination fee tuning for one lender.
///
/// The fee starts at `base_percent` of the principal, scales with how far the
/// borrower's credit rating sits below neutral (`credit_modifier`) and with
/// the term length (`duration_modifier`), then clamps to `[min_fee, max_fee]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    pub base_percent: f64,
    pub min_fee: f64,
    pub max_fee: f64,
    pub credit_modifier: f64,
    pub duration_modifier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lender {
    pub id: u64,
    pub name: String,
    pub kind: LenderKind,
    /// Annual interest rate as a fraction (0.06 = 6%).
    pub base_rate: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Term bounds in seasons.
    pub min_seasons: u32,
    pub max_seasons: u32,
    pub fee: FeeConfig,
    /// Set when the company defaults on this lender. Blacklisted lenders
    /// refuse all new applications, including emergency ones.
    pub blacklisted: bool,
}

impl Lender {
    /// Create a lender with terms typical for its kind. Scenario setup
    /// tweaks individual fields afterwards.
    pub fn new(id: u64, name: &str, kind: LenderKind) -> Self {
        let (base_rate, min_amount, max_amount, min_seasons, max_seasons, fee) = match kind {
            LenderKind::Bank => (
                0.06,
                5_000.0,
                250_000.0,
                4,
                40,
                FeeConfig {
                    base_percent: 0.015,
                    min_fee: 50.0,
                    max_fee: 2_500.0,
                    credit_modifier: 0.5,
                    duration_modifier: 0.3,
                },
            ),
            LenderKind::InvestmentFund => (
                0.09,
                25_000.0,
                1_000_000.0,
                8,
                60,
                FeeConfig {
                    base_percent: 0.025,
                    min_fee: 500.0,
                    max_fee: 20_000.0,
                    credit_modifier: 0.8,
                    duration_modifier: 0.2,
                },
            ),
            LenderKind::QuickLoan => (
                0.18,
                500.0,
                50_000.0,
                1,
                8,
                FeeConfig {
                    base_percent: 0.04,
                    min_fee: 25.0,
                    max_fee: 5_000.0,
                    credit_modifier: 1.0,
                    duration_modifier: 0.1,
                },
            ),
            LenderKind::PrivateLender => (
                0.12,
                1_000.0,
                100_000.0,
                2,
                24,
                FeeConfig {
                    base_percent: 0.03,
                    min_fee: 100.0,
                    max_fee: 8_000.0,
                    credit_modifier: 1.2,
                    duration_modifier: 0.4,
                },
            ),
        };
        Self {
            id,
            name: name.to_string(),
            kind,
            base_rate,
            min_amount,
            max_amount,
            min_seasons,
            max_seasons,
            fee,
            blacklisted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_defaults_ordered_by_risk() {
        let bank = Lender::new(1, "Crédit Rural", LenderKind::Bank);
        let quick = Lender::new(2, "RapidCash", LenderKind::QuickLoan);
        assert!(bank.base_rate < quick.base_rate);
        assert!(bank.max_seasons > quick.max_seasons);
        assert!(!bank.blacklisted);
    }

    #[test]
    fn kind_string_round_trip() {
        let kind = LenderKind::InvestmentFund;
        let s: String = kind.into();
        assert_eq!(s, "investment_fund");
        assert_eq!(LenderKind::try_from(s).unwrap(), LenderKind::InvestmentFund);
        assert!(LenderKind::try_from("pawn_shop".to_string()).is_err());
    }
}
