use serde::{Deserialize, Serialize};

use super::date::GameDate;

/// What one liquidation step touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiquidationTarget {
    /// Sell `bottles` from a cellar batch (partial sales allowed).
    CellarSale { batch_id: u64, bottles: u32 },
    /// Seize and force-sell a whole vineyard.
    VineyardSeizure { vineyard_id: u64 },
}

/// One step of a liquidation plan, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationStep {
    pub target: LiquidationTarget,
    pub label: String,
    /// Market value recovered by this step. Consumes the seizure allowance.
    pub value: f64,
    /// Cash realized after the forced-sale penalty; this is what pays debt.
    pub proceeds: f64,
}

/// Consolidation loan terms proposed by the offer builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedTerms {
    pub lender_id: u64,
    pub lender_name: String,
    pub annual_rate: f64,
    pub seasons: u32,
    /// Set when no preferred lender was in range and the terms fall back to
    /// punitive emergency multipliers.
    pub emergency_override: bool,
}

/// A simulated forced-loan restructure, awaiting the player's decision.
///
/// Building one mutates nothing: the steps are a plan, priced against a
/// snapshot of the cellar and vineyards. Execution re-plans against live
/// records using the caps stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestructureOffer {
    pub id: u64,
    pub created: GameDate,
    pub expires: GameDate,
    /// Forced loans covered, ascending.
    pub loan_ids: Vec<u64>,
    pub total_forced_balance: f64,
    /// Seizure allowance: min(debt cap, portfolio cap) at build time.
    pub max_seizure_value: f64,
    pub steps: Vec<LiquidationStep>,
    pub cellar_lots_at_risk: usize,
    pub vineyards_at_risk: usize,
    /// Debt left after simulated proceeds; 0 means no consolidation loan.
    pub consolidated_principal: f64,
    /// Absent when the simulated proceeds cover the whole debt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<ProposedTerms>,
    pub prestige_penalty: f64,
    /// Human-readable plan, one line per step plus totals.
    pub summary: Vec<String>,
}

impl RestructureOffer {
    pub fn is_expired(&self, now: GameDate) -> bool {
        now >= self.expires
    }

    /// True if the offer still covers exactly this forced-loan set.
    pub fn covers(&self, forced_loan_ids: &[u64]) -> bool {
        self.loan_ids == forced_loan_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::Season;

    fn bare_offer(loan_ids: Vec<u64>) -> RestructureOffer {
        RestructureOffer {
            id: 9,
            created: GameDate::from_year(2),
            expires: GameDate::from_year(3),
            loan_ids,
            total_forced_balance: 1_000.0,
            max_seizure_value: 500.0,
            steps: vec![],
            cellar_lots_at_risk: 0,
            vineyards_at_risk: 0,
            consolidated_principal: 1_000.0,
            terms: None,
            prestige_penalty: 0.0,
            summary: vec![],
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_boundary() {
        let offer = bare_offer(vec![1]);
        assert!(!offer.is_expired(GameDate::new(2, Season::Winter, 12)));
        assert!(offer.is_expired(GameDate::from_year(3)));
    }

    #[test]
    fn covers_requires_identical_set() {
        let offer = bare_offer(vec![1, 4]);
        assert!(offer.covers(&[1, 4]));
        assert!(!offer.covers(&[1]));
        assert!(!offer.covers(&[1, 5]));
    }
}
