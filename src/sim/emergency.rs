//! Emergency quick-loan injection when cash goes negative.
//!
//! Runs weekly, after every other system, so it sees the week's final cash
//! position. A negative balance is covered by a forced loan from a random
//! quick-loan lender at punitive rates. The principal is sized iteratively
//! so the deposit net of the origination fee still clears the deficit.

use rand::Rng;
use tracing::warn;

use super::context::TickContext;
use super::lending;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TickFrequency};
use crate::model::{LenderKind, LoanCategory, WarningSeverity};

/// Borrow this much beyond the deficit so the account lands above zero.
const CASH_BUFFER: f64 = 0.10;
/// Rate multiplier when the sized loan fits the lender's normal policy.
const PENALTY_RATE_MULT: f64 = 1.5;
/// Rate multiplier when the lender has to stretch beyond policy limits.
const DESPERATE_RATE_MULT: f64 = 2.0;
/// Per-round principal growth while the net deposit falls short.
const SIZING_GROWTH: f64 = 1.25;
const MAX_SIZING_ROUNDS: u32 = 8;
/// Quick loans run short; clamped to the lender's offered band.
const DEFAULT_TERM_SEASONS: u32 = 4;

const EMERGENCY_PRESTIGE_PENALTY: f64 = -8.0;
const EMERGENCY_PRESTIGE_DECAY: f64 = 0.05;

pub struct EmergencyLoanSystem;

impl SimSystem for EmergencyLoanSystem {
    fn name(&self) -> &'static str {
        "emergency_loans"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Weekly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        if ctx.state.company.cash >= 0.0 {
            return;
        }
        inject_emergency_loan(ctx);
    }
}

fn inject_emergency_loan(ctx: &mut TickContext) {
    let deficit = -ctx.state.company.cash;

    let candidates: Vec<u64> = ctx
        .state
        .lenders
        .values()
        .filter(|l| l.kind == LenderKind::QuickLoan && !l.blacklisted)
        .map(|l| l.id)
        .collect();
    if candidates.is_empty() {
        warn!(deficit, "cash is negative and no quick-loan lender will extend credit");
        return;
    }
    let pick = candidates[ctx.rng.random_range(0..candidates.len())];
    let lender = ctx.state.lenders[&pick].clone();

    let seasons = DEFAULT_TERM_SEASONS.clamp(lender.min_seasons, lender.max_seasons);
    let target = deficit * (1.0 + CASH_BUFFER);
    let mut principal = target.max(lender.min_amount);

    // A request the lender would normally refuse still goes through, at
    // double the rate instead of one-and-a-half.
    let within_policy = lending::check_availability(&lender, principal, seasons).is_ok();
    let rate_mult = if within_policy {
        PENALTY_RATE_MULT
    } else {
        DESPERATE_RATE_MULT
    };
    let annual_rate = lender.base_rate * rate_mult;

    for _ in 0..MAX_SIZING_ROUNDS {
        let fee = lending::origination_fee(
            &lender,
            principal,
            seasons,
            ctx.state.company.credit_rating,
        );
        if principal - fee >= target {
            break;
        }
        principal *= SIZING_GROWTH;
    }

    match lending::originate(
        ctx.state,
        pick,
        principal,
        annual_rate,
        seasons,
        LoanCategory::Emergency,
        true,
    ) {
        Ok(loan_id) => {
            ctx.state.add_prestige_event(
                EMERGENCY_PRESTIGE_PENALTY,
                EMERGENCY_PRESTIGE_DECAY,
                "emergency_loan",
                format!("Forced to take an emergency loan from {}", lender.name),
                serde_json::json!({ "loan_id": loan_id, "principal": principal }),
            );
            ctx.state.queue_notice(
                WarningSeverity::Warning,
                "Emergency loan taken".to_string(),
                format!(
                    "{} advanced {:.2} at {:.1}% APR to cover a cash deficit.",
                    lender.name,
                    principal,
                    annual_rate * 100.0
                ),
            );
            ctx.signals.push(Signal {
                date: ctx.state.current_date,
                kind: SignalKind::EmergencyLoanOriginated { loan_id, principal },
            });
        }
        Err(e) => warn!(error = %e, "emergency origination failed"),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::{Company, GameState, TransactionKind};

    fn state_with_deficit(deficit: f64) -> GameState {
        let mut s = GameState::new(Company::new("Test Winery", 0.0));
        s.record_transaction(
            TransactionKind::Custom("setup".to_string()),
            -deficit,
            None,
            "setup".to_string(),
        );
        s
    }

    fn tick(state: &mut GameState) -> Vec<Signal> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut signals = Vec::new();
        let mut ctx = TickContext {
            state,
            rng: &mut rng,
            signals: &mut signals,
            inbox: &[],
        };
        EmergencyLoanSystem.tick(&mut ctx);
        signals
    }

    #[test]
    fn no_op_when_cash_non_negative() {
        let mut state = GameState::new(Company::new("Test Winery", 100.0));
        state.add_lender("FastCash", LenderKind::QuickLoan);
        tick(&mut state);
        assert!(state.loans.is_empty());
        assert_eq!(state.company.cash, 100.0);
    }

    #[test]
    fn deficit_is_covered_net_of_the_fee() {
        let mut state = state_with_deficit(1_000.0);
        state.add_lender("FastCash", LenderKind::QuickLoan);

        let signals = tick(&mut state);

        assert_eq!(state.loans.len(), 1);
        let loan = state.loans.values().next().unwrap();
        assert!(loan.is_forced);
        assert_eq!(loan.category, LoanCategory::Emergency);
        // Net deposit clears the deficit plus the buffer
        assert!(
            state.company.cash >= 0.0,
            "cash still negative: {}",
            state.company.cash
        );
        assert!(state.company.cash >= 1_000.0 * CASH_BUFFER - 1e-9);
        assert_eq!(state.ledger_cash(), state.company.cash);
        assert!(signals.iter().any(|s| matches!(
            s.kind,
            SignalKind::EmergencyLoanOriginated { loan_id, .. } if loan_id == loan.id
        )));
    }

    #[test]
    fn in_policy_request_pays_one_and_a_half_times_base() {
        let mut state = state_with_deficit(1_000.0);
        let lender_id = state.add_lender("FastCash", LenderKind::QuickLoan);
        let base_rate = state.lenders[&lender_id].base_rate;

        tick(&mut state);

        let loan = state.loans.values().next().unwrap();
        assert!((loan.effective_rate - base_rate * PENALTY_RATE_MULT).abs() < 1e-12);
    }

    #[test]
    fn oversized_request_pays_double_and_is_not_clamped() {
        // Deficit far beyond the quick-loan ceiling of 50,000
        let mut state = state_with_deficit(60_000.0);
        let lender_id = state.add_lender("FastCash", LenderKind::QuickLoan);
        let base_rate = state.lenders[&lender_id].base_rate;

        tick(&mut state);

        let loan = state.loans.values().next().unwrap();
        assert!(loan.principal >= 66_000.0, "principal {}", loan.principal);
        assert!((loan.effective_rate - base_rate * DESPERATE_RATE_MULT).abs() < 1e-12);
        assert!(state.company.cash >= 0.0);
    }

    #[test]
    fn blacklisted_lenders_are_skipped() {
        let mut state = state_with_deficit(1_000.0);
        let shady = state.add_lender("Shady Advances", LenderKind::QuickLoan);
        let honest = state.add_lender("FastCash", LenderKind::QuickLoan);
        state.lenders.get_mut(&shady).unwrap().blacklisted = true;

        tick(&mut state);

        let loan = state.loans.values().next().unwrap();
        assert_eq!(loan.lender_id, honest);
    }

    #[test]
    fn only_quick_loan_lenders_qualify() {
        let mut state = state_with_deficit(1_000.0);
        state.add_lender("Valley Bank", LenderKind::Bank);
        state.add_lender("Estate Capital", LenderKind::InvestmentFund);

        tick(&mut state);

        assert!(state.loans.is_empty());
        assert_eq!(state.company.cash, -1_000.0);
    }

    #[test]
    fn injection_leaves_a_prestige_mark_and_notice() {
        let mut state = state_with_deficit(1_000.0);
        state.add_lender("FastCash", LenderKind::QuickLoan);

        tick(&mut state);

        assert_eq!(state.prestige_events.len(), 1);
        assert!(state.prestige_events[0].amount < 0.0);
        assert!(state.notices.iter().any(|n| n.title == "Emergency loan taken"));
    }
}
