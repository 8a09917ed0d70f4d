//! Forced asset sales.
//!
//! Two callers share this module: escalation tier 3 liquidates immediately
//! against one loan (`liquidate_for_loan`), and the restructure flow first
//! *plans* against a snapshot (`plan_restructure_liquidation`, pure) and
//! later applies the re-planned steps to live records (`apply_steps`).

use std::collections::BTreeMap;

use tracing::warn;

use crate::model::{
    GameState, LiquidationStep, LiquidationTarget, TransactionKind, Vineyard, WineBatch,
};

/// Forced sales realize this much below market value.
pub const SALE_PENALTY: f64 = 0.25;
/// A remaining allowance at or below this ends a liquidation plan.
pub const ALLOWANCE_EPSILON: f64 = 1.0;
/// One cellar step may consume at most this fraction of the total forced debt.
pub const STEP_DEBT_FRACTION: f64 = 0.25;
/// Tier 3 sells cellar stock up to this fraction of the loan balance.
pub const TIER_CELLAR_BALANCE_FRACTION: f64 = 0.5;
/// Tier 3 seizes vineyards up to this fraction of the vineyard portfolio.
pub const TIER_VINEYARD_PORTFOLIO_FRACTION: f64 = 0.5;

fn proceeds_of(value: f64) -> f64 {
    value * (1.0 - SALE_PENALTY)
}

// ---------------------------------------------------------------------------
// Pure planning (restructure offers)
// ---------------------------------------------------------------------------

/// Plan a liquidation against a snapshot of the estate, without touching it.
///
/// Steps alternate: a cellar sale (highest-value lot first, partial lots
/// allowed, capped per step at 25% of the total forced debt), then a
/// vineyard seizure (the single cheapest vineyard that still fits the
/// remaining allowance). Stops when the allowance is spent to within
/// `ALLOWANCE_EPSILON` or two consecutive steps recover nothing.
///
/// Step values consume the allowance at face value; `proceeds` carry the
/// forced-sale penalty and are what actually pays debt.
pub fn plan_restructure_liquidation(
    cellar: &BTreeMap<u64, WineBatch>,
    vineyards: &BTreeMap<u64, Vineyard>,
    allowance: f64,
    total_debt: f64,
) -> Vec<LiquidationStep> {
    let mut bottles_left: BTreeMap<u64, u32> =
        cellar.iter().map(|(id, b)| (*id, b.bottles)).collect();
    let mut vineyards_left: Vec<&Vineyard> = vineyards.values().collect();

    let mut steps = Vec::new();
    let mut remaining = allowance;
    let mut zero_streak = 0u32;
    let mut cellar_turn = true;

    while remaining > ALLOWANCE_EPSILON && zero_streak < 2 {
        let step = if cellar_turn {
            plan_cellar_step(cellar, &mut bottles_left, remaining, total_debt)
        } else {
            plan_vineyard_step(&mut vineyards_left, remaining)
        };
        cellar_turn = !cellar_turn;

        match step {
            Some(step) => {
                remaining -= step.value;
                zero_streak = 0;
                steps.push(step);
            }
            None => zero_streak += 1,
        }
    }
    steps
}

fn plan_cellar_step(
    cellar: &BTreeMap<u64, WineBatch>,
    bottles_left: &mut BTreeMap<u64, u32>,
    remaining: f64,
    total_debt: f64,
) -> Option<LiquidationStep> {
    let budget = remaining.min(total_debt * STEP_DEBT_FRACTION);
    let (&batch_id, batch) = cellar
        .iter()
        .filter(|(id, b)| {
            bottles_left.get(id).copied().unwrap_or(0) > 0 && b.price_per_bottle > 0.0
        })
        .max_by(|(ia, a), (ib, b)| {
            let va = bottles_left[*ia] as f64 * a.price_per_bottle;
            let vb = bottles_left[*ib] as f64 * b.price_per_bottle;
            va.total_cmp(&vb)
        })?;

    let available = bottles_left[&batch_id];
    let bottles = available.min((budget / batch.price_per_bottle).floor() as u32);
    if bottles == 0 {
        return None;
    }
    if let Some(left) = bottles_left.get_mut(&batch_id) {
        *left -= bottles;
    }
    let value = bottles as f64 * batch.price_per_bottle;
    Some(LiquidationStep {
        target: LiquidationTarget::CellarSale { batch_id, bottles },
        label: format!("{} ({bottles} bottles)", batch.label),
        value,
        proceeds: proceeds_of(value),
    })
}

fn plan_vineyard_step(
    vineyards_left: &mut Vec<&Vineyard>,
    remaining: f64,
) -> Option<LiquidationStep> {
    let idx = vineyards_left
        .iter()
        .enumerate()
        .filter(|(_, v)| v.value <= remaining)
        .min_by(|(_, a), (_, b)| a.value.total_cmp(&b.value))
        .map(|(i, _)| i)?;
    let v = vineyards_left.swap_remove(idx);
    Some(LiquidationStep {
        target: LiquidationTarget::VineyardSeizure { vineyard_id: v.id },
        label: v.name.clone(),
        value: v.value,
        proceeds: proceeds_of(v.value),
    })
}

// ---------------------------------------------------------------------------
// Applying to live records
// ---------------------------------------------------------------------------

/// Execute planned steps against live records. Returns total cash proceeds.
///
/// A lot that shrank or vanished since planning sells whatever is still
/// there; the executor re-plans right before applying, so a mismatch here
/// means another system touched the estate mid-action.
pub fn apply_steps(state: &mut GameState, steps: &[LiquidationStep], loan_id: Option<u64>) -> f64 {
    let mut proceeds = 0.0;
    for step in steps {
        match step.target {
            LiquidationTarget::CellarSale { batch_id, bottles } => {
                proceeds += sell_batch_bottles(state, batch_id, bottles, loan_id);
            }
            LiquidationTarget::VineyardSeizure { vineyard_id } => {
                proceeds += seize_vineyard(state, vineyard_id, loan_id);
            }
        }
    }
    proceeds
}

/// Force-sell bottles from a cellar lot at the penalty price. Returns the
/// cash proceeds; empty lots are removed.
pub fn sell_batch_bottles(
    state: &mut GameState,
    batch_id: u64,
    bottles: u32,
    loan_id: Option<u64>,
) -> f64 {
    let Some(batch) = state.cellar.get_mut(&batch_id) else {
        warn!(batch_id, "cellar lot vanished before forced sale");
        return 0.0;
    };
    let sold = bottles.min(batch.bottles);
    if sold == 0 {
        return 0.0;
    }
    batch.bottles -= sold;
    let label = batch.label.clone();
    let value = sold as f64 * batch.price_per_bottle;
    if batch.bottles == 0 {
        state.cellar.remove(&batch_id);
    }
    let proceeds = proceeds_of(value);
    state.record_transaction(
        TransactionKind::WineSale,
        proceeds,
        loan_id,
        format!("Forced sale of {sold} bottles of {label}"),
    );
    proceeds
}

/// Seize a vineyard and force-sell it whole. Returns the cash proceeds.
pub fn seize_vineyard(state: &mut GameState, vineyard_id: u64, loan_id: Option<u64>) -> f64 {
    let Some(vineyard) = state.vineyards.remove(&vineyard_id) else {
        warn!(vineyard_id, "vineyard vanished before seizure");
        return 0.0;
    };
    let proceeds = proceeds_of(vineyard.value);
    state.record_transaction(
        TransactionKind::VineyardSale,
        proceeds,
        loan_id,
        format!("Forced sale of the {} vineyard", vineyard.name),
    );
    proceeds
}

// ---------------------------------------------------------------------------
// Escalation tier 3: immediate per-loan liquidation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LiquidationOutcome {
    /// Face value removed from the estate.
    pub recovered_value: f64,
    /// Cash realized after the forced-sale penalty.
    pub proceeds: f64,
    /// Cash applied against the loan balance.
    pub debt_paid: f64,
    pub paid_off: bool,
    /// One line per sale, for warnings and notices.
    pub summary: Vec<String>,
}

/// Liquidate against one distressed loan, immediately and on live records:
/// cellar stock (highest value first) up to half the loan balance, then
/// vineyards (lowest value first) up to half the portfolio value, then all
/// available cash toward the balance.
pub fn liquidate_for_loan(state: &mut GameState, loan_id: u64) -> LiquidationOutcome {
    let mut outcome = LiquidationOutcome::default();
    let Some(loan) = state.loans.get(&loan_id) else {
        warn!(loan_id, "liquidation target loan not found");
        return outcome;
    };
    let balance = loan.remaining_balance;

    // Cellar first: highest-value lots, partial sales to fit the cap.
    let mut cellar_budget = balance * TIER_CELLAR_BALANCE_FRACTION;
    let mut lots: Vec<(u64, f64)> = state.cellar.values().map(|b| (b.id, b.value())).collect();
    lots.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (batch_id, _) in lots {
        if cellar_budget <= ALLOWANCE_EPSILON {
            break;
        }
        let Some(batch) = state.cellar.get(&batch_id) else {
            continue;
        };
        if batch.price_per_bottle <= 0.0 {
            continue;
        }
        let bottles = batch
            .bottles
            .min((cellar_budget / batch.price_per_bottle).floor() as u32);
        if bottles == 0 {
            continue;
        }
        let value = bottles as f64 * batch.price_per_bottle;
        let label = batch.label.clone();
        let proceeds = sell_batch_bottles(state, batch_id, bottles, Some(loan_id));
        cellar_budget -= value;
        outcome.recovered_value += value;
        outcome.proceeds += proceeds;
        outcome
            .summary
            .push(format!("Sold {bottles} bottles of {label} for {proceeds:.2}"));
    }

    // Then whole vineyards, cheapest first, up to half the portfolio.
    let mut vineyard_budget =
        state.vineyard_portfolio_value() * TIER_VINEYARD_PORTFOLIO_FRACTION;
    let mut estates: Vec<(u64, f64, String)> = state
        .vineyards
        .values()
        .map(|v| (v.id, v.value, v.name.clone()))
        .collect();
    estates.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (vineyard_id, value, name) in estates {
        if value > vineyard_budget {
            break;
        }
        let proceeds = seize_vineyard(state, vineyard_id, Some(loan_id));
        vineyard_budget -= value;
        outcome.recovered_value += value;
        outcome.proceeds += proceeds;
        outcome
            .summary
            .push(format!("Seized the {name} vineyard, sold for {proceeds:.2}"));
    }

    // Everything liquid goes to the lender.
    let pay = state.company.cash.max(0.0).min(balance);
    if pay > 0.0 {
        state.record_transaction(
            TransactionKind::LoanPayment,
            -pay,
            Some(loan_id),
            format!("Forced repayment on loan {loan_id}"),
        );
        if let Some(loan) = state.loans.get_mut(&loan_id) {
            outcome.paid_off = loan.apply_toward_balance(pay);
        }
        outcome.debt_paid = pay;
        outcome
            .summary
            .push(format!("{pay:.2} applied to the loan balance"));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Company, LenderKind, Loan, LoanCategory};

    fn estate_state(cash: f64) -> GameState {
        GameState::new(Company::new("Test Winery", cash))
    }

    fn distressed_loan(state: &mut GameState, balance: f64) -> u64 {
        let lender = state.add_lender("Fast Cash", LenderKind::QuickLoan);
        let mut loan = Loan::new(
            state.id_gen.next_id(),
            lender,
            balance,
            0.18,
            0.0,
            4,
            state.current_date,
            LoanCategory::Standard,
            false,
        );
        loan.missed_payments = 2;
        let id = loan.id;
        state.insert_loan(loan);
        id
    }

    // -- planning --

    #[test]
    fn plan_alternates_cellar_then_vineyard() {
        let mut state = estate_state(0.0);
        state.add_wine_batch("Reserve Red", 3, 100, 40.0);
        state.add_vineyard("South Slope", 2.0, 900.0);

        let steps =
            plan_restructure_liquidation(&state.cellar, &state.vineyards, 10_000.0, 20_000.0);

        assert!(steps.len() >= 2, "got {} steps", steps.len());
        assert!(matches!(
            steps[0].target,
            LiquidationTarget::CellarSale { .. }
        ));
        assert!(matches!(
            steps[1].target,
            LiquidationTarget::VineyardSeizure { .. }
        ));
    }

    #[test]
    fn plan_never_exceeds_allowance() {
        let mut state = estate_state(0.0);
        state.add_wine_batch("Reserve Red", 3, 500, 40.0);
        state.add_wine_batch("Table White", 4, 1_000, 8.0);
        state.add_vineyard("South Slope", 2.0, 7_000.0);
        state.add_vineyard("North Slope", 4.0, 12_000.0);

        let allowance = 15_000.0;
        let steps =
            plan_restructure_liquidation(&state.cellar, &state.vineyards, allowance, 60_000.0);

        let face: f64 = steps.iter().map(|s| s.value).sum();
        assert!(face <= allowance, "face {face} exceeds allowance");
        assert!(!steps.is_empty());
    }

    #[test]
    fn plan_cellar_step_capped_at_quarter_of_debt() {
        let mut state = estate_state(0.0);
        // One huge lot worth far more than any step cap
        state.add_wine_batch("Reserve Red", 3, 10_000, 50.0);

        let total_debt = 40_000.0;
        let steps =
            plan_restructure_liquidation(&state.cellar, &state.vineyards, 100_000.0, total_debt);

        let cap = total_debt * STEP_DEBT_FRACTION;
        for step in &steps {
            if matches!(step.target, LiquidationTarget::CellarSale { .. }) {
                assert!(
                    step.value <= cap + 1e-9,
                    "cellar step {} exceeds cap {cap}",
                    step.value
                );
            }
        }
    }

    #[test]
    fn plan_does_not_sell_the_same_bottles_twice() {
        let mut state = estate_state(0.0);
        state.add_wine_batch("Reserve Red", 3, 100, 10.0);

        let steps =
            plan_restructure_liquidation(&state.cellar, &state.vineyards, 100_000.0, 2_000.0);

        let sold: u32 = steps
            .iter()
            .filter_map(|s| match s.target {
                LiquidationTarget::CellarSale { bottles, .. } => Some(bottles),
                _ => None,
            })
            .sum();
        assert!(sold <= 100, "sold {sold} bottles out of 100");
    }

    #[test]
    fn plan_on_empty_estate_is_empty() {
        let state = estate_state(0.0);
        let steps =
            plan_restructure_liquidation(&state.cellar, &state.vineyards, 50_000.0, 50_000.0);
        assert!(steps.is_empty());
    }

    #[test]
    fn plan_is_pure() {
        let mut state = estate_state(0.0);
        state.add_wine_batch("Reserve Red", 3, 100, 40.0);
        state.add_vineyard("South Slope", 2.0, 900.0);

        plan_restructure_liquidation(&state.cellar, &state.vineyards, 10_000.0, 20_000.0);

        assert_eq!(state.cellar.len(), 1);
        assert_eq!(state.cellar.values().next().unwrap().bottles, 100);
        assert_eq!(state.vineyards.len(), 1);
    }

    // -- applying --

    #[test]
    fn apply_steps_sells_at_penalty_price() {
        let mut state = estate_state(0.0);
        let batch = state.add_wine_batch("Reserve Red", 3, 100, 10.0);
        let vineyard = state.add_vineyard("South Slope", 2.0, 800.0);

        let steps = vec![
            LiquidationStep {
                target: LiquidationTarget::CellarSale {
                    batch_id: batch,
                    bottles: 40,
                },
                label: "Reserve Red (40 bottles)".to_string(),
                value: 400.0,
                proceeds: 300.0,
            },
            LiquidationStep {
                target: LiquidationTarget::VineyardSeizure {
                    vineyard_id: vineyard,
                },
                label: "South Slope".to_string(),
                value: 800.0,
                proceeds: 600.0,
            },
        ];
        let proceeds = apply_steps(&mut state, &steps, None);

        assert_eq!(proceeds, 900.0);
        assert_eq!(state.company.cash, 900.0);
        assert_eq!(state.cellar.values().next().unwrap().bottles, 60);
        assert!(state.vineyards.is_empty());
        assert_eq!(state.transactions.len(), 2);
        assert_eq!(state.ledger_cash(), state.company.cash);
    }

    #[test]
    fn selling_every_bottle_removes_the_lot() {
        let mut state = estate_state(0.0);
        let batch = state.add_wine_batch("Reserve Red", 3, 10, 10.0);
        sell_batch_bottles(&mut state, batch, 10, None);
        assert!(state.cellar.is_empty());
    }

    #[test]
    fn apply_steps_survives_missing_records() {
        let mut state = estate_state(0.0);
        let steps = vec![LiquidationStep {
            target: LiquidationTarget::VineyardSeizure { vineyard_id: 999 },
            label: "Ghost".to_string(),
            value: 800.0,
            proceeds: 600.0,
        }];
        let proceeds = apply_steps(&mut state, &steps, None);
        assert_eq!(proceeds, 0.0);
        assert!(state.transactions.is_empty());
    }

    // -- tier 3 --

    #[test]
    fn tier_liquidation_sells_cellar_up_to_half_the_balance() {
        let mut state = estate_state(0.0);
        let loan_id = distressed_loan(&mut state, 10_000.0);
        // 1,000 bottles at 10 = 10,000 of stock; the cap is 5,000 face value
        state.add_wine_batch("Reserve Red", 3, 1_000, 10.0);

        let outcome = liquidate_for_loan(&mut state, loan_id);

        assert_eq!(outcome.recovered_value, 5_000.0);
        // 25% forced-sale penalty
        assert_eq!(outcome.proceeds, 3_750.0);
        assert_eq!(state.cellar.values().next().unwrap().bottles, 500);
        // All proceeds went straight back out against the balance
        assert_eq!(outcome.debt_paid, 3_750.0);
        assert_eq!(
            state.loans[&loan_id].remaining_balance,
            10_000.0 - 3_750.0
        );
        assert!(!outcome.paid_off);
        assert_eq!(state.company.cash, 0.0);
        assert_eq!(state.ledger_cash(), state.company.cash);
    }

    #[test]
    fn tier_liquidation_seizes_cheapest_vineyards_up_to_half_the_portfolio() {
        let mut state = estate_state(0.0);
        let loan_id = distressed_loan(&mut state, 100_000.0);
        state.add_vineyard("North Slope", 4.0, 60_000.0);
        state.add_vineyard("South Slope", 2.0, 30_000.0);
        // Portfolio 90,000; budget 45,000: only the cheaper one fits

        liquidate_for_loan(&mut state, loan_id);

        assert_eq!(state.vineyards.len(), 1);
        assert_eq!(
            state.vineyards.values().next().unwrap().name,
            "North Slope"
        );
    }

    #[test]
    fn tier_liquidation_uses_prior_cash_toward_the_balance() {
        let mut state = estate_state(500.0);
        let loan_id = distressed_loan(&mut state, 1_000.0);
        state.add_wine_batch("Reserve Red", 3, 50, 10.0);

        let outcome = liquidate_for_loan(&mut state, loan_id);

        // Cellar cap is 500 face -> 375 cash, plus the 500 already on hand
        assert_eq!(outcome.recovered_value, 500.0);
        assert_eq!(outcome.proceeds, 375.0);
        assert_eq!(outcome.debt_paid, 875.0);
        assert!(!outcome.paid_off);
        assert_eq!(state.company.cash, 0.0);
    }

    #[test]
    fn tier_liquidation_pays_off_when_estate_is_rich() {
        let mut state = estate_state(0.0);
        let loan_id = distressed_loan(&mut state, 1_000.0);
        state.add_wine_batch("Reserve Red", 3, 100, 10.0);
        state.add_vineyard("South Slope", 2.0, 2_000.0);
        state.add_vineyard("North Slope", 4.0, 3_000.0);

        let outcome = liquidate_for_loan(&mut state, loan_id);

        // Cellar cap 500 -> 375 cash; vineyard budget 2,500 seizes South Slope
        // (2,000 -> 1,500 cash); 1,875 covers the 1,000 balance
        assert!(outcome.paid_off);
        assert_eq!(state.loans[&loan_id].remaining_balance, 0.0);
        assert_eq!(outcome.debt_paid, 1_000.0);
        assert_eq!(state.company.cash, 875.0);
        assert_eq!(state.vineyards.len(), 1);
    }
}
