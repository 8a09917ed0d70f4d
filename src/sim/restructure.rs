//! Forced-debt restructuring: the yearly offer builder and the executor
//! behind the accept/decline player actions.
//!
//! The builder is a pure simulation over the current books. Nothing is
//! sold and no loan is touched until the player accepts, at which point
//! the liquidation is re-planned against live data, the forced loans are
//! settled in full, and any shortfall rolls into one consolidation loan.

use serde_json::json;
use tracing::{debug, warn};

use super::context::TickContext;
use super::lending;
use super::liquidation;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TickFrequency};
use crate::model::loan::BALANCE_EPSILON;
use crate::model::{
    GameState, LenderKind, LiquidationTarget, Loan, LoanCategory, PendingLoanWarning,
    ProposedTerms, RestructureOffer, WarningSeverity,
};

/// Share of the forced debt the lenders will liquidate toward.
const OFFER_DEBT_FRACTION: f64 = 0.8;
/// Share of the vineyard portfolio value that caps the liquidation.
const OFFER_PORTFOLIO_FRACTION: f64 = 0.5;
/// Rate and fee multipliers when no mainstream lender fits the principal.
const OVERRIDE_RATE_MULT: f64 = 1.5;
const OVERRIDE_FEE_MULT: f64 = 1.5;

const RESTRUCTURE_PRESTIGE_PENALTY: f64 = -20.0;
const RESTRUCTURE_PRESTIGE_DECAY: f64 = 0.02;

/// What `execute_restructure` actually did.
#[derive(Debug)]
pub struct RestructureReport {
    pub offer_id: u64,
    pub proceeds: f64,
    pub debt_settled: f64,
    pub loans_settled: usize,
    pub new_loan_id: Option<u64>,
}

/// Builds (or retires) the standing restructure offer once a year.
pub struct RestructureSystem;

impl SimSystem for RestructureSystem {
    fn name(&self) -> &'static str {
        "restructures"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Yearly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let forced = ctx.state.forced_loan_ids();
        if forced.is_empty() {
            clear_pending_offer(ctx.state);
            return;
        }
        refresh_offer(ctx, &forced);
    }
}

fn refresh_offer(ctx: &mut TickContext, forced: &[u64]) {
    if let Some(offer) = &ctx.state.pending_offer {
        if !offer.is_expired(ctx.state.current_date) && offer.covers(forced) {
            return;
        }
    }
    clear_pending_offer(ctx.state);

    let Some(offer) = build_offer(ctx.state, forced) else {
        return;
    };
    let offer_id = offer.id;
    queue_decision_warning(ctx.state, &offer);
    ctx.state.pending_offer = Some(offer);
    ctx.signals.push(Signal {
        date: ctx.state.current_date,
        kind: SignalKind::RestructureOffered { offer_id },
    });
    debug!(offer_id, "restructure offer issued");
}

/// Drop the pending offer and the decision warning attached to it.
fn clear_pending_offer(state: &mut GameState) {
    if let Some(offer) = state.pending_offer.take() {
        if let Some(&first) = offer.loan_ids.first() {
            if state
                .warnings
                .get(&first)
                .is_some_and(|w| w.decision_offer_id == Some(offer.id))
            {
                state.clear_warning(first);
            }
        }
        debug!(offer_id = offer.id, "retired restructure offer");
    }
}

/// Simulate a restructure of the given forced loans.
///
/// Returns `None` when the remaining principal needs a lender and every
/// lender has blacklisted the company.
fn build_offer(state: &mut GameState, forced: &[u64]) -> Option<RestructureOffer> {
    let total = state.total_forced_balance();
    let allowance =
        (total * OFFER_DEBT_FRACTION).min(state.vineyard_portfolio_value() * OFFER_PORTFOLIO_FRACTION);
    let steps =
        liquidation::plan_restructure_liquidation(&state.cellar, &state.vineyards, allowance, total);
    let proceeds: f64 = steps.iter().map(|s| s.proceeds).sum();
    let principal = (total - proceeds).max(0.0);

    let terms = if principal > BALANCE_EPSILON {
        match select_restructure_lender(state, principal) {
            Some(t) => Some(t),
            None => {
                warn!(principal, "no lender will consolidate the forced debt");
                return None;
            }
        }
    } else {
        None
    };

    let mut cellar_lots = std::collections::BTreeSet::new();
    let mut vineyard_count = 0usize;
    let mut summary = Vec::with_capacity(steps.len() + 2);
    for step in &steps {
        match step.target {
            LiquidationTarget::CellarSale { batch_id, .. } => {
                cellar_lots.insert(batch_id);
                summary.push(format!("Sell {}: raises {:.2}", step.label, step.proceeds));
            }
            LiquidationTarget::VineyardSeizure { .. } => {
                vineyard_count += 1;
                summary.push(format!(
                    "Seize the {} vineyard: raises {:.2}",
                    step.label, step.proceeds
                ));
            }
        }
    }
    summary.push(format!(
        "Raises {proceeds:.2} against {total:.2} of forced debt"
    ));
    match &terms {
        Some(t) => {
            let override_note = if t.emergency_override {
                " under emergency terms"
            } else {
                ""
            };
            summary.push(format!(
                "Remaining {:.2} consolidates into a {} loan at {:.1}% APR over {} seasons{}",
                principal,
                t.lender_name,
                t.annual_rate * 100.0,
                t.seasons,
                override_note
            ));
        }
        None => summary.push("The asset sales cover the forced debt in full".to_string()),
    }

    let created = state.current_date;
    Some(RestructureOffer {
        id: state.id_gen.next_id(),
        created,
        expires: created.plus_years(1),
        loan_ids: forced.to_vec(),
        total_forced_balance: total,
        max_seizure_value: allowance,
        steps,
        cellar_lots_at_risk: cellar_lots.len(),
        vineyards_at_risk: vineyard_count,
        consolidated_principal: principal,
        terms,
        prestige_penalty: RESTRUCTURE_PRESTIGE_PENALTY,
        summary,
    })
}

/// Pick the consolidation lender. Banks and investment funds whose range
/// fits the principal come first, cheapest rate wins. Failing that, any
/// non-blacklisted lender is drafted at punitive terms.
fn select_restructure_lender(state: &GameState, principal: f64) -> Option<ProposedTerms> {
    let preferred = state
        .lenders
        .values()
        .filter(|l| !l.blacklisted)
        .filter(|l| matches!(l.kind, LenderKind::Bank | LenderKind::InvestmentFund))
        .filter(|l| principal >= l.min_amount && principal <= l.max_amount)
        .min_by(|a, b| a.base_rate.total_cmp(&b.base_rate));
    if let Some(l) = preferred {
        return Some(ProposedTerms {
            lender_id: l.id,
            lender_name: l.name.clone(),
            annual_rate: l.base_rate,
            seasons: l.max_seasons,
            emergency_override: false,
        });
    }
    state
        .lenders
        .values()
        .filter(|l| !l.blacklisted)
        .min_by(|a, b| a.base_rate.total_cmp(&b.base_rate))
        .map(|l| ProposedTerms {
            lender_id: l.id,
            lender_name: l.name.clone(),
            annual_rate: l.base_rate * OVERRIDE_RATE_MULT,
            seasons: l.max_seasons,
            emergency_override: true,
        })
}

fn queue_decision_warning(state: &mut GameState, offer: &RestructureOffer) {
    let Some(&first) = offer.loan_ids.first() else {
        return;
    };
    let Some(loan) = state.loans.get(&first) else {
        return;
    };
    let lender_name = state
        .lenders
        .get(&loan.lender_id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("lender {}", loan.lender_id));
    state.queue_warning(PendingLoanWarning {
        loan_id: first,
        lender_name,
        missed_payments: loan.missed_payments,
        severity: WarningSeverity::Critical,
        created: state.current_date,
        title: "Restructure required".to_string(),
        message: format!(
            "The lenders demand a restructure of {:.2} across {} forced loan(s).",
            offer.total_forced_balance,
            offer.loan_ids.len()
        ),
        penalty_summary: offer.summary.clone(),
        decision_offer_id: Some(offer.id),
    });
}

/// Accept the pending offer: liquidate per a fresh plan, settle every
/// forced loan, and consolidate any shortfall into a single new loan.
///
/// Validation happens before any mutation, so an `Err` leaves the books
/// and the pending offer exactly as they were.
pub fn execute_restructure(
    ctx: &mut TickContext,
    offer_id: u64,
) -> Result<RestructureReport, String> {
    let offer = match &ctx.state.pending_offer {
        Some(o) if o.id == offer_id => o.clone(),
        Some(o) => return Err(format!("offer {offer_id} is not the pending offer {}", o.id)),
        None => return Err("no restructure offer is pending".to_string()),
    };
    if offer.is_expired(ctx.state.current_date) {
        return Err("the restructure offer has expired".to_string());
    }
    let forced = ctx.state.forced_loan_ids();
    if forced.is_empty() {
        return Err("no forced loans remain to restructure".to_string());
    }

    // Re-plan against live data; the offer only fixes the allowance and
    // the debt band, not the exact bottles.
    let steps = liquidation::plan_restructure_liquidation(
        &ctx.state.cellar,
        &ctx.state.vineyards,
        offer.max_seizure_value,
        offer.total_forced_balance,
    );
    let planned_proceeds: f64 = steps.iter().map(|s| s.proceeds).sum();
    let live_total = ctx.state.total_forced_balance();
    let principal = (live_total - planned_proceeds).max(0.0);

    let consolidation = if principal > BALANCE_EPSILON {
        let terms = offer
            .terms
            .as_ref()
            .ok_or("the offer carries no consolidation terms")?;
        let lender = ctx
            .state
            .lenders
            .get(&terms.lender_id)
            .ok_or_else(|| format!("lender {} does not exist", terms.lender_id))?;
        if lender.blacklisted {
            return Err(format!(
                "{} is no longer accepting applications from the company",
                lender.name
            ));
        }
        let mut fee = lending::origination_fee(
            lender,
            principal,
            terms.seasons,
            ctx.state.company.credit_rating,
        );
        if terms.emergency_override {
            fee *= OVERRIDE_FEE_MULT;
        }
        Some((terms.clone(), fee))
    } else {
        None
    };

    // Point of no return.
    let proceeds = liquidation::apply_steps(ctx.state, &steps, None);
    let settled = proceeds.min(live_total);
    if settled > 0.0 {
        ctx.state.record_transaction(
            crate::model::TransactionKind::RestructureSettlement,
            -settled,
            None,
            format!("Restructure settlement across {} loan(s)", forced.len()),
        );
    }
    for &id in &forced {
        if let Some(loan) = ctx.state.loans.get_mut(&id) {
            let balance = loan.remaining_balance;
            loan.apply_toward_balance(balance);
            loan.missed_payments = 0;
        }
        ctx.state.clear_warning(id);
    }

    let new_loan_id = match consolidation {
        Some((terms, fee)) => {
            // Debt-for-debt swap; the fee rolls into the balance and no
            // cash moves for this leg.
            let loan = Loan::new(
                ctx.state.id_gen.next_id(),
                terms.lender_id,
                principal + fee,
                terms.annual_rate,
                fee,
                terms.seasons,
                ctx.state.current_date,
                LoanCategory::Restructured,
                false,
            );
            let id = loan.id;
            ctx.state.insert_loan(loan);
            Some(id)
        }
        None => None,
    };

    ctx.state.add_prestige_event(
        offer.prestige_penalty,
        RESTRUCTURE_PRESTIGE_DECAY,
        "restructure",
        "The estate was restructured under lender pressure".to_string(),
        json!({ "offer_id": offer_id, "new_loan_id": new_loan_id }),
    );
    ctx.state.pending_offer = None;
    let outcome_line = match new_loan_id {
        Some(id) => format!("a consolidation loan of {:.2} was issued (loan {id})", principal),
        None => "no new borrowing was required".to_string(),
    };
    ctx.state.queue_notice(
        WarningSeverity::Warning,
        "Restructure complete".to_string(),
        format!("Settled {} forced loan(s); {}.", forced.len(), outcome_line),
    );
    ctx.signals.push(Signal {
        date: ctx.state.current_date,
        kind: SignalKind::RestructureExecuted {
            offer_id,
            new_loan_id,
        },
    });
    debug!(offer_id, proceeds, ?new_loan_id, "restructure executed");

    Ok(RestructureReport {
        offer_id,
        proceeds,
        debt_settled: live_total,
        loans_settled: forced.len(),
        new_loan_id,
    })
}

/// Decline the pending offer. The forced loans stay on the books and the
/// escalation ladder keeps running against them.
pub fn decline_restructure(ctx: &mut TickContext, offer_id: u64) -> Result<(), String> {
    let offer = match ctx.state.pending_offer.take() {
        Some(o) if o.id == offer_id => o,
        Some(o) => {
            let found = o.id;
            ctx.state.pending_offer = Some(o);
            return Err(format!(
                "offer {offer_id} is not the pending offer {found}"
            ));
        }
        None => return Err("no restructure offer is pending".to_string()),
    };

    if let Some(&first) = offer.loan_ids.first() {
        if ctx
            .state
            .warnings
            .get(&first)
            .is_some_and(|w| w.decision_offer_id == Some(offer.id))
        {
            ctx.state.clear_warning(first);
        }
    }
    ctx.state.queue_notice(
        WarningSeverity::Warning,
        "Restructure declined".to_string(),
        "The forced loans remain active and will keep escalating.".to_string(),
    );
    ctx.signals.push(Signal {
        date: ctx.state.current_date,
        kind: SignalKind::RestructureDeclined { offer_id },
    });
    debug!(offer_id, "restructure declined");
    Ok(())
}
