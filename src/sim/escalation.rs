//! The warning escalation ladder.
//!
//! Strictly count-driven: the payment processor increments a loan's
//! missed-payment counter and calls `escalate`, which runs the tier
//! matching the new count exactly once. Tiers never fire twice for the
//! same count because the counter only moves on payment events.

use serde_json::json;
use tracing::debug;

use super::context::TickContext;
use super::liquidation;
use super::signal::{Signal, SignalKind};
use crate::model::{GameState, LoanStatus, PendingLoanWarning, WarningSeverity};

/// Tier 1: this share of the seasonal installment lands on the balance.
pub const LATE_FEE_RATE: f64 = 0.02;
/// Tier 2: additive annual rate hike.
pub const RATE_HIKE: f64 = 0.02;
/// Tier 2: surcharge on the remaining balance.
pub const BALANCE_SURCHARGE_RATE: f64 = 0.05;
/// Credit-rating hit when a loan defaults.
pub const CREDIT_DEFAULT_PENALTY: f64 = -0.2;

const TIER_ONE_BOOKKEEPING_HOURS: f64 = 2.0;
const TIER_TWO_BOOKKEEPING_HOURS: f64 = 5.0;
const TIER_TWO_PRESTIGE_PENALTY: f64 = -5.0;
const TIER_THREE_PRESTIGE_PENALTY: f64 = -15.0;
const DEFAULT_PRESTIGE_PENALTY: f64 = -40.0;
const PRESTIGE_DECAY_PER_WEEK: f64 = 0.02;

/// Run the penalty tier matching the loan's missed-payment count.
pub fn escalate(ctx: &mut TickContext, loan_id: u64) {
    let Some(missed) = ctx.state.loans.get(&loan_id).map(|l| l.missed_payments) else {
        return;
    };
    match missed {
        0 => {}
        1 => tier_one(ctx, loan_id),
        2 => tier_two(ctx, loan_id),
        3 => tier_three(ctx, loan_id),
        _ => tier_default(ctx, loan_id),
    }
}

fn tier_one(ctx: &mut TickContext, loan_id: u64) {
    let lender = loan_lender_name(ctx.state, loan_id);
    let Some(loan) = ctx.state.loans.get_mut(&loan_id) else {
        return;
    };
    let late_fee = loan.seasonal_payment * LATE_FEE_RATE;
    loan.remaining_balance += late_fee;
    ctx.state.company.bookkeeping_hours += TIER_ONE_BOOKKEEPING_HOURS;

    queue_tier_warning(
        ctx.state,
        loan_id,
        WarningSeverity::Warning,
        "Missed loan payment",
        format!("The seasonal payment to {lender} was missed."),
        vec![format!(
            "Late fee of {late_fee:.2} added to the loan balance"
        )],
    );
    debug!(loan_id, late_fee, "escalation tier 1");
}

fn tier_two(ctx: &mut TickContext, loan_id: u64) {
    let lender = loan_lender_name(ctx.state, loan_id);
    let Some(loan) = ctx.state.loans.get_mut(&loan_id) else {
        return;
    };
    loan.effective_rate += RATE_HIKE;
    let surcharge = loan.remaining_balance * BALANCE_SURCHARGE_RATE;
    loan.remaining_balance += surcharge;
    loan.reprice();
    let new_rate = loan.effective_rate;
    let new_payment = loan.seasonal_payment;
    ctx.state.company.bookkeeping_hours += TIER_TWO_BOOKKEEPING_HOURS;

    ctx.state.add_prestige_event(
        TIER_TWO_PRESTIGE_PENALTY,
        PRESTIGE_DECAY_PER_WEEK,
        "late_payments",
        format!("Word is spreading that payments to {lender} are in arrears"),
        json!({ "loan_id": loan_id }),
    );
    queue_tier_warning(
        ctx.state,
        loan_id,
        WarningSeverity::Error,
        "Loan in arrears",
        format!("Second missed payment on the {lender} loan."),
        vec![
            format!("Interest rate raised to {:.2}% APR", new_rate * 100.0),
            format!("Balance surcharge of {surcharge:.2} applied"),
            format!("Seasonal installment is now {new_payment:.2}"),
        ],
    );
    debug!(loan_id, new_rate, surcharge, "escalation tier 2");
}

fn tier_three(ctx: &mut TickContext, loan_id: u64) {
    let date = ctx.state.current_date;
    let outcome = liquidation::liquidate_for_loan(ctx.state, loan_id);

    ctx.state.add_prestige_event(
        TIER_THREE_PRESTIGE_PENALTY,
        PRESTIGE_DECAY_PER_WEEK,
        "forced_liquidation",
        "Assets were force-sold to service a delinquent loan".to_string(),
        json!({ "loan_id": loan_id, "recovered_value": outcome.recovered_value }),
    );
    if outcome.recovered_value > 0.0 {
        ctx.signals.push(Signal {
            date,
            kind: SignalKind::AssetsLiquidated {
                loan_id,
                recovered_value: outcome.recovered_value,
            },
        });
    }

    if outcome.paid_off {
        close_out_liquidated_loan(ctx, loan_id, outcome.debt_paid);
    } else {
        queue_tier_warning(
            ctx.state,
            loan_id,
            WarningSeverity::Critical,
            "Assets liquidated",
            "Three missed payments forced the sale of company assets.".to_string(),
            outcome.summary,
        );
    }
    debug!(loan_id, "escalation tier 3");
}

fn tier_default(ctx: &mut TickContext, loan_id: u64) {
    let date = ctx.state.current_date;
    let outcome = liquidation::liquidate_for_loan(ctx.state, loan_id);
    if outcome.recovered_value > 0.0 {
        ctx.signals.push(Signal {
            date,
            kind: SignalKind::AssetsLiquidated {
                loan_id,
                recovered_value: outcome.recovered_value,
            },
        });
    }
    if outcome.paid_off {
        // The estate still covered the debt; no default after all.
        close_out_liquidated_loan(ctx, loan_id, outcome.debt_paid);
        return;
    }

    let lender = loan_lender_name(ctx.state, loan_id);
    let Some(loan) = ctx.state.loans.get_mut(&loan_id) else {
        return;
    };
    loan.status = LoanStatus::Defaulted;
    let lender_id = loan.lender_id;
    if let Some(lender) = ctx.state.lenders.get_mut(&lender_id) {
        lender.blacklisted = true;
    }
    ctx.state.company.adjust_credit_rating(CREDIT_DEFAULT_PENALTY);
    ctx.state.add_prestige_event(
        DEFAULT_PRESTIGE_PENALTY,
        PRESTIGE_DECAY_PER_WEEK,
        "default",
        format!("The company defaulted on its loan from {lender}"),
        json!({ "loan_id": loan_id, "lender_id": lender_id }),
    );

    let mut penalty_summary = outcome.summary;
    penalty_summary.push(format!("{lender} will no longer lend to the company"));
    queue_tier_warning(
        ctx.state,
        loan_id,
        WarningSeverity::Critical,
        "Loan defaulted",
        format!("The {lender} loan is in default."),
        penalty_summary,
    );
    ctx.state.queue_notice(
        WarningSeverity::Critical,
        "Loan defaulted".to_string(),
        format!("{lender} has blacklisted the company."),
    );

    ctx.signals.push(Signal {
        date,
        kind: SignalKind::LoanDefaulted { loan_id, lender_id },
    });
    ctx.signals.push(Signal {
        date,
        kind: SignalKind::LenderBlacklisted { lender_id },
    });
    debug!(loan_id, lender_id, "loan defaulted");
}

fn close_out_liquidated_loan(ctx: &mut TickContext, loan_id: u64, debt_paid: f64) {
    ctx.state.clear_warning(loan_id);
    ctx.state.queue_notice(
        WarningSeverity::Warning,
        "Loan cleared by liquidation".to_string(),
        format!("Forced sales raised {debt_paid:.2}; the loan is settled."),
    );
    ctx.signals.push(Signal {
        date: ctx.state.current_date,
        kind: SignalKind::LoanPaidOff { loan_id },
    });
}

fn queue_tier_warning(
    state: &mut GameState,
    loan_id: u64,
    severity: WarningSeverity,
    title: &str,
    message: String,
    penalty_summary: Vec<String>,
) {
    let Some(loan) = state.loans.get(&loan_id) else {
        return;
    };
    let warning = PendingLoanWarning {
        loan_id,
        lender_name: lender_name(state, loan.lender_id),
        missed_payments: loan.missed_payments,
        severity,
        created: state.current_date,
        title: title.to_string(),
        message,
        penalty_summary,
        decision_offer_id: None,
    };
    state.queue_warning(warning);
}

fn loan_lender_name(state: &GameState, loan_id: u64) -> String {
    state
        .loans
        .get(&loan_id)
        .map(|l| lender_name(state, l.lender_id))
        .unwrap_or_else(|| format!("loan {loan_id}"))
}

fn lender_name(state: &GameState, lender_id: u64) -> String {
    state
        .lenders
        .get(&lender_id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("lender {lender_id}"))
}
