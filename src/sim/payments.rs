//! Seasonal loan servicing: collect every due installment, classify the
//! result (paid, partial, missed), and hand misses to the escalation ladder.

use tracing::debug;

use super::context::TickContext;
use super::escalation;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TickFrequency};
use crate::model::{GameDate, GameState, TransactionKind, WarningSeverity};

/// Credit-rating nudge for a full on-time installment.
pub const CREDIT_FULL_PAYMENT_BONUS: f64 = 0.01;
/// Credit-rating hit for a missed or partial installment.
pub const CREDIT_MISS_PENALTY: f64 = -0.05;

pub struct LoanPaymentSystem;

impl SimSystem for LoanPaymentSystem {
    fn name(&self) -> &str {
        "loan_payments"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Seasonal
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        process_due_payments(ctx);
    }
}

/// Attempt every due installment, in ascending loan-id order.
///
/// Best-effort: each loan settles against whatever cash is left after the
/// ones before it, and a failure on one loan never rolls back another.
pub fn process_due_payments(ctx: &mut TickContext) {
    let now = ctx.state.current_date;
    let due_ids: Vec<u64> = ctx
        .state
        .loans
        .values()
        .filter(|l| l.is_active() && l.next_payment_due <= now)
        .map(|l| l.id)
        .collect();

    for loan_id in due_ids {
        process_loan_payment(ctx, loan_id);
    }
}

fn process_loan_payment(ctx: &mut TickContext, loan_id: u64) {
    let date = ctx.state.current_date;
    let Some(loan) = ctx.state.loans.get(&loan_id) else {
        return;
    };
    let due = loan.seasonal_due();
    let lender = lender_name(ctx.state, loan.lender_id);
    let cash = ctx.state.company.cash;

    if cash >= due {
        ctx.state.record_transaction(
            TransactionKind::LoanPayment,
            -due,
            Some(loan_id),
            format!("Seasonal payment to {lender}"),
        );
        let mut paid_off = false;
        if let Some(loan) = ctx.state.loans.get_mut(&loan_id) {
            paid_off = loan.apply_installment();
            loan.missed_payments = loan.missed_payments.saturating_sub(1);
            loan.next_payment_due = loan.next_payment_due.plus_seasons(1);
        }
        ctx.state.company.adjust_credit_rating(CREDIT_FULL_PAYMENT_BONUS);
        ctx.signals.push(Signal {
            date,
            kind: SignalKind::PaymentMade {
                loan_id,
                amount: due,
            },
        });
        if paid_off {
            close_out_paid_loan(ctx, loan_id, &lender);
        }
    } else if cash > 0.0 {
        // Everything liquid goes toward the installment.
        let pay = cash;
        ctx.state.record_transaction(
            TransactionKind::LoanPayment,
            -pay,
            Some(loan_id),
            format!("Partial payment to {lender}"),
        );
        let mut paid_off = false;
        if let Some(loan) = ctx.state.loans.get_mut(&loan_id) {
            paid_off = loan.apply_toward_balance(pay);
            loan.next_payment_due = loan.next_payment_due.plus_seasons(1);
        }
        if paid_off {
            // The shortfall was only accrued interest; the balance cleared,
            // so this counts as a payoff rather than a miss.
            if let Some(loan) = ctx.state.loans.get_mut(&loan_id) {
                loan.missed_payments = 0;
            }
            close_out_paid_loan(ctx, loan_id, &lender);
        } else {
            record_miss(ctx, loan_id, date, true);
        }
    } else {
        debug!(loan_id, due, cash, "no cash for installment");
        if let Some(loan) = ctx.state.loans.get_mut(&loan_id) {
            loan.next_payment_due = loan.next_payment_due.plus_seasons(1);
        }
        record_miss(ctx, loan_id, date, false);
    }
}

fn record_miss(ctx: &mut TickContext, loan_id: u64, date: GameDate, partial: bool) {
    let mut missed_payments = 0;
    if let Some(loan) = ctx.state.loans.get_mut(&loan_id) {
        loan.missed_payments += 1;
        missed_payments = loan.missed_payments;
    }
    ctx.state.company.adjust_credit_rating(CREDIT_MISS_PENALTY);
    ctx.signals.push(Signal {
        date,
        kind: SignalKind::PaymentMissed {
            loan_id,
            missed_payments,
            partial,
        },
    });
    escalation::escalate(ctx, loan_id);
}

fn close_out_paid_loan(ctx: &mut TickContext, loan_id: u64, lender: &str) {
    ctx.state.clear_warning(loan_id);
    ctx.state.queue_notice(
        WarningSeverity::Info,
        "Loan paid off".to_string(),
        format!("The loan from {lender} is fully repaid."),
    );
    ctx.signals.push(Signal {
        date: ctx.state.current_date,
        kind: SignalKind::LoanPaidOff { loan_id },
    });
}

fn lender_name(state: &GameState, lender_id: u64) -> String {
    state
        .lenders
        .get(&lender_id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("lender {lender_id}"))
}
