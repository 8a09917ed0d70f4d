//! Loan origination and voluntary servicing.
//!
//! Every loan on the books is created here, whether the player applied for
//! it, the emergency injector forced it, or a restructure consolidated it.
//! Callers that bypass the player checks (`originate`) still get the fee
//! formula and the deposit/fee transactions.

use tracing::debug;

use crate::model::{GameState, Lender, Loan, LoanCategory, TransactionKind};

/// Player-held active loans are capped; forced originations bypass this.
pub const MAX_ACTIVE_LOANS: usize = 5;

/// Term length a fee's duration scaling treats as "one unit" (12 years).
const FEE_DURATION_SCALE_SEASONS: f64 = 48.0;

/// Origination fee for `principal` over `seasons` at the company's current
/// credit rating.
///
/// Base percent of principal, scaled up for bad credit and long terms per
/// the lender's fee configuration, clamped to the lender's fee band.
pub fn origination_fee(lender: &Lender, principal: f64, seasons: u32, credit_rating: f64) -> f64 {
    let base = principal * lender.fee.base_percent;
    let credit_factor = 1.0 + (0.5 - credit_rating) * lender.fee.credit_modifier;
    let duration_factor =
        1.0 + (seasons as f64 / FEE_DURATION_SCALE_SEASONS) * lender.fee.duration_modifier;
    (base * credit_factor * duration_factor).clamp(lender.fee.min_fee, lender.fee.max_fee)
}

/// Whether the lender would accept this application at all.
pub fn check_availability(lender: &Lender, principal: f64, seasons: u32) -> Result<(), String> {
    if lender.blacklisted {
        return Err(format!(
            "{} is no longer accepting applications from the company",
            lender.name
        ));
    }
    if principal < lender.min_amount || principal > lender.max_amount {
        return Err(format!(
            "{} lends between {:.0} and {:.0}, requested {:.0}",
            lender.name, lender.min_amount, lender.max_amount, principal
        ));
    }
    if seasons < lender.min_seasons || seasons > lender.max_seasons {
        return Err(format!(
            "{} offers terms between {} and {} seasons, requested {}",
            lender.name, lender.min_seasons, lender.max_seasons, seasons
        ));
    }
    Ok(())
}

/// Create a loan and post its deposit and fee transactions.
///
/// No availability or loan-count checks happen here; `player_take_loan`
/// layers those on. Forced paths (emergency injector) call this directly
/// with their own effective rate.
pub fn originate(
    state: &mut GameState,
    lender_id: u64,
    principal: f64,
    annual_rate: f64,
    seasons: u32,
    category: LoanCategory,
    is_forced: bool,
) -> Result<u64, String> {
    let lender = state
        .lenders
        .get(&lender_id)
        .cloned()
        .ok_or_else(|| format!("lender {lender_id} does not exist"))?;

    let fee = origination_fee(&lender, principal, seasons, state.company.credit_rating);
    let loan = Loan::new(
        state.id_gen.next_id(),
        lender_id,
        principal,
        annual_rate,
        fee,
        seasons,
        state.current_date,
        category,
        is_forced,
    );
    let loan_id = loan.id;
    state.insert_loan(loan);

    state.record_transaction(
        TransactionKind::LoanDeposit,
        principal,
        Some(loan_id),
        format!("Loan deposit from {}", lender.name),
    );
    state.record_transaction(
        TransactionKind::OriginationFee,
        -fee,
        Some(loan_id),
        format!("Origination fee, {}", lender.name),
    );

    debug!(
        loan_id,
        lender = %lender.name,
        principal,
        fee,
        rate = annual_rate,
        "originated loan"
    );
    Ok(loan_id)
}

/// Voluntary origination through a lender's normal application.
pub fn player_take_loan(
    state: &mut GameState,
    lender_id: u64,
    principal: f64,
    seasons: u32,
) -> Result<u64, String> {
    let lender = state
        .lenders
        .get(&lender_id)
        .ok_or_else(|| format!("lender {lender_id} does not exist"))?;
    check_availability(lender, principal, seasons)?;
    if state.active_loan_count() >= MAX_ACTIVE_LOANS {
        return Err(format!(
            "the company already holds {MAX_ACTIVE_LOANS} active loans"
        ));
    }
    let annual_rate = lender.base_rate;
    originate(
        state,
        lender_id,
        principal,
        annual_rate,
        seasons,
        LoanCategory::Standard,
        false,
    )
}

/// Pay extra principal against an active loan. Returns the transaction ID.
///
/// The amount is capped at the remaining balance. Paying the balance off
/// clears the loan's pending warning and its missed-payment count.
pub fn make_extra_payment(state: &mut GameState, loan_id: u64, amount: f64) -> Result<u64, String> {
    if amount <= 0.0 {
        return Err(format!("payment must be positive, got {amount:.2}"));
    }
    let loan = state
        .loans
        .get(&loan_id)
        .ok_or_else(|| format!("loan {loan_id} does not exist"))?;
    if !loan.is_active() {
        return Err(format!("loan {loan_id} is {}", loan.status));
    }
    let pay = amount.min(loan.remaining_balance);
    if state.company.cash < pay {
        return Err(format!(
            "insufficient cash: have {:.2}, need {:.2}",
            state.company.cash, pay
        ));
    }

    let tx = state.record_transaction(
        TransactionKind::ExtraPayment,
        -pay,
        Some(loan_id),
        format!("Extra payment on loan {loan_id}"),
    );
    let mut paid_off = false;
    if let Some(loan) = state.loans.get_mut(&loan_id) {
        if loan.apply_toward_balance(pay) {
            loan.missed_payments = 0;
            paid_off = true;
        }
    }
    if paid_off {
        state.clear_warning(loan_id);
    }
    Ok(tx)
}
