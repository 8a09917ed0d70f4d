use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use winery_sim::model::{ActionOutcome, GameDate, LoanCategory, PlayerAction, TransactionKind};
use winery_sim::model::LenderKind;
use winery_sim::scenario::Scenario;
use winery_sim::sim::{
    EmergencyLoanSystem, LoanPaymentSystem, PlayerActionSystem, RestructureSystem, SimSystem,
    TickContext, TickFrequency, dispatch_systems,
};

/// Fixed weekly operating cost so the cash pile actually drains. Loan
/// payments alone stop at zero; this is what pushes the balance negative
/// and wakes the emergency lender.
struct OverheadSystem {
    weekly_cost: f64,
}

impl SimSystem for OverheadSystem {
    fn name(&self) -> &str {
        "overhead"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Weekly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        ctx.state.record_transaction(
            TransactionKind::Custom("overhead".to_string()),
            -self.weekly_cost,
            None,
            "Weekly overhead".to_string(),
        );
    }
}

fn main() {
    // A winery that cannot possibly service its debt: 3k cash against a 60k
    // note. Watch the distress machinery grind through it.
    let mut scenario = Scenario::at_year(1);
    scenario.company_name("Hillcrest Cellars");
    scenario.set_cash(3_000.0);
    let bank = scenario.add_lender("Valley Bank", LenderKind::Bank);
    scenario.add_lender("Quick Credit", LenderKind::QuickLoan);
    scenario.add_lender("Rapid Advance", LenderKind::QuickLoan);
    scenario.add_lender("Meridian Fund", LenderKind::InvestmentFund);
    scenario.add_vineyard("North Slope", 6.0, 90_000.0);
    scenario.add_vineyard("River Bend", 3.5, 45_000.0);
    scenario.add_cellar_lot("Estate Red", 1, 400, 18.0);
    scenario.add_cellar_lot("Late Harvest", 1, 120, 30.0);
    scenario.add_loan(bank, 60_000.0, 16);
    let mut state = scenario.build();

    let mut systems: Vec<Box<dyn SimSystem>> = vec![
        Box::new(OverheadSystem { weekly_cost: 150.0 }),
        Box::new(PlayerActionSystem),
        Box::new(LoanPaymentSystem),
        Box::new(RestructureSystem),
        Box::new(EmergencyLoanSystem),
    ];
    let mut rng = SmallRng::seed_from_u64(42);

    // Week-by-week so any restructure offer gets auto-accepted the week after
    // it appears.
    let years = 12u32;
    let mut date = GameDate::from_year(1);
    let mut queued_offer = None;
    for _ in 0..(years * 48) {
        dispatch_systems(&mut state, &mut systems, &mut rng, date);
        if let Some(offer) = &state.pending_offer {
            if queued_offer != Some(offer.id) {
                queued_offer = Some(offer.id);
                state.queue_action(PlayerAction::AcceptRestructure { offer_id: offer.id });
            }
        }
        date = date.plus_weeks(1);
    }

    // Loan book
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for loan in state.loans.values() {
        *by_status.entry(loan.status.to_string()).or_default() += 1;
    }
    let active_balance: f64 = state
        .loans
        .values()
        .filter(|l| l.is_active())
        .map(|l| l.remaining_balance)
        .sum();
    let emergencies = state.loans.values().filter(|l| l.category == LoanCategory::Emergency).count();
    let consolidations = state.loans.values().filter(|l| l.category == LoanCategory::Restructured).count();
    eprintln!(
        "Loans: {:?} forced_active={} active_balance={:.2}",
        by_status,
        state.forced_loan_ids().len(),
        active_balance
    );
    eprintln!("Emergency loans taken: {emergencies} Consolidations: {consolidations}");

    // Cash and standing
    eprintln!(
        "Cash: {:.2} (ledger {:.2}) prestige={:.1} credit={:.2}",
        state.company.cash,
        state.ledger_cash(),
        state.current_prestige(),
        state.company.credit_rating
    );

    // What's left of the estate
    eprintln!(
        "Vineyards: {} (value {:.2}) Cellar lots: {} ({} bottles)",
        state.vineyards.len(),
        state.vineyard_portfolio_value(),
        state.cellar.len(),
        state.cellar.values().map(|b| b.bottles as u64).sum::<u64>()
    );

    // Ledger by transaction kind
    let mut by_kind: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for tx in &state.transactions {
        let e = by_kind.entry(tx.kind.to_string()).or_default();
        e.0 += 1;
        e.1 += tx.amount;
    }
    for (kind, (count, total)) in &by_kind {
        eprintln!("  {kind}: n={count} total={total:.2}");
    }

    // Distress machinery
    let failed = state
        .action_results
        .iter()
        .filter(|r| matches!(r.outcome, ActionOutcome::Failed { .. }))
        .count();
    eprintln!(
        "Warnings pending: {} Notices: {} Offer pending: {} Actions: {} ({} failed)",
        state.warnings.len(),
        state.notices.len(),
        state.pending_offer.is_some(),
        state.action_results.len(),
        failed
    );
    let blacklisted: Vec<&str> = state
        .lenders
        .values()
        .filter(|l| l.blacklisted)
        .map(|l| l.name.as_str())
        .collect();
    eprintln!("Blacklisted lenders: {blacklisted:?}");
}
