use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::model::*;
use crate::sim::{
    EmergencyLoanSystem, LoanPaymentSystem, PlayerActionSystem, RestructureSystem, Signal,
    SignalKind, SimConfig, SimSystem, TickContext, run,
};

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a single system tick at the start of the given year. Returns emitted signals.
pub fn tick_system(
    state: &mut GameState,
    system: &mut dyn SimSystem,
    year: u32,
    seed: u64,
) -> Vec<Signal> {
    tick_system_at(state, system, GameDate::from_year(year), seed)
}

/// Run a single system tick at a specific date. Returns emitted signals.
pub fn tick_system_at(
    state: &mut GameState,
    system: &mut dyn SimSystem,
    date: GameDate,
    seed: u64,
) -> Vec<Signal> {
    state.current_date = date;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        state,
        rng: &mut rng,
        signals: &mut signals,
        inbox: &[],
    };
    system.tick(&mut ctx);
    signals
}

/// Run a system's handle_signals with the given inbox. Returns newly emitted signals.
pub fn deliver_signals(
    state: &mut GameState,
    system: &mut dyn SimSystem,
    inbox: &[Signal],
    seed: u64,
) -> Vec<Signal> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        state,
        rng: &mut rng,
        signals: &mut signals,
        inbox,
    };
    system.handle_signals(&mut ctx);
    signals
}

/// Run a full tick + handle_signals cycle for a single system. Returns all signals.
pub fn full_tick(
    state: &mut GameState,
    system: &mut dyn SimSystem,
    year: u32,
    seed: u64,
) -> Vec<Signal> {
    let tick_signals = tick_system(state, system, year, seed);
    if tick_signals.is_empty() {
        return tick_signals;
    }
    let reaction_signals = deliver_signals(state, system, &tick_signals, seed);
    let mut all = tick_signals;
    all.extend(reaction_signals);
    all
}

/// Run multiple years using the standard simulation loop.
pub fn run_years(
    state: &mut GameState,
    systems: &mut [Box<dyn SimSystem>],
    num_years: u32,
    seed: u64,
) {
    let start_year = state.current_date.year();
    run(state, systems, SimConfig::new(start_year, num_years, seed));
}

// ---------------------------------------------------------------------------
// System set constructors
// ---------------------------------------------------------------------------

/// Payment processing only, with no rescue or restructure machinery.
pub fn payment_systems() -> Vec<Box<dyn SimSystem>> {
    vec![Box::new(LoanPaymentSystem)]
}

/// All loan systems in canonical tick order.
pub fn distress_systems() -> Vec<Box<dyn SimSystem>> {
    vec![
        Box::new(PlayerActionSystem),
        Box::new(LoanPaymentSystem),
        Box::new(RestructureSystem),
        Box::new(EmergencyLoanSystem),
    ]
}

// ---------------------------------------------------------------------------
// Ledger query helpers
// ---------------------------------------------------------------------------

/// Sum all transactions of a given kind.
pub fn ledger_total(state: &GameState, kind: &TransactionKind) -> f64 {
    state
        .transactions
        .iter()
        .filter(|t| t.kind == *kind)
        .map(|t| t.amount)
        .sum()
}

/// Count transactions of a given kind.
pub fn count_transactions(state: &GameState, kind: &TransactionKind) -> usize {
    state.transactions.iter().filter(|t| t.kind == *kind).count()
}

/// All transactions attached to a specific loan, in ledger order.
pub fn loan_transactions<'a>(state: &'a GameState, loan_id: u64) -> Vec<&'a Transaction> {
    state
        .transactions
        .iter()
        .filter(|t| t.loan_id == Some(loan_id))
        .collect()
}

// ---------------------------------------------------------------------------
// Signal helpers
// ---------------------------------------------------------------------------

/// Check if any signal matches the predicate.
pub fn has_signal(signals: &[Signal], predicate: impl Fn(&SignalKind) -> bool) -> bool {
    signals.iter().any(|s| predicate(&s.kind))
}

/// Count signals matching the predicate.
pub fn count_signals(signals: &[Signal], predicate: impl Fn(&SignalKind) -> bool) -> usize {
    signals.iter().filter(|s| predicate(&s.kind)).count()
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

/// Assert a float is approximately equal, with a named context message.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{msg}: expected ~{expected} (+-{tolerance}), got {actual}"
    );
}
