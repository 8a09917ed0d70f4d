use std::collections::BTreeMap;

use super::action::{ActionResult, PlayerAction};
use super::company::Company;
use super::date::GameDate;
use super::estate::{Vineyard, WineBatch};
use super::ledger::{PrestigeEvent, Transaction, TransactionKind};
use super::lender::{Lender, LenderKind};
use super::loan::Loan;
use super::offer::RestructureOffer;
use super::warning::{Notice, PendingLoanWarning, WarningSeverity};
use crate::id::IdGenerator;

#[derive(Debug)]
pub struct GameState {
    pub company: Company,
    pub lenders: BTreeMap<u64, Lender>,
    pub loans: BTreeMap<u64, Loan>,
    pub vineyards: BTreeMap<u64, Vineyard>,
    pub cellar: BTreeMap<u64, WineBatch>,
    pub transactions: Vec<Transaction>,
    pub prestige_events: Vec<PrestigeEvent>,
    /// One pending warning per loan; re-queueing overwrites.
    pub warnings: BTreeMap<u64, PendingLoanWarning>,
    pub notices: Vec<Notice>,
    pub pending_offer: Option<RestructureOffer>,
    pub pending_actions: Vec<PlayerAction>,
    pub action_results: Vec<ActionResult>,
    pub id_gen: IdGenerator,
    pub current_date: GameDate,
}

impl GameState {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            lenders: BTreeMap::new(),
            loans: BTreeMap::new(),
            vineyards: BTreeMap::new(),
            cellar: BTreeMap::new(),
            transactions: Vec::new(),
            prestige_events: Vec::new(),
            warnings: BTreeMap::new(),
            notices: Vec::new(),
            pending_offer: None,
            pending_actions: Vec::new(),
            action_results: Vec::new(),
            id_gen: IdGenerator::new(),
            current_date: GameDate::from_year(1),
        }
    }

    /// Record a cash movement, assigning it a unique ID and applying the
    /// amount to company cash. Returns the assigned ID.
    ///
    /// Every cash mutation goes through here, so `company.cash` stays equal
    /// to opening cash plus the transaction ledger sum.
    ///
    /// # Panics
    /// Panics if `amount` is not finite.
    pub fn record_transaction(
        &mut self,
        kind: TransactionKind,
        amount: f64,
        loan_id: Option<u64>,
        description: String,
    ) -> u64 {
        assert!(
            amount.is_finite(),
            "record_transaction: non-finite amount for {kind:?}"
        );
        let id = self.id_gen.next_id();
        self.transactions.push(Transaction {
            id,
            date: self.current_date,
            kind,
            amount,
            loan_id,
            description,
        });
        self.company.cash += amount;
        id
    }

    /// Add a decaying prestige event (negative `amount` for penalties).
    /// Returns the assigned ID.
    ///
    /// # Panics
    /// Panics if `decay_per_week` is outside `[0, 1]`.
    pub fn add_prestige_event(
        &mut self,
        amount: f64,
        decay_per_week: f64,
        kind: &str,
        description: String,
        data: serde_json::Value,
    ) -> u64 {
        assert!(
            (0.0..=1.0).contains(&decay_per_week),
            "add_prestige_event: decay {decay_per_week} outside [0, 1]"
        );
        let id = self.id_gen.next_id();
        self.prestige_events.push(PrestigeEvent {
            id,
            created: self.current_date,
            amount,
            decay_per_week,
            kind: kind.to_string(),
            description,
            data,
        });
        id
    }

    /// Base prestige plus all decayed event contributions as of the current
    /// date.
    pub fn current_prestige(&self) -> f64 {
        self.company.base_prestige
            + self
                .prestige_events
                .iter()
                .map(|e| e.value_at(self.current_date))
                .sum::<f64>()
    }

    /// Queue (or overwrite) the pending warning for a loan.
    ///
    /// # Panics
    /// Panics if the warning's loan does not exist.
    pub fn queue_warning(&mut self, warning: PendingLoanWarning) {
        assert!(
            self.loans.contains_key(&warning.loan_id),
            "queue_warning: loan {} not found",
            warning.loan_id
        );
        self.warnings.insert(warning.loan_id, warning);
    }

    pub fn clear_warning(&mut self, loan_id: u64) -> Option<PendingLoanWarning> {
        self.warnings.remove(&loan_id)
    }

    /// Append a notice to the player notification strip. Returns the
    /// assigned ID.
    pub fn queue_notice(
        &mut self,
        severity: WarningSeverity,
        title: String,
        message: String,
    ) -> u64 {
        let id = self.id_gen.next_id();
        self.notices.push(Notice {
            id,
            date: self.current_date,
            severity,
            title,
            message,
        });
        id
    }

    pub fn queue_action(&mut self, action: PlayerAction) {
        self.pending_actions.push(action);
    }

    /// Add a lender with its kind's default terms. Returns the assigned ID.
    pub fn add_lender(&mut self, name: &str, kind: LenderKind) -> u64 {
        let id = self.id_gen.next_id();
        self.lenders.insert(id, Lender::new(id, name, kind));
        id
    }

    /// Add a vineyard. Returns the assigned ID.
    ///
    /// # Panics
    /// Panics if `hectares` or `value` is not positive.
    pub fn add_vineyard(&mut self, name: &str, hectares: f64, value: f64) -> u64 {
        assert!(
            hectares > 0.0,
            "add_vineyard: non-positive hectares for {name}"
        );
        assert!(value > 0.0, "add_vineyard: non-positive value for {name}");
        let id = self.id_gen.next_id();
        self.vineyards.insert(
            id,
            Vineyard {
                id,
                name: name.to_string(),
                hectares,
                value,
            },
        );
        id
    }

    /// Add a bottled cellar lot. Returns the assigned ID.
    ///
    /// # Panics
    /// Panics if `bottles` is zero or the price is negative.
    pub fn add_wine_batch(
        &mut self,
        label: &str,
        vintage_year: u32,
        bottles: u32,
        price_per_bottle: f64,
    ) -> u64 {
        assert!(bottles > 0, "add_wine_batch: empty batch for {label}");
        assert!(
            price_per_bottle >= 0.0,
            "add_wine_batch: negative price for {label}"
        );
        let id = self.id_gen.next_id();
        self.cellar.insert(
            id,
            WineBatch {
                id,
                label: label.to_string(),
                vintage_year,
                bottles,
                price_per_bottle,
            },
        );
        id
    }

    /// Insert a fully-built loan (origination paths construct the `Loan`
    /// themselves so fee and deposit transactions stay beside it).
    ///
    /// # Panics
    /// Panics if the loan's lender does not exist or the ID is already taken.
    pub fn insert_loan(&mut self, loan: Loan) {
        assert!(
            self.lenders.contains_key(&loan.lender_id),
            "insert_loan: lender {} not found",
            loan.lender_id
        );
        assert!(
            !self.loans.contains_key(&loan.id),
            "insert_loan: loan id {} already present",
            loan.id
        );
        self.loans.insert(loan.id, loan);
    }

    pub fn active_loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values().filter(|l| l.is_active())
    }

    pub fn active_loan_count(&self) -> usize {
        self.active_loans().count()
    }

    /// IDs of active forced loans, ascending.
    pub fn forced_loan_ids(&self) -> Vec<u64> {
        self.loans
            .values()
            .filter(|l| l.is_active() && l.is_forced)
            .map(|l| l.id)
            .collect()
    }

    pub fn total_forced_balance(&self) -> f64 {
        self.loans
            .values()
            .filter(|l| l.is_active() && l.is_forced)
            .map(|l| l.remaining_balance)
            .sum()
    }

    pub fn vineyard_portfolio_value(&self) -> f64 {
        self.vineyards.values().map(|v| v.value).sum()
    }

    pub fn cellar_value(&self) -> f64 {
        self.cellar.values().map(|b| b.value()).sum()
    }

    /// Opening cash plus the transaction ledger sum. Always equals
    /// `company.cash`; tests audit against this.
    pub fn ledger_cash(&self) -> f64 {
        self.company.opening_cash + self.transactions.iter().map(|t| t.amount).sum::<f64>()
    }
}
