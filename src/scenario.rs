use crate::model::*;
use crate::sim::{SimConfig, SimSystem, lending, run};

/// IDs returned by [`Scenario::add_distressed_estate`].
pub struct EstateIds {
    pub lender: u64,
    pub loan: u64,
    pub vineyard: u64,
    pub cellar_lot: u64,
}

// -- Builder-style ref types --

/// Typed reference to a lender in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::lender`] (creation) or [`Scenario::lender_mut`] (mutation).
/// Call [`.id()`](LenderRef::id) to terminate the chain and extract the lender ID.
pub struct LenderRef<'a> {
    scenario: &'a mut Scenario,
    id: u64,
}

impl<'a> LenderRef<'a> {
    fn data_mut(&mut self) -> &mut Lender {
        self.scenario.state.lenders.get_mut(&self.id).unwrap()
    }

    pub fn base_rate(mut self, v: f64) -> Self { self.data_mut().base_rate = v; self }
    pub fn blacklisted(mut self, v: bool) -> Self { self.data_mut().blacklisted = v; self }
    pub fn amount_range(mut self, min: f64, max: f64) -> Self {
        let d = self.data_mut();
        d.min_amount = min;
        d.max_amount = max;
        self
    }
    pub fn term_range(mut self, min: u32, max: u32) -> Self {
        let d = self.data_mut();
        d.min_seasons = min;
        d.max_seasons = max;
        self
    }

    /// Escape hatch: apply an arbitrary closure to the lender.
    pub fn with(mut self, f: impl FnOnce(&mut Lender)) -> Self { f(self.data_mut()); self }

    /// Terminate the chain and return the lender ID.
    pub fn id(self) -> u64 { self.id }
}

/// Typed reference to a loan in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::loan`] (creation) or [`Scenario::loan_mut`] (mutation).
/// Call [`.id()`](LoanRef::id) to terminate the chain and extract the loan ID.
pub struct LoanRef<'a> {
    scenario: &'a mut Scenario,
    id: u64,
}

impl<'a> LoanRef<'a> {
    fn data_mut(&mut self) -> &mut Loan {
        self.scenario.state.loans.get_mut(&self.id).unwrap()
    }

    pub fn missed_payments(mut self, v: u32) -> Self { self.data_mut().missed_payments = v; self }
    pub fn remaining_balance(mut self, v: f64) -> Self { self.data_mut().remaining_balance = v; self }
    pub fn effective_rate(mut self, v: f64) -> Self { self.data_mut().effective_rate = v; self }
    pub fn next_payment_due(mut self, v: GameDate) -> Self { self.data_mut().next_payment_due = v; self }
    pub fn is_forced(mut self, v: bool) -> Self { self.data_mut().is_forced = v; self }
    pub fn category(mut self, v: LoanCategory) -> Self { self.data_mut().category = v; self }
    pub fn status(mut self, v: LoanStatus) -> Self { self.data_mut().status = v; self }

    /// Recompute the seasonal payment from the current balance, rate, and
    /// remaining term.
    pub fn repriced(mut self) -> Self { self.data_mut().reprice(); self }

    /// Escape hatch: apply an arbitrary closure to the loan.
    pub fn with(mut self, f: impl FnOnce(&mut Loan)) -> Self { f(self.data_mut()); self }

    /// Terminate the chain and return the loan ID.
    pub fn id(self) -> u64 { self.id }
}

/// Fluent builder for constructing GameState.
///
/// Books lenders, loans, and estate assets directly against the state, so
/// adding new struct fields never breaks callers. Loans created here skip the
/// cash-moving origination path; use [`Scenario::take_loan`] when the deposit
/// and fee transactions matter.
///
/// Used by tests for deterministic scenario setup, and by the debug example
/// for premade starting estates.
pub struct Scenario {
    state: GameState,
    start_year: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Create a new scenario starting at year 1 ("Test Winery", 10,000 cash).
    pub fn new() -> Self {
        Self::at_year(1)
    }

    /// Create a new scenario starting at the given year.
    pub fn at_year(year: u32) -> Self {
        let mut state = GameState::new(Company::new("Test Winery", 10_000.0));
        state.current_date = GameDate::from_year(year);
        Self { state, start_year: year }
    }

    // -- Company --

    /// Rename the company.
    pub fn company_name(&mut self, name: &str) {
        self.state.company.name = name.to_string();
    }

    /// Set the cash position, moving opening cash by the same amount so the
    /// ledger audit (`ledger_cash`) stays intact.
    pub fn set_cash(&mut self, v: f64) {
        let delta = v - self.state.company.cash;
        self.state.company.opening_cash += delta;
        self.state.company.cash = v;
    }

    /// Record a setup-tagged cash adjustment through the ledger.
    pub fn adjust_cash(&mut self, amount: f64, description: &str) -> u64 {
        self.state.record_transaction(
            TransactionKind::Custom("scenario_setup".to_string()),
            amount,
            None,
            description.to_string(),
        )
    }

    /// Modify the company directly.
    pub fn modify_company(&mut self, modify: impl FnOnce(&mut Company)) {
        modify(&mut self.state.company);
    }

    // -- Lenders --

    /// Add a lender with its kind's default terms.
    pub fn add_lender(&mut self, name: &str, kind: LenderKind) -> u64 {
        self.add_lender_with(name, kind, |_| {})
    }

    /// Add a lender, customizing its terms via closure.
    pub fn add_lender_with(
        &mut self,
        name: &str,
        kind: LenderKind,
        modify: impl FnOnce(&mut Lender),
    ) -> u64 {
        let id = self.state.add_lender(name, kind);
        modify(self.state.lenders.get_mut(&id).unwrap());
        id
    }

    // -- Loans --

    /// Book a loan at the lender's base rate with no origination fee and no
    /// cash movement. The balance appears on the books as if carried over.
    pub fn add_loan(&mut self, lender: u64, principal: f64, seasons: u32) -> u64 {
        self.add_loan_with(lender, principal, seasons, |_| {})
    }

    /// Book a loan, customizing it via closure before insertion.
    pub fn add_loan_with(
        &mut self,
        lender: u64,
        principal: f64,
        seasons: u32,
        modify: impl FnOnce(&mut Loan),
    ) -> u64 {
        let rate = self
            .state
            .lenders
            .get(&lender)
            .unwrap_or_else(|| panic!("lender {lender} not found"))
            .base_rate;
        let mut loan = Loan::new(
            self.state.id_gen.next_id(),
            lender,
            principal,
            rate,
            0.0,
            seasons,
            self.state.current_date,
            LoanCategory::Standard,
            false,
        );
        modify(&mut loan);
        let id = loan.id;
        self.state.insert_loan(loan);
        id
    }

    /// Book a forced emergency loan (4 seasons at the lender's base rate).
    pub fn add_forced_loan(&mut self, lender: u64, principal: f64) -> u64 {
        self.add_loan_with(lender, principal, 4, |l| {
            l.category = LoanCategory::Emergency;
            l.is_forced = true;
        })
    }

    /// Originate a loan through the player lending path, moving cash for the
    /// deposit and origination fee.
    ///
    /// # Panics
    /// Panics if the lender rejects the application.
    pub fn take_loan(&mut self, lender: u64, principal: f64, seasons: u32) -> u64 {
        lending::player_take_loan(&mut self.state, lender, principal, seasons)
            .unwrap_or_else(|e| panic!("loan application rejected: {e}"))
    }

    // -- Estate assets --

    /// Add a vineyard.
    pub fn add_vineyard(&mut self, name: &str, hectares: f64, value: f64) -> u64 {
        self.state.add_vineyard(name, hectares, value)
    }

    /// Add a bottled cellar lot.
    pub fn add_cellar_lot(
        &mut self,
        label: &str,
        vintage_year: u32,
        bottles: u32,
        price_per_bottle: f64,
    ) -> u64 {
        self.state.add_wine_batch(label, vintage_year, bottles, price_per_bottle)
    }

    // -- Actions --

    /// Queue a player action for the next weekly tick.
    pub fn queue_action(&mut self, action: PlayerAction) {
        self.state.queue_action(action);
    }

    // -- Entity mutation --

    /// Modify a lender after creation.
    pub fn modify_lender(&mut self, id: u64, modify: impl FnOnce(&mut Lender)) {
        let l = self
            .state
            .lenders
            .get_mut(&id)
            .unwrap_or_else(|| panic!("lender {id} not found"));
        modify(l);
    }

    /// Modify a loan after creation.
    pub fn modify_loan(&mut self, id: u64, modify: impl FnOnce(&mut Loan)) {
        let l = self
            .state
            .loans
            .get_mut(&id)
            .unwrap_or_else(|| panic!("loan {id} not found"));
        modify(l);
    }

    /// Modify a vineyard after creation.
    pub fn modify_vineyard(&mut self, id: u64, modify: impl FnOnce(&mut Vineyard)) {
        let v = self
            .state
            .vineyards
            .get_mut(&id)
            .unwrap_or_else(|| panic!("vineyard {id} not found"));
        modify(v);
    }

    /// Modify a cellar lot after creation.
    pub fn modify_cellar_lot(&mut self, id: u64, modify: impl FnOnce(&mut WineBatch)) {
        let b = self
            .state
            .cellar
            .get_mut(&id)
            .unwrap_or_else(|| panic!("cellar lot {id} not found"));
        modify(b);
    }

    // -- Composite builders --

    /// Create a quick-loan lender, a 10,000 forced loan, a 30,000 vineyard,
    /// and a 100-bottle cellar lot in one call. The standard distressed
    /// fixture for restructure and liquidation setups.
    pub fn add_distressed_estate(&mut self) -> EstateIds {
        self.add_distressed_estate_with(10_000.0, |_| {})
    }

    /// Create the distressed fixture with a chosen forced balance and a
    /// closure to customize the forced loan.
    pub fn add_distressed_estate_with(
        &mut self,
        forced_balance: f64,
        modify_loan: impl FnOnce(&mut Loan),
    ) -> EstateIds {
        let lender = self.add_lender("Fast Cash Ltd", LenderKind::QuickLoan);
        let loan = self.add_loan_with(lender, forced_balance, 4, |l| {
            l.category = LoanCategory::Emergency;
            l.is_forced = true;
            modify_loan(l);
        });
        let vineyard = self.add_vineyard("South Slope", 3.0, 30_000.0);
        let cellar_lot = self.add_cellar_lot("Reserve Red", self.start_year, 100, 20.0);
        EstateIds {
            lender,
            loan,
            vineyard,
            cellar_lot,
        }
    }

    // -- Builder-style creation --

    /// Create a lender and return a builder ref for chaining field mutations.
    pub fn lender(&mut self, name: &str, kind: LenderKind) -> LenderRef<'_> {
        let id = self.add_lender(name, kind);
        LenderRef { scenario: self, id }
    }

    /// Book a loan and return a builder ref for chaining field mutations.
    /// Uses the same defaults as [`add_loan`](Scenario::add_loan).
    pub fn loan(&mut self, lender: u64, principal: f64, seasons: u32) -> LoanRef<'_> {
        let id = self.add_loan(lender, principal, seasons);
        LoanRef { scenario: self, id }
    }

    // -- Builder-style mutation --

    /// Return a builder ref for an existing lender.
    pub fn lender_mut(&mut self, id: u64) -> LenderRef<'_> {
        assert!(
            self.state.lenders.contains_key(&id),
            "lender {id} not found"
        );
        LenderRef { scenario: self, id }
    }

    /// Return a builder ref for an existing loan.
    pub fn loan_mut(&mut self, id: u64) -> LoanRef<'_> {
        assert!(self.state.loans.contains_key(&id), "loan {id} not found");
        LoanRef { scenario: self, id }
    }

    // -- Output --

    /// Consume the scenario and return the constructed state.
    pub fn build(self) -> GameState {
        self.state
    }

    /// Build the state and run the given systems. Uses the scenario's start year.
    pub fn run(self, systems: &mut [Box<dyn SimSystem>], num_years: u32, seed: u64) -> GameState {
        let start_year = self.start_year;
        let mut state = self.build();
        run(&mut state, systems, SimConfig::new(start_year, num_years, seed));
        state
    }

    /// Borrow the state for inspection.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Borrow the state mutably for additional modifications.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}
