use winery_sim::model::*;

pub fn build_test_state() -> GameState {
    let mut state = GameState::new(Company::new("Stonegate Winery", 25_000.0));

    // 2 lenders: a bank and a blacklisted quick-loan shop
    let bank = state.add_lender("Valley Bank", LenderKind::Bank);
    let shop = state.add_lender("Fast Cash Ltd", LenderKind::QuickLoan);
    state.lenders.get_mut(&shop).unwrap().blacklisted = true;

    // 2 loans: an active bank note and a forced emergency advance
    let note = Loan::new(
        state.id_gen.next_id(),
        bank,
        20_000.0,
        0.06,
        300.0,
        8,
        state.current_date,
        LoanCategory::Standard,
        false,
    );
    let note_id = note.id;
    state.insert_loan(note);
    let advance = Loan::new(
        state.id_gen.next_id(),
        shop,
        5_000.0,
        0.18,
        100.0,
        4,
        state.current_date,
        LoanCategory::Emergency,
        true,
    );
    let advance_id = advance.id;
    state.insert_loan(advance);

    // Estate: 1 vineyard, 1 cellar lot
    state.add_vineyard("North Slope", 4.0, 80_000.0);
    state.add_wine_batch("Estate Red", 1, 240, 15.0);

    // 3 transactions: deposit and fee on the note, plus an untied wine sale
    state.record_transaction(
        TransactionKind::LoanDeposit,
        20_000.0,
        Some(note_id),
        "Loan of 20000.00 from Valley Bank".to_string(),
    );
    state.record_transaction(
        TransactionKind::OriginationFee,
        -300.0,
        Some(note_id),
        "Origination fee to Valley Bank".to_string(),
    );
    state.record_transaction(
        TransactionKind::WineSale,
        450.0,
        None,
        "Sold 30 bottles of Estate Red".to_string(),
    );

    // 1 prestige event, 1 warning on the forced loan, 1 notice
    state.add_prestige_event(
        -8.0,
        0.05,
        "emergency_loan",
        "Forced to take an emergency loan".to_string(),
        serde_json::json!({ "loan_id": advance_id }),
    );
    state.queue_warning(PendingLoanWarning {
        loan_id: advance_id,
        lender_name: "Fast Cash Ltd".to_string(),
        missed_payments: 1,
        severity: WarningSeverity::Warning,
        created: state.current_date,
        title: "Missed loan payment".to_string(),
        message: "An installment to Fast Cash Ltd was missed.".to_string(),
        penalty_summary: vec!["Late fee added to the balance".to_string()],
        decision_offer_id: None,
    });
    state.queue_notice(
        WarningSeverity::Warning,
        "Emergency loan taken".to_string(),
        "Fast Cash Ltd advanced 5000.00 to cover a cash deficit.".to_string(),
    );

    state
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
