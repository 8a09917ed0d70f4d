use winery_sim::flush::flush_to_jsonl;
use winery_sim::model::*;

fn build_test_state() -> GameState {
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

#[test]
fn flush_produces_valid_jsonl_files() {
    let state = build_test_state();
    let dir = tempfile::tempdir().unwrap();

    flush_to_jsonl(&state, dir.path()).unwrap();

    // All 9 files exist
    let files = [
        ("company.jsonl", 1),
        ("lenders.jsonl", 2),
        ("loans.jsonl", 2),
        ("vineyards.jsonl", 1),
        ("wine_batches.jsonl", 1),
        ("transactions.jsonl", 3),
        ("prestige_events.jsonl", 1),
        ("warnings.jsonl", 1),
        ("notices.jsonl", 1),
    ];
    for (name, expected_lines) in files {
        let path = dir.path().join(name);
        assert!(path.exists(), "missing {name}");
        let lines = read_lines(&path);
        assert_eq!(lines.len(), expected_lines, "wrong line count in {name}");
    }

    // Each loan line is valid JSON with expected fields
    for line in &read_lines(&dir.path().join("loans.jsonl")) {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("id").is_some());
        assert!(v.get("lender_id").is_some());
        assert!(v.get("remaining_balance").is_some());
        assert!(v.get("seasonal_payment").is_some());
        assert!(v.get("status").is_some());
        assert!(v.get("is_forced").is_some());
    }

    for line in &read_lines(&dir.path().join("lenders.jsonl")) {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("id").is_some());
        assert!(v.get("kind").is_some());
        assert!(v.get("base_rate").is_some());
        assert!(v.get("fee").is_some());
        assert!(v.get("blacklisted").is_some());
    }

    for line in &read_lines(&dir.path().join("transactions.jsonl")) {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("id").is_some());
        assert!(v.get("date").is_some());
        assert!(v.get("kind").is_some());
        assert!(v.get("amount").is_some());
    }

    // The untied sale must NOT carry a loan_id key (serde skip)
    let tx_lines = read_lines(&dir.path().join("transactions.jsonl"));
    let sale: serde_json::Value = serde_json::from_str(&tx_lines[2]).unwrap();
    assert_eq!(sale["kind"], "wine_sale");
    assert!(sale.get("loan_id").is_none());

    // A warning without a decision offer must NOT carry the key (serde skip)
    let warning_lines = read_lines(&dir.path().join("warnings.jsonl"));
    let warning: serde_json::Value = serde_json::from_str(&warning_lines[0]).unwrap();
    assert!(warning.get("decision_offer_id").is_none());
}

#[test]
fn flush_preserves_field_values() {
    let state = build_test_state();
    let dir = tempfile::tempdir().unwrap();

    flush_to_jsonl(&state, dir.path()).unwrap();

    // Company: single snapshot line with the post-transaction cash position
    let company_lines = read_lines(&dir.path().join("company.jsonl"));
    let company: serde_json::Value = serde_json::from_str(&company_lines[0]).unwrap();
    assert_eq!(company["name"], "Stonegate Winery");
    assert_eq!(company["opening_cash"], 25_000.0);
    assert_eq!(company["cash"], 45_150.0);
    assert_eq!(company["credit_rating"], 0.5);

    // Lenders: kinds are snake_case, blacklist flag survives
    let lender_lines = read_lines(&dir.path().join("lenders.jsonl"));
    let bank: serde_json::Value = serde_json::from_str(&lender_lines[0]).unwrap();
    assert_eq!(bank["kind"], "bank");
    assert_eq!(bank["name"], "Valley Bank");
    assert_eq!(bank["blacklisted"], false);
    let shop: serde_json::Value = serde_json::from_str(&lender_lines[1]).unwrap();
    assert_eq!(shop["kind"], "quick_loan");
    assert_eq!(shop["blacklisted"], true);

    // Loans: status/category strings, forced flag, structured dates
    let loan_lines = read_lines(&dir.path().join("loans.jsonl"));
    let note: serde_json::Value = serde_json::from_str(&loan_lines[0]).unwrap();
    assert_eq!(note["status"], "active");
    assert_eq!(note["category"], "standard");
    assert_eq!(note["is_forced"], false);
    assert_eq!(note["principal"], 20_000.0);
    assert_eq!(note["start"]["year"], 1);
    assert_eq!(note["start"]["season"], "spring");
    assert_eq!(note["start"]["week"], 1);
    assert_eq!(note["next_payment_due"]["season"], "summer");
    let advance: serde_json::Value = serde_json::from_str(&loan_lines[1]).unwrap();
    assert_eq!(advance["category"], "emergency");
    assert_eq!(advance["is_forced"], true);
    assert_eq!(advance["principal"], 5_000.0);

    // Prestige event references the forced loan in its data payload
    let pe_lines = read_lines(&dir.path().join("prestige_events.jsonl"));
    let pe: serde_json::Value = serde_json::from_str(&pe_lines[0]).unwrap();
    assert_eq!(pe["kind"], "emergency_loan");
    assert_eq!(pe["amount"], -8.0);
    assert_eq!(pe["data"]["loan_id"], advance["id"]);

    // Warning severity is snake_case; notice keeps its title
    let warning_lines = read_lines(&dir.path().join("warnings.jsonl"));
    let warning: serde_json::Value = serde_json::from_str(&warning_lines[0]).unwrap();
    assert_eq!(warning["severity"], "warning");
    assert_eq!(warning["lender_name"], "Fast Cash Ltd");
    assert_eq!(warning["missed_payments"], 1);
    let notice_lines = read_lines(&dir.path().join("notices.jsonl"));
    let notice: serde_json::Value = serde_json::from_str(&notice_lines[0]).unwrap();
    assert_eq!(notice["title"], "Emergency loan taken");

    // Estate values survive
    let vineyard_lines = read_lines(&dir.path().join("vineyards.jsonl"));
    let vineyard: serde_json::Value = serde_json::from_str(&vineyard_lines[0]).unwrap();
    assert_eq!(vineyard["name"], "North Slope");
    assert_eq!(vineyard["hectares"], 4.0);
    assert_eq!(vineyard["value"], 80_000.0);
    let batch_lines = read_lines(&dir.path().join("wine_batches.jsonl"));
    let batch: serde_json::Value = serde_json::from_str(&batch_lines[0]).unwrap();
    assert_eq!(batch["label"], "Estate Red");
    assert_eq!(batch["bottles"], 240);
    assert_eq!(batch["price_per_bottle"], 15.0);
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
