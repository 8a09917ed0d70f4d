use serde::Serialize;
use sqlx::PgPool;

use crate::model::GameState;

/// Load a `GameState` snapshot into Postgres using COPY FROM STDIN (text
/// format).
///
/// Order respects FK constraints: lenders before loans, loans before the
/// tables that reference them.
pub async fn load_state(pool: &PgPool, state: &GameState) -> Result<(), sqlx::Error> {
    // Company (single row)
    {
        let c = &state.company;
        let buf = format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            escape(&c.name),
            c.cash,
            c.opening_cash,
            c.base_prestige,
            c.credit_rating,
            c.bookkeeping_hours,
        );
        copy_in(pool, include_str!("../../sql/copy_company.sql"), &buf).await?;
    }

    // Lenders
    {
        let mut buf = String::new();
        for l in state.lenders.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                l.id,
                escape(&l.name),
                escape(&enum_str(&l.kind)),
                l.base_rate,
                l.min_amount,
                l.max_amount,
                l.min_seasons,
                l.max_seasons,
                json_str(&l.fee),
                l.blacklisted,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_lenders.sql"), &buf).await?;
    }

    // Loans (before transactions/warnings due to FK)
    {
        let mut buf = String::new();
        for loan in state.loans.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                loan.id,
                loan.lender_id,
                escape(&enum_str(&loan.category)),
                loan.principal,
                loan.base_rate,
                loan.effective_rate,
                loan.origination_fee,
                loan.remaining_balance,
                loan.seasonal_payment,
                loan.seasons_total,
                loan.seasons_remaining,
                loan.start.as_u32(),
                loan.next_payment_due.as_u32(),
                loan.missed_payments,
                escape(&enum_str(&loan.status)),
                loan.is_forced,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_loans.sql"), &buf).await?;
    }

    // Vineyards
    {
        let mut buf = String::new();
        for v in state.vineyards.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                v.id,
                escape(&v.name),
                v.hectares,
                v.value,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_vineyards.sql"), &buf).await?;
    }

    // Wine batches
    {
        let mut buf = String::new();
        for b in state.cellar.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                b.id,
                escape(&b.label),
                b.vintage_year,
                b.bottles,
                b.price_per_bottle,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_wine_batches.sql"), &buf).await?;
    }

    // Transactions
    {
        let mut buf = String::new();
        for t in &state.transactions {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                t.id,
                t.date.as_u32(),
                escape(&enum_str(&t.kind)),
                t.amount,
                opt_u64(t.loan_id),
                escape(&t.description),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_transactions.sql"), &buf).await?;
    }

    // Prestige events
    {
        let mut buf = String::new();
        for p in &state.prestige_events {
            let data = if p.data.is_null() {
                "\\N".to_string()
            } else {
                json_str(&p.data)
            };
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                p.id,
                p.created.as_u32(),
                p.amount,
                p.decay_per_week,
                escape(&p.kind),
                escape(&p.description),
                data,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_prestige_events.sql"), &buf).await?;
    }

    // Warnings
    {
        let mut buf = String::new();
        for w in state.warnings.values() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                w.loan_id,
                escape(&w.lender_name),
                w.missed_payments,
                escape(&enum_str(&w.severity)),
                w.created.as_u32(),
                escape(&w.title),
                escape(&w.message),
                json_str(&w.penalty_summary),
                opt_u64(w.decision_offer_id),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_warnings.sql"), &buf).await?;
    }

    // Notices
    {
        let mut buf = String::new();
        for n in &state.notices {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                n.id,
                n.date.as_u32(),
                escape(&enum_str(&n.severity)),
                escape(&n.title),
                escape(&n.message),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_notices.sql"), &buf).await?;
    }

    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(pool: &PgPool, statement: &str, data: &str) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional id as a COPY text value (`\N` for NULL).
fn opt_u64(v: Option<u64>) -> String {
    match v {
        Some(n) => n.to_string(),
        None => "\\N".to_string(),
    }
}

/// Serialize a value to JSON text for a JSONB column.
fn json_str<T: Serialize>(val: &T) -> String {
    escape(&serde_json::to_string(val).expect("jsonb serialization"))
}

/// Serialize a serde enum variant to its snake_case string (strips JSON quotes).
fn enum_str<T: Serialize>(val: &T) -> String {
    let json = serde_json::to_string(val).expect("enum serialization");
    // serde_json wraps string enums in quotes: "\"value\""
    json[1..json.len() - 1].to_string()
}
