use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::GameState;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Flush the game state to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 9 files:
/// - `company.jsonl` — a single line with the company snapshot
/// - `lenders.jsonl` / `loans.jsonl` — the credit book
/// - `vineyards.jsonl` / `wine_batches.jsonl` — the estate
/// - `transactions.jsonl` / `prestige_events.jsonl` — the ledgers
/// - `warnings.jsonl` / `notices.jsonl` — pending and posted alerts
pub fn flush_to_jsonl(state: &GameState, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(
        &output_dir.join("company.jsonl"),
        std::iter::once(&state.company),
    )?;
    write_jsonl(&output_dir.join("lenders.jsonl"), state.lenders.values())?;
    write_jsonl(&output_dir.join("loans.jsonl"), state.loans.values())?;
    write_jsonl(&output_dir.join("vineyards.jsonl"), state.vineyards.values())?;
    write_jsonl(
        &output_dir.join("wine_batches.jsonl"),
        state.cellar.values(),
    )?;
    write_jsonl(
        &output_dir.join("transactions.jsonl"),
        state.transactions.iter(),
    )?;
    write_jsonl(
        &output_dir.join("prestige_events.jsonl"),
        state.prestige_events.iter(),
    )?;
    write_jsonl(&output_dir.join("warnings.jsonl"), state.warnings.values())?;
    write_jsonl(&output_dir.join("notices.jsonl"), state.notices.iter())?;

    Ok(())
}
