use serde::{Deserialize, Serialize};

use super::date::GameDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum WarningSeverity {
    /// Notices only; loan warnings start at `Warning`.
    Info,
    Warning,
    Error,
    Critical,
}

string_enum!(WarningSeverity {
    Info => "info",
    Warning => "warning",
    Error => "error",
    Critical => "critical",
});

/// Blocking modal warning for one loan. Stored keyed by loan id, one at a
/// time — a newer miss overwrites the previous warning for the same loan.
/// Cleared when the player acknowledges it, when the loan pays off, or when
/// the attached decision resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLoanWarning {
    pub loan_id: u64,
    pub lender_name: String,
    pub missed_payments: u32,
    pub severity: WarningSeverity,
    pub created: GameDate,
    pub title: String,
    pub message: String,
    /// One line per penalty applied, for the UI to list verbatim.
    pub penalty_summary: Vec<String>,
    /// Present when the warning carries a decision: the id of a pending
    /// forced-restructure offer the player must accept or decline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_offer_id: Option<u64>,
}

/// Non-blocking strip notification (emergency loan taken, restructure
/// executed, ...). Purely informational; the UI drains these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub date: GameDate,
    pub severity: WarningSeverity,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(WarningSeverity::Info < WarningSeverity::Warning);
        assert!(WarningSeverity::Warning < WarningSeverity::Error);
        assert!(WarningSeverity::Error < WarningSeverity::Critical);
    }

    #[test]
    fn severity_string_round_trip() {
        let s: String = WarningSeverity::Critical.into();
        assert_eq!(s, "critical");
        assert_eq!(
            WarningSeverity::try_from(s).unwrap(),
            WarningSeverity::Critical
        );
    }
}
