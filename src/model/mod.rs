#[macro_use]
mod macros;

pub mod action;
pub mod company;
pub mod date;
pub mod estate;
pub mod ledger;
pub mod lender;
pub mod loan;
pub mod offer;
pub mod state;
pub mod warning;

pub use action::{ActionOutcome, ActionResult, PlayerAction};
pub use company::Company;
pub use date::{GameDate, Season};
pub use estate::{Vineyard, WineBatch};
pub use ledger::{PrestigeEvent, Transaction, TransactionKind};
pub use lender::{FeeConfig, Lender, LenderKind};
pub use loan::{Loan, LoanCategory, LoanStatus};
pub use offer::{LiquidationStep, LiquidationTarget, ProposedTerms, RestructureOffer};
pub use state::GameState;
pub use warning::{Notice, PendingLoanWarning, WarningSeverity};
