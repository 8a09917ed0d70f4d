pub mod db;
pub mod flush;
pub mod id;
pub mod model;
pub mod scenario;
pub mod sim;
pub mod testutil;

pub use id::IdGenerator;
pub use model::{
    Company, GameDate, GameState, Lender, LenderKind, Loan, LoanCategory, LoanStatus,
    PlayerAction, RestructureOffer, Season, Transaction, TransactionKind,
};
