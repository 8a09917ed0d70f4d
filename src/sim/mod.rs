mod context;
mod runner;
mod signal;
mod system;

pub mod actions;
pub mod emergency;
pub mod escalation;
pub mod lending;
pub mod liquidation;
pub mod payments;
pub mod restructure;

pub use actions::PlayerActionSystem;
pub use context::TickContext;
pub use emergency::EmergencyLoanSystem;
pub use payments::LoanPaymentSystem;
pub use restructure::RestructureSystem;
pub use runner::{SimConfig, dispatch_systems, run, should_fire};
pub use signal::{Signal, SignalKind};
pub use system::{SimSystem, TickFrequency};
