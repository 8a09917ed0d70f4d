use rand::RngCore;

use super::signal::Signal;
use crate::model::GameState;

/// Context passed to each system on every tick.
///
/// Bundled so new fields (config, logger) can be added without touching
/// the `SimSystem` trait signature.
pub struct TickContext<'a> {
    pub state: &'a mut GameState,
    pub rng: &'a mut dyn RngCore,
    /// Systems push signals here during tick/handle_signals.
    pub signals: &'a mut Vec<Signal>,
    /// Signals emitted by other systems in the previous pass (read-only).
    pub inbox: &'a [Signal],
}
