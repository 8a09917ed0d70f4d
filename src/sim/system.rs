use super::context::TickContext;

/// How often a simulation system should tick.
///
/// Ordered coarsest-to-finest so `systems.iter().map(|s| s.frequency()).max()`
/// yields the finest granularity needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TickFrequency {
    Yearly,   // 1 tick/year
    Seasonal, // 4 ticks/year
    Weekly,   // 48 ticks/year
}

/// A pluggable simulation system that runs each tick.
///
/// Object-safe so systems can be stored as `Box<dyn SimSystem>`.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn frequency(&self) -> TickFrequency;
    fn tick(&mut self, ctx: &mut TickContext);

    /// React to signals emitted by other systems during Phase 1 (`tick()`).
    ///
    /// Called once per dispatch cycle with the full signal buffer in `ctx.inbox`.
    /// Signals pushed to `ctx.signals` here are **not** re-delivered (single-pass).
    /// Default: no-op.
    fn handle_signals(&mut self, ctx: &mut TickContext) {
        let _ = ctx;
    }
}
