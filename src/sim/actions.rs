//! The unified player action queue.
//!
//! UI-facing code only ever pushes a `PlayerAction` onto the state; this
//! system drains the queue each week and records one `ActionResult` per
//! action, success or failure, in submission order.

use tracing::debug;

use super::context::TickContext;
use super::lending;
use super::restructure;
use super::system::{SimSystem, TickFrequency};
use crate::model::{ActionOutcome, ActionResult, PlayerAction, WarningSeverity};

pub struct PlayerActionSystem;

impl SimSystem for PlayerActionSystem {
    fn name(&self) -> &'static str {
        "player_actions"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Weekly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let pending = std::mem::take(&mut ctx.state.pending_actions);
        for action in pending {
            let name = action.name();
            let outcome = process_action(ctx, action);
            if let ActionOutcome::Failed { reason } = &outcome {
                debug!(action = name, reason, "player action failed");
            }
            ctx.state.action_results.push(ActionResult {
                action: name.to_string(),
                outcome,
            });
        }
    }
}

fn process_action(ctx: &mut TickContext, action: PlayerAction) -> ActionOutcome {
    match action {
        PlayerAction::TakeLoan {
            lender_id,
            principal,
            seasons,
        } => process_take_loan(ctx, lender_id, principal, seasons),
        PlayerAction::MakeExtraPayment { loan_id, amount } => {
            process_extra_payment(ctx, loan_id, amount)
        }
        PlayerAction::AcknowledgeWarning { loan_id } => process_acknowledge_warning(ctx, loan_id),
        PlayerAction::AcceptRestructure { offer_id } => process_accept_restructure(ctx, offer_id),
        PlayerAction::DeclineRestructure { offer_id } => process_decline_restructure(ctx, offer_id),
    }
}

fn process_take_loan(
    ctx: &mut TickContext,
    lender_id: u64,
    principal: f64,
    seasons: u32,
) -> ActionOutcome {
    match lending::player_take_loan(ctx.state, lender_id, principal, seasons) {
        Ok(loan_id) => ActionOutcome::Completed { record_id: loan_id },
        Err(reason) => ActionOutcome::Failed { reason },
    }
}

fn process_extra_payment(ctx: &mut TickContext, loan_id: u64, amount: f64) -> ActionOutcome {
    match lending::make_extra_payment(ctx.state, loan_id, amount) {
        Ok(tx_id) => ActionOutcome::Completed { record_id: tx_id },
        Err(reason) => ActionOutcome::Failed { reason },
    }
}

/// Dismiss a warning. Warnings carrying a restructure decision cannot be
/// waved away; the offer has to be answered.
fn process_acknowledge_warning(ctx: &mut TickContext, loan_id: u64) -> ActionOutcome {
    let Some(warning) = ctx.state.warnings.get(&loan_id) else {
        return ActionOutcome::Failed {
            reason: format!("no pending warning for loan {loan_id}"),
        };
    };
    if warning.decision_offer_id.is_some() {
        return ActionOutcome::Failed {
            reason: "the pending restructure offer must be accepted or declined".to_string(),
        };
    }
    ctx.state.clear_warning(loan_id);
    ActionOutcome::Completed { record_id: loan_id }
}

fn process_accept_restructure(ctx: &mut TickContext, offer_id: u64) -> ActionOutcome {
    match restructure::execute_restructure(ctx, offer_id) {
        Ok(report) => ActionOutcome::Completed {
            record_id: report.new_loan_id.unwrap_or(offer_id),
        },
        Err(reason) => {
            // The offer stays pending; surface the failure to the player.
            ctx.state.queue_notice(
                WarningSeverity::Error,
                "Restructure failed".to_string(),
                reason.clone(),
            );
            ActionOutcome::Failed { reason }
        }
    }
}

fn process_decline_restructure(ctx: &mut TickContext, offer_id: u64) -> ActionOutcome {
    match restructure::decline_restructure(ctx, offer_id) {
        Ok(()) => ActionOutcome::Completed { record_id: offer_id },
        Err(reason) => ActionOutcome::Failed { reason },
    }
}
