//! Refund command handler
//!
//! Returns money to the guest when the settlement reports `refund_due`,
//! typically after a reassignment reduced the total below what was
//! already collected. The refund is an independent entity, legal even on
//! a completed (frozen) booking.

use async_trait::async_trait;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use crate::money::validate_refund;
use shared::error::{DeskError, DeskResult};
use shared::request::RefundInput;

/// Refund action
#[derive(Debug, Clone)]
pub struct RefundAction {
    pub booking_id: String,
    pub input: RefundInput,
}

#[async_trait]
impl DeskCommand for RefundAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate identifiers and amount before any backend call
        require_booking_id(&self.booking_id)?;
        validate_refund(&self.input)?;

        // 2. A refund is only legal when the settlement owes one
        let settlement = ctx.fresh_settlement(&self.booking_id).await?;
        if settlement.refund_due == 0 {
            return Err(DeskError::validation(format!(
                "booking {} has no refund due",
                self.booking_id
            )));
        }
        if self.input.amount > settlement.refund_due {
            return Err(DeskError::validation(format!(
                "refund {} exceeds amount due back {}",
                self.input.amount, settlement.refund_due
            )));
        }

        // 3. Commit the refund
        let refund = ctx.backend.record_refund(&self.input).await?;
        tracing::info!(
            booking_id = %self.booking_id,
            invoice_ref = %refund.invoice_ref,
            amount = refund.amount,
            operator = %metadata.operator_id,
            "refund recorded"
        );

        // 4. Return the post-refund settlement
        let settlement = ctx.fresh_settlement(&self.booking_id).await?;
        Ok(ActionOutcome {
            settlement,
            refund: Some(refund),
        })
    }
}
