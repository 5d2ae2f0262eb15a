//! ReassignRoom command handler
//!
//! Moves a stay to a different room. The room lines are replaced by the
//! backend, which can retroactively change the room total after a deposit
//! or payment was already recorded - the returned settlement then carries
//! either a remaining `amount_due` or a `refund_due`, never both.

use async_trait::async_trait;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use crate::money::money_eq;
use shared::error::{DeskError, DeskResult};

/// ReassignRoom action
#[derive(Debug, Clone)]
pub struct ReassignRoomAction {
    pub booking_id: String,
    pub new_room_id: String,
}

#[async_trait]
impl DeskCommand for ReassignRoomAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate identifiers before any backend call
        require_booking_id(&self.booking_id)?;
        if self.new_room_id.trim().is_empty() {
            return Err(DeskError::validation("target room id must not be empty"));
        }

        // 2. A terminal booking cannot move rooms
        let booking = ctx.backend.get_booking(&self.booking_id).await?;
        if booking.status.is_terminal() {
            return Err(DeskError::validation(format!(
                "cannot reassign a {:?} booking",
                booking.status
            )));
        }

        // 3. Commit the reassignment (conflicts surface the alternatives)
        let outcome = ctx
            .backend
            .reassign_room(&self.booking_id, &self.new_room_id)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            new_room_id = %outcome.new_room_id,
            price_delta = outcome.price_delta,
            operator = %metadata.operator_id,
            "room reassigned"
        );

        // 4. Recompute from the freshly persisted state; the backend's
        //    own refund figure must agree with the reconciler
        let settlement = ctx.fresh_settlement(&self.booking_id).await?;
        if let Some(reported) = outcome.refund_amount
            && !money_eq(reported, settlement.refund_due)
        {
            tracing::warn!(
                booking_id = %self.booking_id,
                reported,
                reconciled = settlement.refund_due,
                "backend refund figure disagrees with reconciliation"
            );
        }

        Ok(ActionOutcome::settled(settlement))
    }
}
