//! MarkOverdue command handler
//!
//! Flags a stay whose expected checkout time has passed without a
//! completed checkout. From here on the settlement routes through the
//! late-fee branch; any extension line is stale.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use shared::booking::BookingStatus;
use shared::error::{DeskError, DeskResult};

/// MarkOverdue action
#[derive(Debug, Clone)]
pub struct MarkOverdueAction {
    pub booking_id: String,
    /// Observation instant the detection ran at
    pub now: NaiveDateTime,
}

#[async_trait]
impl DeskCommand for MarkOverdueAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate identifiers before any backend call
        require_booking_id(&self.booking_id)?;

        // 2. Load the latest booking state
        let booking = ctx.backend.get_booking(&self.booking_id).await?;

        // 3. Idempotent retry: already flagged means no-op
        if booking.status == BookingStatus::Overdue {
            return Ok(ActionOutcome::settled(
                ctx.fresh_settlement(&self.booking_id).await?,
            ));
        }

        // 4. Only an in-progress stay can run overdue
        if booking.status != BookingStatus::InUse {
            return Err(DeskError::IllegalTransition {
                from: booking.status,
                to: BookingStatus::Overdue,
            });
        }

        // 5. The expected checkout must actually have passed
        let expected = booking.expected_checkout(ctx.config.standard_checkout_hour);
        if self.now <= expected {
            return Err(DeskError::validation(format!(
                "checkout is not due until {}",
                expected
            )));
        }

        // 6. Commit the transition
        ctx.backend
            .update_status(&self.booking_id, BookingStatus::Overdue)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            expected_checkout = %expected,
            observed_at = %self.now,
            operator = %metadata.operator_id,
            "booking marked overdue"
        );

        // 7. Return the server-confirmed settlement
        Ok(ActionOutcome::settled(
            ctx.fresh_settlement(&self.booking_id).await?,
        ))
    }
}
