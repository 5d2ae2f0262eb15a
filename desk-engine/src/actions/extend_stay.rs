//! ExtendStay command handler
//!
//! Voluntarily lengthens a stay. The fee is VAT-inclusive and lands on
//! the invoice as an extension-tagged line. Overdue stays never take this
//! path - their surcharge is the late-fee penalty, selected by status.

use async_trait::async_trait;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use shared::booking::BookingStatus;
use shared::error::{DeskError, DeskResult};
use shared::request::{ExtendMode, ExtendStayInput};

/// ExtendStay action
#[derive(Debug, Clone)]
pub struct ExtendStayAction {
    pub booking_id: String,
    pub input: ExtendStayInput,
}

#[async_trait]
impl DeskCommand for ExtendStayAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate inputs before any backend call
        require_booking_id(&self.booking_id)?;
        if self.input.payment_method.trim().is_empty() {
            return Err(DeskError::validation("payment method must not be empty"));
        }
        match self.input.mode {
            ExtendMode::ExtraNights { nights: 0 } => {
                return Err(DeskError::validation("extension must add at least one night"));
            }
            ExtendMode::LateCheckout { new_hour } if new_hour >= 24 => {
                return Err(DeskError::validation(format!(
                    "invalid checkout hour: {}",
                    new_hour
                )));
            }
            _ => {}
        }

        // 2. Extension and late fee are mutually exclusive per stay; an
        //    overdue booking settles a penalty instead
        let booking = ctx.backend.get_booking(&self.booking_id).await?;
        if booking.status == BookingStatus::Overdue {
            return Err(DeskError::validation(
                "overdue stays settle a late fee at checkout; extension is not available",
            ));
        }
        if booking.status != BookingStatus::InUse {
            return Err(DeskError::validation(format!(
                "only a stay in progress can be extended, booking is {:?}",
                booking.status
            )));
        }

        // 3. Same-day departure at or before the standard hour is a
        //    no-op: nothing to charge, nothing to mutate
        if let ExtendMode::LateCheckout { new_hour } = self.input.mode
            && new_hour <= ctx.config.standard_checkout_hour
        {
            return Ok(ActionOutcome::settled(
                ctx.fresh_settlement(&self.booking_id).await?,
            ));
        }

        // 4. Commit through the backend's authoritative fee calculation
        let outcome = ctx
            .backend
            .extend_stay(&self.booking_id, &self.input)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            new_checkout = %outcome.new_checkout,
            extension_fee = outcome.extension_fee,
            operator = %metadata.operator_id,
            "stay extended"
        );

        // 5. Return the server-confirmed settlement
        Ok(ActionOutcome::settled(
            ctx.fresh_settlement(&self.booking_id).await?,
        ))
    }
}
