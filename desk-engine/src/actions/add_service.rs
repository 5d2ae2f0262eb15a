//! AddService command handler
//!
//! Appends service lines to the stay's invoice. The existing invoice is
//! located before anything is created - one invoice per booking is a hard
//! invariant.

use async_trait::async_trait;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use crate::money::validate_service_line;
use crate::normalize::normalize_summary;
use shared::error::{DeskError, DeskResult};
use shared::request::ServiceLineInput;

/// AddService action
#[derive(Debug, Clone)]
pub struct AddServiceAction {
    pub booking_id: String,
    pub lines: Vec<ServiceLineInput>,
    pub payment_method: String,
}

#[async_trait]
impl DeskCommand for AddServiceAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate inputs before any backend call
        require_booking_id(&self.booking_id)?;
        if self.lines.is_empty() {
            return Err(DeskError::validation("at least one service line is required"));
        }
        for line in &self.lines {
            validate_service_line(line)?;
        }

        // 2. Services attach to a stay in progress
        let booking = ctx.backend.get_booking(&self.booking_id).await?;
        if !booking.status.is_occupying() {
            return Err(DeskError::validation(format!(
                "services can only be added to a stay in progress, booking is {:?}",
                booking.status
            )));
        }

        // 3. Locate the existing invoice; create only when none exists
        let summary = ctx.backend.get_summary(&self.booking_id).await?;
        let charges = normalize_summary(&summary);
        if charges.invoice_count > 1 {
            return Err(DeskError::MultipleInvoices {
                booking_id: self.booking_id.clone(),
                count: charges.invoice_count,
            });
        }
        if charges.invoice_count == 0 {
            ctx.backend
                .create_invoice(&self.booking_id, &self.payment_method)
                .await?;
        }

        // 4. Commit the append
        ctx.backend
            .add_service_lines(&self.booking_id, &self.lines)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            lines = self.lines.len(),
            operator = %metadata.operator_id,
            "services added"
        );

        // 5. Return the server-confirmed settlement
        Ok(ActionOutcome::settled(
            ctx.fresh_settlement(&self.booking_id).await?,
        ))
    }
}
