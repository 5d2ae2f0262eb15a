//! Checkout command handler
//!
//! Finalizes a stay: validates payment sufficiency, settles the invoice
//! and freezes the booking in `Completed`. Overdue stays get their
//! late-fee penalty recorded here, as a dedicated non-VAT line.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use crate::money::{is_payment_sufficient, validate_checkout};
use crate::normalize::normalize_summary;
use crate::settlement::calculators::late_fee;
use shared::booking::BookingStatus;
use shared::error::{DeskError, DeskResult};
use shared::invoice::ServiceLineTag;
use shared::request::{CheckoutInput, ServiceLineInput};

/// Checkout action
#[derive(Debug, Clone)]
pub struct CheckoutAction {
    pub booking_id: String,
    pub input: CheckoutInput,
    /// Moment the guest actually hands the room back
    pub actual_time: NaiveDateTime,
}

#[async_trait]
impl DeskCommand for CheckoutAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate inputs before any backend call
        require_booking_id(&self.booking_id)?;
        validate_checkout(&self.input)?;

        // 2. Only an in-progress or overdue stay can check out
        let booking = ctx.backend.get_booking(&self.booking_id).await?;
        if !booking.status.is_occupying() {
            return Err(DeskError::IllegalTransition {
                from: booking.status,
                to: BookingStatus::Completed,
            });
        }

        // 3. Overdue stays settle their penalty now, as a dedicated
        //    non-VAT line. An already-recorded line makes retries no-ops.
        if booking.status == BookingStatus::Overdue {
            let summary = ctx.backend.get_summary(&self.booking_id).await?;
            let charges = normalize_summary(&summary);
            let already_recorded = charges
                .service_lines
                .iter()
                .any(|line| line.tag == ServiceLineTag::LateFee);
            if !already_recorded {
                let nightly_rate = charges
                    .room_lines
                    .first()
                    .map(|line| line.nightly_rate)
                    .unwrap_or(0);
                let expected = booking.expected_checkout(ctx.config.standard_checkout_hour);
                let fee = late_fee(
                    self.actual_time,
                    expected,
                    nightly_rate,
                    charges.backend_late_fee,
                    ctx.config,
                );
                if fee > 0 {
                    ctx.backend
                        .add_service_lines(
                            &self.booking_id,
                            &[ServiceLineInput {
                                service_id: "late-checkout".to_string(),
                                quantity: 1,
                                unit_price: fee,
                                tag: ServiceLineTag::LateFee,
                                label: Some("Late checkout penalty".to_string()),
                            }],
                        )
                        .await?;
                }
            }
        }

        // 4. The amount being collected must cover what is still owed
        let settlement = ctx.fresh_settlement(&self.booking_id).await?;
        if !is_payment_sufficient(self.input.amount, settlement.amount_due) {
            return Err(DeskError::validation(format!(
                "payment insufficient: collecting {}, still owed {}",
                self.input.amount, settlement.amount_due
            )));
        }

        // 5. Commit payment, then freeze the booking
        if self.input.amount > 0 {
            ctx.backend
                .confirm_paid(&self.booking_id, self.input.amount)
                .await?;
        }
        ctx.backend
            .update_status(&self.booking_id, BookingStatus::Completed)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            collected = self.input.amount,
            method = %self.input.payment_method,
            operator = %metadata.operator_id,
            "checkout finalized"
        );

        // 6. Return the frozen settlement
        Ok(ActionOutcome::settled(
            ctx.fresh_settlement(&self.booking_id).await?,
        ))
    }
}
