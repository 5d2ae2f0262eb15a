//! Settlement facade - the only entry point consumers call
//!
//! Every UI surface (payment form, invoice view, refund form, checkout
//! modal) renders the `Settlement` produced here and never re-derives
//! numbers itself. The computation is a pure function of its inputs:
//! calling it twice with unchanged inputs yields identical output.

use crate::config::DeskConfig;
use crate::normalize::{normalize_summary, NormalizedCharges};
use crate::settlement::aggregate::{aggregate, resolve_grand_total};
use crate::settlement::calculators::{room_charge, service_charge, tagged_fee_total};
use crate::settlement::reconcile::{agrees_with_server, reconcile};
use serde_json::Value;
use shared::booking::{Booking, BookingStatus};
use shared::error::{DeskError, DeskResult};
use shared::invoice::{Invoice, ServiceLineTag};
use shared::settlement::Settlement;

/// Compute the settlement for a booking from a raw summary document
pub fn compute_settlement(
    booking: &Booking,
    summary: &Value,
    config: &DeskConfig,
) -> DeskResult<Settlement> {
    let charges = normalize_summary(summary);
    settle(booking, &charges, config)
}

/// Compute the settlement from an already-typed invoice
///
/// Feeds the same internal pipeline as the raw path - there is no second
/// code path that could drift.
pub fn compute_from_invoice(
    booking: &Booking,
    invoice: &Invoice,
    config: &DeskConfig,
) -> DeskResult<Settlement> {
    if invoice.booking_ref != booking.id {
        return Err(DeskError::validation(format!(
            "invoice {} belongs to booking {}, not {}",
            invoice.id, invoice.booking_ref, booking.id
        )));
    }
    let mut charges = NormalizedCharges::from_invoice(invoice);
    charges.deposit = booking.deposit;
    settle(booking, &charges, config)
}

/// The single settlement pipeline: calculators -> aggregate -> reconcile
fn settle(
    booking: &Booking,
    charges: &NormalizedCharges,
    config: &DeskConfig,
) -> DeskResult<Settlement> {
    // One invoice per booking is a hard invariant.
    if charges.invoice_count > 1 {
        return Err(DeskError::MultipleInvoices {
            booking_id: booking.id.clone(),
            count: charges.invoice_count,
        });
    }

    let room_total = room_charge(&charges.room_lines);
    let service_total = service_charge(&charges.service_lines);

    let tagged_extension = tagged_fee_total(&charges.service_lines, ServiceLineTag::ExtensionFee);
    let tagged_late = tagged_fee_total(&charges.service_lines, ServiceLineTag::LateFee);
    let backend_late = charges.backend_late_fee.filter(|fee| *fee > 0);
    let late_from_records = if tagged_late > 0 {
        tagged_late
    } else {
        backend_late.unwrap_or(0)
    };

    // Fee branch selection is by lifecycle status, never by note text.
    let (extension_fee, late_fee) = match booking.status {
        // Overdue stays are penalty-only: any extension line is stale.
        BookingStatus::Overdue => (0, late_from_records),
        // Before overdue there is no penalty to apply.
        BookingStatus::PendingConfirmation
        | BookingStatus::Confirmed
        | BookingStatus::InUse => (tagged_extension, 0),
        // Terminal states trust the recorded lines; the exclusivity
        // invariant still holds and is enforced by the aggregator.
        BookingStatus::Completed | BookingStatus::Cancelled => {
            (tagged_extension, late_from_records)
        }
    };

    let totals = aggregate(room_total, service_total, extension_fee, late_fee, config)?;
    let grand_total = resolve_grand_total(totals.grand_total, charges.persisted_total);

    // A zero deposit in the summary is "not present"; the booking record
    // is the fallback source.
    let deposit = if charges.deposit > 0 {
        charges.deposit
    } else {
        booking.deposit
    };

    let position = reconcile(grand_total, deposit, charges.paid_amount);
    if let Some(server_due) = charges.server_amount_due
        && !agrees_with_server(&position, server_due)
    {
        tracing::warn!(
            booking_id = %booking.id,
            server_due,
            computed_due = position.amount_due,
            "server-reported amount due disagrees with reconciliation, keeping computed value"
        );
    }

    Ok(Settlement {
        booking_id: booking.id.clone(),
        lifecycle_state: booking.status,
        room_total,
        service_total,
        subtotal: totals.subtotal,
        vat: totals.vat,
        extension_fee,
        late_fee,
        grand_total,
        deposit,
        paid_amount: charges.paid_amount,
        amount_due: position.amount_due,
        refund_due: position.refund_due,
    })
}
