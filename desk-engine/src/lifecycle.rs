//! Booking lifecycle state machine
//!
//! Governs which settlement branches are legal for a booking's current
//! status. Overdue stays route fees through the late-fee calculator;
//! non-overdue extensions route through the extension-fee calculator.
//! Illegal transitions fail with a state error and never mutate.

use shared::booking::{Booking, BookingStatus};
use shared::error::{DeskError, DeskResult};

/// Whether `from -> to` is a legal lifecycle transition
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (PendingConfirmation, Confirmed)
            | (Confirmed, InUse)
            | (PendingConfirmation, Cancelled)
            | (Confirmed, Cancelled)
            | (InUse, Overdue)
            | (InUse, Completed)
            | (Overdue, Completed)
    )
}

/// Apply a lifecycle transition, failing on illegal pairs
pub fn transition(booking: &mut Booking, to: BookingStatus) -> DeskResult<()> {
    if !can_transition(booking.status, to) {
        return Err(DeskError::IllegalTransition {
            from: booking.status,
            to,
        });
    }
    tracing::info!(
        booking_id = %booking.id,
        from = ?booking.status,
        to = ?to,
        "booking transition"
    );
    booking.status = to;
    booking.updated_at = chrono::Utc::now().timestamp_millis();
    Ok(())
}

/// Whether settlement recomputation is still legal for this status
///
/// Completed bookings are frozen: no recomputation except explicit
/// post-hoc refund handling.
pub fn allows_recomputation(status: BookingStatus) -> bool {
    !matches!(status, BookingStatus::Completed | BookingStatus::Cancelled)
}
