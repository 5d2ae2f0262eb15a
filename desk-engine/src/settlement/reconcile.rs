//! Payment reconciler - combines grand total with deposit and payments

use crate::money::MONEY_TOLERANCE;

/// Outstanding position of a booking after reconciliation
///
/// `amount_due` and `refund_due` are never both positive for the same
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentPosition {
    /// Still owed by the guest
    pub amount_due: i64,
    /// Owed back to the guest, typically after a reassignment reduced the
    /// total below what was already collected
    pub refund_due: i64,
}

/// Reconcile the grand total against deposit and prior payments
pub fn reconcile(grand_total: i64, deposit: i64, paid_amount: i64) -> PaymentPosition {
    let collected = deposit + paid_amount;
    PaymentPosition {
        amount_due: (grand_total - collected).max(0),
        refund_due: (collected - grand_total).max(0),
    }
}

/// Whether a server-reported due amount agrees with the reconciled one
pub fn agrees_with_server(position: &PaymentPosition, server_amount_due: i64) -> bool {
    (position.amount_due - server_amount_due).abs() <= MONEY_TOLERANCE
}
