//! Settlement - the derived monetary snapshot for a booking
//!
//! Recomputed on demand and never cached across a mutation. The
//! `fingerprint` is a stable digest of every monetary field, used to
//! assert that recomputing from unchanged inputs yields identical output.

use crate::booking::BookingStatus;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Derived monetary state of one booking at a point in time
///
/// Produced only by the settlement facade; every UI surface renders this
/// value without re-deriving numbers itself. All amounts are integers in
/// the smallest currency unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    /// Booking this snapshot belongs to
    pub booking_id: String,
    /// Lifecycle state the computation was gated by
    pub lifecycle_state: BookingStatus,
    /// Sum of room charge lines (discount-clamped)
    pub room_total: i64,
    /// Sum of generic service lines (fee-tagged lines excluded)
    pub service_total: i64,
    /// room_total + service_total
    pub subtotal: i64,
    /// VAT on the subtotal, rounded half-up
    pub vat: i64,
    /// VAT-inclusive voluntary extension charge (0 unless extended)
    pub extension_fee: i64,
    /// Non-taxed overdue penalty (0 unless overdue)
    pub late_fee: i64,
    /// subtotal + vat + extension_fee + late_fee, after the
    /// persisted-total tie-break
    pub grand_total: i64,
    /// Deposit collected at reservation time
    pub deposit: i64,
    /// Payments already recorded
    pub paid_amount: i64,
    /// max(0, grand_total - deposit - paid_amount)
    pub amount_due: i64,
    /// max(0, (deposit + paid_amount) - grand_total)
    pub refund_due: i64,
}

impl Settlement {
    /// Nothing left to collect or return
    pub fn is_settled(&self) -> bool {
        self.amount_due == 0 && self.refund_due == 0
    }

    /// Compute a stable digest over every field
    ///
    /// Two settlements computed from identical inputs must produce equal
    /// fingerprints. Returns a 16-character hex string.
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.booking_id.hash(&mut hasher);
        self.lifecycle_state.code().hash(&mut hasher);
        self.room_total.hash(&mut hasher);
        self.service_total.hash(&mut hasher);
        self.subtotal.hash(&mut hasher);
        self.vat.hash(&mut hasher);
        self.extension_fee.hash(&mut hasher);
        self.late_fee.hash(&mut hasher);
        self.grand_total.hash(&mut hasher);
        self.deposit.hash(&mut hasher);
        self.paid_amount.hash(&mut hasher);
        self.amount_due.hash(&mut hasher);
        self.refund_due.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}
