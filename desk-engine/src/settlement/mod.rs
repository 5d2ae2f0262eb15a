//! Booking settlement engine core
//!
//! Pure computation from normalized charges to the authoritative
//! `Settlement` value:
//!
//! ```text
//! raw summary ─ normalize ─▶ calculators ─▶ aggregate ─▶ reconcile ─▶ Settlement
//!                                              │
//!                                   persisted-total tie-break
//! ```
//!
//! Nothing in this module suspends or mutates shared state; serialization
//! of concurrent mutations lives at the persistence boundary.

pub mod aggregate;
pub mod calculators;
pub mod facade;
pub mod reconcile;

pub use aggregate::{aggregate, resolve_grand_total, ChargeTotals};
pub use calculators::{
    extension_fee, late_fee, promotion_discount, room_charge, service_charge, tagged_fee_total,
};
pub use facade::{compute_from_invoice, compute_settlement};
pub use reconcile::{reconcile, PaymentPosition};
