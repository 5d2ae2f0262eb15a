//! Settlement aggregator - the single place totals are assembled
//!
//! VAT is applied exactly once, here. The extension fee arrives with its
//! own VAT already baked in and the late fee is a non-taxed penalty, so
//! both are added after the VAT step.

use crate::config::DeskConfig;
use crate::money::{to_decimal, to_minor, MONEY_TOLERANCE};
use shared::error::{DeskError, DeskResult};

/// Aggregated charge totals before payment reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeTotals {
    /// room_total + service_total
    pub subtotal: i64,
    /// VAT on the subtotal, rounded half-up
    pub vat: i64,
    /// subtotal + vat + extension_fee + late_fee
    pub grand_total: i64,
}

/// Combine calculator outputs into subtotal, VAT and grand total
///
/// At most one of `extension_fee`/`late_fee` may be non-zero for a single
/// recomputation (both zero is legal); a violation means the same event
/// would be taxed as both a penalty and a service charge.
pub fn aggregate(
    room_total: i64,
    service_total: i64,
    extension_fee: i64,
    late_fee: i64,
    config: &DeskConfig,
) -> DeskResult<ChargeTotals> {
    if extension_fee > 0 && late_fee > 0 {
        return Err(DeskError::FeeExclusion {
            extension_fee,
            late_fee,
        });
    }

    let subtotal = room_total + service_total;
    let vat = to_minor(to_decimal(subtotal) * config.vat_rate);
    let grand_total = subtotal + vat + extension_fee + late_fee;

    Ok(ChargeTotals {
        subtotal,
        vat,
        grand_total,
    })
}

/// Tie-break between a freshly computed grand total and a persisted one
///
/// The persisted/server-confirmed total wins only when strictly greater
/// than zero - a zero or missing persisted total is a not-yet-set
/// placeholder, never an authoritative zero-due state. A disagreement
/// beyond rounding tolerance is logged and resolved by this rule, never
/// averaged.
pub fn resolve_grand_total(computed: i64, persisted: Option<i64>) -> i64 {
    match persisted {
        Some(persisted) if persisted > 0 => {
            if (persisted - computed).abs() > MONEY_TOLERANCE {
                tracing::warn!(
                    persisted,
                    computed,
                    delta = persisted - computed,
                    "grand total disagreement, preferring persisted value"
                );
            }
            persisted
        }
        _ => computed,
    }
}
