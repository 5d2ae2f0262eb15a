//! Charge calculators - pure functions from normalized inputs to amounts
//!
//! No VAT is applied here; VAT is applied once, centrally, by the
//! aggregator. The extension fee is VAT-inclusive by definition and the
//! late fee is a non-taxed penalty, so neither passes through the VAT
//! step.

use crate::config::DeskConfig;
use crate::money::{percent_of, MAX_EXTENSION_NIGHTS};
use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use shared::error::{DeskError, DeskResult};
use shared::invoice::{Promotion, PromotionAdjustment, RoomChargeLine, ServiceChargeLine, ServiceLineTag};

/// Sum of room charge lines, each clamped at zero
pub fn room_charge(lines: &[RoomChargeLine]) -> i64 {
    lines.iter().map(|line| line.line_total().max(0)).sum()
}

/// Sum of generic service lines
///
/// Lines tagged `ExtensionFee` or `LateFee` are excluded here and routed
/// to the dedicated fee calculators - counting them in both places would
/// charge the same fee twice.
pub fn service_charge(lines: &[ServiceChargeLine]) -> i64 {
    lines
        .iter()
        .filter(|line| line.tag == ServiceLineTag::Generic)
        .map(|line| line.line_total().max(0))
        .sum()
}

/// Sum of service lines carrying the given fee tag
pub fn tagged_fee_total(lines: &[ServiceChargeLine], tag: ServiceLineTag) -> i64 {
    lines
        .iter()
        .filter(|line| line.tag == tag)
        .map(|line| line.line_total().max(0))
        .sum()
}

/// Promotion discount amount, capped so the discounted price never goes
/// negative
pub fn promotion_discount(promotion: &Promotion, base: i64) -> i64 {
    let raw = match promotion.adjustment_type {
        PromotionAdjustment::Percentage => percent_of(base, promotion.value),
        PromotionAdjustment::FlatAmount => crate::money::to_minor(promotion.value),
    };
    raw.clamp(0, base.max(0))
}

/// Extension fee for voluntarily lengthening a stay (VAT-inclusive)
///
/// Two modes, exactly one per event:
/// - a later checkout date charges full nightly rate per added night;
/// - a same-day departure past the standard hour charges `percent_rate`
///   percent of one night (config default when absent).
///
/// Departing on the same date at or before the standard hour is a no-op.
/// A requested checkout earlier than the current one is a conflict, never
/// a negative fee.
pub fn extension_fee(
    old_checkout: NaiveDateTime,
    new_checkout: NaiveDateTime,
    nightly_rate: i64,
    percent_rate: Option<Decimal>,
    config: &DeskConfig,
) -> DeskResult<i64> {
    if new_checkout < old_checkout {
        return Err(DeskError::CheckoutBeforeCurrent {
            current: old_checkout,
            requested: new_checkout,
        });
    }

    if new_checkout.date() == old_checkout.date() {
        if new_checkout.time().hour() <= config.standard_checkout_hour {
            return Ok(0);
        }
        let percent = percent_rate.unwrap_or(config.late_checkout_percent);
        return Ok(percent_of(nightly_rate, percent));
    }

    let added_nights = (new_checkout.date() - old_checkout.date()).num_days();
    if added_nights > i64::from(MAX_EXTENSION_NIGHTS) {
        return Err(DeskError::validation(format!(
            "extension of {} nights exceeds maximum allowed ({})",
            added_nights, MAX_EXTENSION_NIGHTS
        )));
    }
    Ok(nightly_rate * added_nights)
}

/// Late-checkout penalty (excluded from VAT)
///
/// Prefers the backend's authoritative surcharge when it sent a positive
/// one; otherwise falls back to the tiered schedule from config, charging
/// a full night past the last tier. Returns 0 when the guest is on time.
/// Callers must never invoke this for a stay whose extension path already
/// applied - branch selection is by booking status.
pub fn late_fee(
    actual_checkout: NaiveDateTime,
    expected_checkout: NaiveDateTime,
    nightly_rate: i64,
    backend_fee: Option<i64>,
    config: &DeskConfig,
) -> i64 {
    if actual_checkout <= expected_checkout {
        return 0;
    }
    if let Some(fee) = backend_fee
        && fee > 0
    {
        return fee;
    }

    let minutes_late = (actual_checkout - expected_checkout).num_minutes();
    let hours_late = minutes_late.div_euclid(60) + i64::from(minutes_late % 60 != 0);
    for tier in &config.late_fee_tiers {
        if hours_late <= tier.max_hours_late {
            return percent_of(nightly_rate, tier.percent);
        }
    }
    nightly_rate
}
