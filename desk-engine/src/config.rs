//! Engine configuration
//!
//! Defaults match the property rules the backend enforces; overrides come
//! from the environment so a deployment can adjust surcharge policy
//! without a rebuild.

use rust_decimal::Decimal;
use std::str::FromStr;

/// One tier of the late-fee fallback schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateFeeTier {
    /// Tier applies while the guest is at most this many hours late
    pub max_hours_late: i64,
    /// Percent of one night's rate charged at this tier
    pub percent: Decimal,
}

/// Settlement engine configuration
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Flat VAT rate applied to the subtotal (0.10)
    pub vat_rate: Decimal,
    /// Standard checkout hour; same-day departures at or before this hour
    /// carry no surcharge
    pub standard_checkout_hour: u32,
    /// Percent of one night charged for a voluntary same-day late
    /// checkout when the request carries no explicit rate
    pub late_checkout_percent: Decimal,
    /// Fallback schedule when the backend sends no authoritative late
    /// fee; hours past the last tier charge a full night
    pub late_fee_tiers: Vec<LateFeeTier>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            vat_rate: shared::invoice::VAT_RATE,
            standard_checkout_hour: 12,
            late_checkout_percent: Decimal::from(30),
            late_fee_tiers: vec![
                LateFeeTier {
                    max_hours_late: 3,
                    percent: Decimal::from(30),
                },
                LateFeeTier {
                    max_hours_late: 6,
                    percent: Decimal::from(50),
                },
            ],
        }
    }
}

impl DeskConfig {
    /// Load configuration from the environment, falling back to defaults
    ///
    /// Recognized variables: `DESK_VAT_RATE` (e.g. "0.10"),
    /// `DESK_CHECKOUT_HOUR`, `DESK_LATE_CHECKOUT_PERCENT`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("DESK_VAT_RATE")
            && let Ok(rate) = Decimal::from_str(&raw)
            && rate >= Decimal::ZERO
            && rate < Decimal::ONE
        {
            config.vat_rate = rate;
        }
        if let Ok(raw) = std::env::var("DESK_CHECKOUT_HOUR")
            && let Ok(hour) = raw.parse::<u32>()
            && hour < 24
        {
            config.standard_checkout_hour = hour;
        }
        if let Ok(raw) = std::env::var("DESK_LATE_CHECKOUT_PERCENT")
            && let Ok(pct) = Decimal::from_str(&raw)
            && pct > Decimal::ZERO
            && pct <= Decimal::ONE_HUNDRED
        {
            config.late_checkout_percent = pct;
        }

        config
    }
}
