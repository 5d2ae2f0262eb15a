//! Command input payloads for front-desk actions

use crate::invoice::ServiceLineTag;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Service line input - for adding services to a stay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLineInput {
    /// Service or combo ID
    pub service_id: String,
    pub quantity: u32,
    /// Price per unit (minor currency units)
    pub unit_price: i64,
    /// Routing tag; plain service additions leave this unset
    #[serde(default)]
    pub tag: ServiceLineTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// How a stay is being lengthened
///
/// Exactly one mode applies per extension event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtendMode {
    /// Whole extra night(s) at the full nightly rate
    ExtraNights { nights: u32 },
    /// Same-day checkout past the standard hour, charged as a fraction of
    /// one night
    LateCheckout { new_hour: u32 },
}

/// Extend-stay request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendStayInput {
    #[serde(flatten)]
    pub mode: ExtendMode,
    pub payment_method: String,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInput {
    pub payment_method: String,
    /// Amount being collected now (minor units, >= 0)
    pub amount: i64,
    /// Cash handed over, when larger than `amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<i64>,
}

/// Refund request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundInput {
    pub invoice_ref: String,
    /// Amount to return (minor units, > 0)
    pub amount: i64,
    pub reason: String,
    pub method: String,
    pub date: NaiveDate,
}
