//! Invoice, charge lines and refund entities
//!
//! One invoice per booking is a hard invariant: every mutation locates the
//! existing invoice before ever creating a new one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat VAT rate applied once, centrally, at aggregation time
pub const VAT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2); // 0.10

/// Invoice status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Open,
    Settled,
    Refunded,
}

/// Tag routing a service line to the right calculator
///
/// Lines tagged `ExtensionFee` or `LateFee` are excluded from the generic
/// service total and routed to the dedicated fee calculators. The tag is
/// set at the moment of the triggering action and never inferred from note
/// text afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceLineTag {
    #[default]
    Generic,
    ExtensionFee,
    LateFee,
}

/// Room charge line
///
/// One or more per booking; replaced, not appended, when the room is
/// reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomChargeLine {
    pub room_id: String,
    /// Price per night (minor currency units)
    pub nightly_rate: i64,
    pub nights: u32,
    /// Promotion discount already resolved to an amount (>= 0)
    #[serde(default)]
    pub promotion_discount: i64,
}

impl RoomChargeLine {
    /// Line total, clamped so a discount never drives it below zero
    pub fn line_total(&self) -> i64 {
        (self.nightly_rate * i64::from(self.nights) - self.promotion_discount).max(0)
    }
}

/// Service charge line (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceChargeLine {
    /// Service or combo ID
    pub service_id: String,
    pub quantity: u32,
    /// Price per unit (minor currency units)
    pub unit_price: i64,
    #[serde(default)]
    pub tag: ServiceLineTag,
    /// Human-readable label for receipts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ServiceChargeLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Promotion adjustment kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionAdjustment {
    /// `value` is a whole-or-fractional percent (30 = 30%)
    Percentage,
    /// `value` is an amount in minor currency units
    FlatAmount,
}

/// Promotion definition attached to a room rate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Promotion {
    pub name: String,
    pub adjustment_type: PromotionAdjustment,
    pub value: Decimal,
}

/// Invoice entity - exactly one per booking at any time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// Invoice ID (assigned by the backend)
    pub id: String,
    /// Owning booking
    pub booking_ref: String,
    pub room_lines: Vec<RoomChargeLine>,
    pub service_lines: Vec<ServiceChargeLine>,
    /// Flat VAT rate (fixed 0.10)
    pub vat_rate: Decimal,
    /// Amount already collected against this invoice (minor units)
    #[serde(default)]
    pub paid_amount: i64,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Grand total last persisted by the backend. Zero means "not yet
    /// set", never an authoritative zero-due state.
    #[serde(default)]
    pub grand_total: i64,
}

impl Invoice {
    pub fn new(id: String, booking_ref: String) -> Self {
        Self {
            id,
            booking_ref,
            room_lines: Vec::new(),
            service_lines: Vec::new(),
            vat_rate: VAT_RATE,
            paid_amount: 0,
            status: InvoiceStatus::Open,
            grand_total: 0,
        }
    }

    /// Service lines carrying the given tag
    pub fn lines_tagged(&self, tag: ServiceLineTag) -> impl Iterator<Item = &ServiceChargeLine> {
        self.service_lines.iter().filter(move |l| l.tag == tag)
    }
}

/// Refund record - created only when a settlement reports `refund_due > 0`
///
/// Independent entity from payments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub id: String,
    pub invoice_ref: String,
    /// Refunded amount (minor units, > 0)
    pub amount: i64,
    pub reason: String,
    pub method: String,
    pub date: NaiveDate,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_line_total() {
        let line = RoomChargeLine {
            room_id: "r-101".to_string(),
            nightly_rate: 500_000,
            nights: 2,
            promotion_discount: 0,
        };
        assert_eq!(line.line_total(), 1_000_000);
    }

    #[test]
    fn test_room_line_discount_never_goes_negative() {
        let line = RoomChargeLine {
            room_id: "r-101".to_string(),
            nightly_rate: 100_000,
            nights: 1,
            promotion_discount: 250_000,
        };
        assert_eq!(line.line_total(), 0);
    }

    #[test]
    fn test_service_line_total() {
        let line = ServiceChargeLine {
            service_id: "svc-laundry".to_string(),
            quantity: 3,
            unit_price: 50_000,
            tag: ServiceLineTag::Generic,
            label: None,
        };
        assert_eq!(line.line_total(), 150_000);
    }

    #[test]
    fn test_lines_tagged_filters() {
        let mut invoice = Invoice::new("inv-1".to_string(), "bk-1".to_string());
        invoice.service_lines.push(ServiceChargeLine {
            service_id: "svc-1".to_string(),
            quantity: 1,
            unit_price: 150_000,
            tag: ServiceLineTag::Generic,
            label: None,
        });
        invoice.service_lines.push(ServiceChargeLine {
            service_id: "fee-ext".to_string(),
            quantity: 1,
            unit_price: 500_000,
            tag: ServiceLineTag::ExtensionFee,
            label: None,
        });

        let ext: Vec<_> = invoice.lines_tagged(ServiceLineTag::ExtensionFee).collect();
        assert_eq!(ext.len(), 1);
        assert_eq!(ext[0].service_id, "fee-ext");
    }

    #[test]
    fn test_vat_rate_constant() {
        assert_eq!(VAT_RATE.to_string(), "0.10");
        let invoice = Invoice::new("inv-1".to_string(), "bk-1".to_string());
        assert_eq!(invoice.vat_rate, VAT_RATE);
    }
}
