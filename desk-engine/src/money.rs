//! Money arithmetic utilities using rust_decimal for precision
//!
//! All monetary values are `i64` amounts in the smallest currency unit.
//! Intermediate arithmetic (VAT, percentages) goes through `Decimal`;
//! rounding is half-up and happens only at aggregation boundaries, never
//! per line.

use rust_decimal::prelude::*;
use shared::error::{DeskError, DeskResult};
use shared::request::{CheckoutInput, RefundInput, ServiceLineInput};

/// Tolerance for monetary comparisons (one minor unit, absorbs rounding)
pub const MONEY_TOLERANCE: i64 = 1;

/// Maximum allowed amount per charge or payment (one trillion minor units)
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
/// Maximum allowed quantity per service line
pub const MAX_QUANTITY: u32 = 9_999;
/// Maximum nights a single extension may add
pub const MAX_EXTENSION_NIGHTS: u32 = 365;

/// Convert a minor-unit amount to Decimal for calculation
#[inline]
pub fn to_decimal(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Round a Decimal back to whole minor units, half-up
#[inline]
pub fn to_minor(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// percent% of a base amount, rounded half-up
///
/// This is the single rounding point for percentage charges.
#[inline]
pub fn percent_of(base: i64, percent: Decimal) -> i64 {
    to_minor(to_decimal(base) * percent / Decimal::ONE_HUNDRED)
}

/// Compare two monetary values for equality within tolerance
pub fn money_eq(a: i64, b: i64) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

/// Check if payment covers the required amount (within tolerance)
pub fn is_payment_sufficient(paid: i64, required: i64) -> bool {
    paid >= required - MONEY_TOLERANCE
}

fn require_bounded(value: i64, field_name: &str) -> DeskResult<()> {
    if value < 0 {
        return Err(DeskError::validation(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    if value > MAX_AMOUNT {
        return Err(DeskError::validation(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_AMOUNT, value
        )));
    }
    Ok(())
}

/// Validate a ServiceLineInput before it reaches the backend
pub fn validate_service_line(line: &ServiceLineInput) -> DeskResult<()> {
    if line.service_id.trim().is_empty() {
        return Err(DeskError::validation("service_id must not be empty"));
    }
    require_bounded(line.unit_price, "unit_price")?;
    if line.quantity == 0 {
        return Err(DeskError::validation("quantity must be positive"));
    }
    if line.quantity > MAX_QUANTITY {
        return Err(DeskError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, line.quantity
        )));
    }
    Ok(())
}

/// Validate a CheckoutInput before committing the checkout
pub fn validate_checkout(input: &CheckoutInput) -> DeskResult<()> {
    if input.payment_method.trim().is_empty() {
        return Err(DeskError::validation("payment_method must not be empty"));
    }
    require_bounded(input.amount, "payment amount")?;
    if let Some(t) = input.tendered {
        require_bounded(t, "tendered")?;
        if t < input.amount {
            return Err(DeskError::validation(format!(
                "tendered {} is less than payment amount {}",
                t, input.amount
            )));
        }
    }
    Ok(())
}

/// Validate a RefundInput before recording the refund
pub fn validate_refund(input: &RefundInput) -> DeskResult<()> {
    if input.invoice_ref.trim().is_empty() {
        return Err(DeskError::validation("invoice_ref must not be empty"));
    }
    if input.amount <= 0 {
        return Err(DeskError::validation(format!(
            "refund amount must be positive, got {}",
            input.amount
        )));
    }
    require_bounded(input.amount, "refund amount")?;
    if input.reason.trim().is_empty() {
        return Err(DeskError::validation("refund reason must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::invoice::ServiceLineTag;

    fn create_service_line(service_id: &str, quantity: u32, unit_price: i64) -> ServiceLineInput {
        ServiceLineInput {
            service_id: service_id.to_string(),
            quantity,
            unit_price,
            tag: ServiceLineTag::Generic,
            label: None,
        }
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 10% of 1,000,005 = 100,000.5 -> 100,001
        assert_eq!(percent_of(1_000_005, Decimal::from(10)), 100_001);
        // 10% of 1,000,004 = 100,000.4 -> 100,000
        assert_eq!(percent_of(1_000_004, Decimal::from(10)), 100_000);
    }

    #[test]
    fn test_percent_of_scenario_vat() {
        assert_eq!(percent_of(1_000_000, Decimal::from(10)), 100_000);
        assert_eq!(percent_of(1_150_000, Decimal::from(10)), 115_000);
    }

    #[test]
    fn test_to_minor_half_up() {
        assert_eq!(to_minor(Decimal::new(5, 1)), 1); // 0.5 -> 1
        assert_eq!(to_minor(Decimal::new(4, 1)), 0); // 0.4 -> 0
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(100_000, 100_000));
        assert!(money_eq(100_000, 100_001));
        assert!(!money_eq(100_000, 100_002));
    }

    #[test]
    fn test_is_payment_sufficient() {
        assert!(is_payment_sufficient(100_000, 100_000));
        assert!(is_payment_sufficient(99_999, 100_000)); // within tolerance
        assert!(!is_payment_sufficient(99_998, 100_000));
    }

    #[test]
    fn test_validate_service_line_ok() {
        assert!(validate_service_line(&create_service_line("svc-1", 2, 150_000)).is_ok());
    }

    #[test]
    fn test_validate_service_line_empty_id() {
        let result = validate_service_line(&create_service_line("  ", 1, 150_000));
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_validate_service_line_zero_quantity() {
        let result = validate_service_line(&create_service_line("svc-1", 0, 150_000));
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_validate_service_line_negative_price() {
        let result = validate_service_line(&create_service_line("svc-1", 1, -500));
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_validate_service_line_price_over_max() {
        let result = validate_service_line(&create_service_line("svc-1", 1, MAX_AMOUNT + 1));
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_validate_checkout_tendered_below_amount() {
        let input = CheckoutInput {
            payment_method: "CASH".to_string(),
            amount: 500_000,
            tendered: Some(400_000),
        };
        assert!(matches!(
            validate_checkout(&input),
            Err(DeskError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_checkout_ok() {
        let input = CheckoutInput {
            payment_method: "CARD".to_string(),
            amount: 900_000,
            tendered: None,
        };
        assert!(validate_checkout(&input).is_ok());
    }

    #[test]
    fn test_validate_refund_requires_positive_amount() {
        let input = RefundInput {
            invoice_ref: "inv-1".to_string(),
            amount: 0,
            reason: "reassignment overpay".to_string(),
            method: "CASH".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        };
        assert!(matches!(
            validate_refund(&input),
            Err(DeskError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_refund_requires_invoice_ref() {
        let input = RefundInput {
            invoice_ref: String::new(),
            amount: 200_000,
            reason: "reassignment overpay".to_string(),
            method: "CASH".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        };
        assert!(matches!(
            validate_refund(&input),
            Err(DeskError::Validation(_))
        ));
    }
}
