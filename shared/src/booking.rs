//! Booking entity and lifecycle status enums

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status
///
/// The numeric codes are the upstream wire values and must stay stable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Terminal: no-show or manual cancellation
    Cancelled,
    /// Reservation recorded, not yet accepted
    PendingConfirmation,
    /// Reservation accepted, guest not yet checked in
    Confirmed,
    /// Guest checked in, stay in progress
    InUse,
    /// Terminal except for post-hoc refunds: checkout finalized
    Completed,
    /// Expected checkout time passed without a completed checkout
    Overdue,
}

impl BookingStatus {
    /// Stable numeric code used by the upstream records
    pub fn code(&self) -> u8 {
        match self {
            Self::Cancelled => 0,
            Self::PendingConfirmation => 1,
            Self::Confirmed => 2,
            Self::InUse => 3,
            Self::Completed => 4,
            Self::Overdue => 5,
        }
    }

    /// Parse a numeric status code from an upstream record
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Cancelled),
            1 => Some(Self::PendingConfirmation),
            2 => Some(Self::Confirmed),
            3 => Some(Self::InUse),
            4 => Some(Self::Completed),
            5 => Some(Self::Overdue),
            _ => None,
        }
    }

    /// Guest currently holds the room (stay in progress or past due)
    pub fn is_occupying(&self) -> bool {
        matches!(self, Self::InUse | Self::Overdue)
    }

    /// No further mutation except explicit refunds is legal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment status of a booking
///
/// Numeric codes: Deposited=0, Unpaid=1, Paid=2 (upstream wire values).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Deposit collected at reservation time
    Deposited,
    /// Nothing collected yet
    #[default]
    Unpaid,
    /// Fully settled
    Paid,
}

impl PaymentStatus {
    pub fn code(&self) -> u8 {
        match self {
            Self::Deposited => 0,
            Self::Unpaid => 1,
            Self::Paid => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Deposited),
            1 => Some(Self::Unpaid),
            2 => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Booking entity - the root of the settlement domain
///
/// Created at reservation time; mutated by check-in confirmation,
/// reassignment, extension and checkout. Never deleted: cancellation is a
/// terminal status transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    /// Booking ID (assigned by the backend)
    pub id: String,
    /// Customer reference
    pub customer_ref: String,
    /// First night of the stay
    pub date_check_in: NaiveDate,
    /// Expected checkout date
    pub date_check_out: NaiveDate,
    /// Number of nights booked
    pub nights: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Payment status
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Deposit collected at reservation time (minor currency units, >= 0)
    #[serde(default)]
    pub deposit: i64,
    /// Free-text notes. Display only: fee branches are selected by
    /// `status`, never parsed out of this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last update timestamp (Unix millis)
    pub updated_at: i64,
}

impl Booking {
    /// Create a new pending reservation
    pub fn new(
        id: String,
        customer_ref: String,
        date_check_in: NaiveDate,
        date_check_out: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let nights = (date_check_out - date_check_in).num_days().max(0) as u32;
        Self {
            id,
            customer_ref,
            date_check_in,
            date_check_out,
            nights,
            status: BookingStatus::PendingConfirmation,
            payment_status: PaymentStatus::Unpaid,
            deposit: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Expected checkout instant: checkout date at the standard hour
    pub fn expected_checkout(&self, standard_hour: u32) -> NaiveDateTime {
        let time = NaiveTime::from_hms_opt(standard_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        self.date_check_out.and_time(time)
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for code in 0..=5u8 {
            let status = BookingStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(BookingStatus::from_code(6).is_none());
    }

    #[test]
    fn test_payment_status_codes() {
        assert_eq!(PaymentStatus::Deposited.code(), 0);
        assert_eq!(PaymentStatus::Unpaid.code(), 1);
        assert_eq!(PaymentStatus::Paid.code(), 2);
        assert!(PaymentStatus::from_code(3).is_none());
    }

    #[test]
    fn test_new_booking_derives_nights() {
        let booking = Booking::new(
            "bk-1".to_string(),
            "cust-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        );
        assert_eq!(booking.nights, 2);
        assert_eq!(booking.status, BookingStatus::PendingConfirmation);
        assert_eq!(booking.deposit, 0);
    }

    #[test]
    fn test_expected_checkout_uses_standard_hour() {
        let booking = Booking::new(
            "bk-1".to_string(),
            "cust-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        );
        let expected = booking.expected_checkout(12);
        assert_eq!(expected.date(), booking.date_check_out);
        assert_eq!(expected.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_occupying_and_terminal() {
        assert!(BookingStatus::InUse.is_occupying());
        assert!(BookingStatus::Overdue.is_occupying());
        assert!(!BookingStatus::Confirmed.is_occupying());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Overdue.is_terminal());
    }
}
