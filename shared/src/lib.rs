//! Shared domain types for the front-desk settlement engine
//!
//! Booking and invoice entities, the derived `Settlement` value object,
//! command input payloads and the error taxonomy used across every
//! surface that renders or mutates a booking.

pub mod booking;
pub mod error;
pub mod invoice;
pub mod request;
pub mod settlement;

// Re-exports
pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use error::{DeskError, DeskErrorCode, DeskResult};
pub use invoice::{
    Invoice, InvoiceStatus, Promotion, PromotionAdjustment, Refund, RoomChargeLine,
    ServiceChargeLine, ServiceLineTag, VAT_RATE,
};
pub use request::{CheckoutInput, ExtendMode, ExtendStayInput, RefundInput, ServiceLineInput};
pub use settlement::Settlement;
