//! Backend collaborator seam
//!
//! Persistence, room inventory and the transport layer are external
//! collaborators; this trait is the interface the engine consumes. Every
//! mutation is awaited before a settlement recomputation is triggered,
//! and the implementation must serialize mutations per booking - the
//! engine itself is a pure function of what these calls return.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::booking::{Booking, BookingStatus};
use shared::error::DeskResult;
use shared::invoice::Refund;
use shared::request::{ExtendStayInput, RefundInput, ServiceLineInput};

/// Occupancy state of a room at check-in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomOccupancy {
    Vacant,
    /// Another stay currently holds the room
    Occupied { by_booking: String },
    /// The holding stay is past its expected checkout
    OverdueStay { by_booking: String },
}

/// Result of a room reassignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignOutcome {
    pub new_room_id: String,
    /// Recomputed grand total after the room lines were replaced
    pub grand_total: i64,
    /// Signed difference against the previous grand total
    pub price_delta: i64,
    /// Excess already collected, when the new total dropped below it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<i64>,
}

/// Result of a stay extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendOutcome {
    pub new_checkout: NaiveDateTime,
    pub grand_total: i64,
    /// VAT-inclusive extension charge added to the invoice
    pub extension_fee: i64,
    /// VAT portion baked into the extension fee
    pub vat_amount: i64,
}

/// The persistence/API collaborator every action goes through
///
/// Implementations own the one-invoice-per-booking record and must make
/// each mutation atomic per booking (optimistic lock or per-booking
/// mutex); two mutations against the same booking never interleave their
/// read-modify-write of the invoice.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn get_booking(&self, booking_id: &str) -> DeskResult<Booking>;

    /// Authoritative summary document the settlement reconciles against.
    /// Field naming varies by upstream source; the normalizer owns that.
    async fn get_summary(&self, booking_id: &str) -> DeskResult<Value>;

    async fn room_occupancy(&self, room_id: &str) -> DeskResult<RoomOccupancy>;

    /// Rooms currently free, offered in the reassignment flow
    async fn vacant_rooms(&self) -> DeskResult<Vec<String>>;

    /// Create the booking's invoice, or return the existing one - the
    /// 1:1 invariant makes this idempotent
    async fn create_invoice(&self, booking_id: &str, payment_method: &str) -> DeskResult<String>;

    async fn add_service_lines(
        &self,
        booking_id: &str,
        lines: &[ServiceLineInput],
    ) -> DeskResult<()>;

    async fn confirm_paid(&self, booking_id: &str, amount: i64) -> DeskResult<()>;

    async fn reassign_room(
        &self,
        booking_id: &str,
        new_room_id: &str,
    ) -> DeskResult<ReassignOutcome>;

    async fn extend_stay(
        &self,
        booking_id: &str,
        request: &ExtendStayInput,
    ) -> DeskResult<ExtendOutcome>;

    async fn update_status(&self, booking_id: &str, status: BookingStatus) -> DeskResult<()>;

    async fn record_refund(&self, refund: &RefundInput) -> DeskResult<Refund>;
}
