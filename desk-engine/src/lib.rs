//! Booking Settlement Engine
//!
//! Recomputes a single authoritative monetary state for a booking at
//! every lifecycle event of a stay - confirmation, service addition,
//! room reassignment, extension, overdue detection, checkout, refund:
//!
//! - **normalize**: canonicalizes heterogeneous upstream records
//! - **settlement**: pure calculators, aggregator, reconciler and the
//!   facade every consumer goes through
//! - **lifecycle**: the booking state machine gating fee branches
//! - **actions**: one command handler per user-triggered event
//! - **backend**: the persistence/API collaborator seam
//! - **storage**: in-memory reference backend with per-booking locks
//!
//! # Data Flow
//!
//! ```text
//! Command → Action → BookingBackend mutation (awaited)
//!              ↓
//!        fresh summary read
//!              ↓
//!     compute_settlement (normalize → calculators → aggregate → reconcile)
//!              ↓
//!     Settlement → rendered by every UI surface as-is
//! ```
//!
//! The engine itself is a pure function of its inputs; serialization of
//! concurrent mutations per booking is owed by the backend.

pub mod actions;
pub mod backend;
pub mod config;
pub mod lifecycle;
pub mod money;
pub mod normalize;
pub mod settlement;
pub mod storage;

// Re-exports
pub use actions::{
    ActionContext, ActionOutcome, AddServiceAction, CheckoutAction, CommandMetadata,
    ConfirmCheckInAction, DeskCommand, ExtendStayAction, MarkOverdueAction, ReassignRoomAction,
    RefundAction,
};
pub use backend::{BookingBackend, ExtendOutcome, ReassignOutcome, RoomOccupancy};
pub use config::DeskConfig;
pub use normalize::{normalize_summary, NormalizedCharges};
pub use settlement::{compute_from_invoice, compute_settlement};
pub use storage::InMemoryDesk;

// Re-export shared types for convenience
pub use shared::{
    Booking, BookingStatus, DeskError, DeskErrorCode, DeskResult, Invoice, PaymentStatus, Refund,
    Settlement,
};
