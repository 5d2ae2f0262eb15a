//! Error taxonomy for the settlement engine
//!
//! Every failure is scoped to a single booking's operation; nothing here
//! is fatal to the process. Validation and state errors are handled
//! locally (block the action), conflicts surface as a guided alternative
//! flow, transport errors and reconciliation mismatches carry a retry
//! affordance.

use crate::booking::BookingStatus;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Stable error class codes for UI dispatch and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskErrorCode {
    /// Missing/invalid identifiers or inputs (blocks before any network call)
    Validation,
    /// Target room occupied/overdue, or checkout moved backwards
    Conflict,
    /// Illegal lifecycle transition
    State,
    /// Two sources of grand total disagree beyond rounding tolerance
    ReconciliationMismatch,
    /// Backend/network failure, recoverable by retry
    Transport,
    /// Requested entity does not exist
    NotFound,
}

impl DeskErrorCode {
    /// Stable code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "E1001",
            Self::Conflict => "E1002",
            Self::State => "E1003",
            Self::ReconciliationMismatch => "E1004",
            Self::Transport => "E1005",
            Self::NotFound => "E1006",
        }
    }

    /// Whether a retry of the same operation can succeed without a
    /// different user decision
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::ReconciliationMismatch)
    }
}

impl std::fmt::Display for DeskErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type for front-desk operations
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("booking not found: {0}")]
    BookingNotFound(String),

    #[error("no invoice found for booking {0}")]
    InvoiceNotFound(String),

    #[error("booking {booking_id} has {count} invoices, expected exactly one")]
    MultipleInvoices { booking_id: String, count: usize },

    #[error("room {room_id} is unavailable: {reason}")]
    RoomUnavailable {
        room_id: String,
        reason: String,
        /// Vacant rooms the caller can offer in the reassignment flow
        alternatives: Vec<String>,
    },

    #[error("requested checkout {requested} is earlier than current checkout {current}")]
    CheckoutBeforeCurrent {
        current: NaiveDateTime,
        requested: NaiveDateTime,
    },

    #[error("illegal transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("extension fee {extension_fee} and late fee {late_fee} cannot both apply to one stay")]
    FeeExclusion { extension_fee: i64, late_fee: i64 },

    #[error("grand total disagreement: persisted {persisted}, computed {computed}")]
    ReconciliationMismatch { persisted: i64, computed: i64 },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl DeskError {
    /// Classify into the stable error code taxonomy
    pub fn code(&self) -> DeskErrorCode {
        match self {
            Self::Validation(_) | Self::MultipleInvoices { .. } => DeskErrorCode::Validation,
            Self::BookingNotFound(_) | Self::InvoiceNotFound(_) => DeskErrorCode::NotFound,
            Self::RoomUnavailable { .. } | Self::CheckoutBeforeCurrent { .. } => {
                DeskErrorCode::Conflict
            }
            Self::IllegalTransition { .. } | Self::FeeExclusion { .. } => DeskErrorCode::State,
            Self::ReconciliationMismatch { .. } => DeskErrorCode::ReconciliationMismatch,
            Self::Transport(_) => DeskErrorCode::Transport,
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
