//! Front-desk action handlers
//!
//! One handler per user-triggered lifecycle event. Each handler validates
//! its inputs locally, checks lifecycle legality, performs the awaited
//! backend mutation, then re-reads the latest persisted state and returns
//! the server-confirmed `Settlement`. Tentative client-side numbers are
//! replaced wholesale by that value - never merged with it.
//!
//! Retries are idempotent: re-submitting a command against a booking that
//! already absorbed it is a no-op, not a duplicate charge.

pub mod add_service;
pub mod checkout;
pub mod confirm_check_in;
pub mod extend_stay;
pub mod mark_overdue;
pub mod reassign_room;
pub mod refund;

pub use add_service::AddServiceAction;
pub use checkout::CheckoutAction;
pub use confirm_check_in::ConfirmCheckInAction;
pub use extend_stay::ExtendStayAction;
pub use mark_overdue::MarkOverdueAction;
pub use reassign_room::ReassignRoomAction;
pub use refund::RefundAction;

use crate::backend::BookingBackend;
use crate::config::DeskConfig;
use crate::settlement::compute_settlement;
use async_trait::async_trait;
use shared::error::{DeskError, DeskResult};
use shared::invoice::Refund;
use shared::settlement::Settlement;

/// Execution context shared by every action
pub struct ActionContext<'a> {
    pub backend: &'a dyn BookingBackend,
    pub config: &'a DeskConfig,
}

impl<'a> ActionContext<'a> {
    pub fn new(backend: &'a dyn BookingBackend, config: &'a DeskConfig) -> Self {
        Self { backend, config }
    }

    /// Read the latest persisted state and compute the settlement from it
    ///
    /// Every action finishes through here so stale-read settlements
    /// cannot be returned.
    pub async fn fresh_settlement(&self, booking_id: &str) -> DeskResult<Settlement> {
        let booking = self.backend.get_booking(booking_id).await?;
        let summary = self.backend.get_summary(booking_id).await?;
        compute_settlement(&booking, &summary, self.config)
    }
}

/// Who triggered the command, for audit logging
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub timestamp: i64,
}

impl CommandMetadata {
    pub fn new(operator_id: impl Into<String>, operator_name: impl Into<String>) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// What an action hands back to its caller
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Server-confirmed settlement computed from the freshly re-read state
    pub settlement: Settlement,
    /// Refund entity, when the action created one
    pub refund: Option<Refund>,
}

impl ActionOutcome {
    pub fn settled(settlement: Settlement) -> Self {
        Self {
            settlement,
            refund: None,
        }
    }
}

/// A front-desk command
#[async_trait]
pub trait DeskCommand {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome>;
}

pub(crate) fn require_booking_id(booking_id: &str) -> DeskResult<()> {
    if booking_id.trim().is_empty() {
        return Err(DeskError::validation("booking id must not be empty"));
    }
    Ok(())
}
