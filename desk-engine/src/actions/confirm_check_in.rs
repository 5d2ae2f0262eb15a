//! ConfirmCheckIn command handler
//!
//! Moves a confirmed reservation into `InUse`. A room already held by
//! another stay routes to the guided reassignment branch instead of a
//! bare failure.

use async_trait::async_trait;

use crate::actions::{require_booking_id, ActionContext, ActionOutcome, CommandMetadata, DeskCommand};
use crate::backend::RoomOccupancy;
use shared::booking::BookingStatus;
use shared::error::{DeskError, DeskResult};

/// ConfirmCheckIn action
#[derive(Debug, Clone)]
pub struct ConfirmCheckInAction {
    pub booking_id: String,
    /// Room the reservation is assigned to
    pub room_id: String,
}

#[async_trait]
impl DeskCommand for ConfirmCheckInAction {
    async fn execute(
        &self,
        ctx: &ActionContext<'_>,
        metadata: &CommandMetadata,
    ) -> DeskResult<ActionOutcome> {
        // 1. Validate identifiers before any backend call
        require_booking_id(&self.booking_id)?;
        if self.room_id.trim().is_empty() {
            return Err(DeskError::validation("room id must not be empty"));
        }

        // 2. Load the latest booking state
        let booking = ctx.backend.get_booking(&self.booking_id).await?;

        // 3. Idempotent retry: already checked in means no-op, not a
        //    duplicate charge
        if booking.status == BookingStatus::InUse {
            return Ok(ActionOutcome::settled(
                ctx.fresh_settlement(&self.booking_id).await?,
            ));
        }

        // 4. Only a confirmed reservation can check in
        if booking.status != BookingStatus::Confirmed {
            return Err(DeskError::IllegalTransition {
                from: booking.status,
                to: BookingStatus::InUse,
            });
        }

        // 5. Room must be free; otherwise offer the reassignment branch
        match ctx.backend.room_occupancy(&self.room_id).await? {
            RoomOccupancy::Vacant => {}
            RoomOccupancy::Occupied { by_booking } => {
                return Err(DeskError::RoomUnavailable {
                    room_id: self.room_id.clone(),
                    reason: format!("occupied by stay {}", by_booking),
                    alternatives: ctx.backend.vacant_rooms().await?,
                });
            }
            RoomOccupancy::OverdueStay { by_booking } => {
                return Err(DeskError::RoomUnavailable {
                    room_id: self.room_id.clone(),
                    reason: format!("held by overdue stay {}", by_booking),
                    alternatives: ctx.backend.vacant_rooms().await?,
                });
            }
        }

        // 6. Commit the transition
        ctx.backend
            .update_status(&self.booking_id, BookingStatus::InUse)
            .await?;
        tracing::info!(
            booking_id = %self.booking_id,
            room_id = %self.room_id,
            operator = %metadata.operator_id,
            "check-in confirmed"
        );

        // 7. Return the server-confirmed settlement
        Ok(ActionOutcome::settled(
            ctx.fresh_settlement(&self.booking_id).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeskConfig;
    use crate::storage::InMemoryDesk;
    use chrono::NaiveDate;
    use shared::booking::Booking;

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata::new("user-1", "Test User")
    }

    fn create_test_booking(id: &str, status: BookingStatus) -> Booking {
        let mut booking = Booking::new(
            id.to_string(),
            "cust-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        );
        booking.status = status;
        booking
    }

    fn seeded_desk() -> InMemoryDesk {
        let desk = InMemoryDesk::default();
        desk.seed_room("r-101", 500_000);
        desk.seed_room("r-102", 450_000);
        desk
    }

    #[tokio::test]
    async fn test_confirm_check_in_transitions_and_settles() {
        let desk = seeded_desk();
        desk.seed_booking(create_test_booking("bk-1", BookingStatus::Confirmed), "r-101")
            .unwrap();
        let config = DeskConfig::default();
        let ctx = ActionContext::new(&desk, &config);

        let action = ConfirmCheckInAction {
            booking_id: "bk-1".to_string(),
            room_id: "r-101".to_string(),
        };
        let outcome = action.execute(&ctx, &create_test_metadata()).await.unwrap();

        assert_eq!(outcome.settlement.lifecycle_state, BookingStatus::InUse);
        assert_eq!(outcome.settlement.grand_total, 1_100_000);
    }

    #[tokio::test]
    async fn test_confirm_check_in_is_idempotent() {
        let desk = seeded_desk();
        desk.seed_booking(create_test_booking("bk-1", BookingStatus::Confirmed), "r-101")
            .unwrap();
        let config = DeskConfig::default();
        let ctx = ActionContext::new(&desk, &config);

        let action = ConfirmCheckInAction {
            booking_id: "bk-1".to_string(),
            room_id: "r-101".to_string(),
        };
        let first = action.execute(&ctx, &create_test_metadata()).await.unwrap();
        let second = action.execute(&ctx, &create_test_metadata()).await.unwrap();

        // Retry is a no-op: same totals, no duplicate charge
        assert_eq!(first.settlement.grand_total, second.settlement.grand_total);
        assert_eq!(second.settlement.grand_total, 1_100_000);
    }

    #[tokio::test]
    async fn test_confirm_check_in_occupied_room_offers_alternatives() {
        let desk = seeded_desk();
        desk.seed_booking(create_test_booking("bk-1", BookingStatus::InUse), "r-101")
            .unwrap();
        desk.seed_booking(create_test_booking("bk-2", BookingStatus::Confirmed), "r-102")
            .unwrap();
        let config = DeskConfig::default();
        let ctx = ActionContext::new(&desk, &config);

        let action = ConfirmCheckInAction {
            booking_id: "bk-2".to_string(),
            room_id: "r-101".to_string(),
        };
        let result = action.execute(&ctx, &create_test_metadata()).await;

        match result {
            Err(DeskError::RoomUnavailable {
                room_id,
                alternatives,
                ..
            }) => {
                assert_eq!(room_id, "r-101");
                assert_eq!(alternatives, vec!["r-102".to_string()]);
            }
            other => panic!("expected RoomUnavailable, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_confirm_check_in_from_pending_fails() {
        let desk = seeded_desk();
        desk.seed_booking(
            create_test_booking("bk-1", BookingStatus::PendingConfirmation),
            "r-101",
        )
        .unwrap();
        let config = DeskConfig::default();
        let ctx = ActionContext::new(&desk, &config);

        let action = ConfirmCheckInAction {
            booking_id: "bk-1".to_string(),
            room_id: "r-101".to_string(),
        };
        let result = action.execute(&ctx, &create_test_metadata()).await;
        assert!(matches!(
            result,
            Err(DeskError::IllegalTransition {
                from: BookingStatus::PendingConfirmation,
                to: BookingStatus::InUse,
            })
        ));
    }

    #[tokio::test]
    async fn test_confirm_check_in_empty_booking_id_blocked_locally() {
        let desk = seeded_desk();
        let config = DeskConfig::default();
        let ctx = ActionContext::new(&desk, &config);

        let action = ConfirmCheckInAction {
            booking_id: "  ".to_string(),
            room_id: "r-101".to_string(),
        };
        let result = action.execute(&ctx, &create_test_metadata()).await;
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }
}
