//! End-to-end settlement flows against the in-memory backend
//!
//! Every flow finishes by asserting on the one `Settlement` value the
//! facade produced - no test re-derives totals on its own.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use desk_engine::actions::{
    ActionContext, AddServiceAction, CheckoutAction, CommandMetadata, ConfirmCheckInAction,
    DeskCommand, ExtendStayAction, MarkOverdueAction, ReassignRoomAction, RefundAction,
};
use desk_engine::backend::BookingBackend;
use desk_engine::normalize::normalize_summary;
use desk_engine::settlement::compute_settlement;
use desk_engine::storage::InMemoryDesk;
use desk_engine::DeskConfig;
use shared::booking::{Booking, BookingStatus};
use shared::invoice::ServiceLineTag;
use shared::request::{CheckoutInput, ExtendMode, ExtendStayInput, RefundInput, ServiceLineInput};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("desk_engine=debug")
        .with_test_writer()
        .try_init();
}

fn metadata() -> CommandMetadata {
    CommandMetadata::new("op-1", "Front Desk")
}

fn booking(id: &str, status: BookingStatus) -> Booking {
    let mut booking = Booking::new(
        id.to_string(),
        "cust-1".to_string(),
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
    );
    booking.status = status;
    booking
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn seeded_desk() -> InMemoryDesk {
    let desk = InMemoryDesk::default();
    desk.seed_room("r-101", 500_000);
    desk.seed_room("r-201", 400_000);
    desk.seed_room("r-301", 600_000);
    desk
}

#[tokio::test]
async fn full_stay_with_service_and_checkout() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    let mut bk = booking("bk-1", BookingStatus::Confirmed);
    bk.deposit = 200_000;
    desk.seed_booking(bk, "r-101")?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    // Check in
    let outcome = ConfirmCheckInAction {
        booking_id: "bk-1".to_string(),
        room_id: "r-101".to_string(),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.grand_total, 1_100_000);
    assert_eq!(outcome.settlement.amount_due, 900_000); // scenario C

    // Add a 150,000 service
    let outcome = AddServiceAction {
        booking_id: "bk-1".to_string(),
        lines: vec![ServiceLineInput {
            service_id: "svc-spa".to_string(),
            quantity: 1,
            unit_price: 150_000,
            tag: ServiceLineTag::Generic,
            label: Some("Spa".to_string()),
        }],
        payment_method: "CASH".to_string(),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.grand_total, 1_265_000); // scenario B
    assert_eq!(outcome.settlement.amount_due, 1_065_000);

    // Pay the remainder at checkout
    let outcome = CheckoutAction {
        booking_id: "bk-1".to_string(),
        input: CheckoutInput {
            payment_method: "CARD".to_string(),
            amount: 1_065_000,
            tendered: None,
        },
        actual_time: at(12, 11),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.lifecycle_state, BookingStatus::Completed);
    assert_eq!(outcome.settlement.amount_due, 0);
    assert_eq!(outcome.settlement.refund_due, 0);
    Ok(())
}

#[tokio::test]
async fn reassignment_refund_round_trip() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;
    desk.confirm_paid("bk-1", 1_100_000).await?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    // Scenario D: move to the cheaper room after paying in full
    let outcome = ReassignRoomAction {
        booking_id: "bk-1".to_string(),
        new_room_id: "r-201".to_string(),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.refund_due, 220_000);
    assert_eq!(outcome.settlement.amount_due, 0);

    // Return the excess
    let summary = desk.get_summary("bk-1").await?;
    let invoice_ref = normalize_summary(&summary).invoice_id.unwrap();
    let outcome = RefundAction {
        booking_id: "bk-1".to_string(),
        input: RefundInput {
            invoice_ref,
            amount: 220_000,
            reason: "room downgrade".to_string(),
            method: "CASH".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 11).unwrap(),
        },
    }
    .execute(&ctx, &metadata())
    .await?;
    assert!(outcome.refund.is_some());
    assert!(outcome.settlement.is_settled());
    Ok(())
}

#[tokio::test]
async fn extension_then_checkout_keeps_fee_branch() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    let outcome = ExtendStayAction {
        booking_id: "bk-1".to_string(),
        input: ExtendStayInput {
            mode: ExtendMode::ExtraNights { nights: 1 },
            payment_method: "CASH".to_string(),
        },
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.extension_fee, 500_000);
    assert_eq!(outcome.settlement.late_fee, 0);
    assert_eq!(outcome.settlement.grand_total, 1_600_000);

    // Checkout on the extended date: extension survives, no late fee
    let outcome = CheckoutAction {
        booking_id: "bk-1".to_string(),
        input: CheckoutInput {
            payment_method: "CARD".to_string(),
            amount: 1_600_000,
            tendered: None,
        },
        actual_time: at(13, 11),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.extension_fee, 500_000);
    assert_eq!(outcome.settlement.late_fee, 0);
    assert!(outcome.settlement.is_settled());
    Ok(())
}

#[tokio::test]
async fn overdue_checkout_charges_penalty_not_extension() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    MarkOverdueAction {
        booking_id: "bk-1".to_string(),
        now: at(12, 14),
    }
    .execute(&ctx, &metadata())
    .await?;

    // 2h late: 30% of 500,000 = 150,000, added after VAT
    let outcome = CheckoutAction {
        booking_id: "bk-1".to_string(),
        input: CheckoutInput {
            payment_method: "CASH".to_string(),
            amount: 1_250_000,
            tendered: None,
        },
        actual_time: at(12, 14),
    }
    .execute(&ctx, &metadata())
    .await?;
    assert_eq!(outcome.settlement.late_fee, 150_000);
    assert_eq!(outcome.settlement.extension_fee, 0);
    assert_eq!(outcome.settlement.vat, 100_000);
    assert!(outcome.settlement.is_settled());
    Ok(())
}

#[tokio::test]
async fn every_trigger_path_reads_the_same_numbers() -> Result<()> {
    // Payment modal, checkout modal, reassignment flow and extension flow
    // all call the same facade; repeated reads (across rotating upstream
    // naming conventions) must agree byte for byte.
    init_tracing();
    let desk = seeded_desk();
    let mut bk = booking("bk-1", BookingStatus::InUse);
    bk.deposit = 200_000;
    desk.seed_booking(bk, "r-101")?;
    let config = DeskConfig::default();

    let booking = desk.get_booking("bk-1").await?;
    let mut fingerprints = Vec::new();
    for _ in 0..6 {
        let summary = desk.get_summary("bk-1").await?;
        let settlement = compute_settlement(&booking, &summary, &config)?;
        fingerprints.push(settlement.fingerprint());
    }
    fingerprints.dedup();
    assert_eq!(fingerprints.len(), 1, "trigger paths disagreed");
    Ok(())
}

#[tokio::test]
async fn concurrent_mutations_serialize_per_booking() -> Result<()> {
    init_tracing();
    let desk = std::sync::Arc::new(seeded_desk());
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;

    // A service addition racing a second service addition: both must
    // land, no interleaved read-modify-write may drop a line.
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let desk = std::sync::Arc::clone(&desk);
            tokio::spawn(async move {
                desk.add_service_lines(
                    "bk-1",
                    &[ServiceLineInput {
                        service_id: format!("svc-{}", i),
                        quantity: 1,
                        unit_price: 10_000,
                        tag: ServiceLineTag::Generic,
                        label: None,
                    }],
                )
                .await
            })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    let config = DeskConfig::default();
    let booking = desk.get_booking("bk-1").await?;
    let summary = desk.get_summary("bk-1").await?;
    let settlement = compute_settlement(&booking, &summary, &config)?;
    // 8 x 10,000 on top of 1,000,000 room, all taxed once
    assert_eq!(settlement.subtotal, 1_080_000);
    assert_eq!(settlement.grand_total, 1_188_000);
    Ok(())
}

#[tokio::test]
async fn due_and_refund_never_both_positive_across_flows() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    let mut snapshots = Vec::new();
    snapshots.push(ctx.fresh_settlement("bk-1").await?);

    desk.confirm_paid("bk-1", 1_100_000).await?;
    snapshots.push(ctx.fresh_settlement("bk-1").await?);

    ReassignRoomAction {
        booking_id: "bk-1".to_string(),
        new_room_id: "r-301".to_string(),
    }
    .execute(&ctx, &metadata())
    .await?;
    snapshots.push(ctx.fresh_settlement("bk-1").await?);

    ReassignRoomAction {
        booking_id: "bk-1".to_string(),
        new_room_id: "r-201".to_string(),
    }
    .execute(&ctx, &metadata())
    .await?;
    snapshots.push(ctx.fresh_settlement("bk-1").await?);

    for settlement in &snapshots {
        assert!(
            settlement.amount_due == 0 || settlement.refund_due == 0,
            "both positive: due={} refund={}",
            settlement.amount_due,
            settlement.refund_due
        );
        assert!(settlement.room_total >= 0);
        assert!(settlement.service_total >= 0);
    }
    Ok(())
}

#[tokio::test]
async fn retry_after_checkout_is_rejected_without_side_effects() -> Result<()> {
    init_tracing();
    let desk = seeded_desk();
    desk.seed_booking(booking("bk-1", BookingStatus::InUse), "r-101")?;
    let config = DeskConfig::default();
    let ctx = ActionContext::new(&desk, &config);

    let checkout = CheckoutAction {
        booking_id: "bk-1".to_string(),
        input: CheckoutInput {
            payment_method: "CASH".to_string(),
            amount: 1_100_000,
            tendered: None,
        },
        actual_time: at(12, 11),
    };
    let first = checkout.execute(&ctx, &metadata()).await?;
    assert!(first.settlement.is_settled());

    // A second submission must fail fast and charge nothing
    let retry = checkout.execute(&ctx, &metadata()).await;
    assert!(retry.is_err());
    let after = ctx.fresh_settlement("bk-1").await?;
    assert_eq!(after.paid_amount, first.settlement.paid_amount);
    assert_eq!(after.fingerprint(), first.settlement.fingerprint());
    Ok(())
}
