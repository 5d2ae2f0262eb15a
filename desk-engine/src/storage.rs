//! In-memory reference backend
//!
//! Implements `BookingBackend` against process-local state. Used by the
//! action test suites and as the executable model of the contract a real
//! persistence layer must honor: one invoice per booking, and mutations
//! serialized per booking through a lock table so concurrent operations
//! against the same booking never interleave their read-modify-write of
//! the invoice.
//!
//! Summaries are rendered under rotating field-name conventions
//! (camelCase, romanized-Vietnamese, snake_case) so the normalizer is
//! exercised on every read, the way mixed upstream endpoints would.

use crate::backend::{BookingBackend, ExtendOutcome, ReassignOutcome, RoomOccupancy};
use crate::config::DeskConfig;
use crate::lifecycle;
use crate::money::{self, to_decimal, to_minor};
use crate::settlement::calculators::extension_fee;
use crate::settlement::compute_from_invoice;
use async_trait::async_trait;
use chrono::NaiveTime;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use shared::booking::{Booking, BookingStatus, PaymentStatus};
use shared::error::{DeskError, DeskResult};
use shared::invoice::{Invoice, InvoiceStatus, Refund, ServiceChargeLine, ServiceLineTag};
use shared::request::{ExtendMode, ExtendStayInput, RefundInput, ServiceLineInput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct RoomState {
    nightly_rate: i64,
    occupied_by: Option<String>,
    overdue: bool,
}

#[derive(Debug, Clone)]
struct DeskRecord {
    booking: Booking,
    invoice: Option<Invoice>,
    room_id: Option<String>,
    refunds: Vec<Refund>,
}

/// Process-local backend with a per-booking lock table
pub struct InMemoryDesk {
    config: DeskConfig,
    records: DashMap<String, Arc<Mutex<DeskRecord>>>,
    rooms: DashMap<String, RoomState>,
    convention: AtomicUsize,
}

impl InMemoryDesk {
    pub fn new(config: DeskConfig) -> Self {
        Self {
            config,
            records: DashMap::new(),
            rooms: DashMap::new(),
            convention: AtomicUsize::new(0),
        }
    }

    pub fn seed_room(&self, room_id: &str, nightly_rate: i64) {
        self.rooms.insert(
            room_id.to_string(),
            RoomState {
                nightly_rate,
                occupied_by: None,
                overdue: false,
            },
        );
    }

    /// Seed a booking assigned to a room, with its single invoice
    pub fn seed_booking(&self, booking: Booking, room_id: &str) -> DeskResult<()> {
        let rate = self
            .rooms
            .get(room_id)
            .map(|room| room.nightly_rate)
            .ok_or_else(|| DeskError::validation(format!("unknown room: {}", room_id)))?;

        let mut invoice = Invoice::new(
            uuid::Uuid::new_v4().to_string(),
            booking.id.clone(),
        );
        invoice.room_lines.push(shared::invoice::RoomChargeLine {
            room_id: room_id.to_string(),
            nightly_rate: rate,
            nights: booking.nights,
            promotion_discount: 0,
        });

        if booking.status.is_occupying()
            && let Some(mut room) = self.rooms.get_mut(room_id)
        {
            room.occupied_by = Some(booking.id.clone());
            room.overdue = booking.status == BookingStatus::Overdue;
        }

        let mut record = DeskRecord {
            booking,
            invoice: Some(invoice),
            room_id: Some(room_id.to_string()),
            refunds: Vec::new(),
        };
        Self::refresh_totals(&mut record, &self.config);
        self.records
            .insert(record.booking.id.clone(), Arc::new(Mutex::new(record)));
        Ok(())
    }

    fn record(&self, booking_id: &str) -> DeskResult<Arc<Mutex<DeskRecord>>> {
        self.records
            .get(booking_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DeskError::BookingNotFound(booking_id.to_string()))
    }

    /// Recompute and persist the invoice grand total
    ///
    /// The stale total is cleared first so the tie-break cannot echo it
    /// back as "persisted".
    fn refresh_totals(record: &mut DeskRecord, config: &DeskConfig) {
        let Some(mut invoice) = record.invoice.take() else {
            return;
        };
        invoice.grand_total = 0;
        if let Ok(settlement) = compute_from_invoice(&record.booking, &invoice, config) {
            invoice.grand_total = settlement.grand_total;
        }
        record.invoice = Some(invoice);
    }

    /// Refunds recorded against a booking's invoice
    pub async fn refunds(&self, booking_id: &str) -> DeskResult<Vec<Refund>> {
        let record = self.record(booking_id)?;
        let guard = record.lock().await;
        Ok(guard.refunds.clone())
    }

    fn vacant_list(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().occupied_by.is_none())
            .map(|entry| entry.key().clone())
            .collect();
        rooms.sort();
        rooms
    }

    fn free_room(&self, room_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.occupied_by = None;
            room.overdue = false;
        }
    }

    /// Render the summary under one of the rotating naming conventions
    fn render_summary(&self, record: &DeskRecord) -> Value {
        let style = self.convention.fetch_add(1, Ordering::Relaxed) % 3;
        let booking = &record.booking;
        let invoice = record.invoice.as_ref();

        let late_total: i64 = invoice
            .map(|inv| {
                inv.lines_tagged(ServiceLineTag::LateFee)
                    .map(ServiceChargeLine::line_total)
                    .sum()
            })
            .unwrap_or(0);

        let room_lines: Vec<Value> = invoice
            .map(|inv| {
                inv.room_lines
                    .iter()
                    .map(|line| match style {
                        0 => json!({
                            "roomId": line.room_id,
                            "nightlyRate": line.nightly_rate,
                            "nights": line.nights,
                            "promotionDiscount": line.promotion_discount,
                        }),
                        1 => json!({
                            "idPhong": line.room_id,
                            "donGia": line.nightly_rate,
                            "soDem": line.nights,
                            "tienGiam": line.promotion_discount,
                        }),
                        _ => json!({
                            "room_id": line.room_id,
                            "nightly_rate": line.nightly_rate,
                            "nights": line.nights,
                            "promotion_discount": line.promotion_discount,
                        }),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let service_lines: Vec<Value> = invoice
            .map(|inv| {
                inv.service_lines
                    .iter()
                    .map(|line| {
                        let mut obj = Map::new();
                        match style {
                            0 => {
                                obj.insert("serviceId".into(), json!(line.service_id));
                                obj.insert("quantity".into(), json!(line.quantity));
                                obj.insert("unitPrice".into(), json!(line.unit_price));
                                obj.insert("tag".into(), json!(tag_wire(line.tag, style)));
                            }
                            1 => {
                                obj.insert("idDichVu".into(), json!(line.service_id));
                                obj.insert("soLuong".into(), json!(line.quantity));
                                obj.insert("donGia".into(), json!(line.unit_price));
                                if line.tag != ServiceLineTag::Generic {
                                    obj.insert("loaiPhi".into(), json!(tag_wire(line.tag, style)));
                                }
                            }
                            _ => {
                                obj.insert("service_id".into(), json!(line.service_id));
                                obj.insert("qty".into(), json!(line.quantity));
                                obj.insert("unit_price".into(), json!(line.unit_price));
                                obj.insert("tag".into(), json!(tag_wire(line.tag, style)));
                            }
                        }
                        if let Some(label) = &line.label {
                            let key = if style == 1 { "tenDichVu" } else { "label" };
                            obj.insert(key.into(), json!(label));
                        }
                        Value::Object(obj)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let paid = invoice.map(|inv| inv.paid_amount).unwrap_or(0);
        let grand = invoice.map(|inv| inv.grand_total).unwrap_or(0);
        let invoices: Vec<Value> = invoice
            .map(|inv| {
                let id_key = match style {
                    0 => "id",
                    1 => "idHoaDon",
                    _ => "invoiceId",
                };
                vec![json!({ id_key: inv.id })]
            })
            .unwrap_or_default();

        match style {
            0 => json!({
                "roomLines": room_lines,
                "serviceLines": service_lines,
                "money": {
                    "deposit": booking.deposit,
                    "paidAmount": paid,
                    "grandTotal": grand,
                    "lateFee": late_total,
                },
                "invoices": invoices,
                "noteText": booking.notes,
            }),
            1 => json!({
                "chiTietPhong": room_lines,
                "danhSachDichVu": service_lines,
                "tien": {
                    "tienCoc": booking.deposit,
                    "soTienDaTra": paid,
                    "tongTien": grand,
                    "phuThu": late_total,
                },
                "danhSachHoaDon": invoices,
                "ghiChu": booking.notes,
            }),
            _ => json!({
                "room_lines": room_lines,
                "service_lines": service_lines,
                "money": {
                    "deposit": booking.deposit,
                    "paid_amount": paid,
                    "grand_total": grand,
                    "late_fee": late_total,
                },
                "invoices": invoices,
                "note": booking.notes,
            }),
        }
    }
}

fn tag_wire(tag: ServiceLineTag, style: usize) -> &'static str {
    match (tag, style) {
        (ServiceLineTag::ExtensionFee, 1) => "GIA_HAN",
        (ServiceLineTag::LateFee, 1) => "PHU_THU_TRE",
        (ServiceLineTag::ExtensionFee, _) => "EXTENSION_FEE",
        (ServiceLineTag::LateFee, _) => "LATE_FEE",
        (ServiceLineTag::Generic, _) => "GENERIC",
    }
}

impl Default for InMemoryDesk {
    fn default() -> Self {
        Self::new(DeskConfig::default())
    }
}

#[async_trait]
impl BookingBackend for InMemoryDesk {
    async fn get_booking(&self, booking_id: &str) -> DeskResult<Booking> {
        let record = self.record(booking_id)?;
        let guard = record.lock().await;
        Ok(guard.booking.clone())
    }

    async fn get_summary(&self, booking_id: &str) -> DeskResult<Value> {
        let record = self.record(booking_id)?;
        let guard = record.lock().await;
        Ok(self.render_summary(&guard))
    }

    async fn room_occupancy(&self, room_id: &str) -> DeskResult<RoomOccupancy> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| DeskError::validation(format!("unknown room: {}", room_id)))?;
        Ok(match &room.occupied_by {
            None => RoomOccupancy::Vacant,
            Some(holder) if room.overdue => RoomOccupancy::OverdueStay {
                by_booking: holder.clone(),
            },
            Some(holder) => RoomOccupancy::Occupied {
                by_booking: holder.clone(),
            },
        })
    }

    async fn vacant_rooms(&self) -> DeskResult<Vec<String>> {
        Ok(self.vacant_list())
    }

    async fn create_invoice(&self, booking_id: &str, payment_method: &str) -> DeskResult<String> {
        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;

        // Locate-before-create: the 1:1 invariant makes this idempotent.
        if let Some(invoice) = &guard.invoice {
            return Ok(invoice.id.clone());
        }

        tracing::debug!(booking_id, payment_method, "creating invoice");
        let mut invoice = Invoice::new(uuid::Uuid::new_v4().to_string(), booking_id.to_string());
        if let Some(room_id) = &guard.room_id
            && let Some(room) = self.rooms.get(room_id)
        {
            invoice.room_lines.push(shared::invoice::RoomChargeLine {
                room_id: room_id.clone(),
                nightly_rate: room.nightly_rate,
                nights: guard.booking.nights,
                promotion_discount: 0,
            });
        }
        let id = invoice.id.clone();
        guard.invoice = Some(invoice);
        Self::refresh_totals(&mut guard, &self.config);
        Ok(id)
    }

    async fn add_service_lines(
        &self,
        booking_id: &str,
        lines: &[ServiceLineInput],
    ) -> DeskResult<()> {
        for line in lines {
            money::validate_service_line(line)?;
        }
        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;
        let invoice = guard
            .invoice
            .as_mut()
            .ok_or_else(|| DeskError::InvoiceNotFound(booking_id.to_string()))?;
        for line in lines {
            invoice.service_lines.push(ServiceChargeLine {
                service_id: line.service_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                tag: line.tag,
                label: line.label.clone(),
            });
        }
        Self::refresh_totals(&mut guard, &self.config);
        Ok(())
    }

    async fn confirm_paid(&self, booking_id: &str, amount: i64) -> DeskResult<()> {
        if amount <= 0 {
            return Err(DeskError::validation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }
        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;
        let deposit = guard.booking.deposit;
        let invoice = guard
            .invoice
            .as_mut()
            .ok_or_else(|| DeskError::InvoiceNotFound(booking_id.to_string()))?;
        invoice.paid_amount += amount;
        let settled = invoice.paid_amount + deposit >= invoice.grand_total;
        if settled {
            guard.booking.payment_status = PaymentStatus::Paid;
        }
        Ok(())
    }

    async fn reassign_room(
        &self,
        booking_id: &str,
        new_room_id: &str,
    ) -> DeskResult<ReassignOutcome> {
        let new_rate = {
            let room = self.rooms.get(new_room_id).ok_or_else(|| {
                DeskError::validation(format!("unknown room: {}", new_room_id))
            })?;
            if let Some(holder) = &room.occupied_by
                && holder.as_str() != booking_id
            {
                return Err(DeskError::RoomUnavailable {
                    room_id: new_room_id.to_string(),
                    reason: if room.overdue {
                        format!("held by overdue stay {}", holder)
                    } else {
                        format!("occupied by stay {}", holder)
                    },
                    alternatives: self.vacant_list(),
                });
            }
            room.nightly_rate
        };

        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;

        let old_room = guard.room_id.clone();
        let old_grand = guard.invoice.as_ref().map(|inv| inv.grand_total).unwrap_or(0);
        let nights = guard.booking.nights;

        {
            let invoice = guard
                .invoice
                .as_mut()
                .ok_or_else(|| DeskError::InvoiceNotFound(booking_id.to_string()))?;
            // Room lines are replaced, never appended, on reassignment.
            invoice.room_lines = vec![shared::invoice::RoomChargeLine {
                room_id: new_room_id.to_string(),
                nightly_rate: new_rate,
                nights,
                promotion_discount: 0,
            }];
        }
        guard.room_id = Some(new_room_id.to_string());
        Self::refresh_totals(&mut guard, &self.config);

        // Move occupancy with the guest.
        if guard.booking.status.is_occupying() {
            if let Some(old) = &old_room {
                self.free_room(old);
            }
            if let Some(mut room) = self.rooms.get_mut(new_room_id) {
                room.occupied_by = Some(booking_id.to_string());
                room.overdue = guard.booking.status == BookingStatus::Overdue;
            }
        }

        let invoice = guard
            .invoice
            .as_ref()
            .ok_or_else(|| DeskError::InvoiceNotFound(booking_id.to_string()))?;
        let collected = guard.booking.deposit + invoice.paid_amount;
        let excess = collected - invoice.grand_total;
        Ok(ReassignOutcome {
            new_room_id: new_room_id.to_string(),
            grand_total: invoice.grand_total,
            price_delta: invoice.grand_total - old_grand,
            refund_amount: (excess > 0).then_some(excess),
        })
    }

    async fn extend_stay(
        &self,
        booking_id: &str,
        request: &ExtendStayInput,
    ) -> DeskResult<ExtendOutcome> {
        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;

        if guard.booking.status != BookingStatus::InUse {
            return Err(DeskError::validation(format!(
                "only an in-progress stay can be extended, booking is {:?}",
                guard.booking.status
            )));
        }

        let rate = guard
            .room_id
            .as_ref()
            .and_then(|room_id| self.rooms.get(room_id))
            .map(|room| room.nightly_rate)
            .ok_or_else(|| DeskError::validation("booking has no room assigned"))?;

        let standard =
            NaiveTime::from_hms_opt(self.config.standard_checkout_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let old_checkout = guard.booking.date_check_out.and_time(standard);

        let new_checkout = match request.mode {
            ExtendMode::ExtraNights { nights } => {
                if nights == 0 {
                    return Err(DeskError::validation("extension must add at least one night"));
                }
                (guard.booking.date_check_out + chrono::Duration::days(i64::from(nights)))
                    .and_time(standard)
            }
            ExtendMode::LateCheckout { new_hour } => {
                let time = NaiveTime::from_hms_opt(new_hour, 0, 0).ok_or_else(|| {
                    DeskError::validation(format!("invalid checkout hour: {}", new_hour))
                })?;
                guard.booking.date_check_out.and_time(time)
            }
        };

        let fee = extension_fee(old_checkout, new_checkout, rate, None, &self.config)?;
        if fee > 0 {
            let invoice = guard
                .invoice
                .as_mut()
                .ok_or_else(|| DeskError::InvoiceNotFound(booking_id.to_string()))?;
            invoice.service_lines.push(ServiceChargeLine {
                service_id: "stay-extension".to_string(),
                quantity: 1,
                unit_price: fee,
                tag: ServiceLineTag::ExtensionFee,
                label: Some("Stay extension".to_string()),
            });
            // Only the checkout date moves; the added nights are billed
            // through the tagged fee line, not by growing the room lines.
            if let ExtendMode::ExtraNights { nights } = request.mode {
                guard.booking.date_check_out =
                    guard.booking.date_check_out + chrono::Duration::days(i64::from(nights));
                guard.booking.updated_at = chrono::Utc::now().timestamp_millis();
            }
            Self::refresh_totals(&mut guard, &self.config);
        }

        let grand = guard.invoice.as_ref().map(|inv| inv.grand_total).unwrap_or(0);
        // VAT portion baked into the inclusive fee: fee * rate / (1 + rate)
        let vat_amount = to_minor(
            to_decimal(fee) * self.config.vat_rate
                / (rust_decimal::Decimal::ONE + self.config.vat_rate),
        );
        Ok(ExtendOutcome {
            new_checkout,
            grand_total: grand,
            extension_fee: fee,
            vat_amount,
        })
    }

    async fn update_status(&self, booking_id: &str, status: BookingStatus) -> DeskResult<()> {
        let record = self.record(booking_id)?;
        let mut guard = record.lock().await;
        lifecycle::transition(&mut guard.booking, status)?;

        if let Some(room_id) = guard.room_id.clone() {
            match status {
                BookingStatus::InUse => {
                    if let Some(mut room) = self.rooms.get_mut(&room_id) {
                        room.occupied_by = Some(booking_id.to_string());
                        room.overdue = false;
                    }
                }
                BookingStatus::Overdue => {
                    if let Some(mut room) = self.rooms.get_mut(&room_id) {
                        room.overdue = true;
                    }
                }
                BookingStatus::Completed | BookingStatus::Cancelled => {
                    self.free_room(&room_id);
                    if let Some(invoice) = &mut guard.invoice
                        && status == BookingStatus::Completed
                    {
                        invoice.status = InvoiceStatus::Settled;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn record_refund(&self, refund: &RefundInput) -> DeskResult<Refund> {
        money::validate_refund(refund)?;

        // Locate the booking owning this invoice.
        let records: Vec<Arc<Mutex<DeskRecord>>> = self
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for record in records {
            let mut guard = record.lock().await;
            let Some(invoice) = &mut guard.invoice else {
                continue;
            };
            if invoice.id != refund.invoice_ref {
                continue;
            }

            invoice.paid_amount = (invoice.paid_amount - refund.amount).max(0);
            invoice.status = InvoiceStatus::Refunded;
            let entity = Refund {
                id: uuid::Uuid::new_v4().to_string(),
                invoice_ref: refund.invoice_ref.clone(),
                amount: refund.amount,
                reason: refund.reason.clone(),
                method: refund.method.clone(),
                date: refund.date,
                created_at: chrono::Utc::now().timestamp_millis(),
            };
            guard.refunds.push(entity.clone());
            tracing::info!(
                invoice_ref = %refund.invoice_ref,
                amount = refund.amount,
                "refund recorded"
            );
            return Ok(entity);
        }
        Err(DeskError::InvoiceNotFound(refund.invoice_ref.clone()))
    }
}
