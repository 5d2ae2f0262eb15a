//! Money Normalizer - canonicalizes heterogeneous upstream records
//!
//! Upstream summaries arrive with field names split across camelCase,
//! snake_case and romanized-Vietnamese conventions (`tongTien`,
//! `soTienConLai`, `idHoaDon`). Every lookup here walks a fixed priority
//! list of alternate names and falls back to `0`/`None` instead of
//! erroring. This module performs extraction and coercion only - no
//! arithmetic. All downstream calculators operate on the canonical shape.

use rust_decimal::prelude::*;
use serde_json::Value;
use std::str::FromStr;
use shared::invoice::{Invoice, RoomChargeLine, ServiceChargeLine, ServiceLineTag};

// Alias priority lists. Order matters: the first present key wins.
const ROOM_LINES_KEYS: &[&str] = &["roomLines", "room_lines", "items", "chiTietPhong"];
const SERVICE_LINES_KEYS: &[&str] = &["serviceLines", "service_lines", "services", "danhSachDichVu"];
const MONEY_KEYS: &[&str] = &["money", "tien", "thanhToan"];
const INVOICES_KEYS: &[&str] = &["invoices", "danhSachHoaDon", "hoaDon"];

const ROOM_ID_KEYS: &[&str] = &["roomId", "room_id", "idPhong", "maPhong"];
const NIGHTLY_RATE_KEYS: &[&str] = &["nightlyRate", "nightly_rate", "donGia", "unitPrice", "gia"];
const NIGHTS_KEYS: &[&str] = &["nights", "soDem", "quantity", "soLuong"];
const PROMO_DISCOUNT_KEYS: &[&str] =
    &["promotionDiscount", "promotion_discount", "tienGiam", "khuyenMai", "discount"];
const LINE_TOTAL_KEYS: &[&str] = &["lineTotal", "line_total", "thanhTien", "total"];

const SERVICE_ID_KEYS: &[&str] =
    &["serviceId", "service_id", "idDichVu", "maDichVu", "comboId", "idCombo"];
const QUANTITY_KEYS: &[&str] = &["quantity", "soLuong", "qty"];
const UNIT_PRICE_KEYS: &[&str] = &["unitPrice", "unit_price", "donGia", "gia"];
const TAG_KEYS: &[&str] = &["tag", "feeType", "loaiPhi", "loai"];
const LABEL_KEYS: &[&str] = &["label", "name", "tenDichVu", "ten"];

const DEPOSIT_KEYS: &[&str] = &["deposit", "tienCoc", "tienDatCoc", "datCoc"];
const PAID_AMOUNT_KEYS: &[&str] =
    &["paidAmount", "paid_amount", "daTra", "soTienDaTra", "tongDaTra"];
const GRAND_TOTAL_KEYS: &[&str] =
    &["grandTotal", "grand_total", "tongTien", "tongThanhToan", "total"];
const AMOUNT_DUE_KEYS: &[&str] = &["amountDue", "amount_due", "soTienConLai", "conLai"];
const LATE_FEE_KEYS: &[&str] = &["lateFee", "late_fee", "phuThu", "phiTrePhong"];
const NOTE_KEYS: &[&str] = &["noteText", "note", "ghiChu"];
const INVOICE_ID_KEYS: &[&str] = &["id", "invoiceId", "idHoaDon", "maHoaDon"];

/// Canonical charge shape every calculator consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedCharges {
    /// Invoice id, when the summary carries one
    pub invoice_id: Option<String>,
    /// Number of invoices attached to the booking (the facade rejects > 1)
    pub invoice_count: usize,
    pub room_lines: Vec<RoomChargeLine>,
    pub service_lines: Vec<ServiceChargeLine>,
    /// Deposit as reported upstream; 0 means "not present"
    pub deposit: i64,
    pub paid_amount: i64,
    /// Grand total last persisted by the backend; None/0 is a
    /// not-yet-set placeholder, never an authoritative zero
    pub persisted_total: Option<i64>,
    /// Server-reported remaining due, kept for reconciliation checks
    pub server_amount_due: Option<i64>,
    /// Backend-authoritative late surcharge, when present
    pub backend_late_fee: Option<i64>,
    pub note_text: Option<String>,
}

impl NormalizedCharges {
    /// Build the canonical shape from an already-typed invoice
    ///
    /// Feeds the same settlement pipeline as the raw path so no second
    /// code path exists.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: Some(invoice.id.clone()),
            invoice_count: 1,
            room_lines: invoice.room_lines.clone(),
            service_lines: invoice.service_lines.clone(),
            deposit: 0,
            paid_amount: invoice.paid_amount,
            persisted_total: Some(invoice.grand_total),
            server_amount_due: None,
            backend_late_fee: None,
            note_text: None,
        }
    }
}

/// Normalize a raw summary document into the canonical charge shape
pub fn normalize_summary(raw: &Value) -> NormalizedCharges {
    let money = pick(raw, MONEY_KEYS);
    let invoices = pick(raw, INVOICES_KEYS).and_then(Value::as_array);
    let first_invoice = invoices.and_then(|list| list.first());

    // Lookup order for monetary scalars: money block, first invoice, root.
    let scopes: Vec<&Value> = [money, first_invoice, Some(raw)]
        .into_iter()
        .flatten()
        .collect();

    NormalizedCharges {
        invoice_id: first_invoice.and_then(|inv| pick_string(inv, INVOICE_ID_KEYS)),
        invoice_count: invoices.map(Vec::len).unwrap_or(0),
        room_lines: pick(raw, ROOM_LINES_KEYS)
            .and_then(Value::as_array)
            .map(|lines| lines.iter().map(normalize_room_line).collect())
            .unwrap_or_default(),
        service_lines: pick(raw, SERVICE_LINES_KEYS)
            .and_then(Value::as_array)
            .map(|lines| lines.iter().map(normalize_service_line).collect())
            .unwrap_or_default(),
        deposit: pick_amount_scoped(&scopes, DEPOSIT_KEYS).unwrap_or(0),
        paid_amount: pick_amount_scoped(&scopes, PAID_AMOUNT_KEYS).unwrap_or(0),
        persisted_total: pick_amount_scoped(&scopes, GRAND_TOTAL_KEYS),
        server_amount_due: pick_amount_scoped(&scopes, AMOUNT_DUE_KEYS),
        backend_late_fee: pick_amount_scoped(&scopes, LATE_FEE_KEYS),
        note_text: pick_string(raw, NOTE_KEYS),
    }
}

fn normalize_room_line(raw: &Value) -> RoomChargeLine {
    let nightly_rate = pick_amount(raw, NIGHTLY_RATE_KEYS);
    match nightly_rate {
        Some(rate) => RoomChargeLine {
            room_id: pick_string(raw, ROOM_ID_KEYS).unwrap_or_default(),
            nightly_rate: rate,
            nights: pick_count(raw, NIGHTS_KEYS).unwrap_or(1),
            promotion_discount: pick_amount(raw, PROMO_DISCOUNT_KEYS).unwrap_or(0).max(0),
        },
        // Rate missing: carry the pre-computed line total as a one-night
        // line so the amount survives canonicalization.
        None => RoomChargeLine {
            room_id: pick_string(raw, ROOM_ID_KEYS).unwrap_or_default(),
            nightly_rate: pick_amount(raw, LINE_TOTAL_KEYS).unwrap_or(0),
            nights: 1,
            promotion_discount: 0,
        },
    }
}

fn normalize_service_line(raw: &Value) -> ServiceChargeLine {
    ServiceChargeLine {
        service_id: pick_string(raw, SERVICE_ID_KEYS).unwrap_or_default(),
        quantity: pick_count(raw, QUANTITY_KEYS).unwrap_or(1),
        unit_price: pick_amount(raw, UNIT_PRICE_KEYS)
            .or_else(|| pick_amount(raw, LINE_TOTAL_KEYS))
            .unwrap_or(0),
        tag: pick_string(raw, TAG_KEYS)
            .map(|s| normalize_tag(&s))
            .unwrap_or(ServiceLineTag::Generic),
        label: pick_string(raw, LABEL_KEYS),
    }
}

/// Map an upstream tag string onto the canonical routing tag
fn normalize_tag(raw: &str) -> ServiceLineTag {
    let upper = raw.trim().to_uppercase();
    if upper.contains("EXTENSION") || upper.contains("GIA_HAN") || upper.contains("GIAHAN") {
        ServiceLineTag::ExtensionFee
    } else if upper.contains("LATE") || upper.contains("TRE") {
        ServiceLineTag::LateFee
    } else {
        ServiceLineTag::Generic
    }
}

/// First non-null value present under any of the candidate keys
fn pick<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

fn pick_string(obj: &Value, keys: &[&str]) -> Option<String> {
    match pick(obj, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value to whole minor units
///
/// Integers pass through; floats round half-up; numeric strings parse.
fn coerce_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(v)
            } else {
                n.as_f64()
                    .and_then(Decimal::from_f64)
                    .map(crate::money::to_minor)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                Some(v)
            } else {
                Decimal::from_str(trimmed).ok().map(crate::money::to_minor)
            }
        }
        _ => None,
    }
}

fn pick_amount(obj: &Value, keys: &[&str]) -> Option<i64> {
    pick(obj, keys).and_then(coerce_amount)
}

fn pick_count(obj: &Value, keys: &[&str]) -> Option<u32> {
    pick_amount(obj, keys).and_then(|v| u32::try_from(v).ok())
}

/// Walk the scope chain (money block, invoice, root) for a scalar
fn pick_amount_scoped(scopes: &[&Value], keys: &[&str]) -> Option<i64> {
    scopes.iter().find_map(|scope| pick_amount(scope, keys))
}
