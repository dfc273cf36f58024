use serde::{Deserialize, Serialize};

use crate::availability::Slot;

// ── Database models ──

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub duration_min: i64,
    pub is_active: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Barber {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub is_active: bool,
    pub sort_order: i64,
}

/// One weekday's recurring window for a barber. At most one row per
/// (barber, day_of_week); `is_available = false` closes that weekday
/// regardless of the times.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleEntry {
    pub id: i64,
    pub barber_id: i64,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// One-off full-day closure for a barber, overriding the weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockedDate {
    pub id: i64,
    pub barber_id: i64,
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessHours {
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub service_id: i64,
    pub barber_id: i64,
    pub client_tg_id: i64,
    pub client_username: Option<String>,
    pub client_first_name: String,
    pub date: String,
    pub start_time: String,
    pub duration_min: i64,
    /// pending_payment | confirmed | completed | cancelled | expired
    pub status: String,
    /// none | pending | paid | refunded
    pub payment_status: String,
    pub yookassa_payment_id: Option<String>,
    pub prepaid_amount: i64,
    /// Root of the reschedule chain this row belongs to, if any.
    pub original_booking_id: Option<i64>,
    pub reschedule_count: i64,
    pub reminder_sent: bool,
    pub created_at: String,
    pub cancelled_at: Option<String>,
}

// ── API request/response types ──

#[derive(Debug, Deserialize)]
pub struct AvailableTimesQuery {
    pub date: String,
    pub service_id: i64,
    /// Omitted: "any barber" mode across all active barbers.
    pub barber_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AvailableTimesResponse {
    pub date: String,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
    pub service_id: i64,
    pub barber_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: String,
    pub bookable: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: i64,
    pub barber_id: Option<i64>,
    pub date: String,
    pub start_time: String,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking: BookingDetail,
    pub payment_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub message: String,
    pub refund_info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingStatusResponse {
    pub status: String,
    pub payment_status: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BookingDetail {
    pub id: i64,
    pub service_name: String,
    pub service_price: i64,
    pub barber_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub client_tg_id: i64,
    pub client_username: Option<String>,
    pub client_first_name: String,
    pub status: String,
    pub payment_status: String,
    pub prepaid_amount: i64,
    pub reschedule_count: i64,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_min: i64,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_min: Option<i64>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBarberRequest {
    pub name: String,
    pub bio: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBarberRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleEntryInput {
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Full replacement of a barber's weekly schedule.
#[derive(Debug, Deserialize)]
pub struct UpsertScheduleRequest {
    pub entries: Vec<ScheduleEntryInput>,
}

#[derive(Debug, Deserialize)]
pub struct BlockDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BusinessHoursInput {
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_open: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBusinessHoursRequest {
    pub entries: Vec<BusinessHoursInput>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Telegram auth ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

// ── YooKassa webhook payload ──

#[derive(Debug, Deserialize)]
pub struct YooKassaWebhookEvent {
    pub event: String,
    pub object: YooKassaPaymentObject,
}

#[derive(Debug, Deserialize)]
pub struct YooKassaPaymentObject {
    pub id: String,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
}
