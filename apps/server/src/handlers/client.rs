use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    auth,
    availability::{self, BookedInterval, SlotPolicy},
    clock, db,
    models::*,
    telegram, AppState,
};

// ── Constants ──

/// Prepayment amount in RUB.
const PREPAID_AMOUNT: i64 = 500;

/// Maximum reschedules per booking chain.
const MAX_RESCHEDULES: i64 = 3;

// ── Error helpers ──

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
}

fn not_found(msg: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error(msg)))
}

fn conflict(msg: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(ApiResponse::error(msg)))
}

fn internal(ctx: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", ctx, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("Something went wrong, try again later")),
    )
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

/// The message shown whenever a requested time cannot be committed, whether
/// the conflict was seen at display time or only at write time.
const SLOT_TAKEN: &str = "This time is no longer available, please pick another";

// ── Shared helpers ──

/// Helper: extract TelegramUser from Authorization header.
fn extract_user(auth_header: Option<&str>, bot_token: &str) -> Result<TelegramUser, ApiError> {
    let header = auth_header.ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Missing Authorization header")),
        )
    })?;
    auth::extract_user_from_header(header, bot_token).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid Telegram auth")),
        )
    })
}

fn parse_date_param(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_time_param(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// The shared SELECT for booking detail responses (used by admin.rs too).
pub const BOOKING_DETAIL_SELECT: &str =
    "SELECT b.id, s.name AS service_name, s.price AS service_price,
            br.name AS barber_name,
            b.date, b.start_time,
            strftime('%H:%M', time(b.start_time, '+' || b.duration_min || ' minutes')) AS end_time,
            b.client_tg_id, b.client_username, b.client_first_name,
            b.status, b.payment_status, b.prepaid_amount, b.reschedule_count, b.created_at
     FROM bookings b
     JOIN services s ON s.id = b.service_id
     JOIN barbers br ON br.id = b.barber_id";

pub async fn fetch_booking_detail(
    pool: &sqlx::SqlitePool,
    booking_id: i64,
) -> Result<BookingDetail, sqlx::Error> {
    let query = format!("{} WHERE b.id = ?", BOOKING_DETAIL_SELECT);
    sqlx::query_as::<_, BookingDetail>(&query)
        .bind(booking_id)
        .fetch_one(pool)
        .await
}

async fn fetch_active_service(
    pool: &sqlx::SqlitePool,
    service_id: i64,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, is_active, sort_order
         FROM services WHERE id = ? AND is_active = 1",
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

/// Full pre-write check for one barber: the requested start must be one of
/// the day's offered slots, and the Slot Reservation Guard must admit it
/// against the same freshly read snapshot.
async fn barber_offers_slot(
    pool: &sqlx::SqlitePool,
    barber_id: i64,
    day: NaiveDate,
    date: &str,
    start_time: &str,
    duration_min: i64,
    exclude_booking_ids: &[i64],
) -> anyhow::Result<bool> {
    let schedule = db::schedule_source_for_barber(pool, barber_id).await?;
    let bookings = db::bookings_for_day(pool, &[barber_id], date).await?;
    let now = clock::shop_now().naive_local();

    let slots = availability::compute_available_slots(
        day,
        duration_min,
        &[barber_id],
        &bookings,
        &schedule,
        exclude_booking_ids,
        now,
        &SlotPolicy::default(),
    )?;
    if !slots.iter().any(|s| s.time == start_time && s.available) {
        return Ok(false);
    }

    let start = NaiveDateTime::new(day, NaiveTime::parse_from_str(start_time, "%H:%M")?);
    let free =
        availability::is_slot_available(barber_id, start, duration_min, &bookings, exclude_booking_ids)?;
    Ok(free)
}

// ── Endpoints ──

/// GET /api/services — list active services.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    let services = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, is_active, sort_order
         FROM services WHERE is_active = 1 ORDER BY sort_order ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("list_services", e))?;

    Ok(Json(ApiResponse::success(services)))
}

/// GET /api/barbers — list active barbers.
pub async fn list_barbers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Barber>>>, ApiError> {
    let barbers = sqlx::query_as::<_, Barber>(
        "SELECT id, name, bio, is_active, sort_order
         FROM barbers WHERE is_active = 1 ORDER BY sort_order ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("list_barbers", e))?;

    Ok(Json(ApiResponse::success(barbers)))
}

/// GET /api/available-times?date=YYYY-MM-DD&service_id=N[&barber_id=N]
///
/// With `barber_id` this lists one barber's day; without it, a slot counts
/// as available when at least one active barber is free.
pub async fn available_times(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<ApiResponse<AvailableTimesResponse>>, ApiError> {
    let day = parse_date_param(&query.date)
        .ok_or_else(|| bad_request("Invalid date format, expected YYYY-MM-DD"))?;

    let service = fetch_active_service(&state.db, query.service_id)
        .await
        .map_err(|e| internal("available_times", e))?;
    let service = match service {
        Some(s) => s,
        None => {
            return Ok(Json(ApiResponse::success(AvailableTimesResponse {
                date: query.date,
                slots: vec![],
            })))
        }
    };

    let (candidates, schedule) = match query.barber_id {
        Some(id) => {
            let schedule = db::schedule_source_for_barber(&state.db, id)
                .await
                .map_err(|e| internal("available_times schedule", e))?;
            (vec![id], schedule)
        }
        None => {
            let ids = db::active_barber_ids(&state.db)
                .await
                .map_err(|e| internal("available_times barbers", e))?;
            if ids.is_empty() {
                return Ok(Json(ApiResponse::success(AvailableTimesResponse {
                    date: query.date,
                    slots: vec![],
                })));
            }
            let schedule = db::default_schedule_source(&state.db)
                .await
                .map_err(|e| internal("available_times schedule", e))?;
            (ids, schedule)
        }
    };

    let bookings = db::bookings_for_day(&state.db, &candidates, &query.date)
        .await
        .map_err(|e| internal("available_times bookings", e))?;

    let slots = availability::compute_available_slots(
        day,
        service.duration_min,
        &candidates,
        &bookings,
        &schedule,
        &[],
        clock::shop_now().naive_local(),
        &SlotPolicy::default(),
    )
    .map_err(|e| bad_request(&e.to_string()))?;

    Ok(Json(ApiResponse::success(AvailableTimesResponse {
        date: query.date,
        slots,
    })))
}

/// GET /api/calendar?year=2026&month=3&service_id=1[&barber_id=N]
///
/// One bookings query for the whole month, engine run per day.
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<ApiResponse<Vec<CalendarDay>>>, ApiError> {
    if !(1..=12).contains(&query.month) {
        return Err(bad_request("Month must be between 1 and 12"));
    }

    let service = fetch_active_service(&state.db, query.service_id)
        .await
        .map_err(|e| internal("calendar", e))?;
    let service = match service {
        Some(s) => s,
        None => return Ok(Json(ApiResponse::success(vec![]))),
    };

    let (candidates, schedule) = match query.barber_id {
        Some(id) => {
            let schedule = db::schedule_source_for_barber(&state.db, id)
                .await
                .map_err(|e| internal("calendar schedule", e))?;
            (vec![id], schedule)
        }
        None => {
            let ids = db::active_barber_ids(&state.db)
                .await
                .map_err(|e| internal("calendar barbers", e))?;
            if ids.is_empty() {
                return Ok(Json(ApiResponse::success(vec![])));
            }
            let schedule = db::default_schedule_source(&state.db)
                .await
                .map_err(|e| internal("calendar schedule", e))?;
            (ids, schedule)
        }
    };

    let last_day = days_in_month(query.year, query.month);
    let month_start = format!("{:04}-{:02}-01", query.year, query.month);
    let month_end = format!("{:04}-{:02}-{:02}", query.year, query.month, last_day);

    let rows = sqlx::query_as::<_, (i64, i64, String, String, i64)>(
        "SELECT id, barber_id, date, start_time, duration_min FROM bookings
         WHERE date >= ? AND date <= ? AND status NOT IN ('cancelled', 'expired')",
    )
    .bind(&month_start)
    .bind(&month_end)
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("calendar bookings", e))?;

    // Group by date, keeping only the candidate barbers.
    let mut by_date: HashMap<String, Vec<BookedInterval>> = HashMap::new();
    for (id, barber_id, date, start_raw, duration_min) in rows {
        if !candidates.contains(&barber_id) {
            continue;
        }
        let (Some(day), Some(time)) = (parse_date_param(&date), parse_time_param(&start_raw))
        else {
            tracing::warn!("calendar: skipping booking {} with malformed time", id);
            continue;
        };
        by_date.entry(date).or_default().push(BookedInterval {
            booking_id: id,
            barber_id,
            start: NaiveDateTime::new(day, time),
            duration_min,
        });
    }

    let today = clock::shop_today();
    let now = clock::shop_now().naive_local();
    let no_bookings: Vec<BookedInterval> = Vec::new();
    let mut calendar_days = Vec::new();

    for day_num in 1..=last_day {
        let date = format!("{:04}-{:02}-{:02}", query.year, query.month, day_num);
        if date < today {
            continue;
        }
        let Some(day) = NaiveDate::from_ymd_opt(query.year, query.month, day_num) else {
            continue;
        };

        let bookings = by_date.get(&date).unwrap_or(&no_bookings);
        let slots = availability::compute_available_slots(
            day,
            service.duration_min,
            &candidates,
            bookings,
            &schedule,
            &[],
            now,
            &SlotPolicy::default(),
        )
        .map_err(|e| bad_request(&e.to_string()))?;

        calendar_days.push(CalendarDay {
            date,
            bookable: slots.iter().any(|s| s.available),
        });
    }

    Ok(Json(ApiResponse::success(calendar_days)))
}

/// POST /api/bookings — create a booking with YooKassa prepayment.
///
/// The reservation guard runs against a freshly read snapshot right before
/// the insert; the live unique index backstops the remaining race window.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<CreateBookingResponse>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = extract_user(auth_header, &state.bot_token)?;

    let day = parse_date_param(&body.date)
        .ok_or_else(|| bad_request("Invalid date format, expected YYYY-MM-DD"))?;
    let time = parse_time_param(&body.start_time)
        .ok_or_else(|| bad_request("Invalid time format, expected HH:MM"))?;
    let date = day.format("%Y-%m-%d").to_string();
    let start_time = time.format("%H:%M").to_string();

    if NaiveDateTime::new(day, time) < clock::shop_now().naive_local() {
        return Err(bad_request("Cannot book a time in the past"));
    }

    let service = fetch_active_service(&state.db, body.service_id)
        .await
        .map_err(|e| internal("create_booking service", e))?
        .ok_or_else(|| not_found("Service not found"))?;

    // Resolve the barber: the requested one, or the first active one free
    // at this time.
    let barber_id = match body.barber_id {
        Some(id) => {
            let exists: bool = sqlx::query_scalar(
                "SELECT COUNT(*) > 0 FROM barbers WHERE id = ? AND is_active = 1",
            )
            .bind(id)
            .fetch_one(&state.db)
            .await
            .map_err(|e| internal("create_booking barber", e))?;
            if !exists {
                return Err(not_found("Barber not found"));
            }

            let free =
                barber_offers_slot(&state.db, id, day, &date, &start_time, service.duration_min, &[])
                    .await
                    .map_err(|e| internal("create_booking availability", e))?;
            if !free {
                return Err(conflict(SLOT_TAKEN));
            }
            id
        }
        None => {
            let candidates = db::active_barber_ids(&state.db)
                .await
                .map_err(|e| internal("create_booking barbers", e))?;
            let mut chosen = None;
            for id in candidates {
                let free = barber_offers_slot(
                    &state.db,
                    id,
                    day,
                    &date,
                    &start_time,
                    service.duration_min,
                    &[],
                )
                .await
                .map_err(|e| internal("create_booking availability", e))?;
                if free {
                    chosen = Some(id);
                    break;
                }
            }
            chosen.ok_or_else(|| conflict(SLOT_TAKEN))?
        }
    };

    let created_at = clock::shop_now().format("%Y-%m-%d %H:%M:%S").to_string();
    let booking_id = sqlx::query(
        "INSERT INTO bookings (service_id, barber_id, client_tg_id, client_username,
         client_first_name, date, start_time, duration_min,
         status, payment_status, prepaid_amount, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending_payment', 'pending', ?, ?)",
    )
    .bind(body.service_id)
    .bind(barber_id)
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&date)
    .bind(&start_time)
    .bind(service.duration_min)
    .bind(PREPAID_AMOUNT)
    .bind(&created_at)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            conflict(SLOT_TAKEN)
        } else {
            internal("create_booking INSERT", e)
        }
    })?
    .last_insert_rowid();

    let description = format!("Prepayment: {} on {} at {}", service.name, date, start_time);
    let payment_result = super::payment::create_yookassa_payment(
        &state.yookassa_shop_id,
        &state.yookassa_secret_key,
        booking_id,
        PREPAID_AMOUNT,
        &description,
        &state.webapp_url,
    )
    .await;

    let payment_url = match payment_result {
        Ok((payment_id, confirmation_url)) => {
            if let Err(e) =
                sqlx::query("UPDATE bookings SET yookassa_payment_id = ? WHERE id = ?")
                    .bind(&payment_id)
                    .bind(booking_id)
                    .execute(&state.db)
                    .await
            {
                tracing::error!("Failed to save payment_id for booking {}: {}", booking_id, e);
            }
            Some(confirmation_url)
        }
        Err(e) => {
            tracing::error!("Payment creation failed for booking {}: {}", booking_id, e);
            // Release the slot the failed booking was holding.
            sqlx::query(
                "UPDATE bookings SET status = 'expired', payment_status = 'none' WHERE id = ?",
            )
            .bind(booking_id)
            .execute(&state.db)
            .await
            .ok();
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Payment could not be created, try again later")),
            ));
        }
    };

    let booking = fetch_booking_detail(&state.db, booking_id)
        .await
        .map_err(|e| internal("create_booking detail", e))?;

    Ok(Json(ApiResponse::success(CreateBookingResponse {
        booking,
        payment_url,
    })))
}

/// POST /api/bookings/:id/reschedule — move a confirmed booking.
///
/// Creates a new row linked to the chain root and cancels the old one; the
/// old booking never conflicts with its own replacement.
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<ApiResponse<BookingDetail>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = extract_user(auth_header, &state.bot_token)?;

    let booking = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE id = ? AND client_tg_id = ? AND status = 'confirmed'",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("reschedule_booking", e))?
    .ok_or_else(|| not_found("Booking not found"))?;

    if booking.reschedule_count >= MAX_RESCHEDULES {
        return Err(conflict("Reschedule limit reached for this booking"));
    }

    let day = parse_date_param(&body.date)
        .ok_or_else(|| bad_request("Invalid date format, expected YYYY-MM-DD"))?;
    let time = parse_time_param(&body.start_time)
        .ok_or_else(|| bad_request("Invalid time format, expected HH:MM"))?;
    let date = day.format("%Y-%m-%d").to_string();
    let start_time = time.format("%H:%M").to_string();

    if NaiveDateTime::new(day, time) < clock::shop_now().naive_local() {
        return Err(bad_request("Cannot book a time in the past"));
    }

    let free = barber_offers_slot(
        &state.db,
        booking.barber_id,
        day,
        &date,
        &start_time,
        booking.duration_min,
        &[booking.id],
    )
    .await
    .map_err(|e| internal("reschedule_booking availability", e))?;
    if !free {
        return Err(conflict(SLOT_TAKEN));
    }

    // Cancel first so the live unique index accepts a replacement landing
    // on the old slot; restore the original row if the insert fails.
    let cancelled_at = clock::shop_now().format("%Y-%m-%d %H:%M:%S").to_string();
    let cancelled = sqlx::query(
        "UPDATE bookings SET status = 'cancelled', cancelled_at = ?
         WHERE id = ? AND status = 'confirmed'",
    )
    .bind(&cancelled_at)
    .bind(booking.id)
    .execute(&state.db)
    .await
    .map_err(|e| internal("reschedule_booking cancel", e))?;
    if cancelled.rows_affected() != 1 {
        return Err(conflict(SLOT_TAKEN));
    }

    let chain_root = booking.original_booking_id.unwrap_or(booking.id);
    let created_at = clock::shop_now().format("%Y-%m-%d %H:%M:%S").to_string();
    let insert = sqlx::query(
        "INSERT INTO bookings (service_id, barber_id, client_tg_id, client_username,
         client_first_name, date, start_time, duration_min,
         status, payment_status, yookassa_payment_id, prepaid_amount,
         original_booking_id, reschedule_count, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'confirmed', ?, ?, ?, ?, ?, ?)",
    )
    .bind(booking.service_id)
    .bind(booking.barber_id)
    .bind(booking.client_tg_id)
    .bind(&booking.client_username)
    .bind(&booking.client_first_name)
    .bind(&date)
    .bind(&start_time)
    .bind(booking.duration_min)
    .bind(&booking.payment_status)
    .bind(&booking.yookassa_payment_id)
    .bind(booking.prepaid_amount)
    .bind(chain_root)
    .bind(booking.reschedule_count + 1)
    .bind(&created_at)
    .execute(&state.db)
    .await;

    let new_id = match insert {
        Ok(r) => r.last_insert_rowid(),
        Err(e) => {
            sqlx::query(
                "UPDATE bookings SET status = 'confirmed', cancelled_at = NULL WHERE id = ?",
            )
            .bind(booking.id)
            .execute(&state.db)
            .await
            .ok();
            return Err(if is_unique_violation(&e) {
                conflict(SLOT_TAKEN)
            } else {
                internal("reschedule_booking INSERT", e)
            });
        }
    };

    let mention = user
        .username
        .as_ref()
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| user.first_name.clone());
    let message = format!(
        "Booking rescheduled\n{}\n{} at {} moved to {} at {}",
        mention, booking.date, booking.start_time, date, start_time
    );
    telegram::send_message(&state.bot_token, state.admin_tg_id, &message).await;

    let detail = fetch_booking_detail(&state.db, new_id)
        .await
        .map_err(|e| internal("reschedule_booking detail", e))?;

    Ok(Json(ApiResponse::success(detail)))
}

/// GET /api/bookings/my — upcoming bookings of the current user.
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<BookingDetail>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = extract_user(auth_header, &state.bot_token)?;

    let query = format!(
        "{} WHERE b.client_tg_id = ? AND b.status IN ('confirmed', 'pending_payment')
         AND b.date >= ? ORDER BY b.date ASC, b.start_time ASC",
        BOOKING_DETAIL_SELECT
    );

    let bookings = sqlx::query_as::<_, BookingDetail>(&query)
        .bind(user.id)
        .bind(clock::shop_today())
        .fetch_all(&state.db)
        .await
        .map_err(|e| internal("my_bookings", e))?;

    Ok(Json(ApiResponse::success(bookings)))
}

/// DELETE /api/bookings/:id — cancel a booking (with refund logic).
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CancelBookingResponse>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = extract_user(auth_header, &state.bot_token)?;

    let booking = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE id = ? AND client_tg_id = ?
         AND status IN ('confirmed', 'pending_payment')",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("cancel_booking", e))?
    .ok_or_else(|| not_found("Booking not found"))?;

    let refund_info = process_refund_if_needed(&state, &booking, false).await;

    let cancelled_at = clock::shop_now().format("%Y-%m-%d %H:%M:%S").to_string();
    sqlx::query("UPDATE bookings SET status = 'cancelled', cancelled_at = ? WHERE id = ?")
        .bind(&cancelled_at)
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| internal("cancel_booking UPDATE", e))?;

    let service_name: String = sqlx::query_scalar("SELECT name FROM services WHERE id = ?")
        .bind(booking.service_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "?".into());

    let mention = user
        .username
        .as_ref()
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| user.first_name.clone());
    let refund_line = refund_info
        .as_deref()
        .map(|r| format!("\n{}", r))
        .unwrap_or_default();
    let message = format!(
        "Booking cancelled\n{}\n{}\n{} at {}{}",
        mention, service_name, booking.date, booking.start_time, refund_line
    );
    telegram::send_message(&state.bot_token, state.admin_tg_id, &message).await;

    Ok(Json(ApiResponse::success(CancelBookingResponse {
        message: "Booking cancelled".into(),
        refund_info,
    })))
}

/// GET /api/bookings/:id/status — poll booking payment status.
pub async fn booking_status(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingStatusResponse>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = extract_user(auth_header, &state.bot_token)?;

    let result = sqlx::query_as::<_, (String, String)>(
        "SELECT status, payment_status FROM bookings WHERE id = ? AND client_tg_id = ?",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("booking_status", e))?
    .ok_or_else(|| not_found("Booking not found"))?;

    Ok(Json(ApiResponse::success(BookingStatusResponse {
        status: result.0,
        payment_status: result.1,
    })))
}

// ── Refunds (shared with admin.rs) ──

/// Refund the prepayment when the cancellation policy allows it.
///
/// `admin_override`: admin cancellations always refund; client cancellations
/// refund only more than 24 hours before the appointment.
pub async fn process_refund_if_needed(
    state: &AppState,
    booking: &Booking,
    admin_override: bool,
) -> Option<String> {
    if booking.payment_status != "paid" {
        return None;
    }

    let appointment_str = format!("{} {}", booking.date, booking.start_time);
    let hours_until = NaiveDateTime::parse_from_str(&appointment_str, "%Y-%m-%d %H:%M")
        .map(|appointment| (appointment - clock::shop_now().naive_local()).num_hours())
        .unwrap_or(999); // refundable on parse error

    let should_refund = admin_override || hours_until > 24;

    if !should_refund {
        return Some(format!(
            "Prepayment of {} RUB is not refunded (cancelled less than 24h before)",
            booking.prepaid_amount
        ));
    }

    let payment_id = booking.yookassa_payment_id.as_ref()?;
    let refund_result = super::payment::create_yookassa_refund(
        &state.yookassa_shop_id,
        &state.yookassa_secret_key,
        payment_id,
        booking.prepaid_amount,
    )
    .await;

    if refund_result.is_ok() {
        if let Err(e) = sqlx::query("UPDATE bookings SET payment_status = 'refunded' WHERE id = ?")
            .bind(booking.id)
            .execute(&state.db)
            .await
        {
            tracing::error!(
                "Failed to update payment_status for booking {}: {}",
                booking.id,
                e
            );
        }
        Some(format!(
            "Prepayment of {} RUB will be refunded",
            booking.prepaid_amount
        ))
    } else {
        tracing::error!("Refund failed for booking {}", booking.id);
        Some("Refund will be processed manually".into())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_date_param ──

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date_param("2026-03-02"),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date_param("not-a-date").is_none());
    }

    #[test]
    fn test_parse_date_rejects_wrong_order() {
        assert!(parse_date_param("02-03-2026").is_none());
    }

    #[test]
    fn test_parse_date_rejects_impossible_day() {
        assert!(parse_date_param("2026-02-30").is_none());
    }

    // ── parse_time_param ──

    #[test]
    fn test_parse_time_valid() {
        assert_eq!(
            parse_time_param("09:30"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
    }

    #[test]
    fn test_parse_time_normalizes_single_digit_hour() {
        let t = parse_time_param("9:30").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time_param("half past nine").is_none());
    }

    #[test]
    fn test_parse_time_rejects_out_of_range() {
        assert!(parse_time_param("25:00").is_none());
    }

    // ── days_in_month ──

    #[test]
    fn test_days_in_month_march() {
        assert_eq!(days_in_month(2026, 3), 31);
    }

    #[test]
    fn test_days_in_month_april() {
        assert_eq!(days_in_month(2026, 4), 30);
    }

    #[test]
    fn test_days_in_month_february() {
        assert_eq!(days_in_month(2026, 2), 28);
    }

    #[test]
    fn test_days_in_month_leap_february() {
        assert_eq!(days_in_month(2028, 2), 29);
    }

    #[test]
    fn test_days_in_month_december_rolls_year() {
        assert_eq!(days_in_month(2026, 12), 31);
    }
}
