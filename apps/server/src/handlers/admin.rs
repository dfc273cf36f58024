use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use chrono::NaiveTime;
use std::sync::Arc;

use crate::{auth, clock, models::*, telegram, AppState};

use super::client::{process_refund_if_needed, BOOKING_DETAIL_SELECT};

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
}

fn not_found(msg: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error(msg)))
}

fn internal(ctx: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", ctx, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("Something went wrong, try again later")),
    )
}

/// Helper: extract admin user (validates both auth and admin status).
fn extract_admin(auth_header: Option<&str>, state: &AppState) -> Result<TelegramUser, ApiError> {
    let header = auth_header.ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Missing Authorization header")),
        )
    })?;
    let user = auth::extract_user_from_header(header, &state.bot_token).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid Telegram auth")),
        )
    })?;

    if !auth::is_admin(&user, state.admin_tg_id) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Access denied")),
        ));
    }

    Ok(user)
}

// ── Validation ──

fn valid_hhmm(raw: &str) -> bool {
    NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
}

/// Weekly entries must use distinct weekdays 0..=6 (0 = Sunday) and carry a
/// well-formed window when the day is open.
fn validate_weekly_entries(entries: &[(i64, &str, &str, bool)]) -> Result<(), String> {
    let mut seen = [false; 7];
    for (day, start, end, open) in entries {
        if !(0..=6).contains(day) {
            return Err(format!("day_of_week {} out of range (0-6)", day));
        }
        let idx = *day as usize;
        if seen[idx] {
            return Err(format!("duplicate entry for day_of_week {}", day));
        }
        seen[idx] = true;

        if !open {
            continue;
        }
        if !valid_hhmm(start) || !valid_hhmm(end) {
            return Err("times must be HH:MM".into());
        }
        if start >= end {
            return Err(format!("window {}-{} is empty", start, end));
        }
    }
    Ok(())
}

// ── Services ──

/// GET /api/admin/services — list ALL services (including inactive).
pub async fn list_all_services(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let services = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, is_active, sort_order
         FROM services ORDER BY sort_order ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("list_all_services", e))?;

    Ok(Json(ApiResponse::success(services)))
}

/// POST /api/admin/services — create a new service.
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    if body.duration_min <= 0 {
        return Err(bad_request("duration_min must be positive"));
    }

    let id = sqlx::query(
        "INSERT INTO services (name, description, price, duration_min, sort_order)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&body.name)
    .bind(body.description.as_deref().unwrap_or(""))
    .bind(body.price)
    .bind(body.duration_min)
    .bind(body.sort_order.unwrap_or(0))
    .execute(&state.db)
    .await
    .map_err(|e| internal("create_service", e))?
    .last_insert_rowid();

    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, is_active, sort_order
         FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| internal("create_service fetch", e))?;

    Ok(Json(ApiResponse::success(service)))
}

/// PUT /api/admin/services/:id — update a service.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    if let Some(dur) = body.duration_min {
        if dur <= 0 {
            return Err(bad_request("duration_min must be positive"));
        }
    }

    if let Some(name) = &body.name {
        sqlx::query("UPDATE services SET name = ? WHERE id = ?")
            .bind(name).bind(id).execute(&state.db).await.ok();
    }
    if let Some(desc) = &body.description {
        sqlx::query("UPDATE services SET description = ? WHERE id = ?")
            .bind(desc).bind(id).execute(&state.db).await.ok();
    }
    if let Some(price) = body.price {
        sqlx::query("UPDATE services SET price = ? WHERE id = ?")
            .bind(price).bind(id).execute(&state.db).await.ok();
    }
    if let Some(dur) = body.duration_min {
        sqlx::query("UPDATE services SET duration_min = ? WHERE id = ?")
            .bind(dur).bind(id).execute(&state.db).await.ok();
    }
    if let Some(active) = body.is_active {
        sqlx::query("UPDATE services SET is_active = ? WHERE id = ?")
            .bind(active).bind(id).execute(&state.db).await.ok();
    }
    if let Some(order) = body.sort_order {
        sqlx::query("UPDATE services SET sort_order = ? WHERE id = ?")
            .bind(order).bind(id).execute(&state.db).await.ok();
    }

    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, is_active, sort_order
         FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("update_service fetch", e))?
    .ok_or_else(|| not_found("Service not found"))?;

    Ok(Json(ApiResponse::success(service)))
}

// ── Barbers ──

/// GET /api/admin/barbers — list ALL barbers (including inactive).
pub async fn list_all_barbers(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<Barber>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let barbers = sqlx::query_as::<_, Barber>(
        "SELECT id, name, bio, is_active, sort_order FROM barbers ORDER BY sort_order ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("list_all_barbers", e))?;

    Ok(Json(ApiResponse::success(barbers)))
}

/// POST /api/admin/barbers — add a barber.
pub async fn create_barber(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateBarberRequest>,
) -> Result<Json<ApiResponse<Barber>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let id = sqlx::query("INSERT INTO barbers (name, bio, sort_order) VALUES (?, ?, ?)")
        .bind(&body.name)
        .bind(body.bio.as_deref().unwrap_or(""))
        .bind(body.sort_order.unwrap_or(0))
        .execute(&state.db)
        .await
        .map_err(|e| internal("create_barber", e))?
        .last_insert_rowid();

    let barber = sqlx::query_as::<_, Barber>(
        "SELECT id, name, bio, is_active, sort_order FROM barbers WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| internal("create_barber fetch", e))?;

    Ok(Json(ApiResponse::success(barber)))
}

/// PUT /api/admin/barbers/:id — update a barber.
///
/// Deactivating a barber hides them from clients but keeps existing
/// bookings intact.
pub async fn update_barber(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBarberRequest>,
) -> Result<Json<ApiResponse<Barber>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    if let Some(name) = &body.name {
        sqlx::query("UPDATE barbers SET name = ? WHERE id = ?")
            .bind(name).bind(id).execute(&state.db).await.ok();
    }
    if let Some(bio) = &body.bio {
        sqlx::query("UPDATE barbers SET bio = ? WHERE id = ?")
            .bind(bio).bind(id).execute(&state.db).await.ok();
    }
    if let Some(active) = body.is_active {
        sqlx::query("UPDATE barbers SET is_active = ? WHERE id = ?")
            .bind(active).bind(id).execute(&state.db).await.ok();
    }
    if let Some(order) = body.sort_order {
        sqlx::query("UPDATE barbers SET sort_order = ? WHERE id = ?")
            .bind(order).bind(id).execute(&state.db).await.ok();
    }

    let barber = sqlx::query_as::<_, Barber>(
        "SELECT id, name, bio, is_active, sort_order FROM barbers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("update_barber fetch", e))?
    .ok_or_else(|| not_found("Barber not found"))?;

    Ok(Json(ApiResponse::success(barber)))
}

// ── Weekly schedule ──

/// GET /api/admin/barbers/:id/schedule — a barber's weekly schedule.
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(barber_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ScheduleEntry>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let entries = sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, barber_id, day_of_week, start_time, end_time, is_available
         FROM weekly_schedule WHERE barber_id = ? ORDER BY day_of_week ASC",
    )
    .bind(barber_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("get_schedule", e))?;

    Ok(Json(ApiResponse::success(entries)))
}

/// PUT /api/admin/barbers/:id/schedule — replace a barber's weekly schedule.
pub async fn upsert_schedule(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(barber_id): Path<i64>,
    Json(body): Json<UpsertScheduleRequest>,
) -> Result<Json<ApiResponse<Vec<ScheduleEntry>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM barbers WHERE id = ?")
        .bind(barber_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| internal("upsert_schedule", e))?;
    if !exists {
        return Err(not_found("Barber not found"));
    }

    let flat: Vec<(i64, &str, &str, bool)> = body
        .entries
        .iter()
        .map(|e| (e.day_of_week, e.start_time.as_str(), e.end_time.as_str(), e.is_available))
        .collect();
    validate_weekly_entries(&flat).map_err(|msg| bad_request(&msg))?;

    // Full replacement keeps the UNIQUE(barber_id, day_of_week) row set
    // consistent with the request.
    sqlx::query("DELETE FROM weekly_schedule WHERE barber_id = ?")
        .bind(barber_id)
        .execute(&state.db)
        .await
        .map_err(|e| internal("upsert_schedule delete", e))?;

    for entry in &body.entries {
        sqlx::query(
            "INSERT INTO weekly_schedule (barber_id, day_of_week, start_time, end_time, is_available)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(barber_id)
        .bind(entry.day_of_week)
        .bind(&entry.start_time)
        .bind(&entry.end_time)
        .bind(entry.is_available)
        .execute(&state.db)
        .await
        .map_err(|e| internal("upsert_schedule insert", e))?;
    }

    let entries = sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, barber_id, day_of_week, start_time, end_time, is_available
         FROM weekly_schedule WHERE barber_id = ? ORDER BY day_of_week ASC",
    )
    .bind(barber_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("upsert_schedule fetch", e))?;

    Ok(Json(ApiResponse::success(entries)))
}

// ── Blocked dates ──

/// GET /api/admin/barbers/:id/blocked-dates — upcoming closures.
pub async fn list_blocked_dates(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(barber_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<BlockedDate>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let dates = sqlx::query_as::<_, BlockedDate>(
        "SELECT id, barber_id, date, reason FROM blocked_dates
         WHERE barber_id = ? AND date >= ? ORDER BY date ASC",
    )
    .bind(barber_id)
    .bind(clock::shop_today())
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("list_blocked_dates", e))?;

    Ok(Json(ApiResponse::success(dates)))
}

/// POST /api/admin/barbers/:id/blocked-dates — block a full day.
///
/// Existing bookings on that day are untouched; the admin cancels those
/// separately.
pub async fn block_date(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(barber_id): Path<i64>,
    Json(body): Json<BlockDateRequest>,
) -> Result<Json<ApiResponse<BlockedDate>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    if chrono::NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err(bad_request("Invalid date format, expected YYYY-MM-DD"));
    }

    // Idempotent on (barber, date).
    sqlx::query(
        "INSERT INTO blocked_dates (barber_id, date, reason) VALUES (?, ?, ?)
         ON CONFLICT(barber_id, date) DO UPDATE SET reason = excluded.reason",
    )
    .bind(barber_id)
    .bind(&body.date)
    .bind(&body.reason)
    .execute(&state.db)
    .await
    .map_err(|e| internal("block_date", e))?;

    let blocked = sqlx::query_as::<_, BlockedDate>(
        "SELECT id, barber_id, date, reason FROM blocked_dates WHERE barber_id = ? AND date = ?",
    )
    .bind(barber_id)
    .bind(&body.date)
    .fetch_one(&state.db)
    .await
    .map_err(|e| internal("block_date fetch", e))?;

    Ok(Json(ApiResponse::success(blocked)))
}

/// DELETE /api/admin/blocked-dates/:id — remove a closure.
pub async fn unblock_date(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let result = sqlx::query("DELETE FROM blocked_dates WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| internal("unblock_date", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Blocked date not found"));
    }

    Ok(Json(ApiResponse::success("Date unblocked")))
}

// ── Business hours ──

/// GET /api/admin/business-hours — shop-wide default hours.
pub async fn get_business_hours(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<BusinessHours>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let hours = sqlx::query_as::<_, BusinessHours>(
        "SELECT day_of_week, start_time, end_time, is_open
         FROM business_hours ORDER BY day_of_week ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("get_business_hours", e))?;

    Ok(Json(ApiResponse::success(hours)))
}

/// PUT /api/admin/business-hours — upsert shop-wide default hours.
pub async fn update_business_hours(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<UpdateBusinessHoursRequest>,
) -> Result<Json<ApiResponse<Vec<BusinessHours>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let flat: Vec<(i64, &str, &str, bool)> = body
        .entries
        .iter()
        .map(|e| (e.day_of_week, e.start_time.as_str(), e.end_time.as_str(), e.is_open))
        .collect();
    validate_weekly_entries(&flat).map_err(|msg| bad_request(&msg))?;

    for entry in &body.entries {
        sqlx::query(
            "INSERT INTO business_hours (day_of_week, start_time, end_time, is_open)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(day_of_week) DO UPDATE SET
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                is_open = excluded.is_open",
        )
        .bind(entry.day_of_week)
        .bind(&entry.start_time)
        .bind(&entry.end_time)
        .bind(entry.is_open)
        .execute(&state.db)
        .await
        .map_err(|e| internal("update_business_hours", e))?;
    }

    let hours = sqlx::query_as::<_, BusinessHours>(
        "SELECT day_of_week, start_time, end_time, is_open
         FROM business_hours ORDER BY day_of_week ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| internal("update_business_hours fetch", e))?;

    Ok(Json(ApiResponse::success(hours)))
}

// ── Bookings ──

/// GET /api/admin/bookings — list bookings (one day, a range, or upcoming).
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingDetail>>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let bookings = if let Some(date) = &query.date {
        let sql = format!(
            "{} WHERE b.date = ? AND b.status IN ('confirmed', 'pending_payment')
             ORDER BY b.start_time ASC",
            BOOKING_DETAIL_SELECT
        );
        sqlx::query_as::<_, BookingDetail>(&sql)
            .bind(date)
            .fetch_all(&state.db)
            .await
    } else if let (Some(from), Some(to)) = (&query.from, &query.to) {
        let sql = format!(
            "{} WHERE b.date BETWEEN ? AND ? AND b.status IN ('confirmed', 'pending_payment')
             ORDER BY b.date ASC, b.start_time ASC",
            BOOKING_DETAIL_SELECT
        );
        sqlx::query_as::<_, BookingDetail>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&state.db)
            .await
    } else {
        let sql = format!(
            "{} WHERE b.date >= ? AND b.status IN ('confirmed', 'pending_payment')
             ORDER BY b.date ASC, b.start_time ASC",
            BOOKING_DETAIL_SELECT
        );
        sqlx::query_as::<_, BookingDetail>(&sql)
            .bind(clock::shop_today())
            .fetch_all(&state.db)
            .await
    }
    .map_err(|e| internal("list_bookings", e))?;

    Ok(Json(ApiResponse::success(bookings)))
}

/// POST /api/admin/bookings/:id/cancel — admin cancels a booking.
///
/// Admin cancellations always refund a paid prepayment, regardless of how
/// close the appointment is.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_admin(auth_header, &state)?;

    let booking = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE id = ? AND status IN ('confirmed', 'pending_payment')",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| internal("cancel_booking", e))?
    .ok_or_else(|| not_found("Booking not found"))?;

    let refund_info = process_refund_if_needed(&state, &booking, true).await;

    let cancelled_at = clock::shop_now().format("%Y-%m-%d %H:%M:%S").to_string();
    sqlx::query("UPDATE bookings SET status = 'cancelled', cancelled_at = ? WHERE id = ?")
        .bind(&cancelled_at)
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| internal("cancel_booking UPDATE", e))?;

    let refund_line = refund_info
        .as_deref()
        .map(|r| format!("\n{}", r))
        .unwrap_or_default();
    let message = format!(
        "Your booking on {} at {} was cancelled by the barbershop.\nPlease pick another time.{}",
        booking.date, booking.start_time, refund_line
    );
    telegram::send_message(&state.bot_token, booking.client_tg_id, &message).await;

    Ok(Json(ApiResponse::success("Booking cancelled")))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_entries_valid() {
        let entries = vec![
            (1, "10:00", "20:00", true),
            (2, "10:00", "20:00", true),
            (0, "00:00", "00:00", false),
        ];
        assert!(validate_weekly_entries(&entries).is_ok());
    }

    #[test]
    fn test_weekly_entries_day_out_of_range() {
        let entries = vec![(7, "10:00", "20:00", true)];
        assert!(validate_weekly_entries(&entries).is_err());
    }

    #[test]
    fn test_weekly_entries_duplicate_day() {
        let entries = vec![(1, "10:00", "14:00", true), (1, "15:00", "20:00", true)];
        assert!(validate_weekly_entries(&entries).is_err());
    }

    #[test]
    fn test_weekly_entries_bad_time_format() {
        let entries = vec![(1, "10am", "20:00", true)];
        assert!(validate_weekly_entries(&entries).is_err());
    }

    #[test]
    fn test_weekly_entries_empty_window() {
        let entries = vec![(1, "20:00", "10:00", true)];
        assert!(validate_weekly_entries(&entries).is_err());
        let entries = vec![(1, "10:00", "10:00", true)];
        assert!(validate_weekly_entries(&entries).is_err());
    }

    #[test]
    fn test_weekly_entries_closed_day_skips_time_checks() {
        // A closed day may carry placeholder times.
        let entries = vec![(3, "", "", false)];
        assert!(validate_weekly_entries(&entries).is_ok());
    }
}
