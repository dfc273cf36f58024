use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{models::*, telegram, AppState};

/// Unpaid bookings expire after this many minutes.
const PENDING_PAYMENT_TTL_MIN: i64 = 15;

/// Create a payment in YooKassa. Returns (payment_id, confirmation_url).
pub async fn create_yookassa_payment(
    shop_id: &str,
    secret_key: &str,
    booking_id: i64,
    amount: i64,
    description: &str,
    return_url: &str,
) -> anyhow::Result<(String, String)> {
    let client = reqwest::Client::new();

    let idempotence_key = format!(
        "booking-{}-{}",
        booking_id,
        chrono::Utc::now().timestamp_millis()
    );

    let body = serde_json::json!({
        "amount": {
            "value": format!("{}.00", amount),
            "currency": "RUB"
        },
        "capture": true,
        "confirmation": {
            "type": "redirect",
            "return_url": return_url
        },
        "description": description,
        "metadata": {
            "booking_id": booking_id.to_string()
        }
    });

    let resp = client
        .post("https://api.yookassa.ru/v3/payments")
        .basic_auth(shop_id, Some(secret_key))
        .header("Idempotence-Key", &idempotence_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        tracing::error!("YooKassa payment creation failed: {} - {}", status, text);
        anyhow::bail!("YooKassa API error: {}", status);
    }

    let json: serde_json::Value = resp.json().await?;

    let payment_id = json["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing payment id"))?
        .to_string();

    let confirmation_url = json["confirmation"]["confirmation_url"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing confirmation URL"))?
        .to_string();

    tracing::info!(
        "YooKassa payment created: {} for booking {}",
        payment_id,
        booking_id
    );

    Ok((payment_id, confirmation_url))
}

/// Create a refund in YooKassa.
pub async fn create_yookassa_refund(
    shop_id: &str,
    secret_key: &str,
    payment_id: &str,
    amount: i64,
) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let idempotence_key = format!(
        "refund-{}-{}",
        payment_id,
        chrono::Utc::now().timestamp_millis()
    );

    let body = serde_json::json!({
        "payment_id": payment_id,
        "amount": {
            "value": format!("{}.00", amount),
            "currency": "RUB"
        }
    });

    let resp = client
        .post("https://api.yookassa.ru/v3/refunds")
        .basic_auth(shop_id, Some(secret_key))
        .header("Idempotence-Key", &idempotence_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        tracing::error!("YooKassa refund failed: {} - {}", status, text);
        anyhow::bail!("YooKassa refund error: {}", status);
    }

    tracing::info!("YooKassa refund created for payment {}", payment_id);
    Ok(())
}

/// POST /api/payments/webhook — handle YooKassa webhook notifications.
///
/// Returns 200 even for unusable payloads so YooKassa stops retrying.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Json(event): Json<YooKassaWebhookEvent>,
) -> StatusCode {
    tracing::info!(
        "YooKassa webhook: event={}, payment_id={}, status={}",
        event.event,
        event.object.id,
        event.object.status
    );

    let booking_id: i64 = match event
        .object
        .metadata
        .as_ref()
        .and_then(|m| m.get("booking_id"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
    {
        Some(id) => id,
        None => {
            tracing::warn!("Webhook missing booking_id in metadata");
            return StatusCode::OK;
        }
    };

    match event.event.as_str() {
        "payment.succeeded" => {
            tracing::info!("Payment succeeded for booking {}", booking_id);

            // Guarded on status: a late or duplicate webhook cannot revive
            // an expired or cancelled booking.
            let result = sqlx::query(
                "UPDATE bookings SET status = 'confirmed', payment_status = 'paid'
                 WHERE id = ? AND status = 'pending_payment'",
            )
            .bind(booking_id)
            .execute(&state.db)
            .await;

            match result {
                Err(e) => {
                    tracing::error!("Failed to confirm booking {}: {}", booking_id, e);
                    return StatusCode::INTERNAL_SERVER_ERROR;
                }
                Ok(r) if r.rows_affected() == 0 => {
                    tracing::warn!(
                        "Webhook for booking {} ignored: not pending_payment",
                        booking_id
                    );
                    return StatusCode::OK;
                }
                Ok(_) => {}
            }

            let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
                .bind(booking_id)
                .fetch_optional(&state.db)
                .await
                .ok()
                .flatten();

            if let Some(booking) = booking {
                let service_name: Option<String> =
                    sqlx::query_scalar("SELECT name FROM services WHERE id = ?")
                        .bind(booking.service_id)
                        .fetch_optional(&state.db)
                        .await
                        .ok()
                        .flatten();
                let barber_name: Option<String> =
                    sqlx::query_scalar("SELECT name FROM barbers WHERE id = ?")
                        .bind(booking.barber_id)
                        .fetch_optional(&state.db)
                        .await
                        .ok()
                        .flatten();

                let mention = booking
                    .client_username
                    .as_ref()
                    .map(|u| format!("@{}", u))
                    .unwrap_or_else(|| booking.client_first_name.clone());

                let message = format!(
                    "New booking, paid\n\
                     {}\n\
                     {} with {}\n\
                     {} at {}\n\
                     Prepaid {} RUB",
                    mention,
                    service_name.as_deref().unwrap_or("?"),
                    barber_name.as_deref().unwrap_or("?"),
                    booking.date,
                    booking.start_time,
                    booking.prepaid_amount
                );

                telegram::send_message(&state.bot_token, state.admin_tg_id, &message).await;
            }
        }

        "payment.canceled" => {
            tracing::info!("Payment canceled for booking {}", booking_id);

            // The expired row drops out of conflict checks, freeing the slot.
            sqlx::query(
                "UPDATE bookings SET status = 'expired', payment_status = 'none'
                 WHERE id = ? AND status = 'pending_payment'",
            )
            .bind(booking_id)
            .execute(&state.db)
            .await
            .ok();
        }

        _ => {
            tracing::info!("Ignoring webhook event: {}", event.event);
        }
    }

    StatusCode::OK
}

/// Expire pending_payment bookings whose payment window has lapsed.
/// Runs periodically; `created_at` is shop-local, hence the +3 hours.
pub async fn expire_pending_payments(db: &sqlx::SqlitePool) {
    let expired_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM bookings
         WHERE status = 'pending_payment'
         AND datetime(created_at, ? || ' minutes') < datetime('now', '+3 hours')",
    )
    .bind(format!("+{}", PENDING_PAYMENT_TTL_MIN))
    .fetch_all(db)
    .await
    .unwrap_or_default();

    for booking_id in expired_ids {
        tracing::info!("Expiring unpaid booking {}", booking_id);

        sqlx::query(
            "UPDATE bookings SET status = 'expired', payment_status = 'none'
             WHERE id = ? AND status = 'pending_payment'",
        )
        .bind(booking_id)
        .execute(db)
        .await
        .ok();
    }
}
