//! Next-day appointment reminders, sent to clients over Telegram.

use chrono::Duration;

use crate::{clock, telegram};

#[derive(Debug, sqlx::FromRow)]
struct ReminderRow {
    id: i64,
    client_tg_id: i64,
    client_first_name: String,
    start_time: String,
    service_name: String,
    barber_name: String,
}

/// Send reminders for tomorrow's confirmed bookings. Each booking is
/// reminded at most once; runs hourly so a failed send retries later.
pub async fn send_reminders(db: &sqlx::SqlitePool, bot_token: &str) {
    let tomorrow = (clock::shop_now().date_naive() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    let rows = match sqlx::query_as::<_, ReminderRow>(
        "SELECT b.id, b.client_tg_id, b.client_first_name, b.start_time,
                s.name AS service_name, br.name AS barber_name
         FROM bookings b
         JOIN services s ON s.id = b.service_id
         JOIN barbers br ON br.id = b.barber_id
         WHERE b.date = ? AND b.status = 'confirmed' AND b.reminder_sent = 0",
    )
    .bind(&tomorrow)
    .fetch_all(db)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to load reminders for {}: {}", tomorrow, e);
            return;
        }
    };

    for row in rows {
        let message = format!(
            "Hi {}! Reminder: tomorrow at {} you have {} with {}.\nSee you at the shop!",
            row.client_first_name, row.start_time, row.service_name, row.barber_name
        );
        telegram::send_message(bot_token, row.client_tg_id, &message).await;

        if let Err(e) = sqlx::query("UPDATE bookings SET reminder_sent = 1 WHERE id = ?")
            .bind(row.id)
            .execute(db)
            .await
        {
            tracing::error!("Failed to mark reminder sent for booking {}: {}", row.id, e);
        }
    }
}
