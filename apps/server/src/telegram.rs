//! Outbound Telegram Bot API messages (admin alerts, client notifications).

/// Send a message to a chat. Failures are logged and swallowed; a lost
/// notification must never fail the request that triggered it.
pub async fn send_message(bot_token: &str, chat_id: i64, text: &str) {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
    let client = reqwest::Client::new();
    if let Err(e) = client
        .post(&url)
        .json(&serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML"
        }))
        .send()
        .await
    {
        tracing::error!("Failed to send Telegram message to {}: {}", chat_id, e);
    }
}
