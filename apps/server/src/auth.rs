use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::models::TelegramUser;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of initData before it's considered expired (24 hours).
const MAX_AUTH_AGE_SECS: i64 = 86400;

/// Validates Telegram Mini App initData and extracts user info.
/// See: https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app
pub fn validate_init_data(init_data: &str, bot_token: &str) -> Option<TelegramUser> {
    let params: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let hash = params.get("hash")?;

    // Reject stale payloads (replay protection)
    if let Some(auth_date) = params.get("auth_date").and_then(|v| v.parse::<i64>().ok()) {
        let age = chrono::Utc::now().timestamp() - auth_date;
        if age > MAX_AUTH_AGE_SECS {
            tracing::warn!("initData expired: auth_date={}, age={}s", auth_date, age);
            return None;
        }
    }

    if compute_hash(&params, bot_token) != *hash {
        tracing::warn!("initData hash mismatch");
        return None;
    }

    let user_json = params.get("user")?;
    serde_json::from_str::<TelegramUser>(user_json).ok()
}

/// HMAC-SHA256 over the sorted `key=value` lines (hash excluded), keyed by
/// HMAC-SHA256("WebAppData", bot_token), hex-encoded.
fn compute_hash(params: &BTreeMap<String, String>, bot_token: &str) -> String {
    let data_check_string: String = params
        .iter()
        .filter(|(k, _)| k.as_str() != "hash")
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret_mac =
        HmacSha256::new_from_slice(b"WebAppData").expect("HMAC can take key of any size");
    secret_mac.update(bot_token.as_bytes());
    let secret_key = secret_mac.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).expect("HMAC can take key of any size");
    mac.update(data_check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Extract Telegram user from the Authorization header.
/// Header format: `tma <initData>`
pub fn extract_user_from_header(auth_header: &str, bot_token: &str) -> Option<TelegramUser> {
    let init_data = auth_header.strip_prefix("tma ")?;
    validate_init_data(init_data, bot_token)
}

/// Check if the authenticated user is the shop admin.
pub fn is_admin(user: &TelegramUser, admin_tg_id: i64) -> bool {
    user.id == admin_tg_id
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "12345:test-token";

    /// Build a correctly signed initData string for the given user JSON.
    fn signed_init_data(user_json: &str) -> String {
        let auth_date = chrono::Utc::now().timestamp().to_string();
        let mut params = BTreeMap::new();
        params.insert("auth_date".to_string(), auth_date.clone());
        params.insert("user".to_string(), user_json.to_string());
        let hash = compute_hash(&params, TOKEN);

        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("auth_date", &auth_date)
            .append_pair("user", user_json)
            .append_pair("hash", &hash)
            .finish()
    }

    #[test]
    fn test_valid_init_data_accepted() {
        let init = signed_init_data(r#"{"id":42,"first_name":"Lev"}"#);
        let user = validate_init_data(&init, TOKEN).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.first_name, "Lev");
    }

    #[test]
    fn test_tampered_hash_rejected() {
        let init = signed_init_data(r#"{"id":42,"first_name":"Lev"}"#);
        let tampered = init.replace("id%22%3A42", "id%22%3A43");
        assert!(validate_init_data(&tampered, TOKEN).is_none());
    }

    #[test]
    fn test_wrong_token_rejected() {
        let init = signed_init_data(r#"{"id":42,"first_name":"Lev"}"#);
        assert!(validate_init_data(&init, "999:other-token").is_none());
    }

    #[test]
    fn test_missing_hash_rejected() {
        assert!(validate_init_data("auth_date=0&user=%7B%7D", TOKEN).is_none());
    }

    #[test]
    fn test_expired_auth_date_rejected() {
        let old = (chrono::Utc::now().timestamp() - MAX_AUTH_AGE_SECS - 60).to_string();
        let user_json = r#"{"id":42,"first_name":"Lev"}"#;
        let mut params = BTreeMap::new();
        params.insert("auth_date".to_string(), old.clone());
        params.insert("user".to_string(), user_json.to_string());
        let hash = compute_hash(&params, TOKEN);
        let init = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("auth_date", &old)
            .append_pair("user", user_json)
            .append_pair("hash", &hash)
            .finish();
        assert!(validate_init_data(&init, TOKEN).is_none());
    }

    #[test]
    fn test_header_prefix_required() {
        assert!(extract_user_from_header("Bearer abc", TOKEN).is_none());
    }

    #[test]
    fn test_is_admin_matches_id() {
        let user = TelegramUser {
            id: 7,
            first_name: "A".into(),
            last_name: None,
            username: None,
        };
        assert!(is_admin(&user, 7));
        assert!(!is_admin(&user, 8));
    }
}
