//! Tracing layer that forwards ERROR-level events to the admin's Telegram
//! chat. Rate limited (one message per `MIN_INTERVAL`), with identical
//! messages suppressed for `DEDUP_WINDOW`. The HTTP send is spawned onto
//! the Tokio runtime so logging never blocks a request.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Minimum interval between Telegram alerts.
const MIN_INTERVAL: Duration = Duration::from_secs(15);
/// Window during which identical error messages are suppressed.
const DEDUP_WINDOW: Duration = Duration::from_secs(120);

// ── Layer ──

pub struct TelegramAlertLayer {
    bot_token: String,
    chat_id: i64,
    http: reqwest::Client,
    state: Mutex<AlertState>,
}

struct AlertState {
    last_sent: Instant,
    /// hash of message → when it was last sent.
    recent: HashMap<u64, Instant>,
}

impl TelegramAlertLayer {
    pub fn new(bot_token: String, chat_id: i64) -> Self {
        Self {
            bot_token,
            chat_id,
            http: reqwest::Client::new(),
            state: Mutex::new(AlertState {
                // allow the first alert immediately
                last_sent: Instant::now() - MIN_INTERVAL,
                recent: HashMap::new(),
            }),
        }
    }
}

/// Rate-limit + dedup decision, separated from the Layer impl for testing.
fn admit(state: &mut AlertState, hash: u64, now: Instant) -> bool {
    state
        .recent
        .retain(|_, sent_at| now.duration_since(*sent_at) < DEDUP_WINDOW);

    if state.recent.contains_key(&hash) {
        return false;
    }
    if now.duration_since(state.last_sent) < MIN_INTERVAL {
        return false;
    }

    state.last_sent = now;
    state.recent.insert(hash, now);
    true
}

impl<S: Subscriber> Layer<S> for TelegramAlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message();

        let target = event.metadata().target();
        let file = event.metadata().file().unwrap_or("?");
        let line = event
            .metadata()
            .line()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".into());
        let now_utc = chrono::Utc::now().format("%H:%M:%S UTC");

        let text = format!(
            "\u{2702} <b>Sharpcut server error</b>\n\
             <code>{message}</code>\n\
             {target} ({file}:{line})\n\
             {now_utc}"
        );

        let hash = {
            let mut h = DefaultHasher::new();
            message.hash(&mut h);
            h.finish()
        };

        let should_send = {
            let mut state = self.state.lock().unwrap();
            admit(&mut state, hash, Instant::now())
        };
        if !should_send {
            return;
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let client = self.http.clone();
        let chat_id = self.chat_id;

        tokio::spawn(async move {
            let _ = client
                .post(&url)
                .json(&serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "HTML"
                }))
                .send()
                .await;
        });
    }
}

// ── Field visitor ──

/// Collects the `message` field plus any structured fields from an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl MessageVisitor {
    fn message(&self) -> String {
        if self.fields.is_empty() {
            return self.message.clone();
        }
        let extras: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if self.message.is_empty() {
            extras.join(", ")
        } else {
            format!("{} ({})", self.message, extras.join(", "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let val = format!("{:?}", value);
        if field.name() == "message" {
            self.message = val;
        } else {
            self.fields.push((field.name().to_string(), val));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }
}

// ── Tests ──
