mod auth;
mod availability;
mod clock;
mod db;
mod handlers;
mod models;
mod rate_limit;
mod reminders;
mod telegram;
mod telegram_layer;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use rate_limit::{rate_limit, RateTier};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub bot_token: String,
    pub admin_tg_id: i64,
    pub started_at: Instant,
    pub yookassa_shop_id: String,
    pub yookassa_secret_key: String,
    pub webapp_url: String,
}

/// Payment expiry check interval (seconds).
const PAYMENT_EXPIRY_INTERVAL_SECS: u64 = 300;
/// Reminder check interval (seconds).
const REMINDER_INTERVAL_SECS: u64 = 3600;
/// Rate limit cleanup interval (seconds).
const RATE_LIMIT_CLEANUP_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── Required env vars (read before tracing so the alert layer can use them) ──
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:sharpcut.db?mode=rwc".into());
    let bot_token = std::env::var("BOT_TOKEN").expect("BOT_TOKEN must be set");
    let admin_tg_id: i64 = std::env::var("ADMIN_TG_ID")
        .expect("ADMIN_TG_ID must be set")
        .parse()
        .expect("ADMIN_TG_ID must be a number");

    // ── Tracing: console + Telegram error alerts ──
    let env_filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    let fmt_layer = tracing_subscriber::fmt::layer();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if !bot_token.is_empty() {
        let tg_layer = telegram_layer::TelegramAlertLayer::new(bot_token.clone(), admin_tg_id);
        registry.with(tg_layer).init();
    } else {
        registry.init();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());

    // ── Optional env vars ──
    let yookassa_shop_id = std::env::var("YOOKASSA_SHOP_ID").unwrap_or_default();
    let yookassa_secret_key = std::env::var("YOOKASSA_SECRET_KEY").unwrap_or_default();
    let webapp_url =
        std::env::var("WEBAPP_URL").unwrap_or_else(|_| "https://example.com".into());

    if yookassa_shop_id.is_empty() {
        tracing::warn!("YOOKASSA_SHOP_ID not set — payments will fail");
    }

    // ── Database ──
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    db::run_migrations(&pool).await?;

    let state = Arc::new(AppState {
        db: pool,
        bot_token,
        admin_tg_id,
        started_at: Instant::now(),
        yookassa_shop_id,
        yookassa_secret_key,
        webapp_url: webapp_url.clone(),
    });

    // ── Background task: expire unpaid bookings ──
    let expire_db = state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            PAYMENT_EXPIRY_INTERVAL_SECS,
        ));
        loop {
            interval.tick().await;
            handlers::payment::expire_pending_payments(&expire_db).await;
        }
    });

    // ── Background task: next-day reminders ──
    let reminder_db = state.db.clone();
    let reminder_token = state.bot_token.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(REMINDER_INTERVAL_SECS));
        loop {
            interval.tick().await;
            reminders::send_reminders(&reminder_db, &reminder_token).await;
        }
    });

    // ── Rate limit tiers ──
    let public_tier = RateTier::new("public", 60, Duration::from_secs(60));
    let auth_tier = RateTier::new("auth", 30, Duration::from_secs(60));
    let booking_tier = RateTier::new("booking", 5, Duration::from_secs(300));
    let admin_tier = RateTier::new("admin", 120, Duration::from_secs(60));

    // ── Background task: cleanup stale rate limit entries ──
    let cleanup_tiers = [
        public_tier.clone(),
        auth_tier.clone(),
        booking_tier.clone(),
        admin_tier.clone(),
    ];
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            for tier in &cleanup_tiers {
                tier.cleanup();
            }
        }
    });

    // ── CORS: whitelist WEBAPP_URL when configured, otherwise allow any ──
    let cors = if webapp_url != "https://example.com" {
        let origins: Vec<axum::http::HeaderValue> = vec![
            webapp_url.parse().expect("WEBAPP_URL must be a valid URL"),
            "http://localhost:5173".parse().unwrap(), // Vite dev server
        ];
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // ── Router (5 groups with per-group rate limits) ──

    // 1. No-limit: health checks + payment webhooks
    let no_limit_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route(
            "/api/payments/webhook",
            post(handlers::payment::payment_webhook),
        );

    // 2. Public: read-only endpoints (no auth, 60 req/min)
    let public_routes = Router::new()
        .route("/api/services", get(handlers::client::list_services))
        .route("/api/barbers", get(handlers::client::list_barbers))
        .route(
            "/api/available-times",
            get(handlers::client::available_times),
        )
        .route("/api/calendar", get(handlers::client::calendar))
        .layer(from_fn_with_state(public_tier, rate_limit));

    // 3. Booking writes: strictest limit (5 req/5min)
    let booking_routes = Router::new()
        .route("/api/bookings", post(handlers::client::create_booking))
        .route(
            "/api/bookings/{id}/reschedule",
            post(handlers::client::reschedule_booking),
        )
        .layer(from_fn_with_state(booking_tier, rate_limit));

    // 4. Auth: authenticated client endpoints (30 req/min)
    let auth_routes = Router::new()
        .route("/api/bookings/my", get(handlers::client::my_bookings))
        .route(
            "/api/bookings/{id}",
            delete(handlers::client::cancel_booking),
        )
        .route(
            "/api/bookings/{id}/status",
            get(handlers::client::booking_status),
        )
        .layer(from_fn_with_state(auth_tier, rate_limit));

    // 5. Admin: all admin endpoints (120 req/min)
    let admin_routes = Router::new()
        .route(
            "/api/admin/services",
            get(handlers::admin::list_all_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/{id}",
            put(handlers::admin::update_service),
        )
        .route(
            "/api/admin/barbers",
            get(handlers::admin::list_all_barbers).post(handlers::admin::create_barber),
        )
        .route(
            "/api/admin/barbers/{id}",
            put(handlers::admin::update_barber),
        )
        .route(
            "/api/admin/barbers/{id}/schedule",
            get(handlers::admin::get_schedule).put(handlers::admin::upsert_schedule),
        )
        .route(
            "/api/admin/barbers/{id}/blocked-dates",
            get(handlers::admin::list_blocked_dates).post(handlers::admin::block_date),
        )
        .route(
            "/api/admin/blocked-dates/{id}",
            delete(handlers::admin::unblock_date),
        )
        .route(
            "/api/admin/business-hours",
            get(handlers::admin::get_business_hours).put(handlers::admin::update_business_hours),
        )
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/{id}/cancel",
            post(handlers::admin::cancel_booking),
        )
        .layer(from_fn_with_state(admin_tier, rate_limit));

    let app = Router::new()
        .merge(no_limit_routes)
        .merge(public_routes)
        .merge(booking_routes)
        .merge(auth_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Sharpcut server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
