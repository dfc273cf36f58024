use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::ApiResponse;

/// In-memory per-IP sliding-window limiter for one tier of routes.
///
/// A tier is bound into a route group's state and enforced by the
/// [`rate_limit`] middleware. Clones share the same hit map.
#[derive(Debug, Clone)]
pub struct RateTier {
    name: &'static str,
    max_requests: u32,
    window: Duration,
    hits: Arc<DashMap<IpAddr, Vec<Instant>>>,
}

impl RateTier {
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            name,
            max_requests,
            window,
            hits: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check a request from `ip`. `Ok(())` if allowed, `Err(retry_after_secs)`
    /// if the window is exhausted.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();
        let window_start = now - self.window;

        let mut entry = self.hits.entry(ip).or_default();
        entry.retain(|t| *t > window_start);

        if entry.len() >= self.max_requests as usize {
            let oldest = entry[0];
            let retry_after = (oldest + self.window)
                .saturating_duration_since(now)
                .as_secs()
                .max(1);
            return Err(retry_after);
        }

        entry.push(now);
        Ok(())
    }

    /// Drop IPs with no hits newer than 2× the window.
    /// Call periodically from a background task.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let cutoff = self.window * 2;
        self.hits.retain(|_ip, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < cutoff);
            !timestamps.is_empty()
        });
    }
}

/// Middleware enforcing the tier bound into the router state.
pub async fn rate_limit(
    State(tier): State<RateTier>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_client_ip(&req);
    tier.check(ip).map_err(|retry_after| {
        tracing::warn!("rate limited: tier={} ip={}", tier.name(), ip);
        too_many_requests(retry_after)
    })?;
    Ok(next.run(req).await)
}

/// Extract client IP from X-Forwarded-For (reverse proxy) or ConnectInfo.
pub fn extract_client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first_ip) = forwarded.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or_else(|| "127.0.0.1".parse().unwrap())
}

fn too_many_requests(retry_after: u64) -> Response {
    let body = ApiResponse::<()>::error(format!(
        "Too many requests. Try again in {} seconds",
        retry_after
    ));
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(body),
    )
        .into_response()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::thread::sleep;

    fn test_ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_requests_under_limit() {
        let tier = RateTier::new("test", 3, Duration::from_secs(60));
        let ip = test_ip(1);
        assert!(tier.check(ip).is_ok());
        assert!(tier.check(ip).is_ok());
        assert!(tier.check(ip).is_ok());
    }

    #[test]
    fn test_rejects_over_limit() {
        let tier = RateTier::new("test", 2, Duration::from_secs(60));
        let ip = test_ip(1);
        assert!(tier.check(ip).is_ok());
        assert!(tier.check(ip).is_ok());
        assert!(tier.check(ip).is_err());
    }

    #[test]
    fn test_retry_after_within_window() {
        let tier = RateTier::new("test", 1, Duration::from_secs(60));
        let ip = test_ip(1);
        tier.check(ip).unwrap();
        let retry_after = tier.check(ip).unwrap_err();
        assert!((1..=60).contains(&retry_after));
    }

    #[test]
    fn test_different_ips_independent() {
        let tier = RateTier::new("test", 1, Duration::from_secs(60));
        assert!(tier.check(test_ip(1)).is_ok());
        assert!(tier.check(test_ip(1)).is_err());
        assert!(tier.check(test_ip(2)).is_ok());
    }

    #[test]
    fn test_tiers_do_not_share_state() {
        let a = RateTier::new("a", 1, Duration::from_secs(60));
        let b = RateTier::new("b", 1, Duration::from_secs(60));
        let ip = test_ip(1);
        assert!(a.check(ip).is_ok());
        assert!(a.check(ip).is_err());
        assert!(b.check(ip).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let tier = RateTier::new("test", 1, Duration::from_secs(60));
        let clone = tier.clone();
        let ip = test_ip(1);
        assert!(tier.check(ip).is_ok());
        assert!(clone.check(ip).is_err());
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let tier = RateTier::new("test", 1, Duration::from_millis(100));
        let ip = test_ip(1);
        assert!(tier.check(ip).is_ok());
        assert!(tier.check(ip).is_err());

        sleep(Duration::from_millis(150));

        assert!(tier.check(ip).is_ok());
    }

    #[test]
    fn test_cleanup_removes_stale_entries() {
        let tier = RateTier::new("test", 10, Duration::from_millis(50));
        let ip = test_ip(1);
        tier.check(ip).unwrap();

        sleep(Duration::from_millis(120)); // > 2× window

        tier.cleanup();
        assert!(tier.check(ip).is_ok());
    }

    #[test]
    fn test_cleanup_preserves_active_entries() {
        let tier = RateTier::new("test", 2, Duration::from_secs(60));
        let ip = test_ip(1);
        tier.check(ip).unwrap();

        tier.cleanup();

        tier.check(ip).unwrap();
        assert!(tier.check(ip).is_err());
    }
}
