use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use metrics::counter;
use tracing::debug;

use crate::infra::telemetry::RATE_LIMITED_TOTAL;

use super::error::ApiError;

/// Header set by Cloudflare with the original client address.
pub const CLIENT_IP_HEADER: &str = "cf-connecting-ip";
const UNKNOWN_CLIENT: &str = "unknown";

/// Sliding-window request counter keyed by client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Record a request for `key` unless its window is already full.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let window = self.window;
        let mut entry = self.buckets.entry(key.to_string()).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        if entry.len() >= self.max_requests as usize {
            return false;
        }
        entry.push(now);
        true
    }

    /// Drop clients whose requests have all aged out of the window.
    pub fn prune(&self) {
        let now = Instant::now();
        let window = self.window;
        self.buckets.retain(|_, stamps| {
            stamps.retain(|instant| now.duration_since(*instant) < window);
            !stamps.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    /// Human-readable ceiling, e.g. `120 reqs/min/IP`.
    pub fn describe(&self) -> String {
        let secs = self.window.as_secs();
        let per = if secs == 60 {
            "min".to_string()
        } else {
            format!("{secs}s")
        };
        format!("{} reqs/{per}/IP", self.max_requests)
    }
}

/// Client key: the proxy-supplied address, else the peer address.
pub fn client_key(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get(CLIENT_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if !limiter.allow(&key) {
        counter!(RATE_LIMITED_TOTAL).increment(1);
        debug!(target = "naas::http::rate_limit", client = %key, "request rejected");
        return ApiError::rate_limited(
            limiter.retry_after_secs(),
            format!(
                "Too many requests, please try again later. ({})",
                limiter.describe()
            ),
        );
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_the_request_past_the_limit() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(!limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("5.6.7.8", now));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();
        assert!(limiter.allow_at("client", start));
        assert!(!limiter.allow_at("client", start + Duration::from_secs(9)));
        assert!(limiter.allow_at("client", start + Duration::from_secs(10)));
    }

    #[test]
    fn prune_forgets_idle_clients() {
        let limiter = RateLimiter::new(Duration::from_millis(1), 5);
        assert!(limiter.allow("idle"));
        std::thread::sleep(Duration::from_millis(5));
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn describes_the_ceiling() {
        assert_eq!(
            RateLimiter::new(Duration::from_secs(60), 120).describe(),
            "120 reqs/min/IP"
        );
        assert_eq!(
            RateLimiter::new(Duration::from_secs(30), 10).describe(),
            "10 reqs/30s/IP"
        );
    }

    #[test]
    fn client_key_prefers_proxy_header() {
        let mut request = Request::builder()
            .uri("/no")
            .header(CLIENT_IP_HEADER, "203.0.113.9")
            .body(Body::empty())
            .expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));
        assert_eq!(client_key(&request), "203.0.113.9");

        request.headers_mut().remove(CLIENT_IP_HEADER);
        assert_eq!(client_key(&request), "10.0.0.1");

        let bare = Request::builder().uri("/no").body(Body::empty()).expect("request");
        assert_eq!(client_key(&bare), "unknown");
    }
}
