use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tracing::warn;

use crate::{config::RateLimitConfig, error::ApiError, state::AppState};

/// Buckets older than this many windows are dropped on the next sweep.
const SWEEP_AFTER_WINDOWS: u32 = 2;
const SWEEP_THRESHOLD: usize = 10_000;

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client IP.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            buckets: DashMap::new(),
        }
    }

    /// Counts one request for `key`; `false` once the window's budget is spent.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if self.buckets.len() > SWEEP_THRESHOLD {
            let stale = self.window * SWEEP_AFTER_WINDOWS;
            self.buckets
                .retain(|_, b| now.saturating_duration_since(b.window_start) <= stale);
        }

        let mut entry = self.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

fn client_ip(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&req);
    if !state.limiter.check(&ip) {
        warn!(%ip, path = %req.uri().path(), "rate limited");
        return Err(ApiError::RateLimited(
            "Too many requests, please try again later".into(),
        ));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn blocks_after_budget_within_window() {
        let limiter = limiter(2, 60);
        let t0 = Instant::now();
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(limiter.check_at("1.2.3.4", t0 + Duration::from_secs(1)));
        assert!(!limiter.check_at("1.2.3.4", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, 60);
        let t0 = Instant::now();
        assert!(limiter.check_at("1.1.1.1", t0));
        assert!(limiter.check_at("2.2.2.2", t0));
        assert!(!limiter.check_at("1.1.1.1", t0));
    }

    #[test]
    fn window_resets() {
        let limiter = limiter(1, 60);
        let t0 = Instant::now();
        assert!(limiter.check_at("ip", t0));
        assert!(!limiter.check_at("ip", t0 + Duration::from_secs(59)));
        assert!(limiter.check_at("ip", t0 + Duration::from_secs(60)));
    }
}
