//! # Per-Client Rate Limiting
//!
//! Fixed-window counter keyed by client address. The key is the first
//! entry of `X-Forwarded-For` (the service runs behind a proxy), or
//! `"anonymous"` when the header is absent.
//!
//! Clients choose their own key, so finished windows are swept out once per
//! window length, or sooner when more than `max_clients` keys are tracked.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;

use crate::error::{ErrorBody, ErrorDetail};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    pub window: Duration,
    /// Tracked keys above which expired windows are swept immediately.
    pub max_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 600,
            window: Duration::from_secs(60),
            max_clients: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u64,
    started: Instant,
}

#[derive(Debug)]
struct Clients {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<Mutex<Clients>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(Mutex::new(Clients {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Count a request from `key`; `false` when over the limit.
    fn check(&self, key: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock();
        let length = self.config.window;

        let sweep_due = now.saturating_duration_since(clients.last_sweep) >= length;
        if sweep_due || clients.windows.len() >= self.config.max_clients {
            clients
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < length);
            clients.last_sweep = now;
        }

        let window = clients.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.saturating_duration_since(window.started) >= length {
            window.count = 0;
            window.started = now;
        }

        if window.count >= self.config.max_requests {
            false
        } else {
            window.count += 1;
            true
        }
    }

    fn tracked_clients(&self) -> usize {
        self.clients.lock().windows.len()
    }
}

fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Middleware that enforces per-client rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = client_key(&request);
        if !limiter.check(&key, Instant::now()) {
            tracing::warn!(client = %key, "rate limit exceeded");
            metrics::counter!("medalla_rate_limited_total").increment(1);
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "RATE_LIMITED".to_string(),
                    message: "rate limit exceeded".to_string(),
                    details: None,
                },
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }
    }

    next.run(request).await
}
