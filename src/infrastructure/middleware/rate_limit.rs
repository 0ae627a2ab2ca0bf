use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::AppError;

const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Per-client sliding window of request timestamps.
///
/// A limit of 0 disables limiting. Clients with no requests left in the
/// window are dropped on the next check to keep the map bounded.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    request_delay: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests_per_hour: usize, request_delay: Duration) -> Self {
        Self::with_window(max_requests_per_hour, WINDOW, request_delay)
    }

    pub fn with_window(max_requests: usize, window: Duration, request_delay: Duration) -> Self {
        Self {
            max_requests,
            window,
            request_delay,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.max_requests
    }

    /// Record a request for `client`, or report how long until it may retry
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), AppError> {
        if self.max_requests == 0 {
            return Ok(());
        }

        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        clients.retain(|_, times| {
            while times
                .front()
                .is_some_and(|t| now.duration_since(*t) >= self.window)
            {
                times.pop_front();
            }
            !times.is_empty()
        });

        let times = clients.entry(client.to_string()).or_default();
        if times.len() >= self.max_requests {
            let oldest = times.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(AppError::RateLimitExceeded {
                limit: self.max_requests,
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        times.push_back(now);
        Ok(())
    }
}

/// Client key: first `X-Forwarded-For` entry, else the peer address
pub fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware for the synthesis routes
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);
    limiter.check(&client).inspect_err(|_| {
        tracing::warn!(client = %client, limit = limiter.limit(), "Rate limit exceeded");
    })?;

    if !limiter.request_delay.is_zero() {
        tokio::time::sleep(limiter.request_delay).await;
    }

    Ok(next.run(request).await)
}
