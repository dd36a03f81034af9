//! Per-client rate limiting for sensitive endpoints.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};

use crate::web::error::ApiError;

/// Rate limiter for a single client.
pub type ClientRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A per-minute budget is fully replenished after a minute, so limiters
/// idle for longer than this can be dropped without resetting anyone early.
const IDLE_AFTER: Duration = Duration::from_secs(120);

struct TrackedLimiter {
    limiter: ClientRateLimiter,
    last_used: Mutex<Instant>,
}

type LimiterMap = RwLock<HashMap<String, Arc<TrackedLimiter>>>;

/// Endpoints with their own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Login,
    Redeem,
}

/// Limiter registry, one limiter per client and bucket.
pub struct RateLimitState {
    login_limiters: LimiterMap,
    redeem_limiters: LimiterMap,
    login_rate_limit: u32,
    redeem_rate_limit: u32,
}

impl RateLimitState {
    /// Limits are requests per minute.
    pub fn new(login_rate_limit: u32, redeem_rate_limit: u32) -> Self {
        Self {
            login_limiters: RwLock::new(HashMap::new()),
            redeem_limiters: RwLock::new(HashMap::new()),
            login_rate_limit,
            redeem_rate_limit,
        }
    }

    fn bucket(&self, bucket: Bucket) -> (&LimiterMap, u32) {
        match bucket {
            Bucket::Login => (&self.login_limiters, self.login_rate_limit),
            Bucket::Redeem => (&self.redeem_limiters, self.redeem_rate_limit),
        }
    }

    fn limiter(limiters: &LimiterMap, client: &str, per_minute: u32) -> Arc<TrackedLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = read_guard.get(client) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(|e| e.into_inner());
        write_guard
            .entry(client.to_string())
            .or_insert_with(|| {
                let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
                Arc::new(TrackedLimiter {
                    limiter: RateLimiter::direct(quota),
                    last_used: Mutex::new(Instant::now()),
                })
            })
            .clone()
    }

    /// Consume one request from `client`'s budget. False when exhausted.
    pub fn check(&self, bucket: Bucket, client: &str) -> bool {
        let (limiters, per_minute) = self.bucket(bucket);
        let tracked = Self::limiter(limiters, client, per_minute);
        *tracked.last_used.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
        tracked.limiter.check().is_ok()
    }

    /// Drop limiters that have not been used for a while.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        for limiters in [&self.login_limiters, &self.redeem_limiters] {
            limiters
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|_, tracked| {
                    let last_used = *tracked.last_used.lock().unwrap_or_else(|e| e.into_inner());
                    now.saturating_duration_since(last_used) < IDLE_AFTER
                });
        }
    }

    /// Periodically run [`RateLimitState::cleanup`].
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Client address, honouring reverse proxy headers.
fn client_ip(req: &Request<Body>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if let Some(forwarded) = header("X-Forwarded-For") {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }
    if let Some(real_ip) = header("X-Real-IP") {
        return real_ip;
    }
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    "unknown".to_string()
}

/// Middleware enforcing `bucket` for the wrapped routes.
pub async fn rate_limit(
    state: Arc<RateLimitState>,
    bucket: Bucket,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !state.check(bucket, &ip) {
        tracing::warn!(ip = %ip, bucket = ?bucket, "Rate limit exceeded");
        return ApiError::too_many_requests("Too many attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
