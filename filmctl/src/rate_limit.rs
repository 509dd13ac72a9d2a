//! Fixed-window rate limiting.
//!
//! Two tiers share one limiter: [`Tier::Auth`] gates account creation and sign in, [`Tier::Standard`]
//! gates every route that needs a bearer token. Counters are keyed by `(tier, client)` where the
//! client is the peer IP (or the first `X-Forwarded-For` hop when configured). The gate runs before
//! any authentication, so a flood of bad tokens is throttled like any other traffic.
//!
//! ```ignore
//! let router = Router::new()
//!     .route("/signin", post(login))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::auth_tier));
//! ```

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::{
    AppState,
    config::{RateLimitTier, RateLimitsConfig},
    errors::Error,
};

/// Prune expired windows once every this many checks.
const PRUNE_EVERY: u64 = 1024;

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Auth,
    Standard,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Budget left after an allowed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    auth: RateLimitTier,
    standard: RateLimitTier,
    trust_forwarded_for: bool,
    windows: DashMap<(Tier, String), Window>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitsConfig) -> Self {
        Self {
            auth: config.auth,
            standard: config.standard,
            trust_forwarded_for: config.trust_forwarded_for,
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    fn limits(&self, tier: Tier) -> RateLimitTier {
        match tier {
            Tier::Auth => self.auth,
            Tier::Standard => self.standard,
        }
    }

    /// Count a request against `(tier, client)`.
    ///
    /// Returns the time until the window resets when the budget is spent.
    pub fn check(&self, tier: Tier, client: &str) -> Result<RateLimitStatus, Duration> {
        self.check_at(tier, client, Instant::now())
    }

    fn check_at(&self, tier: Tier, client: &str, now: Instant) -> Result<RateLimitStatus, Duration> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune(now);
        }

        let limits = self.limits(tier);
        let mut window = self
            .windows
            .entry((tier, client.to_string()))
            .or_insert(Window { started: now, count: 0 });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= limits.window {
            *window = Window { started: now, count: 0 };
        }

        if window.count >= limits.max_requests {
            let retry_after = limits.window.saturating_sub(now.saturating_duration_since(window.started));
            return Err(retry_after);
        }

        window.count += 1;
        Ok(RateLimitStatus {
            limit: limits.max_requests,
            remaining: limits.max_requests - window.count,
        })
    }

    /// Drop windows that have fully elapsed.
    fn prune(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|(tier, _), window| now.saturating_duration_since(window.started) < self.limits(*tier).window);
        debug!(removed = before.saturating_sub(self.windows.len()), "Pruned rate limit windows");
    }

    fn client_identity(&self, request: &Request) -> String {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(client) = forwarded {
                return client.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

async fn enforce(limiter: &RateLimiter, tier: Tier, request: Request, next: Next) -> Result<Response, Error> {
    let client = limiter.client_identity(&request);

    let status = match limiter.check(tier, &client) {
        Ok(status) => status,
        Err(retry_after) => {
            warn!(tier = tier.as_str(), client = %client, path = %request.uri().path(), "Rate limit exceeded");
            return Err(Error::TooManyRequests { retry_after });
        }
    };

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    Ok(response)
}

/// Strict tier for `/signup` and `/signin`
pub async fn auth_tier(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    enforce(&state.rate_limiter, Tier::Auth, request, next).await
}

/// Relaxed tier for authenticated routes
pub async fn standard_tier(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    enforce(&state.rate_limiter, Tier::Standard, request, next).await
}
