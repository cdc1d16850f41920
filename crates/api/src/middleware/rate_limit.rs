//! Per-token rate limiting.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::num::NonZeroU32;

use super::auth::TokenIdentity;
use crate::app::AppState;
use crate::error::ApiError;

/// Keyed limiter shared by all requests; keys are token fingerprints.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is 0.
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
        })
    }

    /// `Err` carries the retry delay in whole seconds, at least 1.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

/// Must run after [`super::auth::require_token`]; unauthenticated requests
/// pass through untouched.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let fingerprint = req
        .extensions()
        .get::<TokenIdentity>()
        .map(|identity| identity.fingerprint.clone());
    let (Some(limiter), Some(fingerprint)) = (state.rate_limiter.as_ref(), fingerprint) else {
        return next.run(req).await;
    };

    if let Err(retry_after) = limiter.check(&fingerprint) {
        tracing::warn!(
            token = %fingerprint,
            retry_after,
            "Rate limit exceeded"
        );
        return ApiError::RateLimited(retry_after).into_response();
    }

    next.run(req).await
}
