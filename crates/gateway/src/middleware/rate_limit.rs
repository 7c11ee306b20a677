//! Rate limiting middleware using token bucket algorithm

use axum::{extract::Request, middleware::Next, response::Response};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use pactforge_common::config::RateLimitConfig;
use pactforge_common::errors::{AppError, Result};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Shared limiter plus the configured rate for error reporting
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl RateLimit {
    /// Zero rates are rejected at startup
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            AppError::Configuration {
                message: "rate_limit.requests_per_second must be positive".to_string(),
            }
        })?;
        let burst = NonZeroU32::new(config.burst).ok_or_else(|| AppError::Configuration {
            message: "rate_limit.burst must be positive".to_string(),
        })?;

        let quota = Quota::per_second(per_second).allow_burst(burst);
        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            requests_per_second: config.requests_per_second,
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    request: Request,
    next: Next,
    limit: RateLimit,
) -> Result<Response> {
    match limit.limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(AppError::RateLimited {
                limit: limit.requests_per_second,
            })
        }
    }
}
