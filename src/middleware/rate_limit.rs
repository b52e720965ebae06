use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultDirectRateLimiter, Quota, RateLimiter,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::error::{AppError, AppResult};
use crate::routes::pages::Page;
use crate::AppState;

pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Per-IP flood guard in front of the whole API: a token every 100ms, burst 120
pub fn create_global_governor() -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(100)
            .burst_size(120)
            .finish()
            .expect("rate limit settings are non-zero"),
    );

    GovernorLayer::new(config)
}

/// Guess budgets for the two codes a client can submit. The store holds a
/// single session, so each budget is shared rather than keyed.
#[derive(Clone)]
pub struct CodeAttemptLimits {
    ride_otp: Arc<DefaultDirectRateLimiter>,
    login_code: Arc<DefaultDirectRateLimiter>,
}

impl CodeAttemptLimits {
    pub fn per_minute(attempts: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN));
        Self {
            ride_otp: Arc::new(RateLimiter::direct(quota)),
            login_code: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

fn spend_attempt(limiter: &DefaultDirectRateLimiter, code: &'static str) -> AppResult<()> {
    limiter.check().map_err(|not_until| {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        let seconds = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        tracing::warn!(code, retry_in_secs = seconds, "Code attempts exhausted");
        AppError::TooManyRequests(format!("Too many attempts. Try again in {}s", seconds))
    })
}

/// Bounds guessing of the 4-digit ride OTP
pub async fn limit_ride_otp(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    spend_attempt(&state.code_attempts.ride_otp, "ride_otp")?;
    Ok(next.run(request).await)
}

/// Bounds guessing of the 6-digit login code
pub async fn limit_login_code(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    spend_attempt(&state.code_attempts.login_code, "login_code")?;
    Ok(next.run(request).await)
}

/// Access log tagged with the page each API call serves
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let page = Page::for_api_path(&path).path();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!(client_ip = %addr.ip(), %method, path = %path, page, "Throttled");
        }
        StatusCode::UNAUTHORIZED => {
            tracing::info!(client_ip = %addr.ip(), %method, path = %path, page, "Sent to login");
        }
        s if s.is_server_error() => {
            tracing::error!(client_ip = %addr.ip(), %method, path = %path, page, status = s.as_u16(), elapsed_ms, "Request failed");
        }
        s => {
            tracing::debug!(%method, path = %path, page, status = s.as_u16(), elapsed_ms, "Handled");
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_run_out_then_report_wait() {
        let limits = CodeAttemptLimits::per_minute(3);
        for _ in 0..3 {
            assert!(spend_attempt(&limits.ride_otp, "ride_otp").is_ok());
        }

        match spend_attempt(&limits.ride_otp, "ride_otp") {
            Err(AppError::TooManyRequests(msg)) => assert!(msg.starts_with("Too many attempts")),
            other => panic!("expected throttling, got {:?}", other.map(|_| ())),
        }

        // budgets are independent
        assert!(spend_attempt(&limits.login_code, "login_code").is_ok());
    }

    #[test]
    fn test_zero_budget_still_allows_one() {
        let limits = CodeAttemptLimits::per_minute(0);
        assert!(spend_attempt(&limits.login_code, "login_code").is_ok());
        assert!(spend_attempt(&limits.login_code, "login_code").is_err());
    }
}
