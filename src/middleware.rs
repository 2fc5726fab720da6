//! HTTP middleware: request tracking and IP rate limiting

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state. Services are Arc-wrapped so cloning the
/// state per request is a pointer copy.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<crate::config::AppConfig>,
    pub db: sqlx::PgPool,
    pub jwt_service: Arc<crate::auth::JwtService>,
    pub auth_service: Arc<crate::services::AuthService>,
    pub grant_service: Arc<crate::services::GrantService>,
    pub validation_service: Arc<crate::services::ValidationService>,
    pub user_repo: crate::repository::UserRepository,
    pub role_repo: crate::repository::RoleRepository,
    pub rate_limiter: Arc<IpRateLimiter>,
}

/// Per-request span with trace and request ids, latency metrics, and
/// the ids echoed back as response headers
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method.clone(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = trace_id.parse() {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Resolve the client IP, preferring forwarding headers when the config
/// says a trusted proxy sits in front
pub fn client_ip(req: &Request, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(forwarded) = req.headers().get("x-forwarded-for") {
            if let Ok(s) = forwarded.to_str() {
                // Take the first hop of a comma-separated chain
                if let Some(ip) = s.split(',').next().and_then(|p| p.trim().parse().ok()) {
                    return ip;
                }
            }
        }
        if let Some(real_ip) = req.headers().get("x-real-ip") {
            if let Ok(ip) = real_ip.to_str().unwrap_or("").parse() {
                return ip;
            }
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    tracing::warn!("Could not determine client IP, using loopback address");
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// General rate limit applied to the whole API surface
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, crate::error::AppError> {
    let ip = client_ip(&req, state.config.security.trust_proxy);

    if !state.rate_limiter.check_rate_limit(&ip) {
        tracing::warn!(client_ip = %ip, "Rate limit exceeded");
        metrics::counter!("rate_limit_rejections_total").increment(1);
        return Err(crate::error::AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}

/// Stricter limit for credential endpoints (login and register)
pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, crate::error::AppError> {
    let ip = client_ip(&req, state.config.security.trust_proxy);

    if !state.rate_limiter.check_login_rate_limit(&ip) {
        tracing::warn!(client_ip = %ip, "Login rate limit exceeded");
        metrics::counter!("rate_limit_rejections_total").increment(1);
        return Err(crate::error::AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}

/// Per-IP sliding window rate limiter
#[derive(Clone)]
pub struct IpRateLimiter {
    limiters: Arc<DashMap<(IpAddr, bool), Arc<WindowState>>>,
    config: RateLimitConfig,
}

/// Sliding window of request timestamps for one key
struct WindowState {
    requests: std::sync::Mutex<VecDeque<Instant>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: NonZeroU32,
    pub window_secs: NonZeroU32,
    /// Stricter window for credential endpoints
    pub login_max_requests: NonZeroU32,
    pub login_window_secs: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // 100 requests per minute in general
            max_requests: NonZeroU32::new(100).unwrap(),
            window_secs: NonZeroU32::new(60).unwrap(),
            // 10 credential attempts per 5 minutes
            login_max_requests: NonZeroU32::new(10).unwrap(),
            login_window_secs: NonZeroU32::new(300).unwrap(),
        }
    }
}

impl IpRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiters: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn check_rate_limit(&self, ip: &IpAddr) -> bool {
        self.window_for(
            (*ip, false),
            self.config.max_requests.get() as usize,
            self.config.window_secs.get() as u64,
        )
        .check()
    }

    pub fn check_login_rate_limit(&self, ip: &IpAddr) -> bool {
        self.window_for(
            (*ip, true),
            self.config.login_max_requests.get() as usize,
            self.config.login_window_secs.get() as u64,
        )
        .check()
    }

    fn window_for(&self, key: (IpAddr, bool), max_requests: usize, window_secs: u64) -> Arc<WindowState> {
        self.limiters
            .entry(key)
            .or_insert_with(|| {
                Arc::new(WindowState {
                    requests: std::sync::Mutex::new(VecDeque::new()),
                    window: Duration::from_secs(window_secs),
                    max_requests,
                })
            })
            .clone()
    }

    /// Bound memory by dropping tracked windows when the map grows large
    pub fn cleanup(&self) {
        if self.limiters.len() > 10_000 {
            let keys: Vec<_> = self.limiters.iter().take(5_000).map(|e| *e.key()).collect();
            for key in keys {
                self.limiters.remove(&key);
            }
        }
    }
}

impl WindowState {
    fn check(&self) -> bool {
        let mut requests = self.requests.lock().unwrap();
        let now = Instant::now();

        while let Some(&front) = requests.front() {
            if now.duration_since(front) < self.window {
                break;
            }
            requests.pop_front();
        }

        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        assert_eq!(extract_or_generate_trace_id(&headers), "test-trace-123");

        let headers = HeaderMap::new();
        let generated = extract_or_generate_trace_id(&headers);
        assert!(!generated.is_empty());
        assert_ne!(generated, "test-trace-123");
    }

    #[test]
    fn test_rate_limiter_blocks_after_max() {
        let config = RateLimitConfig {
            max_requests: NonZeroU32::new(3).unwrap(),
            window_secs: NonZeroU32::new(60).unwrap(),
            login_max_requests: NonZeroU32::new(2).unwrap(),
            login_window_secs: NonZeroU32::new(60).unwrap(),
        };
        let limiter = IpRateLimiter::new(config);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.check_rate_limit(&ip));
        assert!(limiter.check_rate_limit(&ip));
        assert!(limiter.check_rate_limit(&ip));
        assert!(!limiter.check_rate_limit(&ip));

        // Separate window per IP
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_rate_limit(&other));
    }

    #[test]
    fn test_login_limit_independent_of_general_limit() {
        let config = RateLimitConfig {
            max_requests: NonZeroU32::new(100).unwrap(),
            window_secs: NonZeroU32::new(60).unwrap(),
            login_max_requests: NonZeroU32::new(1).unwrap(),
            login_window_secs: NonZeroU32::new(60).unwrap(),
        };
        let limiter = IpRateLimiter::new(config);
        let ip: IpAddr = "10.0.0.3".parse().unwrap();

        assert!(limiter.check_login_rate_limit(&ip));
        assert!(!limiter.check_login_rate_limit(&ip));
        // General traffic from the same IP is still allowed
        assert!(limiter.check_rate_limit(&ip));
    }

    #[test]
    fn test_cleanup_bounds_tracked_windows() {
        let limiter = IpRateLimiter::new(RateLimitConfig::default());

        // Below the threshold cleanup leaves everything in place
        for n in 0..100u32 {
            let ip = IpAddr::from(std::net::Ipv4Addr::from(n));
            limiter.check_rate_limit(&ip);
        }
        limiter.cleanup();
        assert_eq!(limiter.limiters.len(), 100);

        for n in 100..10_001u32 {
            let ip = IpAddr::from(std::net::Ipv4Addr::from(n));
            limiter.check_rate_limit(&ip);
        }
        assert!(limiter.limiters.len() > 10_000);

        limiter.cleanup();
        assert!(limiter.limiters.len() <= 10_000 - 5_000 + 1);
    }
}
