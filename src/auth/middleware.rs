use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};
use crate::config::RateLimitSettings;

/// JWT authentication middleware
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    let session = auth_service.validate_session(token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: UserRole) -> Result<(), AuthError> {
    let session = request
        .extensions()
        .get::<UserSession>()
        .ok_or(AuthError::MissingAuthHeader)?;

    if session.role != role {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(())
}

/// Coach-only routes; must run after `jwt_auth_middleware`
pub async fn require_coach(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(&request, UserRole::Coach)?;
    Ok(next.run(request).await)
}

/// Customer-only routes; must run after `jwt_auth_middleware`
pub async fn require_customer(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(&request, UserRole::Customer)?;
    Ok(next.run(request).await)
}

/// CORS configuration. Tokens travel in the Authorization header, so no
/// credentials mode is needed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

pub fn security_headers_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

pub fn frame_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    )
}

/// Sliding-window request counter keyed by client address
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn from_settings(settings: RateLimitSettings) -> Self {
        Self::new(settings.max_requests, settings.window)
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        // Clients whose window has emptied are forgotten.
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });

        let entry = requests.entry(key.to_string()).or_default();
        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Client identifier for rate limiting: the first proxy-forwarded address,
/// otherwise the peer address of the connection.
fn client_key(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    match remote_addr {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

/// Rate limiting for the credential endpoints
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = client_key(request.headers(), remote_addr);

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!(%client_ip, "login rate limit exceeded");
        return Err(AuthError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    #[test]
    fn test_rate_limiter() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));
        assert!(limiter.check_rate_limit("client1"));

        assert!(!limiter.check_rate_limit("client1"));

        assert!(limiter.check_rate_limit("client2"));
    }

    #[test]
    fn test_rate_limiter_window_expires() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check_rate_limit("client"));
        assert!(!limiter.check_rate_limit("client"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check_rate_limit("client"));
    }

    #[test]
    fn test_rate_limiter_forgets_idle_clients() {
        let limiter = RateLimiter::new(10, Duration::from_millis(20));
        for i in 0..1000 {
            assert!(limiter.check_rate_limit(&format!("10.0.{}.{}", i / 256, i % 256)));
        }
        std::thread::sleep(Duration::from_millis(30));

        assert!(limiter.check_rate_limit("192.168.1.1"));
        assert_eq!(limiter.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_client_key_falls_back_to_peer_address() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "203.0.113.7:51000".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
        assert_eq!(client_key(&headers, None), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_key(&headers, Some(peer)), "198.51.100.4");
    }

    #[tokio::test]
    async fn test_direct_clients_are_limited_separately() {
        let app = Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimiter::from_settings(RateLimitSettings::default()),
                rate_limit_middleware,
            ));

        let request = |addr: &str| {
            let mut request = Request::builder()
                .method("POST")
                .uri("/login")
                .body(Body::empty())
                .unwrap();
            request
                .extensions_mut()
                .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
            request
        };

        let max = RateLimitSettings::default().max_requests;
        for _ in 0..max {
            let response = app.clone().oneshot(request("10.1.1.1:4000")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let blocked = app.clone().oneshot(request("10.1.1.1:4001")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.oneshot(request("10.2.2.2:4000")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_middleware_returns_429() {
        let app = Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimiter::new(1, Duration::from_secs(60)),
                rate_limit_middleware,
            ));

        let request = || {
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_role_gate() {
        let app = Router::new()
            .route("/coach-only", post(|| async { "ok" }))
            .layer(middleware::from_fn(require_coach));

        let mut request = Request::builder()
            .method("POST")
            .uri("/coach-only")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(UserSession {
            user_id: uuid::Uuid::new_v4(),
            email: "client@example.com".to_string(),
            role: UserRole::Customer,
            jti: "jti".to_string(),
            exp: 0,
        });

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
